//! Loader options.
//!
//! Options can be given programmatically or read from a small YAML file:
//!
//! ```yaml
//! strict_types: true
//! require_definitions_version: false
//! ```

use std::fs::File;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderOptions {
    /// Reject nodes whose type is not a known VDU, CP or VL type
    pub strict_types: bool,
    /// Reject legacy templates without `tosca_definitions_version`
    pub require_definitions_version: bool,
}

impl LoaderOptions {
    pub fn strict() -> Self {
        Self {
            strict_types: true,
            require_definitions_version: true,
        }
    }
}

/// Load loader options from a YAML file
pub fn load_options(path: &Path) -> Result<LoaderOptions> {
    info!("Loading loader options from: {:?}", path);

    let file = File::open(path)
        .wrap_err_with(|| format!("Failed to open options file '{}'", path.display()))?;
    let options: LoaderOptions = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse options file '{}'", path.display()))?;

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_partial_options() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "strict_types: true\n").unwrap();

        let options = load_options(temp_file.path()).unwrap();
        assert!(options.strict_types);
        assert!(!options.require_definitions_version);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "strict_typos: true\n").unwrap();

        assert!(load_options(temp_file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_options(Path::new("/nonexistent/options.yaml")).unwrap_err();
        assert!(format!("{:?}", err).contains("options.yaml"));
    }

    #[test]
    fn test_defaults_are_lenient() {
        let options = LoaderOptions::default();
        assert!(!options.strict_types);
        assert!(!options.require_definitions_version);
        assert_ne!(options, LoaderOptions::strict());
    }
}
