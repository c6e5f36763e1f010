use clap::{Parser, ValueEnum};
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::fs;
use std::path::PathBuf;

use vnfd_loader::{
    load_options, load_template, parse_unvalidated, validate_references, LoaderOptions, NodeKind,
    Topology, TopologyGraph,
};

/// Validating loader for TOSCA NFV virtual network function descriptors
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the VNFD template YAML file
    #[arg(short, long)]
    template: PathBuf,

    /// Path to a YAML file with loader options
    #[arg(long)]
    options: Option<PathBuf>,

    /// Reject nodes of unknown type
    #[arg(long)]
    strict: bool,

    /// Output format for the loaded topology
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Only report problems: list every unresolved reference
    #[arg(long)]
    check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut options = match &args.options {
        Some(path) => load_options(path)?,
        None => LoaderOptions::default(),
    };
    if args.strict {
        options.strict_types = true;
    }

    if args.check {
        return check_template(&args, &options);
    }

    let topology = load_template(&args.template, &options)?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&topology)
                .wrap_err("Failed to serialize topology")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_summary(&topology)?,
    }

    Ok(())
}

fn check_template(args: &Args, options: &LoaderOptions) -> Result<()> {
    info!("Checking template: {:?}", args.template);

    let text = fs::read_to_string(&args.template)
        .wrap_err_with(|| format!("Failed to read template '{}'", args.template.display()))?;
    let topology = parse_unvalidated(&text, options)
        .wrap_err_with(|| format!("Failed to load template '{}'", args.template.display()))?;

    let errors = validate_references(&topology);
    if errors.is_empty() {
        println!("{}: OK ({} nodes)", args.template.display(), topology.len());
        return Ok(());
    }

    for err in &errors {
        println!("{}: {}", args.template.display(), err);
    }
    bail!("{} unresolved reference(s)", errors.len())
}

fn print_summary(topology: &Topology) -> Result<()> {
    let header = topology.header();
    if let Some(name) = &header.template_name {
        println!("Template: {}", name);
    }
    if let Some(description) = &header.description {
        println!("Description: {}", description.trim());
    }

    println!("Nodes ({}):", topology.len());
    for node in topology.nodes() {
        println!("  {:<8} {:<8} {}", node.name, node.kind(), node.node_type.raw);
    }

    println!("Links:");
    for edge in topology.edges() {
        println!("  {} -[{}]-> {}", edge.source, edge.kind, edge.target);
    }

    for cp in topology.nodes_of_kind(NodeKind::Cp) {
        if topology.binding_of(&cp.name).is_none() {
            log::warn!("Connection point '{}' is not bound to any VDU", cp.name);
        }
    }

    for (node, _) in topology.monitoring_policies() {
        info!("Node '{}' declares a monitoring policy", node);
    }

    let order = TopologyGraph::from_topology(topology).deployment_order()?;
    println!("Deployment order: {}", order.join(", "));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["vnfd-loader", "--template", "vnfd.yaml"]);

        assert_eq!(args.template, PathBuf::from("vnfd.yaml"));
        assert_eq!(args.format, OutputFormat::Text);
        assert!(!args.strict);
        assert!(!args.check);
        assert!(args.options.is_none());
    }

    #[test]
    fn test_json_and_strict_args() {
        let args = Args::parse_from([
            "vnfd-loader",
            "-t",
            "vnfd.yaml",
            "--format",
            "json",
            "--strict",
            "--options",
            "loader.yaml",
        ]);

        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.strict);
        assert_eq!(args.options, Some(PathBuf::from("loader.yaml")));
    }

    #[test]
    fn test_template_is_required() {
        assert!(Args::try_parse_from(["vnfd-loader"]).is_err());
    }
}
