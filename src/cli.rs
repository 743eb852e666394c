use crate::config::{Config, load_config};
use crate::geometry::{apply_minimum_spacing, center_in_area};
use crate::graph::{CollapseSet, NodeKey, build_graph};
use crate::ir::{Direction, FamilyDataset};
use crate::layout::{LayoutStrategy, compute_layout};
use crate::layout_dump::{LayoutDump, write_layout_dump};
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "famlayout", version, about = "Family tree layout engine (dataset JSON in, positioned graph JSON out)")]
pub struct Args {
    /// Input dataset (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (.json or .json5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Layout strategy: layered (dagre) or tree (entitree)
    #[arg(short = 's', long = "strategy", value_parser = parse_strategy)]
    pub strategy: Option<LayoutStrategy>,

    /// Flow direction: TB, BT, LR or RL. Overrides the dataset setting.
    #[arg(short = 'd', long = "direction", value_parser = parse_direction)]
    pub direction: Option<Direction>,

    /// Collapse the descendants of a node (person id or couple node id). Repeatable.
    #[arg(long = "collapse", value_name = "ID")]
    pub collapse: Vec<String>,

    /// Center the layout inside the render area
    #[arg(long = "center")]
    pub center: bool,

    /// Push apart nodes that crowd their row neighbour
    #[arg(long = "spacing")]
    pub spacing: bool,
}

fn parse_strategy(token: &str) -> Result<LayoutStrategy, String> {
    LayoutStrategy::from_token(token)
        .ok_or_else(|| format!("unknown strategy `{token}` (expected layered or tree)"))
}

fn parse_direction(token: &str) -> Result<Direction, String> {
    Direction::from_token(token)
        .ok_or_else(|| format!("unknown direction `{token}` (expected TB, BT, LR or RL)"))
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let dump = layout_input(&input, config, &args)?;
    write_layout_dump(args.output.as_deref(), &dump)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// Parses a dataset, applies the command line overrides and lays it out.
///
/// A failed layout is not an error here: the dump records it.
fn layout_input(input: &str, mut config: Config, args: &Args) -> Result<LayoutDump> {
    let dataset = FamilyDataset::from_json(input)?;
    config.layout.direction = args.direction.unwrap_or_else(|| dataset.direction());
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }

    let collapsed = resolve_collapsed(&dataset, &args.collapse);
    let graph = build_graph(&dataset, &collapsed);
    let result = compute_layout(&graph.nodes, &graph.edges, &config.layout, config.strategy);
    if let Some(err) = &result.error {
        warn!(%err, "layout did not succeed");
    }

    let table = config.layout.node_dimensions();
    let mut nodes = result.nodes.clone();
    if result.success && (args.spacing || config.render.apply_spacing) {
        nodes = apply_minimum_spacing(
            &nodes,
            table,
            config.render.min_spacing_x,
            config.render.min_spacing_y,
        );
    }
    if result.success && (args.center || config.render.center) {
        nodes = center_in_area(
            &nodes,
            table,
            config.render.width,
            config.render.height,
            (0.0, 0.0),
        );
    }

    Ok(LayoutDump::from_result(
        &result,
        &nodes,
        &graph.edges,
        &config.layout,
        config.strategy,
    ))
}

fn resolve_collapsed(dataset: &FamilyDataset, ids: &[String]) -> CollapseSet {
    let mut collapsed = CollapseSet::new();
    for id in ids {
        match NodeKey::resolve(id, &dataset.members) {
            Some(key) => {
                debug!(%key, "collapsing");
                collapsed.insert(key);
            }
            None => warn!(id = id.as_str(), "ignoring --collapse for unknown node"),
        }
    }
    collapsed
}
