use crate::config::LayoutOptions;
use crate::geometry::{BoundingBox, bounding_box};
use crate::graph::{GraphEdge, GraphNode};
use crate::ir::HandleSides;
use crate::layout::{LayoutResult, LayoutStrategy};
use crate::validate::node_layers;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Renderer-facing snapshot of one layout pass.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub direction: String,
    pub strategy: LayoutStrategy,
    pub success: bool,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub execution_time: f64,
    pub handles: HandleSides,
    pub bounds: BoundingBox,
    pub preserve_selection: bool,
    pub animate: bool,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDump {
    pub id: String,
    pub name: String,
    pub lifespan: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub kind: &'static str,
    pub members: Vec<MemberDump>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub layer: usize,
    pub collapsed: bool,
    pub has_parents: bool,
    pub has_children: bool,
    pub parent_handles: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_handle: String,
    pub target_handle: String,
}

impl LayoutDump {
    pub fn from_result(
        result: &LayoutResult,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        options: &LayoutOptions,
        strategy: LayoutStrategy,
    ) -> Self {
        let table = options.node_dimensions();
        let layers = node_layers(nodes, edges);

        let dumped = nodes
            .iter()
            .map(|node| {
                let size = table.of(&node.kind);
                let parent_handles = if node.kind.is_couple() {
                    node.connectors
                        .parents_of
                        .iter()
                        .map(|id| format!("parents-{id}"))
                        .collect()
                } else if node.connectors.has_parents {
                    vec!["parents".to_string()]
                } else {
                    Vec::new()
                };
                NodeDump {
                    id: node.id.clone(),
                    kind: node.kind.label(),
                    members: node
                        .kind
                        .members()
                        .into_iter()
                        .map(|person| MemberDump {
                            id: person.id.clone(),
                            name: person.name.clone(),
                            lifespan: person.lifespan(),
                        })
                        .collect(),
                    x: node.position.x,
                    y: node.position.y,
                    width: size.width,
                    height: size.height,
                    layer: layers.get(&node.id).copied().unwrap_or(0),
                    collapsed: node.collapsed,
                    has_parents: node.connectors.has_parents,
                    has_children: node.connectors.has_children,
                    parent_handles,
                }
            })
            .collect();

        let edges = edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                source_handle: edge.source_handle.to_string(),
                target_handle: edge.target_handle.to_string(),
            })
            .collect();

        LayoutDump {
            direction: options.direction.token().to_string(),
            strategy,
            success: result.success,
            error: result.error.as_ref().map(ToString::to_string),
            warnings: result.warnings.iter().map(ToString::to_string).collect(),
            execution_time: result.execution_ms(),
            handles: options.direction.handle_sides(),
            bounds: bounding_box(nodes, table),
            preserve_selection: options.preserve_selection,
            animate: options.animate,
            nodes: dumped,
            edges,
        }
    }
}

/// Writes the dump as pretty JSON to `path`, or stdout when `path` is `None`.
pub fn write_layout_dump(path: Option<&Path>, dump: &LayoutDump) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, dump)?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
