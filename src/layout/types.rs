use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::LayoutError;
use crate::graph::GraphNode;
use crate::validate::ValidationWarning;

/// Interchangeable placement algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    /// Rank, order, then position (dagre).
    #[default]
    Layered,
    /// Tidy tree with partners placed next to each other.
    Tree,
}

impl LayoutStrategy {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "layered" | "dagre" => Some(Self::Layered),
            "tree" | "entitree" => Some(Self::Tree),
            _ => None,
        }
    }
}

/// Positioned nodes plus diagnostics. On failure `nodes` is the untouched input.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub nodes: Vec<GraphNode>,
    pub success: bool,
    pub warnings: Vec<ValidationWarning>,
    pub error: Option<LayoutError>,
    pub execution_time: Duration,
}

impl LayoutResult {
    pub(crate) fn laid_out(
        nodes: Vec<GraphNode>,
        warnings: Vec<ValidationWarning>,
        execution_time: Duration,
    ) -> Self {
        Self {
            nodes,
            success: true,
            warnings,
            error: None,
            execution_time,
        }
    }

    pub(crate) fn failed(
        original: &[GraphNode],
        error: LayoutError,
        warnings: Vec<ValidationWarning>,
        execution_time: Duration,
    ) -> Self {
        Self {
            nodes: original.to_vec(),
            success: false,
            warnings,
            error: Some(error),
            execution_time,
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn execution_ms(&self) -> f64 {
        self.execution_time.as_secs_f64() * 1000.0
    }
}
