use crate::graph::NodeKind;
use crate::ir::Direction;
use crate::layout::LayoutStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeDimensions {
    pub width: f32,
    pub height: f32,
}

impl NodeDimensions {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Box sizes per node kind for one family of directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindDimensions {
    pub person: NodeDimensions,
    pub couple: NodeDimensions,
}

impl KindDimensions {
    pub fn of(&self, kind: &NodeKind) -> NodeDimensions {
        match kind {
            NodeKind::Person { .. } => self.person,
            NodeKind::Couple { .. } => self.couple,
        }
    }
}

/// Couples sit side by side in vertical layouts and stacked in horizontal ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionTables {
    pub vertical: KindDimensions,
    pub horizontal: KindDimensions,
}

impl Default for DimensionTables {
    fn default() -> Self {
        Self {
            vertical: KindDimensions {
                person: NodeDimensions::new(164.0, 56.0),
                couple: NodeDimensions::new(312.0, 56.0),
            },
            horizontal: KindDimensions {
                person: NodeDimensions::new(164.0, 56.0),
                couple: NodeDimensions::new(164.0, 112.0),
            },
        }
    }
}

impl DimensionTables {
    pub fn for_direction(&self, direction: Direction) -> &KindDimensions {
        if direction.is_horizontal() {
            &self.horizontal
        } else {
            &self.vertical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutOptions {
    pub direction: Direction,
    /// Gap between neighbours in the same generation.
    pub node_spacing: f32,
    /// Gap between generations.
    pub layer_spacing: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    /// Passed through for the renderer.
    pub preserve_selection: bool,
    /// Passed through for the renderer.
    pub animate: bool,
    pub dimensions: DimensionTables,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: Direction::LeftRight,
            node_spacing: 50.0,
            layer_spacing: 80.0,
            margin_x: 20.0,
            margin_y: 20.0,
            preserve_selection: true,
            animate: true,
            dimensions: DimensionTables::default(),
        }
    }
}

impl LayoutOptions {
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn node_dimensions(&self) -> &KindDimensions {
        self.dimensions.for_direction(self.direction)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    /// Center the laid out nodes inside `width` x `height`.
    pub center: bool,
    /// Run the row overlap pass after layout.
    pub apply_spacing: bool,
    pub min_spacing_x: f32,
    pub min_spacing_y: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            center: false,
            apply_spacing: false,
            min_spacing_x: 20.0,
            min_spacing_y: 20.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutOptions,
    pub strategy: LayoutStrategy,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DimensionsFile {
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KindDimensionsFile {
    person: Option<DimensionsFile>,
    couple: Option<DimensionsFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    center: Option<bool>,
    apply_spacing: Option<bool>,
    min_spacing_x: Option<f32>,
    min_spacing_y: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    direction: Option<String>,
    strategy: Option<LayoutStrategy>,
    node_spacing: Option<f32>,
    layer_spacing: Option<f32>,
    margin_x: Option<f32>,
    margin_y: Option<f32>,
    preserve_selection: Option<bool>,
    animate: Option<bool>,
    vertical: Option<KindDimensionsFile>,
    horizontal: Option<KindDimensionsFile>,
    render: Option<RenderConfigFile>,
}

fn apply_dimensions(target: &mut NodeDimensions, file: Option<DimensionsFile>) {
    let Some(file) = file else {
        return;
    };
    if let Some(v) = file.width {
        target.width = v;
    }
    if let Some(v) = file.height {
        target.height = v;
    }
}

fn apply_kind_dimensions(target: &mut KindDimensions, file: Option<KindDimensionsFile>) {
    let Some(file) = file else {
        return;
    };
    apply_dimensions(&mut target.person, file.person);
    apply_dimensions(&mut target.couple, file.couple);
}

fn parse_config_file(contents: &str, json5_syntax: bool) -> anyhow::Result<ConfigFile> {
    if json5_syntax {
        Ok(json5::from_str(contents)?)
    } else {
        Ok(serde_json::from_str(contents)?)
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let is_json5 = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json5"))
        .unwrap_or(false);
    let parsed = parse_config_file(&contents, is_json5)?;
    merge_config(config, parsed)
}

/// Loads a config from an in-memory JSON5 (or plain JSON) document.
pub fn config_from_str(contents: &str) -> anyhow::Result<Config> {
    let parsed = parse_config_file(contents, true)?;
    merge_config(Config::default(), parsed)
}

fn merge_config(mut config: Config, parsed: ConfigFile) -> anyhow::Result<Config> {
    if let Some(token) = parsed.direction.as_deref() {
        config.layout.direction = Direction::from_token(token)
            .ok_or_else(|| anyhow::anyhow!("unknown layout direction `{}`", token))?;
    }
    if let Some(v) = parsed.strategy {
        config.strategy = v;
    }
    if let Some(v) = parsed.node_spacing {
        config.layout.node_spacing = v;
    }
    if let Some(v) = parsed.layer_spacing {
        config.layout.layer_spacing = v;
    }
    if let Some(v) = parsed.margin_x {
        config.layout.margin_x = v;
    }
    if let Some(v) = parsed.margin_y {
        config.layout.margin_y = v;
    }
    if let Some(v) = parsed.preserve_selection {
        config.layout.preserve_selection = v;
    }
    if let Some(v) = parsed.animate {
        config.layout.animate = v;
    }
    apply_kind_dimensions(&mut config.layout.dimensions.vertical, parsed.vertical);
    apply_kind_dimensions(&mut config.layout.dimensions.horizontal, parsed.horizontal);

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.center {
            config.render.center = v;
        }
        if let Some(v) = render.apply_spacing {
            config.render.apply_spacing = v;
        }
        if let Some(v) = render.min_spacing_x {
            config.render.min_spacing_x = v;
        }
        if let Some(v) = render.min_spacing_y {
            config.render.min_spacing_y = v;
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_family_tree_boxes() {
        let options = LayoutOptions::default();
        assert_eq!(options.direction, Direction::LeftRight);
        assert_eq!(options.node_dimensions().couple, NodeDimensions::new(164.0, 112.0));
        let vertical = options.with_direction(Direction::BottomTop);
        assert_eq!(vertical.node_dimensions().couple, NodeDimensions::new(312.0, 56.0));
        assert_eq!(vertical.node_dimensions().person, NodeDimensions::new(164.0, 56.0));
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.strategy, LayoutStrategy::Layered);
        assert_eq!(config.render.width, 1200.0);
    }

    #[test]
    fn partial_json5_overrides() {
        let config = config_from_str(
            r#"{
                // comments are fine in json5
                direction: "bt",
                strategy: "tree",
                nodeSpacing: 30,
                vertical: { couple: { width: 400 } },
                render: { center: true },
            }"#,
        )
        .unwrap();
        assert_eq!(config.layout.direction, Direction::BottomTop);
        assert_eq!(config.strategy, LayoutStrategy::Tree);
        assert_eq!(config.layout.node_spacing, 30.0);
        assert_eq!(config.layout.layer_spacing, 80.0);
        assert_eq!(config.layout.dimensions.vertical.couple.width, 400.0);
        assert_eq!(config.layout.dimensions.vertical.couple.height, 56.0);
        assert!(config.render.center);
    }

    #[test]
    fn rejects_unknown_direction() {
        assert!(config_from_str(r#"{"direction": "up"}"#).is_err());
    }

    #[test]
    fn options_deserialize_camel_case() {
        let options: LayoutOptions =
            serde_json::from_str(r#"{"direction": "RL", "marginX": 5, "animate": false}"#).unwrap();
        assert_eq!(options.direction, Direction::RightLeft);
        assert_eq!(options.margin_x, 5.0);
        assert_eq!(options.margin_y, 20.0);
        assert!(!options.animate);
        assert!(options.preserve_selection);
    }
}
