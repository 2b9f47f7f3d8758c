use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Layout direction of the panel's view/controls split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Column,
    Row,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Column => "column",
            Direction::Row => "row",
        }
    }
}

/// Renderer backend requested by the spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    #[default]
    Canvas,
    Svg,
}

/// Tooltip placement options forwarded to the tooltip renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipConfig {
    pub position: String,
    pub padding: f64,
    #[serde(default)]
    pub center_on_mark: bool,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            position: "top".to_string(),
            padding: 16.0,
            center_on_mark: false,
        }
    }
}

/// Output of the spec parser that runs before a view is initialized.
///
/// Immutable once produced; the controller only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserResult {
    /// Compiled Vega spec handed to the engine
    pub spec: Value,

    /// Original Vega-Lite spec, when the source was Vega-Lite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlspec: Option<Value>,

    #[serde(default)]
    pub container_dir: Direction,

    #[serde(default)]
    pub controls_dir: Direction,

    #[serde(default)]
    pub renderer: RendererKind,

    /// Resize the view whenever the panel is resized
    #[serde(default)]
    pub use_resize: bool,

    #[serde(default)]
    pub padding_width: f64,

    #[serde(default)]
    pub padding_height: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltips: Option<TooltipConfig>,

    #[serde(default)]
    pub hide_warnings: bool,

    #[serde(default)]
    pub warnings: Vec<String>,

    /// Fatal parse error; when present no engine view is constructed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParserResult {
    pub fn new(spec: Value) -> Self {
        Self {
            spec,
            ..Self::default()
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_resize(mut self, use_resize: bool) -> Self {
        self.use_resize = use_resize;
        self
    }

    pub fn with_tooltips(mut self, tooltips: TooltipConfig) -> Self {
        self.tooltips = Some(tooltips);
        self
    }

    pub fn hiding_warnings(mut self) -> Self {
        self.hide_warnings = true;
        self
    }
}
