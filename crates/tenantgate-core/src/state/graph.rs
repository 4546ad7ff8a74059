use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStyle {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

/// A graph node as delivered in the result files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: String,
    pub name: String,
    #[serde(rename = "symbolSize")]
    pub symbol_size: f64,
    pub category: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pred_risk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<String>,
    #[serde(default, rename = "itemStyle", skip_serializing_if = "Option::is_none")]
    pub item_style: Option<ItemStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkData {
    pub source: String,
    pub target: String,
    pub value: f64,
    #[serde(default, rename = "lineStyle", skip_serializing_if = "Option::is_none")]
    pub line_style: Option<LineStyle>,
}

/// Focused area and the subset of the graph currently displayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphFilter {
    pub focused_area: Option<String>,
    pub filtered_nodes: Vec<NodeData>,
    pub filtered_links: Vec<LinkData>,
    pub show_labels: bool,
}

impl GraphFilter {
    pub fn set_focused_area(&mut self, area_code: Option<String>) {
        self.focused_area = area_code;
    }

    /// Stores owned copies; later changes to the caller's data don't leak in
    pub fn set_filtered_data(&mut self, nodes: &[NodeData], links: &[LinkData]) {
        self.filtered_nodes = nodes.to_vec();
        self.filtered_links = links.to_vec();
    }

    pub fn clear_filtered_data(&mut self) {
        self.filtered_nodes.clear();
        self.filtered_links.clear();
    }

    pub fn toggle_labels(&mut self) {
        self.show_labels = !self.show_labels;
    }
}
