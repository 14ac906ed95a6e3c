use serde::{Deserialize, Serialize};

/// Thresholds for one rendering of the sentinel charts, in SVG user units (y grows downward).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartLayout {
    pub header_y_max: f64,
    pub colorbar_x_min: f64,
    pub left_axis_x_max: f64,

    pub virus_label_x_max: f64,
    pub virus_label_y_min: f64,
    pub virus_label_y_max: f64,
    pub row_label_offset: f64,
    pub strict_row_match: bool,

    pub bar_width_min: f64,
    pub bar_width_max: f64,

    pub legend_swatch_min: f64,
    pub legend_swatch_max: f64,
    pub legend_text_dy_min: f64,
    pub legend_text_dy_max: f64,

    pub gradient_id: String,
    pub default_min_value: f64,
    pub default_max_value: f64,

    pub default_baseline_y: f64,
    pub baseline_tolerance: f64,

    pub secondary_color: String,
    pub secondary_label: String,
    pub background_fill: String,

    pub week_marker: String,
    pub weeks_per_year: u32,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            header_y_max: 70.0,
            colorbar_x_min: 700.0,
            left_axis_x_max: 70.0,
            virus_label_x_max: 100.0,
            virus_label_y_min: 60.0,
            virus_label_y_max: 340.0,
            row_label_offset: 15.0,
            strict_row_match: false,
            bar_width_min: 5.0,
            bar_width_max: 15.0,
            legend_swatch_min: 10.0,
            legend_swatch_max: 15.0,
            legend_text_dy_min: 8.0,
            legend_text_dy_max: 16.0,
            gradient_id: "gradient1".to_string(),
            default_min_value: 0.0,
            default_max_value: 120.0,
            default_baseline_y: 360.0,
            baseline_tolerance: 1.0,
            secondary_color: "#E4E4E4".to_string(),
            secondary_label: "Einsendungen".to_string(),
            background_fill: "white".to_string(),
            week_marker: "KW".to_string(),
            weeks_per_year: 52,
        }
    }
}

impl ChartLayout {
    pub fn is_virus_label_position(&self, x: f64, y: f64) -> bool {
        x < self.virus_label_x_max && self.virus_label_y_min < y && y < self.virus_label_y_max
    }

    pub fn is_legend_swatch(&self, width: f64, height: f64, y: f64) -> bool {
        let in_range = |v: f64| self.legend_swatch_min <= v && v <= self.legend_swatch_max;
        in_range(width) && in_range(height) && y < self.header_y_max
    }

    pub fn is_bar_width(&self, width: f64) -> bool {
        self.bar_width_min < width && width < self.bar_width_max
    }

    pub fn is_secondary_fill(&self, fill: &str) -> bool {
        fill.eq_ignore_ascii_case(&self.secondary_color)
    }

    pub fn is_background_fill(&self, fill: &str) -> bool {
        fill.eq_ignore_ascii_case(&self.background_fill)
    }
}
