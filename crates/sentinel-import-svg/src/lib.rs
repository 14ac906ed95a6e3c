pub mod barchart;
pub mod calibrate;
pub mod extract;
pub mod heatmap;
mod labels;

pub use barchart::{parse_bar_chart, reconstruct_bar_chart, BarChartReconstruction};
pub use calibrate::{calibrate, calibrate_color_scale};
pub use extract::extract_chart;
pub use heatmap::{parse_heatmap, reconstruct_heatmap, HeatmapReconstruction};
