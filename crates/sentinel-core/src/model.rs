use crate::color::Rgb;
use crate::geom::{round1, Vec2};
use crate::week::WeekKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLabel {
    pub x: f64,
    pub y: f64,
    pub content: String,
    /// The label's transform carries a rotation; week-axis labels are drawn rotated.
    pub rotated: bool,
}

impl TextLabel {
    pub fn is_numeric(&self) -> bool {
        !self.content.is_empty() && self.content.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn numeric_value(&self) -> Option<i64> {
        if self.is_numeric() {
            self.content.parse().ok()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Upper-cased fill as written in the document.
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub fill: String,
    pub points: Vec<Vec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rect(Rect),
    Polygon(Polygon),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// 0..=100
    pub offset_percent: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub id: String,
    pub stops: Vec<GradientStop>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDocument {
    pub labels: Vec<TextLabel>,
    pub shapes: Vec<Shape>,
    pub gradients: Vec<Gradient>,
}

impl ChartDocument {
    pub fn rects(&self) -> impl Iterator<Item = &Rect> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Rect(r) => Some(r),
            Shape::Polygon(_) => None,
        })
    }

    pub fn polygons(&self) -> impl Iterator<Item = &Polygon> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Polygon(p) => Some(p),
            Shape::Rect(_) => None,
        })
    }

    pub fn gradient(&self, id: &str) -> Option<&Gradient> {
        self.gradients.iter().find(|g| g.id == id)
    }
}

/// Gradient stops plus the numeric range of the colorbar.
///
/// Offset 0% maps to `max_value`, offset 100% to `min_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    pub stops: Vec<GradientStop>,
    pub min_value: f64,
    pub max_value: f64,
}

impl ColorScale {
    pub fn value_range(&self) -> f64 {
        self.max_value - self.min_value
    }

    /// Value of the stop nearest to `hex` in RGB space, rounded to one decimal.
    ///
    /// The first stop wins on equal distance. Unparseable colors, and a scale
    /// without usable stops, yield 0.
    pub fn value_for(&self, hex: &str) -> f64 {
        let Some(target) = Rgb::from_hex(hex) else {
            return 0.0;
        };

        let mut best: Option<(f64, f64)> = None; // (distance, offset)
        for stop in &self.stops {
            let Some(rgb) = Rgb::from_hex(&stop.color) else {
                continue;
            };
            let d = target.distance(rgb);
            match best {
                Some((best_d, _)) if d >= best_d => {}
                _ => best = Some((d, stop.offset_percent)),
            }
        }

        match best {
            Some((_, offset)) => round1((100.0 - offset) / 100.0 * self.value_range()),
            None => 0.0,
        }
    }

    pub fn describe(&self) -> String {
        format!("{}-{} (Fallzahl)", self.min_value, self.max_value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub virus: String,
    pub week: WeekKey,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSegment {
    pub week: WeekKey,
    pub virus: String,
    pub value: f64,
    pub color: String,
}
