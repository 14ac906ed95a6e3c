use anyhow::{Context, Result};
use itertools::Itertools;
use roxmltree::{Document, Node, ParsingOptions};
use sentinel_core::geom::Vec2;
use sentinel_core::model::{
    ChartDocument, Gradient, GradientStop, Polygon, Rect, Shape, TextLabel,
};
use std::borrow::Cow;
use tracing::debug;

/// Flattens a chart document into positioned labels, filled shapes and gradients.
///
/// Only the flat structure of the sentinel charts is understood: group transforms and
/// viewBox scaling are ignored. A document that is not well-formed XML is an error.
pub fn extract_chart(svg: &str) -> Result<ChartDocument> {
    let xml = strip_default_namespace(svg);
    let opts = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(&xml, opts).context("parse chart XML")?;

    let root = doc
        .descendants()
        .find(|n| n.has_tag_name("svg"))
        .context("no <svg> root element")?;

    let mut chart = ChartDocument::default();
    for node in root.descendants().filter(Node::is_element) {
        match node.tag_name().name() {
            "rect" => {
                if let Some(rect) = parse_rect(node) {
                    chart.shapes.push(Shape::Rect(rect));
                }
            }
            "polygon" => {
                if let Some(poly) = parse_polygon(node) {
                    chart.shapes.push(Shape::Polygon(poly));
                }
            }
            "text" => {
                if let Some(label) = parse_text(node) {
                    chart.labels.push(label);
                }
            }
            "linearGradient" => {
                if let Some(gradient) = parse_gradient(node) {
                    chart.gradients.push(gradient);
                }
            }
            _ => {}
        }
    }

    debug!(
        labels = chart.labels.len(),
        shapes = chart.shapes.len(),
        gradients = chart.gradients.len(),
        "extracted chart primitives"
    );
    Ok(chart)
}

fn strip_default_namespace(svg: &str) -> Cow<'_, str> {
    const DECL: &str = "xmlns=\"";
    if !svg.contains(DECL) {
        return Cow::Borrowed(svg);
    }

    let mut out = String::with_capacity(svg.len());
    let mut rest = svg;
    while let Some(pos) = rest.find(DECL) {
        let (before, from_decl) = rest.split_at(pos);
        let value = &from_decl[DECL.len()..];
        let close = value.find('"');
        match (before.chars().last(), close) {
            (Some(ws), Some(end)) if ws.is_whitespace() && end > 0 => {
                out.push_str(&before[..before.len() - ws.len_utf8()]);
                rest = &value[end + 1..];
            }
            _ => {
                out.push_str(before);
                out.push_str(DECL);
                rest = value;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn parse_rect(node: Node<'_, '_>) -> Option<Rect> {
    let x = parse_coord(node.attribute("x"))?;
    let y = parse_coord(node.attribute("y"))?;
    let width = parse_coord(node.attribute("width"))?;
    let height = parse_coord(node.attribute("height"))?;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let fill = concrete_fill(node)?;
    Some(Rect {
        x,
        y,
        width,
        height,
        fill,
    })
}

fn parse_polygon(node: Node<'_, '_>) -> Option<Polygon> {
    let fill = concrete_fill(node)?;
    let points: Vec<Vec2> = svgtypes::PointsParser::from(node.attribute("points")?)
        .map(|(x, y)| Vec2::new(x, y))
        .collect();
    if points.is_empty() {
        return None;
    }
    Some(Polygon { fill, points })
}

fn parse_text(node: Node<'_, '_>) -> Option<TextLabel> {
    let content: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    Some(TextLabel {
        x: parse_coord(node.attribute("x"))?,
        y: parse_coord(node.attribute("y"))?,
        content: content.to_string(),
        rotated: node.attribute("transform").is_some_and(has_rotation),
    })
}

fn parse_gradient(node: Node<'_, '_>) -> Option<Gradient> {
    let id = node.attribute("id")?.to_string();
    let stops = node
        .children()
        .filter(|n| n.has_tag_name("stop"))
        .filter_map(parse_stop)
        .sorted_by(|a, b| {
            a.offset_percent
                .partial_cmp(&b.offset_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .collect();
    Some(Gradient { id, stops })
}

fn parse_stop(node: Node<'_, '_>) -> Option<GradientStop> {
    let offset = node.attribute("offset")?.trim();
    let offset_percent = match offset.strip_suffix('%') {
        Some(pct) => pct.trim().parse().ok()?,
        // Bare numbers are fractions of the gradient length.
        None => offset.parse::<f64>().ok()? * 100.0,
    };
    let color = node
        .attribute("style")
        .and_then(|s| style_property(s, "stop-color"))
        .or_else(|| node.attribute("stop-color"))?
        .trim()
        .to_ascii_uppercase();
    Some(GradientStop {
        offset_percent,
        color,
    })
}

/// Upper-cased fill of a shape painted with a real, visible color.
///
/// White, `none`, paint-server references and fully transparent fills are rejected.
fn concrete_fill(node: Node<'_, '_>) -> Option<String> {
    let fill = node
        .attribute("fill")
        .or_else(|| node.attribute("style").and_then(|s| style_property(s, "fill")))?
        .trim();
    if fill.is_empty() || fill.eq_ignore_ascii_case("white") || fill.contains("url") {
        return None;
    }
    match fill.parse::<svgtypes::Color>() {
        Ok(color) if color.alpha == 0 => return None,
        Ok(_) => {}
        Err(_) => return None,
    }
    let invisible = ["fill-opacity", "opacity"]
        .iter()
        .filter_map(|attr| node.attribute(*attr))
        .any(|v| v.trim().parse::<f64>().is_ok_and(|o| o <= 0.0));
    if invisible {
        return None;
    }
    Some(fill.to_ascii_uppercase())
}

fn style_property<'a>(style: &'a str, name: &str) -> Option<&'a str> {
    // style="fill:#FF0000;stroke:none"
    style.split(';').find_map(|part| {
        let (key, value) = part.split_once(':')?;
        (key.trim() == name).then(|| value.trim())
    })
}

fn has_rotation(transform: &str) -> bool {
    svgtypes::TransformListParser::from(transform)
        .any(|token| matches!(token, Ok(svgtypes::TransformListToken::Rotate { .. })))
}

/// Numeric attribute, 0 when absent. Percentages and unparseable values yield `None`.
fn parse_coord(value: Option<&str>) -> Option<f64> {
    match value {
        None => Some(0.0),
        Some(s) => parse_len(s),
    }
}

fn parse_len(s: &str) -> Option<f64> {
    // Numeric prefix; unit suffixes like `px` are ignored.
    let s = s.trim();
    if s.ends_with('%') {
        return None;
    }
    let mut end = 0usize;
    for (i, ch) in s.char_indices() {
        if ch.is_ascii_digit() || ch == '.' || ch == '-' || ch == '+' || ch == 'e' || ch == 'E' {
            end = i + ch.len_utf8();
        } else {
            break;
        }
    }
    s[..end].parse().ok()
}
