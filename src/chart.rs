use camino::Utf8Path;
use resvg::{tiny_skia, usvg};
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Line, Path, Rectangle, Text};
use tracing::info;

use crate::domain::SequenceRecord;
use crate::error::KiraError;
use crate::fs_util::write_atomic;

const W: f32 = 1000.0;
const H: f32 = 600.0;
const MARGIN_LEFT: f32 = 90.0;
const MARGIN_RIGHT: f32 = 30.0;
const MARGIN_TOP: f32 = 50.0;
const FONT_FAMILY: &str = "DejaVu Sans, Arial, Helvetica, sans-serif";
const LINE_COLOR: &str = "#0000ff";
const TITLE: &str = "Sequence Lengths by Accession Number";
const X_LABEL: &str = "Accession Number";
const Y_LABEL: &str = "Sequence Length";

/// Copy of `records` ordered by length, longest first. Equal lengths keep
/// their input order.
pub fn sort_for_chart(records: &[SequenceRecord]) -> Vec<SequenceRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.length.cmp(&a.length));
    sorted
}

/// Renders the sorted length chart to a PNG at `path`, replacing any existing file.
pub fn generate_plot(records: &[SequenceRecord], path: &Utf8Path) -> Result<(), KiraError> {
    let svg_text = render_svg(records);
    let png = rasterize_png(&svg_text)?;
    write_atomic(path, &png)?;
    info!(%path, points = records.len(), "chart written");
    Ok(())
}

pub fn render_svg(records: &[SequenceRecord]) -> String {
    let sorted = sort_for_chart(records);

    // Room below the axis for the rotated accession labels.
    let longest_label = sorted
        .iter()
        .map(|record| record.accession.chars().count())
        .max()
        .unwrap_or(0);
    let margin_bottom = (70.0 + longest_label as f32 * 6.5).min(H * 0.45);

    let left = MARGIN_LEFT;
    let right = W - MARGIN_RIGHT;
    let top = MARGIN_TOP;
    let bottom = H - margin_bottom;

    let (y_lo, y_hi) = value_range(&sorted);
    let y_of = |value: f32| bottom - (value - y_lo) / (y_hi - y_lo) * (bottom - top);
    let x_of = |index: usize| category_x(index, sorted.len(), left, right);

    let mut doc = Document::new()
        .set("viewBox", (0, 0, W, H))
        .set("width", W)
        .set("height", H)
        .add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", W)
                .set("height", H)
                .set("fill", "#ffffff"),
        );

    for tick in nice_ticks(y_lo, y_hi) {
        let y = y_of(tick);
        doc = doc
            .add(
                Line::new()
                    .set("x1", left - 5.0)
                    .set("y1", y)
                    .set("x2", left)
                    .set("y2", y)
                    .set("stroke", "#000000")
                    .set("stroke-width", 1),
            )
            .add(
                Text::new(format_tick(tick))
                    .set("x", left - 8.0)
                    .set("y", y + 4.0)
                    .set("text-anchor", "end")
                    .set("font-family", FONT_FAMILY)
                    .set("font-size", 11)
                    .set("fill", "#000000"),
            );
    }

    for (index, record) in sorted.iter().enumerate() {
        let x = x_of(index);
        let label_y = bottom + 8.0;
        doc = doc
            .add(
                Line::new()
                    .set("x1", x)
                    .set("y1", bottom)
                    .set("x2", x)
                    .set("y2", bottom + 5.0)
                    .set("stroke", "#000000")
                    .set("stroke-width", 1),
            )
            .add(
                Text::new(record.accession.clone())
                    .set("x", x)
                    .set("y", label_y)
                    .set("transform", format!("rotate(-90 {x:.2} {label_y:.2})"))
                    .set("text-anchor", "end")
                    .set("dominant-baseline", "middle")
                    .set("font-family", FONT_FAMILY)
                    .set("font-size", 10)
                    .set("fill", "#000000"),
            );
    }

    if let Some((first, rest)) = sorted.split_first() {
        let mut data = Data::new().move_to((x_of(0), y_of(first.length as f32)));
        for (offset, record) in rest.iter().enumerate() {
            data = data.line_to((x_of(offset + 1), y_of(record.length as f32)));
        }
        doc = doc.add(
            Path::new()
                .set("d", data)
                .set("fill", "none")
                .set("stroke", LINE_COLOR)
                .set("stroke-width", 1.5),
        );
    }

    for (index, record) in sorted.iter().enumerate() {
        doc = doc.add(
            Circle::new()
                .set("cx", x_of(index))
                .set("cy", y_of(record.length as f32))
                .set("r", 4)
                .set("fill", LINE_COLOR),
        );
    }

    doc = doc
        .add(
            Rectangle::new()
                .set("x", left)
                .set("y", top)
                .set("width", right - left)
                .set("height", bottom - top)
                .set("fill", "none")
                .set("stroke", "#000000")
                .set("stroke-width", 1),
        )
        .add(
            Text::new(TITLE)
                .set("x", (left + right) / 2.0)
                .set("y", top - 18.0)
                .set("text-anchor", "middle")
                .set("font-family", FONT_FAMILY)
                .set("font-size", 15)
                .set("fill", "#000000"),
        )
        .add(
            Text::new(X_LABEL)
                .set("x", (left + right) / 2.0)
                .set("y", H - 12.0)
                .set("text-anchor", "middle")
                .set("font-family", FONT_FAMILY)
                .set("font-size", 12)
                .set("fill", "#000000"),
        )
        .add(
            Text::new(Y_LABEL)
                .set("x", 22.0)
                .set("y", (top + bottom) / 2.0)
                .set(
                    "transform",
                    format!("rotate(-90 22 {:.2})", (top + bottom) / 2.0),
                )
                .set("text-anchor", "middle")
                .set("font-family", FONT_FAMILY)
                .set("font-size", 12)
                .set("fill", "#000000"),
        );

    doc.to_string()
}

pub fn rasterize_png(svg_text: &str) -> Result<Vec<u8>, KiraError> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg_text, &options)
        .map_err(|err| KiraError::Chart(err.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| KiraError::Chart("invalid chart dimensions".to_string()))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    pixmap
        .encode_png()
        .map_err(|err| KiraError::Chart(err.to_string()))
}

fn category_x(index: usize, count: usize, left: f32, right: f32) -> f32 {
    let width = right - left;
    if count <= 1 {
        return left + width / 2.0;
    }
    let pad = width * 0.05;
    left + pad + index as f32 * (width - 2.0 * pad) / (count - 1) as f32
}

fn value_range(records: &[SequenceRecord]) -> (f32, f32) {
    let lo = records.iter().map(|record| record.length).min();
    let hi = records.iter().map(|record| record.length).max();
    match (lo, hi) {
        (Some(lo), Some(hi)) if lo < hi => {
            let pad = (hi - lo) as f32 * 0.05;
            (lo as f32 - pad, hi as f32 + pad)
        }
        (Some(value), Some(_)) => {
            let pad = (value as f32 * 0.05).max(1.0);
            (value as f32 - pad, value as f32 + pad)
        }
        _ => (0.0, 1.0),
    }
}

fn nice_ticks(lo: f32, hi: f32) -> Vec<f32> {
    let raw = (hi - lo) / 6.0;
    if !raw.is_finite() || raw <= 0.0 {
        return Vec::new();
    }
    let magnitude = 10f32.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|factor| factor * magnitude)
        .find(|step| *step >= raw)
        .unwrap_or(10.0 * magnitude);
    let mut ticks = Vec::new();
    let mut tick = (lo / step).ceil() * step;
    while tick <= hi {
        ticks.push(tick);
        tick += step;
    }
    ticks
}

fn format_tick(value: f32) -> String {
    if (value - value.round()).abs() < 1e-6 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.1}")
    }
}
