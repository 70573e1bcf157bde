//! Chart scenes for the summary view and the exported report.
//!
//! Charts are kept as a flat list of vector primitives in a top-left coordinate space so the
//! same scene can be served as SVG and drawn straight into the PDF.

use super::aggregate::{format_score, DomainAverage};
use super::rubric::MaturityLevel;
use super::summary::HeatmapRow;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Summary,
    Heatmap,
}

impl ChartKind {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Summary => "Maturity by Domain",
            Self::Heatmap => "Heatmap of Scores",
        }
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "summary" | "bar" => Ok(Self::Summary),
            "heatmap" => Ok(Self::Heatmap),
            other => Err(format!("unknown chart '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TEAL: Self = Self::rgb(0, 128, 128);
    pub const GRID: Self = Self::rgb(220, 220, 220);
    pub const UNRATED: Self = Self::rgb(238, 238, 238);

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn luminance(self) -> f32 {
        (0.299 * f32::from(self.r) + 0.587 * f32::from(self.g) + 0.114 * f32::from(self.b))
            / 255.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartElement {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Color,
        stroke: Option<Color>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
    },
    /// `y` is the text baseline.
    Text {
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
        anchor: TextAnchor,
        color: Color,
        content: String,
    },
}

/// Rendered chart ready to be served or embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub kind: ChartKind,
    pub title: &'static str,
    pub width: f32,
    pub height: f32,
    pub elements: Vec<ChartElement>,
}

impl ChartImage {
    fn new(kind: ChartKind, width: f32, height: f32) -> Self {
        let mut chart = Self {
            kind,
            title: kind.title(),
            width,
            height,
            elements: vec![ChartElement::Rect {
                x: 0.0,
                y: 0.0,
                width,
                height,
                fill: Color::WHITE,
                stroke: None,
            }],
        };
        chart.elements.push(ChartElement::Text {
            x: width / 2.0,
            y: 28.0,
            size: 16.0,
            bold: true,
            anchor: TextAnchor::Middle,
            color: Color::BLACK,
            content: kind.title().to_string(),
        });
        chart
    }

    fn text(&mut self, x: f32, y: f32, size: f32, anchor: TextAnchor, content: &str) {
        self.text_colored(x, y, size, anchor, Color::BLACK, content);
    }

    fn text_colored(
        &mut self,
        x: f32,
        y: f32,
        size: f32,
        anchor: TextAnchor,
        color: Color,
        content: &str,
    ) {
        self.elements.push(ChartElement::Text {
            x,
            y,
            size,
            bold: false,
            anchor,
            color,
            content: content.to_string(),
        });
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
            w = self.width,
            h = self.height
        );
        let _ = write!(svg, "<title>{}</title>", escape_xml(self.title));

        for element in &self.elements {
            match element {
                ChartElement::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    stroke,
                } => {
                    let _ = write!(
                        svg,
                        "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" fill=\"{}\"",
                        fill.hex()
                    );
                    if let Some(stroke) = stroke {
                        let _ = write!(svg, " stroke=\"{}\"", stroke.hex());
                    }
                    svg.push_str("/>");
                }
                ChartElement::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    color,
                } => {
                    let _ = write!(
                        svg,
                        "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\" stroke=\"{}\"/>",
                        color.hex()
                    );
                }
                ChartElement::Text {
                    x,
                    y,
                    size,
                    bold,
                    anchor,
                    color,
                    content,
                } => {
                    let anchor = match anchor {
                        TextAnchor::Start => "start",
                        TextAnchor::Middle => "middle",
                        TextAnchor::End => "end",
                    };
                    let weight = if *bold { "bold" } else { "normal" };
                    let _ = write!(
                        svg,
                        "<text x=\"{x}\" y=\"{y}\" font-family=\"Helvetica, Arial, sans-serif\" font-size=\"{size}\" font-weight=\"{weight}\" text-anchor=\"{anchor}\" fill=\"{}\">{}</text>",
                        color.hex(),
                        escape_xml(content)
                    );
                }
            }
        }

        svg.push_str("</svg>");
        svg
    }
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const WIDTH: f32 = 600.0;
const HEIGHT: f32 = 400.0;
const TOP: f32 = 50.0;
const BOTTOM: f32 = 330.0;

/// Bar chart of domain averages on a fixed 0-5 axis.
pub fn summary_chart(averages: &[DomainAverage]) -> ChartImage {
    let mut chart = ChartImage::new(ChartKind::Summary, WIDTH, HEIGHT);
    let left = 60.0;
    let right = WIDTH - 20.0;
    let max = f32::from(MaturityLevel::MAX);
    let scale = (BOTTOM - TOP) / max;

    for tick in 0..=MaturityLevel::MAX {
        let y = BOTTOM - f32::from(tick) * scale;
        chart.elements.push(ChartElement::Line {
            x1: left,
            y1: y,
            x2: right,
            y2: y,
            color: if tick == 0 { Color::BLACK } else { Color::GRID },
        });
        chart.text(left - 8.0, y + 4.0, 11.0, TextAnchor::End, &tick.to_string());
    }
    chart.elements.push(ChartElement::Line {
        x1: left,
        y1: TOP,
        x2: left,
        y2: BOTTOM,
        color: Color::BLACK,
    });

    if averages.is_empty() {
        return chart;
    }

    let slot = (right - left) / averages.len() as f32;
    let bar_width = slot * 0.6;
    for (position, entry) in averages.iter().enumerate() {
        let center = left + slot * (position as f32 + 0.5);
        let value = (entry.average as f32).clamp(0.0, max);
        let height = value * scale;
        chart.elements.push(ChartElement::Rect {
            x: center - bar_width / 2.0,
            y: BOTTOM - height,
            width: bar_width,
            height,
            fill: Color::TEAL,
            stroke: None,
        });
        chart.text(
            center,
            BOTTOM - height - 6.0,
            11.0,
            TextAnchor::Middle,
            &format_score(entry.average),
        );
        chart.text(center, BOTTOM + 20.0, 11.0, TextAnchor::Middle, entry.domain);
    }

    chart
}

/// Annotated heatmap of every criterion rating, one row per domain.
pub fn heatmap_chart(rows: &[HeatmapRow]) -> ChartImage {
    let mut chart = ChartImage::new(ChartKind::Heatmap, WIDTH, HEIGHT);
    let left = 170.0;
    let right = WIDTH - 20.0;
    let columns = rows.iter().map(|row| row.scores.len()).max().unwrap_or(0);
    if rows.is_empty() || columns == 0 {
        return chart;
    }

    let cell_width = (right - left) / columns as f32;
    let cell_height = (BOTTOM - TOP) / rows.len() as f32;

    for (row_index, row) in rows.iter().enumerate() {
        let top = TOP + cell_height * row_index as f32;
        chart.text(
            left - 8.0,
            top + cell_height / 2.0 + 4.0,
            11.0,
            TextAnchor::End,
            row.domain,
        );

        for (column, score) in row.scores.iter().enumerate() {
            let x = left + cell_width * column as f32;
            let fill = score.map(ylgnbu).unwrap_or(Color::UNRATED);
            chart.elements.push(ChartElement::Rect {
                x,
                y: top,
                width: cell_width,
                height: cell_height,
                fill,
                stroke: Some(Color::WHITE),
            });
            let label = score.map(|value| value.to_string()).unwrap_or_else(|| "-".to_string());
            let ink = if fill.luminance() < 0.5 {
                Color::WHITE
            } else {
                Color::BLACK
            };
            chart.text_colored(
                x + cell_width / 2.0,
                top + cell_height / 2.0 + 5.0,
                14.0,
                TextAnchor::Middle,
                ink,
                &label,
            );
        }
    }

    for column in 0..columns {
        chart.text(
            left + cell_width * (column as f32 + 0.5),
            BOTTOM + 20.0,
            11.0,
            TextAnchor::Middle,
            &format!("C{}", column + 1),
        );
    }

    chart
}

const YLGNBU: [Color; 9] = [
    Color::rgb(255, 255, 217),
    Color::rgb(237, 248, 177),
    Color::rgb(199, 233, 180),
    Color::rgb(127, 205, 187),
    Color::rgb(65, 182, 196),
    Color::rgb(29, 145, 192),
    Color::rgb(34, 94, 168),
    Color::rgb(37, 52, 148),
    Color::rgb(8, 29, 88),
];

/// Yellow-green-blue ramp over the 0-5 scale.
fn ylgnbu(score: u8) -> Color {
    let t = f32::from(score.min(MaturityLevel::MAX)) / f32::from(MaturityLevel::MAX);
    let position = t * (YLGNBU.len() - 1) as f32;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(YLGNBU.len() - 1);
    let fraction = position - lower as f32;
    let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * fraction).round() as u8;
    let (a, b) = (YLGNBU[lower], YLGNBU[upper]);
    Color::rgb(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
}
