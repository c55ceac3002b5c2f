use crate::{CategoryCounts, MIXED_LABEL, OTHER_LABEL, ReportError, Result, SPECIAL_LABEL};
use handlebars::Handlebars;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 800.0;
const CENTER_X: f64 = 400.0;
const CENTER_Y: f64 = 420.0;
const RADIUS: f64 = 220.0;
const HOLE_RATIO: f64 = 0.5;
const LABEL_RATIO: f64 = 1.2;
const START_ANGLE: f64 = 140.0;
const BAR_WIDTH: f64 = 40.0;

/// Fill colour for categories missing from the palette
pub const FALLBACK_COLOR: &str = "black";

const PALETTE: [(&str, &str); 18] = [
    ("Arabic", "#2ca02c"),
    ("Armenian", "#ed9809"),
    ("Bengali", "#17becf"),
    ("Cyrillic", "#ffd10a"),
    ("Devanagari", "#ff7f0e"),
    ("Georgian", "#fa0006"),
    ("Greek", "#1f77b4"),
    ("Gurmukhi", "#ff9896"),
    ("Han", "#d62728"),
    ("Hebrew", "#0d62ab"),
    ("Latin", "#010988"),
    ("Tamil", "#20ff88"),
    ("Telugu", "#98df8a"),
    ("Thai", "#940022"),
    ("Common", "#eeeeee"),
    (SPECIAL_LABEL, "purple"),
    (MIXED_LABEL, "#e377c2"),
    (OTHER_LABEL, "#cccccc"),
];

/// Colour a category is drawn with
pub fn category_color(label: &str) -> &'static str {
    PALETTE
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_COLOR)
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub total: usize,
    pub wedges: Vec<WedgeData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WedgeData {
    pub label: String,
    pub count: usize,
    pub fraction: f64,
    /// "Latin (500, 83.3%)"
    pub caption: String,
    /// Text bar scaled to the fraction, for the terminal summary
    pub bar: String,
    pub color: String,
    pub path: String,
    pub leader: String,
    pub label_x: String,
    pub label_y: String,
    pub anchor: String,
}

/// Renders category counts as a donut chart (SVG) or a plain text summary
pub struct ChartRenderer {
    template_engine: Handlebars<'static>,
}

impl ChartRenderer {
    pub fn new() -> Result<Self> {
        let mut template_engine = Handlebars::new();

        template_engine
            .register_template_string("svg", include_str!("../templates/pie_chart.svg.hbs"))
            .map_err(|e| ReportError::Template(format!("Failed to register SVG template: {}", e)))?;

        template_engine
            .register_template_string("text", include_str!("../templates/summary.txt.hbs"))
            .map_err(|e| {
                ReportError::Template(format!("Failed to register summary template: {}", e))
            })?;

        Ok(Self { template_engine })
    }

    /// Lays out one wedge per category, largest first, counter-clockwise
    /// from 140 degrees
    pub fn chart_data(&self, counts: &CategoryCounts, title: &str) -> ChartData {
        let total = counts.total();
        let mut start = START_ANGLE;
        let mut wedges = Vec::with_capacity(counts.len());

        for (label, count) in counts.sorted() {
            let fraction = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            };
            let end = start + 360.0 * fraction;
            let middle = (start + end) / 2.0;

            let (label_x, label_y) = polar(RADIUS * LABEL_RATIO, middle);
            let (edge_x, edge_y) = polar(RADIUS, middle);
            let (elbow_x, elbow_y) = polar(RADIUS * (1.0 + LABEL_RATIO) / 2.0, middle);
            let anchor = if middle.to_radians().cos() >= 0.0 {
                "start"
            } else {
                "end"
            };

            wedges.push(WedgeData {
                label: label.to_string(),
                count,
                fraction,
                caption: format!("{} ({}, {:.1}%)", label, count, fraction * 100.0),
                bar: "#".repeat((fraction * BAR_WIDTH).round() as usize),
                color: category_color(label).to_string(),
                path: wedge_path(start, end),
                leader: format!(
                    "{:.2},{:.2} {:.2},{:.2}",
                    edge_x, edge_y, elbow_x, elbow_y
                ),
                label_x: format!("{:.2}", label_x),
                label_y: format!("{:.2}", label_y),
                anchor: anchor.to_string(),
            });

            start = end;
        }

        ChartData {
            title: title.to_string(),
            width: WIDTH,
            height: HEIGHT,
            center_x: CENTER_X,
            total,
            wedges,
        }
    }

    pub fn render_svg(&self, counts: &CategoryCounts, title: &str) -> Result<String> {
        let data = self.chart_data(counts, title);
        self.template_engine
            .render("svg", &data)
            .map_err(|e| ReportError::Template(format!("Failed to render SVG: {}", e)))
    }

    pub fn render_text(&self, counts: &CategoryCounts, title: &str) -> Result<String> {
        let data = self.chart_data(counts, title);
        self.template_engine
            .render("text", &data)
            .map_err(|e| ReportError::Template(format!("Failed to render summary: {}", e)))
    }

    pub fn write_svg(
        &self,
        counts: &CategoryCounts,
        title: &str,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render_svg(counts, title)?)?;
        info!("Saved chart in {}", path.display());
        Ok(())
    }
}

// SVG y grows downwards, so angles are flipped to keep counter-clockwise order
fn polar(radius: f64, degrees: f64) -> (f64, f64) {
    let theta = degrees.to_radians();
    (
        CENTER_X + radius * theta.cos(),
        CENTER_Y - radius * theta.sin(),
    )
}

/// Donut segment between two angles. Each arc is split in two halves so no
/// arc spans more than 180 degrees, which also covers a full circle.
fn wedge_path(start: f64, end: f64) -> String {
    let middle = (start + end) / 2.0;
    let inner = RADIUS * HOLE_RATIO;

    let (ox0, oy0) = polar(RADIUS, start);
    let (oxm, oym) = polar(RADIUS, middle);
    let (ox1, oy1) = polar(RADIUS, end);
    let (ix1, iy1) = polar(inner, end);
    let (ixm, iym) = polar(inner, middle);
    let (ix0, iy0) = polar(inner, start);

    format!(
        "M {:.2} {:.2} A {r:.2} {r:.2} 0 0 0 {:.2} {:.2} A {r:.2} {r:.2} 0 0 0 {:.2} {:.2} \
         L {:.2} {:.2} A {h:.2} {h:.2} 0 0 1 {:.2} {:.2} A {h:.2} {h:.2} 0 0 1 {:.2} {:.2} Z",
        ox0,
        oy0,
        oxm,
        oym,
        ox1,
        oy1,
        ix1,
        iy1,
        ixm,
        iym,
        ix0,
        iy0,
        r = RADIUS,
        h = inner,
    )
}
