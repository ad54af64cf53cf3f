//! HTML chart pages for scope timings
//!
//! Each chart is an inline SVG line plot of one scope's elapsed times by
//! entry index, with flat p50/p95/p99 reference lines. Pages are fully
//! self-contained (no scripts, no external assets).

use crate::stats::{Percentiles, TimeUnit};
use std::fmt::Write as _;

const SERIES_COLOR: &str = "#4a90d9";
const PERCENTILE_COLORS: [(&str, &str); 3] = [
    ("P50", "#5cb85c"),
    ("P95", "#f0ad4e"),
    ("P99", "#d9534f"),
];
const Y_TICKS: usize = 5;
const X_TICKS: usize = 6;

/// Chart dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
        }
    }
}

/// Line chart of one scope's elapsed times
#[derive(Debug, Clone)]
pub struct TimingsChart {
    title: String,
    series_name: String,
    unit: TimeUnit,
    values: Vec<f64>,
    percentiles: Option<Percentiles>,
    size: ChartSize,
}

impl TimingsChart {
    /// Create a chart for `values`, plotted against their 1-based index
    pub fn new(
        title: impl Into<String>,
        series_name: impl Into<String>,
        unit: TimeUnit,
        values: Vec<f64>,
    ) -> Self {
        Self {
            title: title.into(),
            series_name: series_name.into(),
            unit,
            values,
            percentiles: None,
            size: ChartSize::default(),
        }
    }

    /// Draw p50/p95/p99 as horizontal lines across the chart
    pub fn with_percentiles(mut self, percentiles: Percentiles) -> Self {
        self.percentiles = Some(percentiles);
        self
    }

    pub fn with_size(mut self, size: ChartSize) -> Self {
        self.size = size;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Top of the y axis: largest plotted value plus 10%
    fn y_max(&self) -> f64 {
        let data_max = self.values.iter().copied().fold(0.0_f64, f64::max);
        let p_max = match self.percentiles {
            Some(p) => p.p50.max(p.p95).max(p.p99),
            None => 0.0,
        };
        let top = data_max.max(p_max) * 1.1;
        if top > 0.0 && top.is_finite() {
            top
        } else {
            1.0
        }
    }

    /// Render the chart as an `<svg>` element
    pub fn render_svg(&self) -> String {
        let width = self.size.width as f64;
        let height = self.size.height as f64;
        // 10% left/right/top, 15% bottom
        let left = width * 0.10;
        let right = width * 0.90;
        let top = height * 0.10;
        let bottom = height * 0.85;
        let y_max = self.y_max();

        let x_at = |i: usize| -> f64 {
            if self.values.len() <= 1 {
                (left + right) / 2.0
            } else {
                left + (right - left) * i as f64 / (self.values.len() - 1) as f64
            }
        };
        let y_at = |v: f64| -> f64 { bottom - (bottom - top) * (v / y_max).clamp(0.0, 1.0) };

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg class="chart" xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.size.width,
            h = self.size.height
        );
        let _ = writeln!(
            svg,
            r#"  <text class="chart-title" x="{:.1}" y="{:.1}">{}</text>"#,
            left,
            top / 2.0,
            escape_html(&self.title)
        );

        // Axes
        let _ = writeln!(
            svg,
            r#"  <line class="axis" x1="{left:.1}" y1="{bottom:.1}" x2="{right:.1}" y2="{bottom:.1}"/>"#
        );
        let _ = writeln!(
            svg,
            r#"  <line class="axis" x1="{left:.1}" y1="{top:.1}" x2="{left:.1}" y2="{bottom:.1}"/>"#
        );
        let _ = writeln!(
            svg,
            r#"  <text class="axis-label" x="{:.1}" y="{:.1}">Time ({})</text>"#,
            left,
            top - 8.0,
            self.unit
        );

        for tick in 0..=Y_TICKS {
            let value = y_max * tick as f64 / Y_TICKS as f64;
            let y = y_at(value);
            let _ = writeln!(
                svg,
                r#"  <line class="grid" x1="{left:.1}" y1="{y:.1}" x2="{right:.1}" y2="{y:.1}"/>"#
            );
            let _ = writeln!(
                svg,
                r#"  <text class="tick" x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#,
                left - 6.0,
                y + 4.0,
                format_tick(value)
            );
        }

        if !self.values.is_empty() {
            let n = self.values.len();
            let ticks = X_TICKS.min(n);
            for t in 0..ticks {
                let i = if ticks == 1 {
                    0
                } else {
                    t * (n - 1) / (ticks - 1)
                };
                let _ = writeln!(
                    svg,
                    r#"  <text class="tick" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
                    x_at(i),
                    bottom + 18.0,
                    i + 1
                );
            }

            let points: Vec<String> = self
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| format!("{:.2},{:.2}", x_at(i), y_at(*v)))
                .collect();
            let _ = writeln!(
                svg,
                r#"  <polyline class="series" fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
                SERIES_COLOR,
                points.join(" ")
            );
        }

        let mut legend: Vec<(String, &str)> = vec![(self.series_name.clone(), SERIES_COLOR)];
        if let Some(p) = self.percentiles {
            for ((name, color), value) in PERCENTILE_COLORS.iter().zip([p.p50, p.p95, p.p99]) {
                let y = y_at(value);
                let _ = writeln!(
                    svg,
                    r#"  <line class="percentile" stroke="{color}" stroke-dasharray="6 4" x1="{left:.1}" y1="{y:.1}" x2="{right:.1}" y2="{y:.1}"><title>{name}: {}</title></line>"#,
                    format_tick(value)
                );
                let label = format!("{} ({} {})", name, format_tick(value), self.unit);
                legend.push((label, *color));
            }
        }

        for (i, (label, color)) in legend.iter().enumerate() {
            let x = left + i as f64 * (right - left) / legend.len() as f64;
            let y = height * 0.95;
            let _ = writeln!(
                svg,
                r#"  <rect x="{x:.1}" y="{:.1}" width="14" height="4" fill="{color}"/>"#,
                y - 4.0
            );
            let _ = writeln!(
                svg,
                r#"  <text class="legend" x="{:.1}" y="{y:.1}">{}</text>"#,
                x + 20.0,
                escape_html(label)
            );
        }

        svg.push_str("</svg>\n");
        svg
    }
}

/// A page holding one or more charts in a flex layout
#[derive(Debug, Clone, Default)]
pub struct ChartPage {
    charts: Vec<TimingsChart>,
}

impl ChartPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_chart(&mut self, chart: TimingsChart) {
        self.charts.push(chart);
    }

    pub fn charts(&self) -> &[TimingsChart] {
        &self.charts
    }

    /// Generate the complete HTML document
    pub fn to_html(&self) -> String {
        let title = self
            .charts
            .first()
            .map(|c| c.title().to_string())
            .unwrap_or_else(|| "Scope Timings".to_string());

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n");
        html.push_str("<html lang=\"en\">\n");
        html.push_str("<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        html.push_str(
            "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        let _ = writeln!(html, "    <title>{}</title>", escape_html(&title));
        html.push_str("    <style>");
        html.push_str(generate_styles());
        html.push_str("</style>\n");
        html.push_str("</head>\n");
        html.push_str("<body>\n");
        html.push_str("<div class=\"page\">\n");
        for chart in &self.charts {
            html.push_str("<div class=\"chart-box\">\n");
            html.push_str(&chart.render_svg());
            html.push_str("</div>\n");
        }
        html.push_str("</div>\n");
        html.push_str("</body>\n");
        html.push_str("</html>\n");
        html
    }
}

/// Escape HTML special characters
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn format_tick(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1000.0 {
        format!("{:.0}", value)
    } else if value.abs() >= 1.0 {
        format!("{:.2}", value)
    } else {
        format!("{:.4}", value)
    }
}

fn generate_styles() -> &'static str {
    r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 20px;
            background-color: #f5f5f5;
        }
        .page {
            display: flex;
            flex-wrap: wrap;
            justify-content: center;
            gap: 20px;
        }
        .chart-box {
            background-color: white;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
        }
        .chart-title {
            font-size: 18px;
            font-weight: bold;
            fill: #333;
        }
        .axis {
            stroke: #333;
        }
        .grid {
            stroke: #eee;
        }
        .tick, .axis-label, .legend {
            font-size: 12px;
            fill: #555;
        }
        "#
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> TimingsChart {
        TimingsChart::new(
            "Analysis for scope: parse",
            "parse",
            TimeUnit::Milliseconds,
            vec![1.0, 4.0, 2.0, 8.0],
        )
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a&b"), "a&amp;b");
        assert_eq!(escape_html("\"test\""), "&quot;test&quot;");
        assert_eq!(escape_html("'test'"), "&#39;test&#39;");
    }

    #[test]
    fn test_svg_has_one_point_per_value() {
        let svg = chart().render_svg();
        let points = svg
            .split("points=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        assert_eq!(points.split(' ').count(), 4);
    }

    #[test]
    fn test_percentile_lines() {
        let svg = chart()
            .with_percentiles(Percentiles {
                p50: 3.0,
                p95: 7.0,
                p99: 7.8,
            })
            .render_svg();
        assert_eq!(svg.matches("class=\"percentile\"").count(), 3);
        assert!(svg.contains("P50 (3.00 ms)"));
        assert!(svg.contains("P99 (7.80 ms)"));
    }

    #[test]
    fn test_without_percentiles() {
        let svg = chart().render_svg();
        assert!(!svg.contains("class=\"percentile\""));
        assert!(svg.contains("Time (ms)"));
    }

    #[test]
    fn test_y_axis_headroom() {
        assert!((chart().y_max() - 8.8).abs() < 1e-9);
        let flat = TimingsChart::new("t", "s", TimeUnit::Seconds, vec![0.0, 0.0]);
        assert_eq!(flat.y_max(), 1.0);
    }

    #[test]
    fn test_single_value_chart() {
        let single = TimingsChart::new("t", "s", TimeUnit::Seconds, vec![2.0]);
        let svg = single.render_svg();
        assert!(svg.contains("<polyline"));
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_empty_chart_renders() {
        let empty = TimingsChart::new("t", "s", TimeUnit::Seconds, Vec::new());
        assert!(empty.is_empty());
        assert!(!empty.render_svg().contains("<polyline"));
    }

    #[test]
    fn test_page_structure_and_escaping() {
        let mut page = ChartPage::new();
        page.add_chart(TimingsChart::new(
            "Analysis for scope: <script>",
            "<script>",
            TimeUnit::Milliseconds,
            vec![1.0],
        ));
        let html = page.to_html();

        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("<style>"));
        assert!(html.contains("<svg"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert_eq!(page.charts().len(), 1);
    }

    #[test]
    fn test_custom_size() {
        let svg = chart()
            .with_size(ChartSize {
                width: 800,
                height: 400,
            })
            .render_svg();
        assert!(svg.contains("width=\"800\" height=\"400\""));
    }
}
