//! Static HTML dashboard for a results file.
//!
//! The page is self-contained: tables plus a few inline SVG charts, no
//! scripts or external assets.

use std::fmt::Write as _;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use convsim_core::analysis::{
    Heatmap, ResultsTable, component_means_by_altruism, correlation_matrix, heatmap_matrix, multi_heatmap,
    overall, pareto_points, rank_distribution_by_altruism, score_buckets_by_altruism, seed_stability_curves,
    stats,
};
use convsim_core::{AnalysisError, Archetype, ResultsFile};

use crate::cli::AnalyzeArgs;
use crate::format::{format_cell, format_float, format_percentage};

const CHART_WIDTH: f64 = 640.0;
const CHART_HEIGHT: f64 = 220.0;
const PARETO_ROWS: usize = 20;

const STYLE: &str = "body{font-family:sans-serif;margin:2em;color:#222}\
table{border-collapse:collapse;margin-bottom:1.5em}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:right}\
th{background:#f0f0f0}td.label{text-align:left}\
tr.frontier td{font-weight:bold}\
svg{border:1px solid #ddd;margin-bottom:1.5em}";

const OVERVIEW_COLUMNS: [&str; 7] = [
    "total_score",
    "player10_score",
    "player10_individual",
    "player10_rank",
    "early_termination",
    "pause_count",
    "length_utilization",
];

const CORRELATION_COLUMNS: [&str; 8] = [
    "altruism_prob",
    "tau_margin",
    "epsilon_fresh",
    "epsilon_mono",
    "total_score",
    "player10_individual",
    "pause_count",
    "early_termination",
];

/// Columns of the dashboard heatmaps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapAxes {
    pub rows: String,
    pub cols: String,
    pub metric: String,
    /// One extra heatmap is drawn per level of this column
    pub facet: String,
}

impl Default for HeatmapAxes {
    fn default() -> Self {
        Self {
            rows: "altruism_prob".to_string(),
            cols: "tau_margin".to_string(),
            metric: "total_score".to_string(),
            facet: "altruism_prob".to_string(),
        }
    }
}

impl From<&AnalyzeArgs> for HeatmapAxes {
    fn from(args: &AnalyzeArgs) -> Self {
        Self {
            rows: args.param1.clone(),
            cols: args.param2.clone(),
            metric: args.metric.clone(),
            facet: args.fixed.clone(),
        }
    }
}

/// Render the dashboard page for a results file
pub fn render_dashboard(file: &ResultsFile, axes: &HeatmapAxes) -> Result<String, AnalysisError> {
    let table = ResultsTable::from_results(&file.results);
    let title = file.run_name().unwrap_or("results");

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title><style>{STYLE}</style></head><body>\n",
        escape_html(title)
    );
    let _ = writeln!(html, "<h1>{}</h1>", escape_html(title));

    metadata_section(&mut html, file);
    overview_section(&mut html, &table);
    if !table.is_empty() {
        altruism_section(&mut html, &table)?;
        pareto_section(&mut html, &table)?;
        rank_section(&mut html, file)?;
        heatmap_section(&mut html, &table, axes);
        stability_section(&mut html, &table)?;
        correlation_section(&mut html, &table);
    }

    html.push_str("</body></html>\n");
    Ok(html)
}

/// Render and write the dashboard, creating parent directories
pub fn write_dashboard(file: &ResultsFile, path: &Path, axes: &HeatmapAxes) -> color_eyre::Result<()> {
    let html = render_dashboard(file, axes)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, html)
        .wrap_err_with(|| format!("Failed to write dashboard {}", path.display()))?;
    tracing::info!(path = %path.display(), "Wrote dashboard");
    Ok(())
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn metadata_section(html: &mut String, file: &ResultsFile) {
    html.push_str("<h2>Experiment</h2>\n<table>\n");
    let mut row = |label: &str, value: String| {
        let _ = writeln!(
            html,
            "<tr><td class=\"label\">{label}</td><td>{}</td></tr>",
            escape_html(&value)
        );
    };
    row("runs", file.len().to_string());
    if let Some(meta) = &file.metadata {
        row("created", meta.created_at.to_string());
        row("configurations", meta.total_configurations.to_string());
        row("simulations per configuration", meta.simulations.to_string());
        row("base seed", meta.base_seed.to_string());
        row("engine", meta.engine.clone());
        row("grid", meta.parameter_grid.describe());
    }
    html.push_str("</table>\n");
}

fn overview_section(html: &mut String, table: &ResultsTable) {
    html.push_str("<h2>Overview</h2>\n");
    let columns: Vec<&str> = OVERVIEW_COLUMNS
        .iter()
        .copied()
        .filter(|c| table.dtype(c).is_some_and(|d| d.is_numeric()))
        .collect();
    let Ok(summaries) = overall(table, &columns) else {
        html.push_str("<p>(no data)</p>\n");
        return;
    };
    html.push_str("<table>\n<tr><th>metric</th><th>count</th><th>mean</th><th>std</th></tr>\n");
    for s in summaries {
        let _ = writeln!(
            html,
            "<tr><td class=\"label\">{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            s.column,
            s.count,
            format_float(Some(s.mean), 3),
            format_float(Some(s.std), 3)
        );
    }
    html.push_str("</table>\n");
}

fn altruism_section(html: &mut String, table: &ResultsTable) -> Result<(), AnalysisError> {
    html.push_str("<h2>Scores by altruism</h2>\n");
    let buckets = score_buckets_by_altruism(table)?;
    let bars: Vec<(String, f64, Option<f64>)> = buckets
        .iter()
        .map(|b| {
            let p10 = (!b.player10.is_empty()).then(|| stats::mean(&b.player10));
            (b.altruism.to_string(), stats::mean(&b.total), p10)
        })
        .collect();
    bar_chart(html, &bars);

    let components = component_means_by_altruism(table)?;
    html.push_str("<table>\n<tr><th>altruism</th>");
    for (name, _) in &components.series {
        let _ = write!(html, "<th>{name}</th>");
    }
    html.push_str("</tr>\n");
    for (i, level) in components.levels.iter().enumerate() {
        let _ = write!(html, "<tr><td class=\"label\">{}</td>", format_cell(level, 2));
        for (_, means) in &components.series {
            let _ = write!(html, "<td>{}</td>", format_float(means.get(i).copied(), 3));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
    Ok(())
}

/// Grouped bars: shared total in blue, Player10 mean total in orange.
///
/// Bars grow up or down from a zero baseline.
fn bar_chart(html: &mut String, bars: &[(String, f64, Option<f64>)]) {
    let values: Vec<f64> = bars
        .iter()
        .flat_map(|(_, total, p10)| [Some(*total), *p10])
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    let low = values.iter().copied().fold(0.0_f64, f64::min);
    let high = values.iter().copied().fold(0.0_f64, f64::max);
    if bars.is_empty() || high <= low {
        return;
    }
    let slot = CHART_WIDTH / bars.len() as f64;
    let bar = slot / 3.0;
    let plot = CHART_HEIGHT - 20.0;
    let scale = plot / (high - low);
    let baseline = high * scale;
    let _ = writeln!(html, "<svg width=\"{CHART_WIDTH}\" height=\"{CHART_HEIGHT}\">");
    for (i, (label, total, p10)) in bars.iter().enumerate() {
        let x = i as f64 * slot + bar / 2.0;
        for (offset, value, color) in [(0.0, Some(*total), "#4c78a8"), (bar, *p10, "#f58518")] {
            let Some(value) = value.filter(|v| v.is_finite()) else {
                continue;
            };
            let h = value.abs() * scale;
            let y = if value >= 0.0 { baseline - h } else { baseline };
            let _ = writeln!(
                html,
                "<rect x=\"{:.1}\" y=\"{y:.1}\" width=\"{bar:.1}\" height=\"{h:.1}\" fill=\"{color}\"><title>{}</title></rect>",
                x + offset,
                format_float(Some(value), 3)
            );
        }
        let _ = writeln!(
            html,
            "<text x=\"{:.1}\" y=\"{}\" font-size=\"12\">{}</text>",
            x,
            CHART_HEIGHT - 5.0,
            escape_html(label)
        );
    }
    let _ = writeln!(
        html,
        "<line x1=\"0\" y1=\"{baseline:.1}\" x2=\"{CHART_WIDTH}\" y2=\"{baseline:.1}\" stroke=\"#999\"/>"
    );
    html.push_str("</svg>\n");
}

fn pareto_section(html: &mut String, table: &ResultsTable) -> Result<(), AnalysisError> {
    let points = pareto_points(table)?;
    if points.is_empty() {
        return Ok(());
    }
    html.push_str("<h2>Player10 individual vs shared total</h2>\n");
    let frontier: Vec<bool> = points
        .iter()
        .map(|p| {
            !points.iter().any(|q| {
                q.total >= p.total && q.player10 >= p.player10 && (q.total > p.total || q.player10 > p.player10)
            })
        })
        .collect();
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| points[b].total.total_cmp(&points[a].total));

    html.push_str(
        "<table>\n<tr><th>altruism</th><th>tau</th><th>eps fresh</th><th>eps mono</th>\
         <th>total</th><th>player10 individual</th><th>early</th><th>runs</th></tr>\n",
    );
    for &i in order.iter().take(PARETO_ROWS) {
        let p = &points[i];
        let class = if frontier[i] { " class=\"frontier\"" } else { "" };
        let _ = writeln!(
            html,
            "<tr{class}><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            format_cell(&p.altruism, 2),
            format_cell(&p.tau, 3),
            format_cell(&p.fresh, 3),
            format_cell(&p.mono, 3),
            format_float(Some(p.total), 3),
            format_float(Some(p.player10), 3),
            p.early.map_or_else(|| "n/a".to_string(), format_percentage),
            p.runs
        );
    }
    html.push_str("</table>\n");
    Ok(())
}

/// Where the Player10 seats finished, per altruism level
fn rank_section(html: &mut String, file: &ResultsFile) -> Result<(), AnalysisError> {
    let seats = ResultsTable::player_metrics_long(&file.results);
    if seats.is_empty() {
        return Ok(());
    }
    let distributions = rank_distribution_by_altruism(&seats, Archetype::Player10.class_name())?;
    if distributions.is_empty() {
        return Ok(());
    }
    html.push_str(
        "<h2>Player10 rank distribution</h2>\n<table>\n<tr><th>altruism</th><th>seats</th><th>mean</th>\
         <th>best</th><th>q1</th><th>median</th><th>q3</th><th>worst</th></tr>\n",
    );
    for d in &distributions {
        let q = |p: f64| format_float(Some(stats::quantile_sorted(&d.ranks, p)), 2);
        let _ = writeln!(
            html,
            "<tr><td class=\"label\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            format_cell(&d.altruism, 2),
            d.ranks.len(),
            format_float(Some(stats::mean(&d.ranks)), 2),
            q(0.0),
            q(0.25),
            q(0.5),
            q(0.75),
            q(1.0)
        );
    }
    html.push_str("</table>\n");
    Ok(())
}

fn heatmap_section(html: &mut String, table: &ResultsTable, axes: &HeatmapAxes) {
    let HeatmapAxes {
        rows,
        cols,
        metric,
        facet,
    } = axes;
    let _ = writeln!(
        html,
        "<h2>Mean {}: {} by {}</h2>",
        escape_html(metric),
        escape_html(rows),
        escape_html(cols)
    );
    match heatmap_matrix(table, rows, cols, metric) {
        Ok(Some(heatmap)) => {
            let range = value_range(std::iter::once(&heatmap));
            heatmap_table(html, &heatmap, axes, range);
        }
        Ok(None) => html.push_str("<p>(no data)</p>\n"),
        Err(e) => {
            let _ = writeln!(html, "<p>Heatmap unavailable: {}</p>", escape_html(&e.to_string()));
        }
    }

    if facet == rows || facet == cols {
        return;
    }
    match multi_heatmap(table, facet, rows, cols, metric) {
        Ok(facets) if facets.len() > 1 => {
            let _ = writeln!(
                html,
                "<h2>Mean {} per {}</h2>",
                escape_html(metric),
                escape_html(facet)
            );
            let range = value_range(facets.iter().map(|(_, h)| h));
            for (level, heatmap) in &facets {
                let _ = writeln!(html, "<h3>{} = {}</h3>", escape_html(facet), format_cell(level, 3));
                heatmap_table(html, heatmap, axes, range);
            }
        }
        Ok(_) => {}
        Err(e) => {
            let _ = writeln!(
                html,
                "<p>Faceted heatmaps unavailable: {}</p>",
                escape_html(&e.to_string())
            );
        }
    }
}

/// Smallest and largest filled cell across heatmaps
fn value_range<'a>(heatmaps: impl Iterator<Item = &'a Heatmap>) -> (f64, f64) {
    heatmaps
        .flat_map(|h| h.values.iter().flatten().flatten().copied())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Cells shaded on a shared `(low, high)` scale
fn heatmap_table(html: &mut String, heatmap: &Heatmap, axes: &HeatmapAxes, (low, high): (f64, f64)) {
    let _ = write!(
        html,
        "<table>\n<tr><th>{} \\ {}</th>",
        escape_html(&axes.rows),
        escape_html(&axes.cols)
    );
    for col in &heatmap.cols {
        let _ = write!(html, "<th>{}</th>", escape_html(&format_cell(col, 3)));
    }
    html.push_str("</tr>\n");
    for (row, values) in heatmap.rows.iter().zip(&heatmap.values) {
        let _ = write!(html, "<tr><th>{}</th>", escape_html(&format_cell(row, 2)));
        for value in values {
            match value {
                Some(v) => {
                    let t = if high > low { (v - low) / (high - low) } else { 0.5 };
                    let _ = write!(
                        html,
                        "<td style=\"background:rgba(76,120,168,{:.2})\">{}</td>",
                        0.1 + 0.8 * t,
                        format_float(Some(*v), 3)
                    );
                }
                None => html.push_str("<td>n/a</td>"),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
}

fn stability_section(html: &mut String, table: &ResultsTable) -> Result<(), AnalysisError> {
    let curves = seed_stability_curves(table, "altruism_prob", "total_score", "seed")?;
    if curves.is_empty() {
        return Ok(());
    }
    html.push_str("<h2>Seed stability of the mean total score</h2>\n");

    let all = curves.iter().flat_map(|(_, c)| c.iter().copied());
    let (low, high) = all.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let longest = curves.iter().map(|(_, c)| c.len()).max().unwrap_or(1).max(2);
    let span = if high > low { high - low } else { 1.0 };
    let palette = ["#4c78a8", "#f58518", "#54a24b", "#e45756", "#72b7b2", "#b279a2"];

    let _ = writeln!(html, "<svg width=\"{CHART_WIDTH}\" height=\"{CHART_HEIGHT}\">");
    for (i, (_, curve)) in curves.iter().enumerate() {
        let points: Vec<String> = curve
            .iter()
            .enumerate()
            .map(|(k, v)| {
                let x = k as f64 / (longest - 1) as f64 * CHART_WIDTH;
                let y = CHART_HEIGHT - (v - low) / span * CHART_HEIGHT;
                format!("{x:.1},{y:.1}")
            })
            .collect();
        let _ = writeln!(
            html,
            "<polyline fill=\"none\" stroke=\"{}\" points=\"{}\"/>",
            palette[i % palette.len()],
            points.join(" ")
        );
    }
    html.push_str("</svg>\n");

    html.push_str("<table>\n<tr><th>altruism</th><th>runs</th><th>final mean</th></tr>\n");
    for (level, curve) in &curves {
        let _ = writeln!(
            html,
            "<tr><td class=\"label\">{}</td><td>{}</td><td>{}</td></tr>",
            format_cell(level, 2),
            curve.len(),
            format_float(curve.last().copied(), 3)
        );
    }
    html.push_str("</table>\n");
    Ok(())
}

fn correlation_section(html: &mut String, table: &ResultsTable) {
    let matrix = correlation_matrix(table, &CORRELATION_COLUMNS);
    if matrix.columns.is_empty() {
        return;
    }
    html.push_str("<h2>Correlations</h2>\n<table>\n<tr><th></th>");
    for name in &matrix.columns {
        let _ = write!(html, "<th>{name}</th>");
    }
    html.push_str("</tr>\n");
    for (name, row) in matrix.columns.iter().zip(&matrix.values) {
        let _ = write!(html, "<tr><th>{name}</th>");
        for value in row {
            let _ = write!(html, "<td>{}</td>", format_float(Some(*value), 2));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use convsim_core::{PlayerMetrics, RunResult, SimulationConfig};

    fn run(altruism: f64, seed: u64, total: f64) -> RunResult {
        let p10 = PlayerMetrics {
            class_name: "Player10".to_string(),
            rank: 1 + (seed % 2) as u32,
            ..Default::default()
        };
        RunResult {
            config: SimulationConfig {
                altruism_prob: altruism,
                seed,
                ..Default::default()
            },
            total_score: total,
            player10_total_mean: Some(total / 2.0),
            player10_individual_mean: Some(total / 4.0),
            player_metrics: [("p10_1".to_string(), p10)].into(),
            conversation_length: 10,
            ..Default::default()
        }
    }

    fn sample_file() -> ResultsFile {
        ResultsFile {
            metadata: None,
            results: vec![run(0.0, 1, 4.0), run(0.0, 2, 6.0), run(0.5, 3, 8.0), run(0.5, 4, 2.0)],
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn renders_every_section() {
        let html = render_dashboard(&sample_file(), &HeatmapAxes::default()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        for heading in [
            "Overview",
            "Scores by altruism",
            "Player10 individual vs shared total",
            "Player10 rank distribution",
            "Mean total_score: altruism_prob by tau_margin",
            "Seed stability",
            "Correlations",
        ] {
            assert!(html.contains(heading), "missing {heading}");
        }
        // facet column equals the row column
        assert!(!html.contains("<h3>"));
        assert!(html.contains("<svg"));
        assert!(html.ends_with("</body></html>\n"));
    }

    #[test]
    fn rank_table_summarises_player10_seats() {
        let html = render_dashboard(&sample_file(), &HeatmapAxes::default()).unwrap();
        // altruism 0.0 holds ranks 2 and 1
        assert!(html.contains(
            "<tr><td class=\"label\">0.00</td><td>2</td><td>1.50</td><td>1.00</td><td>1.25</td>\
             <td>1.50</td><td>1.75</td><td>2.00</td></tr>"
        ));
    }

    #[test]
    fn heatmap_axes_and_facets_follow_options() {
        let axes = HeatmapAxes {
            rows: "seed".to_string(),
            cols: "tau_margin".to_string(),
            metric: "player10_individual".to_string(),
            facet: "altruism_prob".to_string(),
        };
        let html = render_dashboard(&sample_file(), &axes).unwrap();
        assert!(html.contains("Mean player10_individual: seed by tau_margin"));
        assert!(html.contains("Mean player10_individual per altruism_prob"));
        assert!(html.contains("<h3>altruism_prob = 0.000</h3>"));
        assert!(html.contains("<h3>altruism_prob = 0.500</h3>"));

        let broken = HeatmapAxes {
            metric: "players".to_string(),
            ..axes
        };
        let html = render_dashboard(&sample_file(), &broken).unwrap();
        assert!(html.contains("Heatmap unavailable: column `players` is not numeric"));
        assert!(html.contains("Correlations"));
    }

    #[test]
    fn bars_hang_below_zero_for_negative_means() {
        let mut html = String::new();
        bar_chart(&mut html, &[("low".to_string(), -2.0, Some(-1.0))]);
        assert_eq!(html.matches("<rect").count(), 2);
        // every bar starts at the baseline, which sits at the top
        assert!(html.contains("y1=\"0.0\""));
        assert_eq!(html.matches("y=\"0.0\"").count(), 2);

        let mut mixed = String::new();
        bar_chart(&mut mixed, &[("a".to_string(), -1.0, None), ("b".to_string(), 3.0, Some(1.0))]);
        assert_eq!(mixed.matches("<rect").count(), 3);
        assert!(mixed.contains("height=\"50.0\""));

        let mut flat = String::new();
        bar_chart(&mut flat, &[("zero".to_string(), 0.0, None)]);
        assert!(flat.is_empty());
    }

    #[test]
    fn empty_file_renders_header_only() {
        let file = ResultsFile {
            metadata: None,
            results: Vec::new(),
        };
        let html = render_dashboard(&file, &HeatmapAxes::default()).unwrap();
        assert!(html.contains("<h1>results</h1>"));
        assert!(!html.contains("Correlations"));
    }
}
