use std::io::Write;

use color_eyre::eyre::{WrapErr, bail};
use convsim_core::analysis::{
    Heatmap, ResultsTable, bootstrap_ci, grouped, heatmap_matrix, multi_heatmap, overall, pairwise_deltas,
};
use convsim_core::{ResultsFile, load_results};
use tracing::{debug, warn};

use crate::cli::AnalyzeArgs;
use crate::dashboard::{HeatmapAxes, write_dashboard};
use crate::format::{TextTable, format_cell, format_float};

/// Summarised when `--analysis-columns` is not given
const OVERALL_DEFAULT: [&str; 4] = [
    "total_score",
    "player10_score",
    "player10_individual",
    "player10_rank",
];
const POLICY_COLUMNS: [&str; 4] = ["altruism_prob", "tau_margin", "epsilon_fresh", "epsilon_mono"];
const TOP_CONFIGURATIONS: usize = 10;

/// `convsim analyze`, printing to stdout
pub fn analyze(args: &AnalyzeArgs) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    analyze_to(args, &mut out)
}

/// `convsim analyze`, printing to any writer
pub fn analyze_to<W: Write>(args: &AnalyzeArgs, out: &mut W) -> color_eyre::Result<()> {
    let path = &args.results_file;
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    let file = load_results(path).wrap_err("Failed to load results")?;
    if file.is_empty() {
        bail!("No runs found in results file.");
    }
    let table = ResultsTable::from_results(&file.results);
    writeln!(
        out,
        "Loaded {} runs from {}{}",
        file.len(),
        path.display(),
        file.run_name().map(|n| format!(" ({n})")).unwrap_or_default()
    )?;

    if args.analysis {
        print_analysis(args, &table, out)?;
    }
    if args.ci {
        print_bootstrap(args, &table, out)?;
    }
    if args.pairwise {
        match pairwise_deltas(&table, &args.pairwise_group, &args.pairwise_metric) {
            Ok(deltas) => {
                let mut t = TextTable::new([
                    format!("{}_a", args.pairwise_group),
                    format!("{}_b", args.pairwise_group),
                    "delta_mean".to_string(),
                    "cohens_d".to_string(),
                    "n_a".to_string(),
                    "n_b".to_string(),
                ]);
                for d in deltas {
                    t.push_row(vec![
                        format_cell(&d.a, 2),
                        format_cell(&d.b, 2),
                        format_float(Some(d.delta_mean), 2),
                        format_float(Some(d.cohens_d), 2),
                        d.n_a.to_string(),
                        d.n_b.to_string(),
                    ]);
                }
                print_table(out, "Pairwise deltas", &t)?;
            }
            Err(e) => writeln!(out, "Failed to compute pairwise deltas: {e}")?,
        }
    }
    if args.heatmap {
        print_heatmaps(args, &table, out)?;
    }
    if args.validate {
        print_validation(&file, out)?;
    }
    if let Some(dashboard) = &args.dashboard {
        write_dashboard(&file, dashboard, &HeatmapAxes::from(args))?;
        writeln!(out, "Dashboard written to {}", dashboard.display())?;
    }
    Ok(())
}

fn print_table<W: Write>(out: &mut W, title: &str, table: &TextTable) -> std::io::Result<()> {
    write!(out, "\n=== {title} ===\n{}", table.render())
}

fn print_analysis<W: Write>(
    args: &AnalyzeArgs,
    table: &ResultsTable,
    out: &mut W,
) -> color_eyre::Result<()> {
    let requested: Vec<&str> = args
        .analysis_columns
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    let analysis_cols: Vec<&str> = requested.iter().copied().filter(|c| table.has_column(c)).collect();
    let mut missing: Vec<&str> = requested.iter().copied().filter(|c| !table.has_column(c)).collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        missing.dedup();
        warn!(columns = ?missing, "Requested columns not found");
        writeln!(out, "Warning: columns not found in table: {}", missing.join(", "))?;
    }

    writeln!(out, "Column dtypes:")?;
    let dtypes = table.dtypes(&args.dtype_filter);
    if dtypes.is_empty() {
        let note = if args.dtype_filter.is_empty() {
            "(no columns)"
        } else {
            "(no columns match dtype filter)"
        };
        writeln!(out, "{note}")?;
    } else {
        let width = dtypes.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        for (name, dtype) in dtypes {
            writeln!(out, "{name:<width$}  {dtype}")?;
        }
    }

    let is_numeric = |c: &&str| table.dtype(c).is_some_and(|d| d.is_numeric());
    let base: Vec<&str> = if analysis_cols.is_empty() {
        OVERALL_DEFAULT.to_vec()
    } else {
        analysis_cols.clone()
    };
    let overall_cols: Vec<&str> = base.into_iter().filter(is_numeric).collect();

    writeln!(out, "=== OVERALL ===")?;
    if overall_cols.is_empty() {
        writeln!(out, "(no numeric columns available)")?;
    } else {
        let mut t = TextTable::new(["metric", "mean", "std"]);
        for s in overall(table, &overall_cols)? {
            t.push_row(vec![
                s.column,
                format_float(Some(s.mean), 2),
                format_float(Some(s.std), 2),
            ]);
        }
        write!(out, "{}", t.render())?;
    }

    let group_cols: Vec<&str> = POLICY_COLUMNS.iter().copied().filter(|c| table.has_column(c)).collect();
    let metric_base: Vec<&str> = if analysis_cols.is_empty() {
        vec!["total_score"]
    } else {
        analysis_cols
    };
    let metrics: Vec<&str> = metric_base.into_iter().filter(is_numeric).collect();
    if group_cols.is_empty() || metrics.is_empty() {
        writeln!(out, "\n=== Top configurations by total_score ===\n(no data)")?;
        return Ok(());
    }

    let headers = group_cols
        .iter()
        .map(|c| c.to_string())
        .chain(metrics.iter().flat_map(|m| [format!("{m}_mean"), format!("{m}_std")]))
        .chain(std::iter::once("count".to_string()));
    let mut t = TextTable::new(headers);
    for group in grouped(table, &group_cols, &metrics)?.into_iter().take(TOP_CONFIGURATIONS) {
        let mut row: Vec<String> = group.key.iter().map(|k| format_cell(k, 3)).collect();
        for summary in &group.metrics {
            row.push(format_float(Some(summary.mean), 2));
            row.push(format_float(Some(summary.std), 2));
        }
        row.push(group.count.to_string());
        t.push_row(row);
    }
    print_table(out, "Top configurations (group means)", &t)?;
    Ok(())
}

fn print_bootstrap<W: Write>(
    args: &AnalyzeArgs,
    table: &ResultsTable,
    out: &mut W,
) -> std::io::Result<()> {
    let group_cols: Vec<&str> = args
        .ci_group
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    let seed = args.seed.unwrap_or_else(time_seed);
    debug!(seed, "Bootstrap seed");

    match bootstrap_ci(
        table,
        &group_cols,
        &args.ci_metric,
        args.ci_iterations,
        args.ci_confidence,
        seed,
    ) {
        Ok(intervals) => {
            let headers = group_cols
                .iter()
                .map(|c| c.to_string())
                .chain(["mean", "ci_low", "ci_high", "n"].map(String::from));
            let mut t = TextTable::new(headers);
            for ci in intervals {
                let mut row: Vec<String> = ci.key.iter().map(|k| format_cell(k, 3)).collect();
                row.extend([
                    format_float(Some(ci.mean), 2),
                    format_float(Some(ci.low), 2),
                    format_float(Some(ci.high), 2),
                    ci.n.to_string(),
                ]);
                t.push_row(row);
            }
            print_table(out, "Bootstrap confidence intervals", &t)
        }
        Err(e) => writeln!(out, "Failed to compute bootstrap CI: {e}"),
    }
}

fn print_heatmaps<W: Write>(args: &AnalyzeArgs, table: &ResultsTable, out: &mut W) -> std::io::Result<()> {
    let title = format!("{} heatmap", args.metric);
    match heatmap_matrix(table, &args.param1, &args.param2, &args.metric) {
        Ok(Some(heatmap)) => print_table(out, &title, &heatmap_text(args, &heatmap))?,
        Ok(None) => write!(out, "\n=== {title} ===\n(no data)\n")?,
        Err(e) => return writeln!(out, "Failed to compute heatmap: {e}"),
    }
    if args.fixed == args.param1 || args.fixed == args.param2 {
        return Ok(());
    }
    match multi_heatmap(table, &args.fixed, &args.param1, &args.param2, &args.metric) {
        Ok(facets) => {
            for (level, heatmap) in facets {
                let title = format!("{} | {}={}", args.metric, args.fixed, format_cell(&level, 3));
                print_table(out, &title, &heatmap_text(args, &heatmap))?;
            }
            Ok(())
        }
        Err(e) => writeln!(out, "Failed to compute faceted heatmaps: {e}"),
    }
}

fn heatmap_text(args: &AnalyzeArgs, heatmap: &Heatmap) -> TextTable {
    let corner = format!("{} \\ {}", args.param1, args.param2);
    let headers = std::iter::once(corner).chain(heatmap.cols.iter().map(|c| format_cell(c, 3)));
    let mut t = TextTable::new(headers);
    for (row, values) in heatmap.rows.iter().zip(&heatmap.values) {
        let cells = values.iter().map(|v| format_float(*v, 2));
        t.push_row(std::iter::once(format_cell(row, 3)).chain(cells).collect());
    }
    t
}

fn print_validation<W: Write>(file: &ResultsFile, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "\n=== VALIDATION ===")?;
    let Some(report) = file.validate() else {
        return writeln!(out, "(no metadata; nothing to validate)");
    };
    writeln!(out, "configurations: {}", report.declared_configurations)?;
    writeln!(out, "expected runs:  {}", report.expected_runs)?;
    writeln!(out, "actual runs:    {}", report.actual_runs)?;
    if !report.out_of_grid.is_empty() {
        writeln!(out, "records outside the grid: {}", report.out_of_grid.len())?;
    }
    if !report.uneven_configurations.is_empty() {
        writeln!(
            out,
            "configurations with the wrong run count: {}",
            report.uneven_configurations.len()
        )?;
    }
    writeln!(out, "{}", if report.is_valid() { "OK" } else { "INVALID" })
}

fn time_seed() -> u64 {
    jiff::Timestamp::now().as_nanosecond() as u64
}
