use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use color_eyre::eyre::WrapErr;
use convsim_core::storage::{dashboard_path, write_new_results};
use convsim_core::{ConversationEngine, ResultsFile, RunProgress, RunnerError, Simulator};
use tracing::info;

use crate::cli::RunArgs;
use crate::dashboard::{HeatmapAxes, write_dashboard};
use crate::format::{format_duration, format_percentage};
use crate::plan::{RunSettings, load_plan, resolve};

const REPORT_INTERVAL: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// `convsim run`: resolve the plan, run it on the reference engine and save
/// the results. Returns the path of the results file.
pub fn run(args: &RunArgs) -> color_eyre::Result<PathBuf> {
    let plan_file = args.plan.as_deref().map(load_plan).transpose()?;
    let settings = resolve(args, plan_file)?;
    execute(&settings, &ConversationEngine::new())
}

/// Run resolved settings on any simulator and write the outputs
pub fn execute<S: Simulator + ?Sized>(settings: &RunSettings, simulator: &S) -> color_eyre::Result<PathBuf> {
    settings.plan.validate()?;
    let progress = RunProgress::new(settings.plan.total_runs());
    let started = Instant::now();

    let file = with_progress_reporter(&progress, || run_on_pool(settings, simulator, &progress))?;

    let metadata_time = file
        .metadata
        .as_ref()
        .map_or_else(jiff::Timestamp::now, |m| m.created_at);
    let path = write_new_results(&file, &settings.output_dir, metadata_time, &settings.plan.name)
        .wrap_err_with(|| format!("Failed to save results to {}", settings.output_dir.display()))?;

    info!(
        runs = file.len(),
        elapsed = %format_duration(started.elapsed().as_secs_f64()),
        "Experiment complete"
    );
    println!("Saved {} runs to {}", file.len(), path.display());

    if settings.dashboard {
        let dashboard = dashboard_path(&path);
        write_dashboard(&file, &dashboard, &HeatmapAxes::default())?;
        println!("Dashboard written to {}", dashboard.display());
    }
    Ok(path)
}

/// Raises the flag when dropped, including while `work` unwinds
struct StopOnDrop<'a>(&'a AtomicBool);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Run `work` while a scoped thread logs progress until it returns or panics
fn with_progress_reporter<T>(progress: &RunProgress, work: impl FnOnce() -> T) -> T {
    let done = AtomicBool::new(false);
    std::thread::scope(|scope| {
        scope.spawn(|| {
            let mut last_report = Instant::now();
            while !done.load(Ordering::Relaxed) {
                std::thread::sleep(POLL_INTERVAL);
                if last_report.elapsed() >= REPORT_INTERVAL && !progress.is_finished() {
                    info!(
                        completed = progress.completed(),
                        total = progress.total(),
                        "Progress {}",
                        format_percentage(progress.fraction())
                    );
                    last_report = Instant::now();
                }
            }
        });
        let _stop = StopOnDrop(&done);
        work()
    })
}

#[cfg(feature = "parallel")]
fn run_on_pool<S: Simulator + ?Sized>(
    settings: &RunSettings,
    simulator: &S,
    progress: &RunProgress,
) -> Result<ResultsFile, RunnerError> {
    match settings.threads.filter(|_| settings.plan.parallel) {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| RunnerError::ThreadPool(e.to_string()))?;
            info!(threads, "Using dedicated worker pool");
            pool.install(|| convsim_core::run_experiment(&settings.plan, simulator, Some(progress)))
        }
        None => convsim_core::run_experiment(&settings.plan, simulator, Some(progress)),
    }
}

#[cfg(not(feature = "parallel"))]
fn run_on_pool<S: Simulator + ?Sized>(
    settings: &RunSettings,
    simulator: &S,
    progress: &RunProgress,
) -> Result<ResultsFile, RunnerError> {
    if settings.threads.is_some() {
        tracing::warn!("--threads has no effect without the `parallel` feature");
    }
    convsim_core::run_experiment(&settings.plan, simulator, Some(progress))
}
