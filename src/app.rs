//! Main application orchestration and execution

use crate::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config},
    error::{AppError, Result},
    executor::{CancelSignal, Coordinator},
    inventory::{Inventory, InventorySource},
    log_debug,
    logging::{Logger, LoggerFactory, ProbeLogger},
    models::{Config, Run},
    output::{OutputCoordinator, OutputFormatterFactory},
    persist::{load_run, resolve_run_file, RunStore},
    planner::{plan_pairs, PairPlan},
    probe::{ProbeExecutor, ProbeSettings, RemoteProbeExecutor, SshChannel},
    stats::RunSummary,
};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::time::Instant;

/// Print panics with the application prefix, then defer to the default hook.
///
/// The process is left running: a panic inside a probe task surfaces to the
/// coordinator as a failed task and the sweep carries on.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        eprintln!("Application panic: {}", panic_info);
        default_hook(panic_info);
    }));
}

/// Where a finished run left its files
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub results_path: PathBuf,
    pub report_path: PathBuf,
}

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    pub fn new(cli: Cli) -> Result<Self> {
        cli.validate().map_err(AppError::config)?;
        Ok(Self { cli })
    }

    /// Measure, or regenerate a report when `--report-from` is given
    pub async fn run(self, cancel: CancelSignal) -> Result<RunOutcome> {
        let config = load_config(self.cli.clone())?;
        let factory = LoggerFactory::new(&config);
        let logger = factory.create_logger("MAIN").await;

        log_debug!(
            logger,
            "{} v{} ({}) session {}",
            crate::PKG_NAME,
            crate::VERSION,
            env!("TARGET_TRIPLE"),
            factory.session_id()
        );
        if config.debug {
            for line in display_config_summary(&config).lines() {
                log_debug!(logger, "{}", line);
            }
        }

        // Probe and path warnings mean nothing when only a report is rebuilt
        if self.cli.is_report_mode() {
            config.validate()?;
        } else {
            for warning in validate_config(&config)? {
                eprintln!("{}", warning.format(config.enable_color));
            }
        }

        let console = OutputCoordinator::new(OutputFormatterFactory::create_formatter(
            config.enable_color,
            config.verbose,
        ));

        let outcome = match &self.cli.report_from {
            Some(path) => regenerate_report(path, &logger).await?,
            None => self.measure(&config, &factory, &logger, cancel).await?,
        };

        println!("{}", console.render_console_summary(&outcome.summary)?);
        println!("Results: {}", outcome.results_path.display());
        println!("Report:  {}", outcome.report_path.display());

        Ok(outcome)
    }

    async fn measure(
        &self,
        config: &Config,
        factory: &LoggerFactory,
        logger: &Logger,
        cancel: CancelSignal,
    ) -> Result<RunOutcome> {
        let key = config.require_ssh_key()?.to_path_buf();

        let source = InventorySource::from_config(config);
        logger
            .info(&format!("Loading inventory from {}", source.describe()))
            .log()
            .await;
        let inventory = source.load().await?;
        let plan = plan_pairs(&inventory)?;
        logger
            .info(&format!(
                "{} nodes in {} regions, {} AZ pairs planned",
                inventory.len(),
                plan.region_names().len(),
                plan.total_pairs()
            ))
            .field("nodes", inventory.len())
            .field("pairs", plan.total_pairs())
            .log()
            .await;

        let store = RunStore::create(config.resolved_output_dir(Utc::now()))?;
        let snapshot = store.save_inventory(&inventory)?;
        log_debug!(logger, "Inventory snapshot written to {}", snapshot.display());

        let channel = SshChannel::new(key, config.connect_timeout());
        let executor = RemoteProbeExecutor::new(channel, ProbeSettings::from(config));

        let cancel = match config.run_timeout() {
            Some(budget) => cancel.with_deadline(Instant::now() + budget),
            None => cancel,
        };
        let checkpoints = config.checkpoint.then_some(&store);

        let run = execute_plan(
            config,
            &inventory,
            &plan,
            executor,
            &cancel,
            checkpoints,
            factory.create_probe_logger().await,
        )
        .await;

        finish_run(&run, &store)
    }
}

/// Probe every pair of `plan` and return the finalized run.
///
/// When `store` is given, the run is checkpointed after each region. A failed
/// checkpoint is logged and does not stop the sweep.
pub async fn execute_plan<E: ProbeExecutor + 'static>(
    config: &Config,
    inventory: &Inventory,
    plan: &PairPlan,
    executor: E,
    cancel: &CancelSignal,
    store: Option<&RunStore>,
    logger: ProbeLogger,
) -> Run {
    let mut run = Run::new(config.ping_count, inventory.regions(), inventory.clouds());
    let coordinator = Coordinator::new(executor, config.max_concurrency, logger.clone());

    coordinator
        .run_plan(plan, &mut run, cancel, |_region, partial| {
            store.map(|store| store.checkpoint(partial))
        })
        .await;

    run.finalize();
    logger.run_summary(&run).await;
    run
}

/// Write results.json and report.txt for a finalized run
pub fn finish_run(run: &Run, store: &RunStore) -> Result<RunOutcome> {
    let results_path = store.save_run(run)?;
    let summary = RunSummary::from_run(run);
    let report = OutputCoordinator::for_report().render_report(&summary)?;
    let report_path = store.save_report(&report)?;

    Ok(RunOutcome {
        summary,
        results_path,
        report_path,
    })
}

/// Reload a saved run and rewrite its report next to it
pub async fn regenerate_report(path: &Path, logger: &Logger) -> Result<RunOutcome> {
    let results_path = resolve_run_file(path);
    let run = load_run(&results_path)?;
    logger
        .info(&format!(
            "Regenerating report from {} ({} measurements)",
            results_path.display(),
            run.measurements.len()
        ))
        .log()
        .await;

    let dir = match results_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let store = RunStore::create(dir)?;

    let summary = RunSummary::from_run(&run);
    let report = OutputCoordinator::for_report().render_report(&summary)?;
    let report_path = store.save_report(&report)?;

    Ok(RunOutcome {
        summary,
        results_path,
        report_path,
    })
}
