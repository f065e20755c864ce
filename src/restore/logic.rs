// glacier-restore/src/restore/logic.rs
use chrono::Local;
use std::time::Instant;

use super::dispatch::{DispatchOutcome, Dispatcher};
use super::pricing::Pricing;
use crate::config::{Mode, RunConfig};
use crate::errors::Result;
use crate::listing::{self, Source};
use crate::status::{self, StatusCounters, StatusResult};
use crate::storage::{ObjectRef, ObjectStore, RestoreTarget, RestoreTask, Tier};
use crate::utils::pool::run_bounded;
use crate::utils::prompt::TierPrompt;
use crate::utils::{Console, Counter, format_elapsed, human_size};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    StatusReported,
    NothingToRestore,
    Declined,
    Dispatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Objects whose status check or restore failed with an unrecoverable error.
    pub failures: usize,
}

/// Workers used for the dispatch phase. Expedited retrievals are throttled per
/// account, so they always go one at a time.
pub fn dispatch_workers(tier: Tier, threads: usize) -> usize {
    match tier {
        Tier::Expedited => 1,
        Tier::Standard | Tier::Bulk => threads.max(1),
    }
}

struct DispatchTally {
    requested: Counter,
    in_progress: Counter,
    skipped: Counter,
    exhausted: Counter,
}

impl DispatchTally {
    fn new() -> Self {
        Self {
            requested: Counter::new("requested"),
            in_progress: Counter::new("already in progress"),
            skipped: Counter::new("skipped"),
            exhausted: Counter::new("gave up"),
        }
    }

    fn record(&self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Requested => self.requested.increment(),
            DispatchOutcome::AlreadyInProgress => self.in_progress.increment(),
            DispatchOutcome::NotArchival | DispatchOutcome::Vanished => self.skipped.increment(),
            DispatchOutcome::Exhausted => self.exhausted.increment(),
        }
    }

    fn summary(&self, failed: usize) -> String {
        let parts: Vec<String> = [&self.requested, &self.in_progress, &self.skipped, &self.exhausted]
            .iter()
            .map(|counter| format!("{} {}", counter.value(), counter.name()))
            .collect();
        format!("{}, {} failed", parts.join(", "), failed)
    }
}

/// Lists, optionally status-checks, prices and restores the working set.
pub async fn perform_restore_orchestration(
    store: &dyn ObjectStore,
    config: &RunConfig,
    prompt: &mut dyn TierPrompt,
    console: &Console,
) -> Result<RunReport> {
    let listed = listing::list_objects(store, &config.source).await?;
    let mut objects = listed
        .into_iter()
        .map(|entry| ObjectRef::from_locator(&entry.locator, entry.size))
        .collect::<Result<Vec<_>>>()?;
    console.line(format!("📂 Found {} objects", objects.len()));

    let mut failures = 0;

    if config.checks_status() {
        let (needs_restore, failed) = run_status_pass(store, config, objects, console).await;
        failures += failed;
        if config.mode == Mode::StatusOnly {
            return Ok(RunReport { outcome: RunOutcome::StatusReported, failures });
        }
        objects = needs_restore;
    }

    let Mode::Restore { target, .. } = &config.mode else {
        return Ok(RunReport { outcome: RunOutcome::StatusReported, failures });
    };

    if objects.is_empty() {
        console.line("Nothing to restore.");
        return Ok(RunReport { outcome: RunOutcome::NothingToRestore, failures });
    }

    let total_bytes: u64 = objects.iter().map(|object| object.size).sum();
    print_estimates(console, &config.pricing, &config.source, target, objects.len(), total_bytes);

    let tier = match config.tier {
        Some(tier) => tier,
        None => {
            for tier in Tier::ALL {
                console.line(format!("{}) {}", tier as usize + 1, tier));
            }
            console.line("Any other answer aborts.");
            match Tier::from_choice(&prompt.read_choice()?) {
                Some(tier) => tier,
                None => {
                    console.line("Chicken!");
                    return Ok(RunReport { outcome: RunOutcome::Declined, failures });
                }
            }
        }
    };

    failures += run_dispatch_pass(store, config, objects, tier, target, console).await;
    Ok(RunReport { outcome: RunOutcome::Dispatched, failures })
}

/// Checks every object and returns the ones needing a restore, plus the number of
/// objects whose check failed.
async fn run_status_pass(
    store: &dyn ObjectStore,
    config: &RunConfig,
    objects: Vec<ObjectRef>,
    console: &Console,
) -> (Vec<ObjectRef>, usize) {
    let total = objects.len();
    let counters = StatusCounters::default();

    let results = run_bounded(objects, config.threads, |object| {
        let counters = &counters;
        async move {
            let result = status::check_status(store, &object, counters, console).await;
            if let Err(e) = &result {
                console.line(format!("{}: error: {}", object, e));
            }
            result
        }
    })
    .await;

    let mut needs_restore = Vec::new();
    let mut restoring = 0;
    let mut failed = 0;
    for result in results {
        match result {
            Ok(StatusResult::NeedsRestore(object)) => needs_restore.push(object),
            Ok(StatusResult::Restoring) => restoring += 1,
            Ok(StatusResult::Restored(expiry)) => tracing::debug!("restored copy expires {}", expiry),
            Ok(StatusResult::NotArchival) => {}
            Err(_) => failed += 1,
        }
    }

    console.line(format!("{}/{} objects restored", counters.restored.value(), total));
    let not_archival = counters.not_archival.value();
    if not_archival > 0 {
        console.line(format!("{} objects not in an archival storage class", not_archival));
    }
    console.line(format!(
        "{} restoring, {} need restore, {} failed",
        restoring,
        needs_restore.len(),
        failed
    ));
    (needs_restore, failed)
}

fn print_estimates(
    console: &Console,
    pricing: &Pricing,
    source: &Source,
    target: &RestoreTarget,
    objects: usize,
    total_bytes: u64,
) {
    console.line(format!("{} objects to restore, {}", objects, human_size(total_bytes)));
    if matches!(source, Source::List(_)) {
        console.line("⚠️ Object sizes are unknown for list input; estimates cover request charges only.");
    }
    for tier in Tier::ALL {
        console.line(format!(
            "  {:<10} ${:.2}",
            tier,
            pricing.retrieval_cost(tier, total_bytes, objects)
        ));
    }
    let daily = pricing.daily_storage_cost(total_bytes);
    match target {
        RestoreTarget::InPlace { days } => console.line(format!(
            "  Storage    ${:.2}/day, ${:.2} for {} days",
            daily,
            daily * f64::from(*days),
            days
        )),
        RestoreTarget::Destination { bucket } => {
            console.line(format!("  Storage    ${:.2}/day in s3://{}", daily, bucket))
        }
    }
}

/// Restores every object with the chosen tier and returns the number of failed objects.
async fn run_dispatch_pass(
    store: &dyn ObjectStore,
    config: &RunConfig,
    objects: Vec<ObjectRef>,
    tier: Tier,
    target: &RestoreTarget,
    console: &Console,
) -> usize {
    let workers = dispatch_workers(tier, config.threads);
    if workers != config.threads {
        tracing::info!("{} tier restores run with {} worker(s)", tier, workers);
    }

    let started = Instant::now();
    console.line(format!(
        "🚀 Requesting {} restores with {} worker(s) at {}",
        tier,
        workers,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    let tasks: Vec<RestoreTask> = objects
        .into_iter()
        .map(|object| RestoreTask { object, tier, target: target.clone() })
        .collect();

    let dispatcher = Dispatcher::new(store, console, config.max_tries);
    let tally = DispatchTally::new();
    let results = run_bounded(tasks, workers, |task| {
        let (dispatcher, tally) = (&dispatcher, &tally);
        async move {
            match dispatcher.restore(&task).await {
                Ok(outcome) => {
                    tally.record(outcome);
                    true
                }
                Err(e) => {
                    console.line(format!("{}: error: {}", task.object, e));
                    false
                }
            }
        }
    })
    .await;

    let failed = results.iter().filter(|ok| !**ok).count();
    console.line(tally.summary(failed));
    console.line(format!("✅ Took {}", format_elapsed(started.elapsed())));
    failed
}
