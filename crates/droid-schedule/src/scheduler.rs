//! Scheduler
//!
//! Runs crews on cron schedules. A single loop sleeps until the next instant
//! at which any entry fires, then runs every entry due at that instant one at
//! a time, lowest priority value first. Slots that pass while crews are
//! still running are skipped, not replayed.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule as CronSchedule;
use droid_core::Orchestrator;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{ScheduleConfig, ScheduleEntry};
use crate::error::{Result, ScheduleError};

pub struct SchedulerHandle {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the scheduler; a crew already running is allowed to finish
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}

struct Entry {
    spec: ScheduleEntry,
    schedule: CronSchedule,
}

pub struct Scheduler {
    entries: Vec<Entry>,
    orchestrator: Arc<Mutex<Orchestrator>>,
}

impl Scheduler {
    /// Parse every enabled entry; an invalid cron expression is rejected here
    pub fn new(config: &ScheduleConfig, orchestrator: Arc<Mutex<Orchestrator>>) -> Result<Self> {
        let entries = config
            .enabled_entries()
            .into_iter()
            .map(|spec| {
                Ok(Entry {
                    schedule: parse_cron(&spec.name, &spec.cron)?,
                    spec: spec.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            entries,
            orchestrator,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The next instant strictly after `after` at which any entry fires,
    /// with the entries due then in run order
    pub fn next_batch(&self, after: DateTime<Utc>) -> Option<(DateTime<Utc>, Vec<&ScheduleEntry>)> {
        let (at, batch) = due_batch(&self.entries, after)?;
        Some((at, batch.into_iter().map(|i| &self.entries[i].spec).collect()))
    }

    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let handle = tokio::spawn(self.run(shutdown_rx));

        SchedulerHandle {
            shutdown_tx,
            handle,
        }
    }

    async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(entries = self.entries.len(), "Scheduler started");
        let mut cursor = Utc::now();

        loop {
            let Some((at, batch)) = due_batch(&self.entries, cursor) else {
                warn!("No upcoming schedule, scheduler exiting");
                break;
            };

            let delay = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            info!(next = %at.format("%Y-%m-%d %H:%M:%S"), due = batch.len(), "Waiting for next schedule");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    self.dispatch(&batch).await;
                    let (next, skipped) = resume_after(&self.entries, at, Utc::now());
                    if skipped > 0 {
                        warn!(skipped, "Scheduled crews overran, skipping missed slots");
                    }
                    cursor = next;
                }
                _ = shutdown_rx.recv() => {
                    info!("Scheduler shutdown requested");
                    break;
                }
            }
        }

        info!("Scheduler stopped");
    }

    /// Run the given entries one at a time; failures are logged only
    async fn dispatch(&self, batch: &[usize]) {
        info!(entries = batch.len(), "Dispatching scheduled crews");

        for &index in batch {
            let spec = &self.entries[index].spec;
            let orchestrator = self.orchestrator.lock().await;

            match orchestrator.run_crew(&spec.crew, &spec.inputs).await {
                Ok(result) if result.success => {
                    info!(schedule = %spec.name, crew = %spec.crew, "Scheduled crew completed");
                }
                Ok(result) => {
                    error!(
                        schedule = %spec.name,
                        crew = %spec.crew,
                        error = result.error.as_deref().unwrap_or("-"),
                        "Scheduled crew failed"
                    );
                }
                Err(e) => {
                    error!(schedule = %spec.name, crew = %spec.crew, error = %e, "Scheduled crew could not start");
                }
            }
        }
    }
}

/// Indices of the entries firing at the earliest instant after `after`,
/// ordered by priority then listed order
fn due_batch(entries: &[Entry], after: DateTime<Utc>) -> Option<(DateTime<Utc>, Vec<usize>)> {
    let upcoming: Vec<(usize, DateTime<Utc>)> = entries
        .iter()
        .enumerate()
        .filter_map(|(i, e)| e.schedule.after(&after).next().map(|t| (i, t)))
        .collect();

    let at = upcoming.iter().map(|(_, t)| *t).min()?;

    let mut batch: Vec<usize> = upcoming
        .into_iter()
        .filter(|(_, t)| *t == at)
        .map(|(i, _)| i)
        .collect();
    batch.sort_by_key(|&i| (entries[i].spec.priority, i));

    Some((at, batch))
}

/// Where to look for the next batch once the batch due at `at` has finished
/// at `now`, with the number of slots that passed in between
fn resume_after(entries: &[Entry], at: DateTime<Utc>, now: DateTime<Utc>) -> (DateTime<Utc>, usize) {
    if now <= at {
        return (at, 0);
    }

    let skipped = entries
        .iter()
        .map(|e| e.schedule.after(&at).take_while(|t| *t <= now).count())
        .sum();
    (now, skipped)
}

/// Parse a cron expression, accepting the five-field form (seconds = 0)
fn parse_cron(name: &str, expr: &str) -> Result<CronSchedule> {
    let normalized = if expr.split_whitespace().count() == 5 {
        format!("0 {}", expr)
    } else {
        expr.to_string()
    };

    CronSchedule::from_str(&normalized).map_err(|source| ScheduleError::CronParse {
        name: name.to_string(),
        expr: expr.to_string(),
        source,
    })
}
