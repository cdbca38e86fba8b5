//! Periodic due-date sweep.
//!
//! Each open task gets at most one `taskDueReminder` and at most one
//! `taskOverdue` per process while it stays open. The bookkeeping is
//! in-memory only; a restart may repeat a notice, and members who are offline
//! during the sweep miss it.

use std::collections::HashSet;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashSet;
use tokio::task::JoinHandle;

use crate::db::store::TaskStore;
use crate::error::ApiError;
use crate::models::task::Task;
use crate::AppState;

use super::audience::Audience;
use super::events::{DeadlinePayload, ServerEvent};
use super::fanout::Fanout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    DueSoon,
    Overdue,
}

/// Where `task` stands relative to its due date, if it deserves a notice.
pub fn classify(task: &Task, now: DateTime<Utc>, window: Duration) -> Option<Deadline> {
    if task.status.is_closed() {
        return None;
    }
    if task.due_date < now {
        Some(Deadline::Overdue)
    } else if task.due_date <= now + window {
        Some(Deadline::DueSoon)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub reminded: usize,
    pub overdue: usize,
}

pub struct ReminderSweeper {
    window: Duration,
    reminded: DashSet<String>,
    flagged_overdue: DashSet<String>,
}

impl ReminderSweeper {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            reminded: DashSet::new(),
            flagged_overdue: DashSet::new(),
        }
    }

    /// Make a task eligible again, e.g. after its due date moved.
    pub fn forget(&self, task_id: &str) {
        self.reminded.remove(task_id);
        self.flagged_overdue.remove(task_id);
    }

    pub async fn sweep(
        &self,
        store: &dyn TaskStore,
        fanout: &Fanout,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, ApiError> {
        let mut report = SweepReport::default();
        let open = store.open_tasks().await?;

        // Closed or deleted tasks drop out of the bookkeeping.
        let open_ids: HashSet<&str> = open.iter().map(|t| t.id.as_str()).collect();
        self.reminded.retain(|id| open_ids.contains(id.as_str()));
        self.flagged_overdue.retain(|id| open_ids.contains(id.as_str()));

        for task in &open {
            let (event, message) = match classify(task, now, self.window) {
                Some(Deadline::Overdue) if self.flagged_overdue.insert(task.id.clone()) => {
                    report.overdue += 1;
                    (ServerEvent::Overdue, format!("Task \"{}\" is overdue", task.title))
                }
                Some(Deadline::DueSoon) if self.reminded.insert(task.id.clone()) => {
                    report.reminded += 1;
                    let hours = (task.due_date - now).num_hours();
                    (
                        ServerEvent::DueReminder,
                        format!("Task \"{}\" is due in {hours} hours", task.title),
                    )
                }
                _ => continue,
            };

            let payload = DeadlinePayload {
                task_id: task.id.clone(),
                task_title: task.title.clone(),
                due_date: task.due_date,
                message,
            };
            fanout.notify_users(&Audience::task_members(task), event, &payload);
        }

        Ok(report)
    }
}

/// Run the sweep every `interval` for the life of the process.
pub fn spawn(state: AppState, interval: StdDuration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match state
                .reminders
                .sweep(state.store.as_ref(), &state.gateway, Utc::now())
                .await
            {
                Ok(report) if report.reminded + report.overdue > 0 => {
                    tracing::info!(
                        reminded = report.reminded,
                        overdue = report.overdue,
                        "due-date sweep sent notices"
                    );
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(message = %err.message, "due-date sweep failed"),
            }
        }
    })
}
