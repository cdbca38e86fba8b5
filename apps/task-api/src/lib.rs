pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;

use std::sync::Arc;

use config::Config;
use db::contacts::ContactDirectory;
use db::store::TaskStore;
use gateway::fanout::Fanout;
use gateway::reminders::ReminderSweeper;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    pub contacts: Arc<dyn ContactDirectory>,
    pub config: Arc<Config>,
    pub gateway: Arc<Fanout>,
    pub reminders: Arc<ReminderSweeper>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TaskStore>,
        contacts: Arc<dyn ContactDirectory>,
        config: Config,
    ) -> Self {
        let window = chrono::Duration::hours(config.due_reminder_window_hours);
        Self {
            store,
            contacts,
            config: Arc::new(config),
            gateway: Arc::new(Fanout::new()),
            reminders: Arc::new(ReminderSweeper::new(window)),
        }
    }
}
