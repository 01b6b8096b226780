use sqlx::sqlite::SqlitePool;

pub mod api;
pub mod calendar;
pub mod config;
pub mod db;
pub mod form;
pub mod months;
pub mod telemetry;
pub mod views;

use months::{Month, MONTHS};

/// Shared state handed to every request handler.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub pool: SqlitePool,
    pub months: &'static [Month; 12],
}

impl AppContext {
    pub fn new(pool: SqlitePool) -> Self {
        AppContext {
            pool,
            months: &MONTHS,
        }
    }

    /// Resolve a month token against this context's month table.
    pub fn resolve_month(&self, token: &str) -> Option<Month> {
        months::resolve_in(self.months, token)
    }
}
