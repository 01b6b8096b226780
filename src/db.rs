use std::collections::BTreeSet;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Dates are stored as zero padded `YYYY-MM-DD` text.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Entry {
    pub id: i64,
    pub date: String,
    pub start: String,
    pub stop: String,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub start: String,
    pub stop: String,
    pub task: String,
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub async fn setup_pool(db_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(db_url)
        .with_context(|| format!("Invalid database url: {}", db_url))?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database at {}", db_url))
}

pub async fn setup_db(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS entries(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            start TEXT NOT NULL,
            stop TEXT NOT NULL,
            task TEXT NOT NULL)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS entries_date ON entries(date)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn write_entry(pool: &SqlitePool, entry: &NewEntry) -> Result<Entry> {
    let date = date_key(entry.date);
    let id = sqlx::query("INSERT INTO entries(date, start, stop, task) VALUES(?, ?, ?, ?)")
        .bind(&date)
        .bind(&entry.start)
        .bind(&entry.stop)
        .bind(&entry.task)
        .execute(pool)
        .await?
        .last_insert_rowid();

    Ok(Entry {
        id,
        date,
        start: entry.start.clone(),
        stop: entry.stop.clone(),
        task: entry.task.clone(),
    })
}

pub async fn read_entry(pool: &SqlitePool, id: i64) -> Result<Option<Entry>> {
    Ok(
        sqlx::query_as::<_, Entry>("SELECT id, date, start, stop, task FROM entries WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn read_entries_for_date(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<Entry>> {
    Ok(sqlx::query_as::<_, Entry>(
        "SELECT id, date, start, stop, task FROM entries WHERE date = ? ORDER BY start, id",
    )
    .bind(date_key(date))
    .fetch_all(pool)
    .await?)
}

/// Days of the given month that have at least one entry.
pub async fn dates_with_entries(pool: &SqlitePool, year: i32, month: u32) -> Result<BTreeSet<u32>> {
    let first = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first) => first,
        None => return Ok(BTreeSet::new()),
    };
    let prefix = format!("{}%", first.format("%Y-%m-"));
    let dates: Vec<(String,)> = sqlx::query_as("SELECT DISTINCT date FROM entries WHERE date LIKE ?")
        .bind(prefix)
        .fetch_all(pool)
        .await?;

    Ok(dates
        .into_iter()
        .filter_map(|(date,)| NaiveDate::parse_from_str(&date, DATE_FORMAT).ok())
        .map(|date| date.day())
        .collect())
}

/// Returns the number of rows removed; deleting a missing id is not an error.
pub async fn delete_entry(pool: &SqlitePool, id: i64) -> Result<u64> {
    Ok(sqlx::query("DELETE FROM entries WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected())
}
