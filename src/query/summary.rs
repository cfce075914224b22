use chrono::{Days, NaiveDateTime, NaiveTime};
use duckdb::Connection;
use serde::Serialize;

use crate::query::trend::{calculate_change_with_mood, Mood, Trend};

/// One dashboard summary card: a counter plus its trend against the
/// previous window.
#[derive(Debug, Clone, Serialize)]
pub struct StatCard {
    pub value: u64,
    pub percentage: String,
    pub mood: Mood,
}

/// The four summary counters, recomputed from the visit log on every read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSummary {
    pub total_visits: StatCard,
    pub unique_sources: StatCard,
    pub campaigns: StatCard,
    pub today: StatCard,
}

/// UTM columns with distinct-count semantics.
#[derive(Debug, Clone, Copy)]
pub enum UtmField {
    Source,
    Campaign,
}

impl UtmField {
    const fn column_name(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Campaign => "campaign",
        }
    }
}

fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Count visits, optionally restricted to the half-open range `[start, end)`.
pub fn count_visits(
    conn: &Connection,
    range: Option<(NaiveDateTime, NaiveDateTime)>,
) -> Result<u64, duckdb::Error> {
    match range {
        Some((start, end)) => {
            let mut stmt = conn.prepare(
                "SELECT COUNT(*) FROM visits
                 WHERE created_at >= CAST(? AS TIMESTAMP) AND created_at < CAST(? AS TIMESTAMP)",
            )?;
            stmt.query_row(duckdb::params![fmt_ts(start), fmt_ts(end)], |row| {
                row.get(0)
            })
        }
        None => {
            let mut stmt = conn.prepare("SELECT COUNT(*) FROM visits")?;
            stmt.query_row([], |row| row.get(0))
        }
    }
}

/// Count distinct non-empty values of a UTM column, optionally restricted
/// to the half-open range `[start, end)`.
pub fn count_distinct(
    conn: &Connection,
    field: UtmField,
    range: Option<(NaiveDateTime, NaiveDateTime)>,
) -> Result<u64, duckdb::Error> {
    let col = field.column_name();

    // Using format! for the column name is safe here since it comes from a fixed enum
    match range {
        Some((start, end)) => {
            let sql = format!(
                "SELECT COUNT(DISTINCT {col}) FROM visits
                 WHERE {col} IS NOT NULL AND {col} != ''
                 AND created_at >= CAST(? AS TIMESTAMP) AND created_at < CAST(? AS TIMESTAMP)"
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row(duckdb::params![fmt_ts(start), fmt_ts(end)], |row| {
                row.get(0)
            })
        }
        None => {
            let sql = format!(
                "SELECT COUNT(DISTINCT {col}) FROM visits WHERE {col} IS NOT NULL AND {col} != ''"
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row([], |row| row.get(0))
        }
    }
}

/// Compute the four summary cards anchored to `now`.
///
/// Trends compare the trailing week `[now-7d, now)` against the week before
/// it; the `today` card compares `[midnight, now)` against the prior full
/// day. Any failed query fails the whole call, so the dashboard never sees
/// a partially-zeroed summary.
pub fn query_summary(conn: &Connection, now: NaiveDateTime) -> Result<StatSummary, duckdb::Error> {
    let week_ago = now - Days::new(7);
    let this_week = (week_ago, now);
    let last_week = (now - Days::new(14), week_ago);

    let midnight = now.date().and_time(NaiveTime::MIN);
    let yesterday = (midnight - Days::new(1), midnight);

    let total_value = count_visits(conn, None)?;
    let total_cur = count_visits(conn, Some(this_week))?;
    let total_prev = count_visits(conn, Some(last_week))?;

    let sources_value = count_distinct(conn, UtmField::Source, None)?;
    let sources_cur = count_distinct(conn, UtmField::Source, Some(this_week))?;
    let sources_prev = count_distinct(conn, UtmField::Source, Some(last_week))?;

    let campaigns_value = count_distinct(conn, UtmField::Campaign, None)?;
    let campaigns_cur = count_distinct(conn, UtmField::Campaign, Some(this_week))?;
    let campaigns_prev = count_distinct(conn, UtmField::Campaign, Some(last_week))?;

    let today_value = count_visits(conn, Some((midnight, now)))?;
    let yesterday_value = count_visits(conn, Some(yesterday))?;

    Ok(StatSummary {
        total_visits: card(total_value, total_cur, total_prev),
        unique_sources: card(sources_value, sources_cur, sources_prev),
        campaigns: card(campaigns_value, campaigns_cur, campaigns_prev),
        today: card(today_value, today_value, yesterday_value),
    })
}

fn card(value: u64, current: u64, previous: u64) -> StatCard {
    let Trend { percentage, mood } = calculate_change_with_mood(current, previous);
    StatCard {
        value,
        percentage,
        mood,
    }
}
