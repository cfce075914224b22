use chrono::{Days, NaiveDateTime};
use duckdb::Connection;
use serde::Serialize;

/// Visit count for one calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesPoint {
    pub date: String,
    pub count: u64,
}

/// Per-day visit counts for the trailing `window_days` ending at `now`,
/// ascending by date.
///
/// Days without visits are omitted rather than zero-filled; the chart
/// consumer pads gaps if it needs a dense axis.
pub fn query_daily_series(
    conn: &Connection,
    now: NaiveDateTime,
    window_days: u64,
) -> Result<Vec<TimeSeriesPoint>, duckdb::Error> {
    let start = now - Days::new(window_days);

    let mut stmt = conn.prepare(
        "SELECT strftime(DATE_TRUNC('day', created_at), '%Y-%m-%d') AS day,
                COUNT(*) AS visits
         FROM visits
         WHERE created_at >= CAST(? AS TIMESTAMP)
         GROUP BY day
         ORDER BY day",
    )?;
    let rows = stmt
        .query_map(
            duckdb::params![start.format("%Y-%m-%d %H:%M:%S").to_string()],
            |row| {
                Ok(TimeSeriesPoint {
                    date: row.get(0)?,
                    count: row.get(1)?,
                })
            },
        )?
        .filter_map(Result::ok)
        .collect();

    Ok(rows)
}
