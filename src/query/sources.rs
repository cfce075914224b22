use chrono::{Days, NaiveDateTime};
use duckdb::Connection;
use serde::Serialize;

/// One slice of the traffic-source distribution.
#[derive(Debug, Clone, Serialize)]
pub struct SourceBucket {
    pub source: String,
    pub count: u64,
}

/// Top traffic sources over the trailing `window_days`, largest first.
///
/// NULL and empty sources count as direct traffic and surface as "Direct".
/// Ties order by source name so repeated reads return the same ranking.
pub fn query_source_distribution(
    conn: &Connection,
    now: NaiveDateTime,
    window_days: u64,
    limit: usize,
) -> Result<Vec<SourceBucket>, duckdb::Error> {
    let start = now - Days::new(window_days);

    let mut stmt = conn.prepare(
        "SELECT COALESCE(NULLIF(source, ''), 'Direct') AS src,
                COUNT(*) AS visits
         FROM visits
         WHERE created_at >= CAST(? AS TIMESTAMP)
         GROUP BY src
         ORDER BY visits DESC, src ASC
         LIMIT ?",
    )?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(
            duckdb::params![start.format("%Y-%m-%d %H:%M:%S").to_string(), limit],
            |row| {
                Ok(SourceBucket {
                    source: row.get(0)?,
                    count: row.get(1)?,
                })
            },
        )?
        .filter_map(Result::ok)
        .collect();

    Ok(rows)
}
