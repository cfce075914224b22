use chrono::Local;
use duckdb::Connection;
use serde::{Deserialize, Serialize};

/// A single captured attribution visit, ready for storage.
///
/// UTM fields hold the raw query values; a parameter that was absent (or
/// empty) on the request is `None`, never an empty string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
    pub path: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub via: String,
}

/// Append one visit row, stamping `created_at` with the current local time.
pub fn insert_visit(conn: &Connection, visit: &Visit) -> Result<(), duckdb::Error> {
    let created_at = Local::now()
        .naive_local()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    conn.execute(
        "INSERT INTO visits (source, medium, campaign, term, content,
         path, ip, user_agent, via, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))",
        duckdb::params![
            visit.source,
            visit.medium,
            visit.campaign,
            visit.term,
            visit.content,
            visit.path,
            visit.ip,
            visit.user_agent,
            visit.via,
            created_at,
        ],
    )?;
    Ok(())
}
