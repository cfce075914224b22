use duckdb::Connection;

/// SQL statement to create the visits table.
///
/// One row per captured attribution visit. Rows are append-only and
/// `created_at` is the sole ordering key for all windowed queries.
pub const CREATE_VISITS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS visits (
    source     VARCHAR,
    medium     VARCHAR,
    campaign   VARCHAR,
    term       VARCHAR,
    content    VARCHAR,
    path       VARCHAR NOT NULL,
    ip         VARCHAR NOT NULL,
    user_agent VARCHAR,
    via        VARCHAR NOT NULL,
    created_at TIMESTAMP NOT NULL
)
";

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> Result<(), duckdb::Error> {
    conn.execute_batch(CREATE_VISITS_TABLE)?;
    Ok(())
}
