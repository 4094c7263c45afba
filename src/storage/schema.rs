//! Database schema definitions
//!
//! Two tables emulate a key-value server: scalar values and set members.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Scalar values (status JSON, counters)
CREATE TABLE IF NOT EXISTS kv_values (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Set members (visited URLs)
CREATE TABLE IF NOT EXISTS kv_sets (
    set_key TEXT NOT NULL,
    member TEXT NOT NULL,
    PRIMARY KEY (set_key, member)
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
