//! Testing utilities: an in-memory ticket source and row fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickdash_core::testing::{fixtures, MemoryTicketSource};
//! use tickdash_core::{TicketFilter, TicketQueryService};
//!
//! let source = Arc::new(MemoryTicketSource::new(fixtures::scenario_rows()));
//! let service = TicketQueryService::new(source.clone());
//!
//! // Simulate the database going away
//! source.fail_with("unable to open database file");
//! assert!(service.search(&TicketFilter::all(), 1, 50).is_err());
//! ```

mod memory_source;

pub use memory_source::MemoryTicketSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use rusqlite::{params, Connection};

    use crate::ticket::{SqliteTicketStore, TicketError, TicketRow};

    const STATUSES: [&str; 8] = [
        "New",
        "Assigned",
        "Work in Progress",
        "Pending Parts",
        "Pending Vendor",
        "Resolved",
        "Closed",
        "Cancelled",
    ];

    const DESCRIPTIONS: [&str; 7] = [
        "Bldg3-AP12 not broadcasting",
        "Sysmon alert: CPU high on core switch",
        "ONT offline at customer premises",
        "NABA cabinet door alarm",
        "Printer jam on 2nd floor",
        "Password reset request",
        "Site 7 AP down after storm",
    ];

    const ASSIGNEES: [&str; 3] = ["Jane Doe", "Omar Haddad", "Li Wei"];

    /// The three-ticket scenario: T1 resolved, T2 pending parts (newest), T3 assigned (oldest).
    pub fn scenario_rows() -> Vec<TicketRow> {
        vec![
            TicketRow::new("T1", "Jane Doe", "Lobby-AP01 offline", "Resolved", "2024-01-02"),
            TicketRow::new("T2", "Omar Haddad", "ONT offline", "Pending Parts", "2024-01-03"),
            TicketRow::new("T3", "Li Wei", "Printer jam", "Assigned", "2024-01-01"),
        ]
    }

    /// `count` rows cycling through statuses and descriptions, each one minute
    /// apart so every row has a distinct timestamp.
    pub fn sample_rows(count: usize) -> Vec<TicketRow> {
        (0..count)
            .map(|i| {
                TicketRow::new(
                    format!("INC{:07}", 100 + i),
                    ASSIGNEES[i % ASSIGNEES.len()],
                    DESCRIPTIONS[i % DESCRIPTIONS.len()],
                    STATUSES[i % STATUSES.len()],
                    format!(
                        "2024-02-{:02} {:02}:{:02}:00",
                        1 + i / 1440,
                        (i / 60) % 24,
                        i % 60
                    ),
                )
            })
            .collect()
    }

    /// Insert rows into an open connection inside one transaction.
    pub fn insert_rows(conn: &mut Connection, rows: &[TicketRow]) -> Result<(), TicketError> {
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO tickets (Number, Caller, ShortDescription, State, Created) VALUES (?, ?, ?, ?, ?)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.id,
                    row.assignee,
                    row.short_description,
                    row.status,
                    row.created_at
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Create (or extend) a ticket database file holding `rows`.
    pub fn seed_database(path: &Path, rows: &[TicketRow]) -> Result<(), TicketError> {
        let mut conn = Connection::open(path).map_err(|e| TicketError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        SqliteTicketStore::initialize_schema(&conn)?;
        insert_rows(&mut conn, rows)
    }

    /// In-memory SQLite store preloaded with `rows`.
    ///
    /// # Panics
    ///
    /// Panics if the rows cannot be inserted (e.g. duplicate ids).
    pub fn sqlite_store(rows: &[TicketRow]) -> SqliteTicketStore {
        let mut conn = Connection::open_in_memory().expect("Failed to open in-memory database");
        SqliteTicketStore::initialize_schema(&conn).expect("Failed to create schema");
        insert_rows(&mut conn, rows).expect("Failed to insert fixture rows");
        SqliteTicketStore::from_connection(conn)
    }
}
