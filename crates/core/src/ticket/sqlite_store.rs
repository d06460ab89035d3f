//! SQLite-backed ticket source.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, ToSql, TransactionBehavior};
use tracing::debug;

use super::{FilterClause, PageData, PageWindow, TicketError, TicketRow, TicketSource};

const SELECT_COLUMNS: &str = "SELECT Number, Caller, ShortDescription, State, Created FROM tickets";

/// Schema of the ticket table as exported from the service desk.
pub const TICKETS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS tickets (
        Number TEXT PRIMARY KEY,
        Caller TEXT,
        ShortDescription TEXT,
        State TEXT,
        Created TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_tickets_created ON tickets(Created DESC);
    CREATE INDEX IF NOT EXISTS idx_tickets_state ON tickets(State);
"#;

/// SQLite-backed ticket source.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Open an existing ticket database read-only.
    pub fn open(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| TicketError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        // Fail at startup rather than on the first search when the table or a column is missing
        conn.prepare(&format!("{} LIMIT 0", SELECT_COLUMNS))
            .map(drop)
            .map_err(|e| TicketError::Open {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self::from_connection(conn))
    }

    /// Create an in-memory store with an empty ticket table (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Create the ticket table and its indexes if they do not exist.
    pub fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(TICKETS_SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TicketError> {
        self.conn
            .lock()
            .map_err(|_| TicketError::Database("connection lock poisoned".to_string()))
    }

    fn count_with(conn: &Connection, filter: &FilterClause) -> Result<i64, TicketError> {
        let (where_clause, params) = filter.where_sql();
        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);

        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();

        let count: i64 = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<TicketRow> {
        Ok(TicketRow {
            id: text_column(row, 0)?,
            assignee: text_column(row, 1)?,
            short_description: text_column(row, 2)?,
            status: text_column(row, 3)?,
            created_at: text_column(row, 4)?,
        })
    }
}

/// Read a column as text whatever its storage class; NULL becomes empty.
fn text_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            String::from_utf8_lossy(bytes).into_owned()
        }
    })
}

impl TicketSource for SqliteTicketStore {
    fn count(&self, filter: &FilterClause) -> Result<i64, TicketError> {
        let conn = self.lock()?;
        Self::count_with(&conn, filter)
    }

    fn fetch_page(
        &self,
        filter: &FilterClause,
        window: PageWindow,
        counts: &[FilterClause],
    ) -> Result<PageData, TicketError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;

        let total = Self::count_with(&tx, filter)?;

        let (where_clause, params) = filter.where_sql();
        let sql = format!(
            "{} {} ORDER BY Created DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, where_clause
        );

        let mut param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        param_refs.push(&window.limit);
        param_refs.push(&window.offset);

        let rows = {
            let mut stmt = tx.prepare(&sql)?;
            let mapped = stmt.query_map(param_refs.as_slice(), Self::row_to_ticket)?;

            let mut rows = Vec::new();
            for row_result in mapped {
                rows.push(row_result?);
            }
            rows
        };

        let counts = counts
            .iter()
            .map(|clause| Self::count_with(&tx, clause))
            .collect::<Result<Vec<_>, _>>()?;

        tx.commit()?;

        debug!(
            total,
            fetched = rows.len(),
            limit = window.limit,
            offset = window.offset,
            "Fetched ticket page"
        );

        Ok(PageData {
            rows,
            total,
            counts,
        })
    }

    fn for_each_matching(
        &self,
        filter: &FilterClause,
        visit: &mut dyn FnMut(TicketRow) -> Result<(), TicketError>,
    ) -> Result<usize, TicketError> {
        let conn = self.lock()?;

        let (where_clause, params) = filter.where_sql();
        let sql = format!("{} {} ORDER BY Created DESC", SELECT_COLUMNS, where_clause);

        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(param_refs.as_slice())?;

        let mut visited = 0;
        while let Some(row) = rows.next()? {
            visit(Self::row_to_ticket(row)?)?;
            visited += 1;
        }

        Ok(visited)
    }
}
