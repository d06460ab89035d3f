//! Ticket search, paging, statistics and export over the `tickets` table.

mod classify;
mod filter;
mod service;
mod sqlite_store;
mod store;
mod types;

pub use classify::classify;
pub use filter::{build_filter_clause, Condition, FilterClause, StatusGroup};
pub use service::{TicketQueryService, DEFAULT_PAGE_SIZE};
pub use sqlite_store::{SqliteTicketStore, TICKETS_SCHEMA};
pub use store::{PageData, PageWindow, TicketError, TicketSource};
pub use types::{
    total_pages, SearchResult, Ticket, TicketFilter, TicketRow, TicketStats, TicketType,
    ALL_STATUSES, STATUS_OPTIONS,
};
