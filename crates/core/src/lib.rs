pub mod config;
pub mod export;
pub mod metrics;
pub mod testing;
pub mod ticket;
pub mod worker;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    QueryConfig, ServerConfig, StatsPolicy,
};
pub use export::{
    export_csv_chunks, export_to_path, write_csv, ExportError, CSV_HEADER, DEFAULT_EXPORT_FILE,
    EXPORT_CHUNK_ROWS,
};
pub use ticket::{
    classify, total_pages, SearchResult, SqliteTicketStore, Ticket, TicketError, TicketFilter,
    TicketQueryService, TicketRow, TicketSource, TicketStats, TicketType, ALL_STATUSES,
    DEFAULT_PAGE_SIZE, STATUS_OPTIONS,
};
pub use worker::{PendingSearch, SearchOutcome, SearchRequest, SearchWorker};
