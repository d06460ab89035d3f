//! Common test utilities for in-process API testing.
//!
//! The fixture builds the real router over either a seeded SQLite file or an
//! in-memory ticket source, so tests run without a listening socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tickdash_core::testing::MemoryTicketSource;
use tickdash_core::{
    Config, DatabaseConfig, QueryConfig, ServerConfig, SqliteTicketStore, StatsPolicy,
    TicketQueryService, TicketRow, TicketSource,
};
use tickdash_server::state::AppState;

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use tickdash_core::testing::fixtures;

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_first_page() {
///     let fixture = TestFixture::sqlite(&fixtures::scenario_rows());
///     let response = fixture.get("/api/v1/tickets").await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// In-memory source, when the fixture was built over one
    pub memory: Option<Arc<MemoryTicketSource>>,
    /// Temporary directory holding the SQLite file, if any
    pub temp_dir: Option<TempDir>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub text: String,
    pub body: Value,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub page_size: u32,
    pub max_page_size: u32,
    pub stats_policy: StatsPolicy,
}

impl Default for TestConfig {
    fn default() -> Self {
        let query = QueryConfig::default();
        Self {
            page_size: query.page_size,
            max_page_size: query.max_page_size,
            stats_policy: query.stats_policy,
        }
    }
}

#[allow(dead_code)]
impl TestFixture {
    /// Fixture over a read-only SQLite file seeded with `rows`.
    pub fn sqlite(rows: &[TicketRow]) -> Self {
        Self::sqlite_with_config(rows, TestConfig::default())
    }

    pub fn sqlite_with_config(rows: &[TicketRow], test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("tickets.db");
        fixtures::seed_database(&db_path, rows).expect("Failed to seed database");

        let store = SqliteTicketStore::open(&db_path).expect("Failed to open ticket store");
        let mut fixture = Self::build(Arc::new(store), test_config, db_path);
        fixture.temp_dir = Some(temp_dir);
        fixture
    }

    /// Fixture over a [`MemoryTicketSource`], for failure injection.
    pub fn memory(rows: Vec<TicketRow>) -> Self {
        let source = Arc::new(MemoryTicketSource::new(rows));
        let mut fixture = Self::build(
            Arc::clone(&source) as Arc<dyn TicketSource>,
            TestConfig::default(),
            "memory".into(),
        );
        fixture.memory = Some(source);
        fixture
    }

    fn build(
        source: Arc<dyn TicketSource>,
        test_config: TestConfig,
        db_path: std::path::PathBuf,
    ) -> Self {
        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig { path: db_path },
            query: QueryConfig {
                page_size: test_config.page_size,
                max_page_size: test_config.max_page_size,
                stats_policy: test_config.stats_policy,
            },
        };

        let service = TicketQueryService::new(source).with_stats_policy(test_config.stats_policy);
        let state = Arc::new(AppState::new(config, service));
        let router = tickdash_server::api::create_router(state);

        Self {
            router,
            memory: None,
            temp_dir: None,
        }
    }

    /// Send a GET request to the router.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let header_value = |name| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header_value(header::CONTENT_TYPE);
        let content_disposition = header_value(header::CONTENT_DISPOSITION);

        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            content_type,
            content_disposition,
            text,
            body,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
