use std::sync::Arc;
use tickdash_core::{Config, QueryConfig, SearchWorker, TicketQueryService};

/// Shared application state
pub struct AppState {
    config: Config,
    service: Arc<TicketQueryService>,
    worker: SearchWorker,
}

impl AppState {
    pub fn new(config: Config, service: TicketQueryService) -> Self {
        let service = Arc::new(service);
        let worker = SearchWorker::new(Arc::clone(&service));
        Self {
            config,
            service,
            worker,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn query_config(&self) -> &QueryConfig {
        &self.config.query
    }

    pub fn service(&self) -> &Arc<TicketQueryService> {
        &self.service
    }

    pub fn worker(&self) -> &SearchWorker {
        &self.worker
    }
}
