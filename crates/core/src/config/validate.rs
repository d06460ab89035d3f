use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Default page size is at least 1
/// - Maximum page size is not below the default page size
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.query.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "query.page_size must be at least 1".to_string(),
        ));
    }

    if config.query.max_page_size < config.query.page_size {
        return Err(ConfigError::ValidationError(format!(
            "query.max_page_size ({}) cannot be smaller than query.page_size ({})",
            config.query.max_page_size, config.query.page_size
        )));
    }

    Ok(())
}
