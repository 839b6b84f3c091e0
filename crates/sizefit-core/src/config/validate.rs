use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Quality bounds satisfy 1 <= min <= max <= 100
/// - GIF quality floor is at most 100
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let search = &config.search;

    if search.min_quality == 0 {
        return Err(ConfigError::ValidationError(
            "search.min_quality must be at least 1".to_string(),
        ));
    }

    if search.max_quality > 100 {
        return Err(ConfigError::ValidationError(format!(
            "search.max_quality must be at most 100, got {}",
            search.max_quality
        )));
    }

    if search.min_quality > search.max_quality {
        return Err(ConfigError::ValidationError(format!(
            "search.min_quality ({}) exceeds search.max_quality ({})",
            search.min_quality, search.max_quality
        )));
    }

    if search.gif_min_quality > 100 {
        return Err(ConfigError::ValidationError(format!(
            "search.gif_min_quality must be at most 100, got {}",
            search.gif_min_quality
        )));
    }

    Ok(())
}
