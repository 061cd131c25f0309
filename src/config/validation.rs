use crate::config::types::{
    AnalysisConfig, AuthMode, Config, CrawlerConfig, OutputConfig, PageSpeedConfig, SiteConfig,
    UserAgentConfig, MAX_PAGE_LIMIT,
};
use crate::url::parse_site_root;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_pagespeed_config(&config.pagespeed)?;
    validate_analysis_config(&config.analysis)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the audited site
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    parse_site_root(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site url '{}': {}", config.url, e)))?;

    if let Some(password) = &config.password {
        if password.is_empty() {
            return Err(ConfigError::Validation(
                "password cannot be empty when set".to_string(),
            ));
        }
    }

    if config.auth == AuthMode::Basic && config.password.is_some() && config.username.is_none() {
        return Err(ConfigError::Validation(
            "basic auth requires a username".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 || config.max_pages > MAX_PAGE_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and {}, got {}",
            MAX_PAGE_LIMIT, config.max_pages
        )));
    }

    if config.max_depth > 10 {
        return Err(ConfigError::Validation(format!(
            "max_depth must be <= 10, got {}",
            config.max_depth
        )));
    }

    if config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 0 and 64, got {}",
            config.workers
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request_timeout must be >= 1 second".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    for ext in &config.ignored_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "ignored extension '{}' must look like '.ext'",
                ext
            )));
        }
    }

    if config
        .excluded_path_words
        .iter()
        .any(|word| word.trim().is_empty() || word.contains('/'))
    {
        return Err(ConfigError::Validation(
            "excluded path words must be non-empty and contain no '/'".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_pagespeed_config(config: &PageSpeedConfig) -> Result<(), ConfigError> {
    if config.active_key().is_none() {
        return Ok(());
    }

    if config.strategies.is_empty() {
        return Err(ConfigError::Validation(
            "pagespeed strategies cannot be empty when an api key is set".to_string(),
        ));
    }

    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid pagespeed endpoint: {}", e)))?;

    if config.timeout < 1 {
        return Err(ConfigError::Validation(
            "pagespeed timeout must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

fn validate_analysis_config(config: &AnalysisConfig) -> Result<(), ConfigError> {
    if config.top_keywords < 1 || config.sitewide_keywords < 1 {
        return Err(ConfigError::Validation(format!(
            "top_keywords and sitewide_keywords must be >= 1, got {} and {}",
            config.top_keywords, config.sitewide_keywords
        )));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
