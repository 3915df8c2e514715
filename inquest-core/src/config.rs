//! Configuration management

use crate::error::{InquestError, InquestResult};
use crate::types::{
    FetchSettings, InquestConfig, JobSettings, ResearchSettings, SearchSettings,
};

use std::path::Path;

impl Default for InquestConfig {
    fn default() -> Self {
        Self {
            research: ResearchSettings::default(),
            search: SearchSettings::default(),
            fetch: FetchSettings::default(),
            jobs: JobSettings::default(),
            logging: crate::logging::LoggingConfig::default(),
        }
    }
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            min_subtopics: 2,
            max_subtopics: 5,
            worker_pool_size: 3,
            followup_rounds: 1,
            max_followup_queries: 3,
            search_count: 5,
            fetch_top_results: 3,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            timeout_secs: 300,
            max_retries: 5,
            cache_ttl_secs: 24 * 60 * 60,
            cache_capacity: 256,
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_content_length: 12_000,
        }
    }
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            completed_ttl_secs: 60 * 60,
            failed_ttl_secs: 10 * 60,
            max_age_secs: 24 * 60 * 60,
            sweep_interval_secs: 60,
        }
    }
}

impl InquestConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> InquestResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| InquestError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: InquestConfig = toml::from_str(&content).map_err(|e| InquestError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> InquestResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| InquestError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| InquestError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> InquestResult<()> {
        if self.research.worker_pool_size == 0 {
            return Err(crate::config_error!(
                "research.worker_pool_size must be at least 1",
                "config"
            ));
        }

        if self.research.min_subtopics == 0 {
            return Err(crate::config_error!(
                "research.min_subtopics must be at least 1",
                "config"
            ));
        }

        if self.research.min_subtopics > self.research.max_subtopics {
            return Err(crate::config_error!(
                "research.min_subtopics cannot exceed research.max_subtopics",
                "config"
            ));
        }

        if self.research.followup_rounds > 2 {
            return Err(crate::config_error!(
                "research.followup_rounds must be between 0 and 2",
                "config"
            ));
        }

        if self.research.search_count == 0 {
            return Err(crate::config_error!(
                "research.search_count must be at least 1",
                "config"
            ));
        }

        if self.fetch.max_content_length == 0 {
            return Err(crate::config_error!(
                "fetch.max_content_length must be at least 1",
                "config"
            ));
        }

        if self.jobs.sweep_interval_secs == 0 {
            return Err(crate::config_error!(
                "jobs.sweep_interval_secs must be at least 1",
                "config"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = InquestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.research.worker_pool_size, 3);
        assert_eq!(config.research.max_subtopics, 5);
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let mut config = InquestConfig::default();
        config.research.worker_pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_subtopic_bounds_are_rejected() {
        let mut config = InquestConfig::default();
        config.research.min_subtopics = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = InquestConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: InquestConfig = toml::from_str(&text).unwrap();
        assert_eq!(
            parsed.research.search_count,
            config.research.search_count
        );
        assert_eq!(parsed.jobs.max_age_secs, config.jobs.max_age_secs);
    }
}
