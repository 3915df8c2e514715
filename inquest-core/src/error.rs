//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type InquestResult<T> = Result<T, InquestError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the Inquest system
#[derive(Error, Debug)]
pub enum InquestError {
    /// Malformed collaborator output that cannot be accepted (e.g. a bad
    /// topic decomposition). Never silently coerced.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Agent error: {message}")]
    Agent {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Search error: {message}")]
    Search {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Fetch error: {message}")]
    Fetch {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// Top-level workflow failure carrying the topic it was working on.
    #[error("Research workflow failed for topic '{topic}': {source}")]
    Workflow {
        topic: String,
        #[source]
        source: Box<InquestError>,
        context: ErrorContext,
    },

    #[error("Job error: {message}")]
    Job {
        message: String,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_ms: Option<u64>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl InquestError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            InquestError::Validation { context, .. } => Some(context),
            InquestError::Agent { context, .. } => Some(context),
            InquestError::Search { context, .. } => Some(context),
            InquestError::Fetch { context, .. } => Some(context),
            InquestError::Workflow { context, .. } => Some(context),
            InquestError::Job { context, .. } => Some(context),
            InquestError::NotFound { context, .. } => Some(context),
            InquestError::Config { context, .. } => Some(context),
            InquestError::RateLimit { context, .. } => Some(context),
            InquestError::Timeout { context, .. } => Some(context),
            InquestError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Check if error is recoverable by retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            InquestError::RateLimit { .. } => true,
            InquestError::Timeout { .. } => true,
            InquestError::Validation { .. } => false,
            InquestError::Config { .. } => false,
            InquestError::NotFound { .. } => false,
            InquestError::Job { .. } => false,
            _ => false,
        }
    }

    /// Get retry delay in milliseconds for recoverable errors
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            InquestError::RateLimit { retry_after_ms, .. } => *retry_after_ms,
            InquestError::Timeout { .. } => Some(2000),
            _ => None,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            InquestError::RateLimit { .. } | InquestError::Timeout { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Recoverable error occurred"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }

    /// Wrap a fatal coordinator failure with the topic it belonged to
    pub fn into_workflow(self, topic: &str) -> Self {
        match self {
            already @ InquestError::Workflow { .. } => already,
            other => InquestError::Workflow {
                topic: topic.to_string(),
                source: Box::new(other),
                context: ErrorContext::new("coordinator").with_operation("run"),
            },
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $component:expr) => {
        $crate::InquestError::Validation {
            message: $msg.to_string(),
            field: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the collaborator output format"),
        }
    };
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::InquestError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::InquestError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file"),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::InquestError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Verify the identifier and check if the record expired"),
        }
    };
}
