//! Command infrastructure for CQRS handlers.
//!
//! Instead of each handler accepting `user_id: UserId, correlation_id:
//! Option<String>` separately, they accept a single `CommandMetadata`
//! struct with consistent naming across all handlers.

use serde::{Deserialize, Serialize};

use super::UserId;

/// Metadata context for command handlers.
///
/// Carries the calling user and correlation context through the command
/// processing pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// The user executing this command (required for authorization).
    pub user_id: UserId,

    /// Links related operations across a single user request.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl CommandMetadata {
    /// Creates metadata for the given user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            correlation_id: None,
        }
    }

    /// Attaches a correlation ID.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Returns the correlation ID, if one was provided.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}
