//! Ownership trait for user-owned resources.
//!
//! Authorization is an explicit predicate checked at each mutation
//! boundary, never embedded in entity getters. Every aggregate that a
//! user owns implements `OwnedByUser`, and handlers call
//! `check_ownership()` before touching state.

use super::{DomainError, ErrorCode, UserId};

/// Trait for aggregates that have a single owner.
pub trait OwnedByUser {
    /// Returns the ID of the user who owns this resource.
    fn owner_id(&self) -> &UserId;

    /// Checks if the given user is the owner.
    fn is_owner(&self, user_id: &UserId) -> bool {
        self.owner_id() == user_id
    }

    /// Validates ownership, returning an error if the user is not the owner.
    ///
    /// Preferred in command handlers: returns a properly formed
    /// `DomainError` with `Forbidden` code and audit details.
    fn check_ownership(&self, user_id: &UserId) -> Result<(), DomainError> {
        if self.is_owner(user_id) {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::Forbidden,
                "User does not own this resource",
            )
            .with_detail("owner_id", self.owner_id().to_string())
            .with_detail("requested_by", user_id.to_string()))
        }
    }
}
