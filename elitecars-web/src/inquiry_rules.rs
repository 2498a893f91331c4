//! Who may delete an inquiry, depending on whether it has been answered.
//!
//! A requester may withdraw an inquiry only while it is unanswered; an admin may
//! delete only answered inquiries. The two rights never overlap.

use thiserror::Error;

use crate::models::Inquiry;

/// Placeholder some backend views store instead of an empty response.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response yet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Admin,
    Requester,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum InquiryRuleError {
    #[error("You cannot delete an inquiry that already has a response.")]
    RequesterCannotDeleteAnswered,
    #[error("Admin can only delete inquiries that already have a response.")]
    AdminCannotDeleteUnanswered,
}

pub fn ensure_can_delete(actor: Actor, inquiry: &Inquiry) -> Result<(), InquiryRuleError> {
    let response = inquiry.response.as_deref().map(str::trim).unwrap_or("");
    match actor {
        Actor::Requester => {
            if !response.is_empty() && response != NO_RESPONSE_PLACEHOLDER {
                return Err(InquiryRuleError::RequesterCannotDeleteAnswered);
            }
        }
        // The placeholder counts as answered here; only a blank response blocks.
        Actor::Admin => {
            if response.is_empty() {
                return Err(InquiryRuleError::AdminCannotDeleteUnanswered);
            }
        }
    }
    Ok(())
}
