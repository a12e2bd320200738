// Every handler here runs behind `require_bearer` and scopes its storage
// calls to `AuthUser::user_id`.
pub mod baby;
pub mod documents;
pub mod events;
pub mod me;

pub use baby::{baby_get, baby_put};
pub use documents::{document_delete, document_file_get, document_get, document_post, documents_get};
pub use events::{event_delete, event_put, events_get, events_post};
pub use me::me_get;

use crate::error::ApiError;

/// Reject an empty or whitespace-only text field.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::field_error(field, "must not be empty"));
    }
    Ok(())
}
