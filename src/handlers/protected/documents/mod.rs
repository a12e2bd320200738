mod files;
mod upload;

pub use files::{document_delete, document_file_get, document_get, documents_get};
pub use upload::document_post;
