pub mod auth;
pub mod cors;
pub mod response;

pub use auth::{require_bearer, AuthUser};
pub use cors::{cors_headers, cors_layer};
pub use response::{ApiResponse, ApiResult};
