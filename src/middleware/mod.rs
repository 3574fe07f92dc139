pub mod auth;
pub mod response;

pub use auth::{require_shared_secret, PASSWORD_HEADER};
pub use response::{ApiResponse, ApiResult};
