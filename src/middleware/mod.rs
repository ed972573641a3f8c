pub mod auth;
pub mod cors;
pub mod response;

pub use auth::{is_authenticated, require_auth, visibility_filter, AuthUser, Viewer, Visibility};
pub use cors::with_cors;
pub use response::{ApiResponse, ApiResult};
