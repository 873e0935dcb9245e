pub mod auth;
pub mod quota;

pub use auth::{AuthUser, auth_middleware};
pub use quota::quota_middleware;
