pub mod auth;
pub mod rate_limit;
pub mod response;
pub mod validate_user;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use rate_limit::{rate_limit_middleware, RouteLimiter};
pub use response::{ApiResponse, ApiResult};
pub use validate_user::{validate_user_middleware, ValidatedUser};
