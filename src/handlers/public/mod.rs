// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and service liveness.

pub mod auth; // POST /api/v1/register, POST /api/v1/login
pub mod info; // GET /, GET /health

pub use auth::{login_post, register_post};
pub use info::{health_get, root_get};
