// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (JWT auth + user validation)

pub mod protected; // Bearer token required (/api/v1/*)
pub mod public; // No authentication (/, /health, /api/v1/register, /api/v1/login)
