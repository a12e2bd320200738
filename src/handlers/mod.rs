// handlers/mod.rs - two security tiers
//
// Public (no auth): /api/auth/*, /health
// Protected (bearer token): every other /api/* route
pub mod protected;
pub mod public;
