// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT bearer auth, every query scoped to the caller)
pub mod public;    // Tier 1: No authentication required (/, /health)
pub mod protected; // Tier 2: JWT authentication required (/api/*)
