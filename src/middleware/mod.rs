// ==============================================================================
// middleware/mod.rs - API Middleware Modules
// ==============================================================================
// Description: Authentication and request processing middleware
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

pub mod auth;

pub use auth::AuthUser;
