//! Request extractors guarding admin routes.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated admin from a JWT Bearer token.

pub mod auth;
