//! trailhead API server.
//!
//! This crate provides the HTTP surface for the trailhead tour platform:
//! Google sign-in, the per-request authorization gate, and the thin
//! internal/external API handlers over the Postgres store.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod types;
