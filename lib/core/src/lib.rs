//! Core domain types and utilities for the trailhead platform.
//!
//! This crate provides the foundational types, error handling, and shared
//! utilities used throughout the trailhead tour-platform backend.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{AccountId, ParseIdError};
