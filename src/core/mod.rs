//! Core types shared across Toolentry
//!
//! - [`error`] - [`ToolentryError`], [`ErrorContext`] and [`user_friendly_error`]

pub mod error;

pub use error::{ErrorContext, ToolentryError, user_friendly_error};
