//! # devboard-core - Core Domain Types
//!
//! Foundation crate for devboard. Provides tab identity and badge types,
//! error handling, logging setup, tolerant payload access and the shared
//! presentation helpers.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`TabIdentity`] - Immutable id/label/icon of a tab
//! - [`Badge`], [`BadgeStyle`] - Tab selector status indicator
//! - [`TabPhase`] - Coarse tab lifecycle (Uninitialized, Loading, Loaded, Errored)
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ### Payloads (`payload`)
//! - [`PayloadExt`] - Defaulting accessors over untrusted daemon JSON
//!
//! ### Formatting (`format`)
//! - [`escape()`], [`format_relative_time()`], [`format_duration()`], [`empty_state()`]
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use devboard_core::prelude::*;
//! ```

pub mod error;
pub mod format;
pub mod logging;
pub mod payload;
pub mod prelude;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use format::{
    empty_state, escape, format_bytes, format_count, format_duration, format_relative_time,
};
pub use payload::{list_payload, PayloadExt};
pub use types::{Badge, BadgeStyle, TabIdentity, TabPhase};
