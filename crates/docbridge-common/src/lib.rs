//! Common utilities for docbridge
//!
//! This crate provides the error types shared by every docbridge crate.

pub mod error;

pub use error::{DatabaseError, DocBridgeError, Result};
