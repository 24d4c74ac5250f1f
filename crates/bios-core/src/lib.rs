//! BIOS Core - Foundational types for the BIOS asset manager
//!
//! This crate provides the types every other crate depends on:
//! - `ContentDigest` - MD5 content identity for asset files
//! - Error types and Result alias

mod digest;
mod error;

pub use digest::ContentDigest;
pub use error::{BiosError, Result};
