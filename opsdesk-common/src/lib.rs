//! # OpsDesk Common Library
//!
//! Shared code for all OpsDesk microservices including:
//! - Common error types
//! - Event types (OpsdeskEvent enum) and the broadcast EventBus
//! - Configuration loading and root folder resolution

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
