//! Paperhost Delivery - Backend Library
//!
//! Public content resolution and delivery engine: turns anonymous inbound
//! requests (by slug, short-link token, or customer domain) into served
//! content or a well-defined denial state.

pub mod access;
pub mod api;
pub mod config;
pub mod db;
pub mod emitter;
pub mod error;
pub mod models;
pub mod resolver;
pub mod storage;
pub mod store;
pub mod transform;
pub mod webhooks;

pub use config::Config;
pub use error::{AppError, Result};
