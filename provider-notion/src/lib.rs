//! # Notion Provider
//!
//! Implements `PageStore` for the Notion REST API.
//!
//! ## Overview
//!
//! This module provides:
//! - Page creation under a database parent
//! - Page property updates by page ID
//! - Database schema retrieval
//! - Parsing of Notion error bodies into typed API error codes
//!
//! Transport (TLS, pooling) is delegated to the injected `HttpClient`. Every
//! call is sent exactly once.

pub mod client;
pub mod error;
pub mod types;

pub use client::{NotionClient, NotionClientFactory, NOTION_API_BASE, NOTION_VERSION};
pub use error::{NotionError, Result};
