//! CreditSea credit report ingestion service.
//!
//! Accepts bureau XML uploads, extracts and validates a normalized credit
//! report, persists it, and serves it back over a paginated REST API.
//!
//! - [`xml_tree`]: lenient XML-to-tree parsing with tag normalization
//! - [`extractor`]: multi-path field extraction, coercion, and validation
//! - [`models`]: domain types and API request/response shapes
//! - [`storage`]: Postgres / in-memory persistence behind one handle
//! - [`handlers`]: axum routes
//! - [`config`] / [`errors`]: environment configuration and error mapping

pub mod config;
pub mod errors;
pub mod extractor;
pub mod handlers;
pub mod models;
pub mod storage;
pub mod xml_tree;
