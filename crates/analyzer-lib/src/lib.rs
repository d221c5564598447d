//! Core library for the Redshift idle analyzer
//!
//! This crate provides the analysis pipeline:
//! - Windowed metric series collection with retry and gap accounting
//! - Timeline alignment and idle/active classification
//! - Price resolution with catalog, fallback, and default tiers
//! - Cost projection for a serverless migration
//! - Data quality auditing

pub mod activity;
pub mod analyzer;
pub mod collector;
pub mod cost;
pub mod error;
pub mod models;
pub mod pricing;
pub mod quality;
pub mod source;
pub mod timeline;
pub mod validate;

pub use analyzer::{AnalysisReport, Analyzer};
pub use error::{AnalyzerError, Result};
pub use models::*;
pub use validate::AnalysisRequest;
