//! Core report pipeline for Rentdesk.
//!
//! This crate contains the report pipeline with ZERO web framework or HTTP
//! client dependencies. Report data arrives through the
//! [`reports::ReportDataClient`] trait.
//!
//! # Modules
//!
//! - `reports` - Filter validation, report store, generator and viewer

pub mod reports;
