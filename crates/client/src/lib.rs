//! Report data clients for Rentdesk.
//!
//! [`HttpReportClient`] talks to the remote report API. [`ReportBackend`]
//! picks between it and the built-in sample data according to
//! configuration.

pub mod backend;
pub mod error;
pub mod http;


pub use backend::ReportBackend;
pub use error::{ClientError, ClientResult};
pub use http::HttpReportClient;
