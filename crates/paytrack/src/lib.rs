//! Payment lifecycle and client scoring for client-payment dashboards.
//!
//! [`ledger`] holds the pure engine: effective payment status, trust
//! scores, status distributions and per-client financial summaries.
//! [`source`] and [`dashboard`] wire that engine to stored records.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod ledger;
pub mod source;
pub mod telemetry;
