//! Payment lifecycle and client scoring engine.
//!
//! Every function here is pure: callers pass the reference instant
//! explicitly and the same inputs always produce the same output.

mod client;
mod distribution;
pub mod domain;
pub mod scoring;
mod status;

pub use client::ClientSummary;
pub use distribution::{distribute, Bucket, Distribution, DistributionEntry};
pub use domain::{
    Client, ClientId, EffectiveStatus, LineItem, Order, OrderId, Payment, PaymentId,
    PaymentInvariantError, PaymentStatus, TrustScore,
};
pub use scoring::{score, PaymentTally, ScoreComponent, ScoreFactor};
pub use status::effective_status;
