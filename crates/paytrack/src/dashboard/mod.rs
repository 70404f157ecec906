//! Dashboard assembly: fetches records from a [`DataSource`](crate::source::DataSource)
//! and turns engine outputs into serializable views.

mod service;
pub mod views;


pub use service::DashboardService;
pub use views::{DashboardOverview, DashboardTotals, PaymentSnapshotView};
