use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::ledger::{ClientId, ClientSummary, DistributionEntry, EffectiveStatus, OrderId, PaymentId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardTotals {
    pub clients: usize,
    pub payments: usize,
    pub payment_amount: f64,
    pub total_spent: f64,
    pub paid_amount: f64,
    pub outstanding_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSnapshotView {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: EffectiveStatus,
    pub status_label: &'static str,
    /// Positive once the due date has passed, negative while still ahead.
    pub days_past_due: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub generated_at: DateTime<Utc>,
    pub totals: DashboardTotals,
    pub distribution: Vec<DistributionEntry>,
    pub clients: Vec<ClientSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overdue_payments: Vec<PaymentSnapshotView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub upcoming_payments: Vec<PaymentSnapshotView>,
}
