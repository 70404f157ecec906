use chrono::{DateTime, Utc};

use super::domain::{EffectiveStatus, Payment, PaymentStatus};

/// Resolves the status a payment should be displayed with at `now`.
///
/// A stored status can be stale relative to the clock, so resolved, deferred
/// and abandoned outcomes take precedence and only the remaining open
/// payments are compared against their due date. `settled` and `completed`
/// both resolve to [`EffectiveStatus::Completed`]. A payment becomes overdue
/// on the first calendar day after its due date.
pub fn effective_status(payment: &Payment, now: DateTime<Utc>) -> EffectiveStatus {
    match payment.status {
        PaymentStatus::Completed | PaymentStatus::Settled => EffectiveStatus::Completed,
        PaymentStatus::Deferred => EffectiveStatus::Deferred,
        PaymentStatus::Abandoned => EffectiveStatus::Abandoned,
        PaymentStatus::Scheduled | PaymentStatus::Outstanding => {
            if now.date_naive() > payment.due_date {
                EffectiveStatus::Overdue
            } else {
                EffectiveStatus::Scheduled
            }
        }
    }
}

impl Payment {
    pub fn effective_status(&self, now: DateTime<Utc>) -> EffectiveStatus {
        effective_status(self, now)
    }
}
