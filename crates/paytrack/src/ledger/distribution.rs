use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{EffectiveStatus, Payment};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bucket {
    pub count: usize,
    pub total_amount: f64,
}

/// Payments grouped by effective status. Statuses without payments have no
/// bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    buckets: HashMap<EffectiveStatus, Bucket>,
}

/// Buckets `payments` by their effective status at `now`.
pub fn distribute<'a, I>(payments: I, now: DateTime<Utc>) -> Distribution
where
    I: IntoIterator<Item = &'a Payment>,
{
    let mut distribution = Distribution::default();

    for payment in payments {
        let bucket = distribution
            .buckets
            .entry(payment.effective_status(now))
            .or_default();
        bucket.count += 1;
        bucket.total_amount += payment.amount;
    }

    distribution
}

impl Distribution {
    pub fn get(&self, status: EffectiveStatus) -> Option<&Bucket> {
        self.buckets.get(&status)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Buckets in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (EffectiveStatus, &Bucket)> {
        self.buckets.iter().map(|(status, bucket)| (*status, bucket))
    }

    pub fn total_count(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.count).sum()
    }

    /// Summed in display order so repeated calls agree to the last bit.
    pub fn total_amount(&self) -> f64 {
        EffectiveStatus::ordered()
            .into_iter()
            .filter_map(|status| self.buckets.get(&status))
            .fold(0.0, |acc, bucket| acc + bucket.total_amount)
    }

    /// Populated buckets in display order.
    pub fn entries(&self) -> Vec<DistributionEntry> {
        EffectiveStatus::ordered()
            .into_iter()
            .filter_map(|status| {
                self.buckets
                    .get(&status)
                    .map(|bucket| self.entry(status, *bucket))
            })
            .collect()
    }

    /// One entry per effective status in display order, zero-filled for
    /// statuses without payments.
    pub fn zero_filled(&self) -> Vec<DistributionEntry> {
        EffectiveStatus::ordered()
            .into_iter()
            .map(|status| {
                let bucket = self.buckets.get(&status).copied().unwrap_or_default();
                self.entry(status, bucket)
            })
            .collect()
    }

    fn entry(&self, status: EffectiveStatus, bucket: Bucket) -> DistributionEntry {
        DistributionEntry {
            status,
            status_label: status.label(),
            count: bucket.count,
            total_amount: bucket.total_amount,
            count_share: percent(bucket.count as f64, self.total_count() as f64),
            amount_share: percent(bucket.total_amount, self.total_amount()),
        }
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        (part * 100.0 / whole).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Display row for progress and limit bars. Shares are percentages of the
/// distribution totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionEntry {
    pub status: EffectiveStatus,
    pub status_label: &'static str,
    pub count: usize,
    pub total_amount: f64,
    pub count_share: f64,
    pub amount_share: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::domain::{OrderId, PaymentId, PaymentStatus};
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
    }

    fn payment(id: &str, status: PaymentStatus, amount: f64, due: NaiveDate) -> Payment {
        Payment {
            id: PaymentId(id.to_string()),
            order_id: OrderId("ord-1".to_string()),
            client_id: None,
            amount,
            status,
            due_date: due,
            paid_date: None,
            deferred_days: 0,
            created_at: now(),
            updated_at: now(),
            progress: None,
        }
    }

    fn past() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn future() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn empty_input_yields_empty_distribution() {
        let payments: Vec<Payment> = Vec::new();
        let distribution = distribute(&payments, now());
        assert!(distribution.is_empty());
        assert!(distribution.entries().is_empty());
        assert_eq!(distribution.total_amount(), 0.0);
    }

    #[test]
    fn single_status_collapses_into_one_bucket() {
        let payments = vec![
            payment("p1", PaymentStatus::Completed, 40.0, past()),
            payment("p2", PaymentStatus::Completed, 60.5, future()),
            payment("p3", PaymentStatus::Completed, 9.5, past()),
        ];

        let distribution = distribute(&payments, now());
        assert_eq!(distribution.len(), 1);
        let bucket = distribution
            .get(EffectiveStatus::Completed)
            .expect("completed bucket");
        assert_eq!(bucket.count, 3);
        assert_eq!(bucket.total_amount, 110.0);
    }

    #[test]
    fn buckets_use_effective_status() {
        let payments = vec![
            payment("p1", PaymentStatus::Scheduled, 25.0, past()),
            payment("p2", PaymentStatus::Scheduled, 30.0, future()),
            payment("p3", PaymentStatus::Deferred, 15.0, past()),
            payment("p4", PaymentStatus::Scheduled, 75.0, past()),
        ];

        let distribution = distribute(&payments, now());
        assert_eq!(distribution.len(), 3);
        let overdue = distribution.get(EffectiveStatus::Overdue).expect("overdue");
        assert_eq!(overdue.count, 2);
        assert_eq!(overdue.total_amount, 100.0);
        assert!(distribution.get(EffectiveStatus::Abandoned).is_none());
        assert_eq!(distribution.total_count(), 4);
    }

    #[test]
    fn settled_and_completed_share_one_bucket() {
        let payments = vec![
            payment("p1", PaymentStatus::Completed, 40.0, past()),
            payment("p2", PaymentStatus::Settled, 60.0, past()),
        ];

        let distribution = distribute(&payments, now());
        assert_eq!(distribution.len(), 1);
        let bucket = distribution
            .get(EffectiveStatus::Completed)
            .expect("completed bucket");
        assert_eq!(bucket.count, 2);
        assert_eq!(bucket.total_amount, 100.0);
        assert_eq!(distribution.zero_filled().len(), 5);
    }

    #[test]
    fn input_order_does_not_change_result() {
        let mut payments = vec![
            payment("p1", PaymentStatus::Scheduled, 25.0, past()),
            payment("p2", PaymentStatus::Abandoned, 30.0, future()),
            payment("p3", PaymentStatus::Settled, 15.0, past()),
        ];
        let forward = distribute(&payments, now());
        payments.reverse();
        let backward = distribute(&payments, now());
        assert_eq!(forward, backward);
        assert_eq!(forward, distribute(&payments, now()));
    }

    #[test]
    fn entries_follow_display_order_and_zero_fill() {
        let payments = vec![
            payment("p1", PaymentStatus::Abandoned, 20.0, future()),
            payment("p2", PaymentStatus::Completed, 60.0, past()),
            payment("p3", PaymentStatus::Completed, 20.0, past()),
        ];
        let distribution = distribute(&payments, now());

        let entries = distribution.entries();
        let statuses: Vec<_> = entries.iter().map(|entry| entry.status).collect();
        assert_eq!(
            statuses,
            vec![EffectiveStatus::Completed, EffectiveStatus::Abandoned]
        );
        assert_eq!(entries[0].amount_share, 80.0);
        assert_eq!(entries[1].status_label, "Abandoned");

        let filled = distribution.zero_filled();
        assert_eq!(filled.len(), EffectiveStatus::ordered().len());
        let overdue = filled
            .iter()
            .find(|entry| entry.status == EffectiveStatus::Overdue)
            .expect("overdue row present");
        assert_eq!(overdue.count, 0);
        assert_eq!(overdue.count_share, 0.0);
    }
}
