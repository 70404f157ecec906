use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::distribution::{distribute, DistributionEntry};
use super::domain::{Client, ClientId, EffectiveStatus, Order, Payment, PaymentStatus, TrustScore};
use super::scoring::{PaymentTally, ScoreComponent};

impl Client {
    /// Sum of every order's total amount.
    pub fn total_spent(&self) -> f64 {
        self.orders
            .iter()
            .fold(0.0, |acc, order| acc + order.total_amount)
    }

    /// Sum of payments stored as `settled` or `completed`.
    pub fn paid_amount(&self) -> f64 {
        self.payments
            .iter()
            .filter(|payment| payment.status.is_resolved())
            .fold(0.0, |acc, payment| acc + payment.amount)
    }

    /// Balance still owed. Overpayment clamps to zero instead of going
    /// negative.
    pub fn outstanding_amount(&self) -> f64 {
        (self.total_spent() - self.paid_amount()).max(0.0)
    }

    pub fn last_order_date(&self) -> Option<DateTime<Utc>> {
        let mut orders: Vec<&Order> = self.orders.iter().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.first().map(|order| order.created_at)
    }

    /// Earliest due date among payments stored as `scheduled`. Filters on
    /// stored status, so installments already past due are included.
    pub fn next_payment_date(&self) -> Option<NaiveDate> {
        let mut scheduled: Vec<&Payment> = self
            .payments
            .iter()
            .filter(|payment| payment.status == PaymentStatus::Scheduled)
            .collect();
        scheduled.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        scheduled.first().map(|payment| payment.due_date)
    }
}

/// Financial and trust snapshot for one client at a reference instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSummary {
    pub client_id: ClientId,
    pub name: String,
    pub status: PaymentStatus,
    pub status_label: &'static str,
    pub recorded_score: TrustScore,
    pub score: TrustScore,
    pub score_components: Vec<ScoreComponent>,
    pub tally: PaymentTally,
    pub total_spent: f64,
    pub paid_amount: f64,
    pub outstanding_amount: f64,
    pub last_order_date: Option<DateTime<Utc>>,
    pub next_payment_date: Option<NaiveDate>,
    pub overdue_payments: usize,
    pub distribution: Vec<DistributionEntry>,
    pub tags: Vec<String>,
}

impl ClientSummary {
    /// Derives every client figure against a single `now`. `since` limits
    /// the payments that feed the trust score; the financial totals always
    /// cover the full history.
    pub fn build(client: &Client, now: DateTime<Utc>, since: Option<NaiveDate>) -> Self {
        let tally = PaymentTally::within(&client.payments, now, since);
        let distribution = distribute(&client.payments, now);
        let overdue_payments = distribution
            .get(EffectiveStatus::Overdue)
            .map(|bucket| bucket.count)
            .unwrap_or(0);

        Self {
            client_id: client.id.clone(),
            name: client.name.clone(),
            status: client.status,
            status_label: client.status.label(),
            recorded_score: client.score,
            score: tally.score(),
            score_components: tally.components(),
            tally,
            total_spent: client.total_spent(),
            paid_amount: client.paid_amount(),
            outstanding_amount: client.outstanding_amount(),
            last_order_date: client.last_order_date(),
            next_payment_date: client.next_payment_date(),
            overdue_payments,
            distribution: distribution.entries(),
            tags: client.tags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::domain::{OrderId, PaymentId};
    use chrono::TimeZone;

    fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn order(id: &str, total: f64, created_at: DateTime<Utc>) -> Order {
        Order {
            id: OrderId(id.to_string()),
            client_id: Some(ClientId("c-1".to_string())),
            total_amount: total,
            created_at,
            items: Vec::new(),
        }
    }

    fn payment(id: &str, status: PaymentStatus, amount: f64, due: NaiveDate) -> Payment {
        Payment {
            id: PaymentId(id.to_string()),
            order_id: OrderId("o-1".to_string()),
            client_id: Some(ClientId("c-1".to_string())),
            amount,
            status,
            due_date: due,
            paid_date: None,
            deferred_days: 0,
            created_at: ts(2024, 1, 1),
            updated_at: ts(2024, 1, 1),
            progress: None,
        }
    }

    #[test]
    fn empty_client_has_zero_totals_and_no_dates() {
        let client = Client::new("c-1", "Empty");
        assert_eq!(client.total_spent(), 0.0);
        assert_eq!(client.paid_amount(), 0.0);
        assert_eq!(client.outstanding_amount(), 0.0);
        assert_eq!(client.last_order_date(), None);
        assert_eq!(client.next_payment_date(), None);
    }

    #[test]
    fn paid_amount_counts_settled_and_completed_only() {
        let mut client = Client::new("c-1", "Ada");
        client.orders = vec![order("o-1", 300.0, ts(2024, 1, 1))];
        client.payments = vec![
            payment("p1", PaymentStatus::Completed, 100.0, date(2024, 1, 10)),
            payment("p2", PaymentStatus::Settled, 50.0, date(2024, 2, 10)),
            payment("p3", PaymentStatus::Scheduled, 75.0, date(2024, 3, 10)),
            payment("p4", PaymentStatus::Deferred, 75.0, date(2024, 4, 10)),
        ];

        assert_eq!(client.total_spent(), 300.0);
        assert_eq!(client.paid_amount(), 150.0);
        assert_eq!(client.outstanding_amount(), 150.0);
    }

    #[test]
    fn overpayment_clamps_outstanding_to_zero() {
        let mut client = Client::new("c-1", "Ada");
        client.orders = vec![order("o-1", 100.0, ts(2024, 1, 1))];
        client.payments = vec![payment(
            "p1",
            PaymentStatus::Completed,
            150.0,
            date(2024, 1, 10),
        )];

        assert_eq!(client.outstanding_amount(), 0.0);
    }

    #[test]
    fn last_order_date_picks_most_recent_creation() {
        let mut client = Client::new("c-1", "Ada");
        client.orders = vec![
            order("o-1", 10.0, ts(2024, 1, 5)),
            order("o-2", 10.0, ts(2024, 3, 9)),
            order("o-3", 10.0, ts(2023, 12, 30)),
        ];
        assert_eq!(client.last_order_date(), Some(ts(2024, 3, 9)));
    }

    #[test]
    fn next_payment_date_uses_stored_scheduled_status() {
        let mut client = Client::new("c-1", "Ada");
        client.payments = vec![
            payment("p1", PaymentStatus::Deferred, 10.0, date(2023, 11, 1)),
            payment("p2", PaymentStatus::Scheduled, 10.0, date(2024, 5, 1)),
            payment("p3", PaymentStatus::Scheduled, 10.0, date(2024, 1, 1)),
            payment("p4", PaymentStatus::Outstanding, 10.0, date(2023, 12, 1)),
        ];

        // p3 is overdue by date but is still stored as scheduled.
        assert_eq!(client.next_payment_date(), Some(date(2024, 1, 1)));
    }

    #[test]
    fn summary_bundles_derivations_with_one_now() {
        let mut client = Client::new("c-1", "Ada");
        client.tags = vec!["vip".to_string()];
        client.orders = vec![order("o-1", 400.0, ts(2024, 1, 2))];
        client.payments = vec![
            payment("p1", PaymentStatus::Completed, 100.0, date(2024, 1, 15)),
            payment("p2", PaymentStatus::Scheduled, 100.0, date(2024, 2, 15)),
            payment("p3", PaymentStatus::Scheduled, 100.0, date(2024, 3, 15)),
            payment("p4", PaymentStatus::Scheduled, 100.0, date(2024, 4, 15)),
        ];

        let now = ts(2024, 3, 1);
        let summary = ClientSummary::build(&client, now, None);

        assert_eq!(summary.total_spent, 400.0);
        assert_eq!(summary.paid_amount, 100.0);
        assert_eq!(summary.outstanding_amount, 300.0);
        assert_eq!(summary.next_payment_date, Some(date(2024, 2, 15)));
        assert_eq!(summary.overdue_payments, 1);
        // 70 + 5 - 5
        assert_eq!(summary.score.value(), 70);
        assert_eq!(summary.recorded_score, client.score);
        assert_eq!(summary.distribution.len(), 3);
        assert_eq!(summary, ClientSummary::build(&client, now, None));
    }
}
