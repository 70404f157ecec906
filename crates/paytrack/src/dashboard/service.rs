use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, warn};

use super::views::{DashboardOverview, DashboardTotals, PaymentSnapshotView};
use crate::config::DashboardConfig;
use crate::ledger::{
    distribute, Client, ClientId, ClientSummary, EffectiveStatus, Payment, PaymentId,
};
use crate::source::{DataSource, DataSourceError};

/// Assembles dashboard views from an injected data source.
pub struct DashboardService<D> {
    source: Arc<D>,
    config: DashboardConfig,
}

impl<D> DashboardService<D>
where
    D: DataSource + 'static,
{
    pub fn new(source: Arc<D>, config: DashboardConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Builds the full dashboard against one `now`. A failed fetch is logged
    /// and treated as an empty collection.
    pub fn overview(&self, now: DateTime<Utc>) -> DashboardOverview {
        let clients = fetch_or_empty("clients", self.source.clients());
        let payments = fetch_or_empty("payments", self.source.payments());
        let since = self.score_since(now);

        let mut summaries: Vec<ClientSummary> = clients
            .iter()
            .map(|client| ClientSummary::build(client, now, since))
            .collect();
        summaries.sort_by(|a, b| {
            b.outstanding_amount
                .total_cmp(&a.outstanding_amount)
                .then_with(|| a.name.cmp(&b.name))
        });

        let distribution = distribute(&payments, now);
        let totals = totals(&summaries, payments.len(), distribution.total_amount());

        let owners = owner_names(&clients);
        let today = now.date_naive();
        let horizon = today
            .checked_add_signed(Duration::days(i64::from(self.config.upcoming_window_days)))
            .unwrap_or(NaiveDate::MAX);

        let mut overdue_payments = Vec::new();
        let mut upcoming_payments = Vec::new();
        for payment in &payments {
            match payment.effective_status(now) {
                EffectiveStatus::Overdue => {
                    overdue_payments.push(snapshot(payment, EffectiveStatus::Overdue, today, &owners))
                }
                EffectiveStatus::Scheduled if payment.due_date <= horizon => upcoming_payments
                    .push(snapshot(payment, EffectiveStatus::Scheduled, today, &owners)),
                _ => {}
            }
        }
        overdue_payments.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        upcoming_payments.sort_by(|a, b| a.due_date.cmp(&b.due_date));

        debug!(
            clients = summaries.len(),
            payments = payments.len(),
            overdue = overdue_payments.len(),
            upcoming = upcoming_payments.len(),
            "assembled dashboard overview"
        );

        DashboardOverview {
            generated_at: now,
            totals,
            distribution: distribution.zero_filled(),
            clients: summaries,
            overdue_payments,
            upcoming_payments,
        }
    }

    /// Summary for a single client, or `None` when the id is unknown.
    pub fn client_summary(
        &self,
        id: &ClientId,
        now: DateTime<Utc>,
    ) -> Result<Option<ClientSummary>, DataSourceError> {
        let client = self.source.client(id)?;
        Ok(client.map(|client| ClientSummary::build(&client, now, self.score_since(now))))
    }

    fn score_since(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
        self.config.score_lookback_days.map(|days| {
            now.date_naive()
                .checked_sub_signed(Duration::days(i64::from(days)))
                .unwrap_or(NaiveDate::MIN)
        })
    }
}

fn fetch_or_empty<T>(collection: &'static str, result: Result<Vec<T>, DataSourceError>) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(err) => {
            warn!(collection, error = %err, "data source fetch failed; continuing with no records");
            Vec::new()
        }
    }
}

fn totals(summaries: &[ClientSummary], payments: usize, payment_amount: f64) -> DashboardTotals {
    let sum = |field: fn(&ClientSummary) -> f64| {
        summaries
            .iter()
            .fold(0.0, |acc, summary| acc + field(summary))
    };

    let average_score = if summaries.is_empty() {
        None
    } else {
        let total: u32 = summaries
            .iter()
            .map(|summary| u32::from(summary.score.value()))
            .sum();
        Some(f64::from(total) / summaries.len() as f64)
    };

    DashboardTotals {
        clients: summaries.len(),
        payments,
        payment_amount,
        total_spent: sum(|summary| summary.total_spent),
        paid_amount: sum(|summary| summary.paid_amount),
        outstanding_amount: sum(|summary| summary.outstanding_amount),
        average_score,
    }
}

fn owner_names(clients: &[Client]) -> HashMap<&PaymentId, (&ClientId, &str)> {
    clients
        .iter()
        .flat_map(|client| {
            client
                .payments
                .iter()
                .map(move |payment| (&payment.id, (&client.id, client.name.as_str())))
        })
        .collect()
}

fn snapshot(
    payment: &Payment,
    status: EffectiveStatus,
    today: NaiveDate,
    owners: &HashMap<&PaymentId, (&ClientId, &str)>,
) -> PaymentSnapshotView {
    let owner = owners.get(&payment.id);

    PaymentSnapshotView {
        payment_id: payment.id.clone(),
        order_id: payment.order_id.clone(),
        client_id: payment
            .client_id
            .clone()
            .or_else(|| owner.map(|(id, _)| (*id).clone())),
        client_name: owner.map(|(_, name)| (*name).to_string()),
        amount: payment.amount,
        due_date: payment.due_date,
        status,
        status_label: status.label(),
        days_past_due: (today - payment.due_date).num_days(),
    }
}
