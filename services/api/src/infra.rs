use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use paytrack::config::DataConfig;
use paytrack::ledger::{
    Client, ClientId, LineItem, Order, OrderId, Payment, PaymentId, PaymentStatus,
};
use paytrack::source::{CsvDataSource, DataSource, DataSourceError, InMemoryDataSource};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Records backing the service: CSV exports when a directory is configured,
/// otherwise the built-in sample book.
pub(crate) enum ConfiguredSource {
    Csv(CsvDataSource),
    Sample(InMemoryDataSource),
}

impl ConfiguredSource {
    pub(crate) fn resolve(dir: Option<PathBuf>, today: NaiveDate) -> Self {
        match dir {
            Some(dir) => Self::Csv(CsvDataSource::new(dir)),
            None => Self::Sample(sample_source(today)),
        }
    }

    pub(crate) fn from_config(config: &DataConfig, today: NaiveDate) -> Self {
        Self::resolve(config.dir.clone(), today)
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Csv(source) => format!("csv exports in {}", source.dir().display()),
            Self::Sample(_) => "built-in sample records".to_string(),
        }
    }
}

impl DataSource for ConfiguredSource {
    fn clients(&self) -> Result<Vec<Client>, DataSourceError> {
        match self {
            Self::Csv(source) => source.clients(),
            Self::Sample(source) => source.clients(),
        }
    }

    fn orders(&self) -> Result<Vec<Order>, DataSourceError> {
        match self {
            Self::Csv(source) => source.orders(),
            Self::Sample(source) => source.orders(),
        }
    }

    fn payments(&self) -> Result<Vec<Payment>, DataSourceError> {
        match self {
            Self::Csv(source) => source.payments(),
            Self::Sample(source) => source.payments(),
        }
    }
}

pub(crate) fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Reporting instant for an optional override date. Without one the wall
/// clock is read once, here, and passed down.
pub(crate) fn reporting_instant(date: Option<NaiveDate>) -> DateTime<Utc> {
    date.map(midnight).unwrap_or_else(Utc::now)
}

/// Sample book laid out around `today` so every status shows up.
pub(crate) fn sample_source(today: NaiveDate) -> InMemoryDataSource {
    let days = Duration::days;

    let mut rivera = Client::new("c-100", "Rivera Builders");
    rivera.tags = vec!["contractor".to_string()];
    rivera.installments = 4;
    rivera.payment_day = Some(15);

    let mut okafor = Client::new("c-200", "Okafor Dental");
    okafor.provider = Some("in-house".to_string());
    okafor.installments = 3;

    let mut lindqvist = Client::new("c-300", "Lindqvist Studio");
    lindqvist.status = PaymentStatus::Deferred;
    lindqvist.tags = vec!["creative".to_string(), "watchlist".to_string()];
    lindqvist.installments = 2;

    let orders = vec![
        sample_order("o-1001", "c-100", 4_000.0, today - days(120), "Scaffolding rental"),
        sample_order("o-1002", "c-100", 1_200.0, today - days(20), "Safety equipment"),
        sample_order("o-2001", "c-200", 2_700.0, today - days(90), "Imaging unit"),
        sample_order("o-3001", "c-300", 1_500.0, today - days(60), "Lighting kit"),
    ];

    let payments = vec![
        sample_payment("p-1", "o-1001", PaymentStatus::Completed, 1_000.0, today - days(90)),
        sample_payment("p-2", "o-1001", PaymentStatus::Completed, 1_000.0, today - days(60)),
        sample_payment("p-3", "o-1001", PaymentStatus::Scheduled, 1_000.0, today - days(5)),
        sample_payment("p-4", "o-1001", PaymentStatus::Scheduled, 1_000.0, today + days(7)),
        sample_payment("p-5", "o-1002", PaymentStatus::Scheduled, 1_200.0, today + days(40)),
        sample_payment("p-6", "o-2001", PaymentStatus::Settled, 900.0, today - days(60)),
        sample_payment("p-7", "o-2001", PaymentStatus::Settled, 900.0, today - days(30)),
        sample_payment("p-8", "o-2001", PaymentStatus::Scheduled, 900.0, today + days(3)),
        sample_payment("p-9", "o-3001", PaymentStatus::Deferred, 750.0, today - days(15)),
        sample_payment("p-10", "o-3001", PaymentStatus::Abandoned, 750.0, today - days(45)),
    ];

    InMemoryDataSource::with_records(vec![rivera, okafor, lindqvist], orders, payments)
}

fn sample_order(
    id: &str,
    client: &str,
    total: f64,
    created: NaiveDate,
    description: &str,
) -> Order {
    Order {
        id: OrderId(id.to_string()),
        client_id: Some(ClientId(client.to_string())),
        total_amount: total,
        created_at: midnight(created),
        items: vec![LineItem {
            description: description.to_string(),
            quantity: 1,
            unit_price: total,
        }],
    }
}

fn sample_payment(
    id: &str,
    order: &str,
    status: PaymentStatus,
    amount: f64,
    due: NaiveDate,
) -> Payment {
    let paid_date = status.is_resolved().then_some(due);
    let deferred_days = if status == PaymentStatus::Deferred { 30 } else { 0 };
    let created = midnight(due - Duration::days(120));

    Payment {
        id: PaymentId(id.to_string()),
        order_id: OrderId(order.to_string()),
        client_id: None,
        amount,
        status,
        due_date: due,
        paid_date,
        deferred_days,
        created_at: created,
        updated_at: paid_date.map(midnight).unwrap_or(created),
        progress: None,
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
