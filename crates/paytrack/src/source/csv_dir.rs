use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{attach_records, DataSource, DataSourceError};
use crate::ledger::{
    Client, ClientId, Order, OrderId, Payment, PaymentId, PaymentStatus, TrustScore,
};

pub const CLIENTS_FILE: &str = "clients.csv";
pub const ORDERS_FILE: &str = "orders.csv";
pub const PAYMENTS_FILE: &str = "payments.csv";

/// Reads `clients.csv`, `orders.csv` and `payments.csv` from a directory on
/// every call. Orders and payments files are optional; the clients file is
/// not.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    dir: PathBuf,
}

impl CsvDataSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load_clients(&self) -> Result<Vec<Client>, DataSourceError> {
        let file = File::open(self.dir.join(CLIENTS_FILE))?;
        let rows: Vec<ClientRow> = read_rows(file)?;
        debug!(count = rows.len(), dir = %self.dir.display(), "loaded client rows");
        Ok(rows.into_iter().map(ClientRow::into_client).collect())
    }

    fn load_orders(&self) -> Result<Vec<Order>, DataSourceError> {
        let Some(file) = open_optional(&self.dir.join(ORDERS_FILE))? else {
            return Ok(Vec::new());
        };
        let rows: Vec<OrderRow> = read_rows(file)?;
        debug!(count = rows.len(), dir = %self.dir.display(), "loaded order rows");
        rows.into_iter().map(OrderRow::into_order).collect()
    }

    fn load_payments(&self) -> Result<Vec<Payment>, DataSourceError> {
        let Some(file) = open_optional(&self.dir.join(PAYMENTS_FILE))? else {
            return Ok(Vec::new());
        };
        let rows: Vec<PaymentRow> = read_rows(file)?;
        debug!(count = rows.len(), dir = %self.dir.display(), "loaded payment rows");
        rows.into_iter()
            .map(|row| -> Result<Payment, DataSourceError> {
                let payment = row.into_payment()?;
                payment.validate()?;
                Ok(payment)
            })
            .collect()
    }
}

impl DataSource for CsvDataSource {
    fn clients(&self) -> Result<Vec<Client>, DataSourceError> {
        let clients = self.load_clients()?;
        let orders = self.load_orders()?;
        let payments = self.load_payments()?;
        Ok(attach_records(clients, &orders, &payments))
    }

    fn orders(&self) -> Result<Vec<Order>, DataSourceError> {
        self.load_orders()
    }

    fn payments(&self) -> Result<Vec<Payment>, DataSourceError> {
        self.load_payments()
    }
}

fn open_optional(path: &Path) -> Result<Option<File>, DataSourceError> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader.deserialize::<T>().collect()
}

#[derive(Debug, Deserialize)]
struct ClientRow {
    id: String,
    name: String,
    status: PaymentStatus,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    tags: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    provider: Option<String>,
    #[serde(default)]
    installments: Option<u32>,
    #[serde(default)]
    payment_day: Option<u8>,
}

impl ClientRow {
    fn into_client(self) -> Client {
        let tags = self
            .tags
            .map(|raw| {
                raw.split('|')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Client {
            id: ClientId(self.id),
            name: self.name,
            status: self.status,
            orders: Vec::new(),
            payments: Vec::new(),
            score: self.score.map(TrustScore::clamped).unwrap_or_default(),
            tags,
            provider: self.provider,
            installments: self.installments.unwrap_or(0),
            payment_day: self.payment_day,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrderRow {
    id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    client_id: Option<String>,
    total_amount: f64,
    created_at: String,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, DataSourceError> {
        let created_at = parse_timestamp(&self.created_at)
            .ok_or_else(|| invalid("order", &self.id, "created_at", &self.created_at))?;

        Ok(Order {
            id: OrderId(self.id),
            client_id: self.client_id.map(ClientId),
            total_amount: self.total_amount,
            created_at,
            items: Vec::new(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct PaymentRow {
    id: String,
    order_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    client_id: Option<String>,
    amount: f64,
    status: PaymentStatus,
    due_date: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    paid_date: Option<String>,
    #[serde(default)]
    deferred_days: Option<u32>,
    created_at: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    updated_at: Option<String>,
    #[serde(default)]
    progress: Option<u8>,
}

impl PaymentRow {
    fn into_payment(self) -> Result<Payment, DataSourceError> {
        let due_date = parse_date(&self.due_date)
            .ok_or_else(|| invalid("payment", &self.id, "due_date", &self.due_date))?;
        let paid_date = match self.paid_date.as_deref() {
            Some(raw) => {
                Some(parse_date(raw).ok_or_else(|| invalid("payment", &self.id, "paid_date", raw))?)
            }
            None => None,
        };
        let created_at = parse_timestamp(&self.created_at)
            .ok_or_else(|| invalid("payment", &self.id, "created_at", &self.created_at))?;
        let updated_at = match self.updated_at.as_deref() {
            Some(raw) => parse_timestamp(raw)
                .ok_or_else(|| invalid("payment", &self.id, "updated_at", raw))?,
            None => created_at,
        };

        Ok(Payment {
            id: PaymentId(self.id),
            order_id: OrderId(self.order_id),
            client_id: self.client_id.map(ClientId),
            amount: self.amount,
            status: self.status,
            due_date,
            paid_date,
            deferred_days: self.deferred_days.unwrap_or(0),
            created_at,
            updated_at,
            progress: self.progress,
        })
    }
}

fn invalid(kind: &str, id: &str, field: &str, raw: &str) -> DataSourceError {
    DataSourceError::Invalid {
        record: format!("{kind} {id}"),
        reason: format!("unparseable {field} '{raw}'"),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    parse_date(trimmed)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
