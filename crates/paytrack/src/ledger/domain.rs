use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::scoring::BASE_SCORE;

/// Identifier wrapper for client accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub String);

/// Identifier wrapper for financed orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

/// Identifier wrapper for individual installments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaymentId(pub String);

/// Stored status shared by payments and clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Scheduled,
    Settled,
    Deferred,
    Outstanding,
    Abandoned,
    Completed,
}

impl PaymentStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Scheduled,
            Self::Settled,
            Self::Deferred,
            Self::Outstanding,
            Self::Abandoned,
            Self::Completed,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Settled => "Settled",
            Self::Deferred => "Deferred",
            Self::Outstanding => "Outstanding",
            Self::Abandoned => "Abandoned",
            Self::Completed => "Completed",
        }
    }

    /// `settled` and `completed` both count as money received.
    pub const fn is_resolved(self) -> bool {
        matches!(self, Self::Settled | Self::Completed)
    }
}

/// Status computed against a reference instant.
///
/// `Overdue` only exists here: it is derived from the due date and is never
/// written back onto a [`Payment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    Completed,
    Scheduled,
    Deferred,
    Overdue,
    Abandoned,
}

impl EffectiveStatus {
    /// Display order used by progress and limit bars.
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Completed,
            Self::Scheduled,
            Self::Deferred,
            Self::Overdue,
            Self::Abandoned,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Scheduled => "Scheduled",
            Self::Deferred => "Deferred",
            Self::Overdue => "Overdue",
            Self::Abandoned => "Abandoned",
        }
    }
}

/// Trust score bounded to `0..=100`.
///
/// Every constructor clamps, including deserialization, so an out-of-range
/// persisted value can never leak into a [`Client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TrustScore(u8);

impl TrustScore {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 100;

    pub fn clamped(raw: i64) -> Self {
        Self(raw.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for TrustScore {
    fn default() -> Self {
        Self::clamped(BASE_SCORE)
    }
}

impl<'de> Deserialize<'de> for TrustScore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Ok(Self::clamped(raw))
    }
}

/// One scheduled or executed installment of a financed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    #[serde(default)]
    pub client_id: Option<ClientId>,
    pub amount: f64,
    pub status: PaymentStatus,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    /// Only meaningful while `status` is [`PaymentStatus::Deferred`].
    #[serde(default)]
    pub deferred_days: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Display-only completion hint supplied by the upstream system.
    #[serde(default)]
    pub progress: Option<u8>,
}

impl Payment {
    /// Checks the record-level invariants a data source must uphold before
    /// handing payments to the engine.
    pub fn validate(&self) -> Result<(), PaymentInvariantError> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(PaymentInvariantError::InvalidAmount {
                payment: self.id.0.clone(),
                amount: self.amount,
            });
        }

        if self.paid_date.is_some() && !self.status.is_resolved() {
            return Err(PaymentInvariantError::PaidDateOnUnresolved {
                payment: self.id.0.clone(),
                status: self.status.label(),
            });
        }

        if let Some(progress) = self.progress {
            if progress > 100 {
                return Err(PaymentInvariantError::ProgressOutOfRange {
                    payment: self.id.0.clone(),
                    progress,
                });
            }
        }

        Ok(())
    }
}

/// Violations of the payment record invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaymentInvariantError {
    #[error("payment {payment} has invalid amount {amount}")]
    InvalidAmount { payment: String, amount: f64 },
    #[error("payment {payment} carries a paid date while {status}")]
    PaidDateOnUnresolved {
        payment: String,
        status: &'static str,
    },
    #[error("payment {payment} progress {progress} exceeds 100")]
    ProgressOutOfRange { payment: String, progress: u8 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// A purchase financed for a client. Only `total_amount` and `created_at`
/// feed the aggregations; line items are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub client_id: Option<ClientId>,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// A person or account owing money across one or more orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub score: TrustScore,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub installments: u32,
    #[serde(default)]
    pub payment_day: Option<u8>,
}

impl Client {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ClientId(id.into()),
            name: name.into(),
            status: PaymentStatus::Scheduled,
            orders: Vec::new(),
            payments: Vec::new(),
            score: TrustScore::default(),
            tags: Vec::new(),
            provider: None,
            installments: 0,
            payment_day: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payment(status: PaymentStatus) -> Payment {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        Payment {
            id: PaymentId("pay-1".to_string()),
            order_id: OrderId("ord-1".to_string()),
            client_id: None,
            amount: 120.0,
            status,
            due_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            paid_date: None,
            deferred_days: 0,
            created_at: created,
            updated_at: created,
            progress: None,
        }
    }

    #[test]
    fn trust_score_clamps_on_construction_and_deserialization() {
        assert_eq!(TrustScore::clamped(-20).value(), 0);
        assert_eq!(TrustScore::clamped(250).value(), 100);
        assert_eq!(TrustScore::default().value(), 70);

        let parsed: TrustScore = serde_json::from_str("140").expect("integer score parses");
        assert_eq!(parsed.value(), 100);
        let parsed: TrustScore = serde_json::from_str("-3").expect("negative score parses");
        assert_eq!(parsed.value(), 0);
    }

    #[test]
    fn statuses_serialize_as_snake_case_labels() {
        let json = serde_json::to_string(&PaymentStatus::Outstanding).unwrap();
        assert_eq!(json, "\"outstanding\"");
        let json = serde_json::to_string(&EffectiveStatus::Overdue).unwrap();
        assert_eq!(json, "\"overdue\"");
        assert!(serde_json::from_str::<PaymentStatus>("\"overdue\"").is_err());
    }

    #[test]
    fn validate_rejects_paid_date_on_open_payment() {
        let mut record = payment(PaymentStatus::Scheduled);
        record.paid_date = NaiveDate::from_ymd_opt(2024, 1, 20);
        assert!(matches!(
            record.validate(),
            Err(PaymentInvariantError::PaidDateOnUnresolved { .. })
        ));

        record.status = PaymentStatus::Settled;
        assert!(record.validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_amount_and_progress_overflow() {
        let mut record = payment(PaymentStatus::Completed);
        record.amount = -1.0;
        assert!(matches!(
            record.validate(),
            Err(PaymentInvariantError::InvalidAmount { .. })
        ));

        let mut record = payment(PaymentStatus::Completed);
        record.progress = Some(140);
        assert!(matches!(
            record.validate(),
            Err(PaymentInvariantError::ProgressOutOfRange { progress: 140, .. })
        ));
    }

    #[test]
    fn client_deserializes_with_defaults() {
        let client: Client =
            serde_json::from_str(r#"{"id":"c-1","name":"Ada","status":"scheduled"}"#)
                .expect("minimal client parses");
        assert!(client.orders.is_empty());
        assert!(client.payments.is_empty());
        assert_eq!(client.score.value(), 70);
    }
}
