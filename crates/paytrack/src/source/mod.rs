//! Data-fetch collaborators that hand well-formed records to the engine.

mod csv_dir;
mod memory;

pub use csv_dir::CsvDataSource;
pub use memory::InMemoryDataSource;

use std::collections::HashMap;

use crate::ledger::{Client, ClientId, Order, OrderId, Payment, PaymentInvariantError};

/// Storage abstraction so dashboard assembly can be exercised in isolation.
pub trait DataSource: Send + Sync {
    /// Clients with their orders and payments attached.
    fn clients(&self) -> Result<Vec<Client>, DataSourceError>;
    fn orders(&self) -> Result<Vec<Order>, DataSourceError>;
    fn payments(&self) -> Result<Vec<Payment>, DataSourceError>;

    fn client(&self, id: &ClientId) -> Result<Option<Client>, DataSourceError> {
        Ok(self
            .clients()?
            .into_iter()
            .find(|client| &client.id == id))
    }
}

/// Error enumeration for data source failures.
#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read records: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid {record} record: {reason}")]
    Invalid { record: String, reason: String },
}

impl From<PaymentInvariantError> for DataSourceError {
    fn from(value: PaymentInvariantError) -> Self {
        Self::Invalid {
            record: "payment".to_string(),
            reason: value.to_string(),
        }
    }
}

/// Moves each order and payment into its owning client. Payments without a
/// client reference are routed through their order.
pub(crate) fn attach_records(
    mut clients: Vec<Client>,
    orders: &[Order],
    payments: &[Payment],
) -> Vec<Client> {
    let mut index: HashMap<ClientId, usize> = HashMap::new();
    for (position, client) in clients.iter().enumerate() {
        index.entry(client.id.clone()).or_insert(position);
    }

    let order_owners: HashMap<&OrderId, &ClientId> = orders
        .iter()
        .filter_map(|order| order.client_id.as_ref().map(|owner| (&order.id, owner)))
        .collect();

    for order in orders {
        if let Some(position) = order
            .client_id
            .as_ref()
            .and_then(|owner| index.get(owner))
        {
            clients[*position].orders.push(order.clone());
        }
    }

    for payment in payments {
        let owner = payment
            .client_id
            .as_ref()
            .or_else(|| order_owners.get(&payment.order_id).copied());
        if let Some(position) = owner.and_then(|owner| index.get(owner)) {
            clients[*position].payments.push(payment.clone());
        }
    }

    clients
}
