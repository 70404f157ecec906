use std::sync::{Mutex, MutexGuard};

use super::{attach_records, DataSource, DataSourceError};
use crate::ledger::{Client, Order, Payment};

#[derive(Debug, Default)]
struct Records {
    clients: Vec<Client>,
    orders: Vec<Order>,
    payments: Vec<Payment>,
}

/// Process-local data source used by demos and tests.
#[derive(Debug, Default)]
pub struct InMemoryDataSource {
    records: Mutex<Records>,
}

impl InMemoryDataSource {
    pub fn with_records(clients: Vec<Client>, orders: Vec<Order>, payments: Vec<Payment>) -> Self {
        Self {
            records: Mutex::new(Records {
                clients,
                orders,
                payments,
            }),
        }
    }

    pub fn insert_client(&self, client: Client) -> Result<(), DataSourceError> {
        self.lock()?.clients.push(client);
        Ok(())
    }

    pub fn insert_order(&self, order: Order) -> Result<(), DataSourceError> {
        self.lock()?.orders.push(order);
        Ok(())
    }

    pub fn insert_payment(&self, payment: Payment) -> Result<(), DataSourceError> {
        payment.validate()?;
        self.lock()?.payments.push(payment);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Records>, DataSourceError> {
        self.records
            .lock()
            .map_err(|_| DataSourceError::Unavailable("in-memory store poisoned".to_string()))
    }
}

impl DataSource for InMemoryDataSource {
    fn clients(&self) -> Result<Vec<Client>, DataSourceError> {
        let guard = self.lock()?;
        Ok(attach_records(
            guard.clients.clone(),
            &guard.orders,
            &guard.payments,
        ))
    }

    fn orders(&self) -> Result<Vec<Order>, DataSourceError> {
        Ok(self.lock()?.orders.clone())
    }

    fn payments(&self) -> Result<Vec<Payment>, DataSourceError> {
        Ok(self.lock()?.payments.clone())
    }
}
