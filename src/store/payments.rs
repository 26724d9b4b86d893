use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::PaymentId;

/// a payment owned by the transactions subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub amount: Money,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// lookup of payments that schedule entries may link to
pub trait PaymentDirectory: Send + Sync {
    fn find_payment(&self, id: PaymentId) -> Option<PaymentRecord>;
}

/// in-memory payment directory
#[derive(Debug, Default)]
pub struct PaymentBook {
    payments: RwLock<HashMap<PaymentId, PaymentRecord>>,
}

impl PaymentBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// record a payment under a fresh id
    pub fn record(
        &self,
        amount: Money,
        date: NaiveDate,
        description: Option<String>,
    ) -> PaymentRecord {
        let payment = PaymentRecord {
            id: Uuid::new_v4(),
            amount,
            date,
            description,
        };
        self.insert(payment.clone());
        payment
    }

    pub fn insert(&self, payment: PaymentRecord) {
        self.payments.write().insert(payment.id, payment);
    }
}

impl PaymentDirectory for PaymentBook {
    fn find_payment(&self, id: PaymentId) -> Option<PaymentRecord> {
        self.payments.read().get(&id).cloned()
    }
}
