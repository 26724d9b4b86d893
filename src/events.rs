use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{EntryId, LoanId, LoanStatus, PaymentId, ServiceId, ServiceStatus};

/// all events emitted by schedule mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // schedule lifecycle
    LoanScheduleGenerated {
        loan_id: LoanId,
        installments: u32,
        total_amount: Money,
        regenerated: bool,
        timestamp: DateTime<Utc>,
    },
    ServiceScheduleGenerated {
        service_id: ServiceId,
        periods: u32,
        regenerated: bool,
        timestamp: DateTime<Utc>,
    },

    // payment events
    LoanPaymentApplied {
        loan_id: LoanId,
        entry_id: EntryId,
        payment_id: PaymentId,
        amount: Money,
        paid_date: NaiveDate,
    },
    ServicePaymentApplied {
        service_id: ServiceId,
        entry_id: EntryId,
        payment_id: PaymentId,
        amount: Money,
        late_fee: Money,
        paid_date: NaiveDate,
    },
    PaymentUnlinked {
        entry_id: EntryId,
        payment_id: Option<PaymentId>,
        timestamp: DateTime<Utc>,
    },
    PeriodSkipped {
        service_id: ServiceId,
        entry_id: EntryId,
        timestamp: DateTime<Utc>,
    },
    InstallmentOverdue {
        loan_id: LoanId,
        entry_id: EntryId,
        due_date: NaiveDate,
    },

    // status change events
    LoanStatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        timestamp: DateTime<Utc>,
    },
    ServiceStatusChanged {
        service_id: ServiceId,
        old_status: ServiceStatus,
        new_status: ServiceStatus,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn extend(&mut self, events: Vec<Event>) {
        self.events.extend(events);
    }
}
