use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::EntityKind;
use crate::obligations::{Loan, LoanScheduleEntry, Service, ServiceScheduleEntry};
use crate::types::{EntryId, ObligationKey};

/// parent rows and their owned schedule rows
#[derive(Debug)]
pub struct Table<P, E> {
    pub(crate) parents: HashMap<Uuid, P>,
    pub(crate) entries: HashMap<Uuid, Vec<E>>,
}

impl<P, E> Default for Table<P, E> {
    fn default() -> Self {
        Self {
            parents: HashMap::new(),
            entries: HashMap::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Tables {
    pub(crate) loans: Table<Loan, LoanScheduleEntry>,
    pub(crate) services: Table<Service, ServiceScheduleEntry>,
    /// entry id -> owning parent
    pub(crate) entry_parents: HashMap<EntryId, ObligationKey>,
}

/// a schedule row owned by an aggregate root
pub trait ScheduleRow: Clone {
    /// value unique per parent
    type UniqueKey: Eq + Hash + fmt::Display;

    const KIND: EntityKind;

    fn id(&self) -> EntryId;
    fn unique_key(&self) -> Self::UniqueKey;
}

impl ScheduleRow for LoanScheduleEntry {
    type UniqueKey = u32;

    const KIND: EntityKind = EntityKind::LoanScheduleEntry;

    fn id(&self) -> EntryId {
        self.id
    }

    fn unique_key(&self) -> u32 {
        self.installment_number
    }
}

impl ScheduleRow for ServiceScheduleEntry {
    type UniqueKey = NaiveDate;

    const KIND: EntityKind = EntityKind::ServiceScheduleEntry;

    fn id(&self) -> EntryId {
        self.id
    }

    fn unique_key(&self) -> NaiveDate {
        self.period_start
    }
}

/// an obligation that owns a schedule
pub trait Aggregate: Clone {
    type Entry: ScheduleRow;

    const KIND: EntityKind;

    fn id(&self) -> Uuid;
    fn key_for(id: Uuid) -> ObligationKey;
    fn table(tables: &Tables) -> &Table<Self, Self::Entry>;
    fn table_mut(tables: &mut Tables) -> &mut Table<Self, Self::Entry>;
}

impl Aggregate for Loan {
    type Entry = LoanScheduleEntry;

    const KIND: EntityKind = EntityKind::Loan;

    fn id(&self) -> Uuid {
        self.id
    }

    fn key_for(id: Uuid) -> ObligationKey {
        ObligationKey::Loan(id)
    }

    fn table(tables: &Tables) -> &Table<Self, Self::Entry> {
        &tables.loans
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self, Self::Entry> {
        &mut tables.loans
    }
}

impl Aggregate for Service {
    type Entry = ServiceScheduleEntry;

    const KIND: EntityKind = EntityKind::Service;

    fn id(&self) -> Uuid {
        self.id
    }

    fn key_for(id: Uuid) -> ObligationKey {
        ObligationKey::Service(id)
    }

    fn table(tables: &Tables) -> &Table<Self, Self::Entry> {
        &tables.services
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self, Self::Entry> {
        &mut tables.services
    }
}
