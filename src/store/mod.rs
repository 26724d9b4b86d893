//! in-process transactional store for obligations and their schedules
//!
//! Every mutation runs inside a [`Transaction`] scoped to one parent
//! obligation. Beginning a transaction takes an exclusive lock on that parent
//! and stages a private copy of its row and schedule; [`Transaction::commit`]
//! swaps the staged copy in atomically and dropping it without committing
//! rolls everything back. Different parents never block each other.
pub mod payments;
mod tables;

use std::collections::HashSet;

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::errors::{Result, ScheduleError};
use crate::events::{Event, EventStore};
use crate::types::{EntryId, ObligationKey};

pub use payments::{PaymentBook, PaymentDirectory, PaymentRecord};
pub use tables::{Aggregate, ScheduleRow};

use tables::Tables;

/// exclusive per-parent locks ("select ... for update")
#[derive(Debug, Default)]
struct RowLocks {
    held: Mutex<HashSet<ObligationKey>>,
    released: Condvar,
}

impl RowLocks {
    fn acquire(&self, key: ObligationKey) -> RowLock<'_> {
        let mut held = self.held.lock();
        while held.contains(&key) {
            self.released.wait(&mut held);
        }
        held.insert(key);
        RowLock { locks: self, key }
    }
}

/// held for the lifetime of a transaction
struct RowLock<'a> {
    locks: &'a RowLocks,
    key: ObligationKey,
}

impl Drop for RowLock<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock();
        held.remove(&self.key);
        self.locks.released.notify_all();
    }
}

/// committed obligations, their schedules and the event journal
#[derive(Debug, Default)]
pub struct Ledger {
    tables: RwLock<Tables>,
    row_locks: RowLocks,
    journal: Mutex<EventStore>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// begin a transaction on an existing parent, waiting for its row lock
    pub fn begin<A: Aggregate>(&self, id: Uuid) -> Result<Transaction<'_, A>> {
        let row_lock = self.row_locks.acquire(A::key_for(id));

        let tables = self.tables.read();
        let table = A::table(&tables);
        let parent = table
            .parents
            .get(&id)
            .cloned()
            .ok_or_else(|| ScheduleError::not_found(A::KIND, id))?;
        let entries = table.entries.get(&id).cloned().unwrap_or_default();
        drop(tables);

        Ok(Transaction {
            ledger: self,
            _row_lock: row_lock,
            parent,
            entries,
            events: EventStore::new(),
        })
    }

    /// begin a transaction that inserts a new parent
    pub fn begin_insert<A: Aggregate>(&self, parent: A) -> Result<Transaction<'_, A>> {
        let id = parent.id();
        let row_lock = self.row_locks.acquire(A::key_for(id));

        if A::table(&self.tables.read()).parents.contains_key(&id) {
            return Err(ScheduleError::Conflict {
                message: format!("{} {} already exists", A::KIND, id),
            });
        }

        Ok(Transaction {
            ledger: self,
            _row_lock: row_lock,
            parent,
            entries: Vec::new(),
            events: EventStore::new(),
        })
    }

    /// parent owning a schedule entry, from committed state
    pub fn parent_of(&self, entry_id: EntryId) -> Option<ObligationKey> {
        self.tables.read().entry_parents.get(&entry_id).copied()
    }

    /// committed parent and schedule, without taking the row lock
    pub fn snapshot<A: Aggregate>(&self, id: Uuid) -> Result<(A, Vec<A::Entry>)> {
        let tables = self.tables.read();
        let table = A::table(&tables);
        let parent = table
            .parents
            .get(&id)
            .cloned()
            .ok_or_else(|| ScheduleError::not_found(A::KIND, id))?;
        let entries = table.entries.get(&id).cloned().unwrap_or_default();
        Ok((parent, entries))
    }

    /// every committed parent of a kind with its schedule
    pub fn list<A: Aggregate>(&self) -> Vec<(A, Vec<A::Entry>)> {
        let tables = self.tables.read();
        let table = A::table(&tables);
        table
            .parents
            .iter()
            .map(|(id, parent)| {
                let entries = table.entries.get(id).cloned().unwrap_or_default();
                (parent.clone(), entries)
            })
            .collect()
    }

    /// drain events journaled by committed transactions
    pub fn take_events(&self) -> Vec<Event> {
        self.journal.lock().take_events()
    }
}

/// staged changes to one parent and its schedule
pub struct Transaction<'a, A: Aggregate> {
    ledger: &'a Ledger,
    _row_lock: RowLock<'a>,
    parent: A,
    entries: Vec<A::Entry>,
    events: EventStore,
}

impl<'a, A: Aggregate> Transaction<'a, A> {
    pub fn parent(&self) -> &A {
        &self.parent
    }

    pub fn parent_mut(&mut self) -> &mut A {
        &mut self.parent
    }

    pub fn entries(&self) -> &[A::Entry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [A::Entry] {
        &mut self.entries
    }

    pub fn entry_mut(&mut self, entry_id: EntryId) -> Result<&mut A::Entry> {
        self.entries
            .iter_mut()
            .find(|e| e.id() == entry_id)
            .ok_or_else(|| ScheduleError::not_found(<A::Entry as ScheduleRow>::KIND, entry_id))
    }

    /// delete the whole schedule; returns how many rows were removed
    pub fn delete_all_entries(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    /// bulk insert, enforcing the per-parent unique key
    pub fn insert_entries(&mut self, rows: Vec<A::Entry>) -> Result<()> {
        let mut seen: HashSet<_> = self.entries.iter().map(|e| e.unique_key()).collect();
        for row in &rows {
            if !seen.insert(row.unique_key()) {
                return Err(ScheduleError::Conflict {
                    message: format!(
                        "{} {} already has a schedule entry keyed {}",
                        A::KIND,
                        self.parent.id(),
                        row.unique_key()
                    ),
                });
            }
        }
        self.entries.extend(rows);
        Ok(())
    }

    pub fn emit(&mut self, event: Event) {
        self.events.emit(event);
    }

    /// publish the staged parent and schedule, then release the row lock
    pub fn commit(mut self) {
        let id = self.parent.id();
        let key = A::key_for(id);
        let events = self.events.take_events();

        {
            let mut tables = self.ledger.tables.write();
            let table = A::table_mut(&mut tables);
            table.parents.insert(id, self.parent.clone());
            let previous = table
                .entries
                .insert(id, std::mem::take(&mut self.entries))
                .unwrap_or_default();
            let current: Vec<EntryId> = table
                .entries
                .get(&id)
                .map(|rows| rows.iter().map(|e| e.id()).collect())
                .unwrap_or_default();

            for entry in previous {
                tables.entry_parents.remove(&entry.id());
            }
            for entry_id in current {
                tables.entry_parents.insert(entry_id, key);
            }
        }

        debug!(parent = %id, events = events.len(), "transaction committed");
        self.ledger.journal.lock().extend(events);
    }
}
