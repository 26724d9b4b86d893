//! Obligation engine: the entry point for every schedule operation
//!
//! Mutations lock the parent obligation, stage their changes in a ledger
//! transaction and commit once the parent status has been refreshed. Any error
//! drops the transaction, leaving the committed schedule untouched.
use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::{EntityKind, Result, ScheduleError};
use crate::events::Event;
use crate::obligations::{
    Loan, LoanScheduleEntry, NewLoan, NewService, Service, ServiceScheduleEntry,
};
use crate::schedule::{
    LoanScheduleGenerator, LoanTerms, LoanTermsOverride, ServiceScheduleGenerator, ServiceTerms,
    ServiceTermsOverride,
};
use crate::status;
use crate::store::{Ledger, PaymentBook, PaymentDirectory, Transaction};
use crate::types::{EntryId, LoanId, ObligationKey, PaymentId, ServiceId};
use crate::views::{
    LoanDetail, LoanInstallmentView, LoanSummary, ServiceDetail, ServicePeriodView, ServiceSummary,
};

pub struct ObligationEngine<P: PaymentDirectory = PaymentBook> {
    ledger: Ledger,
    payments: P,
    config: EngineConfig,
}

impl ObligationEngine<PaymentBook> {
    /// engine backed by an empty in-memory payment book
    pub fn in_memory(config: EngineConfig) -> Result<Self> {
        Self::new(config, PaymentBook::new())
    }
}

impl<P: PaymentDirectory> ObligationEngine<P> {
    pub fn new(config: EngineConfig, payments: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ledger: Ledger::new(),
            payments,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn payments(&self) -> &P {
        &self.payments
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// drain events from committed operations
    pub fn take_events(&self) -> Vec<Event> {
        self.ledger.take_events()
    }

    fn run<T>(&self, operation: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let result = f();
        if let Err(err) = &result {
            warn!(operation, kind = ?err.kind(), error = %err, "operation rolled back");
        }
        result
    }

    // loans

    /// insert a loan with its generated schedule
    pub fn create_loan(&self, new_loan: NewLoan, time: &SafeTimeProvider) -> Result<Loan> {
        self.run("create_loan", || {
            let now = time.now();
            let loan = Loan::from_new(new_loan, now);
            let rows = loan_rows(loan.id, &loan.terms)?;
            let installments = rows.len() as u32;
            let total_amount: Money = rows.iter().map(|e| e.expected_amount).sum();

            let mut tx = self.ledger.begin_insert(loan)?;
            tx.insert_entries(rows)?;
            refresh_loan(&mut tx, now);
            tx.emit(Event::LoanScheduleGenerated {
                loan_id: tx.parent().id,
                installments,
                total_amount,
                regenerated: false,
                timestamp: now,
            });

            let loan = tx.parent().clone();
            tx.commit();

            info!(
                loan_id = %loan.id,
                principal = %loan.terms.principal,
                installments,
                frequency = %loan.terms.frequency,
                "loan created"
            );
            Ok(loan)
        })
    }

    /// replace a loan's schedule with one generated from (possibly overridden) terms
    pub fn regenerate_loan_schedule(
        &self,
        loan_id: LoanId,
        overrides: &LoanTermsOverride,
        time: &SafeTimeProvider,
    ) -> Result<Vec<LoanScheduleEntry>> {
        self.run("regenerate_loan_schedule", || {
            let now = time.now();
            let mut tx = self.ledger.begin::<Loan>(loan_id)?;

            let terms = tx.parent().terms.with_overrides(overrides);
            let removed = tx.delete_all_entries();
            let rows = loan_rows(loan_id, &terms)?;
            let installments = rows.len() as u32;
            let total_amount: Money = rows.iter().map(|e| e.expected_amount).sum();
            tx.insert_entries(rows)?;

            let loan = tx.parent_mut();
            loan.terms = terms;
            loan.updated_at = now;
            refresh_loan(&mut tx, now);
            tx.emit(Event::LoanScheduleGenerated {
                loan_id,
                installments,
                total_amount,
                regenerated: true,
                timestamp: now,
            });

            let entries = tx.entries().to_vec();
            tx.commit();

            info!(%loan_id, removed, installments, "loan schedule regenerated");
            Ok(entries)
        })
    }

    pub fn apply_loan_payment(
        &self,
        entry_id: EntryId,
        payment_id: PaymentId,
        amount: Money,
        paid_date: NaiveDate,
        time: &SafeTimeProvider,
    ) -> Result<LoanInstallmentView> {
        self.run("apply_loan_payment", || {
            ensure_positive(amount)?;
            let loan_id = self.loan_of(entry_id)?;
            let payment = self
                .payments
                .find_payment(payment_id)
                .ok_or_else(|| ScheduleError::not_found(EntityKind::Payment, payment_id))?;

            let now = time.now();
            let mut tx = self.ledger.begin::<Loan>(loan_id)?;
            let entry = tx.entry_mut(entry_id)?;
            entry.apply_payment(payment_id, amount, paid_date);
            let entry = entry.clone();

            tx.emit(Event::LoanPaymentApplied {
                loan_id,
                entry_id,
                payment_id,
                amount,
                paid_date,
            });
            refresh_loan(&mut tx, now);
            tx.commit();

            info!(
                %loan_id,
                %entry_id,
                %payment_id,
                %amount,
                status = ?entry.status,
                "loan payment applied"
            );
            Ok(LoanInstallmentView {
                entry,
                payment: Some(payment),
            })
        })
    }

    /// detach the settling payment from an installment
    pub fn unlink_loan_payment(
        &self,
        entry_id: EntryId,
        time: &SafeTimeProvider,
    ) -> Result<LoanInstallmentView> {
        self.run("unlink_loan_payment", || {
            let loan_id = self.loan_of(entry_id)?;
            let now = time.now();
            let mut tx = self.ledger.begin::<Loan>(loan_id)?;

            let entry = tx.entry_mut(entry_id)?;
            if entry.is_unlinked() {
                debug!(%entry_id, "installment already unlinked");
                return Ok(LoanInstallmentView {
                    entry: entry.clone(),
                    payment: None,
                });
            }

            let payment_id = entry.payment_id;
            entry.unlink();
            let entry = entry.clone();

            tx.emit(Event::PaymentUnlinked {
                entry_id,
                payment_id,
                timestamp: now,
            });
            refresh_loan(&mut tx, now);
            tx.commit();

            info!(%loan_id, %entry_id, "loan payment unlinked");
            Ok(LoanInstallmentView {
                entry,
                payment: None,
            })
        })
    }

    /// loan with installments, totals and counts
    ///
    /// Pending installments past their due date are promoted to overdue first
    /// when `promote_overdue_on_read` is set.
    pub fn loan_detail(&self, loan_id: LoanId, time: &SafeTimeProvider) -> Result<LoanDetail> {
        self.run("loan_detail", || {
            let (loan, entries) = if self.config.promote_overdue_on_read {
                self.promote_overdue(loan_id, time)?
            } else {
                self.ledger.snapshot::<Loan>(loan_id)?
            };
            Ok(LoanDetail::from_parts(loan, entries, &self.payments))
        })
    }

    fn promote_overdue(
        &self,
        loan_id: LoanId,
        time: &SafeTimeProvider,
    ) -> Result<(Loan, Vec<LoanScheduleEntry>)> {
        let now = time.now();
        let today = now.date_naive();
        let mut tx = self.ledger.begin::<Loan>(loan_id)?;

        let mut promoted = Vec::new();
        for entry in tx.entries_mut() {
            if entry.promote_if_overdue(today) {
                promoted.push((entry.id, entry.due_date));
            }
        }

        if promoted.is_empty() {
            return Ok((tx.parent().clone(), tx.entries().to_vec()));
        }

        for (entry_id, due_date) in &promoted {
            tx.emit(Event::InstallmentOverdue {
                loan_id,
                entry_id: *entry_id,
                due_date: *due_date,
            });
        }
        refresh_loan(&mut tx, now);

        let snapshot = (tx.parent().clone(), tx.entries().to_vec());
        tx.commit();
        info!(%loan_id, promoted = promoted.len(), "installments promoted to overdue");
        Ok(snapshot)
    }

    pub fn loan_schedule(&self, loan_id: LoanId) -> Result<Vec<LoanScheduleEntry>> {
        let (_, mut entries) = self.ledger.snapshot::<Loan>(loan_id)?;
        entries.sort_by_key(|e| e.installment_number);
        Ok(entries)
    }

    /// all loans, oldest first; reads committed state without locking
    pub fn loan_summaries(&self) -> Vec<LoanSummary> {
        let mut loans = self.ledger.list::<Loan>();
        loans.sort_by(|(a, _), (b, _)| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        loans
            .iter()
            .map(|(loan, entries)| LoanSummary::from_parts(loan, entries))
            .collect()
    }

    fn loan_of(&self, entry_id: EntryId) -> Result<LoanId> {
        match self.ledger.parent_of(entry_id) {
            Some(ObligationKey::Loan(id)) => Ok(id),
            _ => Err(ScheduleError::not_found(EntityKind::LoanScheduleEntry, entry_id)),
        }
    }

    // services

    /// insert a service with its first generation pass of billing periods
    pub fn create_service(&self, new_service: NewService, time: &SafeTimeProvider) -> Result<Service> {
        self.run("create_service", || {
            let now = time.now();
            let periods = new_service
                .periods
                .unwrap_or(self.config.default_service_periods);
            let service = Service::from_new(new_service, periods, now);
            let rows = service_rows(service.id, &service.terms)?;
            let generated = rows.len() as u32;

            let mut tx = self.ledger.begin_insert(service)?;
            tx.insert_entries(rows)?;
            refresh_service(&mut tx, now);
            tx.emit(Event::ServiceScheduleGenerated {
                service_id: tx.parent().id,
                periods: generated,
                regenerated: false,
                timestamp: now,
            });

            let service = tx.parent().clone();
            tx.commit();

            info!(
                service_id = %service.id,
                frequency = %service.terms.frequency,
                amount = %service.terms.amount,
                periods = generated,
                "service created"
            );
            Ok(service)
        })
    }

    pub fn regenerate_service_schedule(
        &self,
        service_id: ServiceId,
        overrides: &ServiceTermsOverride,
        time: &SafeTimeProvider,
    ) -> Result<Vec<ServiceScheduleEntry>> {
        self.run("regenerate_service_schedule", || {
            let now = time.now();
            let mut tx = self.ledger.begin::<Service>(service_id)?;

            let terms = tx.parent().terms.with_overrides(overrides);
            let removed = tx.delete_all_entries();
            let rows = service_rows(service_id, &terms)?;
            let generated = rows.len() as u32;
            tx.insert_entries(rows)?;

            let service = tx.parent_mut();
            service.terms = terms;
            service.updated_at = now;
            refresh_service(&mut tx, now);
            tx.emit(Event::ServiceScheduleGenerated {
                service_id,
                periods: generated,
                regenerated: true,
                timestamp: now,
            });

            let entries = tx.entries().to_vec();
            tx.commit();

            info!(%service_id, removed, periods = generated, "service schedule regenerated");
            Ok(entries)
        })
    }

    /// settle a billing period; the target is its effective amount as of today
    pub fn apply_service_payment(
        &self,
        entry_id: EntryId,
        payment_id: PaymentId,
        amount: Money,
        paid_date: NaiveDate,
        time: &SafeTimeProvider,
    ) -> Result<ServicePeriodView> {
        self.run("apply_service_payment", || {
            ensure_positive(amount)?;
            let service_id = self.service_of(entry_id)?;
            if self.payments.find_payment(payment_id).is_none() {
                return Err(ScheduleError::not_found(EntityKind::Payment, payment_id));
            }

            let now = time.now();
            let today = now.date_naive();
            let mut tx = self.ledger.begin::<Service>(service_id)?;
            let policy = tx.parent().late_fee.clone();

            let entry = tx.entry_mut(entry_id)?;
            let assessment = entry.assess(&policy, today);
            entry.apply_payment(payment_id, amount, paid_date, assessment.effective_amount);
            let entry = entry.clone();

            tx.emit(Event::ServicePaymentApplied {
                service_id,
                entry_id,
                payment_id,
                amount,
                late_fee: assessment.late_fee,
                paid_date,
            });
            refresh_service(&mut tx, now);
            let view = ServicePeriodView::new(entry, tx.parent(), &self.payments, today);
            tx.commit();

            info!(
                %service_id,
                %entry_id,
                %payment_id,
                %amount,
                late_fee = %assessment.late_fee,
                status = ?view.entry.status,
                "service payment applied"
            );
            Ok(view)
        })
    }

    pub fn unlink_service_payment(
        &self,
        entry_id: EntryId,
        time: &SafeTimeProvider,
    ) -> Result<ServicePeriodView> {
        self.run("unlink_service_payment", || {
            let service_id = self.service_of(entry_id)?;
            let now = time.now();
            let today = now.date_naive();
            let mut tx = self.ledger.begin::<Service>(service_id)?;

            let entry = tx.entry_mut(entry_id)?;
            if entry.is_unlinked() {
                debug!(%entry_id, "period already unlinked");
                let entry = entry.clone();
                return Ok(ServicePeriodView::new(entry, tx.parent(), &self.payments, today));
            }

            let payment_id = entry.payment_id;
            entry.unlink();
            let entry = entry.clone();

            tx.emit(Event::PaymentUnlinked {
                entry_id,
                payment_id,
                timestamp: now,
            });
            refresh_service(&mut tx, now);
            let view = ServicePeriodView::new(entry, tx.parent(), &self.payments, today);
            tx.commit();

            info!(%service_id, %entry_id, "service payment unlinked");
            Ok(view)
        })
    }

    /// mark an unpaid billing period as skipped
    pub fn skip_service_period(
        &self,
        entry_id: EntryId,
        note: Option<String>,
        time: &SafeTimeProvider,
    ) -> Result<ServicePeriodView> {
        self.run("skip_service_period", || {
            let service_id = self.service_of(entry_id)?;
            let now = time.now();
            let mut tx = self.ledger.begin::<Service>(service_id)?;

            let entry = tx.entry_mut(entry_id)?;
            entry.skip(note)?;
            let entry = entry.clone();

            tx.emit(Event::PeriodSkipped {
                service_id,
                entry_id,
                timestamp: now,
            });
            refresh_service(&mut tx, now);
            let view = ServicePeriodView::new(entry, tx.parent(), &self.payments, now.date_naive());
            tx.commit();

            info!(%service_id, %entry_id, "service period skipped");
            Ok(view)
        })
    }

    /// service with every period assessed for late fees as of today
    pub fn service_detail(&self, service_id: ServiceId, time: &SafeTimeProvider) -> Result<ServiceDetail> {
        let (service, entries) = self.ledger.snapshot::<Service>(service_id)?;
        Ok(ServiceDetail::from_parts(
            service,
            entries,
            &self.payments,
            time.now().date_naive(),
        ))
    }

    pub fn service_schedule(&self, service_id: ServiceId) -> Result<Vec<ServiceScheduleEntry>> {
        let (_, mut entries) = self.ledger.snapshot::<Service>(service_id)?;
        entries.sort_by_key(|e| e.period_start);
        Ok(entries)
    }

    pub fn service_summaries(&self, time: &SafeTimeProvider) -> Vec<ServiceSummary> {
        let today = time.now().date_naive();
        let mut services = self.ledger.list::<Service>();
        services.sort_by(|(a, _), (b, _)| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        services
            .iter()
            .map(|(service, entries)| ServiceSummary::from_parts(service, entries, today))
            .collect()
    }

    fn service_of(&self, entry_id: EntryId) -> Result<ServiceId> {
        match self.ledger.parent_of(entry_id) {
            Some(ObligationKey::Service(id)) => Ok(id),
            _ => Err(ScheduleError::not_found(EntityKind::ServiceScheduleEntry, entry_id)),
        }
    }
}

fn ensure_positive(amount: Money) -> Result<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(ScheduleError::InvalidPaymentAmount { amount })
    }
}

fn loan_rows(loan_id: LoanId, terms: &LoanTerms) -> Result<Vec<LoanScheduleEntry>> {
    Ok(LoanScheduleGenerator::generate(terms)?
        .into_iter()
        .map(|installment| LoanScheduleEntry::from_scheduled(loan_id, installment))
        .collect())
}

fn service_rows(service_id: ServiceId, terms: &ServiceTerms) -> Result<Vec<ServiceScheduleEntry>> {
    Ok(ServiceScheduleGenerator::generate(terms)?
        .into_iter()
        .map(|period| ServiceScheduleEntry::from_scheduled(service_id, period))
        .collect())
}

fn refresh_loan(tx: &mut Transaction<'_, Loan>, now: DateTime<Utc>) {
    let new_status = status::loan_status(tx.entries());
    let old_status = tx.parent().status;
    if new_status == old_status {
        return;
    }

    let loan = tx.parent_mut();
    loan.status = new_status;
    loan.updated_at = now;
    let loan_id = loan.id;

    tx.emit(Event::LoanStatusChanged {
        loan_id,
        old_status,
        new_status,
        timestamp: now,
    });
    info!(%loan_id, ?old_status, ?new_status, "loan status changed");
}

fn refresh_service(tx: &mut Transaction<'_, Service>, now: DateTime<Utc>) {
    let new_status = status::service_status(tx.entries());
    let old_status = tx.parent().status;
    if new_status == old_status {
        return;
    }

    let service = tx.parent_mut();
    service.status = new_status;
    service.updated_at = now;
    let service_id = service.id;

    tx.emit(Event::ServiceStatusChanged {
        service_id,
        old_status,
        new_status,
        timestamp: now,
    });
    info!(%service_id, ?old_status, ?new_status, "service status changed");
}
