//! serializable read models folded from committed schedules
//!
//! Service periods are assessed against a caller-supplied `today`; late fees
//! and effective amounts exist only in these views.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::obligations::{Loan, LoanScheduleEntry, Service, ServiceScheduleEntry};
use crate::status::InstallmentCounts;
use crate::store::{PaymentDirectory, PaymentRecord};
use crate::types::{
    BillingFrequency, InstallmentStatus, LoanId, LoanStatus, PaymentId, PeriodStatus, ServiceId,
    ServiceStatus,
};

fn join_payment<P>(payments: &P, payment_id: Option<PaymentId>) -> Option<PaymentRecord>
where
    P: PaymentDirectory + ?Sized,
{
    payment_id.and_then(|id| payments.find_payment(id))
}

/// installment joined with its settling payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInstallmentView {
    #[serde(flatten)]
    pub entry: LoanScheduleEntry,
    pub payment: Option<PaymentRecord>,
}

impl LoanInstallmentView {
    pub fn new<P>(entry: LoanScheduleEntry, payments: &P) -> Self
    where
        P: PaymentDirectory + ?Sized,
    {
        let payment = join_payment(payments, entry.payment_id);
        Self { entry, payment }
    }

    pub fn outstanding(&self) -> Money {
        installment_outstanding(&self.entry)
    }
}

fn installment_outstanding(entry: &LoanScheduleEntry) -> Money {
    if entry.status == InstallmentStatus::Paid {
        return Money::ZERO;
    }
    (entry.expected_amount - entry.paid_amount.unwrap_or(Money::ZERO)).max(Money::ZERO)
}

/// billing period with its live late-fee assessment and settling payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePeriodView {
    #[serde(flatten)]
    pub entry: ServiceScheduleEntry,
    pub late_fee: Money,
    pub effective_amount: Money,
    pub overdue_days: u32,
    pub payment: Option<PaymentRecord>,
}

impl ServicePeriodView {
    pub fn new<P>(entry: ServiceScheduleEntry, service: &Service, payments: &P, today: NaiveDate) -> Self
    where
        P: PaymentDirectory + ?Sized,
    {
        let assessment = entry.assess(&service.late_fee, today);
        let payment = join_payment(payments, entry.payment_id);
        Self {
            entry,
            late_fee: assessment.late_fee,
            effective_amount: assessment.effective_amount,
            overdue_days: assessment.overdue_days,
            payment,
        }
    }

    pub fn outstanding(&self) -> Money {
        if self.entry.status.is_settled() {
            return Money::ZERO;
        }
        (self.effective_amount - self.entry.paid_amount.unwrap_or(Money::ZERO)).max(Money::ZERO)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanTotals {
    pub expected: Money,
    pub expected_principal: Money,
    pub expected_interest: Money,
    pub paid: Money,
    pub outstanding: Money,
}

/// loan with its full installment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanDetail {
    pub loan: Loan,
    pub installments: Vec<LoanInstallmentView>,
    pub totals: LoanTotals,
    pub counts: InstallmentCounts,
    pub next_due: Option<NaiveDate>,
}

impl LoanDetail {
    pub fn from_parts<P>(loan: Loan, entries: Vec<LoanScheduleEntry>, payments: &P) -> Self
    where
        P: PaymentDirectory + ?Sized,
    {
        let counts = InstallmentCounts::tally(&entries);
        let next_due = entries
            .iter()
            .filter(|e| e.status.is_open())
            .map(|e| e.due_date)
            .min();

        let installments: Vec<LoanInstallmentView> = entries
            .into_iter()
            .map(|entry| LoanInstallmentView::new(entry, payments))
            .collect();

        let totals = installments.iter().fold(LoanTotals::default(), |mut t, view| {
            t.expected += view.entry.expected_amount;
            t.expected_principal += view.entry.expected_principal;
            t.expected_interest += view.entry.expected_interest;
            t.paid += view.entry.paid_amount.unwrap_or(Money::ZERO);
            t.outstanding += view.outstanding();
            t
        });

        Self {
            loan,
            installments,
            totals,
            counts,
            next_due,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCounts {
    pub pending: u32,
    pub partial: u32,
    pub paid: u32,
    pub skipped: u32,
}

impl PeriodCounts {
    pub fn tally(entries: &[ServiceScheduleEntry]) -> Self {
        let mut counts = Self::default();
        for entry in entries {
            match entry.status {
                PeriodStatus::Pending => counts.pending += 1,
                PeriodStatus::Partial => counts.partial += 1,
                PeriodStatus::Paid => counts.paid += 1,
                PeriodStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceTotals {
    pub expected: Money,
    pub late_fees: Money,
    pub effective: Money,
    pub paid: Money,
    pub outstanding: Money,
}

/// service with its billing periods assessed as of one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDetail {
    pub service: Service,
    pub as_of: NaiveDate,
    pub periods: Vec<ServicePeriodView>,
    pub totals: ServiceTotals,
    pub counts: PeriodCounts,
    pub next_due: Option<NaiveDate>,
}

impl ServiceDetail {
    pub fn from_parts<P>(
        service: Service,
        entries: Vec<ServiceScheduleEntry>,
        payments: &P,
        today: NaiveDate,
    ) -> Self
    where
        P: PaymentDirectory + ?Sized,
    {
        let counts = PeriodCounts::tally(&entries);
        let next_due = next_service_due(&entries);

        let periods: Vec<ServicePeriodView> = entries
            .into_iter()
            .map(|entry| ServicePeriodView::new(entry, &service, payments, today))
            .collect();

        let totals = periods.iter().fold(ServiceTotals::default(), |mut t, view| {
            t.expected += view.entry.expected_amount;
            t.late_fees += view.late_fee;
            t.effective += view.effective_amount;
            t.paid += view.entry.paid_amount.unwrap_or(Money::ZERO);
            t.outstanding += view.outstanding();
            t
        });

        Self {
            service,
            as_of: today,
            periods,
            totals,
            counts,
            next_due,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// skipped periods need no payment, so they never come due
fn next_service_due(entries: &[ServiceScheduleEntry]) -> Option<NaiveDate> {
    entries
        .iter()
        .filter(|e| matches!(e.status, PeriodStatus::Pending | PeriodStatus::Partial))
        .map(|e| e.due_date)
        .min()
}

/// one row of the loan list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub id: LoanId,
    pub title: String,
    pub borrower_name: String,
    pub status: LoanStatus,
    pub principal: Money,
    pub installments: u32,
    pub paid_installments: u32,
    pub outstanding: Money,
    pub next_due: Option<NaiveDate>,
}

impl LoanSummary {
    pub fn from_parts(loan: &Loan, entries: &[LoanScheduleEntry]) -> Self {
        let counts = InstallmentCounts::tally(entries);
        Self {
            id: loan.id,
            title: loan.title.clone(),
            borrower_name: loan.borrower_name.clone(),
            status: loan.status,
            principal: loan.terms.principal,
            installments: entries.len() as u32,
            paid_installments: counts.paid,
            outstanding: entries.iter().map(installment_outstanding).sum(),
            next_due: entries
                .iter()
                .filter(|e| e.status.is_open())
                .map(|e| e.due_date)
                .min(),
        }
    }
}

/// one row of the service list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub id: ServiceId,
    pub name: String,
    pub status: ServiceStatus,
    pub frequency: BillingFrequency,
    pub amount: Money,
    pub open_periods: u32,
    pub accrued_late_fees: Money,
    pub outstanding: Money,
    pub next_due: Option<NaiveDate>,
}

impl ServiceSummary {
    pub fn from_parts(service: &Service, entries: &[ServiceScheduleEntry], today: NaiveDate) -> Self {
        let mut accrued_late_fees = Money::ZERO;
        let mut outstanding = Money::ZERO;
        for entry in entries.iter().filter(|e| !e.status.is_settled()) {
            let assessment = entry.assess(&service.late_fee, today);
            accrued_late_fees += assessment.late_fee;
            outstanding += (assessment.effective_amount - entry.paid_amount.unwrap_or(Money::ZERO))
                .max(Money::ZERO);
        }

        Self {
            id: service.id,
            name: service.name.clone(),
            status: service.status,
            frequency: service.terms.frequency,
            amount: service.terms.amount,
            open_periods: entries.iter().filter(|e| e.status.is_open()).count() as u32,
            accrued_late_fees,
            outstanding,
            next_due: next_service_due(entries),
        }
    }
}
