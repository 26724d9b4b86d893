use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::schedule::{LoanTerms, ScheduledInstallment};
use crate::types::{
    EntryId, InstallmentStatus, InterestType, LoanFrequency, LoanId, LoanStatus, PaymentId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BorrowerType {
    #[default]
    Individual,
    Company,
}

/// a fixed-term borrowing obligation; aggregate root of its installments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub title: String,
    pub borrower_name: String,
    pub borrower_type: BorrowerType,
    pub terms: LoanTerms,
    pub interest_type: InterestType,
    pub status: LoanStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn from_new(new_loan: NewLoan, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: new_loan.title,
            borrower_name: new_loan.borrower_name,
            borrower_type: new_loan.borrower_type,
            terms: new_loan.terms,
            interest_type: new_loan.interest_type,
            status: LoanStatus::Active,
            notes: new_loan.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// one installment of a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanScheduleEntry {
    pub id: EntryId,
    pub loan_id: LoanId,
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub expected_amount: Money,
    pub expected_principal: Money,
    pub expected_interest: Money,
    pub status: InstallmentStatus,
    pub payment_id: Option<PaymentId>,
    pub paid_amount: Option<Money>,
    pub paid_date: Option<NaiveDate>,
}

impl LoanScheduleEntry {
    pub fn from_scheduled(loan_id: LoanId, installment: ScheduledInstallment) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            installment_number: installment.installment_number,
            due_date: installment.due_date,
            expected_amount: installment.expected_amount,
            expected_principal: installment.expected_principal,
            expected_interest: installment.expected_interest,
            status: InstallmentStatus::Pending,
            payment_id: None,
            paid_amount: None,
            paid_date: None,
        }
    }

    /// link a settling payment; paid in full once it covers the expected amount
    pub fn apply_payment(&mut self, payment_id: PaymentId, amount: Money, paid_date: NaiveDate) {
        self.payment_id = Some(payment_id);
        self.paid_amount = Some(amount);
        self.paid_date = Some(paid_date);
        self.status = if amount >= self.expected_amount {
            InstallmentStatus::Paid
        } else {
            InstallmentStatus::Partial
        };
    }

    pub fn is_unlinked(&self) -> bool {
        self.payment_id.is_none() && self.status == InstallmentStatus::Pending
    }

    pub fn unlink(&mut self) {
        self.payment_id = None;
        self.paid_amount = None;
        self.paid_date = None;
        self.status = InstallmentStatus::Pending;
    }

    /// promote to overdue when still pending after its due date
    pub fn promote_if_overdue(&mut self, today: NaiveDate) -> bool {
        if self.status == InstallmentStatus::Pending && self.due_date < today {
            self.status = InstallmentStatus::Overdue;
            true
        } else {
            false
        }
    }
}

/// validated request to create a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLoan {
    pub title: String,
    pub borrower_name: String,
    pub borrower_type: BorrowerType,
    pub terms: LoanTerms,
    pub interest_type: InterestType,
    pub notes: Option<String>,
}

/// builder for loan creation requests
#[derive(Debug, Default)]
pub struct LoanBuilder {
    title: Option<String>,
    borrower_name: Option<String>,
    borrower_type: BorrowerType,
    principal: Option<Money>,
    rate: Option<Rate>,
    installments: Option<u32>,
    frequency: Option<LoanFrequency>,
    start_date: Option<NaiveDate>,
    interest_type: InterestType,
    notes: Option<String>,
}

impl LoanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn borrower(mut self, name: impl Into<String>, borrower_type: BorrowerType) -> Self {
        self.borrower_name = Some(name.into());
        self.borrower_type = borrower_type;
        self
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn installments(mut self, installments: u32) -> Self {
        self.installments = Some(installments);
        self
    }

    pub fn frequency(mut self, frequency: LoanFrequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn interest_type(mut self, interest_type: InterestType) -> Self {
        self.interest_type = interest_type;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn build(self) -> Result<NewLoan> {
        let missing = |field: &str| ScheduleError::invalid_configuration(format!("loan {} is required", field));

        let terms = LoanTerms {
            principal: self.principal.ok_or_else(|| missing("principal"))?,
            interest_rate: self.rate.unwrap_or(Rate::ZERO),
            installments: self.installments.ok_or_else(|| missing("installment count"))?,
            frequency: self.frequency.unwrap_or(LoanFrequency::Monthly),
            start_date: self.start_date.ok_or_else(|| missing("start date"))?,
        };
        terms.validate()?;

        Ok(NewLoan {
            title: self.title.ok_or_else(|| missing("title"))?,
            borrower_name: self.borrower_name.unwrap_or_default(),
            borrower_type: self.borrower_type,
            terms,
            interest_type: self.interest_type,
            notes: self.notes,
        })
    }
}
