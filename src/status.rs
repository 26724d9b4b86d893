//! derived aggregate status of loans and services
//!
//! Loans treat an overdue installment as a default. Services never do: an open
//! period only keeps the service active, however late it is.
use crate::obligations::{LoanScheduleEntry, ServiceScheduleEntry};
use crate::types::{InstallmentStatus, LoanStatus, ServiceStatus};

/// count of installments per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InstallmentCounts {
    pub pending: u32,
    pub partial: u32,
    pub paid: u32,
    pub overdue: u32,
}

impl InstallmentCounts {
    pub fn tally(entries: &[LoanScheduleEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut counts, entry| {
            match entry.status {
                InstallmentStatus::Pending => counts.pending += 1,
                InstallmentStatus::Partial => counts.partial += 1,
                InstallmentStatus::Paid => counts.paid += 1,
                InstallmentStatus::Overdue => counts.overdue += 1,
            }
            counts
        })
    }

    pub fn open(&self) -> u32 {
        self.pending + self.partial + self.overdue
    }
}

pub fn loan_status(entries: &[LoanScheduleEntry]) -> LoanStatus {
    let counts = InstallmentCounts::tally(entries);
    if counts.open() == 0 {
        LoanStatus::Completed
    } else if counts.overdue > 0 {
        LoanStatus::Defaulted
    } else {
        LoanStatus::Active
    }
}

pub fn service_status(entries: &[ServiceScheduleEntry]) -> ServiceStatus {
    if entries.iter().any(|entry| entry.status.is_open()) {
        ServiceStatus::Active
    } else {
        ServiceStatus::Inactive
    }
}
