use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};

pub type LoanId = Uuid;
pub type ServiceId = Uuid;
/// id of a loan installment or a service billing period
pub type EntryId = Uuid;
/// id of a movement owned by the transactions subsystem
pub type PaymentId = Uuid;
pub type CounterpartId = Uuid;
pub type AccountId = Uuid;

/// which aggregate root a schedule entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObligationKey {
    Loan(LoanId),
    Service(ServiceId),
}

/// repayment frequency for loans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanFrequency {
    Weekly,
    Biweekly,
    Monthly,
}

impl LoanFrequency {
    pub fn label(&self) -> &'static str {
        match self {
            LoanFrequency::Weekly => "WEEKLY",
            LoanFrequency::Biweekly => "BIWEEKLY",
            LoanFrequency::Monthly => "MONTHLY",
        }
    }
}

impl FromStr for LoanFrequency {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WEEKLY" => Ok(LoanFrequency::Weekly),
            "BIWEEKLY" => Ok(LoanFrequency::Biweekly),
            "MONTHLY" => Ok(LoanFrequency::Monthly),
            _ => Err(ScheduleError::UnsupportedFrequency { frequency: s.to_string() }),
        }
    }
}

impl fmt::Display for LoanFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// interest type declared on a loan
///
/// `Compound` is accepted and stored but schedules are always built with
/// simple interest on the original principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterestType {
    #[default]
    Simple,
    Compound,
}

/// aggregate loan status, derived from its installments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Completed,
    Defaulted,
}

/// loan installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallmentStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl InstallmentStatus {
    /// still owes money
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            InstallmentStatus::Pending | InstallmentStatus::Partial | InstallmentStatus::Overdue
        )
    }
}

/// billing frequency for services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingFrequency {
    Weekly,
    Biweekly,
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
    /// a single billing period
    Once,
}

/// length of one billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Weeks(u32),
    Months(u32),
}

impl BillingFrequency {
    pub fn unit(&self) -> PeriodUnit {
        match self {
            BillingFrequency::Weekly => PeriodUnit::Weeks(1),
            BillingFrequency::Biweekly => PeriodUnit::Weeks(2),
            BillingFrequency::Monthly => PeriodUnit::Months(1),
            BillingFrequency::Bimonthly => PeriodUnit::Months(2),
            BillingFrequency::Quarterly => PeriodUnit::Months(3),
            BillingFrequency::Semiannual => PeriodUnit::Months(6),
            BillingFrequency::Annual => PeriodUnit::Months(12),
            BillingFrequency::Once => PeriodUnit::Months(1),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BillingFrequency::Weekly => "WEEKLY",
            BillingFrequency::Biweekly => "BIWEEKLY",
            BillingFrequency::Monthly => "MONTHLY",
            BillingFrequency::Bimonthly => "BIMONTHLY",
            BillingFrequency::Quarterly => "QUARTERLY",
            BillingFrequency::Semiannual => "SEMIANNUAL",
            BillingFrequency::Annual => "ANNUAL",
            BillingFrequency::Once => "ONCE",
        }
    }
}

impl FromStr for BillingFrequency {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WEEKLY" => Ok(BillingFrequency::Weekly),
            "BIWEEKLY" => Ok(BillingFrequency::Biweekly),
            "MONTHLY" => Ok(BillingFrequency::Monthly),
            "BIMONTHLY" => Ok(BillingFrequency::Bimonthly),
            "QUARTERLY" => Ok(BillingFrequency::Quarterly),
            "SEMIANNUAL" => Ok(BillingFrequency::Semiannual),
            "ANNUAL" => Ok(BillingFrequency::Annual),
            "ONCE" => Ok(BillingFrequency::Once),
            _ => Err(ScheduleError::UnsupportedFrequency { frequency: s.to_string() }),
        }
    }
}

impl fmt::Display for BillingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RecurrenceType {
    #[default]
    Recurring,
    OneOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ServiceType {
    Utility,
    Lease,
    Subscription,
    Insurance,
    Tax,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Ownership {
    #[default]
    Company,
    Owner,
    Shared,
}

/// whether the organization pays or collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ObligationType {
    #[default]
    Payable,
    Receivable,
}

/// how the default amount is indexed over time
///
/// Stored for display only; schedules always bill the default amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AmountIndexation {
    #[default]
    Fixed,
    InflationUnit,
}

/// aggregate service status, derived from its periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStatus {
    Active,
    Inactive,
}

/// service billing period status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodStatus {
    Pending,
    Paid,
    Partial,
    Skipped,
}

impl PeriodStatus {
    /// counts as open for the parent's status
    pub fn is_open(&self) -> bool {
        matches!(self, PeriodStatus::Pending | PeriodStatus::Partial | PeriodStatus::Skipped)
    }

    /// no longer accrues late fees
    pub fn is_settled(&self) -> bool {
        matches!(self, PeriodStatus::Paid | PeriodStatus::Skipped)
    }
}

/// when a service's document is emitted; each mode carries only its own fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionTiming {
    /// emitted on the same day every period
    FixedDay { day: u8 },
    /// emitted somewhere between two days of the month
    DateRange { from_day: u8, to_day: u8 },
    /// emitted once, on an exact date
    SpecificDate { date: NaiveDate },
}

impl EmissionTiming {
    pub fn validate(&self) -> Result<()> {
        let check_day = |day: u8| {
            if (1..=31).contains(&day) {
                Ok(())
            } else {
                Err(ScheduleError::invalid_configuration(format!(
                    "emission day {} outside 1..=31",
                    day
                )))
            }
        };

        match self {
            EmissionTiming::FixedDay { day } => check_day(*day),
            EmissionTiming::DateRange { from_day, to_day } => {
                check_day(*from_day)?;
                check_day(*to_day)?;
                if from_day > to_day {
                    return Err(ScheduleError::invalid_configuration(format!(
                        "emission range starts on day {} after it ends on day {}",
                        from_day, to_day
                    )));
                }
                Ok(())
            }
            EmissionTiming::SpecificDate { .. } => Ok(()),
        }
    }
}

/// late-fee policy of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LateFeePolicy {
    #[default]
    None,
    /// flat surcharge once the grace period has passed
    Fixed { amount: Money, grace_days: u32 },
    /// percentage of the expected amount once the grace period has passed
    Percentage { rate: Rate, grace_days: u32 },
}

impl LateFeePolicy {
    pub fn grace_days(&self) -> u32 {
        match self {
            LateFeePolicy::None => 0,
            LateFeePolicy::Fixed { grace_days, .. } | LateFeePolicy::Percentage { grace_days, .. } => {
                *grace_days
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            LateFeePolicy::None => Ok(()),
            LateFeePolicy::Fixed { amount, .. } if amount.is_negative() => Err(
                ScheduleError::invalid_configuration(format!("negative late fee {}", amount)),
            ),
            LateFeePolicy::Percentage { rate, .. } if rate.is_negative() => Err(
                ScheduleError::invalid_configuration(format!("negative late fee rate {}", rate)),
            ),
            _ => Ok(()),
        }
    }
}
