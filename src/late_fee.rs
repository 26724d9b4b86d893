use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::decimal::Money;
use crate::types::{LateFeePolicy, PeriodStatus};

/// late fee assessed on one billing period as of a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateFeeAssessment {
    pub overdue_days: u32,
    pub late_fee: Money,
    pub effective_amount: Money,
    /// overdue but still inside the grace period
    pub grace_applied: bool,
}

/// engine for computing late-fee surcharges on service periods
///
/// Nothing here is persisted; callers recompute on every read so the fee always
/// reflects the current date.
pub struct LateFeeCalculator<'a> {
    policy: &'a LateFeePolicy,
}

impl<'a> LateFeeCalculator<'a> {
    pub fn new(policy: &'a LateFeePolicy) -> Self {
        Self { policy }
    }

    pub fn assess(
        &self,
        expected_amount: Money,
        due_date: NaiveDate,
        status: PeriodStatus,
        today: NaiveDate,
    ) -> LateFeeAssessment {
        let overdue_days = calendar::days_between(due_date, today).max(0) as u32;

        let no_fee = |grace_applied| LateFeeAssessment {
            overdue_days,
            late_fee: Money::ZERO,
            effective_amount: expected_amount,
            grace_applied,
        };

        if status.is_settled() {
            return no_fee(false);
        }

        let late_fee = match self.policy {
            LateFeePolicy::None => return no_fee(false),
            _ if overdue_days <= self.policy.grace_days() => return no_fee(overdue_days > 0),
            LateFeePolicy::Fixed { amount, .. } => *amount,
            LateFeePolicy::Percentage { rate, .. } => expected_amount.percentage(*rate),
        };

        LateFeeAssessment {
            overdue_days,
            late_fee,
            effective_amount: expected_amount + late_fee,
            grace_applied: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn percentage_policy() -> LateFeePolicy {
        LateFeePolicy::Percentage {
            rate: Rate::from_percentage(5),
            grace_days: 3,
        }
    }

    #[test]
    fn test_percentage_fee_after_grace() {
        let policy = percentage_policy();
        let calculator = LateFeeCalculator::new(&policy);

        let today = date(2024, 3, 11);
        let result = calculator.assess(Money::from_major(1_000), date(2024, 3, 1), PeriodStatus::Pending, today);

        assert_eq!(result.overdue_days, 10);
        assert_eq!(result.late_fee, Money::from_major(50));
        assert_eq!(result.effective_amount, Money::from_major(1_050));
        assert!(!result.grace_applied);
    }

    #[test]
    fn test_grace_period() {
        let policy = percentage_policy();
        let calculator = LateFeeCalculator::new(&policy);
        let due = date(2024, 3, 1);

        let in_grace = calculator.assess(Money::from_major(1_000), due, PeriodStatus::Pending, date(2024, 3, 4));
        assert_eq!(in_grace.overdue_days, 3);
        assert_eq!(in_grace.late_fee, Money::ZERO);
        assert!(in_grace.grace_applied);

        let after = calculator.assess(Money::from_major(1_000), due, PeriodStatus::Pending, date(2024, 3, 5));
        assert_eq!(after.late_fee, Money::from_major(50));
    }

    #[test]
    fn test_fixed_fee() {
        let policy = LateFeePolicy::Fixed {
            amount: Money::from_major(25),
            grace_days: 0,
        };
        let calculator = LateFeeCalculator::new(&policy);

        let result = calculator.assess(Money::from_major(300), date(2024, 3, 1), PeriodStatus::Partial, date(2024, 3, 2));
        assert_eq!(result.late_fee, Money::from_major(25));
        assert_eq!(result.effective_amount, Money::from_major(325));
    }

    #[test]
    fn test_not_yet_due() {
        let policy = percentage_policy();
        let calculator = LateFeeCalculator::new(&policy);

        let result = calculator.assess(Money::from_major(1_000), date(2024, 3, 20), PeriodStatus::Pending, date(2024, 3, 1));
        assert_eq!(result.overdue_days, 0);
        assert_eq!(result.late_fee, Money::ZERO);
        assert!(!result.grace_applied);
    }

    #[test]
    fn test_settled_periods_carry_no_fee() {
        let policy = percentage_policy();
        let calculator = LateFeeCalculator::new(&policy);
        let due = date(2024, 1, 1);
        let today = date(2024, 6, 1);

        for status in [PeriodStatus::Paid, PeriodStatus::Skipped] {
            let result = calculator.assess(Money::from_major(1_000), due, status, today);
            assert_eq!(result.late_fee, Money::ZERO);
            assert_eq!(result.effective_amount, Money::from_major(1_000));
        }
    }

    #[test]
    fn test_no_policy() {
        let policy = LateFeePolicy::None;
        let calculator = LateFeeCalculator::new(&policy);
        let result = calculator.assess(Money::from_major(1_000), date(2024, 1, 1), PeriodStatus::Pending, date(2024, 6, 1));

        assert!(result.overdue_days > 0);
        assert_eq!(result.late_fee, Money::ZERO);
    }
}
