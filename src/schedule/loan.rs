use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar;
use crate::decimal::{round_money, Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::types::{LoanFrequency, PeriodUnit};

use super::MAX_SCHEDULE_ENTRIES;

/// terms a loan schedule is generated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub interest_rate: Rate,
    pub installments: u32,
    pub frequency: LoanFrequency,
    pub start_date: NaiveDate,
}

/// replacement terms applied on regeneration; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanTermsOverride {
    pub principal: Option<Money>,
    pub interest_rate: Option<Rate>,
    pub installments: Option<u32>,
    pub frequency: Option<LoanFrequency>,
    pub start_date: Option<NaiveDate>,
}

impl LoanTerms {
    pub fn with_overrides(&self, overrides: &LoanTermsOverride) -> LoanTerms {
        LoanTerms {
            principal: overrides.principal.unwrap_or(self.principal),
            interest_rate: overrides.interest_rate.unwrap_or(self.interest_rate),
            installments: overrides.installments.unwrap_or(self.installments),
            frequency: overrides.frequency.unwrap_or(self.frequency),
            start_date: overrides.start_date.unwrap_or(self.start_date),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.installments == 0 {
            return Err(ScheduleError::invalid_schedule("installment count must be greater than zero"));
        }
        if self.installments > MAX_SCHEDULE_ENTRIES {
            return Err(ScheduleError::invalid_schedule(format!(
                "installment count {} exceeds the maximum of {}",
                self.installments, MAX_SCHEDULE_ENTRIES
            )));
        }
        if !self.principal.is_positive() {
            return Err(ScheduleError::invalid_schedule(format!(
                "principal must be positive, got {}",
                self.principal
            )));
        }
        if self.interest_rate.is_negative() {
            return Err(ScheduleError::invalid_schedule(format!(
                "interest rate must not be negative, got {}",
                self.interest_rate
            )));
        }
        if self
            .principal
            .checked_percentage(self.interest_rate)
            .and_then(|interest| self.principal.checked_add(interest))
            .is_none()
        {
            return Err(ScheduleError::invalid_schedule(format!(
                "principal {} at {} overflows the money range",
                self.principal, self.interest_rate
            )));
        }
        Ok(())
    }

    /// simple interest on the original principal
    pub fn total_interest(&self) -> Money {
        self.principal.percentage(self.interest_rate)
    }
}

/// one generated installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub expected_amount: Money,
    pub expected_principal: Money,
    pub expected_interest: Money,
}

/// loan schedule generator
///
/// Splits principal and simple interest evenly across installments. Every
/// installment but the last gets the rounded even share; the last absorbs the
/// rounding remainder so each column sums exactly to its total.
pub struct LoanScheduleGenerator;

impl LoanScheduleGenerator {
    pub fn generate(terms: &LoanTerms) -> Result<Vec<ScheduledInstallment>> {
        terms.validate()?;

        let n = terms.installments;
        let interest_total = terms.total_interest();
        let total_amount = terms.principal + interest_total;

        let base_principal = terms.principal.as_decimal() / Decimal::from(n);
        let base_interest = interest_total.as_decimal() / Decimal::from(n);

        let mut installments = Vec::with_capacity(n as usize);
        let mut principal_accumulated = Money::ZERO;
        let mut interest_accumulated = Money::ZERO;
        let mut amount_accumulated = Money::ZERO;

        for i in 0..n {
            let is_last = i + 1 == n;

            let (principal_share, interest_share, amount_share) = if is_last {
                (
                    terms.principal - principal_accumulated,
                    interest_total - interest_accumulated,
                    total_amount - amount_accumulated,
                )
            } else {
                let principal_share = Money::from_decimal(base_principal);
                let interest_share = Money::from_decimal(base_interest);
                (
                    principal_share,
                    interest_share,
                    Money::from_decimal(round_money(
                        principal_share.as_decimal() + interest_share.as_decimal(),
                    )),
                )
            };

            principal_accumulated += principal_share;
            interest_accumulated += interest_share;
            amount_accumulated += amount_share;

            installments.push(ScheduledInstallment {
                installment_number: i + 1,
                due_date: due_date(terms.start_date, terms.frequency, i)?,
                expected_amount: amount_share,
                expected_principal: principal_share,
                expected_interest: interest_share,
            });
        }

        debug!(
            installments = n,
            principal = %terms.principal,
            interest_total = %interest_total,
            "generated loan schedule"
        );

        Ok(installments)
    }
}

/// due date of the 0-based installment `index`, always measured from the start date
fn due_date(start: NaiveDate, frequency: LoanFrequency, index: u32) -> Result<NaiveDate> {
    let unit = match frequency {
        LoanFrequency::Weekly => PeriodUnit::Weeks(1),
        LoanFrequency::Biweekly => PeriodUnit::Weeks(2),
        LoanFrequency::Monthly => PeriodUnit::Months(1),
    };
    calendar::advance(start, unit, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn terms(principal: Money, rate: Decimal, installments: u32, frequency: LoanFrequency) -> LoanTerms {
        LoanTerms {
            principal,
            interest_rate: Rate::from_percentage_decimal(rate),
            installments,
            frequency,
            start_date: date(2024, 1, 1),
        }
    }

    fn assert_exact_sums(terms: &LoanTerms, schedule: &[ScheduledInstallment]) {
        let principal: Money = schedule.iter().map(|i| i.expected_principal).sum();
        let interest: Money = schedule.iter().map(|i| i.expected_interest).sum();
        let amount: Money = schedule.iter().map(|i| i.expected_amount).sum();

        let interest_total = Money::from_decimal(
            terms.principal.as_decimal() * terms.interest_rate.as_percentage() / dec!(100),
        );
        assert_eq!(principal, terms.principal);
        assert_eq!(interest, interest_total);
        assert_eq!(amount, terms.principal + interest_total);
    }

    #[test]
    fn test_three_monthly_installments() {
        let terms = terms(Money::from_major(300_000), dec!(10), 3, LoanFrequency::Monthly);
        let schedule = LoanScheduleGenerator::generate(&terms).unwrap();

        assert_eq!(schedule.len(), 3);
        for installment in &schedule {
            assert_eq!(installment.expected_principal, Money::from_major(100_000));
            assert_eq!(installment.expected_interest, Money::from_major(10_000));
            assert_eq!(installment.expected_amount, Money::from_major(110_000));
        }

        let due: Vec<NaiveDate> = schedule.iter().map(|i| i.due_date).collect();
        assert_eq!(due, vec![date(2024, 1, 1), date(2024, 2, 1), date(2024, 3, 1)]);
        assert_eq!(schedule[2].installment_number, 3);
    }

    #[test]
    fn test_last_installment_absorbs_remainder() {
        let terms = terms(Money::from_major(100), dec!(0), 3, LoanFrequency::Monthly);
        let schedule = LoanScheduleGenerator::generate(&terms).unwrap();

        assert_eq!(schedule[0].expected_principal, Money::from_str_exact("33.33").unwrap());
        assert_eq!(schedule[1].expected_principal, Money::from_str_exact("33.33").unwrap());
        assert_eq!(schedule[2].expected_principal, Money::from_str_exact("33.34").unwrap());
        assert_exact_sums(&terms, &schedule);
    }

    #[test]
    fn test_exact_sums_across_odd_terms() {
        let cases = [
            (Money::from_str_exact("1000.01").unwrap(), dec!(7.3), 7),
            (Money::from_str_exact("99999.99").unwrap(), dec!(12.75), 36),
            (Money::from_major(1), dec!(33), 11),
            (Money::from_str_exact("5000").unwrap(), dec!(0), 1),
            (Money::from_str_exact("250000.55").unwrap(), dec!(3.333), 52),
        ];

        for (principal, rate, n) in cases {
            let terms = terms(principal, rate, n, LoanFrequency::Weekly);
            let schedule = LoanScheduleGenerator::generate(&terms).unwrap();
            assert_eq!(schedule.len(), n as usize);
            assert_exact_sums(&terms, &schedule);
        }
    }

    #[test]
    fn test_weekly_and_biweekly_due_dates() {
        let weekly = LoanScheduleGenerator::generate(&terms(
            Money::from_major(1_000),
            dec!(5),
            3,
            LoanFrequency::Weekly,
        ))
        .unwrap();
        assert_eq!(weekly[1].due_date, date(2024, 1, 8));
        assert_eq!(weekly[2].due_date, date(2024, 1, 15));

        let biweekly = LoanScheduleGenerator::generate(&terms(
            Money::from_major(1_000),
            dec!(5),
            3,
            LoanFrequency::Biweekly,
        ))
        .unwrap();
        assert_eq!(biweekly[1].due_date, date(2024, 1, 15));
        assert_eq!(biweekly[2].due_date, date(2024, 1, 29));
    }

    #[test]
    fn test_month_end_start_is_measured_from_start() {
        let mut t = terms(Money::from_major(1_200), dec!(0), 3, LoanFrequency::Monthly);
        t.start_date = date(2024, 1, 31);
        let schedule = LoanScheduleGenerator::generate(&t).unwrap();

        assert_eq!(schedule[1].due_date, date(2024, 2, 29));
        assert_eq!(schedule[2].due_date, date(2024, 3, 31));
    }

    #[test]
    fn test_zero_installments_rejected() {
        let t = terms(Money::from_major(1_000), dec!(5), 0, LoanFrequency::Monthly);
        let err = LoanScheduleGenerator::generate(&t).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidSchedule { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_installment_count_is_bounded() {
        let at_limit = terms(Money::from_major(1_000_000), dec!(5), MAX_SCHEDULE_ENTRIES, LoanFrequency::Weekly);
        assert_eq!(LoanScheduleGenerator::generate(&at_limit).unwrap().len(), MAX_SCHEDULE_ENTRIES as usize);

        for installments in [MAX_SCHEDULE_ENTRIES + 1, u32::MAX] {
            let t = terms(Money::from_major(1_000), dec!(5), installments, LoanFrequency::Monthly);
            let err = LoanScheduleGenerator::generate(&t).unwrap_err();
            assert!(matches!(err, ScheduleError::InvalidSchedule { .. }));
        }
    }

    #[test]
    fn test_overflowing_principal_rejected() {
        let principal = Money::from_str_exact("70000000000000000000000000000").unwrap();
        let t = terms(principal, dec!(20), 3, LoanFrequency::Monthly);
        let err = LoanScheduleGenerator::generate(&t).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_non_positive_principal_rejected() {
        let t = terms(Money::ZERO, dec!(5), 3, LoanFrequency::Monthly);
        assert!(LoanScheduleGenerator::generate(&t).is_err());
    }

    #[test]
    fn test_overrides() {
        let base = terms(Money::from_major(1_000), dec!(5), 3, LoanFrequency::Monthly);
        let updated = base.with_overrides(&LoanTermsOverride {
            installments: Some(6),
            interest_rate: Some(Rate::from_percentage(8)),
            ..Default::default()
        });

        assert_eq!(updated.installments, 6);
        assert_eq!(updated.interest_rate, Rate::from_percentage(8));
        assert_eq!(updated.principal, base.principal);
        assert_eq!(updated.start_date, base.start_date);
    }
}
