use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar;
use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};
use crate::types::{BillingFrequency, PeriodUnit, RecurrenceType};

use super::MAX_SCHEDULE_ENTRIES;

/// terms a service billing schedule is generated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTerms {
    pub amount: Money,
    pub frequency: BillingFrequency,
    pub recurrence: RecurrenceType,
    pub periods: u32,
    pub start_date: NaiveDate,
    pub due_day: Option<u8>,
}

/// replacement terms applied on regeneration; `None` keeps the current value
///
/// `due_day` is doubly optional: `Some(None)` clears a configured due day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceTermsOverride {
    pub amount: Option<Money>,
    pub frequency: Option<BillingFrequency>,
    pub periods: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub due_day: Option<Option<u8>>,
}

impl ServiceTerms {
    pub fn with_overrides(&self, overrides: &ServiceTermsOverride) -> ServiceTerms {
        ServiceTerms {
            amount: overrides.amount.unwrap_or(self.amount),
            frequency: overrides.frequency.unwrap_or(self.frequency),
            recurrence: self.recurrence,
            periods: overrides.periods.unwrap_or(self.periods),
            start_date: overrides.start_date.unwrap_or(self.start_date),
            due_day: overrides.due_day.unwrap_or(self.due_day),
        }
    }

    pub fn is_one_off(&self) -> bool {
        self.recurrence == RecurrenceType::OneOff || self.frequency == BillingFrequency::Once
    }

    /// periods actually materialized by one generation pass
    pub fn effective_periods(&self) -> u32 {
        if self.is_one_off() {
            1
        } else {
            self.periods
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.effective_periods() == 0 {
            return Err(ScheduleError::invalid_schedule("period count must be greater than zero"));
        }
        if self.effective_periods() > MAX_SCHEDULE_ENTRIES {
            return Err(ScheduleError::invalid_schedule(format!(
                "period count {} exceeds the maximum of {}",
                self.periods, MAX_SCHEDULE_ENTRIES
            )));
        }
        if self.amount.is_negative() {
            return Err(ScheduleError::invalid_schedule(format!(
                "service amount must not be negative, got {}",
                self.amount
            )));
        }
        if let Some(day) = self.due_day {
            if !(1..=31).contains(&day) {
                return Err(ScheduleError::invalid_configuration(format!(
                    "due day {} outside 1..=31",
                    day
                )));
            }
        }
        Ok(())
    }
}

/// one generated billing period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPeriod {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    pub expected_amount: Money,
}

/// service schedule generator
///
/// Periods are contiguous: each starts the day after the previous one ends.
pub struct ServiceScheduleGenerator;

impl ServiceScheduleGenerator {
    pub fn generate(terms: &ServiceTerms) -> Result<Vec<ScheduledPeriod>> {
        terms.validate()?;

        let unit = terms.frequency.unit();
        let count = terms.effective_periods();
        let expected_amount = terms.amount;

        let mut periods = Vec::with_capacity(count as usize);
        let mut cursor = terms.start_date;

        for _ in 0..count {
            let period_start = cursor;
            let period_end = calendar::add_days(calendar::advance(cursor, unit, 1)?, -1)?;

            let due_date = match (unit, terms.due_day) {
                (PeriodUnit::Months(_), Some(day)) => calendar::day_in_month_or_last(period_start, day),
                _ => period_end,
            };

            periods.push(ScheduledPeriod {
                period_start,
                period_end,
                due_date,
                expected_amount,
            });

            cursor = calendar::add_days(period_end, 1)?;
        }

        debug!(
            periods = count,
            frequency = %terms.frequency,
            amount = %expected_amount,
            "generated service schedule"
        );

        Ok(periods)
    }
}
