use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};
use crate::late_fee::{LateFeeAssessment, LateFeeCalculator};
use crate::schedule::{ScheduledPeriod, ServiceTerms};
use crate::types::{
    AccountId, AmountIndexation, BillingFrequency, CounterpartId, EmissionTiming, EntryId,
    LateFeePolicy, ObligationType, Ownership, PaymentId, PeriodStatus, RecurrenceType, ServiceId,
    ServiceStatus, ServiceType,
};

/// classification fields of a service; informational only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServiceClassification {
    pub service_type: ServiceType,
    pub ownership: Ownership,
    pub obligation_type: ObligationType,
}

/// a recurring or one-off obligation; aggregate root of its billing periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub detail: Option<String>,
    pub category: Option<String>,
    pub classification: ServiceClassification,
    pub terms: ServiceTerms,
    pub indexation: AmountIndexation,
    pub counterpart_id: Option<CounterpartId>,
    pub account_id: Option<AccountId>,
    pub emission: EmissionTiming,
    pub late_fee: LateFeePolicy,
    pub status: ServiceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    pub fn from_new(new_service: NewService, periods: u32, now: DateTime<Utc>) -> Self {
        let terms = ServiceTerms {
            amount: new_service.amount,
            frequency: new_service.frequency,
            recurrence: new_service.recurrence,
            periods,
            start_date: new_service.start_date,
            due_day: new_service.due_day,
        };

        Self {
            id: Uuid::new_v4(),
            name: new_service.name,
            detail: new_service.detail,
            category: new_service.category,
            classification: new_service.classification,
            terms,
            indexation: new_service.indexation,
            counterpart_id: new_service.counterpart_id,
            account_id: new_service.account_id,
            emission: new_service.emission,
            late_fee: new_service.late_fee,
            status: ServiceStatus::Active,
            notes: new_service.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// one billing period of a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceScheduleEntry {
    pub id: EntryId,
    pub service_id: ServiceId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    pub expected_amount: Money,
    pub status: PeriodStatus,
    pub payment_id: Option<PaymentId>,
    pub paid_amount: Option<Money>,
    pub paid_date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl ServiceScheduleEntry {
    pub fn from_scheduled(service_id: ServiceId, period: ScheduledPeriod) -> Self {
        Self {
            id: Uuid::new_v4(),
            service_id,
            period_start: period.period_start,
            period_end: period.period_end,
            due_date: period.due_date,
            expected_amount: period.expected_amount,
            status: PeriodStatus::Pending,
            payment_id: None,
            paid_amount: None,
            paid_date: None,
            note: None,
        }
    }

    /// late fee and effective amount as of `today`
    pub fn assess(&self, policy: &LateFeePolicy, today: NaiveDate) -> LateFeeAssessment {
        LateFeeCalculator::new(policy).assess(self.expected_amount, self.due_date, self.status, today)
    }

    /// link a settling payment against the live effective amount
    pub fn apply_payment(
        &mut self,
        payment_id: PaymentId,
        amount: Money,
        paid_date: NaiveDate,
        target: Money,
    ) {
        self.payment_id = Some(payment_id);
        self.paid_amount = Some(amount);
        self.paid_date = Some(paid_date);
        self.status = if amount >= target {
            PeriodStatus::Paid
        } else {
            PeriodStatus::Partial
        };
    }

    pub fn is_unlinked(&self) -> bool {
        self.payment_id.is_none() && self.status == PeriodStatus::Pending
    }

    pub fn unlink(&mut self) {
        self.payment_id = None;
        self.paid_amount = None;
        self.paid_date = None;
        self.status = PeriodStatus::Pending;
    }

    pub fn skip(&mut self, note: Option<String>) -> Result<()> {
        if self.payment_id.is_some() {
            return Err(ScheduleError::invalid_configuration(format!(
                "period starting {} already has a settling payment",
                self.period_start
            )));
        }
        self.status = PeriodStatus::Skipped;
        if note.is_some() {
            self.note = note;
        }
        Ok(())
    }
}

/// validated request to create a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    pub detail: Option<String>,
    pub category: Option<String>,
    pub classification: ServiceClassification,
    pub recurrence: RecurrenceType,
    pub frequency: BillingFrequency,
    pub amount: Money,
    pub indexation: AmountIndexation,
    pub counterpart_id: Option<CounterpartId>,
    pub account_id: Option<AccountId>,
    pub emission: EmissionTiming,
    pub due_day: Option<u8>,
    pub start_date: NaiveDate,
    /// periods per generation pass; the engine default applies when unset
    pub periods: Option<u32>,
    pub late_fee: LateFeePolicy,
    pub notes: Option<String>,
}

/// builder for service creation requests
#[derive(Debug, Default)]
pub struct ServiceBuilder {
    name: Option<String>,
    detail: Option<String>,
    category: Option<String>,
    classification: ServiceClassification,
    recurrence: RecurrenceType,
    frequency: Option<BillingFrequency>,
    amount: Option<Money>,
    indexation: AmountIndexation,
    counterpart_id: Option<CounterpartId>,
    account_id: Option<AccountId>,
    emission: Option<EmissionTiming>,
    due_day: Option<u8>,
    start_date: Option<NaiveDate>,
    periods: Option<u32>,
    late_fee: LateFeePolicy,
    notes: Option<String>,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn classification(mut self, classification: ServiceClassification) -> Self {
        self.classification = classification;
        self
    }

    pub fn recurrence(mut self, recurrence: RecurrenceType) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn frequency(mut self, frequency: BillingFrequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn indexation(mut self, indexation: AmountIndexation) -> Self {
        self.indexation = indexation;
        self
    }

    pub fn counterpart(mut self, counterpart_id: CounterpartId) -> Self {
        self.counterpart_id = Some(counterpart_id);
        self
    }

    pub fn account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn emission(mut self, emission: EmissionTiming) -> Self {
        self.emission = Some(emission);
        self
    }

    pub fn due_day(mut self, day: u8) -> Self {
        self.due_day = Some(day);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn periods(mut self, periods: u32) -> Self {
        self.periods = Some(periods);
        self
    }

    pub fn late_fee(mut self, policy: LateFeePolicy) -> Self {
        self.late_fee = policy;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn build(self) -> Result<NewService> {
        let missing =
            |field: &str| ScheduleError::invalid_configuration(format!("service {} is required", field));

        let start_date = self.start_date.ok_or_else(|| missing("start date"))?;
        // emission defaults to the start date's day of month
        let emission = self.emission.unwrap_or_else(|| EmissionTiming::FixedDay {
            day: start_date.day() as u8,
        });
        emission.validate()?;
        self.late_fee.validate()?;

        let new_service = NewService {
            name: self.name.ok_or_else(|| missing("name"))?,
            detail: self.detail,
            category: self.category,
            classification: self.classification,
            recurrence: self.recurrence,
            frequency: self.frequency.ok_or_else(|| missing("frequency"))?,
            amount: self.amount.ok_or_else(|| missing("amount"))?,
            indexation: self.indexation,
            counterpart_id: self.counterpart_id,
            account_id: self.account_id,
            emission,
            due_day: self.due_day,
            start_date,
            periods: self.periods,
            late_fee: self.late_fee,
            notes: self.notes,
        };

        // periods are checked once the engine default is known
        ServiceTerms {
            amount: new_service.amount,
            frequency: new_service.frequency,
            recurrence: new_service.recurrence,
            periods: new_service.periods.unwrap_or(1),
            start_date,
            due_day: new_service.due_day,
        }
        .validate()?;

        Ok(new_service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::errors::ErrorKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period() -> ServiceScheduleEntry {
        ServiceScheduleEntry::from_scheduled(
            Uuid::new_v4(),
            ScheduledPeriod {
                period_start: date(2024, 3, 1),
                period_end: date(2024, 3, 31),
                due_date: date(2024, 3, 1),
                expected_amount: Money::from_major(1_000),
            },
        )
    }

    #[test]
    fn test_builder_defaults_emission_to_start_day() {
        let new_service = ServiceBuilder::new()
            .name("office lease")
            .frequency(BillingFrequency::Monthly)
            .amount(Money::from_major(1_500))
            .start_date(date(2024, 2, 15))
            .build()
            .unwrap();

        assert_eq!(new_service.emission, EmissionTiming::FixedDay { day: 15 });
        assert_eq!(new_service.periods, None);
    }

    #[test]
    fn test_builder_rejects_inconsistent_configuration() {
        let base = || {
            ServiceBuilder::new()
                .name("power")
                .frequency(BillingFrequency::Monthly)
                .amount(Money::from_major(80))
                .start_date(date(2024, 1, 1))
        };

        let err = base()
            .emission(EmissionTiming::DateRange { from_day: 20, to_day: 5 })
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(base().due_day(32).build().is_err());
        assert!(base().periods(0).build().is_err());
        assert!(base()
            .late_fee(LateFeePolicy::Percentage {
                rate: Rate::from_decimal(rust_decimal_macros::dec!(-0.01)),
                grace_days: 0,
            })
            .build()
            .is_err());
        assert!(ServiceBuilder::new().name("x").build().is_err());
    }

    #[test]
    fn test_apply_against_effective_amount() {
        let mut p = period();
        p.apply_payment(Uuid::new_v4(), Money::from_major(1_000), date(2024, 3, 20), Money::from_major(1_050));
        assert_eq!(p.status, PeriodStatus::Partial);

        p.apply_payment(Uuid::new_v4(), Money::from_major(1_050), date(2024, 3, 21), Money::from_major(1_050));
        assert_eq!(p.status, PeriodStatus::Paid);
    }

    #[test]
    fn test_skip() {
        let mut p = period();
        p.skip(Some("waived by landlord".to_string())).unwrap();
        assert_eq!(p.status, PeriodStatus::Skipped);
        assert_eq!(p.note.as_deref(), Some("waived by landlord"));

        let mut paid = period();
        paid.apply_payment(Uuid::new_v4(), Money::from_major(1_000), date(2024, 3, 2), Money::from_major(1_000));
        assert!(paid.skip(None).is_err());
    }

    #[test]
    fn test_unlink_resets() {
        let mut p = period();
        p.apply_payment(Uuid::new_v4(), Money::from_major(10), date(2024, 3, 2), Money::from_major(1_000));
        p.unlink();
        assert!(p.is_unlinked());
        assert_eq!(p.paid_date, None);
    }
}
