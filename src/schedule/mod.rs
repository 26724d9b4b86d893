pub mod loan;
pub mod service;

/// upper bound on installments or periods materialized by one generation pass
pub const MAX_SCHEDULE_ENTRIES: u32 = 1_200;

pub use loan::{LoanScheduleGenerator, LoanTerms, LoanTermsOverride, ScheduledInstallment};
pub use service::{ScheduledPeriod, ServiceScheduleGenerator, ServiceTerms, ServiceTermsOverride};
