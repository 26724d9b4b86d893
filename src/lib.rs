pub mod calendar;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod late_fee;
pub mod logging;
pub mod obligations;
pub mod schedule;
pub mod status;
pub mod store;
pub mod types;
pub mod views;

// re-export key types
pub use config::{EngineConfig, LoggingConfig};
pub use decimal::{Money, Rate};
pub use engine::ObligationEngine;
pub use errors::{EntityKind, ErrorKind, Result, ScheduleError};
pub use events::{Event, EventStore};
pub use late_fee::{LateFeeAssessment, LateFeeCalculator};
pub use logging::{init_logging, LogFormat};
pub use obligations::{
    BorrowerType, Loan, LoanBuilder, LoanScheduleEntry, NewLoan, NewService, Service,
    ServiceBuilder, ServiceClassification, ServiceScheduleEntry,
};
pub use schedule::{
    LoanScheduleGenerator, LoanTerms, LoanTermsOverride, ScheduledInstallment, ScheduledPeriod,
    ServiceScheduleGenerator, ServiceTerms, ServiceTermsOverride,
};
pub use store::{Ledger, PaymentBook, PaymentDirectory, PaymentRecord};
pub use types::{
    AmountIndexation, BillingFrequency, EmissionTiming, EntryId, InstallmentStatus, InterestType,
    LateFeePolicy, LoanFrequency, LoanId, LoanStatus, ObligationKey, ObligationType, Ownership,
    PaymentId, PeriodStatus, RecurrenceType, ServiceId, ServiceStatus, ServiceType,
};
pub use views::{
    LoanDetail, LoanInstallmentView, LoanSummary, ServiceDetail, ServicePeriodView, ServiceSummary,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
