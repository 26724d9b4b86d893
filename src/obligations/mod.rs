pub mod loan;
pub mod service;

pub use loan::{BorrowerType, Loan, LoanBuilder, LoanScheduleEntry, NewLoan};
pub use service::{
    NewService, Service, ServiceBuilder, ServiceClassification, ServiceScheduleEntry,
};
