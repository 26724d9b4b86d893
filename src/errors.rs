use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;

/// record kinds that can fail to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Loan,
    LoanScheduleEntry,
    Service,
    ServiceScheduleEntry,
    Payment,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Loan => "loan",
            EntityKind::LoanScheduleEntry => "loan schedule entry",
            EntityKind::Service => "service",
            EntityKind::ServiceScheduleEntry => "service schedule entry",
            EntityKind::Payment => "payment",
        };
        f.write_str(name)
    }
}

/// stable classification handed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("invalid schedule: {message}")]
    InvalidSchedule {
        message: String,
    },

    #[error("unsupported frequency: {frequency}")]
    UnsupportedFrequency {
        frequency: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: EntityKind,
        id: Uuid,
    },

    #[error("conflict: {message}")]
    Conflict {
        message: String,
    },
}

impl ScheduleError {
    pub fn invalid_schedule(message: impl Into<String>) -> Self {
        ScheduleError::InvalidSchedule { message: message.into() }
    }

    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        ScheduleError::InvalidConfiguration { message: message.into() }
    }

    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        ScheduleError::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::InvalidSchedule { .. }
            | ScheduleError::UnsupportedFrequency { .. }
            | ScheduleError::InvalidConfiguration { .. }
            | ScheduleError::InvalidPaymentAmount { .. } => ErrorKind::Validation,
            ScheduleError::NotFound { .. } => ErrorKind::NotFound,
            ScheduleError::Conflict { .. } => ErrorKind::Conflict,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(ScheduleError::invalid_schedule("zero installments").kind(), ErrorKind::Validation);
        assert_eq!(
            ScheduleError::UnsupportedFrequency { frequency: "DAILY".into() }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(ScheduleError::not_found(EntityKind::Payment, Uuid::nil()).kind(), ErrorKind::NotFound);
        assert_eq!(ScheduleError::Conflict { message: "dup".into() }.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_messages() {
        let err = ScheduleError::not_found(EntityKind::ServiceScheduleEntry, Uuid::nil());
        assert_eq!(
            err.to_string(),
            "service schedule entry not found: 00000000-0000-0000-0000-000000000000"
        );
    }
}
