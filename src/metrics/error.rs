use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetricsErrorCode {
    EnvironmentUnavailable,
    UnsupportedEntryType,
    Internal,
}

impl MetricsErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricsErrorCode::EnvironmentUnavailable => "metrics/environment-unavailable",
            MetricsErrorCode::UnsupportedEntryType => "metrics/unsupported-entry-type",
            MetricsErrorCode::Internal => "metrics/internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct MetricsError {
    pub code: MetricsErrorCode,
    message: String,
}

impl MetricsError {
    pub fn new(code: MetricsErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for MetricsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for MetricsError {}

pub type MetricsResult<T> = Result<T, MetricsError>;

pub fn environment_unavailable(message: impl Into<String>) -> MetricsError {
    MetricsError::new(MetricsErrorCode::EnvironmentUnavailable, message)
}

pub fn unsupported_entry_type(entry_type: &str) -> MetricsError {
    MetricsError::new(
        MetricsErrorCode::UnsupportedEntryType,
        format!("Entry type '{entry_type}' is not supported by this environment"),
    )
}

pub fn internal_error(message: impl Into<String>) -> MetricsError {
    MetricsError::new(MetricsErrorCode::Internal, message)
}
