use crate::config::ConfigError;
use crate::tariff::{CalculationError, RuleLoadError, ScheduleError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Rules(RuleLoadError),
    Schedule(ScheduleError),
    Calculation(CalculationError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Calculation(CalculationError::NoApplicableRule(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Calculation(CalculationError::Validation { .. })
            | AppError::Calculation(CalculationError::UnsupportedCurrency(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Calculation(CalculationError::MissingConfiguration(_))
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Rules(_)
            | AppError::Schedule(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Rules(err) => write!(f, "rule table error: {}", err),
            AppError::Schedule(err) => write!(f, "tariff schedule error: {}", err),
            AppError::Calculation(err) => write!(f, "calculation failed: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Rules(err) => Some(err),
            AppError::Schedule(err) => Some(err),
            AppError::Calculation(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Calculation(CalculationError::NoApplicableRule(miss)) => {
                Json(json!({ "error": self.to_string(), "miss": miss }))
            }
            _ => Json(json!({ "error": self.to_string() })),
        };
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RuleLoadError> for AppError {
    fn from(value: RuleLoadError) -> Self {
        Self::Rules(value)
    }
}

impl From<ScheduleError> for AppError {
    fn from(value: ScheduleError) -> Self {
        Self::Schedule(value)
    }
}

impl From<CalculationError> for AppError {
    fn from(value: CalculationError) -> Self {
        Self::Calculation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculation_failures_map_to_client_statuses() {
        let validation: AppError =
            CalculationError::Validation {
                field: "customs value",
                reason: "must be positive".to_string(),
            }
            .into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let currency: AppError = CalculationError::UnsupportedCurrency("JPY".to_string()).into();
        assert_eq!(currency.status(), StatusCode::BAD_REQUEST);

        let missing: AppError =
            CalculationError::MissingConfiguration("excise table".to_string()).into();
        assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn infrastructure_failures_are_server_errors() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("disk gone"));
    }
}
