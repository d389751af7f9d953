use crate::config::ConfigError;
use crate::dossiers::{AccessDenied, DossierError};
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Access(AccessDenied),
    Dossier(DossierError),
}

impl AppError {
    /// Process exit status: 2 for requests the user can correct, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Access(_) => 2,
            AppError::Dossier(err) => match err {
                DossierError::Validation(_)
                | DossierError::Document(_)
                | DossierError::Period(_)
                | DossierError::ConfirmationRequired { .. }
                | DossierError::ClientNotFound(_) => 2,
                DossierError::Blob(_) | DossierError::Report(_) => 1,
            },
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => 1,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Access(err) => write!(f, "access error: {}", err),
            AppError::Dossier(err) => write!(f, "dossier error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Access(err) => Some(err),
            AppError::Dossier(err) => Some(err),
        }
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

impl From<AccessDenied> for AppError {
    fn from(value: AccessDenied) -> Self {
        Self::Access(value)
    }
}

impl From<DossierError> for AppError {
    fn from(value: DossierError) -> Self {
        Self::Dossier(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dossiers::{ClientKey, ValidationError};

    #[test]
    fn user_errors_exit_with_status_two() {
        let validation = AppError::from(DossierError::Validation(ValidationError::EmptyLastName));
        assert_eq!(validation.exit_code(), 2);
        let missing = AppError::from(DossierError::ClientNotFound(ClientKey::new("A", "B")));
        assert_eq!(missing.exit_code(), 2);
        assert_eq!(AppError::from(AccessDenied).exit_code(), 2);
    }

    #[test]
    fn infrastructure_errors_exit_with_status_one() {
        let io = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.exit_code(), 1);
        assert!(io.to_string().starts_with("io error:"));
    }
}
