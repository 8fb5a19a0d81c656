//! Conversions from external infrastructure errors into domain errors.

use grnflow_domain::GrnFlowError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub GrnFlowError);

impl From<InfraError> for GrnFlowError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<GrnFlowError> for InfraError {
    fn from(value: GrnFlowError) -> Self {
        InfraError(value)
    }
}

trait IntoGrnFlowError {
    fn into_grnflow(self) -> GrnFlowError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → GrnFlowError */
/* -------------------------------------------------------------------------- */

impl IntoGrnFlowError for SqlError {
    fn into_grnflow(self) -> GrnFlowError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        GrnFlowError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        GrnFlowError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        GrnFlowError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        GrnFlowError::Database("foreign key constraint violation".into())
                    }
                    _ => GrnFlowError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => GrnFlowError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                GrnFlowError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                GrnFlowError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => GrnFlowError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => GrnFlowError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_grnflow())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → GrnFlowError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(GrnFlowError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → GrnFlowError */
/* -------------------------------------------------------------------------- */

impl IntoGrnFlowError for HttpError {
    fn into_grnflow(self) -> GrnFlowError {
        if self.is_timeout() {
            return GrnFlowError::Connectivity("HTTP request timed out".into());
        }

        if self.is_connect() {
            return GrnFlowError::Connectivity("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => GrnFlowError::Auth(message),
                _ => GrnFlowError::Erp { status: code, message },
            };
        }

        if self.is_decode() {
            return GrnFlowError::Internal(format!("malformed ERP response: {self}"));
        }

        GrnFlowError::Connectivity(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_grnflow())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
