use super::super::storage::StorageError;
use super::super::traits::SessionError;
use shared::session::{CommandError, CommandErrorCode};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Map a storage failure to a wire error code
fn classify_storage_error(e: &StorageError) -> CommandErrorCode {
    match e {
        StorageError::Serialization(_) => return CommandErrorCode::InternalError,
        StorageError::SessionNotFound(_) => return CommandErrorCode::SessionNotFound,
        _ => {}
    }

    // redb errors are classified by message
    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return CommandErrorCode::StorageFull;
    }

    if err_str.contains("out of memory") || err_str.contains("cannot allocate") {
        return CommandErrorCode::OutOfMemory;
    }

    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return CommandErrorCode::StorageCorrupted;
    }

    // Database/Transaction/Table/Storage/Commit
    CommandErrorCode::SystemBusy
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                CommandError::new(code, e.to_string())
            }
            ManagerError::Session(e) => {
                if let SessionError::Storage(msg) = &e {
                    tracing::error!(error = %msg, "Storage error during command execution");
                }
                let error = CommandError::new(e.code(), e.to_string());
                match e.suggestion() {
                    Some(suggestion) => error.with_suggestion(suggestion),
                    None => error,
                }
            }
            ManagerError::Internal(msg) => CommandError::new(CommandErrorCode::InternalError, msg),
        }
    }
}

impl From<ManagerError> for shared::error::AppError {
    fn from(err: ManagerError) -> Self {
        CommandError::from(err).into()
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_conflict_carries_suggestion() {
        let err: CommandError = ManagerError::from(SessionError::TableOccupied {
            table_id: "T1".to_string(),
            session_id: "s-1".to_string(),
        })
        .into();
        assert_eq!(err.code, CommandErrorCode::TableOccupied);
        assert_eq!(err.suggestion.as_deref(), Some("merge the sessions instead"));
    }

    #[test]
    fn test_validation_error_has_no_suggestion() {
        let err: CommandError = ManagerError::from(SessionError::PaymentExceedsRemaining {
            amount: dec!(60),
            remaining: dec!(50),
        })
        .into();
        assert_eq!(err.code, CommandErrorCode::PaymentExceedsRemaining);
        assert!(err.suggestion.is_none());
    }

    #[test]
    fn test_storage_not_found_maps_to_session_not_found() {
        let err: CommandError =
            ManagerError::from(StorageError::SessionNotFound("s-9".to_string())).into();
        assert_eq!(err.code, CommandErrorCode::SessionNotFound);
    }
}
