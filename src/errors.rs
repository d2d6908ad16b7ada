use core::fmt;
use std::io;

/// Failure to persist a log row or an alarm snapshot, from storage access
/// as well as from rendering the content.
#[derive(Debug)]
pub enum PersistError {
    NotMounted,
    CreateDirFailed(io::Error),
    OpenFailed(io::Error),
    WriteFailed(io::Error),
    SerializeFailed(serde_json::Error),
    TimestampFailed(time::error::Format),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotMounted => write!(f, "SD card not mounted"),
            Self::CreateDirFailed(e) => write!(f, "Failed to create directory: {}", e),
            Self::OpenFailed(e) => write!(f, "Failed to open file: {}", e),
            Self::WriteFailed(e) => write!(f, "Failed to write file: {}", e),
            Self::SerializeFailed(e) => write!(f, "Failed to serialize data: {}", e),
            Self::TimestampFailed(e) => write!(f, "Failed to format timestamp: {}", e),
        }
    }
}

impl std::error::Error for PersistError {}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializeFailed(e)
    }
}

impl From<time::error::Format> for PersistError {
    fn from(e: time::error::Format) -> Self {
        Self::TimestampFailed(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_failures_convert_into_persist_error() {
        let json = serde_json::from_str::<u8>("x").unwrap_err();

        let error = PersistError::from(json);

        assert!(matches!(error, PersistError::SerializeFailed(_)));
        assert!(error.to_string().starts_with("Failed to serialize data"));
    }

    #[test]
    fn missing_card_message() {
        assert_eq!(PersistError::NotMounted.to_string(), "SD card not mounted");
    }
}
