//! Error taxonomy shared by parsing, the model, ingestion and ranking.

use thiserror::Error;

/// Broad category of an [`Error`], used by callers that react per class
/// (the CLI exit path, API status codes, ingestion issue reports).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed coordinate, numeric or date text.
    Format,
    /// A building finalized without a required field.
    Validation,
    /// Data-integrity fault: duplicate reading or unidentified builder.
    State,
    /// Misconfigured measurement grid.
    Range,
    /// Ranking batch over the palette limit.
    Capacity,
    /// No reading recorded for a site at a grid point.
    Lookup,
    /// Invalid argument to a query helper.
    Argument,
    /// Underlying I/O failure.
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Validation => "validation",
            Self::State => "state",
            Self::Range => "range",
            Self::Capacity => "capacity",
            Self::Lookup => "lookup",
            Self::Argument => "argument",
            Self::Io => "io",
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("format error: {0}")]
    Format(String),

    #[error("validation error: {field} not initialized")]
    Validation { field: &'static str },

    #[error("site {site_id} already has a reading at {time}")]
    DuplicateReading { site_id: u32, time: i64 },

    #[error("builder has not been given an id yet")]
    Unidentified,

    #[error("invalid range: {0}")]
    Range(String),

    #[error("cannot rank {count} buildings, at most {max} are supported")]
    Capacity { count: usize, max: usize },

    #[error("site {site_id} has no reading at {time}")]
    MissingReading { site_id: u32, time: i64 },

    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_) => ErrorKind::Format,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::DuplicateReading { .. } | Self::Unidentified => ErrorKind::State,
            Self::Range(_) => ErrorKind::Range,
            Self::Capacity { .. } => ErrorKind::Capacity,
            Self::MissingReading { .. } => ErrorKind::Lookup,
            Self::Argument(_) => ErrorKind::Argument,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_and_unidentified_are_state_errors() {
        let dup = Error::DuplicateReading {
            site_id: 3,
            time: 900,
        };
        assert_eq!(dup.kind(), ErrorKind::State);
        assert_eq!(Error::Unidentified.kind(), ErrorKind::State);
    }

    #[test]
    fn validation_message_names_field() {
        let err = Error::Validation { field: "centroid" };
        assert_eq!(err.to_string(), "validation error: centroid not initialized");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
