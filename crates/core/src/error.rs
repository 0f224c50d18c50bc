//! Typed error types for label generation and counter persistence.

/// Failures raised by a [`CounterStore`](crate::CounterStore) implementation.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No counter record exists for the part number.
    #[error("no counter record for part {0}")]
    PartNotFound(String),

    /// The storage backend failed (connection, transaction, or I/O).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored record could not be decoded.
    #[error("corrupt counter record for part {part}: {reason}")]
    Corrupt {
        /// The part whose record is unreadable.
        part: String,
        /// Decoder message.
        reason: String,
    },
}

impl StoreError {
    /// Returns `true` if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Backend(_))
    }
}

/// Every way a label generation request can fail.
///
/// Each variant maps to a symbolic message code via [`LabelError::code()`];
/// the `Display` text is diagnostic only and never used for control flow.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    // -- Templates --
    /// No template is registered under the format identifier.
    #[error("template not found: {format}")]
    TemplateNotFound {
        /// The requested format identifier.
        format: String,
    },

    /// The template is blank or has no placeholder tokens.
    #[error("template is empty: {format}")]
    TemplateEmpty {
        /// The requested format identifier.
        format: String,
    },

    // -- Parts and counters --
    /// The counter store has no record for the part.
    #[error("part not found: {part}")]
    PartNotFound {
        /// The part number that was looked up.
        part: String,
    },

    /// The parts catalog has no entry for the part.
    #[error("part not in catalog: {part}")]
    PartNotInCatalog {
        /// The part number that was looked up.
        part: String,
    },

    /// A serial string is not valid under its numbering scheme.
    #[error("invalid {scheme} serial: '{serial}'")]
    InvalidSerialFormat {
        /// The offending serial.
        serial: String,
        /// Name of the scheme it was decoded under.
        scheme: &'static str,
    },

    /// The stored numbering scheme name is not recognized.
    #[error("unsupported numbering scheme: {0}")]
    UnsupportedNumberingScheme(String),

    /// The requested batch would run past the part's `max_id`.
    #[error("serial range exceeded ({remaining} remaining)")]
    SerialRangeExceeded {
        /// Serials still available before exhaustion.
        remaining: u64,
    },

    /// Quantity must be at least one.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// The request named a mode other than print, preview or reprint.
    #[error("unknown mode: {0}")]
    UnknownMode(String),

    // -- Persistence --
    /// Reading from the counter store failed.
    #[error("counter store error: {0}")]
    Persistence(#[source] StoreError),

    /// The batch was rendered but the advanced counter could not be written.
    ///
    /// The batch is returned so the caller can decide what to do with it;
    /// printing it risks reusing these serials on the next print.
    #[error("batch rendered but counter commit failed for part {part}")]
    CommitFailed {
        /// The part whose counter was not advanced.
        part: String,
        /// The fully rendered batch.
        batch: String,
        /// The write failure.
        #[source]
        source: StoreError,
    },
}

/// Message code of [`LabelError::CommitFailed`].
pub(crate) const COMMIT_FAILED_CODE: &str = "backend.db.counter_commit_failed";

impl LabelError {
    /// Symbolic message code for UI localization.
    pub fn code(&self) -> &'static str {
        match self {
            LabelError::TemplateNotFound { .. } => "backend.print.template_not_found",
            LabelError::TemplateEmpty { .. } => "backend.print.template_empty",
            LabelError::PartNotFound { .. } => "backend.db.part_not_found",
            LabelError::PartNotInCatalog { .. } => "backend.parts.part_not_in_catalog",
            LabelError::InvalidSerialFormat { .. } => "backend.print.invalid_serial",
            LabelError::UnsupportedNumberingScheme(_) => "backend.print.unsupported_type",
            LabelError::SerialRangeExceeded { .. } => "backend.print.serial_range_exceeded",
            LabelError::InvalidQuantity(_) => "backend.print.invalid_quantity",
            LabelError::UnknownMode(_) => "backend.print.unknown_mode",
            LabelError::Persistence(_) => "backend.db.error",
            LabelError::CommitFailed { .. } => COMMIT_FAILED_CODE,
        }
    }

    /// Diagnostic detail for the `rawError` field of a response.
    pub fn raw_detail(&self) -> String {
        match self {
            LabelError::TemplateNotFound { format } | LabelError::TemplateEmpty { format } => {
                format.clone()
            }
            LabelError::PartNotFound { part } | LabelError::PartNotInCatalog { part } => {
                part.clone()
            }
            LabelError::SerialRangeExceeded { remaining } => format!("Remaining: {remaining}"),
            LabelError::CommitFailed { source, .. } => source.to_string(),
            LabelError::Persistence(source) => source.to_string(),
            other => other.to_string(),
        }
    }

    /// Returns `true` if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LabelError::Persistence(source) => source.is_retryable(),
            _ => false,
        }
    }
}

impl From<StoreError> for LabelError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PartNotFound(part) => LabelError::PartNotFound { part },
            other => LabelError::Persistence(other),
        }
    }
}
