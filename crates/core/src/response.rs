//! The `{ status, message, data?, rawError? }` envelope returned to callers.

use serde::{Deserialize, Serialize};

use crate::error::COMMIT_FAILED_CODE;
use crate::{LabelError, RenderMode};

/// Result of a label request in the shape the UI and CLI consume.
///
/// `message` is always a symbolic code. Diagnostic text travels in
/// `raw_error` and must not drive control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// `true` only when the batch was rendered and any counter write committed.
    pub status: bool,
    /// Symbolic message code.
    pub message: String,
    /// Filled ZPL. Present on success, and on a failed counter commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Diagnostic detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_error: Option<String>,
}

impl GenerateResponse {
    /// Successful render.
    pub fn success(mode: RenderMode, zpl: String) -> Self {
        Self {
            status: true,
            message: mode.success_code().to_string(),
            data: Some(zpl),
            raw_error: None,
        }
    }

    /// Failed request.
    ///
    /// A [`LabelError::CommitFailed`] keeps its rendered batch in `data` so
    /// the caller can see that rendering succeeded but the commit did not.
    pub fn failure(err: LabelError) -> Self {
        let message = err.code().to_string();
        let raw_error = Some(err.raw_detail());
        let data = match err {
            LabelError::CommitFailed { batch, .. } => Some(batch),
            _ => None,
        };
        Self {
            status: false,
            message,
            data,
            raw_error,
        }
    }

    /// Fold a service result into an envelope.
    pub fn from_result(mode: RenderMode, result: Result<String, LabelError>) -> Self {
        match result {
            Ok(zpl) => Self::success(mode, zpl),
            Err(err) => Self::failure(err),
        }
    }

    /// `true` when the batch exists but the counter did not advance.
    pub fn is_commit_failure(&self) -> bool {
        !self.status && self.message == COMMIT_FAILED_CODE
    }
}
