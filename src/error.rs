use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// At least one of the two artifact retrievals failed. `None` marks the
    /// side that succeeded.
    #[error(
        "Could not fetch report (tabular: {}, structured: {})",
        .tabular.as_deref().unwrap_or("ok"),
        .structured.as_deref().unwrap_or("ok")
    )]
    FetchFailed {
        tabular: Option<String>,
        structured: Option<String>,
    },

    #[error("Invalid report field '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Report artifacts disagree on character: tabular has '{tabular}', structured has '{structured}'")]
    ReportMismatch { tabular: String, structured: String },

    #[error("Unknown specialization id {id}; the class/spec table needs updating")]
    UnknownSpecId { id: u32 },

    #[error("Reference table error: {0}")]
    ReferenceTable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl SimError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SimError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Same reason for both retrievals, used when the reference itself is unusable.
    pub fn fetch_failed_both(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        SimError::FetchFailed {
            tabular: Some(reason.clone()),
            structured: Some(reason),
        }
    }

    /// User-visible failure class: "could not fetch", "could not understand
    /// the report", "unrecognized specialization", or internal.
    pub fn category(&self) -> &'static str {
        match self {
            SimError::FetchFailed { .. } => "fetch_failed",
            SimError::Validation { .. } | SimError::ReportMismatch { .. } => "invalid_report",
            SimError::UnknownSpecId { .. } => "unknown_spec",
            SimError::ReferenceTable(_) | SimError::Storage(_) => "internal",
        }
    }
}

impl IntoResponse for SimError {
    fn into_response(self) -> Response {
        let status = match &self {
            SimError::FetchFailed { .. } => StatusCode::BAD_GATEWAY,
            SimError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SimError::ReportMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SimError::UnknownSpecId { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SimError::ReferenceTable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SimError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.category(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failed_message_names_each_side() {
        let err = SimError::FetchFailed {
            tabular: Some("HTTP 404 Not Found".to_string()),
            structured: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("tabular: HTTP 404 Not Found"));
        assert!(msg.contains("structured: ok"));
    }

    #[test]
    fn test_categories_are_distinct_for_user_facing_failures() {
        assert_eq!(SimError::fetch_failed_both("x").category(), "fetch_failed");
        assert_eq!(SimError::validation("date", "missing").category(), "invalid_report");
        assert_eq!(
            SimError::ReportMismatch {
                tabular: "a".into(),
                structured: "b".into()
            }
            .category(),
            "invalid_report"
        );
        assert_eq!(SimError::UnknownSpecId { id: 1 }.category(), "unknown_spec");
    }

    #[test]
    fn test_status_mapping() {
        let resp = SimError::fetch_failed_both("gone").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp = SimError::UnknownSpecId { id: 999_999 }.into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = SimError::Storage(anyhow::anyhow!("disk full")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
