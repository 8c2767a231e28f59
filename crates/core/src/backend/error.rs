use serde::{Deserialize, Serialize};
use std::fmt;

pub const CONNECTIVITY_MESSAGE: &str =
    "No response from server. Please check your backend connection.";
pub const REQUEST_SETUP_MESSAGE: &str = "Error setting up the request. Please try again.";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Which of the three calls a result or failure belongs to, in fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStage {
    Forecast,
    Associations,
    Analysis,
}

impl FetchStage {
    pub const ALL: [FetchStage; 3] = [
        FetchStage::Forecast,
        FetchStage::Associations,
        FetchStage::Analysis,
    ];

    pub fn path(self) -> &'static str {
        match self {
            FetchStage::Forecast => "/forecast",
            FetchStage::Associations => "/stock_association",
            FetchStage::Analysis => "/comprehensive_analysis",
        }
    }
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchStage::Forecast => "forecast",
            FetchStage::Associations => "associations",
            FetchStage::Analysis => "analysis",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// A response arrived with a non-success status.
    Server { status: u16, detail: String },
    /// The request went out but nothing came back (refused, reset, timed out).
    Connectivity,
    /// The request could not be built.
    RequestSetup,
    /// Anything else, e.g. a success body that does not decode.
    Unexpected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchError {
    pub stage: FetchStage,
    #[serde(flatten)]
    pub kind: FetchErrorKind,
    /// Diagnostic text for logs; never shown to the user.
    #[serde(skip)]
    pub cause: Option<String>,
}

impl FetchError {
    pub fn new(stage: FetchStage, kind: FetchErrorKind) -> Self {
        Self {
            stage,
            kind,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn server(stage: FetchStage, status: u16, detail: impl Into<String>) -> Self {
        Self::new(
            stage,
            FetchErrorKind::Server {
                status,
                detail: detail.into(),
            },
        )
    }

    /// The message surfaced to the user.
    pub fn user_message(&self) -> String {
        match &self.kind {
            FetchErrorKind::Server { detail, .. } => format!("Server Error: {detail}"),
            FetchErrorKind::Connectivity => CONNECTIVITY_MESSAGE.to_string(),
            FetchErrorKind::RequestSetup => REQUEST_SETUP_MESSAGE.to_string(),
            FetchErrorKind::Unexpected => UNEXPECTED_MESSAGE.to_string(),
        }
    }

    /// Maps a transport-level `reqwest` failure. Status errors never reach here:
    /// callers read the body first and build a `Server` error themselves.
    pub fn from_reqwest(stage: FetchStage, err: &reqwest::Error) -> Self {
        let kind = if err.is_builder() {
            FetchErrorKind::RequestSetup
        } else if err.is_timeout() || err.is_connect() || err.is_request() {
            FetchErrorKind::Connectivity
        } else if err.is_decode() || err.is_body() {
            FetchErrorKind::Unexpected
        } else {
            FetchErrorKind::Connectivity
        };
        Self::new(stage, kind).with_cause(err)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} call failed: {}", self.stage, self.user_message())?;
        if let Some(cause) = &self.cause {
            write!(f, " ({cause})")?;
        }
        Ok(())
    }
}

impl std::error::Error for FetchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_follow_classification() {
        let e = FetchError::server(FetchStage::Forecast, 400, "Forecast horizon must be positive.");
        assert_eq!(e.user_message(), "Server Error: Forecast horizon must be positive.");

        let e = FetchError::new(FetchStage::Associations, FetchErrorKind::Connectivity);
        assert_eq!(
            e.user_message(),
            "No response from server. Please check your backend connection."
        );

        let e = FetchError::new(FetchStage::Analysis, FetchErrorKind::RequestSetup);
        assert_eq!(e.user_message(), "Error setting up the request. Please try again.");

        let e = FetchError::new(FetchStage::Analysis, FetchErrorKind::Unexpected);
        assert_eq!(e.user_message(), "An unexpected error occurred. Please try again.");
    }

    #[test]
    fn display_carries_stage_and_cause() {
        let e = FetchError::new(FetchStage::Associations, FetchErrorKind::Connectivity)
            .with_cause("connection refused");
        assert_eq!(
            e.to_string(),
            "associations call failed: No response from server. Please check your backend connection. (connection refused)"
        );
    }

    #[test]
    fn stages_order_by_fetch_sequence() {
        assert!(FetchStage::Forecast < FetchStage::Associations);
        assert!(FetchStage::Associations < FetchStage::Analysis);
        assert_eq!(FetchStage::Associations.path(), "/stock_association");
    }

    #[test]
    fn serializes_kind_inline() {
        let e = FetchError::server(FetchStage::Forecast, 500, "boom");
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"stage": "forecast", "kind": "server", "status": 500, "detail": "boom"})
        );
    }
}
