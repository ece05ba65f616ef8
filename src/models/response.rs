use serde::{Deserialize, Serialize};

use super::CheckResult;

/// The single output of one invocation.
///
/// Serialized as a flat JSON object. Consumers discriminate on `ok`, then on
/// whether `message` or `error` is present:
///
/// - `{"ok":true,"notified":..,"exists":..,"text":..,"saysAddToCart":..,"locked":..}`
/// - `{"ok":false,"message":..}` when the server answered badly
/// - `{"ok":false,"error":..}` when the fetch could not complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireResponse", try_from = "WireResponse")]
pub enum HandlerResponse {
    Success { notified: bool, check: CheckResult },
    FetchFailure { message: String },
    RuntimeFailure { error: String },
}

impl HandlerResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, HandlerResponse::Success { .. })
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            HandlerResponse::Success { notified: true, .. } => "available_notified",
            HandlerResponse::Success { check, .. } if check.is_available() => "available_not_notified",
            HandlerResponse::Success { .. } => "unavailable",
            HandlerResponse::FetchFailure { .. } => "fetch_failure",
            HandlerResponse::RuntimeFailure { .. } => "runtime_failure",
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireResponse {
    Success(SuccessWire),
    FetchFailure(FetchFailureWire),
    RuntimeFailure(RuntimeFailureWire),
}

#[derive(Serialize, Deserialize)]
struct SuccessWire {
    ok: bool,
    notified: bool,
    #[serde(flatten)]
    check: CheckResult,
}

#[derive(Serialize, Deserialize)]
struct FetchFailureWire {
    ok: bool,
    message: String,
}

#[derive(Serialize, Deserialize)]
struct RuntimeFailureWire {
    ok: bool,
    error: String,
}

impl From<HandlerResponse> for WireResponse {
    fn from(response: HandlerResponse) -> Self {
        match response {
            HandlerResponse::Success { notified, check } => WireResponse::Success(SuccessWire {
                ok: true,
                notified,
                check,
            }),
            HandlerResponse::FetchFailure { message } => {
                WireResponse::FetchFailure(FetchFailureWire { ok: false, message })
            }
            HandlerResponse::RuntimeFailure { error } => {
                WireResponse::RuntimeFailure(RuntimeFailureWire { ok: false, error })
            }
        }
    }
}

impl TryFrom<WireResponse> for HandlerResponse {
    type Error = String;

    fn try_from(wire: WireResponse) -> Result<Self, Self::Error> {
        match wire {
            WireResponse::Success(s) if s.ok => Ok(HandlerResponse::Success {
                notified: s.notified,
                check: s.check,
            }),
            WireResponse::FetchFailure(f) if !f.ok => Ok(HandlerResponse::FetchFailure { message: f.message }),
            WireResponse::RuntimeFailure(r) if !r.ok => Ok(HandlerResponse::RuntimeFailure { error: r.error }),
            WireResponse::Success(_) => Err("check result must carry \"ok\": true".to_string()),
            WireResponse::FetchFailure(_) | WireResponse::RuntimeFailure(_) => {
                Err("failure response must carry \"ok\": false".to_string())
            }
        }
    }
}
