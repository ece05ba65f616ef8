use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Optional input for one invocation, usually supplied by an external scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationEvent {
    #[serde(default)]
    pub source: Option<String>,
}

impl InvocationEvent {
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
        }
    }

    /// Correlation id for this invocation's log lines: the event source when
    /// present, otherwise `exec-<unix millis>`.
    pub fn execution_id(&self) -> String {
        match self.source.as_deref().map(str::trim) {
            Some(source) if !source.is_empty() => source.to_string(),
            _ => format!("exec-{}", Utc::now().timestamp_millis()),
        }
    }
}
