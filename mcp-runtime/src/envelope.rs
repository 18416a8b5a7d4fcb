use serde::Serialize;
use serde_json::{Value, json};

/// The single result of a tool call: one text block holding pretty-printed JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultEnvelope {
    pub content: Vec<TextContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// Failure details as they appear inside an envelope
#[derive(Debug, Clone, PartialEq)]
pub struct FailureInfo {
    pub error: Value,
    pub status: Option<u16>,
}

impl FailureInfo {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error: Value::String(message.into()),
            status: None,
        }
    }

    pub fn with_status(error: Value, status: u16) -> Self {
        Self {
            error,
            status: Some(status),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Failure(FailureInfo),
}

impl ResultEnvelope {
    pub fn from_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success(value) => Self::success(&value),
            Outcome::Failure(failure) => Self::failure(&failure),
        }
    }

    pub fn success(body: &Value) -> Self {
        Self::text(to_pretty_json(body))
    }

    pub fn failure(failure: &FailureInfo) -> Self {
        let mut payload = json!({ "error": failure.error });
        if let Some(status) = failure.status {
            payload["status"] = json!(status);
        }
        Self::text(to_pretty_json(&payload))
    }

    fn text(text: String) -> Self {
        Self {
            content: vec![TextContent { kind: "text", text }],
        }
    }

    /// Text of the first block, which is the only block this server emits.
    pub fn text_body(&self) -> &str {
        self.content
            .first()
            .map(|block| block.text.as_str())
            .unwrap_or_default()
    }

    pub fn to_value(&self) -> Value {
        json!({ "content": self.content })
    }
}

pub(crate) fn to_pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
