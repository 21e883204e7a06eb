// src/message.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST {base}/query`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRequest {
    pub query: String,
    pub system_role: String,
    pub top_k: u32,
    pub model: String,
    pub include_recipes: bool,
}

/// Typed view over a query response. The client hands back the raw JSON;
/// this only picks out the fields the chat flow cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryReply {
    pub response: String,
    pub recipes: Option<Value>,
}

impl QueryReply {
    pub fn from_json(value: &Value) -> Self {
        let response = match value.get("response") {
            Some(Value::String(s)) => s.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => String::new(),
        };
        let recipes = value.get("recipes").filter(|r| !r.is_null()).cloned();
        Self { response, recipes }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    pub include_recipes: bool,
    pub recipes: Option<Value>,
}

impl ChatMessage {
    pub fn is_assistant(&self) -> bool {
        !self.is_user
    }
}
