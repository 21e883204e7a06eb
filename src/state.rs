// src/state.rs
use serde::Serialize;

use crate::message::ChatMessage;

pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    pub is_loading: bool,
    pub selected_model: String,
}

impl ChatState {
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            is_loading: false,
            selected_model: default_model.into(),
        }
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}
