// src/services/chat_session.rs
use serde_json::Value;

use super::{
    api_client::{FitnessApiClient, QueryOptions, UploadFile},
    chat_store::ChatStore,
};
use crate::{error::SessionError, message::QueryReply};

/// Drives one conversation: user text goes into the store, out to the
/// backend, and the reply comes back into the store.
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: FitnessApiClient,
    store: ChatStore,
    include_recipes: bool,
}

impl ChatSession {
    pub fn new(client: FitnessApiClient, store: ChatStore) -> Self {
        Self {
            client,
            store,
            include_recipes: false,
        }
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub fn set_include_recipes(&mut self, include: bool) {
        self.include_recipes = include;
    }

    /// Sends `text` with the store's selected model. The loading flag is
    /// cleared whether the query succeeds or not.
    pub async fn send(&self, text: &str) -> Result<QueryReply, SessionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let include_recipes = self.include_recipes;
        let model = self.store.snapshot().selected_model.clone();

        self.store.add_message(trimmed, true);
        self.store.set_loading(true);

        let options = QueryOptions::new()
            .model(model)
            .include_recipes(include_recipes);
        let result = self.client.query_with(trimmed, options).await;

        let reply = match result {
            Ok(raw) => QueryReply::from_json(&raw),
            Err(err) => {
                self.store.set_loading(false);
                return Err(err.into());
            }
        };

        self.store.add_message_with_recipes(
            reply.response.clone(),
            false,
            include_recipes,
            reply.recipes.clone(),
        );
        self.store.set_loading(false);
        Ok(reply)
    }

    pub async fn upload(
        &self,
        files: Vec<UploadFile>,
        file_type: &str,
    ) -> Result<Value, SessionError> {
        self.store.set_loading(true);
        let result = self.client.upload_files(files, file_type).await;
        self.store.set_loading(false);
        Ok(result?)
    }
}
