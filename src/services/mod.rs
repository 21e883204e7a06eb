// src/services/mod.rs
pub mod api_client;
pub mod chat_session;
pub mod chat_store;
