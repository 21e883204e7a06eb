//! Client-side layer for the fitness chat app: an HTTP client for the
//! backend `/query` and `/upload` endpoints and an observable chat store.

pub mod config;
pub mod error;
pub mod message;
pub mod services;
pub mod state;

pub use config::ClientConfig;
pub use error::{ApiError, SessionError};
pub use message::{ChatMessage, QueryReply, QueryRequest};
pub use services::api_client::{FitnessApiClient, QueryOptions, UploadFile};
pub use services::chat_session::ChatSession;
pub use services::chat_store::{ChatStore, Subscription};
pub use state::{ChatState, DEFAULT_MODEL};
