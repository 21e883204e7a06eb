use fitness_chat_client::{
    ApiError, ChatSession, ChatStore, ClientConfig, FitnessApiClient, SessionError, Subscription,
    UploadFile,
};
use httpmock::prelude::*;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn session_for(server: &MockServer) -> ChatSession {
    let client = FitnessApiClient::new(ClientConfig::with_base_url(server.url("/api")));
    ChatSession::new(client, ChatStore::new())
}

fn loading_history(store: &ChatStore) -> (Arc<Mutex<Vec<bool>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = store.subscribe(move |state| sink.lock().unwrap().push(state.is_loading));
    (seen, sub)
}

#[tokio::test]
async fn test_send_appends_user_and_assistant_messages() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/query");
            then.status(200).json_body(json!({"response": "~70 kcal"}));
        })
        .await;

    let session = session_for(&server);
    let (loading, _sub) = loading_history(session.store());

    let reply = session.send("  how many calories in an egg?  ").await.unwrap();
    assert_eq!(reply.response, "~70 kcal");

    let state = session.store().snapshot();
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[0].text, "how many calories in an egg?");
    assert!(state.messages[0].is_user);
    assert_eq!(state.messages[1].text, "~70 kcal");
    assert!(!state.messages[1].is_user);
    assert!(!state.is_loading);

    let loading = loading.lock().unwrap();
    assert!(loading.contains(&true));
    assert_eq!(loading.last(), Some(&false));
}

#[tokio::test]
async fn test_send_uses_selected_model_and_recipes() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/query")
                .json_body_partial(r#"{"model": "meta-llama/Llama-3-8B", "include_recipes": true}"#);
            then.status(200).json_body(json!({
                "response": "Here is a recipe.",
                "recipes": {"title": "Oats"}
            }));
        })
        .await;

    let mut session = session_for(&server);
    session.store().set_model("meta-llama/Llama-3-8B");
    session.set_include_recipes(true);

    let reply = session.send("breakfast ideas").await.unwrap();

    mock.assert_async().await;
    assert_eq!(reply.recipes, Some(json!({"title": "Oats"})));
    let state = session.store().snapshot();
    let last = state.last_message().unwrap();
    assert!(last.include_recipes);
    assert_eq!(last.recipes.as_ref().unwrap()["title"], "Oats");
}

#[tokio::test]
async fn test_failed_send_clears_loading() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/query");
            then.status(500).body("internal error");
        })
        .await;

    let session = session_for(&server);
    let err = session.send("hello").await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Api(ApiError::Status { .. })
    ));
    assert!(err.to_string().contains("500"));
    let state = session.store().snapshot();
    assert!(!state.is_loading);
    assert_eq!(state.messages.len(), 1);
    assert!(state.messages[0].is_user);
}

#[tokio::test]
async fn test_empty_message_is_rejected_locally() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.path("/api/query");
            then.status(200).json_body(json!({"response": "?"}));
        })
        .await;

    let session = session_for(&server);
    let err = session.send("   ").await.unwrap_err();

    assert!(matches!(err, SessionError::EmptyMessage));
    assert_eq!(mock.hits_async().await, 0);
    assert!(session.store().snapshot().messages.is_empty());
}

#[tokio::test]
async fn test_upload_through_session() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/upload");
            then.status(200).json_body(json!({"files_processed": ["diary.csv"]}));
        })
        .await;

    let session = session_for(&server);
    let reply = session
        .upload(vec![UploadFile::new("diary.csv", b"a,b\n".to_vec())], "mfp")
        .await
        .unwrap();

    assert_eq!(reply["files_processed"][0], "diary.csv");
    assert!(!session.store().snapshot().is_loading);
}

#[tokio::test]
async fn test_failed_upload_clears_loading() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/upload");
            then.status(500).body("disk full");
        })
        .await;

    let session = session_for(&server);
    let (loading, _sub) = loading_history(session.store());

    let err = session
        .upload(vec![UploadFile::new("diary.csv", b"a,b\n".to_vec())], "mfp")
        .await
        .unwrap_err();

    match err {
        SessionError::Api(ApiError::Status { status, body, .. }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "disk full");
        }
        other => panic!("unexpected error variant {other:?}"),
    }
    assert!(!session.store().snapshot().is_loading);
    assert_eq!(*loading.lock().unwrap(), [false, true, false]);
}
