//! Integration tests for the conversations API endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    use crate::test_utils::{body_to_string, test_app};

    async fn create_conversation(app: &Router, id: &str) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/conversations")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "id": id, "name": "Test conversation" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn append_message(app: &Router, id: &str, role: &str, content: &str) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/conversations/{}/messages", id))
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "role": role, "content": content }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    /// Tests listing conversations starts empty
    #[tokio::test]
    async fn it_lists_no_conversations_initially() {
        let fixture = test_app().await;

        let response = fixture
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/conversations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("\"conversations\":[]"));
    }

    /// Tests creating then fetching a conversation
    #[tokio::test]
    async fn it_creates_and_gets_a_conversation() {
        let fixture = test_app().await;
        create_conversation(&fixture.app, "conv-1").await;

        let response = fixture
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/conversations/conv-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("\"id\":\"conv-1\""));
        assert!(body.contains("\"messages\":[]"));
    }

    /// Tests fetching an unknown conversation is not found
    #[tokio::test]
    async fn it_returns_404_for_unknown_conversation() {
        let fixture = test_app().await;

        let response = fixture
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/conversations/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    /// Tests messages append in order
    #[tokio::test]
    async fn it_appends_messages_in_order() {
        let fixture = test_app().await;
        create_conversation(&fixture.app, "conv-2").await;
        append_message(&fixture.app, "conv-2", "user", "first").await;
        append_message(&fixture.app, "conv-2", "assistant", "second").await;

        let response = fixture
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/conversations/conv-2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_to_string(response.into_body()).await;
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        let messages = value["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "first");
        assert_eq!(messages[1]["content"], "second");
    }

    /// Tests editing replaces a message in place without reordering
    #[tokio::test]
    async fn it_replaces_a_message_in_place() {
        let fixture = test_app().await;
        create_conversation(&fixture.app, "conv-3").await;
        append_message(&fixture.app, "conv-3", "user", "first").await;
        append_message(&fixture.app, "conv-3", "assistant", "second").await;

        let response = fixture
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/conversations/conv-3/messages/0")
                    .method("PUT")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "role": "user", "content": "edited" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = fixture
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/conversations/conv-3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_to_string(response.into_body()).await;
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        let messages = value["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "edited");
        assert_eq!(messages[1]["content"], "second");
    }

    /// Tests editing a message that doesn't exist is not found
    #[tokio::test]
    async fn it_returns_404_replacing_a_missing_message() {
        let fixture = test_app().await;
        create_conversation(&fixture.app, "conv-4").await;

        let response = fixture
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/conversations/conv-4/messages/7")
                    .method("PUT")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "role": "user", "content": "edited" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    /// Tests clearing messages empties the list but keeps the
    /// conversation
    #[tokio::test]
    async fn it_clears_messages() {
        let fixture = test_app().await;
        create_conversation(&fixture.app, "conv-5").await;
        append_message(&fixture.app, "conv-5", "user", "first").await;

        let response = fixture
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/conversations/conv-5/messages")
                    .method("DELETE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = fixture
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/conversations/conv-5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("\"messages\":[]"));
    }

    /// Tests clearing all conversations
    #[tokio::test]
    async fn it_deletes_all_conversations() {
        let fixture = test_app().await;
        create_conversation(&fixture.app, "conv-6").await;
        create_conversation(&fixture.app, "conv-7").await;

        let response = fixture
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/conversations")
                    .method("DELETE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = fixture
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/conversations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("\"conversations\":[]"));
    }

    /// Tests associating a document index with a conversation
    #[tokio::test]
    async fn it_sets_the_conversation_index() {
        let fixture = test_app().await;
        create_conversation(&fixture.app, "conv-8").await;

        let response = fixture
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/indexes")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "id": "idx-1", "name": "Quarterly report" })
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = fixture
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/conversations/conv-8/index")
                    .method("PUT")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "index_id": "idx-1" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = fixture
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/conversations/conv-8")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("\"index_id\":\"idx-1\""));
    }

    /// Tests associating an unknown index is not found
    #[tokio::test]
    async fn it_returns_404_setting_an_unknown_index() {
        let fixture = test_app().await;
        create_conversation(&fixture.app, "conv-9").await;

        let response = fixture
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/conversations/conv-9/index")
                    .method("PUT")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "index_id": "ghost" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
