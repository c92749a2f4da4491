//! Test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};
use tempfile::TempDir;

use docchat::api::{AppState, app};
use docchat::core::AppConfig;
use docchat::core::db::{async_db, initialize_db};

pub struct TestApp {
    pub app: Router,
    pub upload_path: PathBuf,
    // Held so the temp directories outlive the test
    pub _dir: TempDir,
}

/// Creates a test application router backed by temporary directories
pub async fn test_app() -> TestApp {
    test_app_with_llm("https://api.openai.com").await
}

/// Same as `test_app` but pointing the provider hostname at a mock
/// server. Credentials still come from request headers.
pub async fn test_app_with_llm(openai_api_hostname: &str) -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp directory");

    let upload_path = dir.path().join("uploads");
    let db_path = dir.path().join("db");
    fs::create_dir_all(&upload_path).expect("Failed to create uploads directory");
    fs::create_dir_all(&db_path).expect("Failed to create db directory");

    let db = async_db(db_path.to_str().unwrap())
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to initialize db schema");
        Ok(())
    })
    .await
    .unwrap();

    let app_config = AppConfig {
        storage_path: dir.path().display().to_string(),
        upload_path: upload_path.display().to_string(),
        db_path: db_path.display().to_string(),
        api_type: String::from("OPENAI"),
        openai_api_hostname: openai_api_hostname.to_string(),
        openai_api_key: String::new(),
        openai_api_model: String::from("gpt-4.1-mini"),
        azure_api_key: String::new(),
        azure_instance_name: String::new(),
        azure_api_version: String::from("2023-05-15"),
        azure_deployment_name: String::new(),
        azure_embedding_deployment_name: String::new(),
        system_message: String::from("You are a helpful assistant."),
    };
    let app_state = AppState::new(db, app_config);

    TestApp {
        app: app(Arc::new(RwLock::new(app_state))),
        upload_path,
        _dir: dir,
    }
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_to_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX).await.unwrap().to_vec()
}
