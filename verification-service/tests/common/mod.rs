#![allow(dead_code)]

use std::time::Duration;
use uuid::Uuid;
use verification_service::config::VerificationConfig;
use verification_service::startup::Application;

pub const TEST_USER_ID: &str = "test_user_123";
pub const PUBLIC_BASE_URL: &str = "http://files.test";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub storage_path: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let storage_path = format!("target/test-storage-{}", Uuid::new_v4());

        let mut config = VerificationConfig::load().expect("Failed to load configuration");
        config.common.port = 0; // Random port for testing
        config.storage.local_path = storage_path.clone();
        config.storage.public_base_url = Some(PUBLIC_BASE_URL.to_string());

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("http://127.0.0.1:{}/health", port);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            storage_path,
        }
    }

    /// Multipart form with a single named file part.
    pub fn file_form(
        part_name: &str,
        file_name: &str,
        mime: &str,
        data: Vec<u8>,
    ) -> reqwest::multipart::Form {
        reqwest::multipart::Form::new().part(
            part_name.to_string(),
            reqwest::multipart::Part::bytes(data)
                .file_name(file_name.to_string())
                .mime_str(mime)
                .unwrap(),
        )
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.storage_path).await;
    }
}
