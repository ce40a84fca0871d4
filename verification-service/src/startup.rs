use crate::config::{StorageBackend, VerificationConfig};
use crate::handlers;
use crate::services::{LocalStorage, S3Storage, Storage, UploadClient, VerificationService};
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics_middleware;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

// The transport cap must stay above the per-file validation limit so
// oversized files reach the validator instead of dying in the extractor.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: VerificationConfig,
    pub uploader: Arc<UploadClient>,
    pub verification: Arc<VerificationService>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: VerificationConfig) -> Result<Self, AppError> {
        let storage = build_storage(&config).await?;
        let uploader = Arc::new(UploadClient::new(storage));
        let verification = Arc::new(VerificationService::new(uploader.clone()));

        let state = AppState {
            config: config.clone(),
            uploader,
            verification,
        };

        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .route(
                "/onboarding/verification",
                get(handlers::get_verification_state),
            )
            .route(
                "/onboarding/verification/documents/:field",
                post(handlers::upload_verification_document)
                    .delete(handlers::remove_verification_document),
            )
            .route(
                "/onboarding/verification/certifications",
                post(handlers::upload_certifications),
            )
            .route("/onboarding/photos", post(handlers::upload_studio_photo))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(axum::middleware::from_fn(metrics_middleware))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn build_storage(config: &VerificationConfig) -> Result<Arc<dyn Storage>, AppError> {
    match config.storage.backend {
        StorageBackend::Local => {
            let public_base_url = config
                .storage
                .public_base_url
                .clone()
                .unwrap_or_else(|| format!("http://localhost:{}/storage", config.common.port));
            let storage = LocalStorage::new(&config.storage.local_path, public_base_url)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to initialize local storage at {}: {}",
                        config.storage.local_path,
                        e
                    );
                    e
                })?;
            Ok(Arc::new(storage))
        }
        StorageBackend::S3 => {
            let region = config.storage.s3_region.clone().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "STORAGE_S3_REGION is required for the s3 backend"
                ))
            })?;
            let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(region.clone()))
                .load()
                .await;
            let client = aws_sdk_s3::Client::new(&sdk_config);
            Ok(Arc::new(S3Storage::new(
                client,
                region,
                config.storage.s3_bucket_prefix.clone().unwrap_or_default(),
                config.storage.public_base_url.clone(),
            )))
        }
    }
}
