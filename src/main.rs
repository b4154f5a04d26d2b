use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::{routing::get, Router};
use sentry_tower::{NewSentryLayer, SentryHttpLayer};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::instrument;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

mod app_state;
mod config;
mod consts;
mod error;
pub mod gemini;
mod middleware;
pub mod render;
pub mod studio;
mod types;

use app_state::AppState;
use crate::config::AppConfig;

fn app_router(shared_state: Arc<AppState>) -> Router {
    #[derive(OpenApi)]
    #[openapi(
        tags(
            (name = "Studio", description = "Photo remix studio API"),
        )
    )]
    struct ApiDoc;

    let sentry_tower_layer = ServiceBuilder::new()
        .layer(NewSentryLayer::new_from_top())
        .layer(SentryHttpLayer::with_transaction());

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest(
            "/api/v1/studio",
            studio::studio_router(shared_state.clone()),
        )
        .split_for_parts();

    let router =
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api));

    Router::new()
        .route("/healthz", get(health_handler))
        .merge(router)
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(
            crate::middleware::http_logging_middleware,
        ))
        .layer(sentry_tower_layer)
}

async fn main_impl(conf: AppConfig) -> Result<()> {
    let addr: SocketAddr = conf
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address {}", conf.listen_addr))?;

    let shared_state = Arc::new(AppState::new(conf));
    let http = app_router(shared_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    log::info!("listening on {addr}");

    axum::serve(listener, http).await?;

    Ok(())
}

fn main() -> Result<()> {
    let conf = AppConfig::load().context("failed to load configuration")?;

    let _guard = sentry::init((
        conf.sentry_dsn.clone(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            traces_sample_rate: std::env::var("SENTRY_TRACES_SAMPLE_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.5),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    // Configure sentry to only capture errors (not debug/info/warn)
    let sentry_layer = sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // Default to info level, with warn for noisy crates
                format!(
                    "{}=info,tower_http=warn,axum::rejection=warn,hyper=warn,reqwest=warn",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(main_impl(conf))
}

#[instrument]
async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::{GenerationError, GenerativeBackend};
    use crate::studio::controller::tests::{png, FakeBackend};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_config() -> AppConfig {
        ::config::Config::builder()
            .set_override("gemini_api_key", "test-key")
            .unwrap()
            .set_override("api_base_url", "http://localhost:1/v1beta")
            .unwrap()
            .set_override("image_model", "img")
            .unwrap()
            .set_override("video_model", "vid")
            .unwrap()
            .set_override("listen_addr", "127.0.0.1:0")
            .unwrap()
            .set_override("poll_interval_secs", 10)
            .unwrap()
            .set_override("status_interval_secs", 4)
            .unwrap()
            .set_override("watermark", false)
            .unwrap()
            .set_override("watermark_text", "AI PREVIEW")
            .unwrap()
            .set_override("max_upload_bytes", 1024 * 1024)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    fn test_router(backend: FakeBackend) -> Router {
        let backend: Arc<dyn GenerativeBackend> = Arc::new(backend);
        app_router(Arc::new(AppState::with_backend(test_config(), backend)))
    }

    fn multipart_upload(file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
        let boundary = "studio-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/studio/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let router = test_router(FakeBackend::new(Err(GenerationError::NoImageReturned)));
        let res = router
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_then_state() {
        let router = test_router(FakeBackend::new(Err(GenerationError::NoImageReturned)));

        let res = router
            .clone()
            .oneshot(multipart_upload("me.png", "image/png", &png(3, 3)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let snapshot = json_body(res).await;
        assert_eq!(snapshot["file_name"], "me.png");
        assert_eq!(snapshot["can_generate_image"], false);
        assert_eq!(snapshot["can_generate_video"], true);

        let res = router
            .clone()
            .oneshot(
                Request::put("/api/v1/studio/form")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"context":"destination","destination":"tokyo"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let snapshot = json_body(res).await;
        assert_eq!(snapshot["context"], "destination");
        assert_eq!(snapshot["destination"], "tokyo");
        assert_eq!(snapshot["can_generate_image"], true);

        let res = router
            .oneshot(Request::get("/api/v1/studio/preview").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "image/png");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let router = test_router(FakeBackend::new(Err(GenerationError::NoImageReturned)));
        let res = router
            .oneshot(multipart_upload("notes.txt", "text/plain", b"hello"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_body(res).await["error"]
            .as_str()
            .unwrap()
            .contains("notes.txt"));
    }

    #[tokio::test]
    async fn test_unreadable_upload_clears_previous_photo() {
        let router = test_router(FakeBackend::new(Err(GenerationError::NoImageReturned)));

        let res = router
            .clone()
            .oneshot(multipart_upload("me.png", "image/png", &png(3, 3)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        // over the 1 MiB body limit, so the multipart stream fails mid-read
        let oversized = vec![0u8; 2 * 1024 * 1024];
        let res = router
            .clone()
            .oneshot(multipart_upload("big.png", "image/png", &oversized))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res = router
            .oneshot(Request::get("/api/v1/studio/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let snapshot = json_body(res).await;
        assert!(snapshot["file_name"].is_null());
        assert!(snapshot["error"].is_string());
        assert_eq!(snapshot["can_generate_video"], false);
    }

    #[tokio::test]
    async fn test_generate_without_file_is_rejected() {
        let router = test_router(FakeBackend::new(Err(GenerationError::NoImageReturned)));
        let res = router
            .clone()
            .oneshot(
                Request::post("/api/v1/studio/generate/image")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res = router
            .oneshot(Request::get("/api/v1/studio/result").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_openapi_lists_studio_routes() {
        let router = test_router(FakeBackend::new(Err(GenerationError::NoImageReturned)));
        let res = router
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let doc = json_body(res).await;
        assert!(doc["paths"]["/api/v1/studio/generate/video"].is_object());
        assert!(doc["paths"]["/api/v1/studio/upload"].is_object());
    }
}
