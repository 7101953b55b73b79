use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::FixedOffset;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promoscout_core::domain::promotion::Promotion;
use promoscout_core::llm::error::FetchError;
use promoscout_core::llm::gemini::GeminiClient;
use promoscout_core::llm::PromotionSource;
use promoscout_core::store::dashboard::{Dashboard, RefreshOutcome};
use promoscout_core::view::filter::{filter_promotions, UnknownTab};
use promoscout_core::view::{DashboardView, Tab};

mod html;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = promoscout_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let display_offset =
        promoscout_core::time::clock::display_offset(settings.display_utc_offset_minutes)?;
    let gemini = GeminiClient::from_settings(&settings)?;
    if settings.require_gemini_api_key().is_err() {
        tracing::warn!("GEMINI_API_KEY missing; scans will fail until it is set");
    }
    tracing::info!(model = gemini.model(), "promotion source configured");

    let state = AppState {
        dashboard: Arc::new(Dashboard::new()),
        source: Arc::new(gemini),
        display_offset,
    };

    spawn_startup_scan(state.clone());

    let app = router(state);

    let port: u16 = settings.port.unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/scan", post(scan_and_redirect))
        .route("/healthz", get(healthz))
        .route("/api/dashboard", get(dashboard_json))
        .route("/api/promotions", get(promotions_json))
        .route("/api/scan", post(scan))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Clone)]
struct AppState {
    dashboard: Arc<Dashboard>,
    source: Arc<dyn PromotionSource>,
    display_offset: FixedOffset,
}

impl AppState {
    async fn view(&self, tab: Tab) -> DashboardView {
        let snapshot = self.dashboard.snapshot().await;
        DashboardView::build(&snapshot, tab, self.display_offset)
    }
}

#[derive(Debug, Deserialize)]
struct TabQuery {
    tab: Option<String>,
}

impl TabQuery {
    fn tab(&self) -> Result<Tab, UnknownTab> {
        match self.tab.as_deref() {
            None => Ok(Tab::All),
            Some(raw) => raw.parse(),
        }
    }
}

#[derive(Debug, Error)]
enum ApiError {
    #[error(transparent)]
    UnknownTab(#[from] UnknownTab),

    #[error("a scan is already in progress")]
    Busy,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Render(#[from] html::RenderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::UnknownTab(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Busy => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Fetch(e) => (StatusCode::BAD_GATEWAY, e.user_message().to_string()),
            ApiError::Render(e) => {
                tracing::error!(error = %e, "failed to render dashboard");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to render dashboard".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn dashboard_page(
    State(state): State<AppState>,
    Query(query): Query<TabQuery>,
) -> Result<Html<String>, ApiError> {
    let view = state.view(query.tab()?).await;
    Ok(Html(html::render_dashboard(&view)?))
}

async fn dashboard_json(
    State(state): State<AppState>,
    Query(query): Query<TabQuery>,
) -> Result<Json<DashboardView>, ApiError> {
    Ok(Json(state.view(query.tab()?).await))
}

async fn promotions_json(
    State(state): State<AppState>,
    Query(query): Query<TabQuery>,
) -> Result<Json<Vec<Promotion>>, ApiError> {
    let tab = query.tab()?;
    let snapshot = state.dashboard.snapshot().await;
    let promotions = filter_promotions(&snapshot.data.promotions, tab)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(promotions))
}

async fn scan(State(state): State<AppState>) -> Result<Json<DashboardView>, ApiError> {
    run_scan(&state).await?;
    Ok(Json(state.view(Tab::All).await))
}

// Form target for the HTML "Scan Now" button. Fetch failures land in the banner and are
// already logged by `run_scan`.
async fn scan_and_redirect(State(state): State<AppState>) -> Redirect {
    match run_scan(&state).await {
        Err(ApiError::Busy) => tracing::info!("scan already in progress; ignoring form submit"),
        Err(_) | Ok(()) => {}
    }
    Redirect::to("/")
}

async fn run_scan(state: &AppState) -> Result<(), ApiError> {
    match state.dashboard.refresh(state.source.as_ref()).await {
        Ok(RefreshOutcome::Updated {
            promotions,
            sources,
        }) => {
            tracing::info!(
                source = state.source.name(),
                promotions,
                sources,
                "scan complete"
            );
            Ok(())
        }
        Ok(RefreshOutcome::Busy) => Err(ApiError::Busy),
        Err(err) => {
            if err.is_permission_denied() {
                tracing::warn!(
                    source = state.source.name(),
                    "Gemini returned 403; check the key's HTTP referrer/origin restrictions"
                );
            }
            // The single capture point for every failed scan, whichever route started it.
            sentry::capture_error(&err);
            tracing::error!(source = state.source.name(), error = %err, "scan failed");
            Err(err.into())
        }
    }
}

fn spawn_startup_scan(state: AppState) {
    tokio::spawn(async move {
        if let Err(err) = run_scan(&state).await {
            let err = anyhow::Error::new(err).context("startup scan failed");
            tracing::warn!(error = %format!("{err:#}"), "dashboard starts without data");
        }
    });
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &promoscout_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use promoscout_core::domain::promotion::{GroundingSource, Platform, PromoDataState};
    use tokio::sync::Notify;
    use tower::ServiceExt;

    struct FixedSource(PromoDataState);

    #[async_trait::async_trait]
    impl PromotionSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_promotions(&self) -> Result<PromoDataState, FetchError> {
            Ok(self.0.clone())
        }
    }

    struct ForbiddenSource;

    #[async_trait::async_trait]
    impl PromotionSource for ForbiddenSource {
        fn name(&self) -> &'static str {
            "forbidden"
        }

        async fn fetch_promotions(&self) -> Result<PromoDataState, FetchError> {
            Err(FetchError::Forbidden {
                body: "referer not allowed".to_string(),
            })
        }
    }

    fn promo(id: &str, platform: Platform, discount: &str) -> Promotion {
        Promotion {
            id: id.to_string(),
            platform,
            title: format!("<b>{id}</b>"),
            description: "Deal".to_string(),
            discount: discount.to_string(),
            period: "10 Dec - 12 Dec".to_string(),
            tags: vec!["Hotel".to_string()],
            actions: Vec::new(),
            link: None,
        }
    }

    fn fixed_state() -> AppState {
        let data = PromoDataState {
            promotions: vec![
                promo("a", Platform::Agoda, "50% OFF"),
                promo("t", Platform::Traveloka, "12% OFF"),
            ],
            sources: vec![GroundingSource {
                title: "agoda.com".to_string(),
                uri: "https://agoda.example".to_string(),
            }],
            last_updated: Some(chrono::Utc::now()),
        };
        app_state(Arc::new(FixedSource(data)))
    }

    fn app_state(source: Arc<dyn PromotionSource>) -> AppState {
        AppState {
            dashboard: Arc::new(Dashboard::new()),
            source,
            display_offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Response<Body>) {
        let res = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        (res.status(), res)
    }

    async fn body_json(res: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let (status, res) = send(router(fixed_state()), "GET", "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn unknown_tab_is_bad_request() {
        let (status, _) = send(router(fixed_state()), "GET", "/api/dashboard?tab=Expedia").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn scan_then_filter_promotions() {
        let state = fixed_state();

        let (status, res) = send(router(state.clone()), "POST", "/api/scan").await;
        assert_eq!(status, StatusCode::OK);
        let view = body_json(res).await;
        assert_eq!(view["cards"].as_array().unwrap().len(), 2);
        assert_eq!(view["chart"].as_array().unwrap().len(), 2);

        let (status, res) = send(router(state), "GET", "/api/promotions?tab=Agoda").await;
        assert_eq!(status, StatusCode::OK);
        let promos = body_json(res).await;
        assert_eq!(promos.as_array().unwrap().len(), 1);
        assert_eq!(promos[0]["platform"], "Agoda");
    }

    #[tokio::test]
    async fn forbidden_scan_is_bad_gateway_with_banner() {
        let state = app_state(Arc::new(ForbiddenSource));

        let (status, res) = send(router(state.clone()), "POST", "/api/scan").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let body = body_json(res).await;
        let forbidden_message = FetchError::Forbidden {
            body: String::new(),
        }
        .user_message();
        assert_eq!(body["error"], forbidden_message);

        let (_, res) = send(router(state), "GET", "/api/dashboard").await;
        let view = body_json(res).await;
        assert_eq!(view["error"], forbidden_message);
        assert_eq!(view["emptyState"]["title"], "No promotions found");
    }

    #[derive(Default)]
    struct BlockingSource {
        started: Notify,
        release: Notify,
    }

    #[async_trait::async_trait]
    impl PromotionSource for BlockingSource {
        fn name(&self) -> &'static str {
            "blocking"
        }

        async fn fetch_promotions(&self) -> Result<PromoDataState, FetchError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(PromoDataState::default())
        }
    }

    #[tokio::test]
    async fn html_scan_while_busy_still_redirects() {
        let source = Arc::new(BlockingSource::default());
        let state = app_state(source.clone());

        let in_flight = {
            let state = state.clone();
            tokio::spawn(async move { run_scan(&state).await })
        };
        source.started.notified().await;

        let (status, res) = send(router(state.clone()), "POST", "/scan").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/");

        let (status, _) = send(router(state), "POST", "/api/scan").await;
        assert_eq!(status, StatusCode::CONFLICT);

        source.release.notify_one();
        assert!(in_flight.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn html_scan_redirects_home() {
        let state = fixed_state();
        let (status, res) = send(router(state.clone()), "POST", "/scan").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/");

        let (status, res) = send(router(state), "GET", "/?tab=Traveloka").await;
        assert_eq!(status, StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("Travel Promo Scout"));
        assert!(page.contains("&lt;b&gt;t&lt;"));
        assert!(!page.contains("&lt;b&gt;a&lt;"));
        assert!(!page.contains("<b>"));
    }
}
