mod error;
mod handlers;
mod state;

pub use state::AppState;

use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let router = Router::new()
        .route("/", get(handlers::index))
        .route("/api/item", get(handlers::get_item))
        .route("/api/patchnotes", get(handlers::get_patchnotes))
        .route("/api/patchnotes/search", get(handlers::search_patchnotes))
        .route("/api/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemCatalog;
    use crate::config::{AppConfig, FetchConfig};
    use crate::scraper::FetchClient;
    use reqwest::StatusCode;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn spawn_app(upstream: &MockServer) -> String {
        let mut config = AppConfig::default();
        config.fetch = FetchConfig {
            backoff_ms: 1,
            max_retries: 2,
            ..FetchConfig::default()
        };
        config.bazaar_url = format!("{}/bazaar", upstream.uri());
        config.auction_history_url = format!("{}/averageAuction?tag={{tag}}", upstream.uri());
        config.patchnotes_url = format!("{}/notes", upstream.uri());
        config.forum_url = format!("{}/forums/patch-notes/", upstream.uri());

        let catalog = ItemCatalog::from_json(r#"{"HYPERION": {"displayname": "Hyperion"}}"#).unwrap();
        let fetcher = Arc::new(FetchClient::new(&config.fetch, "skyblock-lens-test").unwrap());
        let state = AppState::new(Arc::new(config), Arc::new(catalog), None, fetcher).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(state))).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn mount_bazaar(upstream: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/bazaar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "products": {"HYPERION": {"quick_status": {"buyPrice": 1.1e9, "sellPrice": 1.0e9}}}
            })))
            .mount(upstream)
            .await;
    }

    #[tokio::test]
    async fn index_reports_liveness() {
        let upstream = MockServer::start().await;
        let base = spawn_app(&upstream).await;
        let resp = reqwest::get(&base).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.unwrap(), "SkyBlock API is running.");
    }

    #[tokio::test]
    async fn item_lookup_by_partial_name() {
        let upstream = MockServer::start().await;
        mount_bazaar(&upstream).await;
        Mock::given(method("GET"))
            .and(path("/averageAuction"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&upstream)
            .await;
        let base = spawn_app(&upstream).await;

        let resp = reqwest::get(format!("{base}/api/item?identifier=hyp")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["identifier_input"], "hyp");
        assert_eq!(body["normalized_id"], "HYPERION");
        assert_eq!(body["neu"]["displayname"], "Hyperion");
        assert_eq!(body["bazaar"]["buyPrice"], 1.1e9);
        assert!(body["bazaar"]["buyOrders"].is_null());
        assert!(body["auctionHistory"].is_null());
    }

    #[tokio::test]
    async fn missing_identifier_is_bad_request() {
        let upstream = MockServer::start().await;
        let base = spawn_app(&upstream).await;

        for url in [format!("{base}/api/item"), format!("{base}/api/item?identifier=")] {
            let resp = reqwest::get(url).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = resp.json().await.unwrap();
            assert!(body["error"].as_str().unwrap().contains("identifier"));
        }
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let upstream = MockServer::start().await;
        let base = spawn_app(&upstream).await;

        let resp = reqwest::get(format!("{base}/api/item?identifier=doesnotexist"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Item not found in NEU database");
    }

    #[tokio::test]
    async fn patchnotes_are_listed() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<table><tr><td>2025/May 3</td><td>Fishing Update</td><td>New rods</td></tr>\
                 <tr><td>2025/April 1</td><td>Hotfix</td><td>Fixes</td></tr></table>",
            ))
            .mount(&upstream)
            .await;
        let base = spawn_app(&upstream).await;

        let resp = reqwest::get(format!("{base}/api/patchnotes?limit=1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["count"], 1);
        assert_eq!(body["source"], format!("{}/notes", upstream.uri()));
        assert_eq!(body["patches"][0]["normalizedDate"], "2025-05-03");
        assert_eq!(body["patches"][0]["rawDate"], "2025/May 3");
        assert!(body["patches"][0]["detailedContent"].is_null());
    }

    #[tokio::test]
    async fn patchnotes_listing_failure_is_internal_error() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&upstream)
            .await;
        let base = spawn_app(&upstream).await;

        let resp = reqwest::get(format!("{base}/api/patchnotes")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("502"));
    }

    #[tokio::test]
    async fn forum_search_filters_by_term() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forums/patch-notes/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="/threads/a.1/">SkyBlock 0.20.1 Patch Notes</a>
                   <a href="/threads/b.2/">Dungeons Update</a>"#,
            ))
            .mount(&upstream)
            .await;
        let base = spawn_app(&upstream).await;

        let resp = reqwest::get(format!("{base}/api/patchnotes/search?term=0.20&maxPages=1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["count"], 1);
        assert_eq!(body["threads"][0]["version"], "0.20.1");
    }

    #[tokio::test]
    async fn malformed_query_params_get_json_errors() {
        let upstream = MockServer::start().await;
        let base = spawn_app(&upstream).await;

        for url in [
            format!("{base}/api/patchnotes?limit=abc"),
            format!("{base}/api/patchnotes/search?term=x&maxPages=two"),
        ] {
            let resp = reqwest::get(url).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = resp.json().await.unwrap();
            assert!(body["error"].is_string());
        }
        assert!(upstream.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_always_answers() {
        let upstream = MockServer::start().await;
        mount_bazaar(&upstream).await;
        let base = spawn_app(&upstream).await;

        let resp = reqwest::get(format!("{base}/api/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["neuDB"]["ok"], true);
        assert_eq!(body["neuDB"]["count"], 1);
        assert_eq!(body["bazaarAPI"]["sample"], "HYPERION");
        assert_eq!(body["patchnotes"]["ok"], false);
    }
}
