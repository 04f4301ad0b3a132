//! Integration test harness for Shopfront.
//!
//! [`TestApp`] runs the storefront router in-process against a mock catalog
//! and a temporary cart directory. Requests go through
//! `tower::ServiceExt::oneshot`, and the session cookie is carried between
//! requests like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::{Value, json};
use shopfront_core::CurrencyCode;
use shopfront_storefront::config::{
    CartConfig, CatalogConfig, StorefrontConfig, parse_base_url,
};
use shopfront_storefront::state::AppState;
use shopfront_storefront::storage::FileStorage;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Largest response body read by the harness.
const BODY_LIMIT: usize = 1024 * 1024;

/// A t-shirt with two option axes and two units in stock.
#[must_use]
pub fn tee_json() -> Value {
    json!({
        "id": "P1",
        "slug": "pineapple-tee",
        "name": "Pineapple Tee",
        "description": "Soft cotton tee.",
        "price": "24.00",
        "compareAtPrice": "30.00",
        "stock": 2,
        "images": [{"url": "https://cdn.example.com/tee.jpg", "alt": "Tee"}],
        "variants": [
            {"name": "size", "values": ["S", "M"]},
            {"name": "color", "values": ["red", "yellow"]}
        ]
    })
}

/// A mug without variants and plenty of stock.
#[must_use]
pub fn mug_json() -> Value {
    json!({
        "id": "P2",
        "slug": "pineapple-mug",
        "name": "Pineapple Mug",
        "price": "12.50",
        "stock": 10
    })
}

/// A sold-out poster. The catalog reports oversold items with negative stock.
#[must_use]
pub fn poster_json() -> Value {
    json!({
        "id": "P3",
        "slug": "poster",
        "name": "Poster",
        "price": "8.00",
        "stock": -1
    })
}

/// A response captured for assertions.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Parsed `HX-Trigger` header, if present.
    #[must_use]
    pub fn hx_trigger(&self) -> Option<Value> {
        self.headers
            .get("hx-trigger")
            .map(|value| serde_json::from_str(value.to_str().unwrap()).unwrap())
    }

    /// The toast message carried in `HX-Trigger`, if any.
    #[must_use]
    pub fn toast(&self) -> Option<(String, String)> {
        let trigger = self.hx_trigger()?;
        let toast = trigger.get("toast")?;
        Some((
            toast["level"].as_str()?.to_string(),
            toast["message"].as_str()?.to_string(),
        ))
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// The storefront running in-process with its own catalog and cart directory.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
    pub catalog: MockServer,
    cart_dir: TempDir,
}

impl TestApp {
    /// Start a mock catalog serving the tee, the mug, and the poster.
    pub async fn spawn() -> Self {
        let catalog = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/products"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([tee_json(), mug_json(), poster_json()])),
            )
            .mount(&catalog)
            .await;
        for (id, body) in [("P1", tee_json()), ("P2", mug_json()), ("P3", poster_json())] {
            Mock::given(method("GET"))
                .and(path(format!("/v1/products/{id}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&catalog)
                .await;
        }

        let cart_dir = tempfile::tempdir().unwrap();
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            catalog: CatalogConfig {
                base_url: parse_base_url(&format!("{}/v1", catalog.uri())).unwrap(),
                api_token: None,
            },
            cart: CartConfig {
                storage_dir: cart_dir.path().to_path_buf(),
                currency: CurrencyCode::USD,
                checkout_delay: Duration::from_millis(10),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let storage = FileStorage::new(cart_dir.path()).unwrap();
        let router = shopfront_storefront::app(AppState::new(config, storage));

        Self {
            router,
            cookie: None,
            catalog,
            cart_dir,
        }
    }

    #[must_use]
    pub fn cart_dir(&self) -> &Path {
        self.cart_dir.path()
    }

    /// Cart files currently on disk.
    #[must_use]
    pub fn cart_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.cart_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect()
    }

    /// Forget the session cookie, as a different browser would.
    pub fn new_browser(&mut self) {
        self.cookie = None;
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::get(uri);
        self.send(request, Body::empty()).await
    }

    /// POST a form the way HTMX does.
    pub async fn htmx_post(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        let request = Request::post(uri).header("hx-request", "true");
        self.send_form(request, form).await
    }

    /// POST a form without JavaScript.
    pub async fn form_post(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        self.send_form(Request::post(uri), form).await
    }

    async fn send_form(
        &mut self,
        request: axum::http::request::Builder,
        form: &[(&str, &str)],
    ) -> TestResponse {
        let body = form
            .iter()
            .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        let request = request.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(request, Body::from(body)).await
    }

    async fn send(&mut self, mut request: axum::http::request::Builder, body: Body) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

/// Percent-encode a form component.
fn encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
