//! Embedded static frontend assets.
//!
//! The HTML, CSS, and JS files from `frontend/` are compiled into the binary
//! using `include_str!`, enabling single-binary deployment. The backend base
//! URL the UI talks to is served as `/static/config.js`.

use axum::{
    Router,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use ragchat_config::UiConfig;

/// The embedded frontend files.
const INDEX_HTML: &str = include_str!("../../../frontend/index.html");
const STYLE_CSS: &str = include_str!("../../../frontend/style.css");
const APP_JS: &str = include_str!("../../../frontend/app.js");

/// Build a router that serves the embedded frontend.
pub fn frontend_router(ui: &UiConfig) -> Router {
    let config_js = config_script(ui);

    Router::new()
        .route("/", get(index_handler))
        .route("/static/style.css", get(css_handler))
        .route("/static/app.js", get(js_handler))
        .route(
            "/static/config.js",
            get(move || {
                let body = config_js.clone();
                async move { javascript(body) }
            }),
        )
}

/// `window.RAGCHAT_CONFIG` for the UI. An empty base URL means same origin.
fn config_script(ui: &UiConfig) -> String {
    let base = ui.backend_base_url.trim_end_matches('/');
    let config = serde_json::json!({ "backendBaseUrl": base });
    format!("window.RAGCHAT_CONFIG = {config};\n")
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn css_handler() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLE_CSS,
    )
        .into_response()
}

async fn js_handler() -> Response {
    javascript(APP_JS)
}

fn javascript(body: impl IntoResponse) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        body,
    )
        .into_response()
}
