use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

pub const CONTACT: &str = r#"{
    "email": "ops@example.com",
    "social": {"twitter": "https://twitter.com/example", "github": "https://github.com/example"},
    "additional_contact": {"signal": "https://signal.me/#p/example"}
}"#;

pub const FEED: &str = r#"{
    "entries": [
        {"text": "Rewrote the footer in a weekend https://blog.example.com/footer"},
        {"text": "Plain announcement without links"}
    ]
}"#;

/// Site layout served under `/site/`:
/// good documents, a malformed one, and one that always answers 500.
pub fn site() -> Router {
    Router::new()
        .route("/site/contact.json", get(|| async { CONTACT }))
        .route("/site/blog.json", get(|| async { FEED }))
        .route("/site/broken.json", get(|| async { "{\"email\": " }))
        .route(
            "/site/error.json",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
}

/// Bind an ephemeral port and serve `router` in the background.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}/site/index.html")
}
