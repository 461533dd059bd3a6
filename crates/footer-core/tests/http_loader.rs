mod common;

use common::server;
use footer_core::config::SourceConfig;
use footer_core::{DataLoader, HttpSource, LoadError};

async fn loader(contact: &str, feed: &str) -> DataLoader<HttpSource> {
    let addr = server::spawn(server::site()).await;
    DataLoader::from_config(&SourceConfig {
        base_url: server::base_url(addr),
        contact_path: contact.to_string(),
        feed_path: feed.to_string(),
    })
    .expect("loader should build")
}

#[tokio::test]
async fn loads_both_documents_relative_to_the_page() {
    let loader = loader("contact.json", "blog.json").await;
    let (contact, feed) = loader.load_all().await.expect("both documents load");

    let labels: Vec<_> = contact.links().into_iter().map(|l| l.label).collect();
    assert_eq!(labels, ["Email", "Twitter", "Github", "Signal"]);
    assert_eq!(contact.links()[0].url, "mailto:ops@example.com");
    assert_eq!(feed.entries.len(), 2);
}

#[tokio::test]
async fn missing_document_is_http_404() {
    let loader = loader("nope.json", "blog.json").await;
    let err = loader.load_contact().await.unwrap_err();
    assert!(
        matches!(err, LoadError::HttpStatus { status: 404, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn server_error_is_reported_with_status() {
    let loader = loader("contact.json", "error.json").await;
    let err = loader.load_all().await.unwrap_err();
    assert!(matches!(err, LoadError::HttpStatus { status: 500, .. }));
    assert!(err.to_string().contains("error.json"));
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let loader = loader("broken.json", "blog.json").await;
    let err = loader.load_contact().await.unwrap_err();
    assert_eq!(err.kind(), "parse");
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let loader = DataLoader::new(
        HttpSource::from_base_str(&server::base_url(addr)).unwrap(),
        "contact.json",
        "blog.json",
    );
    let err = loader.load_contact().await.unwrap_err();
    assert_eq!(err.kind(), "transport");
}
