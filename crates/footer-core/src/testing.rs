//! In-memory [`DocumentSource`] with scripted responses, for tests of the
//! controller and of adapters built on it.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::LoadError;
use crate::loader::DocumentSource;

#[derive(Debug, Clone)]
pub enum Response {
    Body(String),
    Status(u16),
    Unreachable,
}

#[derive(Default)]
struct Inner {
    scripts: HashMap<String, VecDeque<Response>>,
    latency: HashMap<String, Duration>,
    calls: Vec<(String, Instant)>,
}

/// Responses are queued per path and consumed in order; the last one
/// repeats forever.  Unknown paths answer 404.
#[derive(Default)]
pub struct MemorySource {
    inner: Mutex<Inner>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, response: Response) -> &Self {
        self.lock()
            .scripts
            .entry(path.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn respond_body(&self, path: &str, body: &str) -> &Self {
        self.respond(path, Response::Body(body.to_string()))
    }

    pub fn with_latency(&self, path: &str, latency: Duration) -> &Self {
        self.lock().latency.insert(path.to_string(), latency);
        self
    }

    /// When each fetch of `path` started.
    pub fn calls(&self, path: &str) -> Vec<Instant> {
        self.lock()
            .calls
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn call_count(&self, path: &str) -> usize {
        self.calls(path).len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_response(&self, path: &str) -> (Response, Duration) {
        let mut inner = self.lock();
        inner.calls.push((path.to_string(), Instant::now()));
        let latency = inner.latency.get(path).copied().unwrap_or_default();
        let response = match inner.scripts.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        (response.unwrap_or(Response::Status(404)), latency)
    }
}

impl DocumentSource for MemorySource {
    async fn fetch(&self, path: &str) -> Result<String, LoadError> {
        let (response, latency) = self.next_response(path);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match response {
            Response::Body(body) => Ok(body),
            Response::Status(status) => Err(LoadError::HttpStatus {
                url: path.to_string(),
                status,
            }),
            Response::Unreachable => Err(LoadError::transport(path, "connection refused")),
        }
    }
}
