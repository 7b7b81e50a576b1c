//! Content server - per-task response building and delivery
//!
//! Each virtual-scheme request from the webview arrives as a task: the host
//! hands the URL and a [`SchemeTask`] callback object to the server, which
//! resolves the asset off the caller's thread and delivers events back in a
//! fixed order: response metadata, then the full body, then completion - or a
//! single failure instead of all three. A task may be cancelled out of band;
//! cancellation is best-effort and only suppresses further delivery.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE};
use http::{Response, StatusCode};

use crate::resolver::ResourceResolver;
use crate::{SchemeError, VirtualRequest};

/// Identifies one in-flight scheme request.
pub type TaskId = u64;

/// Outcome of serving one virtual-scheme request. Exactly one variant holds.
#[derive(Debug)]
pub enum ServerResponse {
    Success(Response<Vec<u8>>),
    Failure(SchemeError),
}

impl ServerResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Callback surface for one scheme task, implemented by the host's webview
/// glue. Events for a single task arrive strictly in declaration order;
/// `did_fail` replaces all three.
pub trait SchemeTask: Send {
    fn did_receive_response(&mut self, head: http::response::Parts);
    fn did_receive_data(&mut self, chunk: Vec<u8>);
    fn did_finish(&mut self);
    fn did_fail(&mut self, error: SchemeError);
}

/// Capability interface the host wires into its scheme-handler event model.
pub trait ResourceProvider: Send + Sync {
    /// Start serving `url` for the given task. Must be called within a tokio
    /// runtime; resolution and file reads run on the blocking pool.
    fn serve(&self, task_id: TaskId, url: &str, task: Box<dyn SchemeTask>);

    /// Suppress further delivery for a task. No-op if the task already
    /// completed; an in-flight read is not aborted mid-IO.
    fn cancel(&self, task_id: TaskId);
}

/// Resolve a URL and build the success response with its contract headers,
/// or the structured failure. Both serving paths go through here so the
/// response contract lives in one place.
fn build_response(resolver: &ResourceResolver, url: &str) -> ServerResponse {
    match VirtualRequest::parse(url).and_then(|req| resolver.resolve(&req.raw_path)) {
        Ok(asset) => {
            let response = Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, asset.content_type)
                .header(CONTENT_LENGTH, asset.bytes.len())
                .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
                .body(asset.bytes)
                .unwrap();
            ServerResponse::Success(response)
        }
        Err(error) => ServerResponse::Failure(error),
    }
}

/// Serves virtual-scheme requests against a [`ResourceResolver`].
pub struct ContentServer {
    resolver: Arc<ResourceResolver>,
    tasks: Arc<Mutex<HashMap<TaskId, Arc<AtomicBool>>>>,
}

impl ContentServer {
    pub fn new(resolver: Arc<ResourceResolver>) -> Self {
        Self {
            resolver,
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Build the full response for a URL synchronously. This is the pure core
    /// of [`ResourceProvider::serve`]; per-request state lives with the task.
    pub fn respond(&self, url: &str) -> ServerResponse {
        let response = build_response(&self.resolver, url);
        if let ServerResponse::Failure(error) = &response {
            tracing::warn!(url, %error, "virtual-scheme request failed");
        }
        response
    }

    /// Whether a task is still registered (started and not yet completed or
    /// swept after cancellation).
    pub fn is_active(&self, task_id: TaskId) -> bool {
        self.tasks.lock().unwrap().contains_key(&task_id)
    }
}

impl ResourceProvider for ContentServer {
    fn serve(&self, task_id: TaskId, url: &str, mut task: Box<dyn SchemeTask>) {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.tasks.lock().unwrap().insert(task_id, cancelled.clone());

        let resolver = self.resolver.clone();
        let tasks = self.tasks.clone();
        let url = url.to_string();

        tokio::spawn(async move {
            tracing::debug!(task_id, url = %url, "scheme task started");

            let read_url = url.clone();
            let outcome = tokio::task::spawn_blocking(move || build_response(&resolver, &read_url))
                .await
                .unwrap_or_else(|e| {
                    ServerResponse::Failure(SchemeError::read(url.clone(), e.to_string()))
                });

            // Metadata -> body -> completion, re-checking the stop signal
            // between phases so a cancelled task sees no further events.
            if !cancelled.load(Ordering::Acquire) {
                match outcome {
                    ServerResponse::Success(response) => {
                        let (head, body) = response.into_parts();
                        task.did_receive_response(head);
                        if !cancelled.load(Ordering::Acquire) {
                            task.did_receive_data(body);
                            if !cancelled.load(Ordering::Acquire) {
                                task.did_finish();
                                tracing::debug!(task_id, "scheme task finished");
                            }
                        }
                    }
                    ServerResponse::Failure(error) => {
                        tracing::warn!(task_id, url = %url, %error, "scheme task failed");
                        task.did_fail(error);
                    }
                }
            } else {
                tracing::debug!(task_id, "scheme task cancelled before delivery");
            }

            tasks.lock().unwrap().remove(&task_id);
        });
    }

    fn cancel(&self, task_id: TaskId) {
        match self.tasks.lock().unwrap().get(&task_id) {
            Some(flag) => {
                flag.store(true, Ordering::Release);
                tracing::debug!(task_id, "scheme task stop requested");
            }
            None => {
                tracing::debug!(task_id, "stop for unknown or completed task ignored");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
