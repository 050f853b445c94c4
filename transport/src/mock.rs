//! Scripted transport for tests.
//!
//! Routes are matched in registration order on the HTTP verb and a substring of
//! the URL; the first match answers. Every request is recorded so tests can
//! assert on what was sent and how many times.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use crate::error::{Result, TransportError};
use crate::{HttpRequest, HttpResponse, HttpTransport, Method};

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    ConnectionFailure,
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    pattern: String,
    reply: Reply,
}

/// In-memory [`HttpTransport`] answering from a routing table.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests whose URL contains `pattern` with `response`.
    pub fn route(self, method: Method, pattern: &str, response: HttpResponse) -> Self {
        self.push(method, pattern, Reply::Response(response));
        self
    }

    /// Fail requests whose URL contains `pattern` as if the host were down.
    pub fn unreachable(self, method: Method, pattern: &str) -> Self {
        self.push(method, pattern, Reply::ConnectionFailure);
        self
    }

    fn push(&self, method: Method, pattern: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Route {
                method,
                pattern: pattern.to_string(),
                reply,
            });
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of requests sent with `method` to a URL containing `pattern`.
    pub fn count(&self, method: Method, pattern: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.method == method && r.url.contains(pattern))
            .count()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let reply = self
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|route| route.method == request.method && request.url.contains(&route.pattern))
            .map(|route| route.reply.clone());

        match reply {
            Some(Reply::Response(response)) => {
                Ok(response.for_request(request.method, request.url))
            }
            Some(Reply::ConnectionFailure) => Err(TransportError::Connection {
                url: request.url,
                message: "connection refused".to_string(),
            }),
            None => Ok(HttpResponse::new(404).for_request(request.method, request.url)),
        }
    }
}
