use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::transport::{HttpTransport, OutboundRequest, RawResponse, TransportError};

/// Transport double that replays queued responses and records every request.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<Result<RawResponse, TransportError>>>>,
    requests: Arc<Mutex<Vec<OutboundRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_response(&self, response: Result<RawResponse, TransportError>) {
        let mut guard = self.responses.lock().expect("lock responses");
        guard.push_back(response);
    }

    pub fn enqueue_status(&self, status: u16, body: impl Into<String>) {
        self.enqueue_response(Ok(RawResponse::new(status, body)));
    }

    /// Returns the number of times `send` has been called.
    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("lock requests").len()
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().expect("lock requests").clone()
    }

    pub fn last_request(&self) -> Option<OutboundRequest> {
        self.requests.lock().expect("lock requests").last().cloned()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        self.requests
            .lock()
            .expect("lock requests")
            .push(request);
        let mut guard = self.responses.lock().expect("lock responses");
        guard.pop_front().unwrap_or_else(|| {
            Err(TransportError::Connect(
                "mock response not provided".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enbox::transport::HttpMethod;

    fn get(path: &str) -> OutboundRequest {
        OutboundRequest {
            method: HttpMethod::Get,
            base_url: "https://api.test".into(),
            path: path.into(),
            headers: vec![],
            body: None,
        }
    }

    #[tokio::test]
    async fn replays_queued_responses_in_order_and_records_requests() {
        let mock = MockTransport::new();
        mock.enqueue_status(200, "[]");
        mock.enqueue_response(Err(TransportError::Timeout("slow".into())));

        let first = mock.send(get("/one")).await;
        let second = mock.send(get("/two")).await;
        let third = mock.send(get("/three")).await;

        assert_eq!(first, Ok(RawResponse::new(200, "[]")));
        assert_eq!(second, Err(TransportError::Timeout("slow".into())));
        assert!(matches!(third, Err(TransportError::Connect(_))));

        assert_eq!(mock.call_count(), 3);
        let paths: Vec<String> = mock.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/one", "/two", "/three"]);
    }
}
