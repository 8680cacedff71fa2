//! Scripted in-memory transport for workflow tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ApiRequest, RawResponse, Transport};
use crate::error::ApiError;

/// Replays scripted replies in order and records every request.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    replies: Mutex<VecDeque<Result<RawResponse, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
    /// Scheduler yields before answering, to keep a request in flight.
    yields: usize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a received response.
    pub(crate) fn reply(self, response: RawResponse) -> Self {
        self.replies.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queue a transport failure.
    pub(crate) fn fail(self, error: ApiError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Stay pending for `yields` polls before answering.
    pub(crate) fn slow(mut self, yields: usize) -> Self {
        self.yields = yields;
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        self.requests.lock().unwrap().push(request);

        for _ in 0..self.yields {
            tokio::task::yield_now().await;
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted reply".to_string())))
    }
}
