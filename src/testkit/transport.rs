//! Mock [`Transport`] for adapter tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::exchange::{Request, Transport};

/// A transport that answers from a fixed queue of bodies.
///
/// Each `send()` records the request and pops the next scripted result;
/// once the queue is empty every call fails with a transport error.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    requests: Mutex<Vec<Request>>,
    ip: Option<String>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            ip: None,
        }
    }

    /// Queue a response body.
    pub fn with_response(self, body: &str) -> Self {
        self.push(Ok(body.to_string()));
        self
    }

    /// Queue several response bodies, answered in order.
    pub fn with_responses(self, bodies: &[&str]) -> Self {
        for body in bodies {
            self.push(Ok((*body).to_string()));
        }
        self
    }

    /// Queue a network failure.
    pub fn with_failure(self, reason: &str) -> Self {
        self.push(Err(reason.to_string()));
        self
    }

    /// Report `ip` from `external_ip()`.
    pub fn with_ip(mut self, ip: &str) -> Self {
        self.ip = Some(ip.to_string());
        self
    }

    fn push(&self, result: std::result::Result<String, String>) {
        self.responses.lock().push_back(result);
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.requests.lock().last().cloned()
    }

    /// Scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<String> {
        self.requests.lock().push(request);
        match self.responses.lock().pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err(reason)) => Err(Error::Transport(reason)),
            None => Err(Error::Transport("no scripted response left".into())),
        }
    }

    async fn external_ip(&self) -> Option<String> {
        self.ip.clone()
    }
}
