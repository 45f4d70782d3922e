//! In-memory device oracle for unit tests

use super::transport::DeviceTransport;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tessera_core::ProbeError;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Body(Vec<u8>),
    Fail(ProbeError),
    /// Never settles; only a timeout ends the request
    Hang,
}

impl Reply {
    pub(crate) fn json(body: &str) -> Self {
        Reply::Body(body.as_bytes().to_vec())
    }

    pub(crate) fn down(url: &str) -> Self {
        Reply::Fail(ProbeError::Unreachable {
            url: url.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

#[derive(Default)]
struct Inner {
    /// Replies per URL; the last reply repeats once the queue drains
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

/// Scripted transport that records every requested URL
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    inner: Arc<Inner>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `url`
    pub(crate) fn on(self, url: &str, reply: Reply) -> Self {
        self.inner
            .routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// Requests whose URL ends with `path`, in issue order
    pub(crate) fn calls_ending_with(&self, path: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|url| url.ends_with(path))
            .collect()
    }
}

#[async_trait]
impl DeviceTransport for MockTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProbeError> {
        self.inner.calls.lock().unwrap().push(url.to_string());

        let reply = {
            let mut routes = self.inner.routes.lock().unwrap();
            match routes.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(ProbeError::Unreachable {
                url: url.to_string(),
                reason: "no such device".to_string(),
            }),
        }
    }
}
