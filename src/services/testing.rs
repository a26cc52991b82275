// src/services/testing.rs

//! In-memory transport and sleeper used by unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::services::{CountRequest, CountTransport, Pause, RawResponse, Sleeper, TransportError};

type Reply = Result<RawResponse, TransportError>;
type Responder = dyn Fn(&CountRequest) -> Reply + Send + Sync;

/// 200 response carrying `totalResults`.
pub fn ok(total: u64) -> RawResponse {
    status(200, &format!(r#"{{"totalResults": {total}, "results": []}}"#))
}

pub fn status(status: u16, body: &str) -> RawResponse {
    RawResponse {
        status,
        body: body.to_string(),
    }
}

/// Replays canned replies and records every request it sees.
#[derive(Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Reply>>>,
    responder: Option<Arc<Responder>>,
    requests: Arc<Mutex<Vec<CountRequest>>>,
}

impl ScriptedTransport {
    /// Replies in order; once the script runs dry every call fails.
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            script: Arc::new(Mutex::new(replies.into())),
            responder: None,
            requests: Arc::default(),
        }
    }

    /// Computes each reply from the request.
    pub fn responding(f: impl Fn(&CountRequest) -> Reply + Send + Sync + 'static) -> Self {
        let responder: Arc<Responder> = Arc::new(f);
        Self {
            script: Arc::default(),
            responder: Some(responder),
            requests: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CountRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CountTransport for ScriptedTransport {
    async fn get(&self, request: &CountRequest) -> Reply {
        self.requests.lock().unwrap().push(request.clone());
        match &self.responder {
            Some(respond) => respond(request),
            None => self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("script exhausted".into()))),
        }
    }
}

/// Records pauses instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    pauses: Arc<Mutex<Vec<(Pause, Duration)>>>,
}

impl RecordingSleeper {
    pub fn pauses(&self) -> Vec<(Pause, Duration)> {
        self.pauses.lock().unwrap().clone()
    }

    pub fn pauses_of(&self, kind: Pause) -> Vec<Duration> {
        self.pauses()
            .into_iter()
            .filter(|(pause, _)| *pause == kind)
            .map(|(_, duration)| duration)
            .collect()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, pause: Pause, duration: Duration) {
        self.pauses.lock().unwrap().push((pause, duration));
    }
}
