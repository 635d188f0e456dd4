/// Worker protocol — tagged request/response messages, a JSON entry
/// point, and a dedicated engine thread fed over channels.
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Mutex};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::pipeline::NameEngine;
use crate::schema::lexicon::Region;
use crate::schema::request::NameRequest;
use crate::schema::result::NameResult;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("worker thread is gone")]
    Disconnected,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Inbound messages. `id` is echoed back for correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerRequest {
    WarmUp {
        #[serde(default)]
        id: u64,
        #[serde(default)]
        regions: Vec<Region>,
    },
    Generate {
        #[serde(default)]
        id: u64,
        #[serde(default)]
        request: NameRequest,
    },
}

impl WorkerRequest {
    pub fn id(&self) -> u64 {
        match self {
            Self::WarmUp { id, .. } | Self::Generate { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerResponse {
    Results { id: u64, results: Vec<NameResult> },
    Error { id: u64, message: String },
}

impl WorkerResponse {
    pub fn id(&self) -> u64 {
        match self {
            Self::Results { id, .. } | Self::Error { id, .. } => *id,
        }
    }
}

/// Run one message against the engine. Panics inside the engine become
/// `error` responses.
pub fn handle(engine: &mut NameEngine, message: WorkerRequest) -> WorkerResponse {
    let id = message.id();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match message {
        WorkerRequest::WarmUp { regions, .. } => {
            engine.warm_up(&regions);
            Vec::new()
        }
        WorkerRequest::Generate { request, .. } => engine.generate_batch(&request),
    }));
    match outcome {
        Ok(results) => WorkerResponse::Results { id, results },
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(id, %message, "engine panicked");
            WorkerResponse::Error { id, message }
        }
    }
}

/// JSON in, JSON out. Malformed input yields an `error` message.
pub fn handle_json(engine: &mut NameEngine, text: &str) -> String {
    let response = match serde_json::from_str::<WorkerRequest>(text) {
        Ok(message) => handle(engine, message),
        Err(e) => WorkerResponse::Error {
            id: 0,
            message: format!("malformed message: {}", e),
        },
    };
    serde_json::to_string(&response).unwrap_or_else(|e| {
        serde_json::json!({
            "type": "error",
            "id": response.id(),
            "message": e.to_string(),
        })
        .to_string()
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "engine panicked".to_string()
    }
}

/// An engine running on its own thread. Requests are processed in order;
/// there is no cancellation.
pub struct NameWorker {
    tx: Option<mpsc::Sender<WorkerRequest>>,
    rx: Mutex<mpsc::Receiver<WorkerResponse>>,
    thread: Option<JoinHandle<()>>,
}

impl NameWorker {
    pub fn spawn(mut engine: NameEngine) -> Result<Self, WorkerError> {
        let (work_tx, work_rx) = mpsc::channel::<WorkerRequest>();
        let (result_tx, result_rx) = mpsc::channel::<WorkerResponse>();

        let thread = thread::Builder::new()
            .name("name-engine".into())
            .spawn(move || {
                while let Ok(message) = work_rx.recv() {
                    debug!(id = message.id(), "worker message");
                    if result_tx.send(handle(&mut engine, message)).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            tx: Some(work_tx),
            rx: Mutex::new(result_rx),
            thread: Some(thread),
        })
    }

    pub fn submit(&self, message: WorkerRequest) -> Result<(), WorkerError> {
        self.tx
            .as_ref()
            .ok_or(WorkerError::Disconnected)?
            .send(message)
            .map_err(|_| WorkerError::Disconnected)
    }

    /// Block until the next response arrives.
    pub fn recv(&self) -> Result<WorkerResponse, WorkerError> {
        let rx = self.rx.lock().map_err(|_| WorkerError::Disconnected)?;
        rx.recv().map_err(|_| WorkerError::Disconnected)
    }

    pub fn try_recv(&self) -> Option<WorkerResponse> {
        let rx = self.rx.lock().ok()?;
        rx.try_recv().ok()
    }

    /// Submit and wait for the matching response.
    pub fn call(&self, message: WorkerRequest) -> Result<WorkerResponse, WorkerError> {
        let id = message.id();
        self.submit(message)?;
        loop {
            let response = self.recv()?;
            if response.id() == id {
                return Ok(response);
            }
        }
    }
}

impl Drop for NameWorker {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexicon::Lexicon;
    use crate::core::loader::MemorySource;
    use crate::schema::lexicon::{CharPools, RegionData, WeightedChar};
    use std::sync::Arc;

    fn engine() -> NameEngine {
        let data = RegionData {
            chars: CharPools {
                male: vec![
                    WeightedChar::new('明', 3.0),
                    WeightedChar::new('宇', 2.0),
                    WeightedChar::new('浩', 1.0),
                ],
                ..Default::default()
            },
            ..Default::default()
        };
        NameEngine::builder()
            .with_lexicon(Lexicon::parse_ron("{}", "{}", "{}", "(general: [])").unwrap())
            .with_source(Arc::new(
                MemorySource::new()
                    .with_region(Region::Cn, data.clone())
                    .with_region(Region::Hk, data),
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn message_shapes() {
        let msg: WorkerRequest =
            serde_json::from_str(r#"{"type": "warm_up", "id": 3, "regions": ["HK", "TW"]}"#)
                .unwrap();
        assert_eq!(
            msg,
            WorkerRequest::WarmUp {
                id: 3,
                regions: vec![Region::Hk, Region::Tw]
            }
        );
        let out = serde_json::to_value(WorkerResponse::Error {
            id: 1,
            message: "x".into(),
        })
        .unwrap();
        assert_eq!(out["type"], "error");
    }

    #[test]
    fn handle_json_generate_and_errors() {
        let mut engine = engine();
        let reply = handle_json(
            &mut engine,
            r#"{"type": "generate", "id": 7, "request": {"seed": "w", "count": 2}}"#,
        );
        let response: WorkerResponse = serde_json::from_str(&reply).unwrap();
        match response {
            WorkerResponse::Results { id, results } => {
                assert_eq!(id, 7);
                assert_eq!(results.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }

        let reply = handle_json(&mut engine, "{not json");
        let response: WorkerResponse = serde_json::from_str(&reply).unwrap();
        assert!(matches!(response, WorkerResponse::Error { id: 0, .. }));
    }

    #[test]
    fn warm_up_replies_with_empty_results() {
        let mut engine = engine();
        let response = handle(
            &mut engine,
            WorkerRequest::WarmUp {
                id: 2,
                regions: vec![Region::Hk],
            },
        );
        assert_eq!(
            response,
            WorkerResponse::Results {
                id: 2,
                results: Vec::new()
            }
        );
        assert!(engine.store().loader().is_loaded(Region::Hk));
    }

    #[test]
    fn threaded_worker_round_trip() {
        let worker = NameWorker::spawn(engine()).unwrap();
        let response = worker
            .call(WorkerRequest::Generate {
                id: 11,
                request: NameRequest {
                    seed: Some("thread".into()),
                    ..Default::default()
                },
            })
            .unwrap();
        match response {
            WorkerResponse::Results { id, results } => {
                assert_eq!(id, 11);
                assert_eq!(results.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(worker.try_recv().is_none());
    }
}
