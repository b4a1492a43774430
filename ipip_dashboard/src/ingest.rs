// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hand-off of raw payloads from ingestion threads to the frame loop.
//!
//! Producers (an HTTP handler, a socket reader, a simulator) push payloads
//! from any thread; the frame loop drains them without blocking once per
//! frame. The queue is unbounded: a producer that outpaces the frame loop
//! grows memory without limit.

use std::sync::mpsc::{self, Receiver, Sender};

use serde_json::Value;
use thiserror::Error;

/// Why a payload was not queued.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The body is not valid JSON.
    #[error("dropping malformed payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The consumer side is gone.
    #[error("ingestion queue closed")]
    Disconnected,
}

/// Sending half of the ingestion queue. Cheap to clone, one per thread.
#[derive(Clone, Debug)]
pub struct Producer {
    tx: Sender<Value>,
}

/// Receiving half of the ingestion queue, owned by the frame loop.
#[derive(Debug)]
pub struct Consumer {
    rx: Receiver<Value>,
}

/// Creates a connected producer/consumer pair.
pub fn ingest_channel() -> (Producer, Consumer) {
    let (tx, rx) = mpsc::channel();
    (Producer { tx }, Consumer { rx })
}

impl Producer {
    /// Queues a parsed payload.
    pub fn push(&self, payload: Value) -> Result<(), IngestError> {
        self.tx.send(payload).map_err(|_| IngestError::Disconnected)
    }

    /// Parses a request body and queues it.
    ///
    /// Bodies that are not JSON are logged and dropped.
    pub fn push_body(&self, body: &str) -> Result<(), IngestError> {
        let payload = serde_json::from_str(body).map_err(|err| {
            log::warn!("dropping malformed payload: {err}");
            IngestError::Json(err)
        })?;
        self.push(payload)
    }
}

impl Consumer {
    /// Takes every payload queued so far without blocking.
    pub fn drain(&self) -> Vec<Value> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use serde_json::json;

    use super::*;

    #[test]
    fn payloads_cross_threads_in_order() {
        let (producer, consumer) = ingest_channel();
        let worker = {
            let producer = producer.clone();
            thread::spawn(move || {
                for i in 0..3 {
                    producer.push(json!({ "time": i })).unwrap();
                }
            })
        };
        worker.join().unwrap();
        let drained = consumer.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[2]["time"], 2);
        assert!(consumer.drain().is_empty());
    }

    #[test]
    fn malformed_bodies_are_dropped() {
        let (producer, consumer) = ingest_channel();
        assert!(matches!(producer.push_body("not json"), Err(IngestError::Json(_))));
        producer.push_body(r#"{"f": {"s": {"time": 0, "value": 1}}}"#).unwrap();
        assert_eq!(consumer.drain().len(), 1);
    }

    #[test]
    fn push_after_consumer_drop_reports_disconnect() {
        let (producer, consumer) = ingest_channel();
        drop(consumer);
        assert!(matches!(producer.push(json!({})), Err(IngestError::Disconnected)));
    }
}
