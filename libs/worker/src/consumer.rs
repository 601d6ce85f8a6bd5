//! The exec-subject consumer loop every Runtime Worker binary drives: one
//! subscription per process, multiplexed per request_id so a streaming
//! handler's later messages land on the same session it was opened with.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use litefunctions_broker::subject::{
    exec_wildcard, exec_wildcard_shared, name_from_exec_subject, request_id_from_subject,
    res_subject,
};
use litefunctions_broker::Broker;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::WorkerConfig;
use crate::handler::Handler;
use crate::metrics::WorkerMetrics;

/// Bound on both the per-session input channel (streaming) and the output
/// channel a streaming handler publishes from; matches the dispatcher's own
/// bounded-with-drop backpressure policy so neither side of the broker can
/// build unbounded queues.
const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Broker(#[from] litefunctions_broker::Error),
}

/// Subscribes and runs the consumer loop until the broker connection drops.
/// Never returns during normal operation; intended to be the last await in
/// a worker binary's `main`.
pub async fn run(
    broker: Broker,
    config: WorkerConfig,
    handler: Handler,
    metrics: WorkerMetrics,
) -> Result<(), Error> {
    let subject = match &config.name {
        Some(name) => exec_wildcard(&config.project, name, &config.language)?,
        None => exec_wildcard_shared(&config.project, &config.language)?,
    };
    let mut sub = broker.subscribe(subject).await?;
    let handler = Arc::new(handler);
    let sessions: Arc<Mutex<HashMap<String, mpsc::Sender<Bytes>>>> =
        Arc::new(Mutex::new(HashMap::new()));

    while let Some(msg) = sub.next().await {
        let request_id = request_id_from_subject(&msg.subject).to_owned();

        let name = match &config.name {
            Some(n) => n.clone(),
            None => match name_from_exec_subject(&msg.subject) {
                Some(n) => n.to_owned(),
                None => {
                    warn!(subject = %msg.subject, "exec subject missing function name segment");
                    continue;
                }
            },
        };

        let existing = sessions.lock().unwrap().get(&request_id).cloned();
        if let Some(tx) = existing {
            if tx.try_send(msg.payload).is_err() {
                warn!(%request_id, "dropping continuation message: session input channel is full or closed");
            }
            continue;
        }

        let project = config.project.clone();
        let language = config.language.clone();
        let broker = broker.clone();
        let handler = handler.clone();
        let sessions = sessions.clone();
        let metrics = metrics.clone();
        let payload = msg.payload;

        match handler.as_ref() {
            Handler::Unary(_) => {
                tokio::spawn(async move {
                    metrics.record("unary");
                    let Handler::Unary(h) = handler.as_ref() else {
                        unreachable!()
                    };
                    match h.handle(payload).await {
                        Some(out) => match res_subject(&project, &name, &language, &request_id) {
                            Ok(subject) => {
                                if let Err(e) = broker.publish(subject, out).await {
                                    warn!(%request_id, error = %e, "failed to publish unary response");
                                }
                            }
                            Err(e) => warn!(%request_id, error = %e, "failed to build res subject"),
                        },
                        None => {
                            metrics.record_error("unary");
                            debug!(%request_id, "handler produced no response");
                        }
                    }
                });
            }
            Handler::Streaming(_) => {
                let (input_tx, input_rx) = mpsc::channel(CHANNEL_CAPACITY);
                if input_tx.try_send(payload).is_err() {
                    warn!(%request_id, "failed to seed new streaming session");
                    continue;
                }
                sessions.lock().unwrap().insert(request_id.clone(), input_tx);

                tokio::spawn(async move {
                    metrics.record("streaming");
                    let (output_tx, mut output_rx) = mpsc::channel(CHANNEL_CAPACITY);
                    let Handler::Streaming(h) = handler.as_ref() else {
                        unreachable!()
                    };
                    let publish = async {
                        while let Some(out) = output_rx.recv().await {
                            match res_subject(&project, &name, &language, &request_id) {
                                Ok(subject) => {
                                    if let Err(e) = broker.publish(subject, out).await {
                                        warn!(%request_id, error = %e, "failed to publish streamed response");
                                    }
                                }
                                Err(e) => warn!(%request_id, error = %e, "failed to build res subject"),
                            }
                        }
                    };
                    tokio::join!(h.handle(input_rx, output_tx), publish);
                    sessions.lock().unwrap().remove(&request_id);
                });
            }
        }
    }

    Ok(())
}
