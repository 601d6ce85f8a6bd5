use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Bytes-in, bytes-out handler for a function invoked as a single
/// request/response pair. Exactly one res message is published per exec
/// message the handler actually answers; if `handle` returns `None`, no res
/// message is emitted and the dispatcher's sync path eventually times out.
#[async_trait]
pub trait UnaryHandler: Send + Sync + 'static {
    async fn handle(&self, input: Bytes) -> Option<Bytes>;
}

/// Input-sequence to output-sequence transformer backing the SSE and
/// WebSocket invocation shapes. `input` carries every exec message
/// associated with one request_id (one for SSE's single request body, many
/// for a WS connection's inbound frames); the handler publishes one res
/// message per element it sends on `output`, in order, and the worker stops
/// publishing once `output` is closed. The handler owns closing its output;
/// a handler that never closes it leaks the session until the subscriber
/// disconnects.
#[async_trait]
pub trait StreamingHandler: Send + Sync + 'static {
    async fn handle(&self, input: mpsc::Receiver<Bytes>, output: mpsc::Sender<Bytes>);
}

/// The single handler a worker process binds at startup: exactly one of the
/// two shapes, matching the language runtime it fronts.
pub enum Handler {
    Unary(Box<dyn UnaryHandler>),
    Streaming(Box<dyn StreamingHandler>),
}
