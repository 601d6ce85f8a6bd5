use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
pub struct ShapeLabel {
    pub shape: &'static str,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
pub struct DropLabel {
    pub shape: &'static str,
}

/// Dispatcher-local metrics, registered the same way the reference
/// operator's `Metrics` registers its own families.
#[derive(Clone)]
pub struct DispatcherMetrics {
    pub invocations_total: Family<ShapeLabel, Counter>,
    pub channel_drops_total: Family<DropLabel, Counter>,
}

impl DispatcherMetrics {
    pub fn register(registry: &mut Registry) -> Self {
        let invocations_total = Family::<ShapeLabel, Counter>::default();
        let channel_drops_total = Family::<DropLabel, Counter>::default();
        registry.register(
            "invocations",
            "Total lambda invocations by shape (sync, async, proxy, sse, ws)",
            invocations_total.clone(),
        );
        registry.register(
            "channel_drops",
            "Total messages dropped from a full per-request channel",
            channel_drops_total.clone(),
        );
        Self {
            invocations_total,
            channel_drops_total,
        }
    }

    pub fn record(&self, shape: &'static str) {
        self.invocations_total.get_or_create(&ShapeLabel { shape }).inc();
    }

    /// Counts one message dropped from a full per-request channel (the SSE
    /// bridge's drop-on-full backpressure policy).
    pub fn record_drop(&self, shape: &'static str) {
        self.channel_drops_total.get_or_create(&DropLabel { shape }).inc();
    }
}
