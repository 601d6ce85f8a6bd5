use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
pub struct ShapeLabel {
    pub shape: &'static str,
}

/// Worker-local metrics, registered the same way `litefunctions_dispatcher`
/// registers its own families.
#[derive(Clone)]
pub struct WorkerMetrics {
    pub invocations_total: Family<ShapeLabel, Counter>,
    pub handler_errors_total: Family<ShapeLabel, Counter>,
}

impl WorkerMetrics {
    pub fn register(registry: &mut Registry) -> Self {
        let invocations_total = Family::<ShapeLabel, Counter>::default();
        let handler_errors_total = Family::<ShapeLabel, Counter>::default();
        registry.register(
            "invocations",
            "Total exec messages handled, by shape (unary, streaming)",
            invocations_total.clone(),
        );
        registry.register(
            "handler_errors",
            "Total exec messages that produced no res message",
            handler_errors_total.clone(),
        );
        Self {
            invocations_total,
            handler_errors_total,
        }
    }

    pub fn record(&self, shape: &'static str) {
        self.invocations_total.get_or_create(&ShapeLabel { shape }).inc();
    }

    pub fn record_error(&self, shape: &'static str) {
        self.handler_errors_total.get_or_create(&ShapeLabel { shape }).inc();
    }
}
