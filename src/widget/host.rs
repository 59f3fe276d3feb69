use serde::{Serialize, Serializer};

/// Outbound notification to the CRM shell hosting the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The account changed; the host should refresh its view of it.
    AccountRefresh,
}

#[derive(Debug, Serialize)]
struct HostMessage {
    event: &'static str,
    operation: &'static str,
}

impl HostEvent {
    fn message(self) -> HostMessage {
        match self {
            HostEvent::AccountRefresh => HostMessage {
                event: "accountRefreshEvent",
                operation: "triggerCustomAction",
            },
        }
    }
}

impl Serialize for HostEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.message().serialize(serializer)
    }
}

/// Delivery channel to the embedding window (a `postMessage` bridge in a
/// browser, a log line in the terminal client).
pub trait HostNotifier: Send + Sync {
    fn notify(&self, event: HostEvent);
}

/// Notifier that writes the serialized event to the log.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl HostNotifier for TracingNotifier {
    fn notify(&self, event: HostEvent) {
        match serde_json::to_string(&event) {
            Ok(message) => tracing::info!(%message, "host notified"),
            Err(err) => tracing::warn!(%err, "failed to encode host event"),
        }
    }
}
