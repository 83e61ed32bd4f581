use cosim_core::{Engine, EngineMessage, Severity};

/// Drains queued engine messages into the current tracing span.
///
/// Returns the number of messages forwarded.
pub(crate) fn forward<E: Engine>(engine: &mut E) -> usize {
    let messages = engine.drain_messages();
    for message in &messages {
        emit(message);
    }
    messages.len()
}

fn emit(message: &EngineMessage) {
    let text = message.text.as_str();
    match message.severity {
        Severity::Info => tracing::info!(target: "cosim::engine", "{text}"),
        Severity::Warning => tracing::warn!(target: "cosim::engine", "{text}"),
        Severity::Severe | Severity::Fatal => {
            tracing::error!(target: "cosim::engine", severity = %message.severity, "{text}");
        }
    }
}
