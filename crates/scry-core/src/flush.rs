//! Delivering a stream's buffer to the collection endpoint.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::buffer::{EventBuffer, SessionSlot};
use crate::endpoints::SessionId;
use crate::transport::{HttpMethod, Transport, TransportRequest};

/// What happens to a batch whose delivery failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Discard it; the next flush starts fresh.
    DropOnFailure,
    /// Put it back in front of the buffer for the next flush.
    RetainOnFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// The batch is sent as a JSON array.
    Array,
    /// The batch is sent as `{"data": [...]}`.
    Data,
}

/// Static description of one stream's delivery.
#[derive(Debug, Clone, Copy)]
pub struct FlushTarget {
    pub stream: &'static str,
    pub method: HttpMethod,
    pub endpoint: fn(&SessionId) -> String,
    pub policy: FlushPolicy,
    pub envelope: Envelope,
    /// Status the endpoint is expected to answer with. Other 2xx/3xx statuses
    /// are logged but still count as delivered.
    pub expected_status: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// No session yet, or nothing buffered.
    Skipped,
    Delivered { events: usize, status: u16 },
    Failed { events: usize, retained: bool },
}

/// Attempt one delivery of `buffer`.
///
/// Only sends when a session id is known and the buffer is non-empty.
pub async fn flush_buffer<T: Serialize>(
    target: &FlushTarget,
    buffer: &EventBuffer<T>,
    session: &SessionSlot,
    transport: &dyn Transport,
) -> FlushOutcome {
    let Some(session_id) = session.get() else {
        return FlushOutcome::Skipped;
    };
    if buffer.is_empty() {
        return FlushOutcome::Skipped;
    }

    let batch = buffer.take();
    let events = batch.len();

    let body = match envelope(target.envelope, &batch) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to serialize {} batch: {}", target.stream, e);
            return fail(target, buffer, batch);
        }
    };

    let mut request = TransportRequest::new(target.method, (target.endpoint)(&session_id));
    request.body = Some(body);

    match transport.request(request).await {
        Ok(response) if response.status >= 400 => {
            error!(
                "status {} when trying to save {} ({} events)",
                response.status, target.stream, events
            );
            error!("{}", response.data);
            fail(target, buffer, batch)
        }
        Ok(response) => {
            if target
                .expected_status
                .is_some_and(|expected| expected != response.status)
            {
                error!(
                    "Failed to save {}: unexpected status {} ({})",
                    target.stream, response.status, response.data
                );
            } else {
                debug!("Delivered {} {} to session {}", events, target.stream, session_id);
            }
            FlushOutcome::Delivered {
                events,
                status: response.status,
            }
        }
        Err(e) => {
            error!("Failed to save {}: {}", target.stream, e);
            fail(target, buffer, batch)
        }
    }
}

fn envelope<T: Serialize>(envelope: Envelope, batch: &[T]) -> Result<Value, serde_json::Error> {
    let events = serde_json::to_value(batch)?;
    Ok(match envelope {
        Envelope::Array => events,
        Envelope::Data => json!({ "data": events }),
    })
}

fn fail<T>(target: &FlushTarget, buffer: &EventBuffer<T>, batch: Vec<T>) -> FlushOutcome {
    let events = batch.len();
    match target.policy {
        FlushPolicy::DropOnFailure => FlushOutcome::Failed {
            events,
            retained: false,
        },
        FlushPolicy::RetainOnFailure => {
            let evicted = buffer.restore(batch);
            if evicted > 0 {
                warn!(
                    "{} buffer is full, dropped {} oldest events",
                    target.stream, evicted
                );
            }
            FlushOutcome::Failed {
                events,
                retained: true,
            }
        }
    }
}
