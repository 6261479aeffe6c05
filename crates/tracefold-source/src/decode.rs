use serde::Deserialize;
use tracefold_event::ExecutionEvent;

/// Accepted payload shapes: the service's envelope or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
  Envelope { data: Vec<ExecutionEvent> },
  Bare(Vec<ExecutionEvent>),
}

/// Parse execution records from JSON text.
///
/// Accepts either `{ "data": [...] }` or `[...]`.
pub fn parse_events(text: &str) -> Result<Vec<ExecutionEvent>, serde_json::Error> {
  let payload: Payload = serde_json::from_str(text)?;
  Ok(match payload {
    Payload::Envelope { data } => data,
    Payload::Bare(events) => events,
  })
}
