use serde_json::Value;
use tracefold_event::ExecutionEvent;

/// Find the `outputs.json` payload of the first entry titled `title`.
///
/// Works over a reconstructed trace (`&[TraceNode]`) as well as over the flat
/// record list (`&[ExecutionEvent]`). Only the given level is searched; loop
/// bodies are not descended into. The title must match exactly.
///
/// Returns `None` when no entry has the title, or when the first such entry
/// has no `outputs.json`.
pub fn find_by_title<'a, T: AsRef<ExecutionEvent>>(
  entries: &'a [T],
  title: &str,
) -> Option<&'a Value> {
  entries
    .iter()
    .map(AsRef::<ExecutionEvent>::as_ref)
    .find(|event| event.title.as_deref() == Some(title))
    .and_then(ExecutionEvent::output_json)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::reconstruct;
  use serde_json::json;
  use tracefold_event::ExecutionStatus;

  const SEARCH_TITLE: &str = "Web Search";

  fn search(outputs: Value) -> ExecutionEvent {
    ExecutionEvent::new("search", "tool", ExecutionStatus::Succeeded)
      .with_title(SEARCH_TITLE)
      .with_outputs(outputs)
  }

  #[test]
  fn test_finds_payload_in_flat_list() {
    let events = vec![
      ExecutionEvent::new("end", "end", ExecutionStatus::Succeeded).with_title("End"),
      search(json!({ "json": [{ "title": "Rust", "url": "https://rust-lang.org" }] })),
    ];
    assert_eq!(
      find_by_title(&events, SEARCH_TITLE),
      Some(&json!([{ "title": "Rust", "url": "https://rust-lang.org" }]))
    );
  }

  #[test]
  fn test_finds_payload_in_reconstructed_trace() {
    let events = vec![search(json!({ "json": { "results": [] } }))];
    let trace = reconstruct(&events);
    assert_eq!(
      find_by_title(&trace, SEARCH_TITLE),
      Some(&json!({ "results": [] }))
    );
  }

  #[test]
  fn test_first_match_without_payload_yields_none() {
    let events = vec![
      search(json!({ "text": "no json here" })),
      search(json!({ "json": ["later"] })),
    ];
    assert_eq!(find_by_title(&events, SEARCH_TITLE), None);
  }

  #[test]
  fn test_title_match_is_exact() {
    let events = vec![search(json!({ "json": [1] }))];
    assert_eq!(find_by_title(&events, "web search"), None);
    assert_eq!(find_by_title(&events, "Web Search "), None);
  }

  #[test]
  fn test_loop_bodies_are_not_searched() {
    let events = vec![
      search(json!({ "json": [1] })).in_iteration("loop", 0),
      ExecutionEvent::new("loop", "iteration", ExecutionStatus::Succeeded),
    ];
    let trace = reconstruct(&events);
    assert_eq!(trace.len(), 1);
    assert_eq!(find_by_title(&trace, SEARCH_TITLE), None);
  }
}
