//! Response parser — turns one raw completion into a structured step.
//!
//! The completion is scanned once for section markers. Each marker opens a
//! segment that runs until the next marker or the end of the text:
//!
//! ```text
//! Thought: I should compute this
//! Action: {"action_identifier": "calculate", "input": "2+2"}
//! ```
//!
//! `Observation:` is recognized only as a boundary, so text the model
//! invents after it is never folded into another section. An `Action:`
//! segment holds one JSON object; prose after the object is dropped and
//! markers quoted inside it are not boundaries.

use serde_json::Value;
use thoughtline_core::step::{Action, Step};
use tracing::debug;

/// The markers of the transcript line protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Thought,
    Action,
    Pause,
    Observation,
    FinalAnswer,
}

impl Marker {
    const ALL: [Marker; 5] = [
        Marker::FinalAnswer,
        Marker::Observation,
        Marker::Thought,
        Marker::Action,
        Marker::Pause,
    ];

    fn literal(self) -> &'static str {
        match self {
            Marker::Thought => "Thought:",
            Marker::Action => "Action:",
            Marker::Pause => "PAUSE:",
            Marker::Observation => "Observation:",
            Marker::FinalAnswer => "Final Answer:",
        }
    }
}

/// One marker occurrence and the text it governs.
#[derive(Debug)]
struct Segment<'a> {
    marker: Marker,
    /// Byte offset just past the marker.
    body_start: usize,
    body: &'a str,
}

/// A successfully parsed completion.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// An intermediate step; `action` may be present.
    Step(Step),

    /// The model finished. `step` carries only thought and pause.
    FinalAnswer {
        step: Step,
        answer: String,
        /// An `Action:` segment was present and will not run.
        action_ignored: bool,
    },
}

/// The `Action:` payload could not be decoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed action payload: {reason}")]
pub struct ResponseFormatError {
    /// Thought and pause recovered from the same completion.
    pub salvaged: Step,
    pub reason: String,
}

/// Split `text` into marker segments, in order of appearance.
///
/// The JSON value opening an `Action:` segment is skipped as a unit, so a
/// marker literal quoted inside the payload is not a boundary.
fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut found: Vec<(Marker, usize, usize)> = Vec::new();
    let mut pos = 0;
    while let Some(c) = text[pos..].chars().next() {
        let rest = &text[pos..];
        let Some(marker) = Marker::ALL.into_iter().find(|m| rest.starts_with(m.literal())) else {
            pos += c.len_utf8();
            continue;
        };
        let body_start = pos + marker.literal().len();
        found.push((marker, pos, body_start));
        pos = body_start;
        if marker == Marker::Action {
            pos += leading_json_len(&text[body_start..]).unwrap_or(0);
        }
    }

    found
        .iter()
        .enumerate()
        .map(|(idx, &(marker, _, body_start))| {
            let end = found.get(idx + 1).map_or(text.len(), |&(_, start, _)| start);
            Segment {
                marker,
                body_start,
                body: text[body_start..end].trim(),
            }
        })
        .collect()
}

/// Byte length of the JSON value that opens `text`, including leading
/// whitespace and an optional code fence line. `None` if it does not parse.
fn leading_json_len(text: &str) -> Option<usize> {
    let (skipped, payload) = open_code_fence(text);
    let mut stream = serde_json::Deserializer::from_str(payload).into_iter::<Value>();
    match stream.next() {
        Some(Ok(_)) => Some(skipped + stream.byte_offset()),
        _ => None,
    }
}

/// Skip leading whitespace and an opening Markdown fence with its info
/// string. Returns the number of bytes skipped and the remainder.
fn open_code_fence(text: &str) -> (usize, &str) {
    let trimmed = text.trim_start();
    let skipped = text.len() - trimmed.len();
    let Some(after) = trimmed.strip_prefix("```") else {
        return (skipped, trimmed);
    };
    match after.find('\n') {
        Some(newline) => (skipped + 3 + newline + 1, &after[newline + 1..]),
        None => (skipped + 3, after),
    }
}

/// Decode the action object at the start of `payload`. Text after the
/// object is not part of the action.
fn decode_action(payload: &str) -> Result<Action, String> {
    let (_, payload) = open_code_fence(payload);
    let mut stream = serde_json::Deserializer::from_str(payload).into_iter::<Value>();
    let value = match stream.next() {
        Some(Ok(value)) => value,
        Some(Err(e)) => return Err(e.to_string()),
        None => return Err("empty action payload".into()),
    };
    if !value.is_object() {
        return Err(format!("expected a JSON object, found {value}"));
    }
    let trailing = payload[stream.byte_offset()..].trim();
    let trailing = trailing.strip_prefix("```").unwrap_or(trailing).trim();
    if !trailing.is_empty() {
        debug!(trailing, "Ignoring text after action payload");
    }
    serde_json::from_value::<Action>(value).map_err(|e| e.to_string())
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Parse one raw completion.
///
/// Deterministic: identical input always yields an identical result.
pub fn parse_response(raw: &str) -> Result<ParsedResponse, ResponseFormatError> {
    let segments = segments(raw);

    if let Some(final_idx) = segments
        .iter()
        .position(|s| s.marker == Marker::FinalAnswer)
    {
        let before = &segments[..final_idx];
        let last_body = |marker: Marker| {
            before
                .iter()
                .rev()
                .find(|s| s.marker == marker)
                .and_then(|s| non_empty(s.body))
        };
        let step = Step {
            thought: last_body(Marker::Thought),
            pause_reflection: last_body(Marker::Pause),
            ..Step::default()
        };
        let action_ignored = segments
            .iter()
            .any(|s| s.marker == Marker::Action && !s.body.is_empty());
        let answer = raw[segments[final_idx].body_start..].trim().to_string();

        debug!(action_ignored, "Parsed final answer");
        return Ok(ParsedResponse::FinalAnswer {
            step,
            answer,
            action_ignored,
        });
    }

    let first_body = |marker: Marker| segments.iter().find(|s| s.marker == marker).map(|s| s.body);

    let mut step = Step {
        thought: first_body(Marker::Thought).and_then(non_empty),
        pause_reflection: first_body(Marker::Pause).and_then(non_empty),
        ..Step::default()
    };

    if let Some(payload) = first_body(Marker::Action).filter(|b| !b.is_empty()) {
        match decode_action(payload) {
            Ok(action) => step.action = Some(action),
            Err(reason) => return Err(ResponseFormatError { salvaged: step, reason }),
        }
    }

    debug!(
        thought = step.thought.is_some(),
        pause = step.pause_reflection.is_some(),
        action = step.action.as_ref().map(|a| a.action_type.as_str()),
        "Parsed step"
    );
    Ok(ParsedResponse::Step(step))
}
