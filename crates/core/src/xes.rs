//! XES event log parsing.
//!
//! Turns an XES XML document (IEEE 1849) into an ordered list of [`Trace`]s.
//! Element matching is namespace-aware: only elements in the root element's
//! namespace (or the empty namespace when the document declares none) are
//! recognised as `trace`, `event`, `string` or `date` elements.
//!
//! The whole document is consumed before anything is returned. Parsing holds
//! no shared state, so independent uploads can be parsed concurrently.

use std::io::BufRead;

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Well-known keys and defaults
// ---------------------------------------------------------------------------

/// Attribute key carrying the name of a trace or event.
pub const CONCEPT_NAME_KEY: &str = "concept:name";

/// Attribute key carrying the timestamp of an event.
pub const TIME_TIMESTAMP_KEY: &str = "time:timestamp";

/// Name given to a trace without a `concept:name` string attribute.
pub const DEFAULT_TRACE_NAME: &str = "Unnamed Process";

/// Name given to an event without a `concept:name` string attribute.
pub const DEFAULT_EVENT_NAME: &str = "Unnamed Event";

const TRACE_TAG: &[u8] = b"trace";
const EVENT_TAG: &[u8] = b"event";
const STRING_TAG: &[u8] = b"string";
const DATE_TAG: &[u8] = b"date";

/// Fallback layouts for timestamps without an RFC 3339 offset. Interpreted as UTC.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// One case of a process: a named, ordered sequence of events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    /// Events in document order (not timestamp order).
    pub events: Vec<Event>,
}

/// A single event inside a trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub name: String,
    /// `None` when the event has no `time:timestamp` date or it failed to parse.
    pub timestamp: Option<Timestamp>,
    /// Every keyed child element of the event, including `concept:name` and
    /// `time:timestamp`. A repeated key keeps its first position and its
    /// last value.
    pub attributes: IndexMap<String, String>,
}

impl Trace {
    fn unnamed() -> Self {
        Self {
            name: DEFAULT_TRACE_NAME.to_string(),
            events: Vec::new(),
        }
    }
}

impl Event {
    fn unnamed() -> Self {
        Self {
            name: DEFAULT_EVENT_NAME.to_string(),
            timestamp: None,
            attributes: IndexMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a complete XES document from an in-memory buffer.
pub fn parse_xes_bytes(bytes: &[u8]) -> Result<Vec<Trace>, CoreError> {
    parse_xes(bytes)
}

/// Parse a complete XES document from a buffered reader.
///
/// Returns the traces in document order, each with its events in document
/// order. Fails with [`CoreError::MalformedLog`] when the input is not
/// well-formed XML (syntax errors, mismatched or unclosed tags, undeclared
/// namespace prefixes, no root element, or content outside the root element).
pub fn parse_xes<R: BufRead>(reader: R) -> Result<Vec<Trace>, CoreError> {
    let mut reader = NsReader::from_reader(reader);
    let mut parser = LogParser::default();
    let mut buf = Vec::new();

    loop {
        let (ns, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| CoreError::MalformedLog(e.to_string()))?;

        match event {
            XmlEvent::Start(ref e) => {
                let ns = element_namespace(&ns)?;
                parser.open(ns, e)?;
            }
            XmlEvent::Empty(ref e) => {
                let ns = element_namespace(&ns)?;
                parser.open(ns, e)?;
                parser.close();
            }
            XmlEvent::End(_) => parser.close(),
            XmlEvent::Text(ref t) if parser.depth == 0 && !is_blank(t) => {
                return Err(CoreError::MalformedLog(
                    "Text content outside the root element".to_string(),
                ));
            }
            XmlEvent::CData(_) if parser.depth == 0 => {
                return Err(CoreError::MalformedLog(
                    "CDATA section outside the root element".to_string(),
                ));
            }
            XmlEvent::Eof => break,
            // Text inside the root, comments, declarations and processing
            // instructions carry nothing the log model needs.
            _ => {}
        }
        buf.clear();
    }

    parser.finish()
}

/// Parse an XES timestamp value.
///
/// Accepts RFC 3339 (the format XES mandates), offsets without a colon, and
/// offset-less date-times which are taken as UTC. Returns `None` for
/// anything else.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Streaming state machine
// ---------------------------------------------------------------------------

/// An open trace: the element depth it was opened at and its slot in the
/// output list. Slots are taken at the start tag so nested traces keep
/// document order.
struct OpenTrace {
    depth: usize,
    slot: usize,
    name_resolved: bool,
}

/// An open event together with the element depth it was opened at.
struct OpenEvent {
    depth: usize,
    event: Event,
    name_resolved: bool,
    timestamp_resolved: bool,
}

#[derive(Default)]
struct LogParser {
    /// Number of currently open elements.
    depth: usize,
    /// Namespace of the root element. `None` is the empty namespace.
    root_ns: Option<Option<Vec<u8>>>,
    /// Open traces, innermost last.
    open_traces: Vec<OpenTrace>,
    /// Open events, innermost last. Each belongs to the innermost trace that
    /// was open when it started.
    open_events: Vec<OpenEvent>,
    traces: Vec<Trace>,
}

impl LogParser {
    fn open(&mut self, ns: Option<&[u8]>, e: &BytesStart<'_>) -> Result<(), CoreError> {
        if self.depth == 0 && self.root_ns.is_some() {
            return Err(CoreError::MalformedLog(
                "Document has more than one root element".to_string(),
            ));
        }
        self.depth += 1;
        let depth = self.depth;

        let root_ns = self
            .root_ns
            .get_or_insert_with(|| ns.map(<[u8]>::to_vec))
            .as_deref();
        let in_log_ns = ns == root_ns;
        let local = e.local_name();
        let local = local.as_ref();

        if let Some(open) = self.open_events.last_mut() {
            if depth == open.depth + 1 {
                let (key, value) = key_value(e)?;
                collect_event_child(open, in_log_ns, local, key, value);
            }
        }

        if !in_log_ns {
            return Ok(());
        }

        if depth > 1 && local == TRACE_TAG {
            self.open_traces.push(OpenTrace {
                depth,
                slot: self.traces.len(),
                name_resolved: false,
            });
            self.traces.push(Trace::unnamed());
            return Ok(());
        }

        let Some(open) = self.open_traces.last_mut() else {
            return Ok(());
        };
        if depth != open.depth + 1 {
            return Ok(());
        }
        if local == EVENT_TAG {
            self.open_events.push(OpenEvent {
                depth,
                event: Event::unnamed(),
                name_resolved: false,
                timestamp_resolved: false,
            });
        } else if local == STRING_TAG && !open.name_resolved {
            let (key, value) = key_value(e)?;
            if key.as_deref() == Some(CONCEPT_NAME_KEY) {
                open.name_resolved = true;
                if let Some(value) = value {
                    self.traces[open.slot].name = value;
                }
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        let depth = self.depth;
        self.depth = self.depth.saturating_sub(1);

        if self.open_events.last().is_some_and(|open| open.depth == depth) {
            if let (Some(open), Some(trace)) = (self.open_events.pop(), self.open_traces.last()) {
                self.traces[trace.slot].events.push(open.event);
            }
            return;
        }

        if self.open_traces.last().is_some_and(|open| open.depth == depth) {
            self.open_traces.pop();
        }
    }

    fn finish(self) -> Result<Vec<Trace>, CoreError> {
        if self.root_ns.is_none() {
            return Err(CoreError::MalformedLog(
                "Document has no root element".to_string(),
            ));
        }
        if self.depth != 0 {
            return Err(CoreError::MalformedLog(format!(
                "Unexpected end of document: {} element(s) left unclosed",
                self.depth
            )));
        }
        Ok(self.traces)
    }
}

/// Apply one direct child element of an event: record it as an attribute and
/// use it for the event's name or timestamp when it is the first match.
fn collect_event_child(
    open: &mut OpenEvent,
    in_log_ns: bool,
    local: &[u8],
    key: Option<String>,
    value: Option<String>,
) {
    let Some(key) = key else { return };

    if in_log_ns && local == STRING_TAG && key == CONCEPT_NAME_KEY && !open.name_resolved {
        open.name_resolved = true;
        if let Some(ref value) = value {
            open.event.name = value.clone();
        }
    }
    if in_log_ns && local == DATE_TAG && key == TIME_TIMESTAMP_KEY && !open.timestamp_resolved {
        open.timestamp_resolved = true;
        open.event.timestamp = value.as_deref().and_then(parse_timestamp);
    }

    if let Some(value) = value {
        open.event.attributes.insert(key, value);
    }
}

/// Read the unescaped `key` and `value` attributes of an element.
fn key_value(e: &BytesStart<'_>) -> Result<(Option<String>, Option<String>), CoreError> {
    let mut key = None;
    let mut value = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|err| CoreError::MalformedLog(err.to_string()))?;
        let slot = match attr.key.as_ref() {
            b"key" => &mut key,
            b"value" => &mut value,
            _ => continue,
        };
        let text = attr
            .unescape_value()
            .map_err(|err| CoreError::MalformedLog(err.to_string()))?;
        *slot = Some(text.into_owned());
    }
    Ok((key, value))
}

/// Whitespace-only text, allowing a leading UTF-8 byte order mark.
fn is_blank(text: &[u8]) -> bool {
    text.strip_prefix(b"\xEF\xBB\xBF")
        .unwrap_or(text)
        .iter()
        .all(u8::is_ascii_whitespace)
}

/// Map a resolved element namespace to `None` (empty namespace) or its URI.
fn element_namespace<'a>(ns: &'a ResolveResult<'_>) -> Result<Option<&'a [u8]>, CoreError> {
    match ns {
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Bound(ns) => Ok(Some(ns.as_ref())),
        ResolveResult::Unknown(prefix) => Err(CoreError::MalformedLog(format!(
            "Undeclared namespace prefix '{}'",
            String::from_utf8_lossy(prefix)
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
