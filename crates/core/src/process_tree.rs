//! Process tree derivation and the visualization payload.
//!
//! A stored event log is presented as a three-level hierarchy:
//! file -> processes (one per trace) -> events. The repository layer loads
//! the rows; this module orders them and derives the generic
//! `{ id, text, children }` node forest handed to the rendering layer.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Layout of event timestamps inside node labels.
pub const LABEL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Label suffix for events whose log carried no usable timestamp.
pub const NO_TIMESTAMP_LABEL: &str = "no timestamp";

// ---------------------------------------------------------------------------
// Typed tree
// ---------------------------------------------------------------------------

/// A stored event as it appears in the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventNode {
    pub id: DbId,
    pub name: String,
    /// `None` when the source log had no parseable timestamp for the event.
    pub timestamp: Option<Timestamp>,
}

/// A stored process (one trace of the uploaded log) and its events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessNode {
    pub id: DbId,
    pub name: String,
    /// Events ordered by timestamp ascending.
    pub events: Vec<EventNode>,
}

/// The full hierarchy rebuilt for one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessTree {
    pub file_id: DbId,
    /// `None` when no file with `file_id` exists.
    pub filename: Option<String>,
    pub processes: Vec<ProcessNode>,
}

/// Generic node of the visualization payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualNode {
    pub id: String,
    pub text: String,
    pub children: Vec<VisualNode>,
}

/// Typed tree plus its serialized visualization, derived in one pass.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessTreeView {
    pub tree: ProcessTree,
    /// JSON array of [`VisualNode`]s, one per process.
    pub visualization: String,
}

impl ProcessNode {
    /// Order events by timestamp ascending, then by id.
    ///
    /// Events without a timestamp sort before every timestamped event,
    /// including ones earlier than 1970. Storage orders by `has_timestamp`
    /// first to agree.
    pub fn sort_events(&mut self) {
        self.events
            .sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
    }
}

impl ProcessTree {
    /// An empty tree for a file that does not exist or has no processes.
    pub fn empty(file_id: DbId) -> Self {
        Self {
            file_id,
            filename: None,
            processes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Total number of events across all processes.
    pub fn event_count(&self) -> usize {
        self.processes.iter().map(|p| p.events.len()).sum()
    }

    /// Derive the visualization forest: one node per process, one child per event.
    pub fn to_visual_nodes(&self) -> Vec<VisualNode> {
        self.processes
            .iter()
            .map(|process| VisualNode {
                id: format!("process-{}", process.id),
                text: process.name.clone(),
                children: process
                    .events
                    .iter()
                    .map(|event| VisualNode {
                        id: format!("event-{}", event.id),
                        text: event_label(&event.name, event.timestamp),
                        children: Vec::new(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Serialize the visualization forest to JSON text.
    pub fn visualization_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(&self.to_visual_nodes())
            .map_err(|e| CoreError::Internal(format!("Failed to serialize visualization: {e}")))
    }

    /// Sort every process's events and pair the tree with its visualization.
    pub fn into_view(mut self) -> Result<ProcessTreeView, CoreError> {
        for process in &mut self.processes {
            process.sort_events();
        }
        let visualization = self.visualization_json()?;
        Ok(ProcessTreeView {
            tree: self,
            visualization,
        })
    }
}

/// Display text of an event node, e.g. `"Created (2024-01-01 10:00:00)"`.
pub fn event_label(name: &str, timestamp: Option<Timestamp>) -> String {
    match timestamp {
        Some(ts) => format!("{name} ({})", ts.format(LABEL_TIMESTAMP_FORMAT)),
        None => format!("{name} ({NO_TIMESTAMP_LABEL})"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn at(d: u32, h: u32) -> Option<Timestamp> {
        Some(Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap())
    }

    fn event(id: DbId, name: &str, timestamp: Option<Timestamp>) -> EventNode {
        EventNode {
            id,
            name: name.to_string(),
            timestamp,
        }
    }

    fn order_tree() -> ProcessTree {
        ProcessTree {
            file_id: 1,
            filename: Some("orders.xes".to_string()),
            processes: vec![ProcessNode {
                id: 7,
                name: "Order-1".to_string(),
                events: vec![event(11, "Shipped", at(2, 9)), event(12, "Created", at(1, 10))],
            }],
        }
    }

    #[test]
    fn label_includes_formatted_timestamp() {
        assert_eq!(event_label("Created", at(1, 10)), "Created (2024-01-01 10:00:00)");
    }

    #[test]
    fn label_marks_missing_timestamp() {
        assert_eq!(event_label("Created", None), "Created (no timestamp)");
    }

    #[test]
    fn events_sort_by_timestamp_then_id() {
        let mut process = ProcessNode {
            id: 1,
            name: "p".to_string(),
            events: vec![
                event(3, "c", at(2, 0)),
                event(2, "b", at(1, 0)),
                event(1, "a", at(2, 0)),
                event(4, "none", None),
            ],
        };
        process.sort_events();
        let ids: Vec<_> = process.events.iter().map(|e| e.id).collect();
        assert_eq!(ids, [4, 2, 1, 3]);
    }

    #[test]
    fn view_orders_tree_and_visualization_alike() {
        let view = order_tree().into_view().unwrap();

        let names: Vec<_> = view.tree.processes[0]
            .events
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, ["Created", "Shipped"]);

        let nodes: serde_json::Value = serde_json::from_str(&view.visualization).unwrap();
        assert_eq!(nodes[0]["id"], "process-7");
        assert_eq!(nodes[0]["text"], "Order-1");
        assert_eq!(nodes[0]["children"][0]["id"], "event-12");
        assert_eq!(nodes[0]["children"][0]["text"], "Created (2024-01-01 10:00:00)");
        assert_eq!(nodes[0]["children"][1]["text"], "Shipped (2024-01-02 09:00:00)");
        assert_eq!(nodes[0]["children"][1]["children"], serde_json::json!([]));
    }

    #[test]
    fn empty_tree_serializes_to_empty_array() {
        let view = ProcessTree::empty(99).into_view().unwrap();
        assert!(view.tree.is_empty());
        assert_eq!(view.tree.event_count(), 0);
        assert_eq!(view.visualization, "[]");
    }
}
