//! Pipeline graph state container.
//!
//! Owns the node and edge collections and is the single writer for
//! them. The editor reads snapshots and mutates only through the
//! operations here; field edits in particular always land via
//! [`PipelineGraph::update_node_field`].

use crate::node_types::NodeKind;
use std::collections::HashMap;

/// One placed, user-editable node.
#[derive(Clone, Debug)]
pub struct NodeInstance {
    pub id: String,
    /// Wire type id; resolved against the registry at render time.
    pub type_id: String,
    /// Graph-space position of the block's top-left corner.
    pub position: (f32, f32),
    /// Current field values. Absent keys resolve to the field's
    /// declared default.
    pub data: HashMap<String, String>,
}

impl NodeInstance {
    pub fn new(id: String, kind: NodeKind, position: (f32, f32)) -> Self {
        Self {
            id,
            type_id: kind.type_id().to_string(),
            position,
            data: HashMap::new(),
        }
    }
}

/// One connection. Handles carry the `{nodeId}-{portId}` form so they
/// are unambiguous across the whole graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_handle: String,
    pub target_handle: String,
}

#[derive(Clone, Debug, Default)]
pub struct PipelineGraph {
    pub nodes: Vec<NodeInstance>,
    pub edges: Vec<Edge>,
    /// Per-type counters backing `next_node_id`. Counters never reset,
    /// so ids stay fresh even after deletions.
    id_counts: HashMap<&'static str, u32>,
    edge_seq: u32,
}

impl PipelineGraph {
    /// Fresh unique id for a node of the given kind, e.g. `text-1`.
    pub fn next_node_id(&mut self, kind: NodeKind) -> String {
        let count = self.id_counts.entry(kind.type_id()).or_insert(0);
        *count += 1;
        format!("{}-{}", kind.type_id(), count)
    }

    pub fn add_node(&mut self, node: NodeInstance) {
        log::info!("add node {} ({})", node.id, node.type_id);
        self.nodes.push(node);
    }

    pub fn node(&self, id: &str) -> Option<&NodeInstance> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Removes a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) {
        self.nodes.retain(|n| n.id != id);
        self.edges.retain(|e| e.source != id && e.target != id);
        log::info!("removed node {id}");
    }

    /// The one mutation the node renderer issues. Unknown node ids are
    /// logged and dropped; the renderer only ever names nodes it was
    /// handed, so this indicates a stale edit.
    pub fn update_node_field(&mut self, node_id: &str, field: &str, value: &str) {
        match self.nodes.iter_mut().find(|n| n.id == node_id) {
            Some(node) => {
                node.data.insert(field.to_string(), value.to_string());
            }
            None => log::warn!("update_node_field: no node {node_id}"),
        }
    }

    /// Creates an edge between an output handle and an input handle.
    /// Rejects endpoints that don't exist, self-loops, and exact
    /// duplicates. Returns whether an edge was added.
    pub fn connect(
        &mut self,
        source: &str,
        source_handle: &str,
        target: &str,
        target_handle: &str,
    ) -> bool {
        if source == target {
            log::warn!("rejected self-loop on {source}");
            return false;
        }
        if self.node(source).is_none() || self.node(target).is_none() {
            log::warn!("rejected edge with missing endpoint {source} -> {target}");
            return false;
        }
        let duplicate = self.edges.iter().any(|e| {
            e.source_handle == source_handle && e.target_handle == target_handle
        });
        if duplicate {
            return false;
        }

        self.edge_seq += 1;
        let edge = Edge {
            id: format!("e{}", self.edge_seq),
            source: source.to_string(),
            target: target.to_string(),
            source_handle: source_handle.to_string(),
            target_handle: target_handle.to_string(),
        };
        log::info!("connect {} -> {}", edge.source_handle, edge.target_handle);
        self.edges.push(edge);
        true
    }

    pub fn remove_edge(&mut self, edge_id: &str) {
        self.edges.retain(|e| e.id != edge_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_types::NodeKind;

    fn graph_with(kinds: &[NodeKind]) -> PipelineGraph {
        let mut graph = PipelineGraph::default();
        for &kind in kinds {
            let id = graph.next_node_id(kind);
            graph.add_node(NodeInstance::new(id, kind, (0.0, 0.0)));
        }
        graph
    }

    #[test]
    fn node_ids_count_per_type() {
        let mut graph = PipelineGraph::default();
        assert_eq!(graph.next_node_id(NodeKind::Text), "text-1");
        assert_eq!(graph.next_node_id(NodeKind::Text), "text-2");
        assert_eq!(graph.next_node_id(NodeKind::Math), "math-1");
        // Counters survive removals so ids are never reused.
        let id = graph.next_node_id(NodeKind::Text);
        graph.add_node(NodeInstance::new(id.clone(), NodeKind::Text, (0.0, 0.0)));
        graph.remove_node(&id);
        assert_eq!(graph.next_node_id(NodeKind::Text), "text-4");
    }

    #[test]
    fn field_updates_land_on_the_named_node() {
        let mut graph = graph_with(&[NodeKind::Text, NodeKind::Text]);
        graph.update_node_field("text-1", "text", "hello");
        assert_eq!(graph.node("text-1").unwrap().data["text"], "hello");
        assert!(graph.node("text-2").unwrap().data.is_empty());

        // Unknown target is a no-op, not a panic.
        graph.update_node_field("text-99", "text", "x");
    }

    #[test]
    fn connect_validates_endpoints() {
        let mut graph = graph_with(&[NodeKind::Input, NodeKind::Llm]);
        assert!(graph.connect(
            "customInput-1",
            "customInput-1-value",
            "llm-1",
            "llm-1-prompt"
        ));
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].id, "e1");

        // Duplicate, self-loop and missing endpoint are all rejected.
        assert!(!graph.connect(
            "customInput-1",
            "customInput-1-value",
            "llm-1",
            "llm-1-prompt"
        ));
        assert!(!graph.connect("llm-1", "llm-1-response", "llm-1", "llm-1-system"));
        assert!(!graph.connect("ghost-1", "ghost-1-out", "llm-1", "llm-1-system"));
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn removing_a_node_drops_incident_edges() {
        let mut graph = graph_with(&[NodeKind::Input, NodeKind::Llm, NodeKind::Output]);
        graph.connect("customInput-1", "customInput-1-value", "llm-1", "llm-1-prompt");
        graph.connect("llm-1", "llm-1-response", "customOutput-1", "customOutput-1-value");
        assert_eq!(graph.edges.len(), 2);

        graph.remove_node("llm-1");
        assert!(graph.edges.is_empty());
        assert_eq!(graph.nodes.len(), 2);
    }
}
