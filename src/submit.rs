//! Pipeline submission: serializes the graph into the wire format the
//! analysis endpoint expects, posts it off-thread, and reports the
//! verdict back over a channel the UI polls.

use crate::graph::PipelineGraph;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver};

#[derive(Serialize, Debug, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Serialize, Debug)]
pub struct RequestNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub position: Position,
    pub data: std::collections::HashMap<String, String>,
}

#[derive(Serialize, Debug)]
pub struct RequestEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "sourceHandle")]
    pub source_handle: String,
    #[serde(rename = "targetHandle")]
    pub target_handle: String,
}

#[derive(Serialize, Debug)]
pub struct PipelineRequest {
    pub nodes: Vec<RequestNode>,
    pub edges: Vec<RequestEdge>,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct AnalysisResponse {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub is_dag: bool,
}

/// Outcome of one submission, delivered once per request.
#[derive(Debug)]
pub enum SubmitEvent {
    Verdict(String),
    Failed(String),
}

pub fn build_request(graph: &PipelineGraph) -> PipelineRequest {
    PipelineRequest {
        nodes: graph
            .nodes
            .iter()
            .map(|n| RequestNode {
                id: n.id.clone(),
                node_type: n.type_id.clone(),
                position: Position {
                    x: n.position.0,
                    y: n.position.1,
                },
                data: n.data.clone(),
            })
            .collect(),
        edges: graph
            .edges
            .iter()
            .map(|e| RequestEdge {
                id: e.id.clone(),
                source: e.source.clone(),
                target: e.target.clone(),
                source_handle: e.source_handle.clone(),
                target_handle: e.target_handle.clone(),
            })
            .collect(),
    }
}

pub fn parse_response(status: u16, body: &[u8]) -> Result<AnalysisResponse> {
    if !(200..300).contains(&status) {
        bail!("endpoint returned HTTP {status}");
    }
    serde_json::from_slice(body).context("malformed analysis response")
}

pub fn format_verdict(analysis: &AnalysisResponse) -> String {
    format!(
        "Pipeline: {} nodes, {} edges, {}",
        analysis.num_nodes,
        analysis.num_edges,
        if analysis.is_dag {
            "valid DAG"
        } else {
            "contains a cycle"
        }
    )
}

/// Fires the request and returns a receiver that yields exactly one
/// [`SubmitEvent`]. The UI keeps drawing while the request is in
/// flight.
pub fn submit(endpoint: &str, graph: &PipelineGraph) -> Result<Receiver<SubmitEvent>> {
    let body = serde_json::to_vec(&build_request(graph)).context("serializing pipeline")?;
    let mut request = ehttp::Request::post(endpoint, body);
    request
        .headers
        .insert("Content-Type", "application/json");

    let (tx, rx) = mpsc::channel();
    ehttp::fetch(request, move |result: ehttp::Result<ehttp::Response>| {
        let event = match result {
            Ok(response) => match parse_response(response.status, &response.bytes) {
                Ok(analysis) => SubmitEvent::Verdict(format_verdict(&analysis)),
                Err(err) => SubmitEvent::Failed(format!("{err:#}")),
            },
            Err(err) => SubmitEvent::Failed(format!("request failed: {err}")),
        };
        // The UI may have been closed while the request was in flight.
        let _ = tx.send(event);
    });
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeInstance;
    use crate::node_types::NodeKind;
    use serde_json::json;

    fn sample_graph() -> PipelineGraph {
        let mut graph = PipelineGraph::default();
        let a = graph.next_node_id(NodeKind::Input);
        graph.add_node(NodeInstance::new(a.clone(), NodeKind::Input, (10.0, 20.0)));
        let b = graph.next_node_id(NodeKind::Output);
        graph.add_node(NodeInstance::new(b.clone(), NodeKind::Output, (300.0, 20.0)));
        assert!(graph.connect(
            &a,
            &format!("{a}-value"),
            &b,
            &format!("{b}-value"),
        ));
        graph
    }

    #[test]
    fn request_uses_wire_field_names() {
        let graph = sample_graph();
        let value = serde_json::to_value(build_request(&graph)).unwrap();
        assert_eq!(value["nodes"][0]["id"], "customInput-1");
        assert_eq!(value["nodes"][0]["type"], "customInput");
        assert_eq!(value["nodes"][0]["position"]["x"], 10.0);
        assert_eq!(value["edges"][0]["sourceHandle"], "customInput-1-value");
        assert_eq!(value["edges"][0]["targetHandle"], "customOutput-1-value");
        // camelCase only; the snake_case field names must not leak.
        assert!(value["edges"][0].get("source_handle").is_none());
    }

    #[test]
    fn empty_graph_serializes_to_empty_arrays() {
        let value = serde_json::to_value(build_request(&PipelineGraph::default())).unwrap();
        assert_eq!(value, json!({ "nodes": [], "edges": [] }));
    }

    #[test]
    fn verdict_reflects_the_analysis() {
        let body = json!({ "num_nodes": 3, "num_edges": 2, "is_dag": true });
        let analysis = parse_response(200, body.to_string().as_bytes()).unwrap();
        assert_eq!(
            format_verdict(&analysis),
            "Pipeline: 3 nodes, 2 edges, valid DAG"
        );

        let cyclic = AnalysisResponse {
            num_nodes: 2,
            num_edges: 2,
            is_dag: false,
        };
        assert_eq!(
            format_verdict(&cyclic),
            "Pipeline: 2 nodes, 2 edges, contains a cycle"
        );
    }

    #[test]
    fn http_errors_and_bad_bodies_are_reported() {
        assert!(parse_response(500, b"{}").is_err());
        assert!(parse_response(200, b"not json").is_err());
        // Missing fields are malformed too.
        assert!(parse_response(200, br#"{"num_nodes": 1}"#).is_err());
    }
}
