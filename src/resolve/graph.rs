//! Reference Graph
//!
//! Builds the full `subject@version` reference graph of a schema with
//! petgraph, for tooling that wants to inspect or order dependencies up front
//! instead of resolving them on the fly. Unlike the resolvers, building the
//! graph does not fail on cycles; they are recorded and reported by
//! [`ReferenceGraph::resolution_order`].

use std::collections::HashMap;

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use super::ReferenceKey;
use crate::client::SchemaRegistryClient;
use crate::error::{Result, SerdeError};
use crate::schema::SchemaInfo;

/// A schema in the reference graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    pub subject: String,
    pub version: i32,
    /// Registry ID, `None` for the unregistered root
    pub id: Option<u32>,
}

impl SchemaNode {
    pub fn is_root(&self) -> bool {
        self.id.is_none() && self.subject.is_empty()
    }

    pub fn label(&self) -> String {
        if self.is_root() {
            "<root>".to_string()
        } else {
            format!("{}@{}", self.subject, self.version)
        }
    }
}

/// Directed graph with an edge from each schema to each schema it references.
/// Edge weights are the reference names.
pub struct ReferenceGraph {
    graph: DiGraph<SchemaNode, String>,
    node_map: HashMap<ReferenceKey, NodeIndex>,
    root: NodeIndex,
}

impl ReferenceGraph {
    /// Fetch every schema reachable from `schema`
    pub fn build(client: &dyn SchemaRegistryClient, schema: &SchemaInfo) -> Result<Self> {
        let mut graph = DiGraph::new();
        let root = graph.add_node(SchemaNode {
            subject: String::new(),
            version: 0,
            id: None,
        });
        let mut this = Self {
            graph,
            node_map: HashMap::new(),
            root,
        };

        let mut pending = vec![(root, schema.clone())];
        while let Some((from, info)) = pending.pop() {
            for reference in &info.references {
                let key = (reference.subject.clone(), reference.version);
                let to = match this.node_map.get(&key) {
                    Some(&idx) => idx,
                    None => {
                        let metadata =
                            client.get_schema_metadata(&reference.subject, reference.version)?;
                        let idx = this.graph.add_node(SchemaNode {
                            subject: metadata.subject.clone(),
                            version: metadata.version,
                            id: Some(metadata.id),
                        });
                        this.node_map.insert(key, idx);
                        pending.push((idx, metadata.into_info()));
                        idx
                    }
                };
                this.graph.add_edge(from, to, reference.name.clone());
            }
        }

        Ok(this)
    }

    pub fn root(&self) -> &SchemaNode {
        &self.graph[self.root]
    }

    /// Number of referenced schemas, excluding the root
    pub fn dependency_count(&self) -> usize {
        self.node_map.len()
    }

    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    pub fn node(&self, subject: &str, version: i32) -> Option<&SchemaNode> {
        self.node_map
            .get(&(subject.to_string(), version))
            .map(|&idx| &self.graph[idx])
    }

    /// Schemas that directly reference `subject@version`
    pub fn dependents(&self, subject: &str, version: i32) -> Vec<&SchemaNode> {
        self.neighbors(subject, version, Direction::Incoming)
    }

    /// Schemas `subject@version` directly references
    pub fn dependencies(&self, subject: &str, version: i32) -> Vec<&SchemaNode> {
        self.neighbors(subject, version, Direction::Outgoing)
    }

    fn neighbors(&self, subject: &str, version: i32, direction: Direction) -> Vec<&SchemaNode> {
        match self.node_map.get(&(subject.to_string(), version)) {
            Some(&idx) => self
                .graph
                .neighbors_directed(idx, direction)
                .map(|n| &self.graph[n])
                .collect(),
            None => Vec::new(),
        }
    }

    /// All schemas, dependencies before dependents, root last
    pub fn resolution_order(&self) -> Result<Vec<&SchemaNode>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            let node = &self.graph[cycle.node_id()];
            SerdeError::CyclicReference {
                subject: node.subject.clone(),
                version: node.version,
            }
        })?;
        Ok(sorted.into_iter().rev().map(|idx| &self.graph[idx]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockSchemaRegistryClient;
    use crate::schema::{SchemaReference, SchemaType};

    fn json(title: &str, refs: Vec<SchemaReference>) -> SchemaInfo {
        SchemaInfo::new(format!(r#"{{"title":"{}"}}"#, title), SchemaType::Json).with_references(refs)
    }

    #[test]
    fn test_diamond_graph_order() {
        let client = MockSchemaRegistryClient::new();
        client.register("c", &json("C", vec![]), false).unwrap();
        client
            .register("a", &json("A", vec![SchemaReference::new("C", "c", 1)]), false)
            .unwrap();
        client
            .register("b", &json("B", vec![SchemaReference::new("C", "c", 1)]), false)
            .unwrap();
        let root = json(
            "Root",
            vec![SchemaReference::new("A", "a", 1), SchemaReference::new("B", "b", 1)],
        );

        let graph = ReferenceGraph::build(&client, &root).unwrap();
        assert_eq!(graph.dependency_count(), 3);
        assert!(!graph.has_cycle());
        assert_eq!(client.call_count("get_schema_metadata"), 3);

        let order: Vec<String> = graph
            .resolution_order()
            .unwrap()
            .into_iter()
            .map(SchemaNode::label)
            .collect();
        assert_eq!(order.first().map(String::as_str), Some("c@1"));
        assert_eq!(order.last().map(String::as_str), Some("<root>"));
        assert_eq!(graph.dependents("c", 1).len(), 2);
        assert_eq!(graph.dependencies("a", 1)[0].subject, "c");
    }

    #[test]
    fn test_cycle_is_recorded_then_reported() {
        let client = MockSchemaRegistryClient::new();
        client
            .register("a", &json("A", vec![SchemaReference::new("B", "b", 1)]), false)
            .unwrap();
        client
            .register("b", &json("B", vec![SchemaReference::new("A", "a", 1)]), false)
            .unwrap();
        let root = json("Root", vec![SchemaReference::new("A", "a", 1)]);

        let graph = ReferenceGraph::build(&client, &root).unwrap();
        assert!(graph.has_cycle());
        assert!(matches!(
            graph.resolution_order(),
            Err(SerdeError::CyclicReference { .. })
        ));
    }

    #[test]
    fn test_no_references() {
        let client = MockSchemaRegistryClient::new();
        let graph = ReferenceGraph::build(&client, &json("Root", vec![])).unwrap();
        assert_eq!(graph.dependency_count(), 0);
        assert!(graph.root().is_root());
        assert!(graph.node("a", 1).is_none());
    }
}
