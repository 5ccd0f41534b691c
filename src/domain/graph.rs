//! Attachment graph for components
//!
//! Edges run parent -> child, so a topological order lists every parent
//! before the components hanging off it. Uses petgraph for graph operations.

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::component::Component;
use super::id::ComponentId;

/// Parent/child relationships between the components of one configuration
#[derive(Debug, Default)]
pub struct AttachmentGraph {
    /// The underlying directed graph
    graph: DiGraph<ComponentId, ()>,

    /// Map from ComponentId to node index
    node_map: HashMap<ComponentId, NodeIndex>,

    /// Insertion order, used when no topological order exists
    insertion: Vec<ComponentId>,
}

impl AttachmentGraph {
    /// Builds a graph from a configuration's components
    ///
    /// Attachments to IDs outside the slice are dangling and get no edge.
    pub fn from_components<'a>(components: impl IntoIterator<Item = &'a Component>) -> Self {
        let mut graph = Self::default();

        let components: Vec<_> = components.into_iter().collect();
        for component in &components {
            graph.add_component(component.id.clone());
        }

        for component in &components {
            if let Some(parent) = component.attached_to() {
                if let (Some(&p), Some(&c)) =
                    (graph.node_map.get(parent), graph.node_map.get(&component.id))
                {
                    graph.graph.add_edge(p, c, ());
                }
            }
        }

        graph
    }

    fn add_component(&mut self, id: ComponentId) {
        if !self.node_map.contains_key(&id) {
            let idx = self.graph.add_node(id.clone());
            self.node_map.insert(id.clone(), idx);
            self.insertion.push(id);
        }
    }

    /// Checks whether attaching `child` to `parent` would loop back
    pub fn would_create_cycle(&self, child: &ComponentId, parent: &ComponentId) -> bool {
        if child == parent {
            return true;
        }
        match (self.node_map.get(child), self.node_map.get(parent)) {
            (Some(&c), Some(&p)) => has_path_connecting(&self.graph, c, p, None),
            _ => false,
        }
    }

    /// Parents before children
    ///
    /// With a cycle there is no such order; falls back to insertion order.
    pub fn resolution_order(&self) -> Vec<ComponentId> {
        match toposort(&self.graph, None) {
            Ok(order) => order
                .into_iter()
                .filter_map(|idx| self.graph.node_weight(idx).cloned())
                .collect(),
            Err(cycle) => {
                tracing::warn!(
                    node = ?self.graph.node_weight(cycle.node_id()),
                    "attachment cycle, resolving in insertion order"
                );
                self.insertion.clone()
            }
        }
    }
}
