//! Host-owned registry of live graphs, keyed by container id.
//!
//! A presentation typically carries several graphs, one per slide; the host
//! constructs them all up front and drives the one on the visible slide. The
//! registry makes that ownership explicit: graphs live here, and lookups go
//! through the container id.

use anyhow::Result;
use indexmap::IndexMap;

use crate::document::GraphDocument;
use crate::graph::{Graph, GraphParams};
use crate::render::Surface;

#[derive(Default)]
pub struct GraphRegistry<S: Surface> {
    graphs: IndexMap<String, Graph<S>>,
}

impl<S: Surface> GraphRegistry<S> {
    pub fn new() -> Self {
        Self {
            graphs: IndexMap::new(),
        }
    }

    /// Construct a graph, draw its initial state and register it under its
    /// container id. A second initialization for the same container is
    /// skipped with a warning, keeping the first graph intact.
    pub fn initialize(
        &mut self,
        params: GraphParams,
        document: GraphDocument,
        surface: S,
    ) -> Result<()> {
        let container = params.container_id.clone();
        if self.graphs.contains_key(&container) {
            eprintln!("[gitslides] Warning: a graph exists for container ID {container}: skipping.");
            return Ok(());
        }
        let mut graph = Graph::new(params, document, surface)?;
        graph.draw();
        self.graphs.insert(container, graph);
        Ok(())
    }

    pub fn get(&self, container_id: &str) -> Option<&Graph<S>> {
        self.graphs.get(container_id)
    }

    pub fn get_mut(&mut self, container_id: &str) -> Option<&mut Graph<S>> {
        self.graphs.get_mut(container_id)
    }

    pub fn remove(&mut self, container_id: &str) -> Option<Graph<S>> {
        self.graphs.shift_remove(container_id)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Container ids in registration order.
    pub fn container_ids(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }
}
