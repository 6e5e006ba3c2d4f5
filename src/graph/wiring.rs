//! Patchbay: the edge list of the signal graph.
//!
//! Every edge has exactly one source and lands on one input (a node port or
//! the output destination). A source may feed any number of edges. The
//! patchbay refuses any edge that would close a loop, so the graph is always
//! a DAG.

use crate::error::GraphBuildError;
use crate::graph::node::{NodeId, Port, Ports};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Destination of an edge.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    Node { node: NodeId, port: Port },
    /// The audio output.
    Destination,
}

impl Input {
    pub fn audio(node: NodeId) -> Self {
        Input::Node {
            node,
            port: Port::Input,
        }
    }

    pub fn port(node: NodeId, port: Port) -> Self {
        Input::Node { node, port }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: NodeId,
    pub to: Input,
}

#[derive(Debug, Default)]
pub struct Patchbay {
    edges: Vec<Edge>,
    fanout: Vec<Vec<Input>>,
}

impl Patchbay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge. Connecting an existing edge again is a no-op.
    pub fn connect(&mut self, from: NodeId, to: Input) -> Result<(), GraphBuildError> {
        if let Input::Node { node, .. } = to {
            if node == from || self.reaches(node, from) {
                return Err(GraphBuildError::Cycle { from, to: node });
            }
        }

        let edge = Edge { from, to };
        if self.edges.contains(&edge) {
            return Ok(());
        }

        if self.fanout.len() <= from.index() {
            self.fanout.resize_with(from.index() + 1, Vec::new);
        }
        self.fanout[from.index()].push(to);
        self.edges.push(edge);
        Ok(())
    }

    /// Remove every edge, returning how many there were.
    pub fn disconnect_all(&mut self) -> usize {
        let count = self.edges.len();
        self.edges.clear();
        self.fanout.clear();
        count
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Inputs fed by `from`.
    #[inline]
    pub fn fanout(&self, from: NodeId) -> &[Input] {
        self.fanout.get(from.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_connected(&self, from: NodeId, to: Input) -> bool {
        self.fanout(from).contains(&to)
    }

    /// True when a path of edges leads from `start` to `target`.
    fn reaches(&self, start: NodeId, target: NodeId) -> bool {
        let mut stack = vec![start];
        let mut seen = vec![false; self.fanout.len().max(start.index() + 1)];

        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if std::mem::replace(&mut seen[node.index()], true) {
                continue;
            }
            for input in self.fanout(node) {
                if let Input::Node { node: next, .. } = *input {
                    if next.index() >= seen.len() {
                        seen.resize(next.index() + 1, false);
                    }
                    stack.push(next);
                }
            }
        }
        false
    }
}

/// Per-sample signal accumulator: what each node will read on its ports.
#[derive(Debug, Default)]
pub struct Bus {
    ports: Vec<Ports>,
    destination: f32,
}

impl Bus {
    pub fn new(nodes: usize) -> Self {
        Self {
            ports: vec![Ports::default(); nodes],
            destination: 0.0,
        }
    }

    /// Take (and clear) the values delivered to `node`.
    #[inline]
    pub fn take(&mut self, node: NodeId) -> Ports {
        self.ports
            .get_mut(node.index())
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Deliver `value` from `from` along every edge leaving it.
    #[inline]
    pub fn scatter(&mut self, patchbay: &Patchbay, from: NodeId, value: f32) {
        for input in patchbay.fanout(from) {
            match *input {
                Input::Node { node, port } => {
                    if let Some(ports) = self.ports.get_mut(node.index()) {
                        ports.add(port, value);
                    }
                }
                Input::Destination => self.destination += value,
            }
        }
    }

    /// Take (and clear) what reached the output this sample.
    #[inline]
    pub fn take_destination(&mut self) -> f32 {
        std::mem::take(&mut self.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_delivers_to_every_input() {
        let mut patchbay = Patchbay::new();
        let lfo = NodeId(0);
        let a = NodeId(1);
        let b = NodeId(2);
        patchbay.connect(lfo, Input::audio(a)).unwrap();
        patchbay.connect(lfo, Input::port(b, Port::Cutoff)).unwrap();

        let mut bus = Bus::new(3);
        bus.scatter(&patchbay, lfo, 0.5);

        assert_eq!(bus.take(a).input, 0.5);
        assert_eq!(bus.take(b).cutoff, 0.5);
        assert_eq!(bus.take(a).input, 0.0, "take clears the ports");
    }

    #[test]
    fn cycles_are_rejected() {
        let mut patchbay = Patchbay::new();
        let a = NodeId(0);
        let b = NodeId(1);
        let c = NodeId(2);
        patchbay.connect(a, Input::audio(b)).unwrap();
        patchbay.connect(b, Input::audio(c)).unwrap();

        assert_eq!(
            patchbay.connect(c, Input::audio(a)),
            Err(GraphBuildError::Cycle { from: c, to: a })
        );
        assert!(patchbay.connect(a, Input::audio(a)).is_err());
        assert_eq!(patchbay.len(), 2);
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut patchbay = Patchbay::new();
        patchbay.connect(NodeId(0), Input::Destination).unwrap();
        patchbay.connect(NodeId(0), Input::Destination).unwrap();
        assert_eq!(patchbay.len(), 1);
        assert_eq!(patchbay.disconnect_all(), 1);
        assert!(patchbay.is_empty());
    }
}
