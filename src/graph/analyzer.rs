use crate::graph::node::{GraphNode, NodeKind, Ports, RenderCtx};

/// Waveform tap on the master output.
///
/// Keeps the most recent `size` samples in a ring. It passes its input
/// through but nothing is wired downstream of it; the visualizer reads
/// snapshots instead.
pub struct AnalyzerNode {
    ring: Vec<f32>,
    write_pos: usize,
}

impl AnalyzerNode {
    pub fn new(size: usize) -> Self {
        Self {
            ring: vec![0.0; size.max(1)],
            write_pos: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.ring.len()
    }

    /// Copy the ring into `out`, oldest sample first.
    pub fn snapshot_into(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend_from_slice(&self.ring[self.write_pos..]);
        out.extend_from_slice(&self.ring[..self.write_pos]);
    }

    pub fn snapshot(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.ring.len());
        self.snapshot_into(&mut out);
        out
    }
}

impl GraphNode for AnalyzerNode {
    const KIND: NodeKind = NodeKind::Analyzer;

    #[inline]
    fn process(&mut self, ports: Ports, _ctx: &RenderCtx) -> f32 {
        self.ring[self.write_pos] = ports.input;
        self.write_pos = (self.write_pos + 1) % self.ring.len();
        ports.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_chronological() {
        let ctx = RenderCtx::new(48_000.0);
        let mut analyzer = AnalyzerNode::new(4);
        for i in 0..6 {
            analyzer.process(
                Ports {
                    input: i as f32,
                    ..Ports::default()
                },
                &ctx,
            );
        }
        assert_eq!(analyzer.snapshot(), vec![2.0, 3.0, 4.0, 5.0]);
    }
}
