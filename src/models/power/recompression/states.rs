use std::ops::Index;

use crate::support::thermo::Properties;

/// The ten state points of the cycle, in flow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// 1: main compressor inlet.
    McInlet,
    /// 2: main compressor outlet, LT recuperator cold inlet.
    McOutlet,
    /// 3: LT recuperator cold outlet.
    LtColdOutlet,
    /// 4: mixer outlet, HT recuperator cold inlet.
    Mixed,
    /// 5: HT recuperator cold outlet, primary heat exchanger inlet.
    HtColdOutlet,
    /// 6: turbine inlet.
    TurbineInlet,
    /// 7: turbine outlet, HT recuperator hot inlet.
    TurbineOutlet,
    /// 8: HT recuperator hot outlet, LT recuperator hot inlet.
    HtHotOutlet,
    /// 9: LT recuperator hot outlet, precooler and recompressor inlet.
    LtHotOutlet,
    /// 10: recompressor outlet.
    RcOutlet,
}

impl Node {
    pub const ALL: [Node; 10] = [
        Node::McInlet,
        Node::McOutlet,
        Node::LtColdOutlet,
        Node::Mixed,
        Node::HtColdOutlet,
        Node::TurbineInlet,
        Node::TurbineOutlet,
        Node::HtHotOutlet,
        Node::LtHotOutlet,
        Node::RcOutlet,
    ];

    /// Conventional node number, 1 through 10.
    #[must_use]
    pub fn number(self) -> usize {
        self as usize + 1
    }
}

/// Fully resolved states at every node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleStates {
    nodes: [Properties; 10],
}

impl CycleStates {
    pub(crate) fn new(nodes: [Properties; 10]) -> Self {
        Self { nodes }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Node, &Properties)> {
        Node::ALL.into_iter().zip(&self.nodes)
    }
}

impl Index<Node> for CycleStates {
    type Output = Properties;

    fn index(&self, node: Node) -> &Properties {
        &self.nodes[node as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_numbers_follow_flow_order() {
        let numbers: Vec<_> = Node::ALL.iter().map(|node| node.number()).collect();
        assert_eq!(numbers, (1..=10).collect::<Vec<_>>());
        assert_eq!(Node::LtHotOutlet.number(), 9);
    }
}
