use std::collections::HashMap;

use derive_more::{Deref, From, Into};
use itertools::iproduct;
use typed_index_collections::TiVec;

use crate::data::TspData;
use crate::error::{BuildError, Result};

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct NodeIndex(usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct ArcIndex(usize);

/// A directed arc between two distinct nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    // The node in which the arc begins
    from: NodeIndex,
    // The node in which the arc ends
    to: NodeIndex,
    // Index of the arc
    index: ArcIndex,
}

impl Arc {
    pub fn new(from: NodeIndex, to: NodeIndex, index: ArcIndex) -> Arc {
        // The derived arc set never contains self-loops
        assert!(from != to);
        Arc { from, to, index }
    }

    pub fn get_from(&self) -> NodeIndex {
        self.from
    }

    pub fn get_to(&self) -> NodeIndex {
        self.to
    }

    pub fn get_index(&self) -> ArcIndex {
        self.index
    }
}

#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of nodes
    pub N: Vec<NodeIndex>,
    /// Set of arcs between distinct nodes
    pub A: Vec<Arc>,
    /// The depot node, where every tour starts
    pub depot: NodeIndex,
    /// Outgoing arcs of each node
    pub Fs: TiVec<NodeIndex, Vec<ArcIndex>>,
    /// Incoming arcs of each node
    pub Rs: TiVec<NodeIndex, Vec<ArcIndex>>,
    /// External identifier of each node
    pub node_id: TiVec<NodeIndex, usize>,
}

#[allow(non_snake_case)]
impl Sets {
    pub fn new(data: &TspData) -> Result<Sets> {
        let mut node_index: HashMap<usize, NodeIndex> = HashMap::new();
        for (i, id) in data.nodes.iter().enumerate() {
            if node_index.insert(*id, NodeIndex(i)).is_some() {
                return Err(BuildError::duplicate("nodes", format!("node {}", id)));
            }
        }

        let depot = *node_index
            .get(&data.depot)
            .ok_or_else(|| BuildError::missing("depot", format!("node {}", data.depot)))?;

        let n = data.nodes.len();
        let mut A = Vec::with_capacity(n * n.saturating_sub(1));
        for (i, j) in iproduct!(0..n, 0..n) {
            if i != j {
                A.push(Arc::new(NodeIndex(i), NodeIndex(j), ArcIndex(A.len())));
            }
        }

        let mut Fs: TiVec<NodeIndex, Vec<ArcIndex>> = vec![Vec::new(); n].into();
        let mut Rs: TiVec<NodeIndex, Vec<ArcIndex>> = vec![Vec::new(); n].into();
        for arc in &A {
            Fs[arc.get_from()].push(arc.get_index());
            Rs[arc.get_to()].push(arc.get_index());
        }

        Ok(Sets {
            N: (0..n).map(NodeIndex).collect(),
            A,
            depot,
            Fs,
            Rs,
            node_id: data.nodes.clone().into(),
        })
    }
}

#[allow(non_snake_case)]
#[derive(Debug)]
pub struct Parameters {
    /// Travel cost of each arc
    pub c: TiVec<ArcIndex, f64>,
}

impl Parameters {
    pub fn new(data: &TspData, sets: &Sets) -> Result<Parameters> {
        let mut costs: HashMap<(usize, usize), f64> = HashMap::new();
        for entry in &data.costs {
            if entry.from == entry.to {
                return Err(BuildError::Schema {
                    param: "cost".to_string(),
                    reason: format!("cost given for self-loop ({}, {})", entry.from, entry.to),
                });
            }
            if costs.insert((entry.from, entry.to), entry.cost).is_some() {
                return Err(BuildError::duplicate(
                    "cost",
                    format!("({}, {})", entry.from, entry.to),
                ));
            }
        }

        let mut c: TiVec<ArcIndex, f64> = TiVec::new();
        for arc in &sets.A {
            let from_id = sets.node_id[arc.get_from()];
            let to_id = sets.node_id[arc.get_to()];
            let key = format!("({}, {})", from_id, to_id);
            let cost = *costs
                .get(&(from_id, to_id))
                .ok_or_else(|| BuildError::missing("cost", &key))?;
            if !(cost >= 0.0) {
                return Err(BuildError::domain("cost", &key, cost, "non-negative"));
            }
            c.push(cost);
        }

        Ok(Parameters { c })
    }
}
