//! Pickup-and-delivery with time windows.
//!
//! This is a documented partial template: it declares the full variable,
//! parameter and objective scaffold, but the flow conservation, time-window
//! and capacity families are left to the evolve hook. Building it yields a
//! sealed model with zero base constraints.

use std::collections::HashMap;

use derive_more::{Constructor, Deref, From, Into};
use log::info;
use typed_index_collections::TiVec;

use crate::data::PdptwData;
use crate::error::{BuildError, Result};
use crate::evolve::{Evolve, EvolveScope, NoEvolve, TemplateKind};
use crate::model::{LinSum, Model, ObjSense, Var};
use crate::templates::utils::AddVars;

/// Extension point identifier of this template.
pub const KIND: TemplateKind = TemplateKind::Pdptw;

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct NodeIndex(usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct ArcIndex(usize);

/// A directed arc between two distinct nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    from: NodeIndex,
    to: NodeIndex,
    index: ArcIndex,
}

impl Arc {
    pub fn new(from: NodeIndex, to: NodeIndex, index: ArcIndex) -> Arc {
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
    /// Set of arcs, as given by the dataset
    pub A: Vec<Arc>,
    /// External identifier of each node
    pub node_id: TiVec<NodeIndex, usize>,
}

#[allow(non_snake_case)]
impl Sets {
    pub fn new(data: &PdptwData) -> Result<Sets> {
        let mut node_index: HashMap<usize, NodeIndex> = HashMap::new();
        for (i, node) in data.nodes.iter().enumerate() {
            if node_index.insert(node.id, NodeIndex(i)).is_some() {
                return Err(BuildError::duplicate("nodes", format!("node {}", node.id)));
            }
        }

        let mut seen = HashMap::new();
        let mut A = Vec::with_capacity(data.arcs.len());
        for arc in &data.arcs {
            if arc.from == arc.to {
                return Err(BuildError::Schema {
                    param: "arcs".to_string(),
                    reason: format!("self-loop arc ({}, {})", arc.from, arc.to),
                });
            }
            let from = *node_index.get(&arc.from).ok_or_else(|| BuildError::Schema {
                param: "arcs".to_string(),
                reason: format!("references undeclared node {}", arc.from),
            })?;
            let to = *node_index.get(&arc.to).ok_or_else(|| BuildError::Schema {
                param: "arcs".to_string(),
                reason: format!("references undeclared node {}", arc.to),
            })?;
            if seen.insert((from, to), ()).is_some() {
                return Err(BuildError::duplicate(
                    "arcs",
                    format!("({}, {})", arc.from, arc.to),
                ));
            }
            A.push(Arc::new(from, to, ArcIndex(A.len())));
        }

        Ok(Sets {
            N: (0..data.nodes.len()).map(NodeIndex).collect(),
            A,
            node_id: data.nodes.iter().map(|n| n.id).collect::<Vec<_>>().into(),
        })
    }
}

#[allow(non_snake_case)]
#[derive(Debug)]
pub struct Parameters {
    /// Signed demand of each node: positive pickups, negative deliveries
    pub q: TiVec<NodeIndex, f64>,
    /// Travel time of each arc
    pub t: TiVec<ArcIndex, f64>,
    /// Earliest service start of each node
    pub tw_l: TiVec<NodeIndex, f64>,
    /// Latest service start of each node
    pub tw_u: TiVec<NodeIndex, f64>,
}

impl Parameters {
    pub fn new(data: &PdptwData, sets: &Sets) -> Result<Parameters> {
        let mut q: TiVec<NodeIndex, f64> = TiVec::new();
        let mut tw_l: TiVec<NodeIndex, f64> = TiVec::new();
        let mut tw_u: TiVec<NodeIndex, f64> = TiVec::new();
        for node in &data.nodes {
            if node.tw_earliest > node.tw_latest {
                return Err(BuildError::domain(
                    "time window",
                    format!("node {}", node.id),
                    format!("[{}, {}]", node.tw_earliest, node.tw_latest),
                    "a non-empty interval",
                ));
            }
            q.push(node.demand);
            tw_l.push(node.tw_earliest);
            tw_u.push(node.tw_latest);
        }

        let mut t: TiVec<ArcIndex, f64> = TiVec::new();
        for (arc, entry) in sets.A.iter().zip(&data.arcs) {
            let key = format!(
                "({}, {})",
                sets.node_id[arc.get_from()],
                sets.node_id[arc.get_to()]
            );
            if !(entry.time >= 0.0) {
                return Err(BuildError::domain(
                    "travel time",
                    &key,
                    entry.time,
                    "non-negative",
                ));
            }
            t.push(entry.time);
        }

        Ok(Parameters { q, t, tw_l, tw_u })
    }
}

#[derive(Constructor, Debug)]
pub struct Variables {
    /// 1 if the arc is traversed
    pub x: Vec<Var>,
    /// Service start time at each node
    pub service: Vec<Var>,
    /// Vehicle load after serving each node
    pub load: Vec<Var>,
}

pub struct PdptwModelBuilder {}

/// Build the pickup-and-delivery scaffold with the default no-op evolve hook.
pub fn build(data: &PdptwData) -> Result<(Model, Variables)> {
    build_with(data, &NoEvolve)
}

/// Build the pickup-and-delivery scaffold, extended by the given evolve hook.
pub fn build_with(data: &PdptwData, hook: &dyn Evolve<Variables>) -> Result<(Model, Variables)> {
    let sets = Sets::new(data)?;
    let parameters = Parameters::new(data, &sets)?;
    PdptwModelBuilder::build(&sets, &parameters, hook)
}

#[allow(non_snake_case)]
impl PdptwModelBuilder {
    pub fn build(
        sets: &Sets,
        parameters: &Parameters,
        hook: &dyn Evolve<Variables>,
    ) -> Result<(Model, Variables)> {
        info!("Building pickup-and-delivery scaffold.");

        let mut model = Model::new("pdptw");

        let nodes = sets.N.len();
        let arcs = sets.A.len();

        // 1 if the arc is traversed
        let x: Vec<Var> = arcs.binary(&mut model, "x")?;
        // service start time at each node
        let service: Vec<Var> = nodes.cont(&mut model, "service")?;
        // vehicle load after serving each node
        let load: Vec<Var> = nodes.cont(&mut model, "load")?;

        model.set_objective(
            sets.A
                .iter()
                .map(|a| parameters.t[a.get_index()] * x[*a.get_index()])
                .lin_sum(),
            ObjSense::Minimize,
        )?;

        // Flow conservation, time windows and capacity are left to the
        // evolve hook; the base model is the bare routing scaffold.

        let variables = Variables::new(x, service, load);

        model.seal_base()?;
        hook.evolve(&mut EvolveScope::new(&mut model)?, &variables)?;

        info!("Successfully built pickup-and-delivery scaffold.");

        Ok((model, variables))
    }
}
