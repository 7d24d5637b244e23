//! Multi-commodity network design: open arcs at minimal cost so that the
//! aggregate flow on every arc fits its capacity.
//!
//! This is a documented partial template: the dataset carries no
//! origin/destination data per commodity, so the flow conservation family is
//! left to the evolve hook. The full variable scaffold is declared either
//! way.

use std::collections::HashSet;

use derive_more::{Constructor, Deref, From, Into};
use log::info;
use typed_index_collections::TiVec;

use crate::data::McndData;
use crate::error::{BuildError, Result};
use crate::evolve::{Evolve, EvolveScope, NoEvolve, TemplateKind};
use crate::model::{LinSum, Model, ObjSense, Relation, Var};
use crate::templates::utils::AddVars;

/// Extension point identifier of this template.
pub const KIND: TemplateKind = TemplateKind::Mcnd;

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct CommodityIndex(usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct ArcIndex(usize);

/// A design arc between two external node identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    from: usize,
    to: usize,
    index: ArcIndex,
}

impl Arc {
    pub fn new(from: usize, to: usize, index: ArcIndex) -> Arc {
        Arc { from, to, index }
    }

    pub fn get_from(&self) -> usize {
        self.from
    }

    pub fn get_to(&self) -> usize {
        self.to
    }

    pub fn get_index(&self) -> ArcIndex {
        self.index
    }
}

#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of commodities
    pub K: Vec<CommodityIndex>,
    /// Set of design arcs
    pub A: Vec<Arc>,
    /// External identifier of each commodity
    pub commodity_id: TiVec<CommodityIndex, usize>,
}

impl Sets {
    pub fn new(data: &McndData) -> Result<Sets> {
        let mut seen = HashSet::new();
        for id in &data.commodities {
            if !seen.insert(*id) {
                return Err(BuildError::duplicate(
                    "commodities",
                    format!("commodity {}", id),
                ));
            }
        }

        let mut endpoints = HashSet::new();
        let mut A = Vec::with_capacity(data.arcs.len());
        for arc in &data.arcs {
            if arc.from == arc.to {
                return Err(BuildError::Schema {
                    param: "arcs".to_string(),
                    reason: format!("self-loop design arc ({}, {})", arc.from, arc.to),
                });
            }
            if !endpoints.insert((arc.from, arc.to)) {
                return Err(BuildError::duplicate(
                    "arcs",
                    format!("({}, {})", arc.from, arc.to),
                ));
            }
            A.push(Arc::new(arc.from, arc.to, ArcIndex(A.len())));
        }

        Ok(Sets {
            K: (0..data.commodities.len()).map(CommodityIndex).collect(),
            A,
            commodity_id: data.commodities.clone().into(),
        })
    }
}

#[allow(non_snake_case)]
#[derive(Debug)]
pub struct Parameters {
    /// Capacity of each arc once opened
    pub cap: TiVec<ArcIndex, f64>,
    /// Cost of opening each arc
    pub cost: TiVec<ArcIndex, f64>,
}

impl Parameters {
    pub fn new(data: &McndData, _sets: &Sets) -> Result<Parameters> {
        let mut cap: TiVec<ArcIndex, f64> = TiVec::new();
        let mut cost: TiVec<ArcIndex, f64> = TiVec::new();
        for arc in &data.arcs {
            let key = format!("({}, {})", arc.from, arc.to);
            if !(arc.capacity >= 0.0) {
                return Err(BuildError::domain(
                    "capacity",
                    &key,
                    arc.capacity,
                    "non-negative",
                ));
            }
            if !(arc.cost >= 0.0) {
                return Err(BuildError::domain("cost", &key, arc.cost, "non-negative"));
            }
            cap.push(arc.capacity);
            cost.push(arc.cost);
        }

        Ok(Parameters { cap, cost })
    }
}

#[derive(Constructor, Debug)]
pub struct Variables {
    /// Flow of each commodity on each arc, indexed `[commodity][arc]`
    pub flow: Vec<Vec<Var>>,
    /// 1 if the arc is opened
    pub open: Vec<Var>,
}

pub struct McndModelBuilder {}

/// Build the network design model with the default no-op evolve hook.
pub fn build(data: &McndData) -> Result<(Model, Variables)> {
    build_with(data, &NoEvolve)
}

/// Build the network design model, extended by the given evolve hook.
pub fn build_with(data: &McndData, hook: &dyn Evolve<Variables>) -> Result<(Model, Variables)> {
    let sets = Sets::new(data)?;
    let parameters = Parameters::new(data, &sets)?;
    McndModelBuilder::build(&sets, &parameters, hook)
}

#[allow(non_snake_case)]
impl McndModelBuilder {
    pub fn build(
        sets: &Sets,
        parameters: &Parameters,
        hook: &dyn Evolve<Variables>,
    ) -> Result<(Model, Variables)> {
        info!("Building network design model.");

        let mut model = Model::new("mcnd");

        let commodities = sets.K.len();
        let arcs = sets.A.len();

        // flow of each commodity on each arc
        let flow: Vec<Vec<Var>> = (commodities, arcs).cont(&mut model, "flow")?;
        // 1 if the arc is opened
        let open: Vec<Var> = arcs.binary(&mut model, "open")?;

        model.set_objective(
            sets.A
                .iter()
                .map(|a| parameters.cost[a.get_index()] * open[*a.get_index()])
                .lin_sum(),
            ObjSense::Minimize,
        )?;

        // aggregate flow fits the capacity, which is zero unless opened
        for arc in &sets.A {
            let a = arc.get_index();
            model.add_constr(
                &format!("capacity_{}", usize::from(a)),
                (sets.K.iter().map(|k| flow[**k][*a]).lin_sum()
                    - parameters.cap[a] * open[*a])
                    .leq(0.0),
            )?;
        }

        // Flow conservation needs per-commodity origins and destinations,
        // which the dataset does not carry; the family is added through the
        // evolve hook when needed.

        let variables = Variables::new(flow, open);

        model.seal_base()?;
        hook.evolve(&mut EvolveScope::new(&mut model)?, &variables)?;

        info!("Successfully built network design model.");

        Ok((model, variables))
    }
}
