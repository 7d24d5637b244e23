use derive_more::Constructor;
use log::info;

use super::sets_and_parameters::{NodeIndex, Parameters, Sets};
use crate::data::TspData;
use crate::error::Result;
use crate::evolve::{Evolve, EvolveScope, NoEvolve};
use crate::model::{LinSum, Model, ObjSense, Relation, Var, VarType};
use crate::templates::utils::AddVars;

#[derive(Constructor, Debug)]
pub struct Variables {
    /// 1 if the arc is part of the tour
    pub x: Vec<Var>,
    /// Visit position of each node; the depot is pinned to 1 through its
    /// bounds, all other nodes range over [2, n]
    pub pos: Vec<Var>,
}

pub struct TspModelBuilder {}

/// Build the MTZ tour model with the default no-op evolve hook.
pub fn build(data: &TspData) -> Result<(Model, Variables)> {
    build_with(data, &NoEvolve)
}

/// Build the MTZ tour model, extended by the given evolve hook.
pub fn build_with(data: &TspData, hook: &dyn Evolve<Variables>) -> Result<(Model, Variables)> {
    let sets = Sets::new(data)?;
    let parameters = Parameters::new(data, &sets)?;
    TspModelBuilder::build(&sets, &parameters, hook)
}

#[allow(non_snake_case)]
impl TspModelBuilder {
    pub fn build(
        sets: &Sets,
        parameters: &Parameters,
        hook: &dyn Evolve<Variables>,
    ) -> Result<(Model, Variables)> {
        info!("Building MTZ tour model.");

        let mut model = Model::new("tsp");

        let n = sets.N.len();

        // arc selection
        let x: Vec<Var> = sets.A.len().binary(&mut model, "x")?;
        // visit position of each node
        let pos: Vec<Var> = n.vars_with(|i| {
            if NodeIndex::from(i) == sets.depot {
                model.add_var(format!("pos_{}", i), VarType::Continuous, 1.0, 1.0)
            } else {
                model.add_var(format!("pos_{}", i), VarType::Continuous, 2.0, n as f64)
            }
        })?;

        model.set_objective(
            sets.A
                .iter()
                .map(|a| parameters.c[a.get_index()] * x[*a.get_index()])
                .lin_sum(),
            ObjSense::Minimize,
        )?;

        // every node is left exactly once and entered exactly once
        for i in &sets.N {
            model.add_constr(
                &format!("out_deg_{}", usize::from(*i)),
                sets.Fs[*i].iter().map(|a| x[**a]).lin_sum().equals(1.0),
            )?;
            model.add_constr(
                &format!("in_deg_{}", usize::from(*i)),
                sets.Rs[*i].iter().map(|a| x[**a]).lin_sum().equals(1.0),
            )?;
        }

        // Miller-Tucker-Zemlin subtour elimination over non-depot pairs
        for arc in &sets.A {
            let (i, j) = (arc.get_from(), arc.get_to());
            if i == sets.depot || j == sets.depot {
                continue;
            }
            model.add_constr(
                &format!("mtz_{}_{}", usize::from(i), usize::from(j)),
                (pos[*i] - pos[*j] + (n as f64) * x[*arc.get_index()]).leq(n as f64 - 1.0),
            )?;
        }

        let variables = Variables::new(x, pos);

        model.seal_base()?;
        hook.evolve(&mut EvolveScope::new(&mut model)?, &variables)?;

        info!("Successfully built MTZ tour model.");

        Ok((model, variables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ArcCostData;
    use crate::error::BuildError;
    use crate::evolve::EvolveFn;
    use itertools::iproduct;

    /// Complete symmetric instance on `n` nodes with depot 0.
    fn dataset(n: usize) -> TspData {
        let nodes: Vec<usize> = (0..n).collect();
        let costs = iproduct!(0..n, 0..n)
            .filter(|(i, j)| i != j)
            .map(|(i, j)| ArcCostData {
                from: i,
                to: j,
                cost: 1.0 + (i + j) as f64,
            })
            .collect();
        TspData {
            nodes,
            depot: 0,
            costs,
        }
    }

    fn count_prefixed(model: &Model, prefix: &str) -> usize {
        model
            .constrs()
            .iter()
            .filter(|c| c.name().starts_with(prefix))
            .count()
    }

    #[test]
    fn four_node_instance_end_to_end() {
        let n = 4;
        let (model, variables) = build(&dataset(n)).unwrap();

        // n(n-1) arcs, one position per node
        assert_eq!(variables.x.len(), 12);
        assert_eq!(variables.pos.len(), 4);
        assert_eq!(model.num_vars(), 16);

        // n outgoing + n incoming degree constraints
        assert_eq!(count_prefixed(&model, "out_deg_"), n);
        assert_eq!(count_prefixed(&model, "in_deg_"), n);
        // all ordered pairs of non-depot nodes
        assert_eq!(count_prefixed(&model, "mtz_"), (n - 1) * (n - 2));
        assert_eq!(model.num_constrs(), 2 * n + (n - 1) * (n - 2));
    }

    #[test]
    fn depot_position_is_fixed_to_one() {
        let (model, variables) = build(&dataset(4)).unwrap();

        let depot = model.var(variables.pos[0]).unwrap();
        assert_eq!((depot.lb(), depot.ub()), (1.0, 1.0));

        for pos in &variables.pos[1..] {
            let data = model.var(*pos).unwrap();
            assert_eq!((data.lb(), data.ub()), (2.0, 4.0));
        }
    }

    #[test]
    fn mtz_constraint_shape() {
        let (model, variables) = build(&dataset(3)).unwrap();

        // Arc 1 -> 2 is at index 3 in row-major order without self-loops
        let c = model.constr("mtz_1_2").unwrap();
        assert_eq!(c.coefficient(variables.pos[1]), 1.0);
        assert_eq!(c.coefficient(variables.pos[2]), -1.0);
        assert_eq!(c.coefficient(variables.x[3]), 3.0);
        assert_eq!(c.rhs(), 2.0);
    }

    #[test]
    fn degree_constraints_touch_each_arc_once() {
        let (model, variables) = build(&dataset(4)).unwrap();

        let out0 = model.constr("out_deg_0").unwrap();
        assert_eq!(out0.coefficients().count(), 3);
        assert!(variables.x[0..3]
            .iter()
            .all(|x| out0.coefficient(*x) == 1.0));
        assert_eq!(out0.rhs(), 1.0);
    }

    #[test]
    fn build_is_deterministic() {
        let (a, _) = build(&dataset(5)).unwrap();
        let (b, _) = build(&dataset(5)).unwrap();

        assert_eq!(a.num_vars(), b.num_vars());
        assert_eq!(a.num_constrs(), b.num_constrs());
        assert_eq!(
            a.objective().unwrap().expr(),
            b.objective().unwrap().expr()
        );
    }

    #[test]
    fn missing_cost_fails_the_build() {
        let mut data = dataset(4);
        data.costs.retain(|c| !(c.from == 2 && c.to == 3));

        let err = build(&data).unwrap_err();
        assert!(matches!(err, BuildError::Schema { .. }));
        assert!(err.to_string().contains("(2, 3)"));
    }

    fn two_cycle_break(scope: &mut EvolveScope<'_>, vars: &Variables) -> Result<()> {
        // x[0] is 0 -> 1 and x[2] is 1 -> 0 in a 3-node instance
        scope.add_constr("cut_two_cycle", (vars.x[0] + vars.x[2]).leq(1.0))
    }

    #[test]
    fn evolve_hook_appends_cuts_after_the_base() {
        let (model, _) = build_with(&dataset(3), &EvolveFn(two_cycle_break)).unwrap();

        assert_eq!(model.num_base_constrs(), Some(8));
        assert_eq!(model.num_evolve_constrs(), Some(1));
        assert!(model.constr("cut_two_cycle").is_some());
    }
}
