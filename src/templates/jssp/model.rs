use derive_more::Constructor;
use log::info;

use super::sets_and_parameters::{Parameters, Sets};
use crate::data::JsspData;
use crate::error::Result;
use crate::evolve::{Evolve, EvolveScope, NoEvolve};
use crate::model::{Model, ObjSense, Relation, Var, VarType};
use crate::templates::utils::AddVars;

#[derive(Constructor, Debug)]
pub struct Variables {
    /// Start time of each operation
    pub start: Vec<Var>,
    /// 1 if the first operation of the pair in `D` runs before the second
    pub seq: Vec<Var>,
    /// The makespan
    pub makespan: Var,
}

pub struct JsspModelBuilder {}

/// Build the job-shop model with the default no-op evolve hook.
pub fn build(data: &JsspData) -> Result<(Model, Variables)> {
    build_with(data, &NoEvolve)
}

/// Build the job-shop model, extended by the given evolve hook.
pub fn build_with(data: &JsspData, hook: &dyn Evolve<Variables>) -> Result<(Model, Variables)> {
    let sets = Sets::new(data)?;
    let parameters = Parameters::new(data, &sets)?;
    JsspModelBuilder::build(&sets, &parameters, hook)
}

#[allow(non_snake_case)]
impl JsspModelBuilder {
    pub fn build(
        sets: &Sets,
        parameters: &Parameters,
        hook: &dyn Evolve<Variables>,
    ) -> Result<(Model, Variables)> {
        info!("Building job-shop model.");

        let mut model = Model::new("jssp");

        let ops = sets.O.len();
        let pairs = sets.D.len();

        // start time of each operation
        let start: Vec<Var> = ops.cont(&mut model, "start")?;
        // disjunctive ordering indicator per same-machine pair
        let seq: Vec<Var> = pairs.binary(&mut model, "seq")?;
        // completion time of the whole schedule
        let makespan = model.add_var(
            "makespan".to_string(),
            VarType::Continuous,
            0.0,
            f64::INFINITY,
        )?;

        model.set_objective(makespan, ObjSense::Minimize)?;

        // within a job, each operation starts no earlier than its
        // predecessor finishes
        for j in &sets.J {
            for w in sets.O_j[*j].windows(2) {
                let (a, b) = (w[0], w[1]);
                model.add_constr(
                    &format!("precedence_{}_{}", usize::from(*j), sets.O[*a].step()),
                    (start[*b] - start[*a]).geq(parameters.p[a]),
                )?;
            }
        }

        // disjunctive ordering of same-machine pairs: seq = 1 forces the
        // first operation before the second, seq = 0 the reverse
        let M = parameters.big_m;
        for (k, &(a, b)) in sets.D.iter().enumerate() {
            let y = seq[k];
            model.add_constr(
                &format!("disjunct_fwd_{}", k),
                (start[*a] + parameters.p[a]).leq(start[*b] + M * (1.0 - y)),
            )?;
            model.add_constr(
                &format!("disjunct_rev_{}", k),
                (start[*b] + parameters.p[b]).leq(start[*a] + M * y),
            )?;
        }

        // the makespan dominates every job's completion time
        for j in &sets.J {
            if let Some(&last) = sets.O_j[*j].last() {
                model.add_constr(
                    &format!("makespan_{}", usize::from(*j)),
                    (start[*last] + parameters.p[last]).leq(makespan),
                )?;
            }
        }

        let variables = Variables::new(start, seq, makespan);

        model.seal_base()?;
        hook.evolve(&mut EvolveScope::new(&mut model)?, &variables)?;

        info!("Successfully built job-shop model.");

        Ok((model, variables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OperationData;
    use crate::error::BuildError;
    use crate::evolve::EvolveFn;
    use crate::model::ConstrSense;

    fn dataset() -> JsspData {
        JsspData {
            jobs: vec![1, 2, 3],
            machines: vec![10, 20],
            operations: vec![
                OperationData {
                    job: 1,
                    machine: 10,
                    duration: 3.0,
                },
                OperationData {
                    job: 1,
                    machine: 20,
                    duration: 2.0,
                },
                OperationData {
                    job: 2,
                    machine: 20,
                    duration: 4.0,
                },
                OperationData {
                    job: 2,
                    machine: 10,
                    duration: 1.0,
                },
                OperationData {
                    job: 3,
                    machine: 10,
                    duration: 5.0,
                },
                OperationData {
                    job: 3,
                    machine: 20,
                    duration: 2.0,
                },
            ],
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
    fn base_structure_counts() {
        let (model, variables) = build(&dataset()).unwrap();

        // 6 starts, one indicator per same-machine pair, the makespan
        assert_eq!(variables.start.len(), 6);
        assert_eq!(variables.seq.len(), 6);
        assert_eq!(model.num_vars(), 13);

        // ops per job - 1 precedence constraints per job
        assert_eq!(count_prefixed(&model, "precedence_"), 3);
        // two big-M constraints per pair
        assert_eq!(count_prefixed(&model, "disjunct_fwd_"), 6);
        assert_eq!(count_prefixed(&model, "disjunct_rev_"), 6);
        // one completion bound per job
        assert_eq!(count_prefixed(&model, "makespan_"), 3);
        assert_eq!(model.num_constrs(), 18);

        let objective = model.objective().unwrap();
        assert_eq!(objective.sense(), ObjSense::Minimize);
        assert_eq!(objective.expr().num_terms(), 1);
        assert_eq!(objective.expr().coefficient(variables.makespan), 1.0);
    }

    #[test]
    fn precedence_relates_consecutive_operations() {
        let (model, variables) = build(&dataset()).unwrap();

        // Job 1 runs machine 10 (duration 3) then machine 20; its operations
        // are the first two declared
        let c = model.constr("precedence_0_0").unwrap();
        assert_eq!(c.coefficient(variables.start[1]), 1.0);
        assert_eq!(c.coefficient(variables.start[0]), -1.0);
        assert_eq!(c.sense(), ConstrSense::Greater);
        assert_eq!(c.rhs(), 3.0);
    }

    #[test]
    fn disjunctive_pair_uses_big_m() {
        let (model, variables) = build(&dataset()).unwrap();

        // Total processing time of the dataset
        let big_m = 17.0;
        let c = model.constr("disjunct_fwd_0").unwrap();
        let y = variables.seq[0];
        assert_eq!(c.coefficient(y), big_m);
        assert_eq!(c.sense(), ConstrSense::Less);
    }

    #[test]
    fn build_is_deterministic() {
        let (a, _) = build(&dataset()).unwrap();
        let (b, _) = build(&dataset()).unwrap();

        assert_eq!(a.num_vars(), b.num_vars());
        assert_eq!(a.num_constrs(), b.num_constrs());
        let names = |m: &Model| {
            m.constrs()
                .iter()
                .map(|c| c.name().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&a), names(&b));
        assert_eq!(
            a.objective().unwrap().expr(),
            b.objective().unwrap().expr()
        );
    }

    #[test]
    fn missing_processing_time_fails_the_build() {
        let mut data = dataset();
        data.operations.retain(|o| !(o.job == 2 && o.machine == 10));

        let err = build(&data).unwrap_err();
        assert!(matches!(err, BuildError::Schema { .. }));
        assert!(err.to_string().contains("(job 2, machine 10)"));
    }

    fn no_op(_: &mut EvolveScope<'_>, _: &Variables) -> Result<()> {
        Ok(())
    }

    #[test]
    fn noop_hook_matches_the_default_build() {
        let data = dataset();
        let (default, _) = build(&data).unwrap();
        let (hooked, _) = build_with(&data, &EvolveFn(no_op)).unwrap();

        assert_eq!(default.num_vars(), hooked.num_vars());
        assert_eq!(default.num_constrs(), hooked.num_constrs());
        assert_eq!(default.num_base_constrs(), hooked.num_base_constrs());
        assert_eq!(hooked.num_evolve_constrs(), Some(0));
    }

    fn left_shift_cut(scope: &mut EvolveScope<'_>, vars: &Variables) -> Result<()> {
        // First declared operation starts at time zero or later than one
        scope.add_constr("cut_first_start", vars.start[0].geq(0.0))
    }

    #[test]
    fn evolve_additions_leave_the_base_untouched() {
        let data = dataset();
        let (model, _) = build_with(&data, &EvolveFn(left_shift_cut)).unwrap();

        assert_eq!(model.num_base_constrs(), Some(18));
        assert_eq!(model.num_evolve_constrs(), Some(1));
        assert!(model.constr("cut_first_start").is_some());
    }
}
