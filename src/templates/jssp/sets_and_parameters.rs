use std::collections::{HashMap, HashSet};

use derive_more::{Deref, From, Into};
use itertools::Itertools;
use typed_index_collections::TiVec;

use crate::data::JsspData;
use crate::error::{BuildError, Result};

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct JobIndex(usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct MachineIndex(usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct OpIndex(usize);

/// One operation: a job's visit to a machine, at a given step of the job's
/// route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    // The job this operation belongs to
    job: JobIndex,
    // The machine it runs on
    machine: MachineIndex,
    // Position in the job's route
    step: usize,
    // Index of the operation
    index: OpIndex,
}

impl Operation {
    pub fn new(job: JobIndex, machine: MachineIndex, step: usize, index: OpIndex) -> Operation {
        Operation {
            job,
            machine,
            step,
            index,
        }
    }

    pub fn job(&self) -> JobIndex {
        self.job
    }

    pub fn machine(&self) -> MachineIndex {
        self.machine
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn index(&self) -> OpIndex {
        self.index
    }
}

#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of jobs
    pub J: Vec<JobIndex>,
    /// Set of machines
    pub M: Vec<MachineIndex>,
    /// Set of operations
    pub O: Vec<Operation>,
    /// Operations of each job, in processing order
    pub O_j: TiVec<JobIndex, Vec<OpIndex>>,
    /// Unordered pairs of distinct operations sharing a machine, stored with
    /// the smaller operation index first
    pub D: Vec<(OpIndex, OpIndex)>,
    /// External identifier of each job
    pub job_id: TiVec<JobIndex, usize>,
    /// External identifier of each machine
    pub machine_id: TiVec<MachineIndex, usize>,
}

#[allow(non_snake_case)]
impl Sets {
    pub fn new(data: &JsspData) -> Result<Sets> {
        let mut job_index: HashMap<usize, JobIndex> = HashMap::new();
        for (j, id) in data.jobs.iter().enumerate() {
            if job_index.insert(*id, JobIndex(j)).is_some() {
                return Err(BuildError::duplicate("jobs", format!("job {}", id)));
            }
        }

        let mut machine_index: HashMap<usize, MachineIndex> = HashMap::new();
        for (m, id) in data.machines.iter().enumerate() {
            if machine_index.insert(*id, MachineIndex(m)).is_some() {
                return Err(BuildError::duplicate("machines", format!("machine {}", id)));
            }
        }

        // A job's route is the order of its entries in the operation list
        let mut route: TiVec<JobIndex, Vec<MachineIndex>> =
            vec![Vec::new(); data.jobs.len()].into();
        let mut seen: HashSet<(JobIndex, MachineIndex)> = HashSet::new();
        for op in &data.operations {
            let j = *job_index.get(&op.job).ok_or_else(|| BuildError::Schema {
                param: "operations".to_string(),
                reason: format!("references undeclared job {}", op.job),
            })?;
            let m = *machine_index
                .get(&op.machine)
                .ok_or_else(|| BuildError::Schema {
                    param: "operations".to_string(),
                    reason: format!("references undeclared machine {}", op.machine),
                })?;
            if !seen.insert((j, m)) {
                return Err(BuildError::duplicate(
                    "processing time",
                    format!("(job {}, machine {})", op.job, op.machine),
                ));
            }
            route[j].push(m);
        }

        // Every job must visit every machine exactly once
        for (j, job_id) in data.jobs.iter().enumerate() {
            for (m, machine_id) in data.machines.iter().enumerate() {
                if !seen.contains(&(JobIndex(j), MachineIndex(m))) {
                    return Err(BuildError::missing(
                        "processing time",
                        format!("(job {}, machine {})", job_id, machine_id),
                    ));
                }
            }
        }

        let mut O = Vec::new();
        let mut O_j: TiVec<JobIndex, Vec<OpIndex>> = vec![Vec::new(); data.jobs.len()].into();
        for (j, machines) in route.iter_enumerated() {
            for (step, m) in machines.iter().enumerate() {
                let index = OpIndex(O.len());
                O.push(Operation::new(j, *m, step, index));
                O_j[j].push(index);
            }
        }

        let D = Sets::get_disjunctive_pairs(&O, data.machines.len());

        Ok(Sets {
            J: (0..data.jobs.len()).map(JobIndex).collect(),
            M: (0..data.machines.len()).map(MachineIndex).collect(),
            O,
            O_j,
            D,
            job_id: data.jobs.clone().into(),
            machine_id: data.machines.clone().into(),
        })
    }

    /// All unordered pairs of distinct operations assigned to the same
    /// machine. Operations are grouped in increasing index order, so each
    /// pair `(a, b)` comes out with `a < b` and appears exactly once.
    fn get_disjunctive_pairs(ops: &[Operation], machines: usize) -> Vec<(OpIndex, OpIndex)> {
        let mut by_machine: TiVec<MachineIndex, Vec<OpIndex>> = vec![Vec::new(); machines].into();
        for op in ops {
            by_machine[op.machine()].push(op.index());
        }

        by_machine
            .iter()
            .flat_map(|ops| ops.iter().copied().tuple_combinations::<(_, _)>())
            .collect()
    }
}

#[allow(non_snake_case)]
#[derive(Debug)]
pub struct Parameters {
    /// Processing time of each operation
    pub p: TiVec<OpIndex, f64>,
    /// Big-M for the disjunctive pairs: the sum of all processing times, so
    /// the deactivated ordering can never bind
    pub big_m: f64,
}

impl Parameters {
    pub fn new(data: &JsspData, sets: &Sets) -> Result<Parameters> {
        let durations: HashMap<(usize, usize), f64> = data
            .operations
            .iter()
            .map(|op| ((op.job, op.machine), op.duration))
            .collect();

        let mut p: TiVec<OpIndex, f64> = TiVec::new();
        for op in &sets.O {
            let job_id = sets.job_id[op.job()];
            let machine_id = sets.machine_id[op.machine()];
            let key = format!("(job {}, machine {})", job_id, machine_id);
            let duration = *durations
                .get(&(job_id, machine_id))
                .ok_or_else(|| BuildError::missing("processing time", &key))?;
            if !(duration > 0.0) {
                return Err(BuildError::domain(
                    "processing time",
                    &key,
                    duration,
                    "strictly positive",
                ));
            }
            p.push(duration);
        }

        let big_m = p.iter().sum();

        Ok(Parameters { p, big_m })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OperationData;

    fn dataset() -> JsspData {
        JsspData {
            jobs: vec![1, 2],
            machines: vec![10, 20, 30],
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
                    job: 1,
                    machine: 30,
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
                    job: 2,
                    machine: 30,
                    duration: 5.0,
                },
            ],
        }
    }

    #[test]
    fn routes_follow_entry_order() {
        let sets = Sets::new(&dataset()).unwrap();
        assert_eq!(sets.O.len(), 6);

        // Job 2's route is machine 20, then 10, then 30
        let second_job = &sets.O_j[JobIndex(1)];
        let machines: Vec<usize> = second_job
            .iter()
            .map(|o| sets.machine_id[sets.O[**o].machine()])
            .collect();
        assert_eq!(machines, vec![20, 10, 30]);

        let steps: Vec<usize> = second_job.iter().map(|o| sets.O[**o].step()).collect();
        assert_eq!(steps, vec![0, 1, 2]);
    }

    #[test]
    fn disjunctive_pairs_are_unique_ordered_and_machine_bound() {
        let sets = Sets::new(&dataset()).unwrap();

        // Two operations per machine, three machines
        assert_eq!(sets.D.len(), 3);
        for &(a, b) in &sets.D {
            assert!(a < b);
            assert_eq!(sets.O[*a].machine(), sets.O[*b].machine());
        }

        let unique: std::collections::HashSet<_> = sets.D.iter().collect();
        assert_eq!(unique.len(), sets.D.len());
    }

    #[test]
    fn missing_processing_time_names_the_pair() {
        let mut data = dataset();
        data.operations.retain(|o| !(o.job == 2 && o.machine == 10));

        let err = Sets::new(&data).unwrap_err();
        assert!(matches!(err, BuildError::Schema { .. }));
        assert!(err.to_string().contains("(job 2, machine 10)"));
    }

    #[test]
    fn duplicate_operation_is_rejected() {
        let mut data = dataset();
        data.operations.push(OperationData {
            job: 1,
            machine: 10,
            duration: 7.0,
        });

        let err = Sets::new(&data).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn nonpositive_duration_is_out_of_domain() {
        let mut data = dataset();
        data.operations[3].duration = 0.0;

        let sets = Sets::new(&data).unwrap();
        let err = Parameters::new(&data, &sets).unwrap_err();
        assert!(matches!(err, BuildError::Schema { .. }));
        assert!(err.to_string().contains("(job 2, machine 20)"));
    }

    #[test]
    fn big_m_is_the_total_processing_time() {
        let data = dataset();
        let sets = Sets::new(&data).unwrap();
        let parameters = Parameters::new(&data, &sets).unwrap();
        assert_eq!(parameters.big_m, 17.0);
    }
}
