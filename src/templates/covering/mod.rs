//! Generic weighted covering: select columns at minimal cost so that every
//! row's weighted selection meets its threshold.

use std::collections::HashMap;

use derive_more::{Constructor, Deref, From, Into};
use log::info;
use typed_index_collections::TiVec;

use crate::data::CoveringData;
use crate::error::{BuildError, Result};
use crate::evolve::{Evolve, EvolveScope, NoEvolve, TemplateKind};
use crate::model::{LinSum, Model, ObjSense, Relation, Var};
use crate::templates::utils::AddVars;

/// Extension point identifier of this template.
pub const KIND: TemplateKind = TemplateKind::Covering;

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct RowIndex(usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct ColIndex(usize);

#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of covering rows
    pub I: Vec<RowIndex>,
    /// Set of selectable columns
    pub J: Vec<ColIndex>,
    /// External identifier of each row
    pub row_id: TiVec<RowIndex, usize>,
    /// External identifier of each column
    pub col_id: TiVec<ColIndex, usize>,
}

impl Sets {
    pub fn new(data: &CoveringData) -> Result<Sets> {
        let mut rows = HashMap::new();
        for (i, id) in data.rows.iter().enumerate() {
            if rows.insert(*id, RowIndex(i)).is_some() {
                return Err(BuildError::duplicate("rows", format!("row {}", id)));
            }
        }

        let mut cols = HashMap::new();
        for (j, column) in data.columns.iter().enumerate() {
            if cols.insert(column.id, ColIndex(j)).is_some() {
                return Err(BuildError::duplicate(
                    "columns",
                    format!("column {}", column.id),
                ));
            }
        }

        Ok(Sets {
            I: (0..data.rows.len()).map(RowIndex).collect(),
            J: (0..data.columns.len()).map(ColIndex).collect(),
            row_id: data.rows.clone().into(),
            col_id: data.columns.iter().map(|c| c.id).collect::<Vec<_>>().into(),
        })
    }
}

#[allow(non_snake_case)]
#[derive(Debug)]
pub struct Parameters {
    /// Weight of each column towards each row; sparse input, 0 by default
    pub a: TiVec<RowIndex, TiVec<ColIndex, f64>>,
    /// Required covering level of each row; 0 by default
    pub b: TiVec<RowIndex, f64>,
    /// Selection cost of each column
    pub c: TiVec<ColIndex, f64>,
}

impl Parameters {
    pub fn new(data: &CoveringData, sets: &Sets) -> Result<Parameters> {
        let row_index: HashMap<usize, RowIndex> = sets
            .row_id
            .iter_enumerated()
            .map(|(i, id)| (*id, i))
            .collect();
        let col_index: HashMap<usize, ColIndex> = sets
            .col_id
            .iter_enumerated()
            .map(|(j, id)| (*id, j))
            .collect();

        let mut a: TiVec<RowIndex, TiVec<ColIndex, f64>> = sets
            .I
            .iter()
            .map(|_| vec![0.0; sets.J.len()].into())
            .collect::<Vec<_>>()
            .into();
        let mut given = HashMap::new();
        for entry in &data.weights {
            let key = format!("(row {}, column {})", entry.row, entry.column);
            let i = *row_index.get(&entry.row).ok_or_else(|| BuildError::Schema {
                param: "weight".to_string(),
                reason: format!("references undeclared row {}", entry.row),
            })?;
            let j = *col_index
                .get(&entry.column)
                .ok_or_else(|| BuildError::Schema {
                    param: "weight".to_string(),
                    reason: format!("references undeclared column {}", entry.column),
                })?;
            if given.insert((i, j), ()).is_some() {
                return Err(BuildError::duplicate("weight", &key));
            }
            if !(entry.weight >= 0.0) {
                return Err(BuildError::domain("weight", &key, entry.weight, "non-negative"));
            }
            a[i][j] = entry.weight;
        }

        let mut b: TiVec<RowIndex, f64> = vec![0.0; sets.I.len()].into();
        let mut given = HashMap::new();
        for entry in &data.thresholds {
            let key = format!("row {}", entry.row);
            let i = *row_index.get(&entry.row).ok_or_else(|| BuildError::Schema {
                param: "threshold".to_string(),
                reason: format!("references undeclared row {}", entry.row),
            })?;
            if given.insert(i, ()).is_some() {
                return Err(BuildError::duplicate("threshold", &key));
            }
            if !(entry.threshold >= 0.0) {
                return Err(BuildError::domain(
                    "threshold",
                    &key,
                    entry.threshold,
                    "non-negative",
                ));
            }
            b[i] = entry.threshold;
        }

        let mut c: TiVec<ColIndex, f64> = TiVec::new();
        for column in &data.columns {
            if !(column.cost >= 0.0) {
                return Err(BuildError::domain(
                    "cost",
                    format!("column {}", column.id),
                    column.cost,
                    "non-negative",
                ));
            }
            c.push(column.cost);
        }

        Ok(Parameters { a, b, c })
    }
}

#[derive(Constructor, Debug)]
pub struct Variables {
    /// 1 if the column is selected
    pub select: Vec<Var>,
}

pub struct CoveringModelBuilder {}

/// Build the covering model with the default no-op evolve hook.
pub fn build(data: &CoveringData) -> Result<(Model, Variables)> {
    build_with(data, &NoEvolve)
}

/// Build the covering model, extended by the given evolve hook.
pub fn build_with(
    data: &CoveringData,
    hook: &dyn Evolve<Variables>,
) -> Result<(Model, Variables)> {
    let sets = Sets::new(data)?;
    let parameters = Parameters::new(data, &sets)?;
    CoveringModelBuilder::build(&sets, &parameters, hook)
}

#[allow(non_snake_case)]
impl CoveringModelBuilder {
    pub fn build(
        sets: &Sets,
        parameters: &Parameters,
        hook: &dyn Evolve<Variables>,
    ) -> Result<(Model, Variables)> {
        info!("Building covering model.");

        let mut model = Model::new("covering");

        // 1 if the column is selected
        let select: Vec<Var> = sets.J.len().binary(&mut model, "select")?;

        model.set_objective(
            sets.J
                .iter()
                .map(|j| parameters.c[*j] * select[**j])
                .lin_sum(),
            ObjSense::Minimize,
        )?;

        // every row's weighted selection meets its threshold
        for i in &sets.I {
            model.add_constr(
                &format!("cover_{}", usize::from(*i)),
                sets.J
                    .iter()
                    .map(|j| parameters.a[*i][*j] * select[**j])
                    .lin_sum()
                    .geq(parameters.b[*i]),
            )?;
        }

        let variables = Variables::new(select);

        model.seal_base()?;
        hook.evolve(&mut EvolveScope::new(&mut model)?, &variables)?;

        info!("Successfully built covering model.");

        Ok((model, variables))
    }
}
