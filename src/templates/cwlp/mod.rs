//! Capacitated warehouse location: cover every customer's demand from opened
//! warehouses at minimal fixed-plus-shipping cost.

use std::collections::HashMap;

use derive_more::{Constructor, Deref, From, Into};
use itertools::iproduct;
use log::info;
use typed_index_collections::TiVec;

use crate::data::CwlpData;
use crate::error::{BuildError, Result};
use crate::evolve::{Evolve, EvolveScope, NoEvolve, TemplateKind};
use crate::model::{LinSum, Model, ObjSense, Relation, Var};
use crate::templates::utils::AddVars;

/// Extension point identifier of this template.
pub const KIND: TemplateKind = TemplateKind::Cwlp;

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct CustomerIndex(usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, From, Into, Clone, Copy, Hash)]
pub struct WarehouseIndex(usize);

#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of customers
    pub I: Vec<CustomerIndex>,
    /// Set of warehouses
    pub J: Vec<WarehouseIndex>,
    /// External identifier of each customer
    pub customer_id: TiVec<CustomerIndex, usize>,
    /// External identifier of each warehouse
    pub warehouse_id: TiVec<WarehouseIndex, usize>,
}

impl Sets {
    pub fn new(data: &CwlpData) -> Result<Sets> {
        let mut customer_ids = Vec::with_capacity(data.customers.len());
        let mut seen = HashMap::new();
        for (i, customer) in data.customers.iter().enumerate() {
            if seen.insert(customer.id, i).is_some() {
                return Err(BuildError::duplicate(
                    "customers",
                    format!("customer {}", customer.id),
                ));
            }
            customer_ids.push(customer.id);
        }

        let mut warehouse_ids = Vec::with_capacity(data.warehouses.len());
        let mut seen = HashMap::new();
        for (j, warehouse) in data.warehouses.iter().enumerate() {
            if seen.insert(warehouse.id, j).is_some() {
                return Err(BuildError::duplicate(
                    "warehouses",
                    format!("warehouse {}", warehouse.id),
                ));
            }
            warehouse_ids.push(warehouse.id);
        }

        Ok(Sets {
            I: (0..data.customers.len()).map(CustomerIndex).collect(),
            J: (0..data.warehouses.len()).map(WarehouseIndex).collect(),
            customer_id: customer_ids.into(),
            warehouse_id: warehouse_ids.into(),
        })
    }
}

#[allow(non_snake_case)]
#[derive(Debug)]
pub struct Parameters {
    /// Demand of each customer
    pub d: TiVec<CustomerIndex, f64>,
    /// Capacity of each warehouse when opened
    pub cap: TiVec<WarehouseIndex, f64>,
    /// Fixed cost of opening each warehouse
    pub f: TiVec<WarehouseIndex, f64>,
    /// Unit cost of serving a customer from a warehouse
    pub c: TiVec<CustomerIndex, TiVec<WarehouseIndex, f64>>,
}

impl Parameters {
    pub fn new(data: &CwlpData, sets: &Sets) -> Result<Parameters> {
        let mut d: TiVec<CustomerIndex, f64> = TiVec::new();
        for customer in &data.customers {
            if !(customer.demand >= 0.0) {
                return Err(BuildError::domain(
                    "demand",
                    format!("customer {}", customer.id),
                    customer.demand,
                    "non-negative",
                ));
            }
            d.push(customer.demand);
        }

        let mut cap: TiVec<WarehouseIndex, f64> = TiVec::new();
        let mut f: TiVec<WarehouseIndex, f64> = TiVec::new();
        for warehouse in &data.warehouses {
            if !(warehouse.capacity >= 0.0) {
                return Err(BuildError::domain(
                    "capacity",
                    format!("warehouse {}", warehouse.id),
                    warehouse.capacity,
                    "non-negative",
                ));
            }
            if !(warehouse.fixed_cost >= 0.0) {
                return Err(BuildError::domain(
                    "fixed cost",
                    format!("warehouse {}", warehouse.id),
                    warehouse.fixed_cost,
                    "non-negative",
                ));
            }
            cap.push(warehouse.capacity);
            f.push(warehouse.fixed_cost);
        }

        let mut costs: HashMap<(usize, usize), f64> = HashMap::new();
        for entry in &data.supply_costs {
            if costs
                .insert((entry.customer, entry.warehouse), entry.cost)
                .is_some()
            {
                return Err(BuildError::duplicate(
                    "supply cost",
                    format!("(customer {}, warehouse {})", entry.customer, entry.warehouse),
                ));
            }
        }

        let mut c: TiVec<CustomerIndex, TiVec<WarehouseIndex, f64>> = TiVec::new();
        for i in &sets.I {
            let mut row: TiVec<WarehouseIndex, f64> = TiVec::new();
            for j in &sets.J {
                let key = format!(
                    "(customer {}, warehouse {})",
                    sets.customer_id[*i], sets.warehouse_id[*j]
                );
                let cost = *costs
                    .get(&(sets.customer_id[*i], sets.warehouse_id[*j]))
                    .ok_or_else(|| BuildError::missing("supply cost", &key))?;
                if !(cost >= 0.0) {
                    return Err(BuildError::domain("supply cost", &key, cost, "non-negative"));
                }
                row.push(cost);
            }
            c.push(row);
        }

        Ok(Parameters { d, cap, f, c })
    }
}

#[derive(Constructor, Debug)]
pub struct Variables {
    /// 1 if the warehouse is opened
    pub open: Vec<Var>,
    /// Flow from warehouse to customer, indexed `[customer][warehouse]`
    pub ship: Vec<Vec<Var>>,
}

pub struct CwlpModelBuilder {}

/// Build the warehouse location model with the default no-op evolve hook.
pub fn build(data: &CwlpData) -> Result<(Model, Variables)> {
    build_with(data, &NoEvolve)
}

/// Build the warehouse location model, extended by the given evolve hook.
pub fn build_with(data: &CwlpData, hook: &dyn Evolve<Variables>) -> Result<(Model, Variables)> {
    let sets = Sets::new(data)?;
    let parameters = Parameters::new(data, &sets)?;
    CwlpModelBuilder::build(&sets, &parameters, hook)
}

#[allow(non_snake_case)]
impl CwlpModelBuilder {
    pub fn build(
        sets: &Sets,
        parameters: &Parameters,
        hook: &dyn Evolve<Variables>,
    ) -> Result<(Model, Variables)> {
        info!("Building warehouse location model.");

        let mut model = Model::new("cwlp");

        let customers = sets.I.len();
        let warehouses = sets.J.len();

        // 1 if the warehouse is opened
        let open: Vec<Var> = warehouses.binary(&mut model, "open")?;
        // flow from warehouse to customer
        let ship: Vec<Vec<Var>> = (customers, warehouses).cont(&mut model, "ship")?;

        let fixed_cost = sets.J.iter().map(|j| parameters.f[*j] * open[**j]).lin_sum();
        let shipping_cost = iproduct!(&sets.I, &sets.J)
            .map(|(i, j)| parameters.c[*i][*j] * ship[**i][**j])
            .lin_sum();
        model.set_objective(fixed_cost + shipping_cost, ObjSense::Minimize)?;

        // every customer's demand is covered exactly
        for i in &sets.I {
            model.add_constr(
                &format!("demand_{}", usize::from(*i)),
                sets.J
                    .iter()
                    .map(|j| ship[**i][**j])
                    .lin_sum()
                    .equals(parameters.d[*i]),
            )?;
        }

        // outgoing flow fits the capacity, which is zero unless opened
        for j in &sets.J {
            model.add_constr(
                &format!("capacity_{}", usize::from(*j)),
                (sets.I.iter().map(|i| ship[**i][**j]).lin_sum()
                    - parameters.cap[*j] * open[**j])
                    .leq(0.0),
            )?;
        }

        let variables = Variables::new(open, ship);

        model.seal_base()?;
        hook.evolve(&mut EvolveScope::new(&mut model)?, &variables)?;

        info!("Successfully built warehouse location model.");

        Ok((model, variables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CustomerData, SupplyCostData, WarehouseData};
    use crate::model::ConstrSense;

    fn dataset() -> CwlpData {
        CwlpData {
            customers: vec![
                CustomerData { id: 1, demand: 10.0 },
                CustomerData { id: 2, demand: 5.0 },
            ],
            warehouses: vec![
                WarehouseData {
                    id: 7,
                    capacity: 12.0,
                    fixed_cost: 100.0,
                },
                WarehouseData {
                    id: 8,
                    capacity: 20.0,
                    fixed_cost: 80.0,
                },
            ],
            supply_costs: iproduct!([1usize, 2], [7usize, 8])
                .map(|(customer, warehouse)| SupplyCostData {
                    customer,
                    warehouse,
                    cost: (customer + warehouse) as f64,
                })
                .collect(),
        }
    }

    #[test]
    fn demand_rows_have_unit_coefficients() {
        let (model, variables) = build(&dataset()).unwrap();

        for (i, row) in variables.ship.iter().enumerate() {
            let c = model.constr(&format!("demand_{}", i)).unwrap();
            assert_eq!(c.sense(), ConstrSense::Equal);
            for ship in row {
                assert_eq!(c.coefficient(*ship), 1.0);
            }
            assert_eq!(c.coefficients().count(), row.len());
        }

        assert_eq!(model.constr("demand_0").unwrap().rhs(), 10.0);
        assert_eq!(model.constr("demand_1").unwrap().rhs(), 5.0);
    }

    #[test]
    fn capacity_rows_are_vacuous_when_closed() {
        let (model, variables) = build(&dataset()).unwrap();

        // With open = 0 the row reads "shipped <= 0"
        let c = model.constr("capacity_0").unwrap();
        assert_eq!(c.sense(), ConstrSense::Less);
        assert_eq!(c.rhs(), 0.0);
        assert_eq!(c.coefficient(variables.open[0]), -12.0);
        for row in &variables.ship {
            assert_eq!(c.coefficient(row[0]), 1.0);
        }
    }

    #[test]
    fn objective_mixes_fixed_and_shipping_cost() {
        let (model, variables) = build(&dataset()).unwrap();

        let objective = model.objective().unwrap();
        assert_eq!(objective.sense(), ObjSense::Minimize);
        assert_eq!(objective.expr().coefficient(variables.open[0]), 100.0);
        assert_eq!(objective.expr().coefficient(variables.open[1]), 80.0);
        assert_eq!(objective.expr().coefficient(variables.ship[0][0]), 8.0);
        assert_eq!(objective.expr().coefficient(variables.ship[1][1]), 10.0);
    }

    #[test]
    fn missing_supply_cost_fails_the_build() {
        let mut data = dataset();
        data.supply_costs.retain(|s| !(s.customer == 2 && s.warehouse == 7));

        let err = build(&data).unwrap_err();
        assert!(matches!(err, BuildError::Schema { .. }));
        assert!(err.to_string().contains("(customer 2, warehouse 7)"));
    }

    #[test]
    fn build_is_deterministic() {
        let (a, _) = build(&dataset()).unwrap();
        let (b, _) = build(&dataset()).unwrap();
        assert_eq!(a.num_vars(), b.num_vars());
        assert_eq!(a.num_constrs(), b.num_constrs());
        assert_eq!(
            a.objective().unwrap().expr(),
            b.objective().unwrap().expr()
        );
    }
}
