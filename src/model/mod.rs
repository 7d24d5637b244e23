//! Solver-independent MILP model representation.
//!
//! A [`Model`] owns its variables, constraints and objective. It is built in
//! two phases: the template declares the base structure and calls
//! [`Model::seal_base`], after which the objective is frozen and only
//! additional variables and constraints may be appended. Nothing can ever be
//! removed, so the base model survives any later extension untouched.

mod expr;

use std::collections::BTreeMap;

pub use expr::{ConstrSense, Ineq, LinExpr, LinSum, Relation};

use derive_more::Display;

use crate::error::{BuildError, Result};

/// Opaque handle to a decision variable of a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(pub(crate) usize);

impl Var {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum VarType {
    #[display(fmt = "binary")]
    Binary,
    #[display(fmt = "integer")]
    Integer,
    #[display(fmt = "continuous")]
    Continuous,
}

/// Metadata of a declared variable. The domain is fixed at creation and never
/// changes afterwards.
#[derive(Debug, Clone)]
pub struct VarData {
    name: String,
    vtype: VarType,
    lb: f64,
    ub: f64,
}

impl VarData {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vtype(&self) -> VarType {
        self.vtype
    }

    pub fn lb(&self) -> f64 {
        self.lb
    }

    pub fn ub(&self) -> f64 {
        self.ub
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ObjSense {
    #[display(fmt = "minimize")]
    Minimize,
    #[display(fmt = "maximize")]
    Maximize,
}

/// The single objective of a model.
#[derive(Debug, Clone)]
pub struct Objective {
    expr: LinExpr,
    sense: ObjSense,
}

impl Objective {
    pub fn expr(&self) -> &LinExpr {
        &self.expr
    }

    pub fn sense(&self) -> ObjSense {
        self.sense
    }
}

/// A named linear constraint, normalized to `coefficients (sense) rhs`.
#[derive(Debug, Clone)]
pub struct Constr {
    name: String,
    coefficients: BTreeMap<Var, f64>,
    sense: ConstrSense,
    rhs: f64,
}

impl Constr {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coefficients(&self) -> impl Iterator<Item = (Var, f64)> + '_ {
        self.coefficients.iter().map(|(v, c)| (*v, *c))
    }

    /// The coefficient of `var`, or `0.0` if it does not occur.
    pub fn coefficient(&self, var: Var) -> f64 {
        self.coefficients.get(&var).copied().unwrap_or(0.0)
    }

    pub fn sense(&self) -> ConstrSense {
        self.sense
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }
}

/// An in-memory mathematical program: index-free variables, one objective and
/// an append-only list of constraints.
#[derive(Debug)]
pub struct Model {
    name: String,
    vars: Vec<VarData>,
    constrs: Vec<Constr>,
    objective: Option<Objective>,
    /// `(vars, constrs)` counts at the time the base model was sealed.
    sealed_at: Option<(usize, usize)>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Model {
        Model {
            name: name.into(),
            vars: Vec::new(),
            constrs: Vec::new(),
            objective: None,
            sealed_at: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_var(&mut self, name: String, vtype: VarType, lb: f64, ub: f64) -> Result<Var> {
        if lb > ub {
            return Err(BuildError::structural(
                &self.name,
                format!("variable `{}` declared with lb {} > ub {}", name, lb, ub),
            ));
        }
        self.vars.push(VarData {
            name,
            vtype,
            lb,
            ub,
        });
        Ok(Var(self.vars.len() - 1))
    }

    pub fn add_constr(&mut self, name: &str, ineq: Ineq) -> Result<()> {
        let Ineq { lhs, sense, rhs } = ineq;
        let (coefficients, constant) = (lhs - rhs).into_parts();
        if let Some(var) = coefficients.keys().find(|v| v.0 >= self.vars.len()) {
            return Err(BuildError::structural(
                &self.name,
                format!(
                    "constraint `{}` references undefined variable index {}",
                    name, var.0
                ),
            ));
        }
        self.constrs.push(Constr {
            name: name.to_string(),
            coefficients,
            sense,
            rhs: -constant,
        });
        Ok(())
    }

    /// Set the objective. A model has exactly one; setting it twice, or after
    /// the base model is sealed, is a structural error.
    pub fn set_objective(&mut self, expr: impl Into<LinExpr>, sense: ObjSense) -> Result<()> {
        if self.sealed_at.is_some() {
            return Err(BuildError::structural(
                &self.name,
                "objective cannot be changed after the base model is sealed",
            ));
        }
        if self.objective.is_some() {
            return Err(BuildError::structural(&self.name, "objective is already set"));
        }
        let expr = expr.into();
        if let Some(var) = expr.vars().find(|v| v.0 >= self.vars.len()) {
            return Err(BuildError::structural(
                &self.name,
                format!("objective references undefined variable index {}", var.0),
            ));
        }
        self.objective = Some(Objective { expr, sense });
        Ok(())
    }

    /// Freeze the base model. Called by a template once all base structure is
    /// declared and before the evolve hook runs.
    pub fn seal_base(&mut self) -> Result<()> {
        if self.sealed_at.is_some() {
            return Err(BuildError::structural(&self.name, "base model sealed twice"));
        }
        if self.objective.is_none() {
            return Err(BuildError::structural(
                &self.name,
                "cannot seal a model without an objective",
            ));
        }
        self.sealed_at = Some((self.vars.len(), self.constrs.len()));
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed_at.is_some()
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constrs(&self) -> usize {
        self.constrs.len()
    }

    /// Number of variables in the sealed base model, if sealed.
    pub fn num_base_vars(&self) -> Option<usize> {
        self.sealed_at.map(|(v, _)| v)
    }

    /// Number of constraints in the sealed base model, if sealed.
    pub fn num_base_constrs(&self) -> Option<usize> {
        self.sealed_at.map(|(_, c)| c)
    }

    /// Number of constraints appended by the evolve hook, if sealed.
    pub fn num_evolve_constrs(&self) -> Option<usize> {
        self.sealed_at.map(|(_, c)| self.constrs.len() - c)
    }

    pub fn vars(&self) -> impl Iterator<Item = (Var, &VarData)> {
        self.vars.iter().enumerate().map(|(i, d)| (Var(i), d))
    }

    pub fn var(&self, var: Var) -> Option<&VarData> {
        self.vars.get(var.0)
    }

    pub fn constrs(&self) -> &[Constr] {
        &self.constrs
    }

    /// Look a constraint up by name. Names are unique by convention, not
    /// enforcement; the first match is returned.
    pub fn constr(&self, name: &str) -> Option<&Constr> {
        self.constrs.iter().find(|c| c.name == name)
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with_vars(n: usize) -> (Model, Vec<Var>) {
        let mut model = Model::new("test");
        let vars = (0..n)
            .map(|i| {
                model
                    .add_var(format!("x_{}", i), VarType::Continuous, 0.0, f64::INFINITY)
                    .unwrap()
            })
            .collect();
        (model, vars)
    }

    #[test]
    fn expressions_collect_terms_and_constants() {
        let (_, vars) = model_with_vars(3);
        let (x, y, z) = (vars[0], vars[1], vars[2]);

        let expr = 2.0 * x + y - 0.5 * z + 3.0;
        assert_eq!(expr.coefficient(x), 2.0);
        assert_eq!(expr.coefficient(y), 1.0);
        assert_eq!(expr.coefficient(z), -0.5);
        assert_eq!(expr.constant(), 3.0);

        let doubled = expr * 2.0;
        assert_eq!(doubled.coefficient(x), 4.0);
        assert_eq!(doubled.constant(), 6.0);
    }

    #[test]
    fn lin_sum_over_vars() {
        let (_, vars) = model_with_vars(4);
        let sum = vars.iter().lin_sum();
        assert_eq!(sum.num_terms(), 4);
        assert!(vars.iter().all(|v| sum.coefficient(*v) == 1.0));
    }

    #[test]
    fn constraints_are_normalized() {
        let (mut model, vars) = model_with_vars(2);
        let (x, y) = (vars[0], vars[1]);

        model.add_constr("c", (x + 2.0).leq(y - 3.0)).unwrap();
        let c = model.constr("c").unwrap();
        assert_eq!(c.coefficient(x), 1.0);
        assert_eq!(c.coefficient(y), -1.0);
        assert_eq!(c.sense(), ConstrSense::Less);
        assert_eq!(c.rhs(), -5.0);
    }

    #[test]
    fn foreign_variables_are_rejected() {
        let (mut model, _) = model_with_vars(1);
        let (_, other_vars) = model_with_vars(5);

        let result = model.add_constr("bad", other_vars[4].leq(1.0));
        assert!(matches!(result, Err(BuildError::Structural { .. })));
    }

    #[test]
    fn objective_is_set_exactly_once() {
        let (mut model, vars) = model_with_vars(1);
        model.set_objective(vars[0], ObjSense::Minimize).unwrap();
        assert!(model.set_objective(vars[0], ObjSense::Maximize).is_err());
    }

    #[test]
    fn sealing_freezes_the_objective_but_not_appends() {
        let (mut model, vars) = model_with_vars(1);
        let x = vars[0];
        model.set_objective(x, ObjSense::Minimize).unwrap();
        model.add_constr("base", x.geq(1.0)).unwrap();
        model.seal_base().unwrap();

        assert_eq!(model.num_base_constrs(), Some(1));
        assert!(model.set_objective(x, ObjSense::Minimize).is_err());
        assert!(model.seal_base().is_err());

        model.add_constr("cut", x.leq(10.0)).unwrap();
        assert_eq!(model.num_base_constrs(), Some(1));
        assert_eq!(model.num_evolve_constrs(), Some(1));
        assert_eq!(model.num_constrs(), 2);
    }

    #[test]
    fn sealing_requires_an_objective() {
        let (mut model, _) = model_with_vars(1);
        assert!(model.seal_base().is_err());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut model = Model::new("test");
        let result = model.add_var("x".into(), VarType::Continuous, 1.0, 0.0);
        assert!(matches!(result, Err(BuildError::Structural { .. })));
    }
}
