//! The extension seam of every template.
//!
//! Each builder declares its base structure, seals the model and then invokes
//! an [`Evolve`] hook exactly once. The hook receives an [`EvolveScope`],
//! which can only append: additional constraints and auxiliary variables go
//! in, nothing comes out. The external search harness supplies the hook; the
//! default [`NoEvolve`] adds nothing.

use crate::error::{BuildError, Result};
use crate::model::{Ineq, Model, Var, VarType};

/// The problem families shipped with this crate. Identifies a template's
/// extension point to callers that dispatch hooks by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Jssp,
    Tsp,
    Cwlp,
    Mcnd,
    Pdptw,
    Covering,
}

/// Append-only view of a sealed model, handed to the evolve hook. Base
/// elements are readable through [`EvolveScope::model`] but cannot be removed
/// or redefined: the scope exposes no mutation besides appending, and the
/// sealed model rejects objective changes itself.
pub struct EvolveScope<'a> {
    model: &'a mut Model,
}

impl<'a> EvolveScope<'a> {
    pub(crate) fn new(model: &'a mut Model) -> Result<Self> {
        if !model.is_sealed() {
            return Err(BuildError::structural(
                model.name(),
                "evolve scope opened before the base model was sealed",
            ));
        }
        Ok(EvolveScope { model })
    }

    /// Read-only access to everything declared so far.
    pub fn model(&self) -> &Model {
        self.model
    }

    /// Declare an auxiliary variable scoped to the evolve region.
    pub fn add_var(&mut self, name: String, vtype: VarType, lb: f64, ub: f64) -> Result<Var> {
        self.model.add_var(name, vtype, lb, ub)
    }

    /// Append an additional constraint (a cut, a symmetry break, ...).
    pub fn add_constr(&mut self, name: &str, ineq: Ineq) -> Result<()> {
        self.model.add_constr(name, ineq)
    }
}

/// An evolve hook for a template whose variables are described by `V`.
///
/// Sets and parameters are created by the caller before the builder runs, so
/// a closure hook can capture them read-only alongside the variables it is
/// given here.
pub trait Evolve<V> {
    fn evolve(&self, scope: &mut EvolveScope<'_>, vars: &V) -> Result<()>;
}

/// The default hook: adds zero constraints, changes nothing.
pub struct NoEvolve;

impl<V> Evolve<V> for NoEvolve {
    fn evolve(&self, _scope: &mut EvolveScope<'_>, _vars: &V) -> Result<()> {
        Ok(())
    }
}

/// Adapter turning a plain function or closure into an evolve hook.
pub struct EvolveFn<F>(pub F);

impl<V, F> Evolve<V> for EvolveFn<F>
where
    F: Fn(&mut EvolveScope<'_>, &V) -> Result<()>,
{
    fn evolve(&self, scope: &mut EvolveScope<'_>, vars: &V) -> Result<()> {
        (self.0)(scope, vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObjSense, Relation};

    #[test]
    fn scope_requires_a_sealed_model() {
        let mut model = Model::new("test");
        assert!(EvolveScope::new(&mut model).is_err());
    }

    #[test]
    fn scope_appends_are_tracked_separately() {
        let mut model = Model::new("test");
        let x = model
            .add_var("x".into(), VarType::Continuous, 0.0, f64::INFINITY)
            .unwrap();
        model.set_objective(x, ObjSense::Minimize).unwrap();
        model.add_constr("base", x.geq(1.0)).unwrap();
        model.seal_base().unwrap();

        let mut scope = EvolveScope::new(&mut model).unwrap();
        let aux = scope
            .add_var("aux".into(), VarType::Binary, 0.0, 1.0)
            .unwrap();
        scope.add_constr("cut", (x + aux).leq(2.0)).unwrap();

        assert_eq!(model.num_base_constrs(), Some(1));
        assert_eq!(model.num_evolve_constrs(), Some(1));
        assert_eq!(model.num_base_vars(), Some(1));
        assert_eq!(model.num_vars(), 2);
    }
}
