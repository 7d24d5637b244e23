//! Declarative MILP model templates with an evolvable extension seam.
//!
//! Each template in [`templates`] turns a problem-specific dataset into a
//! solver-independent [`model::Model`]: index sets, validated parameters,
//! typed decision variables, one objective and the family's base
//! constraints. After the base structure is sealed, an [`evolve::Evolve`]
//! hook supplied by an external search process may append additional
//! constraints (cutting planes, symmetry breaks) without being able to touch
//! anything declared before it.
//!
//! Building never solves: the returned model exposes its full structure for
//! a downstream solver adapter to translate.

pub mod data;
pub mod error;
pub mod evolve;
pub mod model;
pub mod templates;

pub use error::{BuildError, Result};
pub use evolve::{Evolve, EvolveFn, EvolveScope, NoEvolve, TemplateKind};
pub use model::{ConstrSense, LinExpr, LinSum, Model, ObjSense, Relation, Var, VarType};
