//! Job-shop scheduling: minimize the makespan subject to per-job precedence
//! and big-M disjunctive machine orderings.

pub mod model;
pub mod sets_and_parameters;

pub use model::{build, build_with, JsspModelBuilder, Variables};
pub use sets_and_parameters::{Parameters, Sets};

use crate::evolve::TemplateKind;

/// Extension point identifier of this template.
pub const KIND: TemplateKind = TemplateKind::Jssp;
