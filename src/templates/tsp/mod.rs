//! Traveling salesman with Miller-Tucker-Zemlin subtour elimination.

pub mod model;
pub mod sets_and_parameters;

pub use model::{build, build_with, TspModelBuilder, Variables};
pub use sets_and_parameters::{Parameters, Sets};

use crate::evolve::TemplateKind;

/// Extension point identifier of this template.
pub const KIND: TemplateKind = TemplateKind::Tsp;
