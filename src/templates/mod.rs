//! One module per problem family. Every template follows the same shape:
//! `Sets::new` and `Parameters::new` validate the dataset, the builder
//! declares variables, objective and base constraints, seals the model and
//! invokes the evolve hook exactly once.

pub mod covering;
pub mod cwlp;
pub mod jssp;
pub mod mcnd;
pub mod pdptw;
pub mod tsp;
pub mod utils;
