//! Dense linear algebra for the bundled LP engine.

pub mod lu;

pub use lu::{DenseLu, LinalgError};
