//! Genetics module - genome layout, arithmetic crossover, and Gaussian mutation.

pub mod crossover;
pub mod genome;
pub mod mutation;

pub use crossover::{blend, crossover};
pub use genome::{Gene, Genome};
pub use mutation::{mutate, standard_normal};
