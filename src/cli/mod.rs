//! Terminal front-end for the cost engine

pub mod export;
pub mod pareto;
pub mod setup;
pub mod summary;
pub mod ui;
