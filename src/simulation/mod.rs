// simulation/mod.rs
// Re-exports and module declarations for simulation submodules

pub mod history;
pub mod simulation;
pub use history::*;
pub use simulation::*;
