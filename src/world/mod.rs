pub mod physics_world;
pub mod simulation;

pub use physics_world::PhysicsWorld;
pub use simulation::{Simulation, SimulationId, StepStats};
