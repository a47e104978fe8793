pub mod integrator;

pub use integrator::{integrate, verlet_step};
