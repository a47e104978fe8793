use crate::shapes::ShapeSet;

pub mod distance_constraint;
pub mod fixed_constraint;

// Re-export the constraint types for easier access
pub use distance_constraint::DistanceConstraint;
pub use fixed_constraint::FixedConstraint;

/// A positional constraint between shapes.
pub trait Constraint: std::fmt::Debug {
    /// Moves the constrained shapes towards satisfying the constraint.
    /// Returns the violation found before correcting, in world distance units.
    fn enforce(&self, shapes: &mut ShapeSet) -> f32;
}
