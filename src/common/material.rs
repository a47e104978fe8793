//! Defines surface material properties.

/// Surface properties of a shape that affect contact response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Coefficient of friction. Range [0, infinity).
    /// Higher values mean more resistance to sliding along a contact.
    pub friction: f32,
}

impl Material {
    /// Creates a new material with the given friction (clamped to be non-negative).
    pub fn new(friction: f32) -> Self {
        Material {
            friction: friction.max(0.0),
        }
    }

    /// Friction used by a contact between two materials (geometric mean).
    pub fn combined_friction(&self, other: &Material) -> f32 {
        (self.friction * other.friction).sqrt()
    }
}

impl Default for Material {
    fn default() -> Self {
        Material { friction: 0.5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_material_new_clamps_negative_friction() {
        let m = Material::new(-2.0);
        assert_eq!(m.friction, 0.0);
    }

    #[test]
    fn test_combined_friction() {
        let a = Material::new(0.25);
        let b = Material::new(1.0);
        assert!((a.combined_friction(&b) - 0.5).abs() < EPSILON);
        assert!((b.combined_friction(&a) - 0.5).abs() < EPSILON);
        assert_eq!(Material::new(0.0).combined_friction(&b), 0.0);
    }
}
