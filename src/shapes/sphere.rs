#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub radius: f32,
}

impl Sphere {
    pub fn new(radius: f32) -> Self {
        assert!(radius >= 0.0, "Sphere radius cannot be negative");
        Self { radius }
    }
}
