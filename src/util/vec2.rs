use serde::{Deserialize, Serialize};

/// 2D vector used for player positions
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// False if either component is NaN or infinite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn approx_eq(&self, other: Vec2, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.x, 3.0);
        assert_eq!(v.y, 4.0);
    }

    #[test]
    fn test_default_is_origin() {
        assert_eq!(Vec2::default(), Vec2::ZERO);
    }

    #[test]
    fn test_is_finite() {
        assert!(Vec2::new(10.0, -20.0).is_finite());
        assert!(!Vec2::new(f32::NAN, 0.0).is_finite());
        assert!(!Vec2::new(0.0, f32::INFINITY).is_finite());
    }

    #[test]
    fn test_approx_eq() {
        let a = Vec2::new(1.0, 2.0);
        assert!(a.approx_eq(Vec2::new(1.0000001, 2.0), 1e-4));
        assert!(!a.approx_eq(Vec2::new(1.5, 2.0), 1e-4));
    }
}
