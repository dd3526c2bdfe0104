//! Contact detection between player and pursuer
//!
//! An axis-aligned box test: both axis gaps must be under `CONTACT_RANGE`.

use glam::Vec2;

use crate::consts::CONTACT_RANGE;

/// True when the two entities touch
pub fn has_collided(a: Vec2, b: Vec2) -> bool {
    let gap = (a - b).abs();
    gap.x < CONTACT_RANGE && gap.y < CONTACT_RANGE
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_overlap_on_both_axes() {
        assert!(has_collided(Vec2::new(100.0, 100.0), Vec2::new(149.0, 51.0)));
        assert!(has_collided(Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn test_boundary_is_exclusive() {
        assert!(!has_collided(Vec2::new(100.0, 100.0), Vec2::new(150.0, 100.0)));
        assert!(!has_collided(Vec2::new(100.0, 100.0), Vec2::new(100.0, 50.0)));
    }

    #[test]
    fn test_box_not_circle() {
        // Corner of the box is ~69 units away but still a hit
        assert!(has_collided(Vec2::new(0.0, 0.0), Vec2::new(49.0, 49.0)));
        // One axis close is not enough
        assert!(!has_collided(Vec2::new(0.0, 0.0), Vec2::new(10.0, 60.0)));
    }

    proptest! {
        #[test]
        fn prop_symmetric(
            ax in -1000.0f32..1000.0, ay in -1000.0f32..1000.0,
            bx in -1000.0f32..1000.0, by in -1000.0f32..1000.0,
        ) {
            let a = Vec2::new(ax, ay);
            let b = Vec2::new(bx, by);
            prop_assert_eq!(has_collided(a, b), has_collided(b, a));
        }
    }
}
