//! Random target placement
//!
//! The target is anchored at its top-left corner and must stay fully inside
//! the playfield: the viewport minus the reserved header strip.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target top-left anchor in screen pixels
pub type Position = Vec2;

/// Screen dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PlacementError {
    #[error(
        "layout too small: viewport {width}x{height} with header {reserved_header} cannot fit target {target_size}"
    )]
    LayoutTooSmall {
        width: f32,
        height: f32,
        reserved_header: f32,
        target_size: f32,
    },
}

/// Everything placement needs to know about the screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub viewport: Viewport,
    /// Height of the score/time header the target must not overlap
    pub reserved_header: f32,
    /// Side length of the square target
    pub target_size: f32,
}

impl Layout {
    pub fn new(viewport: Viewport, reserved_header: f32, target_size: f32) -> Self {
        Self {
            viewport,
            reserved_header,
            target_size,
        }
    }

    /// Largest allowed anchor on each axis, or `LayoutTooSmall`
    pub fn validate(&self) -> Result<Vec2, PlacementError> {
        let Self {
            viewport,
            reserved_header,
            target_size,
        } = *self;

        let finite = [viewport.width, viewport.height, reserved_header, target_size]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        let max_x = viewport.width - target_size;
        let max_y = viewport.height - reserved_header - target_size;

        if !finite || max_x <= 0.0 || max_y <= 0.0 {
            return Err(PlacementError::LayoutTooSmall {
                width: viewport.width,
                height: viewport.height,
                reserved_header,
                target_size,
            });
        }
        Ok(Vec2::new(max_x, max_y))
    }

    /// Whether `pos` keeps the whole target inside the playfield
    pub fn contains(&self, pos: Position) -> bool {
        match self.validate() {
            Ok(max) => pos.x >= 0.0 && pos.y >= 0.0 && pos.x <= max.x && pos.y <= max.y,
            Err(_) => false,
        }
    }
}

/// Uniform random placer backed by a seedable PCG stream
#[derive(Debug, Clone)]
pub struct RandomPlacer {
    rng: Pcg32,
}

impl Default for RandomPlacer {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomPlacer {
    /// Reproducible placer (tests, replays)
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// Pick a whole-pixel anchor uniformly inside the playfield
    pub fn place(
        &mut self,
        viewport: Viewport,
        reserved_header: f32,
        target_size: f32,
    ) -> Result<Position, PlacementError> {
        self.place_in(&Layout::new(viewport, reserved_header, target_size))
    }

    pub fn place_in(&mut self, layout: &Layout) -> Result<Position, PlacementError> {
        let max = layout.validate()?;
        // Inclusive float ranges may return the bound itself; clamp before flooring
        let x = self.rng.random_range(0.0..=max.x).min(max.x).floor();
        let y = self.rng.random_range(0.0..=max.y).min(max.y).floor();
        Ok(Vec2::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_place_phone_screen() {
        let mut placer = RandomPlacer::new(7);
        let layout = Layout::new(Viewport::new(390.0, 844.0), 200.0, 60.0);
        for _ in 0..500 {
            let pos = placer.place_in(&layout).unwrap();
            assert!(layout.contains(pos), "{pos:?} escaped the playfield");
            assert_eq!(pos.x, pos.x.floor());
            assert_eq!(pos.y, pos.y.floor());
        }
    }

    #[test]
    fn test_same_seed_same_positions() {
        let mut a = RandomPlacer::new(42);
        let mut b = RandomPlacer::new(42);
        let vp = Viewport::new(800.0, 600.0);
        for _ in 0..20 {
            assert_eq!(
                a.place(vp, 100.0, 60.0).unwrap(),
                b.place(vp, 100.0, 60.0).unwrap()
            );
        }
    }

    #[test]
    fn test_layout_too_small() {
        let mut placer = RandomPlacer::new(1);

        // Exactly as wide as the target is not enough
        let err = placer.place(Viewport::new(60.0, 800.0), 200.0, 60.0);
        assert!(matches!(err, Err(PlacementError::LayoutTooSmall { .. })));

        // Header eats the vertical space
        let err = placer.place(Viewport::new(400.0, 250.0), 200.0, 60.0);
        assert!(matches!(err, Err(PlacementError::LayoutTooSmall { .. })));

        let err = placer.place(Viewport::new(f32::NAN, 800.0), 200.0, 60.0);
        assert!(err.is_err());
    }

    #[test]
    fn test_sliver_playfield_pins_to_origin() {
        let mut placer = RandomPlacer::new(3);
        let pos = placer
            .place(Viewport::new(60.5, 260.5), 200.0, 60.0)
            .unwrap();
        assert_eq!(pos, Vec2::ZERO);
    }

    proptest! {
        #[test]
        fn prop_position_inside_playfield(
            seed in any::<u64>(),
            target_size in 1.0f32..200.0,
            reserved_header in 0.0f32..300.0,
            extra_w in 0.01f32..3000.0,
            extra_h in 0.01f32..3000.0,
        ) {
            let viewport = Viewport::new(
                target_size + extra_w,
                reserved_header + target_size + extra_h,
            );
            let layout = Layout::new(viewport, reserved_header, target_size);
            // Float rounding in the sums can shrink a tiny margin to nothing
            prop_assume!(layout.validate().is_ok());

            let mut placer = RandomPlacer::new(seed);
            let pos = placer.place_in(&layout).unwrap();
            prop_assert!(pos.x >= 0.0 && pos.x <= viewport.width - target_size);
            prop_assert!(
                pos.y >= 0.0 && pos.y <= viewport.height - reserved_header - target_size
            );
        }
    }
}
