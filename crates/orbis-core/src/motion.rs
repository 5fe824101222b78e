//! Per-frame rotation and orbit rates

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Angular increments applied once per frame, in radians
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub earth_spin: f32,
    pub cloud_spin: f32,
    pub moon_spin: f32,
    pub moon_orbit_step: f32,
    pub moon_orbit_radius: f32,
    pub initial_moon_phase: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            earth_spin: 0.002,
            cloud_spin: 0.0005,
            moon_spin: 0.004,
            moon_orbit_step: 0.004,
            moon_orbit_radius: 60.0,
            initial_moon_phase: 0.0,
        }
    }
}

/// Point on a circular orbit in the XZ plane
pub fn orbit_position(phase: f32, radius: f32) -> Vec3 {
    let (sin, cos) = phase.sin_cos();
    Vec3::new(cos * radius, 0.0, sin * radius)
}

/// Normalize an angle into `[0, 2π)`
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Mutable animation bookkeeping carried between frames
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationState {
    pub moon_phase: f32,
    pub frames: u64,
    /// Seconds of animated (unpaused) time
    pub elapsed: f32,
}

impl AnimationState {
    pub fn new(initial_moon_phase: f32) -> Self {
        Self {
            moon_phase: wrap_phase(initial_moon_phase),
            ..Self::default()
        }
    }

    /// Advance the moon one step along its orbit and return its new position
    pub fn advance_moon(&mut self, motion: &MotionConfig) -> Vec3 {
        self.moon_phase = wrap_phase(self.moon_phase + motion.moon_orbit_step);
        orbit_position(self.moon_phase, motion.moon_orbit_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn angular_distance(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(TAU);
        d.min(TAU - d)
    }

    #[test]
    fn test_orbit_position() {
        let p = orbit_position(0.0, 60.0);
        assert_eq!(p, Vec3::new(60.0, 0.0, 0.0));

        let p = orbit_position(FRAC_PI_2, 60.0);
        assert!(p.x.abs() < 1e-4);
        assert!((p.z - 60.0).abs() < 1e-4);

        let p = orbit_position(PI, 60.0);
        assert!((p.x + 60.0).abs() < 1e-4);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn test_wrap_phase() {
        assert_eq!(wrap_phase(0.0), 0.0);
        assert!((wrap_phase(TAU + 1.0) - 1.0).abs() < 1e-5);
        assert!((wrap_phase(-1.0) - (TAU - 1.0)).abs() < 1e-5);
        assert!(wrap_phase(-1e-9) < TAU);
    }

    #[test]
    fn test_phase_after_many_frames() {
        let motion = MotionConfig {
            initial_moon_phase: 1.0,
            ..MotionConfig::default()
        };
        let mut state = AnimationState::new(motion.initial_moon_phase);
        let frames = 1000;
        let mut position = Vec3::ZERO;
        for _ in 0..frames {
            position = state.advance_moon(&motion);
        }

        let expected = (1.0 + frames as f32 * motion.moon_orbit_step).rem_euclid(TAU);
        assert!(angular_distance(state.moon_phase, expected) < 1e-3);
        assert!((0.0..TAU).contains(&state.moon_phase));
        assert!((position.length() - 60.0).abs() < 1e-3);
        assert_eq!(position.y, 0.0);
    }
}
