//! Roll actions and the rotation animation that plays them

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use rand::Rng;

/// Multiplier applied to the quarter turns so every roll spins several times
pub const DEFAULT_SPIN_MULTIPLIER: u32 = 10;
/// Largest multiplier the settings accept
pub const MAX_SPIN_MULTIPLIER: u32 = 1000;
pub const DEFAULT_ROLL_DURATION_SECS: f32 = 0.5;
pub const MIN_QUARTER_TURNS: u32 = 1;
pub const MAX_QUARTER_TURNS: u32 = 4;

/// A rotate-by action around X and Z.
///
/// Only the spin is modelled; which face ends up on top is not tracked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollAction {
    pub quarter_turns_x: u32,
    pub quarter_turns_z: u32,
    pub spin_multiplier: u32,
    pub duration_secs: f32,
}

impl RollAction {
    /// Draw independent quarter-turn counts in `1..=4` for both axes.
    pub fn random(rng: &mut impl Rng, spin_multiplier: u32, duration_secs: f32) -> Self {
        Self {
            quarter_turns_x: rng.gen_range(MIN_QUARTER_TURNS..=MAX_QUARTER_TURNS),
            quarter_turns_z: rng.gen_range(MIN_QUARTER_TURNS..=MAX_QUARTER_TURNS),
            spin_multiplier,
            duration_secs,
        }
    }

    /// Rotation around X in degrees
    pub fn degrees_x(&self) -> u64 {
        u64::from(self.quarter_turns_x) * 90 * u64::from(self.spin_multiplier)
    }

    /// Rotation around Z in degrees
    pub fn degrees_z(&self) -> u64 {
        u64::from(self.quarter_turns_z) * 90 * u64::from(self.spin_multiplier)
    }

    pub fn radians_x(&self) -> f32 {
        self.quarter_turns_x as f32 * FRAC_PI_2 * self.spin_multiplier as f32
    }

    pub fn radians_z(&self) -> f32 {
        self.quarter_turns_z as f32 * FRAC_PI_2 * self.spin_multiplier as f32
    }
}

/// One in-flight roll on a die.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollTrack {
    pub action: RollAction,
    pub elapsed: f32,
    /// Angles (x, z) applied so far, in radians
    pub applied: Vec2,
}

impl RollTrack {
    pub fn progress(&self) -> f32 {
        if self.action.duration_secs <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.action.duration_secs).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    fn target_angles(&self) -> Vec2 {
        let p = self.progress();
        Vec2::new(self.action.radians_x() * p, self.action.radians_z() * p)
    }
}

/// Rolls playing on a die. Several rolls may overlap; each keeps its own
/// clock and they add up.
#[derive(Component, Debug, Clone, Default)]
pub struct RollAnimation {
    pub tracks: Vec<RollTrack>,
}

impl RollAnimation {
    pub fn new(action: RollAction) -> Self {
        Self {
            tracks: vec![RollTrack {
                action,
                elapsed: 0.0,
                applied: Vec2::ZERO,
            }],
        }
    }

    pub fn push(&mut self, action: RollAction) {
        self.tracks.push(RollTrack {
            action,
            elapsed: 0.0,
            applied: Vec2::ZERO,
        });
    }

    pub fn is_finished(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Advance every track by `dt` and return the rotation to apply on top
    /// of the current local rotation. Finished tracks are dropped.
    pub fn advance(&mut self, dt: f32) -> Quat {
        let mut delta = Quat::IDENTITY;

        for track in self.tracks.iter_mut() {
            track.elapsed += dt;
            let target = track.target_angles();
            let step = target - track.applied;
            track.applied = target;
            delta *= Quat::from_euler(EulerRot::XYZ, step.x, 0.0, step.y);
        }

        self.tracks.retain(|track| !track.is_finished());
        delta.normalize()
    }
}
