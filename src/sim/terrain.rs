//! Scrolling ground line
//!
//! The floor is the chart's price line: layered sine noise around a
//! baseline, with occasional sharp "crash" dips. Heights are a pure function
//! of world x and the run's noise phases, so the cached point list is only
//! a window over that function. Queries outside the window compute the same
//! samples on the fly.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::TerrainTuning;

/// Noise layers: (weight, frequency)
const NOISE_LAYERS: [(f32, f32); 3] = [(0.6, 0.013), (0.3, 0.041), (0.25, 0.007)];
/// Frequency of the slow wave that gates crash dips
const CRASH_FREQUENCY: f32 = 0.0031;

/// One cached sample of the ground line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainPoint {
    pub x: f32,
    pub y: f32,
    /// Inside a crash dip (drawn in red)
    pub crash: bool,
}

/// Ground height generator with an amortized sliding cache
#[derive(Debug, Clone)]
pub struct Terrain {
    tuning: TerrainTuning,
    /// Per-run phase offsets: one per noise layer plus the crash wave
    phases: [f32; 4],
    points: VecDeque<TerrainPoint>,
    /// Sample index of `points[0]`
    first_index: i64,
}

impl Terrain {
    /// Create a ground line with phases drawn from the run RNG
    pub fn new<R: Rng + ?Sized>(tuning: &TerrainTuning, rng: &mut R) -> Self {
        let mut phases = [0.0; 4];
        for phase in &mut phases {
            *phase = rng.random_range(0.0..std::f32::consts::TAU);
        }
        Self::with_phases(tuning, phases)
    }

    pub fn with_phases(tuning: &TerrainTuning, phases: [f32; 4]) -> Self {
        Self {
            tuning: tuning.clone(),
            phases,
            points: VecDeque::new(),
            first_index: 0,
        }
    }

    /// Layered noise in roughly [-1.15, 1.15]
    fn noise(&self, x: f32) -> f32 {
        NOISE_LAYERS
            .iter()
            .zip(self.phases.iter())
            .map(|(&(weight, freq), phase)| weight * (x * freq + phase).sin())
            .sum()
    }

    /// Sample `index` of the ground line (x = index * step)
    pub fn sample(&self, index: i64) -> TerrainPoint {
        let t = &self.tuning;
        let x = index as f32 * t.step;
        let n = self.noise(x);
        let mut y = t.baseline_y + n * t.amplitude;

        let crash = (x * CRASH_FREQUENCY + self.phases[3]).sin() < t.crash_threshold;
        if crash {
            y += t.crash_depth + n.abs() * t.crash_volatility;
        }

        TerrainPoint {
            x,
            y: y.clamp(t.min_y, t.max_y),
            crash,
        }
    }

    fn point(&self, index: i64) -> TerrainPoint {
        let offset = index - self.first_index;
        if offset >= 0 {
            if let Some(p) = self.points.get(offset as usize) {
                return *p;
            }
        }
        self.sample(index)
    }

    /// Ground height (screen y) at world x, linearly interpolated
    pub fn ground_height(&self, x: f32) -> f32 {
        if !x.is_finite() {
            return self.tuning.baseline_y;
        }
        let step = self.tuning.step;
        let index = (x / step).floor() as i64;
        let a = self.point(index);
        let b = self.point(index + 1);
        let t = ((x - a.x) / step).clamp(0.0, 1.0);
        a.y + (b.y - a.y) * t
    }

    /// Slide the cache window: trim samples fully behind the camera, append
    /// samples up to `camera_x + horizon`.
    pub fn advance(&mut self, camera_x: f32, horizon: f32) {
        let step = self.tuning.step;
        let start = ((camera_x - self.tuning.trail) / step).floor() as i64;
        let end = ((camera_x + horizon) / step).ceil() as i64 + 1;

        if self.points.is_empty() || start >= self.first_index + self.points.len() as i64 {
            // Cold start or a jump past the whole window
            self.points.clear();
            self.first_index = start;
        }

        while self.first_index < start && !self.points.is_empty() {
            self.points.pop_front();
            self.first_index += 1;
        }

        let mut next = self.first_index + self.points.len() as i64;
        while next <= end {
            let point = self.sample(next);
            self.points.push_back(point);
            next += 1;
        }
    }

    /// Cached samples, left to right
    pub fn points(&self) -> impl Iterator<Item = &TerrainPoint> {
        self.points.iter()
    }

    pub fn cached_len(&self) -> usize {
        self.points.len()
    }

    pub fn baseline(&self) -> f32 {
        self.tuning.baseline_y
    }
}
