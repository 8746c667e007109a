//! Fireworks particle bursts.
//!
//! Particles are physics-free: constant velocity plus a small constant downward
//! pull, fading linearly over their time-to-live. Time is measured in 60 Hz
//! frames so the motion constants read the same as the per-frame animation.

use std::f64::consts::TAU;
use std::ops::Range;

use crate::rng::RandomSource;

/// Downward acceleration per frame².
pub const GRAVITY: f64 = 0.05;
/// One animation frame at 60 Hz.
pub const FRAME_MS: f64 = 1000.0 / 60.0;
/// Upper bound on a single step; a backgrounded tab must not teleport particles.
pub const MAX_STEP_FRAMES: f64 = 4.0;

const FALLBACK_COLOR: &str = "#ffffff";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub life: f64, // frames lived
    pub ttl: f64,  // frames until expiry
    pub size: f64,
    pub color: String,
}

impl Particle {
    fn step(&mut self, dt: f64) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        self.vy += GRAVITY * dt;
        self.life += dt;
    }

    pub fn opacity(&self) -> f64 {
        if self.ttl <= 0.0 {
            return 0.0;
        }
        (1.0 - self.life / self.ttl).max(0.0)
    }

    pub fn is_expired(&self) -> bool {
        self.life >= self.ttl
    }
}

/// Shape of one celebration: how many bursts, how dense, how fast, which colours.
#[derive(Clone, Debug, PartialEq)]
pub struct BurstSpec {
    pub bursts: usize,
    pub particles_per_burst: Range<usize>,
    pub speed: Range<f64>,
    /// Extra speed added per successive burst.
    pub speed_step: f64,
    pub ttl_frames: Range<u32>,
    pub size: Range<f64>,
    pub palette: Vec<String>,
}

impl Default for BurstSpec {
    fn default() -> Self {
        Self {
            bursts: 6,
            particles_per_burst: 18..30,
            speed: 2.0..7.0,
            speed_step: 0.4,
            ttl_frames: 60..100,
            size: 2.0..5.0,
            palette: crate::config::FIREWORK_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

fn count_in<R: RandomSource + ?Sized>(range: &Range<usize>, rng: &mut R) -> usize {
    range.start + rng.index(range.end.saturating_sub(range.start))
}

/// Emit `spec.bursts` radial bursts from `origin`. Each burst picks one palette
/// colour and a particle count from `spec.particles_per_burst`.
pub fn create_burst<R: RandomSource + ?Sized>(
    origin: Point,
    spec: &BurstSpec,
    rng: &mut R,
) -> Vec<Particle> {
    let mut particles = Vec::new();
    for burst in 0..spec.bursts {
        let count = count_in(&spec.particles_per_burst, rng);
        let color = if spec.palette.is_empty() {
            FALLBACK_COLOR.to_string()
        } else {
            spec.palette[rng.index(spec.palette.len())].clone()
        };
        for _ in 0..count {
            let angle = rng.next_f64() * TAU;
            let speed =
                rng.range_f64(spec.speed.start, spec.speed.end) + burst as f64 * spec.speed_step;
            let ttl_span = spec.ttl_frames.end.saturating_sub(spec.ttl_frames.start) as usize;
            let ttl = spec.ttl_frames.start as usize + rng.index(ttl_span);
            particles.push(Particle {
                x: origin.x,
                y: origin.y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                life: 0.0,
                ttl: ttl as f64,
                size: rng.range_f64(spec.size.start, spec.size.end),
                color: color.clone(),
            });
        }
    }
    particles
}

fn clamp_step(dt: f64) -> f64 {
    if dt.is_nan() { 0.0 } else { dt.clamp(0.0, MAX_STEP_FRAMES) }
}

/// Move every particle by `dt` frames and keep exactly the ones still alive.
pub fn advance(particles: Vec<Particle>, dt: f64) -> Vec<Particle> {
    let dt = clamp_step(dt);
    particles
        .into_iter()
        .filter_map(|mut p| {
            p.step(dt);
            (!p.is_expired()).then_some(p)
        })
        .collect()
}

/// Owns the live particles of one celebration and refuses to restart mid-show.
pub struct ParticleEngine {
    spec: BurstSpec,
    particles: Vec<Particle>,
    last_frame_ms: Option<f64>,
}

impl ParticleEngine {
    pub fn new(spec: BurstSpec) -> Self {
        Self { spec, particles: Vec::new(), last_frame_ms: None }
    }

    pub fn is_active(&self) -> bool {
        !self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Start a celebration at `origin`. No-op returning false while one runs.
    pub fn trigger<R: RandomSource + ?Sized>(&mut self, origin: Point, rng: &mut R) -> bool {
        if self.is_active() {
            return false;
        }
        self.particles = create_burst(origin, &self.spec, rng);
        self.last_frame_ms = None;
        self.is_active()
    }

    /// Advance by `dt` frames; returns whether anything is left to draw.
    pub fn step(&mut self, dt: f64) -> bool {
        let particles = std::mem::take(&mut self.particles);
        self.particles = advance(particles, dt);
        if !self.is_active() {
            self.last_frame_ms = None;
        }
        self.is_active()
    }

    /// Advance from an animation-frame timestamp. The first frame after a
    /// trigger counts as exactly one frame.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        let dt = self.last_frame_ms.map(|t| (now_ms - t) / FRAME_MS).unwrap_or(1.0);
        self.last_frame_ms = Some(now_ms);
        self.step(dt)
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.last_frame_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::XorShift;

    fn particle(life: f64, ttl: f64) -> Particle {
        Particle {
            x: 0.0,
            y: 0.0,
            vx: 1.0,
            vy: -2.0,
            life,
            ttl,
            size: 2.0,
            color: "#fff".to_string(),
        }
    }

    #[test]
    fn burst_shape_matches_defaults() {
        let mut rng = XorShift::new(9);
        let origin = Point { x: 320.0, y: 200.0 };
        let spec = BurstSpec::default();
        let ps = create_burst(origin, &spec, &mut rng);
        assert!(ps.len() >= 6 * 18 && ps.len() <= 6 * 29, "got {}", ps.len());
        for p in &ps {
            assert_eq!((p.x, p.y), (320.0, 200.0));
            assert_eq!(p.life, 0.0);
            assert!((60.0..100.0).contains(&p.ttl));
            assert!((2.0..5.0).contains(&p.size));
            let speed = (p.vx * p.vx + p.vy * p.vy).sqrt();
            assert!(speed >= 2.0 - 1e-9 && speed < 7.0 + 5.0 * 0.4 + 1e-9);
            assert!(spec.palette.contains(&p.color));
        }
    }

    #[test]
    fn step_applies_velocity_and_gravity() {
        let out = advance(vec![particle(0.0, 10.0)], 1.0);
        let p = &out[0];
        assert_eq!((p.x, p.y), (1.0, -2.0));
        assert!((p.vy - (-2.0 + GRAVITY)).abs() < 1e-12);
        assert_eq!(p.life, 1.0);
        assert!((p.opacity() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn advance_keeps_only_living() {
        let ps = vec![particle(0.0, 5.0), particle(4.0, 5.0), particle(8.5, 9.0)];
        let out = advance(ps, 1.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ttl, 5.0);
        assert!(out.iter().all(|p| p.life < p.ttl));
    }

    #[test]
    fn step_is_clamped() {
        let out = advance(vec![particle(0.0, 100.0)], 1_000.0);
        assert_eq!(out[0].life, MAX_STEP_FRAMES);
        let out = advance(vec![particle(0.0, 100.0)], f64::NAN);
        assert_eq!(out[0].life, 0.0);
    }

    #[test]
    fn opacity_never_negative() {
        assert_eq!(particle(12.0, 10.0).opacity(), 0.0);
        assert_eq!(particle(0.0, 0.0).opacity(), 0.0);
    }

    #[test]
    fn engine_ignores_retrigger_and_drains() {
        let mut rng = XorShift::new(1);
        let mut engine = ParticleEngine::new(BurstSpec::default());
        assert!(!engine.is_active());
        assert!(engine.trigger(Point { x: 0.0, y: 0.0 }, &mut rng));
        let first = engine.particles().to_vec();
        assert!(!engine.trigger(Point { x: 50.0, y: 50.0 }, &mut rng));
        assert_eq!(engine.particles(), first.as_slice());

        let mut frames = 0;
        while engine.step(1.0) {
            frames += 1;
            assert!(frames < 100, "particles outlived max ttl");
        }
        assert!(!engine.is_active());
        assert!(engine.trigger(Point { x: 0.0, y: 0.0 }, &mut rng));
    }

    #[test]
    fn frame_uses_timestamps() {
        let mut engine = ParticleEngine::new(BurstSpec::default());
        engine.trigger(Point { x: 0.0, y: 0.0 }, &mut XorShift::new(2));
        engine.frame(1_000.0);
        assert!(engine.particles().iter().all(|p| p.life == 1.0));
        engine.frame(1_000.0 + 2.0 * FRAME_MS);
        assert!(engine.particles().iter().all(|p| (p.life - 3.0).abs() < 1e-9));
        engine.clear();
        assert!(!engine.is_active());
    }
}
