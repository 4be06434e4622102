//! # Fixed-Timestep Driver
//!
//! Turns variable wall-clock frame times into whole simulation ticks:
//!
//! ```text
//! frame_time ──clamp(0, 0.25 s)──> accumulator
//!                                   │
//!                  while acc >= dt: │ sim.step(); acc -= dt
//!                                   ▼
//!                         alpha = acc / dt   (render interpolation)
//! ```
//!
//! The clamp stops a long stall (debugger, window drag) from queueing an
//! unbounded burst of catch-up ticks.

use std::time::Instant;

use skirmish_shared::constants::MAX_FRAME_TIME;

use crate::error::SimError;
use crate::simulation::Simulation;

/// Step timing statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoopStats {
    /// Frames fed to the loop.
    pub frames: u64,
    /// Ticks executed.
    pub ticks: u64,
    /// Frames whose time was cut to [`MAX_FRAME_TIME`].
    pub clamped_frames: u64,
    /// Most ticks run in one frame.
    pub max_ticks_per_frame: u32,
    /// Rolling average duration of one `step()`, in microseconds.
    pub avg_step_us: u64,
    /// Longest `step()` seen, in microseconds.
    pub max_step_us: u64,
}

/// Accumulator-based driver for a [`Simulation`].
///
/// # Example
///
/// ```rust
/// use skirmish::{GameLoop, Simulation};
/// use skirmish_shared::SimConfig;
///
/// let mut sim = Simulation::new(SimConfig::default()).expect("valid config");
/// let mut driver = GameLoop::new(sim.dt());
///
/// let alpha = driver.advance(&mut sim, 0.04).expect("no fault");
/// assert_eq!(sim.tick(), 2);
/// assert!((0.0..1.0).contains(&alpha));
/// ```
pub struct GameLoop {
    dt: f32,
    accumulator: f32,
    last_frame: Option<Instant>,
    stats: LoopStats,
}

impl GameLoop {
    /// Creates a driver for ticks of `dt` seconds.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not a positive finite number.
    #[must_use]
    pub fn new(dt: f32) -> Self {
        assert!(dt > 0.0 && dt.is_finite(), "tick length must be positive and finite, got {dt}");
        Self {
            dt,
            accumulator: 0.0,
            last_frame: None,
            stats: LoopStats::default(),
        }
    }

    /// Feeds `frame_time` seconds and runs every whole tick it covers.
    ///
    /// Negative and NaN frame times count as zero. Returns the
    /// interpolation factor `accumulator / dt` in `[0, 1)`.
    ///
    /// # Errors
    ///
    /// The first [`SimError`] raised by `step()`. Time still in the
    /// accumulator is discarded so a paused simulation does not build up a
    /// backlog.
    pub fn advance(&mut self, sim: &mut Simulation, frame_time: f32) -> Result<f32, SimError> {
        let mut frame_time = if frame_time.is_nan() { 0.0 } else { frame_time.max(0.0) };
        if frame_time > MAX_FRAME_TIME {
            frame_time = MAX_FRAME_TIME;
            self.stats.clamped_frames += 1;
        }
        self.stats.frames += 1;
        self.accumulator += frame_time;

        let mut ticks = 0u32;
        while self.accumulator >= self.dt {
            let start = Instant::now();
            if let Err(err) = sim.step() {
                self.accumulator = 0.0;
                return Err(err);
            }
            self.record_step(start);
            self.accumulator -= self.dt;
            ticks += 1;
        }
        self.stats.max_ticks_per_frame = self.stats.max_ticks_per_frame.max(ticks);
        Ok(self.alpha())
    }

    /// Like [`advance`](Self::advance), measuring the frame time since the
    /// previous call. The first call runs no ticks.
    ///
    /// # Errors
    ///
    /// As [`advance`](Self::advance).
    pub fn advance_wall_clock(&mut self, sim: &mut Simulation) -> Result<f32, SimError> {
        let now = Instant::now();
        let frame_time = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_frame = Some(now);
        self.advance(sim, frame_time)
    }

    fn record_step(&mut self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.stats.ticks += 1;
        self.stats.max_step_us = self.stats.max_step_us.max(us);
        self.stats.avg_step_us = if self.stats.ticks == 1 {
            us
        } else {
            (self.stats.avg_step_us * 15 + us) / 16
        };
    }

    /// Interpolation factor between the last two ticks.
    #[inline]
    #[must_use]
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.dt).clamp(0.0, 1.0)
    }

    /// Seconds waiting for the next tick.
    #[inline]
    #[must_use]
    pub const fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Drops pending time and statistics.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_frame = None;
        self.stats = LoopStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::flags;
    use skirmish_shared::{DirectorConfig, SimConfig, Vec2};

    fn sim(tick_rate: u32) -> Simulation {
        Simulation::new(SimConfig {
            max_entities: 32,
            tick_rate,
            director: DirectorConfig {
                target_food: 0,
                escalation_interval: 0.0,
                ..DirectorConfig::default()
            },
            ..SimConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_partial_frames_accumulate() {
        let mut sim = sim(8);
        let mut driver = GameLoop::new(sim.dt());

        let alpha = driver.advance(&mut sim, 0.0625).unwrap();
        assert_eq!(sim.tick(), 0);
        assert!((alpha - 0.5).abs() < 1e-6);

        let alpha = driver.advance(&mut sim, 0.0625).unwrap();
        assert_eq!(sim.tick(), 1);
        assert!(alpha.abs() < 1e-6);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut sim = sim(4);
        let mut driver = GameLoop::new(sim.dt());

        driver.advance(&mut sim, 3.0).unwrap();
        assert_eq!(sim.tick(), 1);
        assert_eq!(driver.stats().clamped_frames, 1);
    }

    #[test]
    fn test_bad_frame_times_run_nothing() {
        let mut sim = sim(8);
        let mut driver = GameLoop::new(sim.dt());
        driver.advance(&mut sim, -1.0).unwrap();
        driver.advance(&mut sim, f32::NAN).unwrap();
        assert_eq!(sim.tick(), 0);
        assert_eq!(driver.accumulator(), 0.0);
    }

    #[test]
    #[should_panic(expected = "tick length must be positive")]
    fn test_zero_dt_is_rejected() {
        let _ = GameLoop::new(0.0);
    }

    #[test]
    #[should_panic(expected = "tick length must be positive")]
    fn test_nan_dt_is_rejected() {
        let _ = GameLoop::new(f32::NAN);
    }

    #[test]
    fn test_fault_stops_and_drains() {
        let mut sim = sim(8);
        let id = sim.allocate_local().unwrap().index();
        sim.stores_mut().physics.set_velocity(id, Vec2::new(f32::INFINITY, 0.0));
        sim.stores_mut().flags.set(id, flags::ACTIVE | flags::BOT);

        let mut driver = GameLoop::new(sim.dt());
        assert!(driver.advance(&mut sim, 0.25).is_err());
        assert_eq!(sim.tick(), 0);
        assert_eq!(driver.accumulator(), 0.0);
        assert!(matches!(driver.advance(&mut sim, 0.25), Err(SimError::Paused)));
    }
}
