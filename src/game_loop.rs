#![warn(clippy::all, clippy::pedantic)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use log::{debug, info};

use crate::Time;
use crate::game::IDLE_SLEEP_MS;

/// Something the loop can step and draw.
pub trait Simulation {
    /// Advances exactly one logical tick.
    fn update(&mut self);

    /// Draws the current state once.
    fn render(&mut self) -> Result<()>;
}

/// Accumulates wall-clock time and converts it into whole simulation steps.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    interval: Duration,
    debt: Duration,
}

impl FixedTimestep {
    /// Timestep for `update_rate` updates per second.
    pub fn new(update_rate: f64) -> Result<Self> {
        if !(update_rate.is_finite() && update_rate > 0.0) {
            bail!("update rate must be positive, got {update_rate}");
        }
        Ok(Self::with_interval(Duration::from_secs_f64(1.0 / update_rate)))
    }

    #[must_use]
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            debt: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn debt(&self) -> Duration {
        self.debt
    }

    pub fn accumulate(&mut self, elapsed: Duration) {
        self.debt += elapsed;
    }

    /// Pays off one interval when the debt strictly exceeds it.
    pub fn try_consume(&mut self) -> bool {
        if self.debt > self.interval {
            self.debt -= self.interval;
            true
        } else {
            false
        }
    }

    /// Adds `elapsed`, runs every update now due and renders once if any ran.
    /// Returns the number of updates performed.
    pub fn advance<S: Simulation + ?Sized>(&mut self, elapsed: Duration, sim: &mut S) -> Result<u32> {
        self.accumulate(elapsed);
        let mut updates = 0;
        while self.try_consume() {
            sim.update();
            updates += 1;
        }
        if updates > 0 {
            sim.render()?;
        }
        Ok(updates)
    }
}

// Updates and renders counted over the last second
#[derive(Debug)]
struct LoopStats {
    window_start: Instant,
    updates: u32,
    renders: u32,
}

impl LoopStats {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            updates: 0,
            renders: 0,
        }
    }

    fn record(&mut self, updates: u32) {
        self.updates += updates;
        if updates > 0 {
            self.renders += 1;
        }
        if self.window_start.elapsed() >= Duration::from_secs(1) {
            debug!("{} updates, {} renders in the last second", self.updates, self.renders);
            *self = Self::new();
        }
    }
}

/// Drives `sim` at `update_rate` until `running` is cleared. A tick that has
/// started always completes; the flag is checked between iterations.
pub fn run<S: Simulation + ?Sized>(running: &AtomicBool, sim: &mut S, update_rate: f64) -> Result<()> {
    let mut step = FixedTimestep::new(update_rate)?;
    let mut time = Time::new();
    let mut stats = LoopStats::new();
    let idle = Duration::from_millis(IDLE_SLEEP_MS);
    info!("Simulation loop started at {update_rate} Hz");

    while running.load(Ordering::Acquire) {
        time.update();
        let updates = step.advance(time.delta(), sim)?;
        stats.record(updates);
        if updates == 0 {
            thread::sleep(idle);
        }
    }

    info!("Simulation loop stopped");
    Ok(())
}
