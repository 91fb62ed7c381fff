//! Simulated progress for long-running requests.
//!
//! The backend reports nothing until a request finishes, so this is an estimate only:
//! it creeps forward by random steps and stalls below the cap until the caller marks the
//! request complete. Nothing reads it to make decisions.

use rand::Rng;

/// Highest value reached before [`SimulatedProgress::complete`] is called.
pub const ESTIMATE_CAP: f64 = 90.0;

const MAX_STEP: f64 = 15.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulatedProgress {
    percent: f64,
    done: bool,
}

impl SimulatedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) {
        self.tick_with(&mut rand::thread_rng());
    }

    /// Advance by a random step in `[0, 15)`, never past the cap.
    pub fn tick_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.done {
            return;
        }
        let step = rng.gen_range(0.0..MAX_STEP);
        self.percent = (self.percent + step).min(ESTIMATE_CAP);
    }

    pub fn complete(&mut self) {
        self.percent = 100.0;
        self.done = true;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Gauge ratio in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        (self.percent / 100.0).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.done
    }

    pub fn label(&self) -> String {
        if self.done {
            "100%".to_string()
        } else {
            format!("{:.0}% (estimated)", self.percent)
        }
    }
}
