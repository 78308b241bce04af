use crate::utils::error::{RaffleError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_REVEAL_TICKS: u32 = 18;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSettings {
    pub ticks: u32,
    pub tick_interval: Duration,
}

impl RevealSettings {
    pub fn total_duration(&self) -> Duration {
        self.tick_interval * self.ticks
    }
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            ticks: DEFAULT_REVEAL_TICKS,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Shows `ticks` random decoys, one every `tick_interval`, then the real value.
///
/// Decoys are chosen when the reveal starts, from the animator's own RNG, so
/// the scheduled task never sees anything but the list and the true value.
/// The true value is only handed to `on_settle`.
pub struct RevealAnimator {
    settings: RevealSettings,
    rng: StdRng,
    running: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl RevealAnimator {
    pub fn new(settings: RevealSettings) -> Self {
        Self::with_rng(settings, StdRng::from_os_rng())
    }

    pub fn with_seed(settings: RevealSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: RevealSettings, rng: StdRng) -> Self {
        Self {
            settings,
            rng,
            running: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn decoys(&mut self, bound: u32) -> Vec<u32> {
        (0..self.settings.ticks)
            .map(|_| self.rng.random_range(1..=bound))
            .collect()
    }

    /// Schedules the reveal and returns immediately. Fails with
    /// `RuntimeUnavailable`, leaving the animator idle, when called outside a
    /// tokio runtime.
    pub fn start<T, S>(
        &mut self,
        true_value: u32,
        bound: u32,
        mut on_tick: T,
        on_settle: S,
    ) -> Result<()>
    where
        T: FnMut(u32) + Send + 'static,
        S: FnOnce(u32) + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| RaffleError::RuntimeUnavailable)?;
        if self.is_running() {
            return Err(RaffleError::AnimatorBusy);
        }
        if bound < 1 {
            return Err(RaffleError::InvalidSize {
                size: i64::from(bound),
            });
        }

        let decoys = self.decoys(bound);
        let interval = self.settings.tick_interval;

        // Each reveal gets its own flag so a cancelled task can never clear
        // the flag of the reveal that replaced it.
        let running = Arc::new(AtomicBool::new(true));
        self.running = Arc::clone(&running);

        tracing::debug!(
            "Starting reveal: {} ticks every {:?} over 1..={}",
            decoys.len(),
            interval,
            bound
        );

        self.task = Some(runtime.spawn(async move {
            for decoy in decoys {
                tokio::time::sleep(interval).await;
                on_tick(decoy);
            }
            running.store(false, Ordering::Release);
            on_settle(true_value);
        }));

        Ok(())
    }

    /// Stops an in-flight reveal without settling it. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let was_running = self.running.swap(false, Ordering::AcqRel);
        if was_running {
            tracing::debug!("Reveal cancelled");
        }
        was_running
    }
}

impl Drop for RevealAnimator {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
