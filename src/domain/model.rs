use crate::core::pool::NumberPool;
use crate::utils::error::{RaffleError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: u32 = 1;

fn legacy_version() -> u32 {
    1
}

/// What the session store writes, as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default = "legacy_version")]
    pub version: u32,
    pub total: u32,
    pub remaining: Vec<u32>,
    pub drawn: Vec<u32>,
    pub current: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl PersistedSession {
    pub fn capture(pool: &NumberPool, current: Option<u32>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            total: pool.total(),
            remaining: pool.remaining().to_vec(),
            drawn: pool.drawn().to_vec(),
            current,
            saved_at: Some(Utc::now()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.version > SNAPSHOT_VERSION {
            return Err(RaffleError::UnsupportedSnapshotVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        self.to_pool()?;
        Ok(())
    }

    pub fn to_pool(&self) -> Result<NumberPool> {
        if self.total < 1 {
            return Err(RaffleError::CorruptSnapshot {
                reason: format!("total must be at least 1, got {}", self.total),
            });
        }
        if let Some(current) = self.current {
            if current < 1 || current > self.total {
                return Err(RaffleError::CorruptSnapshot {
                    reason: format!("current {} is outside 1..={}", current, self.total),
                });
            }
        }
        // The number on display is always the one drawn last.
        let last = self.drawn.last().copied();
        if self.current != last {
            return Err(RaffleError::CorruptSnapshot {
                reason: format!("current {:?} does not match last drawn {:?}", self.current, last),
            });
        }
        NumberPool::from_parts(self.total, self.remaining.clone(), self.drawn.clone())
    }
}

/// Progress of a reveal, in the order the caller sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEvent {
    /// A decoy is on screen. Never recorded.
    Tick(u32),
    /// The real number, now appended to `drawn`.
    Settled(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Configuring,
    Active,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Configuring => "configuring",
            Phase::Active => "active",
            Phase::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDraw {
    pub(crate) pool: NumberPool,
    pub(crate) current: Option<u32>,
    pub(crate) rolling: bool,
}

impl ActiveDraw {
    pub fn pool(&self) -> &NumberPool {
        &self.pool
    }

    pub fn current(&self) -> Option<u32> {
        self.current
    }

    pub fn is_rolling(&self) -> bool {
        self.rolling
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedDraw {
    pub(crate) pool: NumberPool,
    pub(crate) current: Option<u32>,
}

impl CompletedDraw {
    pub fn pool(&self) -> &NumberPool {
        &self.pool
    }

    pub fn current(&self) -> Option<u32> {
        self.current
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Configuring,
    Active(ActiveDraw),
    Complete(CompletedDraw),
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        match self {
            SessionState::Idle => Phase::Idle,
            SessionState::Configuring => Phase::Configuring,
            SessionState::Active(_) => Phase::Active,
            SessionState::Complete(_) => Phase::Complete,
        }
    }

    pub fn pool(&self) -> Option<&NumberPool> {
        match self {
            SessionState::Active(active) => Some(&active.pool),
            SessionState::Complete(done) => Some(&done.pool),
            SessionState::Idle | SessionState::Configuring => None,
        }
    }

    pub fn total(&self) -> Option<u32> {
        self.pool().map(NumberPool::total)
    }

    pub fn drawn(&self) -> &[u32] {
        self.pool().map(NumberPool::drawn).unwrap_or(&[])
    }

    pub fn remaining(&self) -> &[u32] {
        self.pool().map(NumberPool::remaining).unwrap_or(&[])
    }

    pub fn current(&self) -> Option<u32> {
        match self {
            SessionState::Active(active) => active.current,
            SessionState::Complete(done) => done.current,
            SessionState::Idle | SessionState::Configuring => None,
        }
    }

    pub fn is_rolling(&self) -> bool {
        matches!(self, SessionState::Active(active) if active.rolling)
    }
}
