use crate::core::pool::NumberPool;
use crate::core::reveal::RevealAnimator;
use crate::core::store::SessionStore;
use crate::core::{KeyValueStore, PersistedSession, RevealEvent, Result};
use crate::domain::model::{ActiveDraw, CompletedDraw, SessionState};
use crate::utils::error::RaffleError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};

/// Owns the session state machine and mirrors it to the session store.
///
/// `draw()` only arms a reveal. Its progress reaches the state through
/// [`next_event`](Self::next_event) / [`try_next_event`](Self::try_next_event),
/// which the caller pumps while rendering. A reveal cannot be interrupted
/// except by [`discard`](Self::discard).
pub struct DrawSession<K: KeyValueStore> {
    state: SessionState,
    store: SessionStore<K>,
    animator: RevealAnimator,
    rng: StdRng,
    events: Option<UnboundedReceiver<RevealEvent>>,
    persistence_warning: Option<String>,
}

impl<K: KeyValueStore> DrawSession<K> {
    pub fn new(store: SessionStore<K>, animator: RevealAnimator) -> Self {
        Self::with_rng(store, animator, StdRng::from_os_rng())
    }

    /// Seeds the pool shuffle, for reproducible sessions in tests.
    pub fn with_seed(store: SessionStore<K>, animator: RevealAnimator, seed: u64) -> Self {
        Self::with_rng(store, animator, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: SessionStore<K>, animator: RevealAnimator, rng: StdRng) -> Self {
        let session = Self {
            state: SessionState::Idle,
            store,
            animator,
            rng,
            events: None,
            persistence_warning: None,
        };

        // Detect only; resuming is the caller's decision.
        if session.check_for_saved_session() {
            tracing::info!("💾 Found a saved session, waiting for resume or discard");
        }
        session
    }

    pub fn current_state(&self) -> &SessionState {
        &self.state
    }

    /// The last persistence failure, cleared by the next successful write.
    pub fn persistence_warning(&self) -> Option<&str> {
        self.persistence_warning.as_deref()
    }

    pub fn check_for_saved_session(&self) -> bool {
        match self.store.load() {
            Ok(snapshot) => snapshot.is_some(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable saved session: {}", e);
                false
            }
        }
    }

    /// Marks that the user is entering a pool size. Returns `false` and does
    /// nothing while a session is active.
    pub fn begin_configuring(&mut self) -> bool {
        match self.state {
            SessionState::Idle | SessionState::Complete(_) => {
                self.state = SessionState::Configuring;
                true
            }
            SessionState::Configuring => true,
            SessionState::Active(_) => false,
        }
    }

    pub fn begin(&mut self, total: u32) -> Result<&SessionState> {
        if self.state.is_rolling() {
            return Err(RaffleError::AlreadyRolling);
        }
        let pool = NumberPool::create_with_rng(total, &mut self.rng)?;
        self.begin_with_pool(pool)
    }

    /// Starts a session over an already shuffled pool. The pool must not
    /// have any draws yet; resuming goes through [`restore`](Self::restore).
    pub fn begin_with_pool(&mut self, pool: NumberPool) -> Result<&SessionState> {
        if self.state.is_rolling() {
            return Err(RaffleError::AlreadyRolling);
        }
        if !pool.drawn().is_empty() {
            return Err(RaffleError::CorruptSnapshot {
                reason: format!(
                    "a new session cannot start with {} numbers already drawn",
                    pool.drawn().len()
                ),
            });
        }

        self.events = None;
        self.forget_snapshot();

        tracing::info!("🎟️ New session with {} numbers", pool.total());
        self.state = SessionState::Active(ActiveDraw {
            pool,
            current: None,
            rolling: false,
        });
        self.persist_active();

        Ok(&self.state)
    }

    /// Arms a reveal of the next number. Needs a tokio runtime; without one
    /// this fails with `RuntimeUnavailable` and the session stays as it was.
    pub fn draw(&mut self) -> Result<()> {
        let active = match &mut self.state {
            SessionState::Active(active) => active,
            SessionState::Complete(_) => return Err(RaffleError::PoolExhausted),
            SessionState::Idle | SessionState::Configuring => {
                return Err(RaffleError::NotDrawing)
            }
        };
        let next = active.pool.peek_next().ok_or(RaffleError::PoolExhausted)?;
        if active.rolling {
            return Err(RaffleError::AlreadyRolling);
        }

        // Set before the timer is armed so nothing can slip in between.
        active.rolling = true;

        let (tx, rx) = mpsc::unbounded_channel();
        let tick_tx = tx.clone();
        let started = self.animator.start(
            next,
            active.pool.total(),
            move |decoy| {
                let _ = tick_tx.send(RevealEvent::Tick(decoy));
            },
            move |value| {
                let _ = tx.send(RevealEvent::Settled(value));
            },
        );
        if let Err(e) = started {
            active.rolling = false;
            return Err(e);
        }

        tracing::debug!(
            "Reveal armed ({} drawn, {} remaining)",
            active.pool.drawn().len(),
            active.pool.remaining().len()
        );
        self.events = Some(rx);
        Ok(())
    }

    /// Waits for the next reveal event and applies it. `None` when no reveal
    /// is in flight.
    pub async fn next_event(&mut self) -> Option<RevealEvent> {
        let rx = self.events.as_mut()?;
        let event = rx.recv().await;
        self.apply(event)
    }

    /// Applies a reveal event if one is already waiting.
    pub fn try_next_event(&mut self) -> Option<RevealEvent> {
        let rx = self.events.as_mut()?;
        match rx.try_recv() {
            Ok(event) => self.apply(Some(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => self.apply(None),
        }
    }

    /// Pumps events until the current reveal settles and returns the drawn number.
    pub async fn finish_reveal(&mut self) -> Option<u32> {
        loop {
            match self.next_event().await? {
                RevealEvent::Tick(_) => continue,
                RevealEvent::Settled(value) => return Some(value),
            }
        }
    }

    pub fn restore(&mut self) -> Result<&SessionState> {
        if self.state.is_rolling() {
            return Err(RaffleError::AlreadyRolling);
        }

        let snapshot = match self.store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Err(RaffleError::NoSavedSession),
            Err(e) => {
                tracing::warn!("Discarding unreadable saved session: {}", e);
                self.forget_snapshot();
                return Err(RaffleError::NoSavedSession);
            }
        };

        let pool = snapshot.to_pool()?;
        tracing::info!(
            "♻️ Restored session: {} of {} drawn",
            pool.drawn().len(),
            pool.total()
        );

        self.events = None;
        self.state = if pool.is_exhausted() {
            SessionState::Complete(CompletedDraw {
                pool,
                current: snapshot.current,
            })
        } else {
            SessionState::Active(ActiveDraw {
                pool,
                current: snapshot.current,
                rolling: false,
            })
        };
        Ok(&self.state)
    }

    /// Drops the saved snapshot without touching the in-memory session.
    pub fn discard_saved(&mut self) {
        self.forget_snapshot();
    }

    /// Back to `Idle`, from any state. Cancels a reveal in flight.
    pub fn discard(&mut self) {
        if self.animator.cancel() {
            tracing::info!("Reveal cancelled by discard");
        }
        self.events = None;
        self.state = SessionState::Idle;
        self.forget_snapshot();
    }

    fn apply(&mut self, event: Option<RevealEvent>) -> Option<RevealEvent> {
        match event {
            Some(RevealEvent::Tick(decoy)) => {
                if let SessionState::Active(active) = &mut self.state {
                    active.current = Some(decoy);
                }
                Some(RevealEvent::Tick(decoy))
            }
            Some(RevealEvent::Settled(value)) => {
                self.events = None;
                self.settle(value);
                Some(RevealEvent::Settled(value))
            }
            None => {
                tracing::warn!("Reveal ended without settling; nothing was drawn");
                self.events = None;
                if let SessionState::Active(active) = &mut self.state {
                    active.rolling = false;
                }
                None
            }
        }
    }

    fn settle(&mut self, value: u32) {
        let finished = match &mut self.state {
            SessionState::Active(active) => {
                let Ok(drawn) = active.pool.take_next() else {
                    active.rolling = false;
                    return;
                };
                if drawn != value {
                    tracing::warn!("Reveal showed {} but the pool yielded {}", value, drawn);
                }
                active.current = Some(drawn);
                active.rolling = false;
                tracing::info!(
                    "🎯 Drew {} ({} of {})",
                    drawn,
                    active.pool.drawn().len(),
                    active.pool.total()
                );
                active.pool.is_exhausted()
            }
            _ => {
                tracing::warn!("Reveal settled outside an active session");
                return;
            }
        };

        if finished {
            if let SessionState::Active(active) = std::mem::take(&mut self.state) {
                self.state = SessionState::Complete(CompletedDraw {
                    pool: active.pool,
                    current: active.current,
                });
            }
            tracing::info!("🏁 Every number has been drawn");
            self.forget_snapshot();
        } else {
            self.persist_active();
        }
    }

    fn persist_active(&mut self) {
        let result = match &self.state {
            SessionState::Active(active) => self
                .store
                .save(&PersistedSession::capture(&active.pool, active.current)),
            _ => return,
        };
        self.note_persistence("save", result);
    }

    fn forget_snapshot(&mut self) {
        let result = self.store.clear();
        self.note_persistence("clear", result);
    }

    fn note_persistence(&mut self, action: &str, result: Result<()>) {
        match result {
            Ok(()) => self.persistence_warning = None,
            Err(e) => {
                tracing::warn!(
                    "⚠️ Failed to {} session snapshot, continuing in memory: {}",
                    action,
                    e
                );
                self.persistence_warning = Some(e.user_friendly_message());
            }
        }
    }
}
