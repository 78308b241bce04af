use raffle_draw::core::store::DEFAULT_SESSION_KEY;
use raffle_draw::{
    DrawSession, KeyValueStore, MemoryStore, NumberPool, PersistedSession, Phase, RaffleError,
    RevealAnimator, RevealEvent, RevealSettings, SessionState, SessionStore,
};
use tokio_test::{assert_err, assert_ok};

fn session_with(backend: MemoryStore, seed: u64) -> DrawSession<MemoryStore> {
    let animator = RevealAnimator::with_seed(RevealSettings::default(), seed);
    DrawSession::with_seed(SessionStore::new(backend), animator, seed)
}

fn saved(backend: &MemoryStore) -> Option<PersistedSession> {
    SessionStore::new(backend.clone()).load().unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_three_number_walkthrough() {
    let backend = MemoryStore::new();
    let mut session = session_with(backend.clone(), 1);
    let pool = NumberPool::from_parts(3, vec![2, 1, 3], vec![]).unwrap();
    assert_ok!(session.begin_with_pool(pool));

    assert_ok!(session.draw());
    assert_eq!(session.finish_reveal().await, Some(2));
    assert_eq!(session.current_state().drawn(), &[2]);
    assert_eq!(session.current_state().remaining(), &[1, 3]);
    assert_eq!(saved(&backend).unwrap().drawn, vec![2]);

    assert_ok!(session.draw());
    assert_eq!(session.finish_reveal().await, Some(1));
    assert_eq!(session.current_state().drawn(), &[2, 1]);
    assert_eq!(session.current_state().remaining(), &[3]);
    assert_eq!(saved(&backend).unwrap().remaining, vec![3]);

    assert_ok!(session.draw());
    assert_eq!(session.finish_reveal().await, Some(3));
    let state = session.current_state();
    assert_eq!(state.phase(), Phase::Complete);
    assert_eq!(state.drawn(), &[2, 1, 3]);
    assert!(state.remaining().is_empty());
    assert_eq!(state.current(), Some(3));
    assert!(saved(&backend).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_every_number_drawn_exactly_once() {
    for total in 1..=12u32 {
        let mut session = session_with(MemoryStore::new(), u64::from(total));
        assert_ok!(session.begin(total));

        for _ in 0..total {
            assert_ok!(session.draw());
            assert!(session.finish_reveal().await.is_some());
            let state = session.current_state();
            assert_eq!(
                state.drawn().len() + state.remaining().len(),
                total as usize
            );
        }

        let mut drawn = session.current_state().drawn().to_vec();
        drawn.sort_unstable();
        assert_eq!(drawn, (1..=total).collect::<Vec<_>>());
        assert_eq!(session.current_state().phase(), Phase::Complete);
    }
}

#[tokio::test(start_paused = true)]
async fn test_draw_on_exhausted_pool_changes_nothing() {
    let backend = MemoryStore::new();
    let mut session = session_with(backend.clone(), 9);
    assert_ok!(session.begin(1));
    assert_ok!(session.draw());
    assert_eq!(session.finish_reveal().await, Some(1));

    let before = session.current_state().clone();
    let err = assert_err!(session.draw());
    assert!(matches!(err, RaffleError::PoolExhausted));
    assert_eq!(session.current_state(), &before);
    assert!(saved(&backend).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_second_draw_while_rolling_is_rejected() {
    let mut session = session_with(MemoryStore::new(), 4);
    assert_ok!(session.begin(10));
    assert_ok!(session.draw());

    let before = session.current_state().clone();
    assert!(before.is_rolling());
    let err = assert_err!(session.draw());
    assert!(matches!(err, RaffleError::AlreadyRolling));
    assert_eq!(session.current_state(), &before);

    let value = session.finish_reveal().await.unwrap();
    assert_eq!(session.current_state().drawn(), &[value]);
    assert_ok!(session.draw());
}

#[tokio::test(start_paused = true)]
async fn test_decoys_stay_in_bounds_and_are_not_recorded() {
    let mut session = session_with(MemoryStore::new(), 21);
    assert_ok!(session.begin(6));
    assert_ok!(session.draw());

    let mut ticks = Vec::new();
    let settled = loop {
        match session.next_event().await.unwrap() {
            RevealEvent::Tick(decoy) => ticks.push(decoy),
            RevealEvent::Settled(value) => break value,
        }
    };

    assert_eq!(ticks.len(), RevealSettings::default().ticks as usize);
    assert!(ticks.iter().all(|decoy| (1..=6).contains(decoy)));
    assert_eq!(session.current_state().drawn(), &[settled]);
    assert_eq!(session.current_state().current(), Some(settled));
}

#[test]
fn test_begin_zero_is_invalid() {
    let backend = MemoryStore::new();
    let mut session = session_with(backend.clone(), 0);

    let err = assert_err!(session.begin(0));
    assert!(matches!(err, RaffleError::InvalidSize { size: 0 }));
    assert_eq!(session.current_state(), &SessionState::Idle);
    assert!(!backend.contains(DEFAULT_SESSION_KEY));
}

#[test]
fn test_begin_with_pool_refuses_pool_with_draws() {
    let backend = MemoryStore::new();
    let mut session = session_with(backend.clone(), 0);

    for (remaining, drawn) in [(vec![3], vec![1, 2]), (vec![], vec![2, 1, 3])] {
        let pool = NumberPool::from_parts(3, remaining, drawn).unwrap();
        let err = assert_err!(session.begin_with_pool(pool));
        assert!(matches!(err, RaffleError::CorruptSnapshot { .. }));
        assert_eq!(session.current_state(), &SessionState::Idle);
        assert!(!backend.contains(DEFAULT_SESSION_KEY));
    }

    let fresh = NumberPool::from_parts(3, vec![3, 1, 2], vec![]).unwrap();
    let state = assert_ok!(session.begin_with_pool(fresh));
    assert_eq!(state.phase(), Phase::Active);
    assert_eq!(state.current(), None);
}

#[tokio::test(start_paused = true)]
async fn test_begin_replaces_previous_snapshot() {
    let backend = MemoryStore::new();
    let mut session = session_with(backend.clone(), 8);
    assert_ok!(session.begin(5));
    assert_ok!(session.draw());
    session.finish_reveal().await.unwrap();
    assert_eq!(saved(&backend).unwrap().drawn.len(), 1);

    assert_ok!(session.begin(7));
    let snapshot = saved(&backend).unwrap();
    assert_eq!(snapshot.total, 7);
    assert!(snapshot.drawn.is_empty());
    assert_eq!(snapshot.current, None);
    assert_eq!(session.current_state().current(), None);
}

#[tokio::test(start_paused = true)]
async fn test_discard_returns_to_idle_and_clears_storage() {
    let backend = MemoryStore::new();
    let mut session = session_with(backend.clone(), 2);
    assert_ok!(session.begin(4));
    assert_ok!(session.draw());
    session.finish_reveal().await.unwrap();

    session.discard();
    assert_eq!(session.current_state(), &SessionState::Idle);
    assert!(backend.get(DEFAULT_SESSION_KEY).unwrap().is_none());
    assert!(matches!(session.draw(), Err(RaffleError::NotDrawing)));
}
