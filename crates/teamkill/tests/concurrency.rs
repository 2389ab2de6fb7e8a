//! Concurrent command delivery against shared state.

use std::sync::Arc;

use futures::future::join_all;
use teamkill_core::{
    AuthorizationPolicy, CommandDispatcher, CounterStore, Delta, MemoryCounterStore, Outcome,
};
use teamkill_persistence::JsonFileStore;
use teamkill_testing::{command, moderator, targeted, ManualClock};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_add_kills_never_lose_updates() {
    let store = Arc::new(MemoryCounterStore::new());
    let dispatcher = Arc::new(CommandDispatcher::new(
        store.clone(),
        AuthorizationPolicy::default(),
    ));

    let tasks = (0..200).map(|i| {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            let event = targeted(moderator(&format!("m{}", i % 4)), "!addtk", "1", "Alice");
            dispatcher.handle(&event).await
        })
    });
    for result in join_all(tasks).await {
        assert!(result.unwrap().unwrap().is_some());
    }

    assert_eq!(store.table().await.get("1").unwrap().count, 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_store_survives_concurrent_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("tk_data.json")));
    let dispatcher = Arc::new(CommandDispatcher::new(
        store.clone(),
        AuthorizationPolicy::default(),
    ));

    let tasks = (0..40).map(|i| {
        let dispatcher = Arc::clone(&dispatcher);
        let (user, name) = if i % 2 == 0 { ("1", "Alice") } else { ("2", "Bob") };
        tokio::spawn(async move {
            dispatcher
                .handle(&targeted(moderator("m"), "!addtk", user, name))
                .await
        })
    });
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let reopened = JsonFileStore::new(store.path());
    let snapshot = reopened.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().all(|record| record.count == 20));
}

/// Any interleaving of k increments and j <= k decrements ends at k - j.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn randomized_interleavings_end_at_difference() {
    for seed in 0..20u64 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let adds = rng.usize(1..40);
        let subs = rng.usize(0..=adds);

        let mut deltas: Vec<Delta> = std::iter::repeat(Delta::Increment)
            .take(adds)
            .chain(std::iter::repeat(Delta::Decrement).take(subs))
            .collect();
        rng.shuffle(&mut deltas);

        let store = Arc::new(MemoryCounterStore::new());
        let tasks = deltas.into_iter().map(|delta| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.apply_delta("u", "User", delta).await })
        });
        let results = join_all(tasks).await;

        // A decrement may land before enough increments and be rejected.
        let rejected = results
            .into_iter()
            .map(|r| r.unwrap())
            .filter(|r| r.is_err())
            .count();
        let count = store.table().await.get("u").map_or(0, |s| s.count);
        assert_eq!(
            count as usize,
            adds - (subs - rejected),
            "seed {seed}: adds={adds} subs={subs} rejected={rejected}"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_confirmations_execute_at_most_once() {
    let store = Arc::new(MemoryCounterStore::new());
    let clock = ManualClock::new();
    let dispatcher = Arc::new(
        CommandDispatcher::new(store.clone(), AuthorizationPolicy::default())
            .with_clock(Arc::new(clock)),
    );
    dispatcher
        .handle(&command(moderator("m"), "!resettks"))
        .await
        .unwrap();

    let tasks = (0..16).map(|_| {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            dispatcher
                .dispatch(&command(moderator("m"), "!confirmreset"))
                .await
        })
    });
    let outcomes: Vec<Outcome> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();

    let executed = outcomes
        .iter()
        .filter(|o| **o == Outcome::ResetExecuted)
        .count();
    assert_eq!(executed, 1);
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, Outcome::ResetExecuted | Outcome::NoPendingReset)));
}
