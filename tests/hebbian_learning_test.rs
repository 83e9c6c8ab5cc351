//! Integration tests for Hebbian association learning
//!
//! Covers the learning rule against the libsql store: canonical pair
//! storage, the atomic clamped upsert, decay with pruning, and neighbor
//! queries feeding prediction.

use anamnesis::config::IntelligenceConfig;
use anamnesis::hebbian::AssociativeMemory;
use anamnesis::storage::ReviewStore;
use anamnesis::types::{ConceptId, ConceptType};
use std::collections::BTreeSet;

mod common;
use common::create_test_store;

fn pattern(name: &str) -> ConceptId {
    ConceptId::new(ConceptType::Pattern, name)
}

fn event(names: &[&str]) -> BTreeSet<ConceptId> {
    names.iter().map(|n| pattern(n)).collect()
}

#[tokio::test]
async fn test_repeated_events_strengthen_weight() {
    let store = create_test_store().await;
    let memory = AssociativeMemory::new(store.clone(), IntelligenceConfig::default());

    let concepts = event(&["authentication", "security"]);
    memory.learn_from_event(&concepts, "review").await.unwrap();
    memory.learn_from_event(&concepts, "review").await.unwrap();

    // New pair starts at 0.5 + 0.1, second event adds another 0.1
    let association = store
        .get_association(&pattern("authentication"), &pattern("security"), "review")
        .await
        .unwrap()
        .expect("association should exist");
    assert!((association.weight - 0.7).abs() < 1e-6);
    assert_eq!(association.cooccurrence, 2);
}

#[tokio::test]
async fn test_weight_saturates_at_one() {
    let store = create_test_store().await;
    let memory = AssociativeMemory::new(store.clone(), IntelligenceConfig::default());

    let concepts = event(&["database", "performance"]);
    for _ in 0..20 {
        memory.learn_from_event(&concepts, "review").await.unwrap();
    }

    let association = store
        .get_association(&pattern("database"), &pattern("performance"), "review")
        .await
        .unwrap()
        .unwrap();
    assert!(association.weight <= 1.0);
    assert!((association.weight - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_pair_order_is_irrelevant() {
    let store = create_test_store().await;
    let memory = AssociativeMemory::new(store.clone(), IntelligenceConfig::default());

    memory
        .learn_from_event(&event(&["zeta", "alpha"]), "review")
        .await
        .unwrap();

    // Queried in either order, the same single row answers
    let forward = store
        .get_association(&pattern("alpha"), &pattern("zeta"), "review")
        .await
        .unwrap();
    let backward = store
        .get_association(&pattern("zeta"), &pattern("alpha"), "review")
        .await
        .unwrap();
    assert!(forward.is_some());
    assert_eq!(
        forward.unwrap().weight,
        backward.unwrap().weight
    );
    assert_eq!(store.count_associations().await.unwrap(), 1);
}

#[tokio::test]
async fn test_event_strengthens_all_pairs() {
    let store = create_test_store().await;
    let memory = AssociativeMemory::new(store.clone(), IntelligenceConfig::default());

    let pairs = memory
        .learn_from_event(&event(&["api", "auth", "validation", "logging"]), "review")
        .await
        .unwrap();

    // Four concepts co-occurring form C(4,2) = 6 pairs
    assert_eq!(pairs, 6);
    assert_eq!(store.count_associations().await.unwrap(), 6);
}

#[tokio::test]
async fn test_decay_prunes_weak_associations() {
    let store = create_test_store().await;
    let memory = AssociativeMemory::new(store.clone(), IntelligenceConfig::default());

    memory
        .learn_from_event(&event(&["a", "b", "c"]), "review")
        .await
        .unwrap();
    assert_eq!(store.count_associations().await.unwrap(), 3);

    // 0.99^300 ≈ 0.049, far below the 0.1 prune threshold
    let pruned = memory.decay(300.0).await.unwrap();
    assert_eq!(pruned, 3);
    assert_eq!(store.count_associations().await.unwrap(), 0);
}

#[tokio::test]
async fn test_decay_keeps_strong_associations() {
    let store = create_test_store().await;
    let memory = AssociativeMemory::new(store.clone(), IntelligenceConfig::default());

    memory
        .learn_from_event(&event(&["x", "y"]), "review")
        .await
        .unwrap();

    // One day of decay: 0.6 * 0.99 = 0.594, well above the threshold
    let pruned = memory.decay(1.0).await.unwrap();
    assert_eq!(pruned, 0);

    let association = store
        .get_association(&pattern("x"), &pattern("y"), "review")
        .await
        .unwrap()
        .unwrap();
    assert!((association.weight - 0.594).abs() < 1e-3);
}

#[tokio::test]
async fn test_neighbors_sorted_by_weight() {
    let store = create_test_store().await;
    let memory = AssociativeMemory::new(store.clone(), IntelligenceConfig::default());

    // "hub" pairs with both; the hub-strong pair is reinforced twice more
    memory
        .learn_from_event(&event(&["hub", "weakside"]), "review")
        .await
        .unwrap();
    for _ in 0..3 {
        memory
            .learn_from_event(&event(&["hub", "strongside"]), "review")
            .await
            .unwrap();
    }

    let neighbors = memory.neighbors(&pattern("hub"), None).await.unwrap();
    assert_eq!(neighbors.len(), 2);
    assert_eq!(neighbors[0].0, pattern("strongside"));
    assert!(neighbors[0].1 > neighbors[1].1);

    let limited = memory.neighbors(&pattern("hub"), Some(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
}
