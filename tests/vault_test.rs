mod helpers;

use echosoul::emotion::Emotion;
use echosoul::memory::search::{retrieve_memories, SearchConfig};
use echosoul::memory::stats::memory_stats;
use echosoul::memory::types::{MemoryKind, NewMemory};
use echosoul::vault::{Vault, VaultError, VaultSort};
use helpers::{test_db, test_embedding};

fn open(user: &str, key: &str) -> Vault {
    let mut vault = Vault::new(user, key, "echosoul");
    vault.unlock("echosoul").unwrap();
    vault
}

#[test]
fn vault_entries_never_reach_recall_or_timeline() {
    let conn = test_db();
    let vault = open("u1", "key");
    vault
        .store(
            &conn,
            NewMemory::new(MemoryKind::Confession, "I ate the last slice of birthday cake")
                .with_emotion(Emotion::Sadness),
        )
        .unwrap();

    let results = retrieve_memories(
        &conn,
        "u1",
        &test_embedding(0),
        "birthday cake",
        None,
        &SearchConfig {
            max_results: 10,
            rrf_k: 60,
        },
    )
    .unwrap();
    assert!(results.is_empty());

    let timeline = echosoul::timeline::get_timeline_data(&conn, "u1", None, None, None).unwrap();
    assert!(timeline.is_empty());

    let stats = memory_stats(&conn, Some("u1"), None).unwrap();
    assert_eq!(stats.total_memories, 0);
    assert_eq!(stats.vault_entries, 1);
}

#[test]
fn ciphertext_does_not_contain_plaintext() {
    let conn = test_db();
    open("u1", "key")
        .store(&conn, NewMemory::new(MemoryKind::Secret, "the combination is 4812"))
        .unwrap();

    let ciphertext: String = conn
        .query_row("SELECT ciphertext FROM vault_entries", [], |row| row.get(0))
        .unwrap();
    assert!(!ciphertext.contains("4812"));
    assert!(!ciphertext.contains("combination"));
}

#[test]
fn vaults_are_isolated_per_user_and_key() {
    let conn = test_db();
    open("alice", "key")
        .store(&conn, NewMemory::new(MemoryKind::Secret, "Alice's secret"))
        .unwrap();

    assert!(open("bob", "key").list(&conn).unwrap().is_empty());
    // same user, different server key: the entry cannot be decrypted and is skipped
    assert!(open("alice", "other-key").list(&conn).unwrap().is_empty());
    assert_eq!(open("alice", "key").list(&conn).unwrap().len(), 1);
}

#[test]
fn search_filters_and_sorts() {
    let conn = test_db();
    let vault = open("u1", "key");
    vault
        .store(
            &conn,
            NewMemory::new(MemoryKind::Dream, "A dream about the ocean").with_emotion(Emotion::Surprise),
        )
        .unwrap();
    vault
        .store(
            &conn,
            NewMemory::new(MemoryKind::Personal, "Ocean swim at dawn")
                .with_title("Swim")
                .with_emotion(Emotion::Excitement),
        )
        .unwrap();
    vault
        .store(&conn, NewMemory::new(MemoryKind::Goal, "Learn Portuguese"))
        .unwrap();

    let found = vault.search(&conn, "OCEAN", VaultSort::Emotion).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].emotion, Emotion::Excitement);
    assert_eq!(found[1].emotion, Emotion::Surprise);

    let by_title = vault.search(&conn, "swim", VaultSort::Newest).unwrap();
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].title.as_deref(), Some("Swim"));

    let all = vault.search(&conn, "", VaultSort::Oldest).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].content, "Learn Portuguese");
    assert_eq!(all[2].title.as_deref(), Some("Untitled Memory"));
}

#[test]
fn delete_requires_ownership() {
    let conn = test_db();
    let stored = open("alice", "key")
        .store(&conn, NewMemory::new(MemoryKind::Secret, "mine"))
        .unwrap();

    assert!(matches!(
        open("bob", "key").delete(&conn, &stored.id),
        Err(VaultError::NotFound(_))
    ));
    open("alice", "key").delete(&conn, &stored.id).unwrap();
    assert!(open("alice", "key").list(&conn).unwrap().is_empty());
}
