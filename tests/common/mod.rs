//! Shared test harness for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use libro::application::favorites::{FavoritesStore, Subscription, STORAGE_KEY};
use libro::domain::model::book::Book;
use libro::domain::repository::KeyValueStore;

// =============================================================================
// InMemoryStore — テスト用KeyValueStore
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[error("in-memory store error")]
pub struct InMemoryError;

/// ファイルI/O不要のインメモリスロット。書き込み回数も数える。
#[derive(Default)]
pub struct InMemoryStore {
    slots: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 指定値で初期化済みのスロット（前回セッションの保存内容を模す）。
    pub fn seeded(value: &str) -> Arc<Self> {
        let store = Self::default();
        store
            .slots
            .lock()
            .unwrap()
            .insert(STORAGE_KEY.to_string(), value.to_string());
        Arc::new(store)
    }

    pub fn raw(&self) -> Option<String> {
        self.slots.lock().unwrap().get(STORAGE_KEY).cloned()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for InMemoryStore {
    type Error = InMemoryError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.slots.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.slots
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// FailingStore — 読み書きが常に失敗するスロット
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[error("disk unavailable")]
pub struct DiskUnavailable;

#[derive(Default)]
pub struct FailingStore {
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for FailingStore {
    type Error = DiskUnavailable;

    fn get(&self, _key: &str) -> Result<Option<String>, Self::Error> {
        Err(DiskUnavailable)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), Self::Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(DiskUnavailable)
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub fn book(id: &str) -> Book {
    Book::new(id, format!("Libro {id}"), "Autore", "Romanzo storico")
}

pub fn ids(books: &[Book]) -> Vec<String> {
    books.iter().map(|b| b.id().to_string()).collect()
}

/// 呼び出し回数を数える購読。
pub fn counting_subscriber<S: KeyValueStore>(
    store: &FavoritesStore<S>,
) -> (Subscription, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let sub = store.subscribe(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });
    (sub, hits)
}

pub fn count(hits: &AtomicUsize) -> usize {
    hits.load(Ordering::SeqCst)
}
