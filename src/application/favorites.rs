//! Favorites store: the user's saved books, persisted to a single key-value
//! slot and observable through subscriptions.
//!
//! # Invariants
//!
//! 1. No two saved entries share an id; insertion order is kept.
//! 2. Storage faults never reach the caller. A bad slot at open yields an
//!    empty set; a failed write leaves the in-memory state authoritative.
//! 3. Every subscriber registered when a mutation starts is invoked exactly
//!    once, after the saved-set lock is released, before the call returns.
//! 4. `remove` persists and notifies even when nothing matched.

use std::cell::Cell;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::domain::model::book::Book;
use crate::domain::model::id::{BookId, SubscriptionId};
use crate::domain::repository::KeyValueStore;

/// Fixed key of the durable slot.
pub const STORAGE_KEY: &str = "libro_saved_books";

/// Nested notifications allowed per thread before further ones are dropped.
/// A dropped notification is skipped for every subscriber, not only the looping one.
pub const MAX_NOTIFY_DEPTH: usize = 8;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Storage faults. Logged, never returned.
#[derive(Debug, thiserror::Error)]
pub enum FavoritesFault {
    #[error("cannot read saved books: {0}")]
    Read(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("saved books blob is malformed: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("cannot encode saved books: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("cannot write saved books: {0}")]
    Write(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Default)]
struct SubscriberRegistry {
    entries: Vec<(SubscriptionId, Callback)>,
}

impl SubscriberRegistry {
    fn snapshot(&self) -> Vec<Callback> {
        self.entries.iter().map(|(_, cb)| Arc::clone(cb)).collect()
    }
}

/// Disposer returned by [`FavoritesStore::subscribe`].
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Debug)]
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<Mutex<SubscriberRegistry>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Removes this registration. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = lock(&registry);
            let before = registry.entries.len();
            registry.entries.retain(|(id, _)| *id != self.id);
            if registry.entries.len() != before {
                tracing::debug!(subscription = %self.id.short(), "unsubscribed");
            }
        }
    }

    pub fn is_active(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let registry = lock(&registry);
        registry.entries.iter().any(|(id, _)| *id == self.id)
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Saved-books store. One instance per application, shared by reference.
pub struct FavoritesStore<S: KeyValueStore> {
    storage: S,
    saved: Mutex<Vec<Book>>,
    subscribers: Arc<Mutex<SubscriberRegistry>>,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Opens the store, loading the saved set from `storage`.
    pub fn open(storage: S) -> Self {
        let saved = match load_saved(&storage) {
            Ok(books) => {
                tracing::info!(count = books.len(), "loaded saved books");
                books
            }
            Err(fault) => {
                tracing::warn!(key = STORAGE_KEY, error = %fault, "starting with no saved books");
                Vec::new()
            }
        };
        Self {
            storage,
            saved: Mutex::new(saved),
            subscribers: Arc::new(Mutex::new(SubscriberRegistry::default())),
        }
    }

    /// Saves `book` unless a book with the same id is already saved.
    pub fn add(&self, book: Book) {
        {
            let mut saved = lock(&self.saved);
            if saved.iter().any(|b| b.id() == book.id()) {
                tracing::debug!(id = %book.id(), "already saved");
                return;
            }
            tracing::debug!(id = %book.id(), "saving book");
            saved.push(book);
            self.persist(&saved);
        }
        self.notify();
    }

    /// Drops the book with `id`. Persists and notifies unconditionally.
    pub fn remove(&self, id: &BookId) {
        {
            let mut saved = lock(&self.saved);
            let before = saved.len();
            saved.retain(|b| b.id() != id);
            tracing::debug!(id = %id, removed = before - saved.len(), "removing book");
            self.persist(&saved);
        }
        self.notify();
    }

    /// Snapshot of the saved books in insertion order.
    pub fn list(&self) -> Vec<Book> {
        lock(&self.saved).clone()
    }

    pub fn contains(&self, id: &BookId) -> bool {
        lock(&self.saved).iter().any(|b| b.id() == id)
    }

    pub fn len(&self) -> usize {
        lock(&self.saved).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.saved).is_empty()
    }

    /// Registers `callback` to run after every mutation.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = SubscriptionId::new();
        lock(&self.subscribers)
            .entries
            .push((id, Arc::new(callback)));
        tracing::debug!(subscription = %id.short(), "subscribed");
        Subscription {
            id,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).entries.len()
    }

    fn persist(&self, books: &[Book]) {
        let result = serde_json::to_string(books)
            .map_err(FavoritesFault::Encode)
            .and_then(|json| {
                self.storage
                    .set(STORAGE_KEY, &json)
                    .map_err(|e| FavoritesFault::Write(Box::new(e)))
            });
        if let Err(fault) = result {
            tracing::warn!(key = STORAGE_KEY, error = %fault, "saved books kept in memory only");
        }
    }

    fn notify(&self) {
        let Some(_depth) = NotifyDepth::enter() else {
            tracing::warn!(
                max = MAX_NOTIFY_DEPTH,
                "reentrant favorites notification dropped"
            );
            return;
        };
        // Callbacks run without any store lock held so they may call back in.
        let callbacks = lock(&self.subscribers).snapshot();
        for callback in callbacks {
            callback();
        }
    }
}

impl<S: KeyValueStore> std::fmt::Debug for FavoritesStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesStore")
            .field("saved", &self.len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

fn load_saved<S: KeyValueStore>(storage: &S) -> Result<Vec<Book>, FavoritesFault> {
    let Some(json) = storage
        .get(STORAGE_KEY)
        .map_err(|e| FavoritesFault::Read(Box::new(e)))?
    else {
        return Ok(Vec::new());
    };
    let books: Vec<Book> = serde_json::from_str(&json).map_err(FavoritesFault::Malformed)?;

    // A hand-edited slot may carry duplicates; keep the first occurrence.
    let mut unique: Vec<Book> = Vec::with_capacity(books.len());
    for book in books {
        if !unique.iter().any(|b| b.id() == book.id()) {
            unique.push(book);
        }
    }
    Ok(unique)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

thread_local! {
    static NOTIFY_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Per-thread nesting counter for notifications; decremented on drop.
struct NotifyDepth;

impl NotifyDepth {
    fn enter() -> Option<Self> {
        NOTIFY_DEPTH.with(|depth| {
            if depth.get() >= MAX_NOTIFY_DEPTH {
                None
            } else {
                depth.set(depth.get() + 1);
                Some(NotifyDepth)
            }
        })
    }
}

impl Drop for NotifyDepth {
    fn drop(&mut self) {
        NOTIFY_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
