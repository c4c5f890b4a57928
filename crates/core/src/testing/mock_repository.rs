//! Mock item repository for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use uuid::Uuid;

use crate::item::{Item, ItemError, ItemRepository};

/// In-memory implementation of the ItemRepository trait.
///
/// Provides controllable behavior for testing:
/// - Simulate slow reads, globally or per item
/// - Fail the identifier listing or individual saves
/// - Delete items right after the identifiers were listed
/// - Panic once while reading selected items
/// - Track call counts and the peak number of concurrent reads
///
/// # Example
///
/// ```rust,ignore
/// use itemflow_core::testing::MockItemRepository;
///
/// let repository = MockItemRepository::new();
/// let item = repository.insert(fixtures::new_item("Alpha"));
///
/// // The next listing returns A, then A disappears
/// repository.delete_after_listing(item.id);
/// ```
#[derive(Debug, Default)]
pub struct MockItemRepository {
    /// Stored items, in insertion order.
    items: Mutex<Vec<Item>>,
    /// Delay applied to every `find_by_id`.
    read_delay: Mutex<Duration>,
    /// Per-item delay overriding `read_delay`.
    read_delays: Mutex<HashMap<Uuid, Duration>>,
    /// If set, `find_all_ids` fails with this error.
    listing_error: Mutex<Option<ItemError>>,
    /// Saves of these items fail with the mapped error.
    save_errors: Mutex<HashMap<Uuid, ItemError>>,
    /// Removed immediately after the next `find_all_ids`.
    pending_deletes: Mutex<HashSet<Uuid>>,
    /// The next read of each of these items panics.
    panicking_reads: Mutex<HashSet<Uuid>>,
    reads: AtomicUsize,
    saves: AtomicUsize,
    reads_in_flight: AtomicUsize,
    peak_reads_in_flight: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        let repository = Self::new();
        *lock(&repository.items) = items;
        repository
    }

    /// Stores an item directly, bypassing failure injection.
    pub fn insert(&self, item: Item) -> Item {
        upsert(&mut lock(&self.items), item.clone());
        item
    }

    /// Reads an item directly, bypassing delays.
    pub fn get(&self, id: Uuid) -> Option<Item> {
        lock(&self.items).iter().find(|i| i.id == id).cloned()
    }

    /// Snapshot of all stored items.
    pub fn items(&self) -> Vec<Item> {
        lock(&self.items).clone()
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let mut items = lock(&self.items);
        let before = items.len();
        items.retain(|i| i.id != id);
        items.len() != before
    }

    /// Sets the delay applied to every read.
    pub fn set_read_delay(&self, delay: Duration) {
        *lock(&self.read_delay) = delay;
    }

    /// Sets the delay applied to reads of one item.
    pub fn set_read_delay_for(&self, id: Uuid, delay: Duration) {
        lock(&self.read_delays).insert(id, delay);
    }

    /// Makes `find_all_ids` fail.
    pub fn fail_listing(&self, error: ItemError) {
        *lock(&self.listing_error) = Some(error);
    }

    /// Makes every save of `id` fail.
    pub fn fail_saves_for(&self, id: Uuid, error: ItemError) {
        lock(&self.save_errors).insert(id, error);
    }

    /// Deletes `id` right after the next identifier listing.
    pub fn delete_after_listing(&self, id: Uuid) {
        lock(&self.pending_deletes).insert(id);
    }

    /// Makes the next read of `id` panic; later reads succeed.
    pub fn panic_on_read(&self, id: Uuid) {
        lock(&self.panicking_reads).insert(id);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Highest number of `find_by_id` calls observed running at once.
    pub fn peak_concurrent_reads(&self) -> usize {
        self.peak_reads_in_flight.load(Ordering::SeqCst)
    }

    fn delay_for(&self, id: Uuid) -> Duration {
        lock(&self.read_delays)
            .get(&id)
            .copied()
            .unwrap_or_else(|| *lock(&self.read_delay))
    }
}

fn upsert(items: &mut Vec<Item>, item: Item) {
    match items.iter_mut().find(|i| i.id == item.id) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

impl ItemRepository for MockItemRepository {
    fn find_all(&self) -> Result<Vec<Item>, ItemError> {
        Ok(self.items())
    }

    fn find_all_ids(&self) -> Result<Vec<Uuid>, ItemError> {
        if let Some(error) = lock(&self.listing_error).clone() {
            return Err(error);
        }

        let ids: Vec<Uuid> = lock(&self.items).iter().map(|i| i.id).collect();

        let pending: Vec<Uuid> = lock(&self.pending_deletes).drain().collect();
        for id in pending {
            self.remove(id);
        }

        Ok(ids)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Item>, ItemError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if lock(&self.panicking_reads).remove(&id) {
            panic!("injected panic while reading item {}", id);
        }

        let now = self.reads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_reads_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delay_for(id);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let item = self.get(id);
        self.reads_in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(item)
    }

    fn save(&self, item: Item) -> Result<Item, ItemError> {
        self.saves.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = lock(&self.save_errors).get(&item.id).cloned() {
            return Err(error);
        }

        Ok(self.insert(item))
    }

    fn delete_by_id(&self, id: Uuid) -> Result<(), ItemError> {
        if self.remove(id) {
            Ok(())
        } else {
            Err(ItemError::NotFound(id))
        }
    }
}
