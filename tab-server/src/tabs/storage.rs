//! redb-based storage for tabs and their lines
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `tabs` | `tab_id` | `Tab` (JSON) | Tab rows, never deleted |
//! | `tab_items` | `(tab_id, item_id)` | `TabItem` (JSON) | Lines in insertion order |
//! | `tab_item_index` | `(tab_id, menu_item_id)` | `item_id` | One line per menu item |
//! | `open_tabs` | `(user_id, restaurant_id)` | `tab_id` | One open tab per user and restaurant |
//! | `user_tabs` | `(user_id, tab_id)` | `()` | "My tabs" listing |
//! | `restaurant_open_tabs` | `(restaurant_id, tab_id)` | `()` | Manager listing |
//! | `sequence_counter` | name | `u64` | Surrogate id allocation |
//!
//! Every mutation is a single write transaction. The cached `Tab::total` is
//! recomputed from the persisted lines inside that same transaction.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    MenuItemId, PaymentMethodId, RestaurantId, Tab, TabId, TabItem, TabItemId, UserId,
};
use thiserror::Error;

use super::pricing;

const TABS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("tabs");

const TAB_ITEMS_TABLE: TableDefinition<(i64, i64), &[u8]> = TableDefinition::new("tab_items");

/// key = (tab_id, menu_item_id), value = item_id
const TAB_ITEM_INDEX_TABLE: TableDefinition<(i64, i64), i64> =
    TableDefinition::new("tab_item_index");

/// key = (user_id, restaurant_id), value = tab_id
const OPEN_TABS_TABLE: TableDefinition<(i64, i64), i64> = TableDefinition::new("open_tabs");

const USER_TABS_TABLE: TableDefinition<(i64, i64), ()> = TableDefinition::new("user_tabs");

const RESTAURANT_OPEN_TABS_TABLE: TableDefinition<(i64, i64), ()> =
    TableDefinition::new("restaurant_open_tabs");

const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const TAB_SEQUENCE_KEY: &str = "tab_id";
const ITEM_SEQUENCE_KEY: &str = "tab_item_id";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tab not found: {0}")]
    TabNotFound(TabId),

    #[error("Tab item not found: tab_id={tab_id}, item_id={item_id}")]
    TabItemNotFound { tab_id: TabId, item_id: TabItemId },

    #[error("Open tab already exists: {tab_id}")]
    OpenTabExists { tab_id: TabId },

    #[error("Tab is closed: {0}")]
    TabClosed(TabId),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TabNotFound(tab_id) => AppError::tab_not_found(tab_id),
            StorageError::TabItemNotFound { tab_id, item_id } => {
                AppError::new(ErrorCode::TabItemNotFound)
                    .with_detail("tab_id", tab_id)
                    .with_detail("item_id", item_id)
            }
            StorageError::OpenTabExists { tab_id } => AppError::conflict(
                ErrorCode::TabAlreadyOpen,
                ErrorCode::TabAlreadyOpen.message(),
            )
            .with_detail("tab_id", tab_id),
            StorageError::TabClosed(tab_id) => AppError::tab_closed(tab_id),
            other => {
                tracing::error!(error = %other, "Tab storage failure");
                AppError::database(other.to_string())
            }
        }
    }
}

/// A tab together with all of its lines, read in one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TabRecord {
    pub tab: Tab,
    pub items: Vec<TabItem>,
}

impl TabRecord {
    pub fn item(&self, item_id: TabItemId) -> Option<&TabItem> {
        self.items.iter().find(|i| i.id == item_id)
    }
}

/// Tab storage backed by redb
#[derive(Clone)]
pub struct TabStorage {
    db: Arc<Database>,
}

impl TabStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(TABS_TABLE)?;
            let _ = write_txn.open_table(TAB_ITEMS_TABLE)?;
            let _ = write_txn.open_table(TAB_ITEM_INDEX_TABLE)?;
            let _ = write_txn.open_table(OPEN_TABS_TABLE)?;
            let _ = write_txn.open_table(USER_TABS_TABLE)?;
            let _ = write_txn.open_table(RESTAURANT_OPEN_TABS_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            for key in [TAB_SEQUENCE_KEY, ITEM_SEQUENCE_KEY] {
                if seq_table.get(key)?.is_none() {
                    seq_table.insert(key, 0u64)?;
                }
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    // ========== Sequence Operations ==========

    fn next_id(txn: &WriteTransaction, key: &str) -> StorageResult<i64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table.get(key)?.map(|guard| guard.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(key, next)?;
        Ok(next as i64)
    }

    // ========== Transaction helpers ==========

    fn load_tab_txn(txn: &WriteTransaction, tab_id: TabId) -> StorageResult<Tab> {
        let table = txn.open_table(TABS_TABLE)?;
        let tab = match table.get(tab_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(StorageError::TabNotFound(tab_id)),
        };
        Ok(tab)
    }

    fn store_tab_txn(txn: &WriteTransaction, tab: &Tab) -> StorageResult<()> {
        let mut table = txn.open_table(TABS_TABLE)?;
        let value = serde_json::to_vec(tab)?;
        table.insert(tab.id, value.as_slice())?;
        Ok(())
    }

    fn store_item_txn(txn: &WriteTransaction, item: &TabItem) -> StorageResult<()> {
        let mut table = txn.open_table(TAB_ITEMS_TABLE)?;
        let value = serde_json::to_vec(item)?;
        table.insert((item.tab_id, item.id), value.as_slice())?;
        Ok(())
    }

    fn items_txn(txn: &WriteTransaction, tab_id: TabId) -> StorageResult<Vec<TabItem>> {
        let table = txn.open_table(TAB_ITEMS_TABLE)?;
        Self::collect_items(&table, tab_id)
    }

    fn collect_items(
        table: &impl ReadableTable<(i64, i64), &'static [u8]>,
        tab_id: TabId,
    ) -> StorageResult<Vec<TabItem>> {
        let mut items = Vec::new();
        for result in table.range((tab_id, i64::MIN)..=(tab_id, i64::MAX))? {
            let (_key, value) = result?;
            items.push(serde_json::from_slice(value.value())?);
        }
        Ok(items)
    }

    /// Recompute the cached total from persisted lines and store the tab
    fn refresh_total_txn(txn: &WriteTransaction, mut tab: Tab) -> StorageResult<TabRecord> {
        let items = Self::items_txn(txn, tab.id)?;
        tab.total = pricing::total(&items);
        Self::store_tab_txn(txn, &tab)?;
        Ok(TabRecord { tab, items })
    }

    // ========== Mutations ==========

    /// Create an open tab, unless one is already open for (user, restaurant)
    pub fn create_tab(&self, user_id: UserId, restaurant_id: RestaurantId) -> StorageResult<Tab> {
        let txn = self.db.begin_write()?;
        let tab = {
            let mut open_tabs = txn.open_table(OPEN_TABS_TABLE)?;
            if let Some(existing) = open_tabs.get((user_id, restaurant_id))? {
                return Err(StorageError::OpenTabExists {
                    tab_id: existing.value(),
                });
            }

            let now = Utc::now();
            let tab = Tab {
                id: Self::next_id(&txn, TAB_SEQUENCE_KEY)?,
                user_id,
                restaurant_id,
                payment_method_id: None,
                open_time: now,
                close_time: None,
                is_open: true,
                total: pricing::to_money(Decimal::ZERO),
                created_at: now,
            };

            open_tabs.insert((user_id, restaurant_id), tab.id)?;
            txn.open_table(USER_TABS_TABLE)?.insert((user_id, tab.id), ())?;
            txn.open_table(RESTAURANT_OPEN_TABS_TABLE)?
                .insert((restaurant_id, tab.id), ())?;
            Self::store_tab_txn(&txn, &tab)?;
            tab
        };
        txn.commit()?;
        Ok(tab)
    }

    /// Insert or replace the line for `menu_item_id` with the given quantity
    /// and subtotal, then recompute the tab total.
    ///
    /// Returns the refreshed tab and the id of the touched line.
    pub fn upsert_item(
        &self,
        tab_id: TabId,
        menu_item_id: MenuItemId,
        quantity: u32,
        subtotal: Decimal,
    ) -> StorageResult<(TabRecord, TabItemId)> {
        let txn = self.db.begin_write()?;
        let (record, item_id) = {
            let tab = Self::load_tab_txn(&txn, tab_id)?;
            if !tab.is_open {
                return Err(StorageError::TabClosed(tab_id));
            }

            let mut index = txn.open_table(TAB_ITEM_INDEX_TABLE)?;
            let existing_id = index.get((tab_id, menu_item_id))?.map(|g| g.value());

            let item = match existing_id {
                Some(item_id) => {
                    let items = txn.open_table(TAB_ITEMS_TABLE)?;
                    let mut item: TabItem = match items.get((tab_id, item_id))? {
                        Some(value) => serde_json::from_slice(value.value())?,
                        None => return Err(StorageError::TabItemNotFound { tab_id, item_id }),
                    };
                    item.quantity = quantity;
                    item.subtotal = subtotal;
                    item
                }
                None => {
                    let item = TabItem {
                        id: Self::next_id(&txn, ITEM_SEQUENCE_KEY)?,
                        tab_id,
                        menu_item_id,
                        quantity,
                        subtotal,
                        served: false,
                        created_at: Utc::now(),
                    };
                    index.insert((tab_id, menu_item_id), item.id)?;
                    item
                }
            };

            Self::store_item_txn(&txn, &item)?;
            (Self::refresh_total_txn(&txn, tab)?, item.id)
        };
        txn.commit()?;
        Ok((record, item_id))
    }

    pub fn set_item_served(
        &self,
        tab_id: TabId,
        item_id: TabItemId,
        served: bool,
    ) -> StorageResult<TabRecord> {
        let txn = self.db.begin_write()?;
        let record = {
            let tab = Self::load_tab_txn(&txn, tab_id)?;
            let mut item: TabItem = {
                let items = txn.open_table(TAB_ITEMS_TABLE)?;
                let value = items.get((tab_id, item_id))?;
                match value {
                    Some(value) => serde_json::from_slice(value.value())?,
                    None => return Err(StorageError::TabItemNotFound { tab_id, item_id }),
                }
            };
            item.served = served;
            Self::store_item_txn(&txn, &item)?;
            Self::refresh_total_txn(&txn, tab)?
        };
        txn.commit()?;
        Ok(record)
    }

    /// Close an open tab. The final total is the live sum of its lines.
    pub fn close_tab(
        &self,
        tab_id: TabId,
        payment_method_id: PaymentMethodId,
        closed_at: DateTime<Utc>,
    ) -> StorageResult<TabRecord> {
        let txn = self.db.begin_write()?;
        let record = {
            let mut tab = Self::load_tab_txn(&txn, tab_id)?;
            if !tab.is_open {
                return Err(StorageError::TabClosed(tab_id));
            }

            tab.is_open = false;
            tab.close_time = Some(closed_at);
            tab.payment_method_id = Some(payment_method_id);

            txn.open_table(OPEN_TABS_TABLE)?
                .remove((tab.user_id, tab.restaurant_id))?;
            txn.open_table(RESTAURANT_OPEN_TABS_TABLE)?
                .remove((tab.restaurant_id, tab.id))?;

            Self::refresh_total_txn(&txn, tab)?
        };
        txn.commit()?;
        Ok(record)
    }

    // ========== Reads ==========

    pub fn get_tab(&self, tab_id: TabId) -> StorageResult<Option<Tab>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABS_TABLE)?;
        match table.get(tab_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Lines of a tab in insertion order
    pub fn get_items(&self, tab_id: TabId) -> StorageResult<Vec<TabItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TAB_ITEMS_TABLE)?;
        Self::collect_items(&table, tab_id)
    }

    /// Tab and lines from one snapshot
    pub fn get_record(&self, tab_id: TabId) -> StorageResult<Option<TabRecord>> {
        let read_txn = self.db.begin_read()?;
        let tabs = read_txn.open_table(TABS_TABLE)?;
        let tab: Tab = match tabs.get(tab_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Ok(None),
        };

        let items_table = read_txn.open_table(TAB_ITEMS_TABLE)?;
        let items = Self::collect_items(&items_table, tab_id)?;
        Ok(Some(TabRecord { tab, items }))
    }

    /// The line ordering `menu_item_id`, if any
    pub fn find_item(&self, tab_id: TabId, menu_item_id: MenuItemId) -> StorageResult<Option<TabItem>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(TAB_ITEM_INDEX_TABLE)?;
        let Some(item_id) = index.get((tab_id, menu_item_id))?.map(|g| g.value()) else {
            return Ok(None);
        };

        let items = read_txn.open_table(TAB_ITEMS_TABLE)?;
        match items.get((tab_id, item_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn find_open_tab(
        &self,
        user_id: UserId,
        restaurant_id: RestaurantId,
    ) -> StorageResult<Option<TabId>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OPEN_TABS_TABLE)?;
        Ok(table.get((user_id, restaurant_id))?.map(|g| g.value()))
    }

    /// All tabs of a user, open and closed
    pub fn list_user_tabs(&self, user_id: UserId) -> StorageResult<Vec<Tab>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_TABS_TABLE)?;
        let tabs = read_txn.open_table(TABS_TABLE)?;

        let mut result = Vec::new();
        for entry in index.range((user_id, i64::MIN)..=(user_id, i64::MAX))? {
            let (key, _) = entry?;
            let (_, tab_id) = key.value();
            if let Some(value) = tabs.get(tab_id)? {
                result.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(result)
    }

    pub fn list_open_tabs(&self, restaurant_id: RestaurantId) -> StorageResult<Vec<Tab>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(RESTAURANT_OPEN_TABS_TABLE)?;
        let tabs = read_txn.open_table(TABS_TABLE)?;

        let mut result = Vec::new();
        for entry in index.range((restaurant_id, i64::MIN)..=(restaurant_id, i64::MAX))? {
            let (key, _) = entry?;
            let (_, tab_id) = key.value();
            if let Some(value) = tabs.get(tab_id)? {
                result.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(result)
    }

    /// Get storage statistics
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;
        Ok(StorageStats {
            tab_count: read_txn.open_table(TABS_TABLE)?.len()?,
            open_tab_count: read_txn.open_table(OPEN_TABS_TABLE)?.len()?,
            item_count: read_txn.open_table(TAB_ITEMS_TABLE)?.len()?,
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStats {
    pub tab_count: u64,
    pub open_tab_count: u64,
    pub item_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> TabStorage {
        TabStorage::open_in_memory().unwrap()
    }

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_create_tab_assigns_sequential_ids() {
        let storage = storage();
        let a = storage.create_tab(1, 10).unwrap();
        let b = storage.create_tab(2, 10).unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(a.is_open);
        assert_eq!(a.total, Decimal::ZERO);
        assert!(a.close_time.is_none());
        assert!(a.payment_method_id.is_none());
    }

    #[test]
    fn test_second_open_tab_conflicts() {
        let storage = storage();
        let tab = storage.create_tab(1, 10).unwrap();

        let err = storage.create_tab(1, 10).unwrap_err();
        assert!(matches!(err, StorageError::OpenTabExists { tab_id } if tab_id == tab.id));

        // different restaurant is fine
        assert!(storage.create_tab(1, 11).is_ok());
        assert_eq!(storage.list_user_tabs(1).unwrap().len(), 2);
    }

    #[test]
    fn test_upsert_keeps_one_line_per_menu_item() {
        let storage = storage();
        let tab = storage.create_tab(1, 10).unwrap();

        let (_, first) = storage.upsert_item(tab.id, 7, 2, money(1700)).unwrap();
        let (record, second) = storage.upsert_item(tab.id, 7, 3, money(2550)).unwrap();

        assert_eq!(first, second);
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.items[0].quantity, 3);
        assert_eq!(record.tab.total, money(2550));
    }

    #[test]
    fn test_total_is_recomputed_from_lines() {
        let storage = storage();
        let tab = storage.create_tab(1, 10).unwrap();

        storage.upsert_item(tab.id, 7, 1, money(850)).unwrap();
        let (record, _) = storage.upsert_item(tab.id, 8, 2, money(399)).unwrap();

        assert_eq!(record.tab.total, money(1249));
        assert_eq!(storage.get_tab(tab.id).unwrap().unwrap().total, money(1249));
        assert_eq!(pricing::total(&record.items), record.tab.total);
    }

    #[test]
    fn test_upsert_on_missing_tab() {
        let err = storage().upsert_item(99, 7, 1, money(100)).unwrap_err();
        assert!(matches!(err, StorageError::TabNotFound(99)));
    }

    #[test]
    fn test_set_item_served() {
        let storage = storage();
        let tab = storage.create_tab(1, 10).unwrap();
        let (_, item_id) = storage.upsert_item(tab.id, 7, 1, money(850)).unwrap();

        let record = storage.set_item_served(tab.id, item_id, true).unwrap();
        assert!(record.item(item_id).unwrap().served);
        assert_eq!(record.tab.total, money(850));

        let err = storage.set_item_served(tab.id, 999, true).unwrap_err();
        assert!(matches!(err, StorageError::TabItemNotFound { .. }));
    }

    #[test]
    fn test_close_tab_releases_open_slot() {
        let storage = storage();
        let tab = storage.create_tab(1, 10).unwrap();
        storage.upsert_item(tab.id, 7, 2, money(1700)).unwrap();

        let closed_at = Utc::now();
        let record = storage.close_tab(tab.id, 5, closed_at).unwrap();

        assert!(!record.tab.is_open);
        assert_eq!(record.tab.close_time, Some(closed_at));
        assert_eq!(record.tab.payment_method_id, Some(5));
        assert_eq!(record.tab.total, money(1700));
        assert_eq!(storage.find_open_tab(1, 10).unwrap(), None);
        assert!(storage.list_open_tabs(10).unwrap().is_empty());

        // a new tab can be opened after close
        let next = storage.create_tab(1, 10).unwrap();
        assert_ne!(next.id, tab.id);
    }

    #[test]
    fn test_closed_tab_rejects_writes() {
        let storage = storage();
        let tab = storage.create_tab(1, 10).unwrap();
        storage.close_tab(tab.id, 5, Utc::now()).unwrap();

        assert!(matches!(
            storage.upsert_item(tab.id, 7, 1, money(100)).unwrap_err(),
            StorageError::TabClosed(_)
        ));
        assert!(matches!(
            storage.close_tab(tab.id, 5, Utc::now()).unwrap_err(),
            StorageError::TabClosed(_)
        ));
        assert!(storage.get_items(tab.id).unwrap().is_empty());
    }

    #[test]
    fn test_get_record_matches_committed_state() {
        let storage = storage();
        assert!(storage.get_record(42).unwrap().is_none());

        let tab = storage.create_tab(1, 10).unwrap();
        storage.upsert_item(tab.id, 7, 2, money(1700)).unwrap();
        storage.upsert_item(tab.id, 8, 1, money(600)).unwrap();
        let closed = storage.close_tab(tab.id, 5, Utc::now()).unwrap();

        let record = storage.get_record(tab.id).unwrap().unwrap();
        assert_eq!(record, closed);
        assert!(!record.tab.is_open);
        assert_eq!(record.items.len(), 2);
        assert_eq!(record.tab.total, money(2300));
    }

    #[test]
    fn test_items_are_scoped_to_their_tab() {
        let storage = storage();
        let a = storage.create_tab(1, 10).unwrap();
        let b = storage.create_tab(2, 10).unwrap();
        storage.upsert_item(a.id, 7, 1, money(100)).unwrap();
        storage.upsert_item(b.id, 7, 4, money(400)).unwrap();

        assert_eq!(storage.get_items(a.id).unwrap().len(), 1);
        assert_eq!(storage.find_item(b.id, 7).unwrap().unwrap().quantity, 4);
        assert!(storage.find_item(a.id, 8).unwrap().is_none());
        assert_eq!(storage.list_open_tabs(10).unwrap().len(), 2);
    }

    #[test]
    fn test_file_backed_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database").join("tabs.redb");

        let tab_id = {
            let storage = TabStorage::open(&path).unwrap();
            let tab = storage.create_tab(1, 10).unwrap();
            storage.upsert_item(tab.id, 7, 2, money(1700)).unwrap();
            tab.id
        };

        let storage = TabStorage::open(&path).unwrap();
        let record = storage.get_record(tab_id).unwrap().unwrap();
        assert_eq!(record.tab.total, money(1700));
        assert_eq!(record.items.len(), 1);
        assert_eq!(storage.create_tab(2, 10).unwrap().id, tab_id + 1);
    }

    #[test]
    fn test_stats() {
        let storage = storage();
        let tab = storage.create_tab(1, 10).unwrap();
        storage.create_tab(2, 10).unwrap();
        storage.upsert_item(tab.id, 7, 1, money(100)).unwrap();
        storage.close_tab(tab.id, 1, Utc::now()).unwrap();

        let stats = storage.get_stats().unwrap();
        assert_eq!(stats.tab_count, 2);
        assert_eq!(stats.open_tab_count, 1);
        assert_eq!(stats.item_count, 1);
    }
}
