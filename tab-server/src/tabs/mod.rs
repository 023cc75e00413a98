//! 账单模块
//!
//! - [`storage`]: redb persistence, one write transaction per mutation
//! - [`pricing`]: subtotal and total arithmetic
//! - [`state_machine`]: OPEN / CLOSED transitions
//! - [`policy`]: who may read or mutate a tab
//! - [`service`]: orchestration, per-tab locking and event publication

mod locks;
pub mod policy;
pub mod pricing;
pub mod projection;
pub mod service;
pub mod state_machine;
pub mod storage;

pub use locks::{KeyGuard, LockRegistry};
pub use policy::{AccessPolicy, Caller, ViewScope};
pub use service::TabService;
pub use state_machine::{Actor, TabAction};
pub use storage::{StorageError, StorageStats, TabRecord, TabStorage};
