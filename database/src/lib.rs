pub mod backend;
pub mod cache;
pub mod db;
pub mod errors;
pub mod key;
pub mod manager;
pub mod memory;
pub mod staging;
pub mod stores;

pub use backend::{KvBackend, TestKvBackend, WriteOp};
pub use db::Database;
pub use errors::{StoreError, StoreResult, StoreResultExtensions};
pub use key::{DbKey, StorePrefix};
pub use manager::{DbManager, DbTransaction};
pub use memory::MemoryDb;
pub use staging::{StagingArea, StagingShard};

pub mod prelude {
    pub use crate::errors::{StoreError, StoreResult, StoreResultExtensions};
    pub use crate::manager::DbManager;
    pub use crate::staging::StagingArea;
    pub use crate::stores::{GhostdagStore, HeaderStore, ReachabilityStore, RelationsStore, UtxoSetStore};
}
