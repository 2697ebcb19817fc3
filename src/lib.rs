pub mod amount;
pub mod csv;
pub mod engine;
pub mod id;
pub mod model;
pub mod store;

pub use amount::Amount;
pub use engine::Engine;
pub use model::{BalanceSummary, Currency, Entry, Investment, Referral, Snapshot, User, Withdrawal};
pub use store::{FileStorage, MemoryStorage, SnapshotStore, Storage};
