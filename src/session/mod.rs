pub mod identity;
pub mod registry;
pub mod storage;
pub mod store;
pub mod types;

pub use identity::SessionId;
pub use registry::SessionRegistry;
pub use storage::{create_snapshot_store, MemorySnapshots, SnapshotStore, SqliteSnapshots};
pub use store::SessionStore;
pub use types::{MessageRole, TranscriptEntry};
