pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryKeyValueStore;
pub use sqlite::{SqliteKeyValueStore, SqliteStorage};
pub use traits::KeyValueStore;
