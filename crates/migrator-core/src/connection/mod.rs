//! Connection records and the stores that hold them

mod memory;
mod store;
mod types;

pub use memory::{MemoryConnector, MemoryStore};
pub use store::{RecordStore, StoreConnector};
pub use types::{conn_type, Connection, ExportRecord};
