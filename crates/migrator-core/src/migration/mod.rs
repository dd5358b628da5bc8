//! Moving connections between environments through an encrypted interchange file

mod engine;
pub mod interchange;
mod types;

pub use engine::Migrator;
pub use interchange::InterchangeEntry;
pub use types::{CollisionStrategy, ExportRequest, ExportResult, ImportRequest, ImportResult};
