//! Loading study inputs: JSON study documents and long-format dose tables.

mod record;
mod rows;
mod study;

pub use record::EndpointRecord;
pub use rows::{RowLoader, RowLoaderConfig};
pub use study::StudyInput;
