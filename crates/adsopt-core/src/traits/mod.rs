pub mod record_store;
pub mod spend_source;

pub use record_store::IRecordStore;
pub use spend_source::{ChunkFetchError, ChunkResult, ISpendSource};
