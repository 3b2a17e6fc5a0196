//! Hash/range keyed tables over embedded storage engines.
//!
//! Rows are addressed by a hash key and an optional range key and kept in
//! range-key order within each hash key. Keys are stored as length-prefixed
//! composite byte keys, so any engine that keeps keys sorted under
//! [`encoding::compare_keys`] can back a [`Table`].

pub mod backend;
pub mod codec;
pub mod config;
pub mod cursor;
pub mod encoding;
pub mod error;
pub mod registry;
pub mod row;
pub mod table;

// Re-export common types for convenience
pub use backend::{Backend, MemoryBackend, RedbBackend};
pub use codec::{Codec, DefaultCodec, DefaultCodecs, TableCodecs};
pub use config::StoreConfig;
pub use cursor::{Direction, RowIter};
pub use error::{Error, Result};
pub use registry::TableRegistry;
pub use row::Row;
pub use table::{Batch, Table, TableIter};
