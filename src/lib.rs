//! Format-agnostic dataset descriptions, schema inference, row streams and
//! content-addressed persistence.

pub mod error;
pub mod format;
pub mod format_config;
pub mod datatype;
pub mod compression;
pub mod hash;
pub mod structure;
pub mod dataset;
pub mod detect;
pub mod dsio;
pub mod store;
pub mod dsfs;

pub use error::{DatasetError, Result};
pub use format::DataFormat;
pub use format_config::{CsvOptions, FormatConfig, JsonOptions, OptionMap};
pub use datatype::Type;
pub use compression::Compression;
pub use hash::ContentKey;
pub use structure::{Field, Schema, Structure};
pub use dataset::{Citation, Dataset, License, Query};
pub use dsio::{new_row_reader, new_row_writer, Row, RowReader, RowWriter};
pub use store::{ContentStore, FsStore, MemStore};
