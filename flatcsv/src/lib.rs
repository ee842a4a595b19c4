pub mod convert;
pub mod datasets;
pub mod download;
pub mod error;
pub mod prelude;
pub mod serialize;
pub mod sources;
pub mod table;

pub use self::{
    convert::{convert, Outputs, Summary},
    download::{default_cache_root, untar_dataset, DatasetUrl},
    error::Error,
};
