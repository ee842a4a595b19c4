pub use crate::convert::{convert, Outputs, Summary, TableSize};
pub use crate::datasets::{DatasetSource, ImageShape, Partition, Splits};
pub use crate::download::{default_cache_root, untar_dataset, DatasetUrl};
pub use crate::error::Error;
pub use crate::serialize::{write_table, write_table_to_path};
pub use crate::sources::{Cifar, CifarKind, ImageFolder, LabelMode};
pub use crate::table::Table;
