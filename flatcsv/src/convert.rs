use std::path::PathBuf;

use crate::{
    datasets::DatasetSource, error::Error, serialize::write_table_to_path, table::Table,
};

/// Where the two tables are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    pub train: PathBuf,
    pub test: PathBuf,
}

impl Outputs {
    /// `<stem>_train.csv` and `<stem>_test.csv` in the current directory.
    pub fn with_stem(stem: &str) -> Self {
        Self {
            train: PathBuf::from(format!("{stem}_train.csv")),
            test: PathBuf::from(format!("{stem}_test.csv")),
        }
    }
}

impl Default for Outputs {
    fn default() -> Self {
        Self::with_stem("cifar10")
    }
}

/// Size of one written table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSize {
    pub rows: usize,
    pub cols: usize,
}

impl From<&Table> for TableSize {
    fn from(table: &Table) -> Self {
        Self {
            rows: table.rows(),
            cols: table.cols(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub train: TableSize,
    pub test: TableSize,
}

/// Loads both partitions from `source`, flattens them and writes the train and
/// test tables.
///
/// Both tables are built before anything touches the filesystem, so a shape
/// error leaves no output behind.
pub fn convert(source: &dyn DatasetSource, outputs: &Outputs) -> Result<Summary, Error> {
    log::info!("Converting {}", source.name());
    let splits = source.load()?;

    let train = Table::from_partition(&splits.train)?;
    let test = Table::from_partition(&splits.test)?;
    drop(splits);

    write_table_to_path(&train, &outputs.train)?;
    write_table_to_path(&test, &outputs.test)?;

    Ok(Summary {
        train: TableSize::from(&train),
        test: TableSize::from(&test),
    })
}
