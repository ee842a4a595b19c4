use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::{error::Error, table::Table};

/// Writes `table` as comma separated rows, one line each, with no header and
/// no index column.
pub fn write_table<W: Write>(table: &Table, sink: W) -> Result<(), Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(sink);
    for row in table.iter_rows() {
        writer.write_record(row.iter().map(u8::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

/// Creates (or truncates) `path` and writes `table` into it.
pub fn write_table_to_path(table: &Table, path: &Path) -> Result<(), Error> {
    log::info!(
        "Writing {}x{} table to: {}",
        table.rows(),
        table.cols(),
        path.display()
    );
    let file = BufWriter::new(File::create(path)?);
    write_table(table, file)
}
