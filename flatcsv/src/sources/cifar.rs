//! The CIFAR-10 and CIFAR-100 datasets.
//!
//! The archives can be downloaded from the following page:
//! <https://www.cs.toronto.edu/~kriz/cifar.html>
//! The binary version of the datasets is used. Each record is the label byte(s)
//! followed by 3072 pixel bytes: the red, green and blue planes of a 32x32
//! image, one after the other.
use std::{
    fs,
    path::{Path, PathBuf},
};

use ndarray::Array4;

use crate::{
    datasets::{DatasetSource, ImageShape, Partition, Splits},
    download::{untar_dataset, DatasetUrl},
    error::Error,
};

const SHAPE: ImageShape = ImageShape::CIFAR;
const PIXELS_PER_IMAGE: usize = SHAPE.row_len();

/// Which label column of CIFAR-100 ends up in the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelMode {
    #[default]
    Fine,
    Coarse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CifarKind {
    Cifar10,
    Cifar100(LabelMode),
}

impl CifarKind {
    pub fn url(self) -> DatasetUrl {
        match self {
            Self::Cifar10 => DatasetUrl::Cifar10,
            Self::Cifar100(_) => DatasetUrl::Cifar100,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Cifar10 => "CIFAR-10",
            Self::Cifar100(_) => "CIFAR-100",
        }
    }

    fn label_bytes(self) -> usize {
        match self {
            Self::Cifar10 => 1,
            Self::Cifar100(_) => 2,
        }
    }

    /// Offset of the selected label within a record. CIFAR-100 stores the
    /// coarse label first.
    fn label_offset(self) -> usize {
        match self {
            Self::Cifar10 | Self::Cifar100(LabelMode::Coarse) => 0,
            Self::Cifar100(LabelMode::Fine) => 1,
        }
    }

    fn record_len(self) -> usize {
        self.label_bytes() + PIXELS_PER_IMAGE
    }

    fn train_files(self) -> &'static [&'static str] {
        match self {
            Self::Cifar10 => &[
                "data_batch_1.bin",
                "data_batch_2.bin",
                "data_batch_3.bin",
                "data_batch_4.bin",
                "data_batch_5.bin",
            ],
            Self::Cifar100(_) => &["train.bin"],
        }
    }

    fn test_files(self) -> &'static [&'static str] {
        match self {
            Self::Cifar10 => &["test_batch.bin"],
            Self::Cifar100(_) => &["test.bin"],
        }
    }
}

/// Splits a batch into its labels and its channel-major pixel planes.
fn decode_records(
    data: &[u8],
    kind: CifarKind,
    path: &Path,
    labels: &mut Vec<u8>,
    pixels: &mut Vec<u8>,
) -> Result<(), Error> {
    let record = kind.record_len();
    if data.len() % record != 0 {
        return Err(Error::TruncatedRecord {
            path: path.to_owned(),
            len: data.len(),
            record,
        });
    }
    for chunk in data.chunks_exact(record) {
        labels.push(chunk[kind.label_offset()]);
        pixels.extend_from_slice(&chunk[kind.label_bytes()..]);
    }
    Ok(())
}

fn read_partition(dir: &Path, files: &[&str], kind: CifarKind) -> Result<Partition, Error> {
    let mut labels = vec![];
    let mut pixels = vec![];
    for file in files {
        let path = dir.join(file);
        let data = fs::read(&path)?;
        decode_records(&data, kind, &path, &mut labels, &mut pixels)?;
        log::debug!(
            "Read {} records from {}",
            data.len() / kind.record_len(),
            path.display()
        );
    }
    let count = labels.len();
    // Batches store (C, H, W); tables want (H, W, C).
    let planes = (count, SHAPE.channels, SHAPE.height, SHAPE.width);
    let images = Array4::from_shape_vec(planes, pixels)?
        .permuted_axes([0, 2, 3, 1])
        .as_standard_layout()
        .into_owned();
    Partition::from_label_vec(images, labels)
}

#[derive(Debug, Clone)]
enum Location {
    Extracted(PathBuf),
    Cache(PathBuf),
}

/// A CIFAR dataset read from its binary batches.
#[derive(Debug, Clone)]
pub struct Cifar {
    kind: CifarKind,
    location: Location,
}

impl Cifar {
    /// Reads batches from a directory that already holds the extracted archive.
    pub fn from_dir(kind: CifarKind, dir: impl AsRef<Path>) -> Self {
        Self {
            kind,
            location: Location::Extracted(dir.as_ref().to_owned()),
        }
    }

    /// Downloads and extracts the archive under `cache_root` on first load.
    pub fn cached(kind: CifarKind, cache_root: impl AsRef<Path>) -> Self {
        Self {
            kind,
            location: Location::Cache(cache_root.as_ref().to_owned()),
        }
    }

    pub fn kind(&self) -> CifarKind {
        self.kind
    }

    fn batch_dir(&self) -> Result<PathBuf, Error> {
        match &self.location {
            Location::Extracted(dir) => Ok(dir.clone()),
            Location::Cache(root) => untar_dataset(self.kind.url(), root),
        }
    }
}

impl DatasetSource for Cifar {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn load(&self) -> Result<Splits, Error> {
        let dir = self.batch_dir()?;
        log::info!("Loading {} batches from: {}", self.name(), dir.display());
        let train = read_partition(&dir, self.kind.train_files(), self.kind)?;
        let test = read_partition(&dir, self.kind.test_files(), self.kind)?;
        log::info!(
            "Loaded {} train and {} test images",
            train.len(),
            test.len()
        );
        Ok(Splits { train, test })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::tests::write_archive;

    fn pixel(seed: u8, c: usize, h: usize, w: usize) -> u8 {
        (seed as usize * 31 + c * 101 + h * 7 + w) as u8
    }

    /// One record in the on-disk layout: labels, then the R, G and B planes.
    fn record(labels: &[u8], seed: u8) -> Vec<u8> {
        let mut out = labels.to_vec();
        for c in 0..SHAPE.channels {
            for h in 0..SHAPE.height {
                for w in 0..SHAPE.width {
                    out.push(pixel(seed, c, h, w));
                }
            }
        }
        out
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("flatcsv-cifar-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn planes_are_transposed_to_channels_last() {
        let data = [record(&[4], 1), record(&[9], 2)].concat();
        let dir = scratch_dir("transpose");
        fs::write(dir.join("test_batch.bin"), &data).unwrap();

        let partition = read_partition(&dir, &["test_batch.bin"], CifarKind::Cifar10).unwrap();
        assert_eq!(partition.len(), 2);
        assert_eq!(partition.shape(), ImageShape::CIFAR);
        assert_eq!(partition.labels().column(0).to_vec(), vec![4, 9]);

        let images = partition.images();
        for (n, seed) in [(0, 1), (1, 2)] {
            for (h, w, c) in [(0, 0, 0), (0, 1, 2), (5, 17, 1), (31, 31, 2)] {
                assert_eq!(images[[n, h, w, c]], pixel(seed, c, h, w));
            }
        }
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn truncated_batch_is_rejected() {
        let mut data = record(&[1], 0);
        data.pop();
        let mut labels = vec![];
        let mut pixels = vec![];
        let err = decode_records(
            &data,
            CifarKind::Cifar10,
            Path::new("broken.bin"),
            &mut labels,
            &mut pixels,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedRecord {
                len: 3072,
                record: 3073,
                ..
            }
        ));
    }

    #[test]
    fn cifar100_label_mode_selects_column() {
        let data = record(&[3, 42], 0);
        for (mode, expected) in [(LabelMode::Coarse, 3), (LabelMode::Fine, 42)] {
            let mut labels = vec![];
            let mut pixels = vec![];
            decode_records(
                &data,
                CifarKind::Cifar100(mode),
                Path::new("train.bin"),
                &mut labels,
                &mut pixels,
            )
            .unwrap();
            assert_eq!(labels, vec![expected]);
            assert_eq!(pixels.len(), PIXELS_PER_IMAGE);
            assert_eq!(pixels[0], pixel(0, 0, 0, 0));
        }
    }

    #[test]
    fn cifar10_train_concatenates_batches_in_order() {
        let dir = scratch_dir("train-order");
        for (i, file) in CifarKind::Cifar10.train_files().iter().enumerate() {
            fs::write(dir.join(file), record(&[i as u8], i as u8)).unwrap();
        }
        fs::write(dir.join("test_batch.bin"), record(&[7], 7)).unwrap();

        let splits = Cifar::from_dir(CifarKind::Cifar10, &dir).load().unwrap();
        assert_eq!(
            splits.train.labels().column(0).to_vec(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(splits.test.labels().column(0).to_vec(), vec![7]);
        assert_eq!(splits.train.images()[[3, 0, 0, 0]], pixel(3, 0, 0, 0));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_batch_is_an_io_error() {
        let dir = scratch_dir("missing");
        let err = Cifar::from_dir(CifarKind::Cifar100(LabelMode::Fine), &dir)
            .load()
            .unwrap_err();
        assert!(matches!(err, Error::IO(_)));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn cached_source_extracts_and_loads_archive() {
        let root = scratch_dir("cached");
        let mut files: Vec<(String, Vec<u8>)> = CifarKind::Cifar10
            .train_files()
            .iter()
            .enumerate()
            .map(|(i, file)| {
                let batch = [record(&[i as u8], 0), record(&[i as u8 + 10], 1)].concat();
                (file.to_string(), batch)
            })
            .collect();
        files.push(("test_batch.bin".to_string(), record(&[9], 2)));
        let entries: Vec<(&str, &[u8])> = files
            .iter()
            .map(|(name, data)| (name.as_str(), data.as_slice()))
            .collect();
        fs::create_dir_all(root.join("archive")).unwrap();
        write_archive(
            &root.join("archive").join("cifar-10-binary.tar.gz"),
            "cifar-10-batches-bin",
            &entries,
        );

        // An interrupted earlier unpack left a batch cut at a record boundary.
        let stale = root.join("data").join("cifar-10-batches-bin");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("data_batch_5.bin"), record(&[4], 0)).unwrap();

        let splits = Cifar::cached(CifarKind::Cifar10, &root).load().unwrap();

        assert_eq!(splits.train.len(), 10);
        assert_eq!(
            splits.train.labels().column(0).to_vec(),
            vec![0, 10, 1, 11, 2, 12, 3, 13, 4, 14]
        );
        assert_eq!(splits.test.labels().column(0).to_vec(), vec![9]);
        fs::remove_dir_all(root).unwrap();
    }
}
