use ndarray::{Array2, Array4, ArrayView2, ArrayView4, ErrorKind, ShapeError};

use crate::Error;

/// Height, width and channel count of every image in a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl ImageShape {
    pub const CIFAR: Self = Self {
        height: 32,
        width: 32,
        channels: 3,
    };

    /// Number of values in one flattened image.
    pub const fn row_len(&self) -> usize {
        self.height * self.width * self.channels
    }
}

/// Checks that `labels` is an `N×1` column aligned with the `N` images.
pub(crate) fn check_aligned(images: &ArrayView4<u8>, labels: &ArrayView2<u8>) -> Result<(), Error> {
    let count = images.len_of(ndarray::Axis(0));
    let (rows, cols) = labels.dim();
    if cols != 1 {
        return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
    }
    if rows != count {
        return Err(Error::ShapeMismatch {
            images: count,
            labels: rows,
        });
    }
    Ok(())
}

/// One split of a dataset: `N` images laid out as `(N, height, width, channels)`
/// and their labels as an `N×1` column.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    images: Array4<u8>,
    labels: Array2<u8>,
}

impl Partition {
    pub fn new(images: Array4<u8>, labels: Array2<u8>) -> Result<Self, Error> {
        check_aligned(&images.view(), &labels.view())?;
        Ok(Self { images, labels })
    }

    /// Builds a partition from a flat label sequence, one label per image.
    pub fn from_label_vec(images: Array4<u8>, labels: Vec<u8>) -> Result<Self, Error> {
        let count = labels.len();
        let labels = Array2::from_shape_vec((count, 1), labels)?;
        Self::new(images, labels)
    }

    pub fn len(&self) -> usize {
        self.labels.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape(&self) -> ImageShape {
        let (_, height, width, channels) = self.images.dim();
        ImageShape {
            height,
            width,
            channels,
        }
    }

    pub fn images(&self) -> ArrayView4<'_, u8> {
        self.images.view()
    }

    pub fn labels(&self) -> ArrayView2<'_, u8> {
        self.labels.view()
    }
}

/// The train and test partitions of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Splits {
    pub train: Partition,
    pub test: Partition,
}

/// Anything that can hand over a dataset already split into train and test.
pub trait DatasetSource {
    /// Short human readable name used in log lines.
    fn name(&self) -> &str;

    fn load(&self) -> Result<Splits, Error>;
}
