use ndarray::{concatenate, Array2, ArrayView1, ArrayView2, ArrayView4, Axis, CowArray, Ix2};

use crate::{
    datasets::{check_aligned, Partition},
    error::Error,
};

/// Reshapes `(N, height, width, channels)` to `(N, height * width * channels)`.
/// Contiguous input is reshaped in place; anything else is copied once.
fn flatten<'a>(images: ArrayView4<'a, u8>) -> Result<CowArray<'a, u8, Ix2>, Error> {
    let (count, height, width, channels) = images.dim();
    let shape = (count, height * width * channels);
    if images.is_standard_layout() {
        return Ok(CowArray::from(images.into_shape(shape)?));
    }
    let owned = images.as_standard_layout().into_owned();
    Ok(CowArray::from(owned.into_shape(shape)?))
}

/// A partition flattened into rows of `[label, pixel_0, pixel_1, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    data: Array2<u8>,
}

impl Table {
    pub fn from_partition(partition: &Partition) -> Result<Self, Error> {
        Self::from_parts(partition.images(), partition.labels())
    }

    /// Flattens `(N, height, width, channels)` images in row-major order and
    /// puts the `N×1` label column in front of them.
    pub fn from_parts(images: ArrayView4<u8>, labels: ArrayView2<u8>) -> Result<Self, Error> {
        check_aligned(&images, &labels)?;
        let flat = flatten(images)?;
        let data = concatenate(Axis(1), &[labels.view(), flat.view()])?;
        Ok(Self { data })
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, u8> {
        self.data.row(index)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = ArrayView1<'_, u8>> {
        self.data.rows().into_iter()
    }

    pub fn as_array(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }
}
