use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("io error: {0}")]
    IO(#[from] std::io::Error),

    #[error("homedir error: {0}")]
    Home(#[from] homedir::GetHomeError),

    #[error("home directory could not be determined")]
    HomeNotFound,

    #[error("tar entry error: {0}")]
    TarEntry(&'static str),

    #[error("download name not specified: {0}")]
    DownloadNameNotSpecified(String),

    #[error("error while decoding image '{0}': {1}")]
    DecodeImageError(PathBuf, image::ImageError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("partition has {images} images but {labels} labels")]
    ShapeMismatch { images: usize, labels: usize },

    #[error("image '{path}' is {found:?} but the partition expects {expected:?}")]
    ImageSizeMismatch {
        path: PathBuf,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("batch '{path}' has {len} bytes, not a multiple of the {record}-byte record size")]
    TruncatedRecord {
        path: PathBuf,
        len: usize,
        record: usize,
    },

    #[error("label directory '{0}' is not a number between 0 and 255")]
    InvalidLabel(PathBuf),
}
