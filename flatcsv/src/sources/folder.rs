use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use image::{io::Reader as ImageReader, ImageFormat};
use ndarray::Array4;
use walkdir::WalkDir;

use crate::{
    datasets::{DatasetSource, Partition, Splits},
    error::Error,
};

fn image_extensions() -> HashSet<&'static str> {
    let mut set = HashSet::default();
    set.extend(ImageFormat::Jpeg.extensions_str());
    set.extend(ImageFormat::Png.extensions_str());
    set.extend(ImageFormat::Gif.extensions_str());
    set.extend(ImageFormat::WebP.extensions_str());
    set.extend(ImageFormat::Tiff.extensions_str());
    set.extend(ImageFormat::Bmp.extensions_str());
    set.extend(ImageFormat::Qoi.extensions_str());
    set
}

/// A dataset stored as `<root>/{train,test}/<label>/<image>`, where `<label>`
/// is the numeric class. Images are read as RGB.
#[derive(Debug, Clone)]
pub struct ImageFolder {
    root: PathBuf,
}

impl ImageFolder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_owned(),
        }
    }

    fn files(&self, split: &str) -> Result<Vec<(PathBuf, u8)>, Error> {
        let exts = image_extensions();
        let mut files = vec![];
        let walker = WalkDir::new(self.root.join(split))
            .min_depth(2)
            .max_depth(2)
            .follow_links(true)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            let known = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| exts.contains(ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if !entry.file_type().is_file() || !known {
                continue;
            }
            let label_dir = path.parent().unwrap_or(path);
            let label = label_dir
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.parse::<u8>().ok())
                .ok_or_else(|| Error::InvalidLabel(label_dir.to_owned()))?;
            files.push((path.to_owned(), label));
        }
        Ok(files)
    }

    fn read_split(&self, split: &str) -> Result<Partition, Error> {
        let files = self.files(split)?;
        let mut size = None;
        let mut pixels = vec![];
        let mut labels = Vec::with_capacity(files.len());
        for (path, label) in files {
            let image = ImageReader::open(&path)?
                .with_guessed_format()?
                .decode()
                .map_err(|e| Error::DecodeImageError(path.clone(), e))?
                .into_rgb8();
            let found = image.dimensions();
            let expected = *size.get_or_insert(found);
            if found != expected {
                return Err(Error::ImageSizeMismatch {
                    path,
                    expected,
                    found,
                });
            }
            pixels.extend_from_slice(image.as_raw());
            labels.push(label);
        }
        let (width, height) = size.unwrap_or((0, 0));
        let images = Array4::from_shape_vec(
            (labels.len(), height as usize, width as usize, 3),
            pixels,
        )?;
        Partition::from_label_vec(images, labels)
    }
}

impl DatasetSource for ImageFolder {
    fn name(&self) -> &str {
        "image folder"
    }

    fn load(&self) -> Result<Splits, Error> {
        log::info!("Loading images from: {}", self.root.display());
        let train = self.read_split("train")?;
        let test = self.read_split("test")?;
        log::info!(
            "Loaded {} train and {} test images",
            train.len(),
            test.len()
        );
        Ok(Splits { train, test })
    }
}
