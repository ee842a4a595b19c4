use std::{
    fs::{self, File},
    io::{self, BufWriter, Seek, Write},
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::Error;

const TORONTO_BASE: &str = "https://www.cs.toronto.edu/~kriz/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetUrl {
    Cifar10,
    Cifar100,
}

impl DatasetUrl {
    pub fn url(self) -> String {
        match self {
            Self::Cifar10 => format!("{TORONTO_BASE}cifar-10-binary.tar.gz"),
            Self::Cifar100 => format!("{TORONTO_BASE}cifar-100-binary.tar.gz"),
        }
    }
}

fn ensure_dir(path: &Path) -> Result<(), Error> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Default cache root, `~/.flatcsv`.
pub fn default_cache_root() -> Result<PathBuf, Error> {
    let home = homedir::get_my_home()?
        .ok_or(Error::HomeNotFound)?
        .join(".flatcsv");
    Ok(home)
}

/// Downloads the archive behind `url` into `<cache_root>/archive` (unless it is
/// already there) and extracts it into `<cache_root>/data`.
///
/// Returns the top-level directory of the extracted archive.
pub fn untar_dataset(url: DatasetUrl, cache_root: &Path) -> Result<PathBuf, Error> {
    let dest_dir = cache_root.join("archive");
    ensure_dir(&dest_dir)?;
    let archive_file = download_file(url.url(), &dest_dir)?;

    let dest_dir = cache_root.join("data");
    ensure_dir(&dest_dir)?;
    let dir = extract_archive(&archive_file, &dest_dir)?;

    Ok(dir)
}

fn file_name_from_url(url: &str) -> Option<&str> {
    let path = url.split(&['?', '#'][..]).next()?;
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

fn download_file(url: String, dest_dir: &Path) -> Result<PathBuf, Error> {
    let file_name = file_name_from_url(&url)
        .ok_or_else(|| Error::DownloadNameNotSpecified(url.clone()))?;

    let downloaded_file = dest_dir.join(file_name);
    if downloaded_file.exists() {
        log::info!("File already exists: {}", downloaded_file.display());
        return Ok(downloaded_file);
    }

    log::info!("Downloading {} to: {}", &url, downloaded_file.display());
    let response = reqwest::blocking::get(&url)?.error_for_status()?;

    // Stream into a side file first; only a finished download gets the real name.
    let partial_file = dest_dir.join(format!("{file_name}.part"));
    let mut dest = BufWriter::new(File::create(&partial_file)?);
    let pb = indicatif::ProgressBar::new(response.content_length().unwrap_or(0));
    let written = io::copy(&mut pb.wrap_read(response), &mut dest)?;
    dest.flush()?;
    pb.finish_and_clear();
    drop(dest);

    fs::rename(&partial_file, &downloaded_file)?;
    log::debug!("Wrote {written} bytes to {}", downloaded_file.display());
    Ok(downloaded_file)
}

fn extract_archive(archive_file: &Path, dest_dir: &Path) -> Result<PathBuf, Error> {
    let tar_gz = File::open(archive_file)?;
    let tar = GzDecoder::new(tar_gz);
    let mut archive = Archive::new(tar);

    log::info!(
        "Extracting archive {} to: {}",
        archive_file.display(),
        dest_dir.display()
    );
    let dir = {
        let entry = &archive
            .entries()?
            .next()
            .ok_or(Error::TarEntry("No entries in archive"))??;
        let path = entry.path()?;
        let top = path
            .components()
            .next()
            .ok_or(Error::TarEntry("Archive entry has an empty path"))?;
        PathBuf::from(top.as_os_str())
    };
    let name = dir.to_string_lossy();
    let archive_dir = dest_dir.join(&dir);
    // Written only after the unpacked tree has been moved into place.
    let marker = dest_dir.join(format!(".{name}.done"));
    if archive_dir.exists() && marker.exists() {
        log::info!("Archive already extracted to: {}", archive_dir.display());
        return Ok(archive_dir);
    }
    if archive_dir.exists() {
        log::warn!(
            "Discarding incomplete extraction at: {}",
            archive_dir.display()
        );
        fs::remove_dir_all(&archive_dir)?;
    }

    let scratch = dest_dir.join(format!(".{name}.part"));
    if scratch.exists() {
        fs::remove_dir_all(&scratch)?;
    }
    fs::create_dir_all(&scratch)?;

    let tar = archive.into_inner();
    let mut tar_gz = tar.into_inner();
    tar_gz.seek(io::SeekFrom::Start(0))?;
    let tar = GzDecoder::new(tar_gz);
    let mut archive = Archive::new(tar);
    archive.unpack(&scratch)?;

    fs::rename(scratch.join(&dir), &archive_dir)?;
    fs::remove_dir_all(&scratch)?;
    File::create(&marker)?;

    Ok(archive_dir)
}
