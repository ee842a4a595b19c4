use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use flatcsv::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Dataset {
    Cifar10,
    Cifar100,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Labels {
    Fine,
    Coarse,
}

impl From<Labels> for LabelMode {
    fn from(value: Labels) -> Self {
        match value {
            Labels::Fine => LabelMode::Fine,
            Labels::Coarse => LabelMode::Coarse,
        }
    }
}

/// Flatten an image classification dataset into headerless CSV tables of
/// `label,pixel_0,...,pixel_n`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Dataset archive to download
    #[arg(long, value_enum, default_value_t = Dataset::Cifar10, conflicts_with = "image_folder")]
    dataset: Dataset,

    /// Label column used for CIFAR-100 [default: fine]
    #[arg(long, value_enum, conflicts_with = "image_folder")]
    label_mode: Option<Labels>,

    /// Read already extracted CIFAR batches from this directory
    #[arg(long, conflicts_with = "image_folder")]
    data_dir: Option<PathBuf>,

    /// Read images from <DIR>/{train,test}/<label>/ instead of CIFAR batches
    #[arg(long)]
    image_folder: Option<PathBuf>,

    /// Download cache, defaults to ~/.flatcsv
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Path of the train table [default: <dataset>_train.csv]
    #[arg(long)]
    train_out: Option<PathBuf>,

    /// Path of the test table [default: <dataset>_test.csv]
    #[arg(long)]
    test_out: Option<PathBuf>,
}

impl Args {
    fn check(&self) -> Result<(), clap::Error> {
        if self.label_mode.is_some() && self.dataset != Dataset::Cifar100 {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                "--label-mode only applies to --dataset cifar100",
            ));
        }
        Ok(())
    }

    fn kind(&self) -> CifarKind {
        match self.dataset {
            Dataset::Cifar10 => CifarKind::Cifar10,
            Dataset::Cifar100 => {
                CifarKind::Cifar100(self.label_mode.map(LabelMode::from).unwrap_or_default())
            }
        }
    }

    /// File name prefix of the default outputs.
    fn stem(&self) -> String {
        if let Some(root) = &self.image_folder {
            return root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "images".to_string());
        }
        match self.dataset {
            Dataset::Cifar10 => "cifar10".to_string(),
            Dataset::Cifar100 => "cifar100".to_string(),
        }
    }

    fn outputs(&self) -> Outputs {
        let defaults = Outputs::with_stem(&self.stem());
        Outputs {
            train: self.train_out.clone().unwrap_or(defaults.train),
            test: self.test_out.clone().unwrap_or(defaults.test),
        }
    }

    fn source(&self) -> Result<Box<dyn DatasetSource>> {
        if let Some(root) = &self.image_folder {
            return Ok(Box::new(ImageFolder::new(root)));
        }
        if let Some(dir) = &self.data_dir {
            return Ok(Box::new(Cifar::from_dir(self.kind(), dir)));
        }
        let cache_root = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => default_cache_root().context("locating the download cache")?,
        };
        Ok(Box::new(Cifar::cached(self.kind(), cache_root)))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
    color_eyre::install()?;
    let args = Args::parse();
    if let Err(err) = args.check() {
        err.exit();
    }

    let source = args.source()?;
    let outputs = args.outputs();
    let summary = convert(source.as_ref(), &outputs)
        .with_context(|| format!("converting {}", source.name()))?;

    log::info!(
        "Wrote {} ({} rows) and {} ({} rows), {} columns each",
        outputs.train.display(),
        summary.train.rows,
        outputs.test.display(),
        summary.test.rows,
        summary.train.cols
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from([&["cifar2csv"][..], args].concat()).unwrap()
    }

    #[test]
    fn default_outputs_follow_the_dataset() {
        let outputs = parse(&[]).outputs();
        assert_eq!(outputs, Outputs::with_stem("cifar10"));

        let outputs = parse(&["--dataset", "cifar100"]).outputs();
        assert_eq!(outputs.train, PathBuf::from("cifar100_train.csv"));

        let outputs = parse(&["--image-folder", "/data/pets"]).outputs();
        assert_eq!(outputs.test, PathBuf::from("pets_test.csv"));
    }

    #[test]
    fn explicit_outputs_win() {
        let outputs = parse(&["--train-out", "a.csv"]).outputs();
        assert_eq!(outputs.train, PathBuf::from("a.csv"));
        assert_eq!(outputs.test, PathBuf::from("cifar10_test.csv"));
    }

    #[test]
    fn label_mode_needs_cifar100() {
        let err = parse(&["--label-mode", "coarse"]).check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let args = parse(&["--dataset", "cifar100", "--label-mode", "coarse"]);
        assert!(args.check().is_ok());
        assert_eq!(args.kind(), CifarKind::Cifar100(LabelMode::Coarse));
        assert_eq!(
            parse(&["--dataset", "cifar100"]).kind(),
            CifarKind::Cifar100(LabelMode::Fine)
        );
    }

    #[test]
    fn label_mode_conflicts_with_image_folder() {
        let result = Args::try_parse_from([
            "cifar2csv",
            "--image-folder",
            "pets",
            "--label-mode",
            "fine",
        ]);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ArgumentConflict);
    }
}
