pub mod cifar;
pub mod folder;

pub use self::{
    cifar::{Cifar, CifarKind, LabelMode},
    folder::ImageFolder,
};
