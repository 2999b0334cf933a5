pub mod annotation;

pub use annotation::{
    AnnotateImageRequest, BatchAnnotateImagesRequest, BatchAnnotateImagesResponse, Image,
};
