use std::path::PathBuf;

use super::config::FetcherConfig;
use super::error::FetcherError;
use super::label::Label;
use super::manifest::SampleRef;
use super::transform::{ImageArray, ImageTransform};

/// A ready-to-train sample as handed out by `DataFetcher::fetch`.
///
/// The two modes put the label in different places when flattened, see
/// `into_single_tuple` and `into_stereo_tuple`.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadedExample {
    Single {
        image: ImageArray,
        label: Label,
        file_name: String,
    },
    Stereo {
        image_1: ImageArray,
        image_2: ImageArray,
        label: Label,
        file_name: String,
    },
}

impl LoadedExample {
    pub fn label(&self) -> &Label {
        match self {
            LoadedExample::Single { label, .. } => label,
            LoadedExample::Stereo { label, .. } => label,
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            LoadedExample::Single { file_name, .. } => file_name,
            LoadedExample::Stereo { file_name, .. } => file_name,
        }
    }

    pub fn is_stereo(&self) -> bool {
        matches!(self, LoadedExample::Stereo { .. })
    }

    /// `(image, label, file_name)`
    pub fn into_single_tuple(self) -> Option<(ImageArray, Label, String)> {
        match self {
            LoadedExample::Single {
                image,
                label,
                file_name,
            } => Some((image, label, file_name)),
            LoadedExample::Stereo { .. } => None,
        }
    }

    /// `(image_1, image_2, label, file_name)`
    pub fn into_stereo_tuple(self) -> Option<(ImageArray, ImageArray, Label, String)> {
        match self {
            LoadedExample::Stereo {
                image_1,
                image_2,
                label,
                file_name,
            } => Some((image_1, image_2, label, file_name)),
            LoadedExample::Single { .. } => None,
        }
    }
}

/// Turns a `SampleRef` into a `LoadedExample`.
#[derive(Clone, Debug)]
pub struct SampleLoader {
    transform: ImageTransform,
    image_extension: String,
}

impl SampleLoader {
    pub fn new(config: &FetcherConfig) -> Self {
        SampleLoader {
            transform: ImageTransform::new(config.image_height, config.image_width),
            image_extension: config.image_extension.clone(),
        }
    }

    /// Image that sits next to a non-stereo label.
    pub fn image_path_for(&self, label_path: &std::path::Path) -> PathBuf {
        label_path.with_extension(&self.image_extension)
    }

    pub fn load(&self, sample: &SampleRef) -> Result<LoadedExample, FetcherError> {
        self.load_inner(sample)
            .map_err(|e| FetcherError::for_sample(sample.label_path(), e))
    }

    fn load_inner(&self, sample: &SampleRef) -> Result<LoadedExample, FetcherError> {
        match sample {
            SampleRef::Single { label_path } => {
                let label = Label::load(label_path)?;
                let image = self.transform.load(&self.image_path_for(label_path))?;
                Ok(LoadedExample::Single {
                    image,
                    label,
                    file_name: sample.file_name(),
                })
            }
            SampleRef::Stereo {
                label_path,
                image_1,
                image_2,
            } => {
                let label = Label::load(label_path)?;
                let (image_1, image_2) = rayon::join(
                    || self.transform.load(image_1),
                    || self.transform.load(image_2),
                );
                Ok(LoadedExample::Stereo {
                    image_1: image_1?,
                    image_2: image_2?,
                    label,
                    file_name: sample.file_name(),
                })
            }
        }
    }
}
