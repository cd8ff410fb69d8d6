use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, Rgba32FImage};
use std::path::Path;

use super::error::FetcherError;

pub const CHANNELS: usize = 3;

/// Row-major `height x width x 3` float image with values in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageArray {
    pub data: Box<[f32]>,
    pub height: usize,
    pub width: usize,
}

impl ImageArray {
    pub fn shape(&self) -> [usize; 3] {
        [self.height, self.width, CHANNELS]
    }

    pub fn pixel(&self, y: usize, x: usize) -> &[f32] {
        let start = (y * self.width + x) * CHANNELS;
        &self.data[start..start + CHANNELS]
    }
}

/// Fixed matte, resize and channel drop applied to every decoded image.
#[derive(Clone, Copy, Debug)]
pub struct ImageTransform {
    pub height: u32,
    pub width: u32,
}

impl ImageTransform {
    pub fn new(height: u32, width: u32) -> Self {
        ImageTransform { height, width }
    }

    pub fn load(&self, path: &Path) -> Result<ImageArray, FetcherError> {
        let img = image::open(path)?;
        Ok(self.apply(img))
    }

    pub fn apply(&self, img: DynamicImage) -> ImageArray {
        // Images without alpha come back fully opaque from the conversion
        let mut rgba = img.into_rgba32f();
        matte_transparent(&mut rgba);

        let rgba = if rgba.dimensions() == (self.width, self.height) {
            rgba
        } else {
            imageops::resize(&rgba, self.width, self.height, FilterType::Triangle)
        };

        let data: Box<[f32]> = rgba
            .pixels()
            .flat_map(|Rgba([r, g, b, _])| [*r, *g, *b])
            .collect();
        debug_assert_eq!(data.len(), self.height as usize * self.width as usize * CHANNELS);

        ImageArray {
            data,
            height: self.height as usize,
            width: self.width as usize,
        }
    }
}

/// Fully transparent pixels become white in every channel, alpha included.
fn matte_transparent(img: &mut Rgba32FImage) {
    for pixel in img.pixels_mut() {
        if pixel[3] == 0.0 {
            *pixel = Rgba([1.0; 4]);
        }
    }
}
