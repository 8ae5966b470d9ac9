use image::imageops::FilterType;

use super::ClassifierError;

/// Edge length expected by Inception v3.
pub const INPUT_SIZE: u32 = 299;

/// A normalised RGB image in height-width-channel order.
#[derive(Debug, Clone)]
pub struct ImageTensor {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl ImageTensor {
    /// `None` outside the image or past the end of `data`.
    fn pixel(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        match self.data.get(i..i + 3)? {
            &[r, g, b] => Some([r, g, b]),
            _ => None,
        }
    }

    /// Nested `[row][col][channel]` view, the layout model servers accept.
    pub fn rows(&self) -> Vec<Vec<[f32; 3]>> {
        (0..self.height)
            .map(|y| (0..self.width).map(|x| self.pixel(x, y).unwrap_or_default()).collect())
            .collect()
    }
}

/// Decode raw bytes and prepare them for the model.
///
/// Any format the `image` crate can sniff is accepted. The image is
/// stretched to 299x299 with bicubic filtering, alpha is dropped, and each
/// channel is mapped from `[0, 255]` to `[-1, 1]`.
pub fn preprocess(bytes: &[u8]) -> Result<ImageTensor, ClassifierError> {
    let img = image::load_from_memory(bytes).map_err(|e| ClassifierError::Decode(e.to_string()))?;

    let rgb = img
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom)
        .to_rgb8();

    let data = rgb
        .pixels()
        .flat_map(|p| p.0)
        .map(|c| f32::from(c) / 127.5 - 1.0)
        .collect();

    Ok(ImageTensor {
        width: INPUT_SIZE,
        height: INPUT_SIZE,
        data,
    })
}
