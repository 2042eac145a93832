use crate::config::VisionSettings;
use crate::error::VisionError;
use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

/// Fixed binomial kernels used for small sizes when no sigma is given.
const SMALL_KERNELS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Border {
    /// `gfedcb|abcdefgh|gfedcba`
    Reflect101,
    /// `aaaaaa|abcdefgh|hhhhhhh`
    Replicate,
}

impl Border {
    fn index(self, i: i64, len: usize) -> usize {
        let n = len as i64;
        if n == 1 {
            return 0;
        }
        match self {
            Border::Replicate => i.clamp(0, n - 1) as usize,
            Border::Reflect101 => {
                let mut i = i;
                while i < 0 || i >= n {
                    if i < 0 {
                        i = -i;
                    }
                    if i >= n {
                        i = 2 * n - 2 - i;
                    }
                }
                i as usize
            }
        }
    }
}

/// Output of the grayscale, blur and threshold sequence.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub gray: GrayImage,
    pub blurred: GrayImage,
    pub binary: GrayImage,
}

impl Preprocessed {
    /// Fraction of foreground pixels in the thresholded image.
    pub fn foreground_ratio(&self) -> f32 {
        let total = self.binary.as_raw().len();
        if total == 0 {
            return 0.0;
        }
        let on = self.binary.as_raw().iter().filter(|&&v| v != 0).count();
        on as f32 / total as f32
    }
}

#[derive(Debug, Clone)]
pub struct Preprocessor {
    blur_kernel: u32,
    block_size: u32,
    c: f32,
}

impl Preprocessor {
    pub fn new(blur_kernel: u32, block_size: u32, c: f32) -> Self {
        Self {
            blur_kernel,
            block_size,
            c,
        }
    }

    pub fn from_settings(settings: &VisionSettings) -> Self {
        Self::new(
            settings.blur_kernel,
            settings.threshold_block_size,
            settings.threshold_c,
        )
    }

    pub fn run(&self, image: &DynamicImage) -> Result<Preprocessed, VisionError> {
        let gray = to_grayscale(image);
        if gray.width() == 0 || gray.height() == 0 {
            return Err(VisionError::EmptyImage);
        }

        let blurred = gaussian_blur(&gray, self.blur_kernel)?;
        let binary = adaptive_threshold(&blurred, 255, self.block_size, self.c)?;

        let result = Preprocessed {
            gray,
            blurred,
            binary,
        };
        debug!(
            width = result.binary.width(),
            height = result.binary.height(),
            foreground = result.foreground_ratio(),
            "Preprocessed image"
        );
        Ok(result)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(5, 11, 2.0)
    }
}

/// BT.601 luma weights in 14-bit fixed point, summing to `1 << 14`.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

/// Luma with BT.601 weights (0.299, 0.587, 0.114), rounded half up.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let weighted = r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B;
        Luma([((weighted + (1 << 13)) >> 14) as u8])
    })
}

/// Gaussian kernel for an odd `size`, sigma derived from the size.
pub fn gaussian_kernel(size: u32) -> Result<Vec<f32>, VisionError> {
    if size == 0 || size % 2 == 0 {
        return Err(VisionError::InvalidKernel(size));
    }
    if size <= 7 {
        return Ok(SMALL_KERNELS[(size / 2) as usize].to_vec());
    }

    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (size / 2) as i32;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    Ok(kernel)
}

fn convolve_separable(src: &GrayImage, kernel: &[f32], border: Border) -> Vec<f32> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let half = (kernel.len() / 2) as i64;
    let raw = src.as_raw();

    let mut horizontal = vec![0f32; w * h];
    for y in 0..h {
        let row = &raw[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = border.index(x as i64 + k as i64 - half, w);
                acc += weight * row[sx] as f32;
            }
            horizontal[y * w + x] = acc;
        }
    }

    let mut out = vec![0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = border.index(y as i64 + k as i64 - half, h);
                acc += weight * horizontal[sy * w + x];
            }
            out[y * w + x] = acc;
        }
    }
    out
}

fn to_gray(width: u32, values: &[f32]) -> GrayImage {
    let height = if width == 0 { 0 } else { values.len() as u32 / width };
    GrayImage::from_fn(width, height, |x, y| {
        let v = values[(y * width + x) as usize];
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// Gaussian blur with a square `kernel_size` kernel and reflected borders.
pub fn gaussian_blur(image: &GrayImage, kernel_size: u32) -> Result<GrayImage, VisionError> {
    let kernel = gaussian_kernel(kernel_size)?;
    let values = convolve_separable(image, &kernel, Border::Reflect101);
    Ok(to_gray(image.width(), &values))
}

/// Inverted adaptive threshold over a Gaussian-weighted neighbourhood.
///
/// A pixel becomes `max_value` when it is at most `mean - c`, where `mean` is the
/// Gaussian-weighted average of its `block_size` square neighbourhood.
pub fn adaptive_threshold(
    image: &GrayImage,
    max_value: u8,
    block_size: u32,
    c: f32,
) -> Result<GrayImage, VisionError> {
    if block_size < 3 || block_size % 2 == 0 {
        return Err(VisionError::InvalidBlockSize(block_size));
    }

    let kernel = gaussian_kernel(block_size)?;
    let mean = to_gray(
        image.width(),
        &convolve_separable(image, &kernel, Border::Replicate),
    );
    let delta = c.floor() as i32;

    Ok(GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let src = image.get_pixel(x, y)[0] as i32;
        let m = mean.get_pixel(x, y)[0] as i32;
        if src - m <= -delta {
            Luma([max_value])
        } else {
            Luma([0])
        }
    }))
}
