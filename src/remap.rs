use image::{DynamicImage, Luma, Rgb};
use imageproc::map::map_pixels;

use crate::channel::Channel;
use crate::editor::LevelChange;
use crate::lut::{Lut, LutSet};

/// Applies the published LUTs to pixel data.
///
/// Holds its own copy of every channel's table; keep it current by feeding
/// it the editor's [`LevelChange`]s.
#[derive(Debug, Clone)]
pub struct PixelRemapper {
    luts: LutSet,
}

impl PixelRemapper {
    pub fn new(luts: LutSet) -> Self {
        PixelRemapper { luts }
    }

    pub fn update(&mut self, change: &LevelChange) {
        self.luts.set(change.channel, change.lut.clone());
    }

    pub fn luts(&self) -> &LutSet {
        &self.luts
    }

    /// Maps one `sample_bits` wide sample through `lut`, requantizing when the
    /// sample and LUT bit depths differ. `sample_bits` is clamped to `1..=16`.
    pub fn map_sample(lut: &Lut, sample: u16, sample_bits: u8) -> u16 {
        let sample_bits = sample_bits.clamp(1, 16);
        let lut_bits = lut.bit_depth().bits();
        let index = if sample_bits >= lut_bits {
            u32::from(sample) >> (sample_bits - lut_bits)
        } else {
            u32::from(sample) << (lut_bits - sample_bits)
        };
        let out = u64::from(lut.lookup(index));

        // entries are fractions of 2^lut_bits
        let levels = 1u64 << lut_bits;
        let sample_max = (1u64 << sample_bits) - 1;
        ((out * sample_max + levels / 2) / levels) as u16
    }

    /// The Value LUT followed by the channel's own LUT.
    pub fn map_channel(&self, channel: Channel, sample: u16, sample_bits: u8) -> u16 {
        let value = Self::map_sample(self.luts.get(Channel::Value), sample, sample_bits);
        Self::map_sample(self.luts.get(channel), value, sample_bits)
    }

    pub fn map_rgb(&self, [r, g, b]: [u16; 3], sample_bits: u8) -> [u16; 3] {
        [
            self.map_channel(Channel::Red, r, sample_bits),
            self.map_channel(Channel::Green, g, sample_bits),
            self.map_channel(Channel::Blue, b, sample_bits),
        ]
    }

    /// Remaps a single plane through one LUT only.
    pub fn remap_plane(lut: &Lut, samples: &mut [u16], sample_bits: u8) {
        for sample in samples.iter_mut() {
            *sample = Self::map_sample(lut, *sample, sample_bits);
        }
    }

    /// Remaps interleaved RGB samples. A trailing partial pixel is left alone.
    pub fn remap_rgb(&self, samples: &mut [u16], sample_bits: u8) {
        for pixel in samples.chunks_exact_mut(3) {
            let mapped = self.map_rgb([pixel[0], pixel[1], pixel[2]], sample_bits);
            pixel.copy_from_slice(&mapped);
        }
    }

    /// Returns a remapped copy of `image`.
    ///
    /// Grayscale images only go through the Value LUT. Color images come out
    /// as RGB (alpha is dropped), 8-bit sources as 8-bit, everything else as
    /// 16-bit.
    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        let color = image.color();
        let eight_bit = color.bits_per_pixel() / u16::from(color.channel_count()) <= 8;
        let value = self.luts.get(Channel::Value);

        match (color.has_color(), eight_bit) {
            (false, true) => DynamicImage::ImageLuma8(map_pixels(&image.to_luma8(), |_x, _y, p| {
                Luma([Self::map_sample(value, u16::from(p[0]), 8) as u8])
            })),
            (false, false) => DynamicImage::ImageLuma16(map_pixels(&image.to_luma16(), |_x, _y, p| {
                Luma([Self::map_sample(value, p[0], 16)])
            })),
            (true, true) => DynamicImage::ImageRgb8(map_pixels(&image.to_rgb8(), |_x, _y, p| {
                let [r, g, b] = self.map_rgb([p[0], p[1], p[2]].map(u16::from), 8);
                Rgb([r as u8, g as u8, b as u8])
            })),
            (true, false) => DynamicImage::ImageRgb16(map_pixels(&image.to_rgb16(), |_x, _y, p| {
                Rgb(self.map_rgb([p[0], p[1], p[2]], 16))
            })),
        }
    }
}
