//! Quantized lookup tables derived from a curve and its range clamp.
//!
//! A LUT of bit depth `b` has `2^b` entries. Entry `i` is the curve sampled
//! at `x = i / (2^b - 1)`, clamped by the ruler and to `[0, 1]`, flipped
//! (`1 - y`, the canvas y axis points down) and scaled by `2^b`. Entries
//! therefore lie in `[0, 2^b]`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::channel::Channel;
use crate::error::{CurveError, Error, Result};
use crate::interpolate::Curve;
use crate::range::RangeClamp;

/// A validated LUT bit depth in `1..=16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BitDepth(u8);

impl BitDepth {
    pub const MAX: u8 = 16;
    pub const EIGHT: BitDepth = BitDepth(8);

    pub fn new(bits: u8) -> Result<Self> {
        if bits == 0 || bits > Self::MAX {
            return Err(Error::InvalidBitDepth(bits));
        }
        Ok(BitDepth(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Number of LUT entries, `2^bits`.
    pub fn levels(self) -> usize {
        1 << self.0
    }
}

impl Default for BitDepth {
    fn default() -> Self {
        BitDepth::EIGHT
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self> {
        BitDepth::new(bits)
    }
}

impl From<BitDepth> for u8 {
    fn from(depth: BitDepth) -> u8 {
        depth.0
    }
}

/// A finished table. Cloning shares the entries; a published LUT is never
/// written to again.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut {
    bit_depth: BitDepth,
    entries: Arc<[u32]>,
}

impl Lut {
    /// The table a default (diagonal) curve produces: `i -> i * 2^b / (2^b - 1)`.
    pub fn identity(bit_depth: BitDepth) -> Self {
        let levels = bit_depth.levels();
        let top = (levels - 1).max(1) as f64;
        let entries = (0..levels)
            .map(|i| quantize(i as f64 / top, bit_depth))
            .collect();
        Lut { bit_depth, entries }
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an index. Indices past the end read the last entry.
    pub fn lookup(&self, index: u32) -> u32 {
        let last = self.entries.len() - 1;
        self.entries[(index as usize).min(last)]
    }
}

/// One LUT per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct LutSet {
    luts: [Lut; Channel::COUNT],
}

impl LutSet {
    pub fn identity(bit_depth: BitDepth) -> Self {
        LutSet {
            luts: std::array::from_fn(|_| Lut::identity(bit_depth)),
        }
    }

    pub fn get(&self, channel: Channel) -> &Lut {
        &self.luts[channel.index()]
    }

    pub fn set(&mut self, channel: Channel, lut: Lut) {
        self.luts[channel.index()] = lut;
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.luts[0].bit_depth()
    }
}

/// Samples curves into LUTs and keeps the last good table for each channel.
#[derive(Debug, Clone)]
pub struct LutEngine {
    bit_depth: BitDepth,
    published: LutSet,
}

impl LutEngine {
    pub fn new(bit_depth: BitDepth) -> Self {
        LutEngine {
            bit_depth,
            published: LutSet::identity(bit_depth),
        }
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Samples `curve` at `2^b` evenly spaced points over `[0, 1]`.
    pub fn compute_lut(&self, curve: &Curve, range: &RangeClamp) -> Lut {
        let levels = self.bit_depth.levels();
        let top = (levels - 1).max(1) as f64;
        let entries = (0..levels)
            .map(|i| {
                let y = range.apply(curve.evaluate(i as f64 / top)).clamp(0.0, 1.0);
                quantize(1.0 - y, self.bit_depth)
            })
            .collect();

        Lut {
            bit_depth: self.bit_depth,
            entries,
        }
    }

    /// Rebuilds and publishes `channel`'s LUT. If the curve could not be
    /// built the previous table stays published and the error is returned.
    pub fn refresh(
        &mut self,
        channel: Channel,
        curve: std::result::Result<&Curve, &CurveError>,
        range: &RangeClamp,
    ) -> std::result::Result<&Lut, CurveError> {
        match curve {
            Ok(curve) => {
                let lut = self.compute_lut(curve, range);
                debug!(%channel, bits = self.bit_depth.bits(), "published LUT");
                self.published.set(channel, lut);
                Ok(self.published.get(channel))
            }
            Err(err) => {
                debug!(%channel, %err, "no curve, keeping previous LUT");
                Err(err.clone())
            }
        }
    }

    pub fn lut(&self, channel: Channel) -> &Lut {
        self.published.get(channel)
    }

    pub fn luts(&self) -> &LutSet {
        &self.published
    }
}

fn quantize(v: f64, bit_depth: BitDepth) -> u32 {
    let scale = bit_depth.levels() as f64;
    (v * scale).round().clamp(0.0, scale) as u32
}
