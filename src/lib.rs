//! Per-channel tone curves and the lookup tables derived from them.
//!
//! A [`LevelEditor`] owns four channels (Value, Red, Green, Blue), each with
//! its own control points and output range. Every edit rebuilds the live
//! curve and republishes that channel's [`Lut`]; a [`PixelRemapper`] turns
//! the tables into remapped images.

pub mod channel;
pub mod editor;
pub mod error;
pub mod interpolate;
pub mod lut;
pub mod point;
pub mod range;
pub mod remap;
pub mod session;

pub use channel::{Channel, ChannelBank, ChannelState};
pub use editor::{EditorConfig, LevelChange, LevelEditor};
pub use error::{CurveError, Error, PointError, Result};
pub use interpolate::Curve;
pub use lut::{BitDepth, Lut, LutEngine, LutSet};
pub use point::{ControlPoint, ControlPointSet, Point, PointId};
pub use range::RangeClamp;
pub use remap::PixelRemapper;
pub use session::Session;
