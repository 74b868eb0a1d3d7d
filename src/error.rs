use crate::point::PointId;

/// Why a curve could not be built from the current control points.
///
/// The editor treats every variant the same way: no curve is drawn and the
/// last published LUT stays in place.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveError {
    #[error("need at least 2 points to build a curve, found {found}")]
    TooFewPoints { found: usize },
    #[error("two control points share x = {x}")]
    CoincidentX { x: f64 },
    #[error("control point coordinates must be finite")]
    NonFinite,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PointError {
    #[error("no control point with id {0:?}")]
    UnknownPoint(PointId),
    #[error("boundary point {0:?} cannot be removed")]
    Pinned(PointId),
    #[error("the last interior point cannot be removed")]
    LastInteriorPoint,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid bit depth {0}, expected 1..=16")]
    InvalidBitDepth(u8),
    #[error("invalid channel index {0}")]
    InvalidChannel(usize),
    #[error(transparent)]
    Point(#[from] PointError),
    #[error("invalid session: {0}")]
    Session(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
