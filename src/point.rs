use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PointError;

/// x position of the left boundary point.
pub const LEFT_X: f64 = 0.0;
/// x position of the right boundary point.
pub const RIGHT_X: f64 = 1.0;
/// Interior points stay at least this far inside the boundary points, one
/// unit of a 250 unit canvas.
pub const EDGE_MARGIN: f64 = 1.0 / 250.0;

const DEFAULT_LEFT_Y: f64 = 1.0;
const DEFAULT_RIGHT_Y: f64 = 0.0;

/// Clamps an interior x so it can never land on a boundary's x.
pub fn clamp_interior_x(x: f64) -> f64 {
    x.clamp(LEFT_X + EDGE_MARGIN, RIGHT_X - EDGE_MARGIN)
}

/// A position on the editing canvas in normalized coordinates.
///
/// y grows downward, like the canvas it was placed on: `y = 1` is the bottom
/// edge, which the LUT engine turns into an output of 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Stable handle to a point in a [`ControlPointSet`]. Ids survive reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub id: PointId,
    pub point: Point,
    /// `false` for the two boundary points. Their x never changes.
    pub movable: bool,
}

impl ControlPoint {
    /// Tie-break for equal x: left boundary first, right boundary last.
    fn rank(&self) -> u8 {
        match (self.movable, self.point.x <= LEFT_X) {
            (true, _) => 1,
            (false, true) => 0,
            (false, false) => 2,
        }
    }
}

fn by_x(a: &ControlPoint, b: &ControlPoint) -> Ordering {
    a.point
        .x
        .total_cmp(&b.point.x)
        .then_with(|| a.rank().cmp(&b.rank()))
}

/// The control points of one curve.
///
/// Storage order is whatever the edits left behind. The x order used for
/// interpolation is derived on demand by [`ControlPointSet::ordered_points`]
/// or refreshed in place by [`ControlPointSet::sort_by_x`].
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPointSet {
    points: Vec<ControlPoint>,
    next_id: u32,
}

impl Default for ControlPointSet {
    /// The diagonal: bottom-left to top-right through the center.
    fn default() -> Self {
        let mut set = ControlPointSet::empty();
        set.add_boundary(LEFT_X, DEFAULT_LEFT_Y);
        set.add_point(0.5, 0.5);
        set.add_boundary(RIGHT_X, DEFAULT_RIGHT_Y);
        set
    }
}

impl ControlPointSet {
    fn empty() -> Self {
        ControlPointSet {
            points: Vec::new(),
            next_id: 0,
        }
    }

    /// Rebuilds a set from its boundary heights (left, right) and interior
    /// points, as stored in a session. Interior x is clamped like
    /// [`ControlPointSet::add_point`].
    ///
    /// Returns `None` if no interior point could be added.
    pub fn from_parts([left_y, right_y]: [f64; 2], interior: &[Point]) -> Option<Self> {
        let mut set = ControlPointSet::empty();
        set.add_boundary(LEFT_X, left_y)?;
        for p in interior {
            set.add_point(p.x, p.y);
        }
        set.add_boundary(RIGHT_X, right_y)?;
        if set.interior_count() == 0 {
            return None;
        }
        Some(set)
    }

    /// Adds a user point. x is clamped to stay [`EDGE_MARGIN`] inside the
    /// boundary points.
    ///
    /// Adding a point identical to an existing one is a no-op and returns
    /// `None`, as does a non-finite coordinate.
    pub fn add_point(&mut self, x: f64, y: f64) -> Option<PointId> {
        self.insert(clamp_interior_x(x), y, true)
    }

    /// Adds a pinned point. Its x is fixed for the lifetime of the set and it
    /// cannot be removed.
    fn add_boundary(&mut self, x: f64, y: f64) -> Option<PointId> {
        self.insert(x, y, false)
    }

    fn insert(&mut self, x: f64, y: f64, movable: bool) -> Option<PointId> {
        let point = Point::new(x, y);
        if !point.is_finite() {
            warn!(x, y, "ignoring control point with non-finite coordinates");
            return None;
        }
        if self.points.iter().any(|p| p.point == point) {
            return None;
        }

        let id = PointId(self.next_id);
        self.next_id += 1;
        self.points.push(ControlPoint { id, point, movable });
        Some(id)
    }

    pub fn remove_point(&mut self, id: PointId) -> Result<Point, PointError> {
        let index = self.index_of(id)?;
        if !self.points[index].movable {
            return Err(PointError::Pinned(id));
        }
        if self.interior_count() <= 1 {
            return Err(PointError::LastInteriorPoint);
        }
        Ok(self.points.remove(index).point)
    }

    /// Moves a point. Boundary points only move vertically.
    pub fn move_point(&mut self, id: PointId, x: f64, y: f64) -> Result<(), PointError> {
        let index = self.index_of(id)?;
        if !x.is_finite() || !y.is_finite() {
            warn!(?id, x, y, "ignoring move to non-finite coordinates");
            return Ok(());
        }

        let cp = &mut self.points[index];
        if cp.movable {
            cp.point.x = clamp_interior_x(x);
        }
        cp.point.y = y;
        Ok(())
    }

    /// Points sorted ascending by x. Equal x keep their storage order, except
    /// that boundary points always stay outermost.
    pub fn ordered_points(&self) -> Vec<Point> {
        self.ordered().into_iter().map(|p| p.point).collect()
    }

    /// Ids in the same order as [`ControlPointSet::ordered_points`].
    pub fn ordered_ids(&self) -> Vec<PointId> {
        self.ordered().into_iter().map(|p| p.id).collect()
    }

    /// The interior points in x order.
    pub fn interior_points(&self) -> Vec<Point> {
        self.ordered()
            .into_iter()
            .filter(|p| p.movable)
            .map(|p| p.point)
            .collect()
    }

    /// Heights of the left and right boundary points.
    pub fn boundary_ys(&self) -> [f64; 2] {
        let mut ys = [DEFAULT_LEFT_Y, DEFAULT_RIGHT_Y];
        for cp in self.points.iter().filter(|p| !p.movable) {
            ys[usize::from(cp.rank() == 2)] = cp.point.y;
        }
        ys
    }

    /// Re-sorts the stored points by x (stable).
    pub fn sort_by_x(&mut self) {
        self.points.sort_by(by_x);
    }

    fn ordered(&self) -> Vec<&ControlPoint> {
        let mut ordered: Vec<&ControlPoint> = self.points.iter().collect();
        ordered.sort_by(|a, b| by_x(a, b));
        ordered
    }

    pub fn get(&self, id: PointId) -> Option<&ControlPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ControlPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn interior_count(&self) -> usize {
        self.points.iter().filter(|p| p.movable).count()
    }

    fn index_of(&self, id: PointId) -> Result<usize, PointError> {
        self.points
            .iter()
            .position(|p| p.id == id)
            .ok_or(PointError::UnknownPoint(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interior_id(set: &ControlPointSet) -> PointId {
        set.iter().find(|p| p.movable).unwrap().id
    }

    #[test]
    fn test_default_has_two_boundaries_and_one_interior() {
        let set = ControlPointSet::default();
        assert_eq!(set.len(), 3);
        assert_eq!(set.interior_count(), 1);
        assert_eq!(
            set.ordered_points(),
            vec![
                Point::new(0.0, 1.0),
                Point::new(0.5, 0.5),
                Point::new(1.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_duplicate_point_is_ignored() {
        let mut set = ControlPointSet::default();
        assert!(set.add_point(0.25, 0.75).is_some());
        assert!(set.add_point(0.25, 0.75).is_none());
        assert_eq!(set.len(), 4);

        // same x, different y is a distinct point
        assert!(set.add_point(0.25, 0.5).is_some());
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn test_non_finite_point_is_ignored() {
        let mut set = ControlPointSet::default();
        assert!(set.add_point(f64::NAN, 0.5).is_none());
        assert!(set.add_point(0.5, f64::INFINITY).is_none());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_add_point_clamps_x() {
        let mut set = ControlPointSet::default();
        let id = set.add_point(1.5, 0.2).unwrap();
        assert_eq!(set.get(id).unwrap().point, Point::new(RIGHT_X - EDGE_MARGIN, 0.2));
        let id = set.add_point(-0.5, 0.2).unwrap();
        assert_eq!(set.get(id).unwrap().point, Point::new(LEFT_X + EDGE_MARGIN, 0.2));

        // the clamped points still sit strictly between the boundaries
        let ordered = set.ordered_ids();
        assert!(!set.get(ordered[0]).unwrap().movable);
        assert!(!set.get(ordered[ordered.len() - 1]).unwrap().movable);
    }

    #[test]
    fn test_interior_never_reaches_boundary_x() {
        let mut set = ControlPointSet::default();
        let id = interior_id(&set);
        set.move_point(id, 1.0, 0.1).unwrap();
        let x = set.get(id).unwrap().point.x;
        assert!(x < RIGHT_X);
        set.move_point(id, 0.0, 0.1).unwrap();
        let x = set.get(id).unwrap().point.x;
        assert!(x > LEFT_X);
    }

    #[test]
    fn test_boundaries_stay_outermost_on_equal_x() {
        let mut set = ControlPointSet::empty();
        set.insert(RIGHT_X, 0.3, true);
        set.add_boundary(RIGHT_X, 0.0);
        set.insert(LEFT_X, 0.6, true);
        set.add_boundary(LEFT_X, 1.0);

        assert_eq!(
            set.ordered_points(),
            vec![
                Point::new(LEFT_X, 1.0),
                Point::new(LEFT_X, 0.6),
                Point::new(RIGHT_X, 0.3),
                Point::new(RIGHT_X, 0.0)
            ]
        );
        set.sort_by_x();
        assert!(!set.iter().next().unwrap().movable);
        assert!(!set.iter().last().unwrap().movable);
        assert_eq!(set.boundary_ys(), [1.0, 0.0]);
    }

    #[test]
    fn test_boundary_points_cannot_be_removed() {
        let mut set = ControlPointSet::default();
        set.add_point(0.3, 0.3);
        let boundary = set.iter().find(|p| !p.movable).unwrap().id;
        assert_eq!(set.remove_point(boundary), Err(PointError::Pinned(boundary)));
    }

    #[test]
    fn test_last_interior_point_cannot_be_removed() {
        let mut set = ControlPointSet::default();
        let id = interior_id(&set);
        assert_eq!(set.remove_point(id), Err(PointError::LastInteriorPoint));

        let extra = set.add_point(0.2, 0.9).unwrap();
        assert_eq!(set.remove_point(extra), Ok(Point::new(0.2, 0.9)));
        assert_eq!(set.interior_count(), 1);
    }

    #[test]
    fn test_unknown_point() {
        let mut set = ControlPointSet::default();
        let id = set.add_point(0.2, 0.2).unwrap();
        set.remove_point(id).unwrap();
        assert_eq!(set.move_point(id, 0.1, 0.1), Err(PointError::UnknownPoint(id)));
    }

    #[test]
    fn test_boundary_moves_only_vertically() {
        let mut set = ControlPointSet::default();
        let left = set.ordered_ids()[0];
        set.move_point(left, 0.4, 0.8).unwrap();
        assert_eq!(set.get(left).unwrap().point, Point::new(0.0, 0.8));

        let middle = interior_id(&set);
        set.move_point(middle, 0.4, 0.8).unwrap();
        assert_eq!(set.get(middle).unwrap().point, Point::new(0.4, 0.8));
    }

    #[test]
    fn test_ordered_points_is_pure_and_stable() {
        let mut set = ControlPointSet::default();
        let a = set.add_point(0.25, 0.1).unwrap();
        let b = set.add_point(0.25, 0.9).unwrap();
        let before = set.clone();

        let ordered = set.ordered_points();
        assert_eq!(set, before);
        assert_eq!(ordered[1], Point::new(0.25, 0.1));
        assert_eq!(ordered[2], Point::new(0.25, 0.9));
        assert_eq!(&set.ordered_ids()[1..3], &[a, b]);
    }

    #[test]
    fn test_sort_by_x_refreshes_storage_order() {
        let mut set = ControlPointSet::default();
        set.add_point(0.1, 0.1);
        set.sort_by_x();
        let stored: Vec<Point> = set.iter().map(|p| p.point).collect();
        assert_eq!(stored, set.ordered_points());
    }

    #[test]
    fn test_from_parts() {
        let interior = [Point::new(0.6, 0.2), Point::new(0.3, 0.6)];
        let set = ControlPointSet::from_parts([0.9, 0.1], &interior).unwrap();
        assert_eq!(
            set.ordered_points(),
            vec![
                Point::new(0.0, 0.9),
                Point::new(0.3, 0.6),
                Point::new(0.6, 0.2),
                Point::new(1.0, 0.1)
            ]
        );
        assert_eq!(set.interior_count(), 2);
        assert_eq!(set.boundary_ys(), [0.9, 0.1]);
        assert_eq!(set.interior_points(), vec![interior[1], interior[0]]);

        assert!(ControlPointSet::from_parts([1.0, 0.0], &[]).is_none());
    }
}
