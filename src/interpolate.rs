//! Shape-preserving curve through the control points.
//!
//! Uses piecewise cubic Hermite interpolation with Fritsch-Butland slopes
//! (PCHIP). Between two control points the curve stays within their y range
//! whenever the data is locally monotone, so dragging one point never makes a
//! neighbouring segment bulge past its endpoints the way a natural cubic
//! spline does.
//!
//! ```text
//! h_k = x_{k+1} - x_k      d_k = (y_{k+1} - y_k) / h_k
//! m_k = 0                                         if d_{k-1} * d_k <= 0
//! m_k = (w1 + w2) / (w1 / d_{k-1} + w2 / d_k)      otherwise
//!       w1 = 2 h_k + h_{k-1},  w2 = h_k + 2 h_{k-1}
//! ```

use itertools::Itertools;

use crate::error::CurveError;
use crate::point::Point;

/// An immutable interpolant. Any point edit requires building a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}

impl Curve {
    /// Builds the interpolant. The points are sorted by x first (stable).
    ///
    /// Fails when fewer than two points are given, when two points share an
    /// x coordinate, or when a coordinate is not finite.
    pub fn build(points: &[Point]) -> Result<Curve, CurveError> {
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(CurveError::NonFinite);
        }
        if points.len() < 2 {
            return Err(CurveError::TooFewPoints {
                found: points.len(),
            });
        }

        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
        if let Some((a, _)) = sorted.iter().tuple_windows().find(|(a, b)| a.x == b.x) {
            return Err(CurveError::CoincidentX { x: a.x });
        }

        let xs: Vec<f64> = sorted.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = sorted.iter().map(|p| p.y).collect();

        let widths: Vec<f64> = xs.iter().tuple_windows().map(|(a, b)| b - a).collect();
        let secants: Vec<f64> = ys
            .iter()
            .tuple_windows()
            .zip(&widths)
            .map(|((y0, y1), h)| (y1 - y0) / h)
            .collect();

        let slopes = pchip_slopes(&widths, &secants);
        Ok(Curve { xs, ys, slopes })
    }

    /// Evaluates the curve at `x`.
    ///
    /// Outside the first/last control point the end segments are extended,
    /// so the result is not clamped. Callers clamp.
    pub fn evaluate(&self, x: f64) -> f64 {
        let last = self.xs.len() - 1;
        // Segment i covers [xs[i], xs[i + 1]); out-of-range x uses the end segments.
        let i = self.xs[1..last].partition_point(|&k| k <= x);

        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let (m0, m1) = (self.slopes[i], self.slopes[i + 1]);

        let h = x1 - x0;
        let t = (x - x0) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * y0 + h10 * h * m0 + h01 * y1 + h11 * h * m1
    }

    /// The control points the curve was built from, in x order.
    pub fn knots(&self) -> impl Iterator<Item = Point> + '_ {
        self.xs.iter().zip(&self.ys).map(|(&x, &y)| Point::new(x, y))
    }
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

fn pchip_slopes(widths: &[f64], secants: &[f64]) -> Vec<f64> {
    let n = secants.len() + 1;
    if n == 2 {
        return vec![secants[0]; 2];
    }

    let mut slopes = vec![0.0; n];
    for k in 1..n - 1 {
        let (d0, d1) = (secants[k - 1], secants[k]);
        if d0 * d1 <= 0.0 {
            continue;
        }
        let w1 = 2.0 * widths[k] + widths[k - 1];
        let w2 = widths[k] + 2.0 * widths[k - 1];
        slopes[k] = (w1 + w2) / (w1 / d0 + w2 / d1);
    }

    slopes[0] = end_slope(widths[0], widths[1], secants[0], secants[1]);
    slopes[n - 1] = end_slope(
        widths[n - 2],
        widths[n - 3],
        secants[n - 2],
        secants[n - 3],
    );
    slopes
}

/// One-sided three-point estimate, limited so the end segment stays monotone.
fn end_slope(h0: f64, h1: f64, d0: f64, d1: f64) -> f64 {
    let m = ((2.0 * h0 + h1) * d0 - h0 * d1) / (h0 + h1);
    if sign(m) != sign(d0) {
        0.0
    } else if sign(d0) != sign(d1) && m.abs() > 3.0 * d0.abs() {
        3.0 * d0
    } else {
        m
    }
}
