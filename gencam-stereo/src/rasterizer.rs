use crate::Polynomial2;
use gencam_core::nalgebra::Vector2;

/// Walks the pixels of an implicit [`Polynomial2`] curve, starting from a seed pixel.
///
/// Every step moves one pixel along the axis that dominates the local tangent and moves
/// along the other axis only when that brings the pixel closer to the curve. The value and
/// the gradient of the polynomial are evaluated once at the seed and then updated with
/// finite differences, so a step costs a few additions.
///
/// The seed is yielded first. The iterator ends when it leaves the optional bounds,
/// otherwise it is endless and the caller bounds it with `take`. Cloning the iterator
/// restarts the walk from the current pixel.
///
/// ```
/// use gencam_core::nalgebra::{Point2, Vector2};
/// use gencam_stereo::{CurveRasterizer, Polynomial2};
/// let line = Polynomial2::line(Point2::new(0.0, 0.0), Vector2::new(2.0, 1.0));
/// let pixels: Vec<_> = CurveRasterizer::new(line, (0, 0), Vector2::new(1.0, 0.0)).take(5).collect();
/// assert_eq!(pixels, [(0, 0), (1, 0), (2, 1), (3, 1), (4, 2)]);
/// ```
#[derive(Debug, Clone)]
pub struct CurveRasterizer {
    polynomial: Polynomial2,
    u: i32,
    v: i32,
    f: f64,
    fu: f64,
    fv: f64,
    /// `1.0` or `-1.0`, selects which of the two tangents is followed.
    orientation: f64,
    bounds: Option<[i32; 4]>,
    finished: bool,
}

impl CurveRasterizer {
    /// Starts at `seed` and follows the curve in the direction closest to `heading`.
    pub fn new(polynomial: Polynomial2, seed: (i32, i32), heading: Vector2<f64>) -> Self {
        let (u, v) = seed;
        let f = polynomial.eval(u as f64, v as f64);
        let gradient = polynomial.gradient(u as f64, v as f64);
        let tangent = Vector2::new(gradient.y, -gradient.x);
        let orientation = if tangent.dot(&heading) < 0.0 {
            -1.0
        } else {
            1.0
        };
        Self {
            polynomial,
            u,
            v,
            f,
            fu: gradient.x,
            fv: gradient.y,
            orientation,
            bounds: None,
            finished: false,
        }
    }

    /// Stops the walk at the first pixel outside of `u_min..=u_max` by `v_min..=v_max`.
    #[must_use]
    pub fn bounds(self, u_min: i32, v_min: i32, u_max: i32, v_max: i32) -> Self {
        Self {
            bounds: Some([u_min, v_min, u_max, v_max]),
            ..self
        }
    }

    /// The same walk from the current pixel in the opposite direction.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            orientation: -self.orientation,
            ..self
        }
    }

    /// The current pixel, which is the next one yielded.
    pub fn position(&self) -> (i32, i32) {
        (self.u, self.v)
    }

    fn in_bounds(&self) -> bool {
        match self.bounds {
            Some([u_min, v_min, u_max, v_max]) => {
                self.u >= u_min && self.u <= u_max && self.v >= v_min && self.v <= v_max
            }
            None => true,
        }
    }

    fn step_u(&mut self, h: f64) {
        let p = &self.polynomial;
        self.f += h * self.fu + p.kuu;
        self.fu += 2.0 * h * p.kuu;
        self.fv += h * p.kuv;
        self.u += h as i32;
    }

    fn step_v(&mut self, h: f64) {
        let p = &self.polynomial;
        self.f += h * self.fv + p.kvv;
        self.fv += 2.0 * h * p.kvv;
        self.fu += h * p.kuv;
        self.v += h as i32;
    }

    fn advance(&mut self) {
        let tu = self.orientation * self.fv;
        let tv = -self.orientation * self.fu;
        if tu.abs() >= tv.abs() {
            self.step_u(if tu < 0.0 { -1.0 } else { 1.0 });
            let h = if self.f * self.fv > 0.0 { -1.0 } else { 1.0 };
            if (self.f + h * self.fv + self.polynomial.kvv).abs() < self.f.abs() {
                self.step_v(h);
            }
        } else {
            self.step_v(if tv < 0.0 { -1.0 } else { 1.0 });
            let h = if self.f * self.fu > 0.0 { -1.0 } else { 1.0 };
            if (self.f + h * self.fu + self.polynomial.kuu).abs() < self.f.abs() {
                self.step_u(h);
            }
        }
    }
}

impl Iterator for CurveRasterizer {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        if self.finished || !self.in_bounds() {
            self.finished = true;
            return None;
        }
        let current = (self.u, self.v);
        self.advance();
        Some(current)
    }
}
