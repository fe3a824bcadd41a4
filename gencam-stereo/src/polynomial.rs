use gencam_core::nalgebra::{Point2, Vector2};

/// The implicit curve `kuu u² + kuv uv + kvv v² + ku u + kv v + k1 = 0` of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polynomial2 {
    pub kuu: f64,
    pub kuv: f64,
    pub kvv: f64,
    pub ku: f64,
    pub kv: f64,
    pub k1: f64,
}

impl Polynomial2 {
    /// The straight line through `point` along `direction`.
    ///
    /// The value of the polynomial is the signed distance to the line when `direction` is a unit vector.
    ///
    /// ```
    /// use gencam_core::nalgebra::{Point2, Vector2};
    /// use gencam_stereo::Polynomial2;
    /// let line = Polynomial2::line(Point2::new(3.0, 7.0), Vector2::new(1.0, 0.0));
    /// assert_eq!(line.eval(100.0, 7.0), 0.0);
    /// assert_eq!(line.eval(-5.0, 9.0), 2.0);
    /// ```
    pub fn line(point: Point2<f64>, direction: Vector2<f64>) -> Self {
        let normal = Vector2::new(-direction.y, direction.x);
        Self {
            kuu: 0.0,
            kuv: 0.0,
            kvv: 0.0,
            ku: normal.x,
            kv: normal.y,
            k1: -normal.dot(&point.coords),
        }
    }

    /// The parabola through `start`, `end` and `middle` whose axis is perpendicular
    /// to the chord from `start` to `end`.
    ///
    /// In the frame of the chord, with `s` along the unit chord `e`, `w` along its normal `n`
    /// and `L` the chord length, the parabola is `w = k s (s - L)`. The value of the polynomial
    /// is close to the distance to the curve in pixels near the chord.
    ///
    /// Returns `None` if `middle` does not project strictly between the chord ends,
    /// since the parabola is then not determined.
    pub fn chord_parabola(
        start: Point2<f64>,
        end: Point2<f64>,
        middle: Point2<f64>,
    ) -> Option<Self> {
        let chord = end - start;
        let length = chord.norm();
        let e = chord / length;
        let n = Vector2::new(-e.y, e.x);
        let offset = middle - start;
        let (s, w) = (e.dot(&offset), n.dot(&offset));
        // At least a quarter of a square pixel between the ends.
        if !(s * (length - s) > 0.25) {
            return None;
        }
        let k = w / (s * (s - length));

        // Coefficients in coordinates relative to `start`.
        let auu = -k * e.x * e.x;
        let auv = -2.0 * k * e.x * e.y;
        let avv = -k * e.y * e.y;
        let au = n.x + k * length * e.x;
        let av = n.y + k * length * e.y;

        let (x0, y0) = (start.x, start.y);
        Some(Self {
            kuu: auu,
            kuv: auv,
            kvv: avv,
            ku: au - 2.0 * auu * x0 - auv * y0,
            kv: av - 2.0 * avv * y0 - auv * x0,
            k1: auu * x0 * x0 + auv * x0 * y0 + avv * y0 * y0 - au * x0 - av * y0,
        })
    }

    pub fn eval(&self, u: f64, v: f64) -> f64 {
        self.kuu * u * u + self.kuv * u * v + self.kvv * v * v + self.ku * u + self.kv * v + self.k1
    }

    /// The derivatives along `u` and `v`.
    pub fn gradient(&self, u: f64, v: f64) -> Vector2<f64> {
        Vector2::new(
            2.0 * self.kuu * u + self.kuv * v + self.ku,
            self.kuv * u + 2.0 * self.kvv * v + self.kv,
        )
    }
}
