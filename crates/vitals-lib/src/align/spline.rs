/// Interpolating quadratic spline with knots midway between the data points.
///
/// With data `x_0..x_{n-1}` the interior knots sit at `(x_i + x_{i+1}) / 2`
/// for `i = 1..=n-3`, giving `n - 2` parabolic pieces joined with a
/// continuous first derivative. The first piece passes through `x_0` and
/// `x_1`, the last through `x_{n-2}` and `x_{n-1}`, and every other piece
/// through the single data point it contains. The spline values at the knots
/// come from a diagonally dominant tridiagonal system.
#[derive(Debug, Clone)]
pub struct QuadraticSpline {
    knots: Vec<f64>,
    pieces: Vec<Piece>,
}

/// One parabola in Newton form: `f0 + d1 (x - t0) + d2 (x - t0) (x - t1)`.
#[derive(Debug, Clone, Copy)]
struct Piece {
    t0: f64,
    t1: f64,
    f0: f64,
    d1: f64,
    d2: f64,
}

impl Piece {
    fn through(t: [f64; 3], f: [f64; 3]) -> Self {
        let d01 = (f[1] - f[0]) / (t[1] - t[0]);
        let d12 = (f[2] - f[1]) / (t[2] - t[1]);
        Self {
            t0: t[0],
            t1: t[1],
            f0: f[0],
            d1: d01,
            d2: (d12 - d01) / (t[2] - t[0]),
        }
    }

    fn eval(&self, x: f64) -> f64 {
        self.f0 + (x - self.t0) * (self.d1 + self.d2 * (x - self.t1))
    }
}

/// A piece's interpolation node: a data point or an unknown knot value.
#[derive(Debug, Clone, Copy)]
enum Node {
    Data(usize),
    Knot(usize),
}

impl QuadraticSpline {
    /// Minimum number of data points needed to fix the spline.
    pub const MIN_KNOTS: usize = 3;

    /// Fit through `(xs[i], ys[i])`. `xs` must be strictly increasing.
    /// Returns `None` with fewer than three points or mismatched lengths.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len();
        if n < Self::MIN_KNOTS || ys.len() != n {
            return None;
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }
        let knots: Vec<f64> = (1..n - 2).map(|i| 0.5 * (xs[i] + xs[i + 1])).collect();
        let m = knots.len();
        let at = |node: Node| match node {
            Node::Data(i) => xs[i],
            Node::Knot(j) => knots[j],
        };

        // Derivative continuity at knot j links pieces j and j + 1.
        let mut lower = vec![0.0; m];
        let mut diag = vec![0.0; m];
        let mut upper = vec![0.0; m];
        let mut rhs = vec![0.0; m];
        for j in 0..m {
            for (piece, sign) in [(j, 1.0), (j + 1, -1.0)] {
                let nodes = piece_nodes(piece, n, m);
                let weights = slope_weights(nodes.map(at), knots[j]);
                for (node, w) in nodes.iter().zip(weights) {
                    match *node {
                        Node::Data(i) => rhs[j] -= sign * w * ys[i],
                        Node::Knot(k) if k + 1 == j => lower[j] += sign * w,
                        Node::Knot(k) if k == j => diag[j] += sign * w,
                        Node::Knot(_) => upper[j] += sign * w,
                    }
                }
            }
        }
        let values = solve_tridiagonal(&lower, &diag, &upper, &rhs)?;

        let pieces = (0..=m)
            .map(|p| {
                let nodes = piece_nodes(p, n, m);
                let f = nodes.map(|node| match node {
                    Node::Data(i) => ys[i],
                    Node::Knot(j) => values[j],
                });
                Piece::through(nodes.map(at), f)
            })
            .collect();
        Some(Self { knots, pieces })
    }

    /// Evaluate at `x`. Outside the data range the end pieces are extended.
    pub fn eval(&self, x: f64) -> f64 {
        let p = self.knots.partition_point(|&knot| knot <= x);
        self.pieces[p].eval(x)
    }
}

fn piece_nodes(p: usize, n: usize, m: usize) -> [Node; 3] {
    let left = if p == 0 { Node::Data(0) } else { Node::Knot(p - 1) };
    let right = if p == m { Node::Data(n - 1) } else { Node::Knot(p) };
    [left, Node::Data(p + 1), right]
}

/// Weights `w` such that the parabola through `t` has slope `sum(w_i f_i)` at `x`.
fn slope_weights(t: [f64; 3], x: f64) -> [f64; 3] {
    let mut w = [0.0; 3];
    for i in 0..3 {
        let (a, b) = (t[(i + 1) % 3], t[(i + 2) % 3]);
        w[i] = ((x - a) + (x - b)) / ((t[i] - a) * (t[i] - b));
    }
    w
}

fn solve_tridiagonal(lower: &[f64], diag: &[f64], upper: &[f64], rhs: &[f64]) -> Option<Vec<f64>> {
    let m = diag.len();
    let mut c = vec![0.0; m];
    let mut d = vec![0.0; m];
    for i in 0..m {
        let (prev_c, prev_d) = if i == 0 { (0.0, 0.0) } else { (c[i - 1], d[i - 1]) };
        let denom = diag[i] - lower[i] * prev_c;
        if !denom.is_finite() || denom.abs() < f64::EPSILON {
            return None;
        }
        c[i] = upper[i] / denom;
        d[i] = (rhs[i] - lower[i] * prev_d) / denom;
    }
    for i in (0..m.saturating_sub(1)).rev() {
        d[i] -= c[i] * d[i + 1];
    }
    Some(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
    }

    #[test]
    fn rejects_too_few_knots() {
        assert!(QuadraticSpline::fit(&[0.0, 1.0], &[1.0, 2.0]).is_none());
        assert!(QuadraticSpline::fit(&[0.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn passes_through_knots() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [97.0, 96.0, 98.0, 95.0];
        let spline = QuadraticSpline::fit(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_close(spline.eval(*x), *y);
        }
    }

    #[test]
    fn reproduces_quadratic_between_knots() {
        let f = |x: f64| 0.5 * x * x - 2.0 * x + 60.0;
        let xs = [0.0, 1.0, 3.0, 4.0, 7.0];
        let ys: Vec<f64> = xs.iter().map(|&x| f(x)).collect();
        let spline = QuadraticSpline::fit(&xs, &ys).unwrap();
        for x in [2.0, 5.0, 6.0] {
            assert_close(spline.eval(x), f(x));
        }
    }

    #[test]
    fn four_points_extend_last_piece() {
        let spline = QuadraticSpline::fit(&[0.0, 1.0, 2.0, 3.0], &[97.0, 96.0, 98.0, 95.0]).unwrap();
        assert_close(spline.eval(1.5), 97.125);
        assert_close(spline.eval(4.0), 257.0 / 3.0);
    }

    #[test]
    fn alternating_series_with_gap_stays_bounded() {
        let xs: Vec<f64> = (0..620).filter(|&i| i != 601).map(f64::from).collect();
        let ys: Vec<f64> = xs
            .iter()
            .map(|&x| if x as i64 % 2 == 0 { 65.0 } else { 75.0 })
            .collect();
        let spline = QuadraticSpline::fit(&xs, &ys).unwrap();
        let filled = spline.eval(601.0);
        assert!((55.0..=75.0).contains(&filled), "filled {}", filled);
        for i in 2..618 {
            let value = spline.eval(i as f64 + 0.5);
            assert!((55.0..=85.0).contains(&value), "at {}.5: {}", i, value);
        }
    }

    #[test]
    fn step_does_not_disturb_distant_gap() {
        let xs: Vec<f64> = (0..30).chain([40, 41]).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| if x < 10.0 { 60.0 } else { 100.0 }).collect();
        let spline = QuadraticSpline::fit(&xs, &ys).unwrap();
        for x in 30..40 {
            let value = spline.eval(f64::from(x));
            assert!((95.0..=105.0).contains(&value), "minute {}: {}", x, value);
        }
    }

    #[test]
    fn linear_data_stays_linear() {
        let xs = [0.0, 2.0, 4.0, 10.0];
        let ys = [60.0, 64.0, 68.0, 80.0];
        let spline = QuadraticSpline::fit(&xs, &ys).unwrap();
        assert_close(spline.eval(7.0), 74.0);
        assert_close(spline.eval(12.0), 84.0);
        assert_close(spline.eval(-1.0), 58.0);
    }
}
