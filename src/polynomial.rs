//! Real-root solvers for polynomials of degree one through four.
//!
//! Each solver takes coefficients from the highest degree down and returns
//! only the real roots, in no particular order. Having no real root is an
//! ordinary outcome (an empty [`Roots`]), never an error. A leading
//! coefficient of exactly zero drops to the next lower degree. NaN or
//! infinite coefficients produce NaN roots; callers filter them.

use std::f64::consts::PI;

/// Tolerance below which a quadratic or cubic discriminant counts as zero.
const DISCRIMINANT_EPSILON: f64 = 1e-14;

/// Tolerance for the quartic's intermediate terms, which accumulate more
/// rounding error than a single discriminant.
const QUARTIC_EPSILON: f64 = 1e-9;

fn is_zero(value: f64, tolerance: f64) -> bool {
    value.abs() < tolerance
}

/// Fixed-capacity list of real roots.
#[derive(Clone, Copy, Debug)]
pub struct Roots<const N: usize> {
    values: [f64; N],
    len: usize,
}

impl<const N: usize> Roots<N> {
    /// No roots.
    pub const fn none() -> Self {
        Self {
            values: [0.0; N],
            len: 0,
        }
    }

    fn push(&mut self, value: f64) {
        if self.len < N {
            self.values[self.len] = value;
            self.len += 1;
        }
    }

    fn widen<const M: usize>(self) -> Roots<M> {
        let mut wider = Roots::none();
        for value in self.iter() {
            wider.push(value);
        }
        wider
    }

    fn shifted(mut self, offset: f64) -> Self {
        for value in &mut self.values[..self.len] {
            *value += offset;
        }
        self
    }

    /// Number of real roots found.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no real root exists.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The roots found.
    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.len]
    }

    /// Iterate over the roots.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.as_slice().iter().copied()
    }

    /// Same roots in ascending order (NaNs last).
    pub fn sorted(mut self) -> Self {
        self.values[..self.len].sort_by(f64::total_cmp);
        self
    }
}

/// Solve `a·x + b = 0`.
pub fn solve_linear(a: f64, b: f64) -> Roots<1> {
    let mut roots = Roots::none();
    if a != 0.0 {
        roots.push(-b / a);
    }
    roots
}

/// Solve `a·x² + b·x + c = 0`.
///
/// A (near-)zero discriminant yields a single double root.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots<2> {
    if a == 0.0 {
        return solve_linear(b, c).widen();
    }

    // normal form: x² + 2px + q = 0
    let p = b / (2.0 * a);
    let q = c / a;
    let discriminant = p * p - q;

    let mut roots = Roots::none();
    if is_zero(discriminant, DISCRIMINANT_EPSILON) {
        roots.push(-p);
    } else if discriminant < 0.0 {
        return roots;
    } else {
        let sqrt_d = discriminant.sqrt();
        roots.push(sqrt_d - p);
        roots.push(-sqrt_d - p);
    }
    roots
}

/// Solve `a·x³ + b·x² + c·x + d = 0` with Cardano's method.
///
/// Three real roots (casus irreducibilis) are found trigonometrically;
/// a triple root is reported once and a single-plus-double pair twice.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Roots<3> {
    if a == 0.0 {
        return solve_quadratic(b, c, d).widen();
    }

    // normal form: x³ + Ax² + Bx + C = 0
    let big_a = b / a;
    let big_b = c / a;
    let big_c = d / a;

    // substitute x = y - A/3: y³ + py + q = 0
    let sq_a = big_a * big_a;
    let p = (-sq_a / 3.0 + big_b) / 3.0;
    let q = 0.5 * (2.0 / 27.0 * big_a * sq_a - big_a * big_b / 3.0 + big_c);

    let cb_p = p * p * p;
    let discriminant = q * q + cb_p;

    let mut roots = Roots::none();
    if is_zero(discriminant, DISCRIMINANT_EPSILON) {
        if is_zero(q, DISCRIMINANT_EPSILON) {
            roots.push(0.0);
        } else {
            let u = (-q).cbrt();
            roots.push(2.0 * u);
            roots.push(-u);
        }
    } else if discriminant < 0.0 {
        let cos_arg = (-q / (-cb_p).sqrt()).clamp(-1.0, 1.0);
        let phi = cos_arg.acos() / 3.0;
        let t = 2.0 * (-p).sqrt();
        roots.push(t * phi.cos());
        roots.push(-t * (phi + PI / 3.0).cos());
        roots.push(-t * (phi - PI / 3.0).cos());
    } else {
        let sqrt_d = discriminant.sqrt();
        roots.push((sqrt_d - q).cbrt() - (sqrt_d + q).cbrt());
    }

    roots.shifted(-big_a / 3.0)
}

/// Solve `a·x⁴ + b·x³ + c·x² + d·x + e = 0` via the resolvent cubic.
///
/// Returns no roots if the factorisation into two real quadratics fails.
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64, e: f64) -> Roots<4> {
    if a == 0.0 {
        return solve_cubic(b, c, d, e).widen();
    }

    // normal form: x⁴ + Ax³ + Bx² + Cx + D = 0
    let big_a = b / a;
    let big_b = c / a;
    let big_c = d / a;
    let big_d = e / a;

    // substitute x = y - A/4: y⁴ + py² + qy + r = 0
    let sq_a = big_a * big_a;
    let p = -0.375 * sq_a + big_b;
    let q = 0.125 * sq_a * big_a - 0.5 * big_a * big_b + big_c;
    let r = -0.01171875 * sq_a * sq_a + 0.0625 * sq_a * big_b - 0.25 * big_a * big_c + big_d;

    let mut roots = Roots::none();
    if is_zero(r, QUARTIC_EPSILON) {
        // y(y³ + py + q) = 0
        for root in solve_cubic(1.0, 0.0, p, q).iter() {
            roots.push(root);
        }
        roots.push(0.0);
    } else {
        let resolvent = solve_cubic(1.0, -0.5 * p, -r, 0.5 * r * p - 0.125 * q * q);
        let Some(z) = resolvent.iter().reduce(f64::max) else {
            return roots;
        };

        let Some(u) = non_negative_sqrt(z * z - r) else {
            return roots;
        };
        let Some(v) = non_negative_sqrt(2.0 * z - p) else {
            return roots;
        };

        let (first_v, second_v) = if q < 0.0 { (-v, v) } else { (v, -v) };
        for root in solve_quadratic(1.0, first_v, z - u).iter() {
            roots.push(root);
        }
        for root in solve_quadratic(1.0, second_v, z + u).iter() {
            roots.push(root);
        }
    }

    roots.shifted(-0.25 * big_a)
}

fn non_negative_sqrt(value: f64) -> Option<f64> {
    if is_zero(value, QUARTIC_EPSILON) {
        Some(0.0)
    } else if value > 0.0 {
        Some(value.sqrt())
    } else {
        None
    }
}
