//! Angular-spectral basis for semiflexible (wormlike) propagators.
//!
//! Orientation dependence is azimuthally symmetric, so a propagator's angular
//! profile at one grid point is a function of `x = cos θ` represented either
//! by its values on `N_sph` angular quadrature nodes ("grid values") or by
//! `N_sph` expansion coefficients over an orthogonal angular basis
//! ("spectral coefficients"). Two fixed transform matrices map between the
//! representations, one per integration direction: propagation toward
//! decreasing contour sees the reversed orientation `-u`, which flips the
//! sign of every odd basis component.
//!
//! [`AngularBasis::legendre`] builds the standard Legendre-collocation basis
//! on Gauss-Legendre nodes; arbitrary (externally supplied) matrices go
//! through [`AngularBasis::new`], which only validates shapes.

use ndarray as nd;
use crate::{ Arr1, Arr2, error::{ LengthError, ScfError } };

pub type AngularResult<T> = Result<T, ScfError>;

/// Contour integration direction; selects the sign convention of the angular
/// transforms.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Contour index increasing from the chain head.
    Forward,
    /// Contour index decreasing from the chain tail.
    Backward,
}

/// Fixed angular machinery for one solve: transform matrices for both
/// directions, quadrature weights, and the diagonal of the rotational
/// diffusion operator.
#[derive(Clone, Debug)]
pub struct AngularBasis {
    n_sph: usize,
    // synthesis: grid values from coefficients; (n_sph, n_sph), [node, mode]
    syn_f: nd::Array2<f64>,
    syn_b: nd::Array2<f64>,
    // analysis: coefficients from grid values; (n_sph, n_sph), [mode, node]
    ana_f: nd::Array2<f64>,
    ana_b: nd::Array2<f64>,
    // angular quadrature weights over x = cos θ; sum to 2
    weights: nd::Array1<f64>,
    // eigenvalues of the (negated) angular Laplacian, l(l+1)
    rot: nd::Array1<f64>,
}

// Gauss-Legendre nodes and weights on [-1, 1] by Newton iteration on P_n.
fn gauss_legendre(n: usize) -> (nd::Array1<f64>, nd::Array1<f64>) {
    let mut nodes: nd::Array1<f64> = nd::Array1::zeros(n);
    let mut weights: nd::Array1<f64> = nd::Array1::zeros(n);
    for i in 0..n {
        let mut x = (std::f64::consts::PI * (i as f64 + 0.75)
            / (n as f64 + 0.5)).cos();
        let mut pd: f64 = 0.0;
        for _ in 0..100 {
            let (p, d) = legendre_pair(n, x);
            pd = d;
            let dx = p / d;
            x -= dx;
            if dx.abs() < 1e-15 { break; }
        }
        nodes[i] = x;
        weights[i] = 2.0 / ((1.0 - x * x) * pd * pd);
    }
    (nodes, weights)
}

// evaluate (P_n(x), P_n'(x)) by the three-term recurrence
fn legendre_pair(n: usize, x: f64) -> (f64, f64) {
    let mut pm: f64 = 1.0;
    let mut p: f64 = x;
    for k in 2..=n {
        let kf = k as f64;
        let pn = ((2.0 * kf - 1.0) * x * p - (kf - 1.0) * pm) / kf;
        pm = p;
        p = pn;
    }
    let d = n as f64 * (x * p - pm) / (x * x - 1.0);
    (p, d)
}

// evaluate P_0(x) .. P_{lmax}(x)
fn legendre_all(lmax: usize, x: f64) -> nd::Array1<f64> {
    let mut p: nd::Array1<f64> = nd::Array1::zeros(lmax + 1);
    p[0] = 1.0;
    if lmax >= 1 { p[1] = x; }
    for l in 2..=lmax {
        let lf = l as f64;
        p[l] = ((2.0 * lf - 1.0) * x * p[l - 1] - (lf - 1.0) * p[l - 2]) / lf;
    }
    p
}

impl AngularBasis {
    /// Create a basis from externally supplied matrices, validating shapes
    /// only.
    ///
    /// `syn_*` map spectral coefficients to angular-grid values and `ana_*`
    /// map back; `_f`/`_b` carry the forward/backward direction sign
    /// conventions. `weights` are the angular quadrature weights (summing to
    /// the full measure, 2) and `rot` is the diagonal of the rotational
    /// diffusion operator.
    pub fn new(
        syn_f: nd::Array2<f64>,
        ana_f: nd::Array2<f64>,
        syn_b: nd::Array2<f64>,
        ana_b: nd::Array2<f64>,
        weights: nd::Array1<f64>,
        rot: nd::Array1<f64>,
    ) -> AngularResult<Self> {
        let n_sph = weights.len();
        for m in [&syn_f, &ana_f, &syn_b, &ana_b] {
            LengthError::check_len(m.nrows(), n_sph)?;
            LengthError::check_len(m.ncols(), n_sph)?;
        }
        LengthError::check(&weights, &rot)?;
        Ok(Self { n_sph, syn_f, syn_b, ana_f, ana_b, weights, rot })
    }

    /// Build the Legendre-collocation basis of dimension `n_sph`:
    /// Gauss-Legendre nodes `x_j`, synthesis `P_l(x_j)`, analysis
    /// `(l + 1/2) w_j P_l(x_j)`, with the parity factor `(-1)^l` folded into
    /// the backward-direction matrices.
    ///
    /// With this convention the `l = 0` coefficient of any angular profile
    /// equals its angular average.
    ///
    /// *Panics if `n_sph` is zero*.
    pub fn legendre(n_sph: usize) -> Self {
        assert!(n_sph > 0);
        let (nodes, weights) = gauss_legendre(n_sph);
        let mut syn_f: nd::Array2<f64> = nd::Array2::zeros((n_sph, n_sph));
        let mut ana_f: nd::Array2<f64> = nd::Array2::zeros((n_sph, n_sph));
        let mut syn_b: nd::Array2<f64> = nd::Array2::zeros((n_sph, n_sph));
        let mut ana_b: nd::Array2<f64> = nd::Array2::zeros((n_sph, n_sph));
        for (j, (&xj, &wj)) in nodes.iter().zip(&weights).enumerate() {
            let p = legendre_all(n_sph - 1, xj);
            for (l, &pl) in p.iter().enumerate() {
                let parity = if l % 2 == 0 { 1.0 } else { -1.0 };
                syn_f[[j, l]] = pl;
                syn_b[[j, l]] = parity * pl;
                ana_f[[l, j]] = (l as f64 + 0.5) * wj * pl;
                ana_b[[l, j]] = parity * (l as f64 + 0.5) * wj * pl;
            }
        }
        let rot: nd::Array1<f64>
            = (0..n_sph).map(|l| (l * (l + 1)) as f64).collect();
        Self { n_sph, syn_f, syn_b, ana_f, ana_b, weights, rot }
    }

    /// Angular dimension `N_sph`.
    pub fn n_sph(&self) -> usize { self.n_sph }

    /// Angular quadrature weights.
    pub fn weights(&self) -> &nd::Array1<f64> { &self.weights }

    /// Diagonal of the rotational diffusion operator (`l(l+1)` for the
    /// Legendre basis).
    pub fn rot(&self) -> &nd::Array1<f64> { &self.rot }

    fn syn(&self, dir: Direction) -> &nd::Array2<f64> {
        match dir {
            Direction::Forward => &self.syn_f,
            Direction::Backward => &self.syn_b,
        }
    }

    fn ana(&self, dir: Direction) -> &nd::Array2<f64> {
        match dir {
            Direction::Forward => &self.ana_f,
            Direction::Backward => &self.ana_b,
        }
    }

    /// Synthesize angular-grid values from spectral coefficients for every
    /// spatial grid point at once; rows index space, columns index angular
    /// modes/nodes.
    pub fn to_grid<S>(&self, coeffs: &Arr2<S>, dir: Direction)
        -> nd::Array2<f64>
    where S: nd::Data<Elem = f64>
    {
        coeffs.dot(&self.syn(dir).t())
    }

    /// Analyze angular-grid values into spectral coefficients for every
    /// spatial grid point at once.
    pub fn to_coeffs<S>(&self, grid_vals: &Arr2<S>, dir: Direction)
        -> nd::Array2<f64>
    where S: nd::Data<Elem = f64>
    {
        grid_vals.dot(&self.ana(dir).t())
    }

    /// Broadcast a scalar field isotropically over the angular basis: the
    /// isotropic coefficient carries the scalar, all higher components are
    /// zero.
    pub fn broadcast<S>(&self, q: &Arr1<S>) -> nd::Array2<f64>
    where S: nd::Data<Elem = f64>
    {
        let mut a: nd::Array2<f64> = nd::Array2::zeros((q.len(), self.n_sph));
        a.column_mut(0).assign(q);
        a
    }

    /// Project angular-spectral coefficients down to the scalar isotropic
    /// component (the `l = 0` coefficient, normalized by the isotropic
    /// basis-function convention).
    pub fn isotropic<S>(&self, coeffs: &Arr2<S>) -> nd::Array1<f64>
    where S: nd::Data<Elem = f64>
    {
        coeffs.column(0).to_owned()
    }

    /// Angular average of grid values at every spatial point: quadrature
    /// dot product normalized by the full angular measure.
    pub fn mean<S>(&self, grid_vals: &Arr2<S>) -> nd::Array1<f64>
    where S: nd::Data<Elem = f64>
    {
        grid_vals.dot(&self.weights) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauss_legendre_weights_sum_to_measure() {
        for n in [1, 2, 4, 8, 11] {
            let (_, w) = gauss_legendre(n);
            assert!((w.sum() - 2.0).abs() < 1e-13);
        }
    }

    #[test]
    fn gauss_legendre_integrates_polynomials() {
        // ∫₋₁¹ x⁴ dx = 2/5 needs n ≥ 3
        let (x, w) = gauss_legendre(4);
        let val: f64 = x.iter().zip(&w).map(|(xj, wj)| wj * xj.powi(4)).sum();
        assert!((val - 0.4).abs() < 1e-13);
    }

    #[test]
    fn analysis_inverts_synthesis() {
        let basis = AngularBasis::legendre(6);
        let coeffs: nd::Array2<f64>
            = nd::Array2::from_shape_fn((3, 6), |(r, l)| {
                (1.0 + r as f64) / (1.0 + l as f64) * if l % 2 == 0 { 1.0 }
                    else { -0.5 }
            });
        for dir in [Direction::Forward, Direction::Backward] {
            let grid = basis.to_grid(&coeffs, dir);
            let back = basis.to_coeffs(&grid, dir);
            for (a, b) in coeffs.iter().zip(&back) {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn backward_matrices_carry_parity() {
        let basis = AngularBasis::legendre(5);
        for j in 0..5 {
            for l in 0..5 {
                let parity = if l % 2 == 0 { 1.0 } else { -1.0 };
                let diff = basis.syn_b[[j, l]] - parity * basis.syn_f[[j, l]];
                assert!(diff.abs() < 1e-15);
            }
        }
    }

    #[test]
    fn broadcast_round_trip_is_exact() {
        let basis = AngularBasis::legendre(4);
        let q: nd::Array1<f64> = nd::array![0.25, 1.0, -3.5, 7.125];
        let a = basis.broadcast(&q);
        let back = basis.isotropic(&a);
        for (qk, bk) in q.iter().zip(&back) {
            assert_eq!(qk, bk);
        }
    }

    #[test]
    fn isotropic_conventions_agree() {
        // for an isotropic profile the l = 0 coefficient and the
        // quadrature-weight average must be the same number
        let basis = AngularBasis::legendre(6);
        let q: nd::Array1<f64> = nd::array![2.0, 0.5];
        let a = basis.broadcast(&q);
        for dir in [Direction::Forward, Direction::Backward] {
            let grid = basis.to_grid(&a, dir);
            let avg = basis.mean(&grid);
            let iso = basis.isotropic(&a);
            for (x, y) in avg.iter().zip(&iso) {
                assert!((x - y).abs() < 1e-13);
            }
        }
    }
}
