//! Spatial grid transforms: the boundary between symmetry-reduced spectral
//! coefficients and real/Fourier grids.
//!
//! The solver only consumes the [`GridTransform`] capability; the
//! symmetry-adapted basis machinery of a crystallographic group lives behind
//! it, outside this crate. [`FftGrid`] is the shipped implementation for the
//! trivial (P1) group, where the spectral coefficients are simply the
//! complex Fourier amplitudes normalized by the grid-point count, so the
//! zero-wavevector coefficient is the spatial mean of the field.

use std::sync::Arc;
use std::f64::consts::TAU;
use ndarray as nd;
use num_complex::Complex64 as C64;
use rustfft::{ Fft, FftPlanner };

/// Transform capability between a spectral coefficient vector, the real-space
/// grid, and the Fourier grid.
///
/// Forward/inverse transforms follow the usual DFT conventions: `forward` is
/// unnormalized, `inverse` divides by the grid-point count.
pub trait GridTransform {
    /// Total number of spatial grid points.
    fn n_grid(&self) -> usize;

    /// Squared wavevector magnitude for every Fourier mode, in the flattened
    /// mode ordering of [`forward`][Self::forward].
    fn ksq(&self) -> &nd::Array1<f64>;

    /// Real grid → Fourier grid.
    fn forward(&self, r: &nd::Array1<f64>) -> nd::Array1<C64>;

    /// Fourier grid → real grid.
    fn inverse(&self, k: &nd::Array1<C64>) -> nd::Array1<f64>;

    /// Spectral coefficients → real grid.
    fn to_grid(&self, coeffs: &nd::Array1<C64>) -> nd::Array1<f64>;

    /// Fourier grid → spectral coefficients.
    fn to_spectral(&self, k: &nd::Array1<C64>) -> nd::Array1<C64>;
}

/// Periodic orthorhombic unit cell discretized on an `(n0, n1, n2)` grid,
/// with cached FFT plans for each axis.
pub struct FftGrid {
    dims: (usize, usize, usize),
    cell: (f64, f64, f64),
    n: usize,
    ksq: nd::Array1<f64>,
    // one (forward, inverse) plan pair per axis
    plans: Vec<(Arc<dyn Fft<f64>>, Arc<dyn Fft<f64>>)>,
}

// map a DFT index to its signed frequency index
fn sfreq(i: usize, n: usize) -> f64 {
    let m = if n % 2 == 0 { n / 2 } else { (n + 1) / 2 };
    if i < m { i as f64 } else { i as f64 - n as f64 }
}

impl FftGrid {
    /// Create a new grid for an orthorhombic cell with edge lengths `cell`.
    ///
    /// *Panics if any grid dimension is zero or any cell edge is
    /// non-positive*.
    pub fn new(dims: (usize, usize, usize), cell: (f64, f64, f64)) -> Self {
        let (n0, n1, n2) = dims;
        assert!(n0 > 0 && n1 > 0 && n2 > 0);
        assert!(cell.0 > 0.0 && cell.1 > 0.0 && cell.2 > 0.0);
        let n = n0 * n1 * n2;
        let mut planner: FftPlanner<f64> = FftPlanner::new();
        let plans: Vec<(Arc<dyn Fft<f64>>, Arc<dyn Fft<f64>>)>
            = [n0, n1, n2].iter()
            .map(|&nk| {
                (planner.plan_fft_forward(nk), planner.plan_fft_inverse(nk))
            })
            .collect();
        let mut ksq: nd::Array1<f64> = nd::Array1::zeros(n);
        for i0 in 0..n0 {
            let k0 = TAU * sfreq(i0, n0) / cell.0;
            for i1 in 0..n1 {
                let k1 = TAU * sfreq(i1, n1) / cell.1;
                for i2 in 0..n2 {
                    let k2 = TAU * sfreq(i2, n2) / cell.2;
                    ksq[(i0 * n1 + i1) * n2 + i2]
                        = k0 * k0 + k1 * k1 + k2 * k2;
                }
            }
        }
        Self { dims, cell, n, ksq, plans }
    }

    /// Grid dimensions.
    pub fn dims(&self) -> (usize, usize, usize) { self.dims }

    /// Unit-cell edge lengths.
    pub fn cell(&self) -> (f64, f64, f64) { self.cell }

    /// Derivative of the squared wavevector magnitude of every mode with
    /// respect to one cell edge length, for use as a stress deformation
    /// direction.
    pub fn dksq_dl(&self, axis: usize) -> nd::Array1<f64> {
        assert!(axis < 3);
        let (n0, n1, n2) = self.dims;
        let l = [self.cell.0, self.cell.1, self.cell.2][axis];
        let mut dksq: nd::Array1<f64> = nd::Array1::zeros(self.n);
        for i0 in 0..n0 {
            for i1 in 0..n1 {
                for i2 in 0..n2 {
                    let i = [i0, i1, i2][axis];
                    let nn = [n0, n1, n2][axis];
                    let k = TAU * sfreq(i, nn) / l;
                    dksq[(i0 * n1 + i1) * n2 + i2] = -2.0 * k * k / l;
                }
            }
        }
        dksq
    }

    // in-place 3D FFT, axis by axis through a strided-lane scratch buffer
    fn transform(&self, data: &mut nd::Array1<C64>, forward: bool) {
        let (n0, n1, n2) = self.dims;
        let mut view = data.view_mut().into_shape((n0, n1, n2)).unwrap();
        let mut scratch: Vec<C64> = Vec::new();
        for (ax, (fwd, inv)) in self.plans.iter().enumerate() {
            let plan = if forward { fwd } else { inv };
            for mut lane in view.lanes_mut(nd::Axis(ax)) {
                scratch.clear();
                scratch.extend(lane.iter().copied());
                plan.process(&mut scratch);
                lane.iter_mut().zip(&scratch).for_each(|(d, s)| { *d = *s; });
            }
        }
    }
}

impl GridTransform for FftGrid {
    fn n_grid(&self) -> usize { self.n }

    fn ksq(&self) -> &nd::Array1<f64> { &self.ksq }

    fn forward(&self, r: &nd::Array1<f64>) -> nd::Array1<C64> {
        let mut k: nd::Array1<C64> = r.mapv(C64::from);
        self.transform(&mut k, true);
        k
    }

    fn inverse(&self, k: &nd::Array1<C64>) -> nd::Array1<f64> {
        let mut r = k.to_owned();
        self.transform(&mut r, false);
        let n = self.n as f64;
        r.mapv(|rk| rk.re / n)
    }

    fn to_grid(&self, coeffs: &nd::Array1<C64>) -> nd::Array1<f64> {
        let k = coeffs.mapv(|ck| ck * self.n as f64);
        self.inverse(&k)
    }

    fn to_spectral(&self, k: &nd::Array1<C64>) -> nd::Array1<C64> {
        k.mapv(|kk| kk / self.n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_grid() -> FftGrid {
        FftGrid::new((4, 4, 4), (2.0, 2.0, 2.0))
    }

    fn test_field(grid: &FftGrid) -> nd::Array1<f64> {
        let (n0, n1, n2) = grid.dims();
        let mut f: nd::Array1<f64> = nd::Array1::zeros(grid.n_grid());
        for i0 in 0..n0 {
            for i1 in 0..n1 {
                for i2 in 0..n2 {
                    f[(i0 * n1 + i1) * n2 + i2]
                        = (TAU * i0 as f64 / n0 as f64).cos()
                        + 0.5 * (TAU * i2 as f64 / n2 as f64).sin()
                        + 0.125 * (i1 as f64);
                }
            }
        }
        f
    }

    #[test]
    fn forward_inverse_round_trip() {
        let grid = test_grid();
        let f = test_field(&grid);
        let back = grid.inverse(&grid.forward(&f));
        for (a, b) in f.iter().zip(&back) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn spectral_round_trip() {
        let grid = test_grid();
        let f = test_field(&grid);
        let coeffs = grid.to_spectral(&grid.forward(&f));
        let back = grid.to_grid(&coeffs);
        for (a, b) in f.iter().zip(&back) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn mean_mode_conventions() {
        let grid = test_grid();
        let f: nd::Array1<f64> = nd::Array1::from_elem(grid.n_grid(), 3.25);
        let coeffs = grid.to_spectral(&grid.forward(&f));
        assert!((coeffs[0].re - 3.25).abs() < 1e-13);
        assert!(coeffs[0].im.abs() < 1e-13);
        for ck in coeffs.iter().skip(1) {
            assert!(ck.norm() < 1e-12);
        }
        assert_eq!(grid.ksq()[0], 0.0);
    }

    #[test]
    fn ksq_matches_cell() {
        // first mode along axis 2: k = 2π/L
        let grid = test_grid();
        let expected = (TAU / 2.0).powi(2);
        assert!((grid.ksq()[1] - expected).abs() < 1e-12);
        // dksq/dL at that mode: -2k²/L
        let dksq = grid.dksq_dl(2);
        assert!((dksq[1] + 2.0 * expected / 2.0).abs() < 1e-12);
        assert_eq!(dksq[0], 0.0);
    }
}
