//! Miscellaneous tools: contour quadrature and spatial-grid reductions.

use ndarray::{ self as nd, Ix1 };
use num_traits::Num;
use crate::Arr1;

/// Integrate using the composite Simpson's rule.
///
/// Endpoints carry weight 1, odd interior points weight 4, even interior
/// points weight 2, all scaled by `dx / 3`. Exact for polynomials of degree
/// ≤ 3 sampled over an even number of intervals.
///
/// *Panics if `y` has an even length or fewer than 3 elements*.
pub fn simpson<S, A>(y: &nd::ArrayBase<S, Ix1>, dx: A) -> A
where
    S: nd::Data<Elem = A>,
    A: Num + Copy,
{
    let n: usize = y.len();
    assert!(n >= 3 && n % 2 == 1);
    let two = A::one() + A::one();
    let three = two + A::one();
    let four = two + two;
    let mut acc = y[0] + y[n - 1];
    for (k, yk) in y.iter().enumerate().take(n - 1).skip(1) {
        acc = acc + if k % 2 == 1 { four * *yk } else { two * *yk };
    }
    dx / three * acc
}

/// Generate the composite Simpson weight array for `ns` contour steps
/// (`ns + 1` sample points), scaled by `dx / 3`.
///
/// *Panics if `ns` is odd or zero*.
pub fn simpson_weights(ns: usize, dx: f64) -> nd::Array1<f64> {
    assert!(ns >= 2 && ns % 2 == 0);
    let mut w: nd::Array1<f64> = nd::Array1::from_elem(ns + 1, dx / 3.0);
    w.iter_mut().enumerate().skip(1).take(ns - 1)
        .for_each(|(k, wk)| { *wk *= if k % 2 == 1 { 4.0 } else { 2.0 }; });
    w
}

/// Calculate the spatial average of a grid field.
///
/// *Panics if `f` is empty*.
pub fn grid_mean<S>(f: &Arr1<S>) -> f64
where S: nd::Data<Elem = f64>
{
    f.sum() / f.len() as f64
}

/// Calculate the spatial average of the pointwise product of two grid fields.
///
/// *Panics if either array is empty; truncates to the shorter length*.
pub fn grid_dot<S, T>(f: &Arr1<S>, g: &Arr1<T>) -> f64
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
{
    let n = f.len().min(g.len());
    f.iter().zip(g).take(n).map(|(fk, gk)| fk * gk).sum::<f64>() / n as f64
}
