//! Collection of all error types.
//!
//! All errors derive [`thiserror::Error`], making them composable when allowed
//! and compatible with application code using [`anyhow`][anyhow].
//!
//! Configuration errors are fatal for the solve that encounters them:
//! propagator state for a chain is only meaningful if the full contour pass
//! completed, so there is no partial-result recovery path anywhere in this
//! crate. Numerical near-singularities in free-energy evaluation are guarded
//! per-term (see [`crate::thermo`]) and never surfaced as errors.
//!
//! [anyhow]: https://crates.io/crates/anyhow

use ndarray as nd;
use thiserror::Error;

/// Returned when an operation requiring equal-length arrays encounters arrays
/// with unequal length.
#[derive(Debug, Error)]
#[error("encountered arrays with incompatible lengths; got {0} and {1}")]
pub struct LengthError(pub usize, pub usize);

impl LengthError {
    pub(crate) fn check<S, A, T, B>(
        a: &nd::ArrayBase<S, nd::Ix1>,
        b: &nd::ArrayBase<T, nd::Ix1>,
    ) -> Result<(), Self>
    where
        S: nd::Data<Elem = A>,
        T: nd::Data<Elem = B>,
    {
        let na = a.len();
        let nb = b.len();
        (na == nb).then_some(()).ok_or(Self(na, nb))
    }

    pub(crate) fn check_len(n: usize, m: usize) -> Result<(), Self> {
        (n == m).then_some(()).ok_or(Self(n, m))
    }
}

/// Returned from the propagator, density-assembly, and thermodynamics stages.
#[derive(Debug, Error)]
pub enum ScfError {
    /// Returned when a block's contour discretization has an odd number of
    /// steps; Simpson's rule requires an odd number of sample points.
    #[error("contour step counts must be even for Simpson's rule; got {0}")]
    OddBlockSteps(usize),

    /// Returned when a semiflexible block has fewer contour steps than the
    /// multistep corrector needs for its history.
    #[error("semiflexible blocks require at least 4 contour steps; got {0}")]
    SemiflexSteps(usize),

    /// Returned when a block's contour length is degenerate.
    #[error("block contour lengths must be greater than 0; got {0}")]
    BadBlockLength(f64),

    /// Returned when a block or solvent references a monomer type outside the
    /// mixture's monomer list.
    #[error("monomer index {index} out of range for {count} monomer types")]
    MonomerIndex { index: usize, count: usize },

    /// Returned when the chi interaction matrix is not square of dimension
    /// equal to the number of monomer types.
    #[error("chi matrix must be {expected}x{expected}; got {rows}x{cols}")]
    ChiShape { expected: usize, rows: usize, cols: usize },

    /// Returned when the chi interaction matrix is not symmetric.
    #[error("chi matrix must be symmetric; chi[{0},{1}] != chi[{1},{0}]")]
    ChiAsymmetric(usize, usize),

    /// Returned when a chain species has no blocks.
    #[error("chain species must have at least one block")]
    EmptyChain,

    /// Returned when angular transform matrices, quadrature weights, or the
    /// rotational-diffusion diagonal disagree on the angular dimension.
    #[error("angular basis shape error: {0}")]
    AngularShape(#[from] LengthError),

    /// Returned when the number of supplied field arrays does not match the
    /// number of monomer types.
    #[error("expected one field per monomer type ({expected}); got {got}")]
    FieldCount { expected: usize, got: usize },

    /// Returned when a field array does not match the spatial grid.
    #[error("field length {got} does not match grid size {expected}")]
    FieldLength { expected: usize, got: usize },

    /// Returned from [`stress`][crate::scf::SolverContext::stress] when no
    /// propagators are resident, i.e. `evaluate` has not yet run on the
    /// current context.
    #[error("stress requires propagators from a preceding evaluate call")]
    NoPropagators,
}

impl ScfError {
    pub(crate) fn check_block_steps(ns: usize) -> Result<(), Self> {
        (ns > 0 && ns % 2 == 0).then_some(()).ok_or(Self::OddBlockSteps(ns))
    }

    pub(crate) fn check_semiflex_steps(ns: usize) -> Result<(), Self> {
        (ns >= 4).then_some(()).ok_or(Self::SemiflexSteps(ns))
    }

    pub(crate) fn check_monomer(index: usize, count: usize) -> Result<(), Self> {
        (index < count).then_some(()).ok_or(Self::MonomerIndex { index, count })
    }

    pub(crate) fn check_field_count(expected: usize, got: usize)
        -> Result<(), Self>
    {
        (expected == got).then_some(())
            .ok_or(Self::FieldCount { expected, got })
    }

    pub(crate) fn check_field_len(expected: usize, got: usize)
        -> Result<(), Self>
    {
        (expected == got).then_some(())
            .ok_or(Self::FieldLength { expected, got })
    }
}
