#![allow(dead_code, non_snake_case)]

//! Provides the chain-propagator solver and density/free-energy assembly
//! engine at the heart of a polymer self-consistent field (SCF) calculation:
//! given a chemical-potential ("omega") field configuration for a mixture of
//! branched/linear chains and point-like solvents in a periodic unit cell,
//! this crate solves the modified diffusion equation along each chain's
//! contour and assembles monomer densities, single-molecule partition
//! functions, free energies, and the free-energy derivative with respect to
//! unit-cell deformation (stress).
//!
//! Provides implementations for the following numerical routines:
//! - Flexible (Gaussian) blocks:
//!     - Pseudo-spectral split-operator contour stepping
//! - Semiflexible (wormlike) blocks:
//!     - Angular-spectral contour stepping (first-order explicit start,
//!       semi-implicit third-order backward-difference continuation)
//! - Contour quadrature:
//!     - Composite Simpson's rule
//!
//! The outer SCF fixed-point iteration, symmetry-adapted basis construction,
//! and field file I/O are external collaborators; one evaluation step of the
//! SCF loop is [`scf::SolverContext::evaluate`].
//!
//! See [`docs`] for theoretical background.

pub mod error;
pub mod chain;
pub mod angular;
pub mod grid;
pub mod utils;
pub mod propagator;
pub mod density;
pub mod thermo;
pub mod scf;

pub mod docs;

/// Species with a volume fraction below this threshold are skipped in
/// logarithmic free-energy terms.
pub(crate) const PHI_TINY: f64 = 1e-8;

pub type Arr1<S> = ndarray::ArrayBase<S, ndarray::Ix1>;
pub type Arr2<S> = ndarray::ArrayBase<S, ndarray::Ix2>;
pub type Arr3<S> = ndarray::ArrayBase<S, ndarray::Ix3>;
