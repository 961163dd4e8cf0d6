//! Theoretical background.
//!
//! # Contents
//! - [Background](#background)
//! - [Flexible blocks](#flexible-blocks)
//! - [Semiflexible blocks](#semiflexible-blocks)
//! - [Densities and quadrature](#densities-and-quadrature)
//! - [Ensembles and free energy](#ensembles-and-free-energy)
//! - [Stress](#stress)
//!
//! # Background
//! In self-consistent field (SCF) theory a melt or solution of polymer chains
//! is reduced to one chain in a set of chemical-potential fields *w*ᵢ(*r*),
//! one per monomer type, defined over a periodic unit cell. The statistical
//! weight of all conformations of the first *s* units of a chain, with the
//! *s*-th unit constrained to sit at *r*, is the propagator *q*(*r*, *s*),
//! which obeys the modified diffusion equation (MDE)
//! ```text
//! ∂q    b²
//! -- =  -- ∇²q - w(r) q
//! ∂s    6
//! ```
//! for flexible (Gaussian) statistics, with *b* the statistical segment
//! length of the monomer type currently at contour position *s*. The
//! propagator starts from the free end as *q*(*r*, 0) = 1 and is advanced
//! block by block; a second, "backward" propagator *q*†(*r*, *s*) is built
//! from the opposite chain end. The single-chain partition function is the
//! spatial average of the terminal value,
//! ```text
//! Q = ⟨ q(r, N) ⟩ᵣ = ⟨ q†(r, 0) ⟩ᵣ
//! ```
//! the second equality holding because the discrete step operator below is
//! self-adjoint.
//!
//! # Flexible blocks
//! The MDE is a diffusion equation in imaginary time, so the standard
//! pseudo-spectral split-operator factorization applies: over one contour
//! step *δs*,
//! ```text
//! q(s + δs) = e^(-w δs/2) F⁻¹[ e^(-(b²/6) k² δs) F[ e^(-w δs/2) q(s) ] ]
//! ```
//! where *F* is the discrete Fourier transform over the spatial grid. The
//! error is *O*(*δs*³) per step and both exponential factors are diagonal in
//! their respective representations, so each is precomputed once per block
//! and the step costs two transforms. This is the imaginary-time counterpart
//! of the split-step integrator for the time-dependent Schrödinger equation,
//! with the potential factor real instead of a phase.
//!
//! # Semiflexible blocks
//! A wormlike block retains the orientation *u* of the chain backbone as a
//! degree of freedom, relaxed by rotational diffusion with rate set by the
//! segment length:
//! ```text
//! ∂q          1
//! -- =  - w q + --- ∇u² q
//! ∂s           2b
//! ```
//! With azimuthal symmetry the angular profile at each grid point is
//! expanded over Legendre polynomials *P*ₗ(cos θ), *l* < *N*ₛₚₕ, in which
//! the angular Laplacian is diagonal with eigenvalues −*l*(*l* + 1). The
//! backward propagator travels against the contour direction and therefore
//! sees the reversed orientation −*u*; since *P*ₗ(−*x*) = (−1)ˡ *P*ₗ(*x*),
//! the grid↔coefficient transform matrices for the backward direction carry
//! the parity factor.
//!
//! The contour update is the semi-implicit third-order backward
//! differentiation formula (SBDF3): with *a*ⁿ the coefficient vector at one
//! grid point,
//! ```text
//! 11                 3        1
//! -- aⁿ⁺¹ = 3 aⁿ  -  - aⁿ⁻¹ + - aⁿ⁻² - δs W a* - δs R aⁿ⁺¹
//!  6                 2        3
//!
//! a* = 3 aⁿ - 3 aⁿ⁻¹ + aⁿ⁻²
//! ```
//! where *R* is the (diagonal, implicit) rotational-diffusion operator and
//! *W* the (explicit, third-order extrapolated) potential operator, applied
//! by synthesizing angular-grid values, scaling by *w*(*r*), and analyzing
//! back. The scheme needs three history states, so the first two steps of
//! every semiflexible block fall back to a first-order explicit update; this
//! is why such blocks require at least 4 contour steps.
//!
//! Crossing a boundary between block kinds converts representations: a
//! scalar propagator enters a semiflexible block isotropically (the *l* = 0
//! coefficient carries the scalar, all others vanish), and an
//! angular-spectral propagator enters a flexible block through its isotropic
//! component. With the normalization used here the *l* = 0 coefficient
//! equals the angular average, so the round trip is exact.
//!
//! # Densities and quadrature
//! The density of monomer type *i* contributed by one block of a chain with
//! volume fraction *φ*, total length *N*, and partition function *Q* is the
//! contour integral of the propagator product,
//! ```text
//!           φ     ⌠
//! ρ(r) =  -----   | ds  q(r, s) q†(r, s)
//!          N Q    ⌡block
//! ```
//! with an angular average ⟨·⟩ᵤ applied to the product first for
//! semiflexible blocks. The integral is evaluated by the composite Simpson
//! rule (weights 1, 4, 2, …, 4, 1 scaled by *δs*/3), which is why every
//! block must have an even number of contour steps. Point-like solvents skip
//! the contour machinery entirely:
//! ```text
//! ρₛ(r) = φₛ e^(-vₛ w(r)) / ⟨ e^(-vₛ w) ⟩ᵣ
//! ```
//! with *v*ₛ the molecular volume relative to the reference volume.
//!
//! # Ensembles and free energy
//! One relation couples volume fraction, chemical potential, and partition
//! function per species; the ensemble decides which way it is read:
//! ```text
//! canonical:        μ = ln(φ / Q)        (φ fixed)
//! grand-canonical:  φ = Q e^μ            (μ fixed)
//! ```
//! The Helmholtz free energy per reference volume, in units of kT, is
//! ```text
//! f = Σc φc (μc - 1)/Nc + Σs φs (μs - 1)/vs
//!     + ⟨ Σ_{i<j} χᵢⱼ ρᵢ ρⱼ - Σᵢ wᵢ ρᵢ ⟩ᵣ
//! ```
//! with terms for species of vanishing volume fraction skipped to keep the
//! logarithms finite. Evaluating the same functional for a spatially uniform
//! composition gives the Flory-Huggins reference value. The pressure is the
//! Legendre transform of *f* with respect to all chemical potentials.
//!
//! # Stress
//! Relaxing the unit cell toward equilibrium requires the derivative of the
//! free energy with respect to each cell deformation parameter *λ*. Only the
//! single-chain entropy depends on the cell shape, through the squared
//! wavevector magnitudes *k*², giving
//! ```text
//! ∂f          b²       ⌠      1       ∂k²
//! -- = - Σ m  --       | ds   -- Σₖ   --- q̂(k, s) q̂†(k, s)*
//! ∂λ          6        ⌡      V²      ∂λ
//! ```
//! summed over blocks, where the mixing weight *m* follows the free-energy
//! rule (canonical: *φ*/(*N Q*); grand-canonical: *e*^μ/*N*) and the contour
//! integral is again a Simpson sum over the propagators retained from the
//! latest density assembly. Semiflexible blocks enter through their
//! isotropic component.
