//! Solver context: one evaluation step of the SCF iteration.
//!
//! The context owns the grid transform, the angular basis, the mixture
//! topology, and all state shared between the pipeline stages -- most
//! importantly the propagators left resident by the latest density assembly,
//! which the stress stage reads. Making that temporal coupling a field of an
//! explicit owned object (rather than module-level storage) means the
//! "density assembly, then stress" ordering is a checked property of each
//! context instead of ambient convention: [`SolverContext::stress`] fails
//! with [`ScfError::NoPropagators`] if no evaluation has run.
//!
//! Constructing the context allocates/validates everything that depends on
//! chain topology; a context must be rebuilt when the topology changes.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    angular::AngularBasis,
    chain::Mixture,
    density::{ self, DensityOutput },
    error::ScfError,
    grid::GridTransform,
    propagator::ChainProp,
    thermo,
};

pub type ScfResult<T> = Result<T, ScfError>;

/// Owns everything one SCF field evaluation needs, plus the propagator state
/// resident between an `evaluate` call and a following `stress` call.
pub struct SolverContext<G> {
    grid: G,
    basis: AngularBasis,
    mix: Mixture,
    // per-chain propagators from the most recent evaluate; empty before the
    // first call
    props: Vec<ChainProp>,
    // per-monomer potential grids from the most recent evaluate
    w_grid: Vec<nd::Array1<f64>>,
    // observables from the most recent evaluate
    last: Option<DensityOutput>,
}

impl<G> SolverContext<G>
where G: GridTransform + Sync
{
    /// Create a context for a mixture on the given grid and angular basis.
    ///
    /// The mixture's topology invariants are re-checked here, so a mixture
    /// assembled by struct literal is caught before any contour stepping
    /// runs on it.
    pub fn new(mix: Mixture, grid: G, basis: AngularBasis) -> ScfResult<Self>
    {
        mix.validate()?;
        Ok(Self {
            grid,
            basis,
            mix,
            props: Vec::new(),
            w_grid: Vec::new(),
            last: None,
        })
    }

    pub fn grid(&self) -> &G { &self.grid }

    pub fn basis(&self) -> &AngularBasis { &self.basis }

    pub fn mixture(&self) -> &Mixture { &self.mix }

    /// Propagators from the most recent [`evaluate`][Self::evaluate], if
    /// any.
    pub fn propagators(&self) -> &[ChainProp] { &self.props }

    /// One full field evaluation: bring the omega coefficients to the real
    /// grid, solve every chain species, assemble densities, and project back
    /// to spectral coefficients.
    ///
    /// The propagators computed here stay resident on the context for a
    /// following [`stress`][Self::stress] call.
    pub fn evaluate(&mut self, omega: &[nd::Array1<C64>])
        -> ScfResult<DensityOutput>
    {
        ScfError::check_field_count(self.mix.n_monomers(), omega.len())?;
        for wi in omega.iter() {
            ScfError::check_field_len(self.grid.n_grid(), wi.len())?;
        }
        let w_grid: Vec<nd::Array1<f64>>
            = omega.iter().map(|wi| self.grid.to_grid(wi)).collect();
        let (props, out)
            = density::assemble(&self.grid, &self.basis, &self.mix, &w_grid)?;
        self.props = props;
        self.w_grid = w_grid;
        self.last = Some(out.clone());
        Ok(out)
    }

    /// Stress along each deformation direction `d`, where `dksq[d]` is the
    /// derivative of every Fourier mode's squared wavevector with respect to
    /// that deformation parameter.
    ///
    /// Requires propagators resident from a preceding
    /// [`evaluate`][Self::evaluate] on this context; the result is only
    /// meaningful for the same field configuration.
    pub fn stress(&self, dksq: &[nd::Array1<f64>]) -> ScfResult<Vec<f64>> {
        if self.props.len() != self.mix.chains.len() {
            return Err(ScfError::NoPropagators);
        }
        thermo::scf_stress(&self.grid, &self.basis, &self.mix, &self.props,
            dksq)
    }

    /// Helmholtz free energy (and optionally pressure) for the state of the
    /// most recent [`evaluate`][Self::evaluate], resolving each species'
    /// chemical potential / volume fraction per the active ensemble.
    pub fn free_energy(&self, with_pressure: bool)
        -> ScfResult<(f64, Option<f64>)>
    {
        let out = self.last.as_ref().ok_or(ScfError::NoPropagators)?;
        let mut phi_chain: Vec<f64> = Vec::with_capacity(out.q_chain.len());
        let mut mu_chain: Vec<f64> = Vec::with_capacity(out.q_chain.len());
        for ((chain, &q), &phi) in
            self.mix.chains.iter().zip(&out.q_chain).zip(&out.phi_chain)
        {
            let (p, m)
                = thermo::mu_phi_chain(self.mix.ensemble, phi, chain.mu, q);
            phi_chain.push(p);
            mu_chain.push(m);
        }
        let mut phi_solvent: Vec<f64>
            = Vec::with_capacity(out.q_solvent.len());
        let mut mu_solvent: Vec<f64>
            = Vec::with_capacity(out.q_solvent.len());
        for ((solvent, &q), &phi) in
            self.mix.solvents.iter().zip(&out.q_solvent).zip(&out.phi_solvent)
        {
            let (p, m)
                = thermo::mu_phi_solvent(self.mix.ensemble, phi, solvent.mu,
                    q);
            phi_solvent.push(p);
            mu_solvent.push(m);
        }
        Ok(thermo::free_energy(
            &self.mix,
            &out.rho_grid,
            &self.w_grid,
            &phi_chain,
            &mu_chain,
            &phi_solvent,
            &mu_solvent,
            with_pressure,
        ))
    }

    /// Set the zero-wavevector component of each monomer's omega field to
    /// the mean-field convention, `Σ_j chi_ij φ̄_j`.
    pub fn set_uniform_potential(&self, omega: &mut [nd::Array1<C64>])
        -> ScfResult<()>
    {
        let nm = self.mix.n_monomers();
        ScfError::check_field_count(nm, omega.len())?;
        for (i, wi) in omega.iter_mut().enumerate() {
            let mean: f64
                = (0..nm)
                .map(|j| self.mix.chi[[i, j]] * self.mix.mean_fraction(j))
                .sum();
            wi[0] = C64::from(mean);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ Block, BlockKind, Chain, Ensemble, Monomer };
    use crate::grid::FftGrid;

    fn context() -> SolverContext<FftGrid> {
        let chain = Chain::new(
            vec![Block::new(0, 1.0, 4, BlockKind::Flexible).unwrap()],
            1.0, 0.0,
        ).unwrap();
        let mix = Mixture::new(
            vec![Monomer::new(1.0)],
            vec![chain],
            Vec::new(),
            nd::Array2::zeros((1, 1)),
            Ensemble::Canonical,
        ).unwrap();
        SolverContext::new(
            mix,
            FftGrid::new((4, 4, 4), (2.0, 2.0, 2.0)),
            AngularBasis::legendre(4),
        ).unwrap()
    }

    #[test]
    fn wrong_length_omega_is_an_error() {
        let mut ctx = context();
        let omega = vec![nd::Array1::zeros(17)];
        assert!(matches!(
            ctx.evaluate(&omega),
            Err(ScfError::FieldLength { got: 17, .. }),
        ));
    }

    #[test]
    fn literal_topology_is_revalidated() {
        // struct literals skip the constructor checks; the context must
        // catch a bad discretization before any stepping runs on it
        let block = Block {
            monomer: 0,
            length: 1.0,
            ns: 3,
            kind: BlockKind::Flexible,
        };
        let chain = Chain { blocks: vec![block], phi: 1.0, mu: 0.0 };
        let mix = Mixture {
            monomers: vec![Monomer::new(1.0)],
            chains: vec![chain],
            solvents: Vec::new(),
            chi: nd::Array2::zeros((1, 1)),
            ensemble: Ensemble::Canonical,
        };
        let res = SolverContext::new(
            mix,
            FftGrid::new((4, 4, 4), (2.0, 2.0, 2.0)),
            AngularBasis::legendre(4),
        );
        assert!(matches!(res, Err(ScfError::OddBlockSteps(3))));
    }

    #[test]
    fn stress_before_evaluate_is_an_error() {
        let ctx = context();
        let dksq = vec![nd::Array1::zeros(ctx.grid().n_grid())];
        assert!(matches!(ctx.stress(&dksq), Err(ScfError::NoPropagators)));
    }

    #[test]
    fn evaluate_then_stress_runs() {
        let mut ctx = context();
        let omega = vec![nd::Array1::zeros(ctx.grid().n_grid())];
        let out = ctx.evaluate(&omega).unwrap();
        assert!((out.q_chain[0] - 1.0).abs() < 1e-12);
        let dksq = vec![ctx.grid().dksq_dl(0)];
        let stress = ctx.stress(&dksq).unwrap();
        assert_eq!(stress.len(), 1);
    }

    #[test]
    fn uniform_potential_sets_mean_mode() {
        let ctx = context();
        let mut omega = vec![nd::Array1::zeros(ctx.grid().n_grid())];
        ctx.set_uniform_potential(&mut omega).unwrap();
        // single monomer, chi = 0: mean-field value is zero
        assert_eq!(omega[0][0], C64::from(0.0));
    }
}
