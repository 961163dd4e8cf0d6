//! Density assembly: contour integration of propagator products into
//! per-monomer density fields, species combination, and spectral projection.
//!
//! This stage invokes the propagator engine once per chain species (the
//! species are independent and solved in parallel), integrates
//! `q_forward × q_backward` over each block's contour range with the
//! composite Simpson rule, reduces semiflexible products over angle with the
//! quadrature weights, and combines everything weighted by species volume
//! fractions. In the grand-canonical ensemble the volume fractions
//! themselves are recomputed here from the just-computed partition functions
//! and the fixed chemical potentials before combination.

use ndarray as nd;
use num_complex::Complex64 as C64;
use rayon::prelude::*;
use crate::{
    angular::{ AngularBasis, Direction },
    chain::{ Ensemble, Mixture },
    error::ScfError,
    grid::GridTransform,
    propagator::{ solve_chain, BlockProp, ChainProp },
    utils::{ grid_mean, simpson_weights },
};

pub type DensityResult<T> = Result<T, ScfError>;

/// Densities and ensemble observables from one assembly pass.
#[derive(Clone, Debug)]
pub struct DensityOutput {
    /// Per-monomer density as spectral coefficients.
    pub rho: Vec<nd::Array1<C64>>,
    /// Per-monomer density on the real grid.
    pub rho_grid: Vec<nd::Array1<f64>>,
    /// Chain partition functions.
    pub q_chain: Vec<f64>,
    /// Solvent partition functions (spatial averages of the Boltzmann
    /// factor).
    pub q_solvent: Vec<f64>,
    /// Chain volume fractions actually used in the combination; equal to the
    /// inputs in canonical mode, recomputed in grand-canonical mode.
    pub phi_chain: Vec<f64>,
    /// Solvent volume fractions actually used in the combination.
    pub phi_solvent: Vec<f64>,
}

// Simpson contour integral of the forward/backward propagator product over
// one block, reduced over angle first for semiflexible blocks
fn block_density(
    basis: &AngularBasis,
    fwd: &BlockProp,
    bwd: &BlockProp,
    ds: f64,
    acc: &mut nd::Array1<f64>,
    coef: f64,
) {
    let ns = fwd.ns();
    let wgt = simpson_weights(ns, ds);
    match (fwd, bwd) {
        (BlockProp::Flexible(f), BlockProp::Flexible(b)) => {
            for s in 0..=ns {
                let ws = coef * wgt[s];
                nd::Zip::from(&mut *acc).and(&f.row(s)).and(&b.row(s))
                    .for_each(|ak, &ff, &bb| { *ak += ws * ff * bb; });
            }
        },
        (BlockProp::Semiflexible(f), BlockProp::Semiflexible(b)) => {
            for s in 0..=ns {
                let gf = basis.to_grid(
                    &f.index_axis(nd::Axis(0), s), Direction::Forward);
                let gb = basis.to_grid(
                    &b.index_axis(nd::Axis(0), s), Direction::Backward);
                let prod = basis.mean(&(gf * gb));
                let ws = coef * wgt[s];
                nd::Zip::from(&mut *acc).and(&prod)
                    .for_each(|ak, &pk| { *ak += ws * pk; });
            }
        },
        // forward and backward passes visit the same block sequence
        _ => unreachable!(),
    }
}

/// Solve every chain species and assemble per-monomer densities under the
/// per-monomer potential grids `w`.
///
/// Returns the propagators (kept resident by the caller for the stress
/// stage) along with the assembled output.
pub fn assemble<G>(
    grid: &G,
    basis: &AngularBasis,
    mix: &Mixture,
    w: &[nd::Array1<f64>],
) -> DensityResult<(Vec<ChainProp>, DensityOutput)>
where G: GridTransform + Sync
{
    let n = grid.n_grid();
    let nm = mix.n_monomers();
    ScfError::check_field_count(nm, w.len())?;
    for wi in w.iter() {
        ScfError::check_field_len(n, wi.len())?;
    }

    // chain species are independent; propagate them concurrently
    let props: Vec<ChainProp>
        = mix.chains.par_iter()
        .map(|chain| solve_chain(grid, basis, &mix.monomers, chain, w))
        .collect::<Result<_, _>>()?;
    let q_chain: Vec<f64> = props.iter().map(|p| p.q).collect();

    // ensemble coupling: grand-canonical mode feeds the fresh partition
    // functions back into the species abundances
    let phi_chain: Vec<f64>
        = mix.chains.iter().zip(&q_chain)
        .map(|(chain, &q)| {
            match mix.ensemble {
                Ensemble::Canonical => chain.phi,
                Ensemble::GrandCanonical => q * chain.mu.exp(),
            }
        })
        .collect();

    let mut rho_grid: Vec<nd::Array1<f64>>
        = (0..nm).map(|_| nd::Array1::zeros(n)).collect();
    for ((chain, prop), &phi) in
        mix.chains.iter().zip(&props).zip(&phi_chain)
    {
        let coef = phi / (chain.length() * prop.q);
        for ((block, fwd), bwd) in
            chain.blocks.iter().zip(&prop.forward).zip(&prop.backward)
        {
            block_density(
                basis,
                fwd,
                bwd,
                block.ds(),
                &mut rho_grid[block.monomer],
                coef,
            );
        }
    }

    // solvent contributions: Boltzmann factor normalized by its own spatial
    // average
    let mut q_solvent: Vec<f64> = Vec::with_capacity(mix.solvents.len());
    let mut phi_solvent: Vec<f64> = Vec::with_capacity(mix.solvents.len());
    for solvent in mix.solvents.iter() {
        let boltz: nd::Array1<f64>
            = w[solvent.monomer].mapv(|wk| (-solvent.size * wk).exp());
        let qs = grid_mean(&boltz);
        let phi = match mix.ensemble {
            Ensemble::Canonical => solvent.phi,
            Ensemble::GrandCanonical => qs * solvent.mu.exp(),
        };
        let coef = phi / qs;
        nd::Zip::from(&mut rho_grid[solvent.monomer]).and(&boltz)
            .par_for_each(|rk, &bk| { *rk += coef * bk; });
        q_solvent.push(qs);
        phi_solvent.push(phi);
    }

    // project onto spectral coefficients
    let rho: Vec<nd::Array1<C64>>
        = rho_grid.iter()
        .map(|r| grid.to_spectral(&grid.forward(r)))
        .collect();

    let output = DensityOutput {
        rho,
        rho_grid,
        q_chain,
        q_solvent,
        phi_chain,
        phi_solvent,
    };
    Ok((props, output))
}
