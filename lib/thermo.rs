//! Thermodynamics: ensemble conversions, Helmholtz and Flory-Huggins free
//! energies, and the stress (free-energy derivative with respect to unit-cell
//! deformation).
//!
//! The conversion and free-energy functions are pure given their inputs. The
//! stress computation is not: it reads the propagators left resident by the
//! most recent density assembly, so callers must guarantee the ordering
//! (evaluate, then stress) on every field configuration.

use ndarray as nd;
use crate::{
    PHI_TINY,
    angular::AngularBasis,
    chain::{ Ensemble, Mixture },
    error::ScfError,
    grid::GridTransform,
    propagator::ChainProp,
    utils::{ grid_dot, simpson_weights },
};

pub type ThermoResult<T> = Result<T, ScfError>;

/// Resolve the chemical potential / volume fraction pair for a chain species
/// with partition function `q`.
///
/// Canonical mode computes `mu = ln(phi / q)` from the given `phi`;
/// grand-canonical mode computes `phi = q exp(mu)` from the given `mu`.
/// Returns the resolved `(phi, mu)`.
pub fn mu_phi_chain(ensemble: Ensemble, phi: f64, mu: f64, q: f64)
    -> (f64, f64)
{
    match ensemble {
        Ensemble::Canonical => (phi, (phi / q).ln()),
        Ensemble::GrandCanonical => (q * mu.exp(), mu),
    }
}

/// Resolve the chemical potential / volume fraction pair for a solvent
/// species; same relation as [`mu_phi_chain`] with the solvent's own
/// partition function.
pub fn mu_phi_solvent(ensemble: Ensemble, phi: f64, mu: f64, q: f64)
    -> (f64, f64)
{
    mu_phi_chain(ensemble, phi, mu, q)
}

/// Helmholtz free energy per reference volume (in units of kT), and
/// optionally the pressure as its Legendre transform with respect to all
/// chemical potentials.
///
/// Species with volume fractions below a small threshold are skipped in the
/// logarithmic mixing terms rather than propagated as errors; a vanishing
/// component is a physical limit, not a failure.
pub fn free_energy(
    mix: &Mixture,
    rho_grid: &[nd::Array1<f64>],
    w_grid: &[nd::Array1<f64>],
    phi_chain: &[f64],
    mu_chain: &[f64],
    phi_solvent: &[f64],
    mu_solvent: &[f64],
    with_pressure: bool,
) -> (f64, Option<f64>) {
    let mut f: f64 = 0.0;
    for ((chain, &phi), &mu) in
        mix.chains.iter().zip(phi_chain).zip(mu_chain)
    {
        if phi < PHI_TINY { continue; }
        f += phi * (mu - 1.0) / chain.length();
    }
    for ((solvent, &phi), &mu) in
        mix.solvents.iter().zip(phi_solvent).zip(mu_solvent)
    {
        if phi < PHI_TINY { continue; }
        f += phi * (mu - 1.0) / solvent.size;
    }
    let nm = mix.n_monomers();
    for i in 0..nm {
        for j in i + 1..nm {
            f += mix.chi[[i, j]] * grid_dot(&rho_grid[i], &rho_grid[j]);
        }
        f -= grid_dot(&w_grid[i], &rho_grid[i]);
    }
    let pressure = with_pressure.then(|| {
        let mut p = -f;
        for ((chain, &phi), &mu) in
            mix.chains.iter().zip(phi_chain).zip(mu_chain)
        {
            if phi < PHI_TINY { continue; }
            p += mu * phi / chain.length();
        }
        for ((solvent, &phi), &mu) in
            mix.solvents.iter().zip(phi_solvent).zip(mu_solvent)
        {
            if phi < PHI_TINY { continue; }
            p += mu * phi / solvent.size;
        }
        p
    });
    (f, pressure)
}

/// Flory-Huggins free energy of the spatially uniform system with the given
/// species volume fractions; baseline/consistency reference that ignores all
/// spatial and conformational contributions.
pub fn fh_homogeneous(
    mix: &Mixture,
    phi_chain: &[f64],
    phi_solvent: &[f64],
) -> f64 {
    let mut f: f64 = 0.0;
    for (chain, &phi) in mix.chains.iter().zip(phi_chain) {
        if phi < PHI_TINY { continue; }
        f += phi / chain.length() * (phi.ln() - 1.0);
    }
    for (solvent, &phi) in mix.solvents.iter().zip(phi_solvent) {
        if phi < PHI_TINY { continue; }
        f += phi / solvent.size * (phi.ln() - 1.0);
    }
    let nm = mix.n_monomers();
    let phibar: Vec<f64>
        = (0..nm)
        .map(|i| {
            let c: f64
                = mix.chains.iter().zip(phi_chain)
                .map(|(chain, &phi)| phi * chain.monomer_fraction(i))
                .sum();
            let s: f64
                = mix.solvents.iter().zip(phi_solvent)
                .filter(|(solvent, _)| solvent.monomer == i)
                .map(|(_, &phi)| phi)
                .sum();
            c + s
        })
        .collect();
    for i in 0..nm {
        for j in i + 1..nm {
            f += mix.chi[[i, j]] * phibar[i] * phibar[j];
        }
    }
    f
}

/// Stress: derivative of the free energy with respect to each requested
/// unit-cell deformation direction, where `dksq[d]` holds the derivative of
/// every mode's squared wavevector magnitude with respect to deformation
/// parameter `d`.
///
/// Uses the propagators from the most recent density assembly on the same
/// field configuration; semiflexible blocks enter through their isotropic
/// component.
pub fn scf_stress<G>(
    grid: &G,
    basis: &AngularBasis,
    mix: &Mixture,
    props: &[ChainProp],
    dksq: &[nd::Array1<f64>],
) -> ThermoResult<Vec<f64>>
where G: GridTransform
{
    let n = grid.n_grid();
    if props.len() != mix.chains.len() {
        return Err(ScfError::NoPropagators);
    }
    for d in dksq.iter() {
        ScfError::check_field_len(n, d.len())?;
    }
    let norm = (n as f64).powi(2);
    let mut stress: Vec<f64> = vec![0.0; dksq.len()];
    for (chain, prop) in mix.chains.iter().zip(props) {
        // ensemble mixing weight, matching the free-energy rule; in
        // canonical mode the explicit 1/Q normalizes the raw propagator
        // bilinear, in grand-canonical mode exp(mu) Q/L collapses to the
        // same thing
        let weight = match mix.ensemble {
            Ensemble::Canonical => chain.phi / (chain.length() * prop.q),
            Ensemble::GrandCanonical => chain.mu.exp() / chain.length(),
        };
        for ((block, fwd), bwd) in
            chain.blocks.iter().zip(&prop.forward).zip(&prop.backward)
        {
            let kuhn = mix.monomers[block.monomer].kuhn;
            let pref = weight * kuhn.powi(2) / 6.0;
            let wgt = simpson_weights(block.ns, block.ds());
            for s in 0..=block.ns {
                let qfk = grid.forward(&fwd.scalar_row(s, basis));
                let qbk = grid.forward(&bwd.scalar_row(s, basis));
                let cross: nd::Array1<f64>
                    = nd::Zip::from(&qfk).and(&qbk)
                    .map_collect(|fk, bk| (*fk * bk.conj()).re);
                for (sd, dk) in stress.iter_mut().zip(dksq) {
                    let acc: f64
                        = cross.iter().zip(dk)
                        .map(|(ck, dkk)| ck * dkk)
                        .sum();
                    *sd -= pref * wgt[s] * acc / norm;
                }
            }
        }
    }
    Ok(stress)
}
