//! End-to-end checks of the evaluate → free energy / stress pipeline on a
//! small P1 grid, against states whose observables are known in closed form.

use std::f64::consts::TAU;
use ndarray as nd;
use num_complex::Complex64 as C64;
use scft::{
    angular::AngularBasis,
    chain::{ Block, BlockKind, Chain, Ensemble, Mixture, Monomer, Solvent },
    grid::{ FftGrid, GridTransform },
    scf::SolverContext,
    thermo,
};

fn grid() -> FftGrid {
    FftGrid::new((8, 4, 4), (3.0, 2.0, 2.0))
}

fn basis() -> AngularBasis {
    AngularBasis::legendre(6)
}

fn homopolymer(kind: BlockKind, ensemble: Ensemble) -> Mixture {
    let chain = Chain::new(
        vec![Block::new(0, 1.0, 8, kind).unwrap()],
        1.0, 0.0,
    ).unwrap();
    Mixture::new(
        vec![Monomer::new(1.0)],
        vec![chain],
        Vec::new(),
        nd::Array2::zeros((1, 1)),
        ensemble,
    ).unwrap()
}

// spectral coefficients of a cosine along axis 0, amplitude `amp`, plus a
// uniform offset
fn cosine_field(grid: &FftGrid, amp: f64, offset: f64) -> nd::Array1<C64> {
    let (n0, n1, n2) = grid.dims();
    let mut f: nd::Array1<f64> = nd::Array1::zeros(grid.n_grid());
    for i0 in 0..n0 {
        let v = offset + amp * (TAU * i0 as f64 / n0 as f64).cos();
        for i1 in 0..n1 {
            for i2 in 0..n2 {
                f[(i0 * n1 + i1) * n2 + i2] = v;
            }
        }
    }
    grid.to_spectral(&grid.forward(&f))
}

#[test]
fn zero_field_flexible_homopolymer() {
    let mut ctx = SolverContext::new(
        homopolymer(BlockKind::Flexible, Ensemble::Canonical),
        grid(), basis(),
    ).unwrap();
    let omega = vec![nd::Array1::zeros(ctx.grid().n_grid())];
    let out = ctx.evaluate(&omega).unwrap();
    assert!((out.q_chain[0] - 1.0).abs() < 1e-12);
    assert!((out.rho[0][0].re - 1.0).abs() < 1e-12);
    assert!(out.rho[0][0].im.abs() < 1e-13);
    for ck in out.rho[0].iter().skip(1) {
        assert!(ck.norm() < 1e-12);
    }
}

#[test]
fn zero_field_semiflexible_homopolymer() {
    // the isotropic angular mode has zero rotational eigenvalue, so a
    // field-free wormlike chain keeps q = 1 exactly
    let mut ctx = SolverContext::new(
        homopolymer(BlockKind::Semiflexible, Ensemble::Canonical),
        grid(), basis(),
    ).unwrap();
    let omega = vec![nd::Array1::zeros(ctx.grid().n_grid())];
    let out = ctx.evaluate(&omega).unwrap();
    assert!((out.q_chain[0] - 1.0).abs() < 1e-12);
    assert!((out.rho[0][0].re - 1.0).abs() < 1e-12);
}

#[test]
fn uniform_potential_solvent_density() {
    let mix = Mixture::new(
        vec![Monomer::new(1.0)],
        Vec::new(),
        vec![Solvent::new(0, 1.5, 0.7, 0.0)],
        nd::Array2::zeros((1, 1)),
        Ensemble::Canonical,
    ).unwrap();
    let mut ctx = SolverContext::new(mix, grid(), basis()).unwrap();
    let u = 0.3;
    let mut omega = vec![nd::Array1::zeros(ctx.grid().n_grid())];
    omega[0][0] = C64::from(u);
    let out = ctx.evaluate(&omega).unwrap();
    // a uniform potential scales the Boltzmann factor and its normalization
    // identically, so the density stays at the bulk fraction
    assert!((out.q_solvent[0] - (-1.5 * u).exp()).abs() < 1e-12);
    for &rk in out.rho_grid[0].iter() {
        assert!((rk - 0.7).abs() < 1e-12);
    }
}

#[test]
fn diblock_density_integrates_to_fraction() {
    // the symmetric split step is self-adjoint, so the spatial average of
    // q_forward * q_backward equals Q at every contour point and the
    // combined density averages to the species fraction even in a
    // nonuniform field
    let chain = Chain::new(
        vec![
            Block::new(0, 0.5, 8, BlockKind::Flexible).unwrap(),
            Block::new(1, 0.5, 8, BlockKind::Flexible).unwrap(),
        ],
        1.0, 0.0,
    ).unwrap();
    let mix = Mixture::new(
        vec![Monomer::new(1.0), Monomer::new(1.2)],
        vec![chain],
        Vec::new(),
        nd::array![[0.0, 0.8], [0.8, 0.0]],
        Ensemble::Canonical,
    ).unwrap();
    let mut ctx = SolverContext::new(mix, grid(), basis()).unwrap();
    let g = grid();
    let omega = vec![
        cosine_field(&g, 0.4, 0.1),
        cosine_field(&g, -0.4, 0.1),
    ];
    let out = ctx.evaluate(&omega).unwrap();
    let total = out.rho[0][0] + out.rho[1][0];
    assert!((total.re - 1.0).abs() < 1e-10);
    assert!(total.im.abs() < 1e-12);
}

#[test]
fn uniform_field_stress_vanishes() {
    // only the zero-wavevector mode is populated and its dksq/dL is zero
    let mut ctx = SolverContext::new(
        homopolymer(BlockKind::Flexible, Ensemble::Canonical),
        grid(), basis(),
    ).unwrap();
    let mut omega = vec![nd::Array1::zeros(ctx.grid().n_grid())];
    omega[0][0] = C64::from(0.25);
    ctx.evaluate(&omega).unwrap();
    let dksq: Vec<nd::Array1<f64>>
        = (0..3).map(|ax| ctx.grid().dksq_dl(ax)).collect();
    let stress = ctx.stress(&dksq).unwrap();
    assert_eq!(stress.len(), 3);
    for s in stress {
        assert!(s.abs() < 1e-12);
    }
}

#[test]
fn grand_canonical_fraction_recomputed() {
    // mu = 0 and zero field give Q = 1, so the recomputed fraction is 1
    let mut ctx = SolverContext::new(
        homopolymer(BlockKind::Flexible, Ensemble::GrandCanonical),
        grid(), basis(),
    ).unwrap();
    let omega = vec![nd::Array1::zeros(ctx.grid().n_grid())];
    let out = ctx.evaluate(&omega).unwrap();
    assert!((out.phi_chain[0] - 1.0).abs() < 1e-12);
    assert!((out.rho[0][0].re - 1.0).abs() < 1e-12);
}

#[test]
fn zero_field_free_energy_is_homogeneous() {
    let mut ctx = SolverContext::new(
        homopolymer(BlockKind::Flexible, Ensemble::Canonical),
        grid(), basis(),
    ).unwrap();
    let omega = vec![nd::Array1::zeros(ctx.grid().n_grid())];
    ctx.evaluate(&omega).unwrap();
    let (f, pressure) = ctx.free_energy(true).unwrap();
    let fh = thermo::fh_homogeneous(ctx.mixture(), &[1.0], &[]);
    assert!((f - fh).abs() < 1e-12);
    // phi = 1, Q = 1: mu = 0, so p = -f
    assert!((pressure.unwrap() + f).abs() < 1e-12);
}
