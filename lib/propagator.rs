//! Chain-propagator engine: contour stepping for flexible and semiflexible
//! blocks and the single-chain partition function.
//!
//! For a flexible block the propagator obeys the modified diffusion equation
//! and is advanced with the split-operator pseudo-spectral step
//! ```text
//! q(s + δs) = exp(-w δs/2) F⁻¹[ exp(-(b²/6) k² δs) F[ exp(-w δs/2) q(s) ] ]
//! ```
//! with the two exponential factors precomputed once per block. For a
//! semiflexible block the propagator carries an angular-spectral vector per
//! grid point; the first two steps of each block use a first-order explicit
//! update (no multistep history exists yet) and all later steps use the
//! semi-implicit third-order backward-difference (BDF3) update, implicit in
//! the diagonal rotational-diffusion operator and explicit in a third-order
//! extrapolation of the potential term.
//!
//! Contour stepping is strictly sequential within a block (and across the
//! blocks of one chain); only the spatial grid dimension is data-parallel.
//! The forward and backward passes are fully independent and share no
//! intermediate state.

use ndarray as nd;
use crate::{
    Arr1,
    angular::{ AngularBasis, Direction },
    chain::{ Block, BlockKind, Chain, Monomer },
    error::ScfError,
    grid::GridTransform,
    utils::grid_mean,
};

pub type PropResult<T> = Result<T, ScfError>;

/// Contour-resolved propagator of one block, one direction.
///
/// Row `s` holds the propagator at local contour point `s` of the block
/// (`0 ..= ns`), in the chain's own contour orientation for both directions;
/// the backward propagator's row `s` is the statistical weight accumulated
/// from the chain tail down to that contour point.
#[derive(Clone, Debug)]
pub enum BlockProp {
    /// Scalar field per contour point; shape `(ns + 1, n_grid)`.
    Flexible(nd::Array2<f64>),
    /// Angular-spectral coefficients per contour point; shape
    /// `(ns + 1, n_grid, n_sph)`.
    Semiflexible(nd::Array3<f64>),
}

impl BlockProp {
    /// Number of contour steps covered by this block.
    pub fn ns(&self) -> usize {
        match self {
            Self::Flexible(rows) => rows.nrows() - 1,
            Self::Semiflexible(rows) => rows.shape()[0] - 1,
        }
    }

    /// Scalar (isotropically projected) field at local contour point `s`.
    pub fn scalar_row(&self, s: usize, basis: &AngularBasis)
        -> nd::Array1<f64>
    {
        match self {
            Self::Flexible(rows) => rows.row(s).to_owned(),
            Self::Semiflexible(rows) => {
                basis.isotropic(&rows.index_axis(nd::Axis(0), s))
            },
        }
    }
}

/// Forward and backward propagators of one chain species, plus its partition
/// function; the product of one `evaluate` call, resident until the next.
#[derive(Clone, Debug)]
pub struct ChainProp {
    /// Per-block forward propagators, in block order.
    pub forward: Vec<BlockProp>,
    /// Per-block backward propagators, in block order.
    pub backward: Vec<BlockProp>,
    /// Single-chain partition function.
    pub q: f64,
}

// propagator state carried across a block junction; the angular conversion
// happens lazily, only when adjacent blocks differ in kind
enum Carry {
    Scalar(nd::Array1<f64>),
    Angular(nd::Array2<f64>),
}

impl Carry {
    fn into_scalar(self, basis: &AngularBasis) -> nd::Array1<f64> {
        match self {
            Self::Scalar(q) => q,
            Self::Angular(a) => basis.isotropic(&a),
        }
    }

    fn into_angular(self, basis: &AngularBasis) -> nd::Array2<f64> {
        match self {
            Self::Scalar(q) => basis.broadcast(&q),
            Self::Angular(a) => a,
        }
    }
}

// per-block split-operator factors; reused across all contour steps of the
// block
struct FlexOp {
    // exp(-w δs/2) on the real grid
    expw: nd::Array1<f64>,
    // exp(-(b²/6) k² δs) on the Fourier grid
    expk: nd::Array1<f64>,
}

fn flex_op<G, S>(grid: &G, w: &Arr1<S>, kuhn: f64, ds: f64) -> FlexOp
where
    G: GridTransform,
    S: nd::Data<Elem = f64>,
{
    let expw = w.mapv(|wk| (-0.5 * ds * wk).exp());
    let diff = kuhn.powi(2) / 6.0 * ds;
    let expk = grid.ksq().mapv(|k2| (-diff * k2).exp());
    FlexOp { expw, expk }
}

fn flex_step<G, S>(grid: &G, op: &FlexOp, q: &Arr1<S>) -> nd::Array1<f64>
where
    G: GridTransform,
    S: nd::Data<Elem = f64>,
{
    let mut qr: nd::Array1<f64> = nd::Array1::zeros(q.len());
    nd::Zip::from(&mut qr).and(q).and(&op.expw)
        .par_for_each(|qrk, &qk, &ek| { *qrk = qk * ek; });
    let mut qk = grid.forward(&qr);
    nd::Zip::from(&mut qk).and(&op.expk)
        .par_for_each(|qkk, &ek| { *qkk *= ek; });
    let mut out = grid.inverse(&qk);
    nd::Zip::from(&mut out).and(&op.expw)
        .par_for_each(|ok, &ek| { *ok *= ek; });
    out
}

// apply the potential operator to an angular-spectral state: synthesize
// angular-grid values, scale by the local potential, analyze back; the
// direction selects the transform sign convention
fn wterm<S, T>(
    basis: &AngularBasis,
    dir: Direction,
    w: &Arr1<S>,
    a: &crate::Arr2<T>,
) -> nd::Array2<f64>
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
{
    let mut g = basis.to_grid(a, dir);
    nd::Zip::from(g.rows_mut()).and(w)
        .par_for_each(|mut row, &wr| { row *= wr; });
    basis.to_coeffs(&g, dir)
}

// first-order explicit start-up step
fn semiflex_euler<S>(
    basis: &AngularBasis,
    dir: Direction,
    w: &Arr1<S>,
    rot_rate: f64,
    ds: f64,
    a: &nd::Array2<f64>,
) -> nd::Array2<f64>
where S: nd::Data<Elem = f64>
{
    let wa = wterm(basis, dir, w, a);
    let decay: nd::Array1<f64>
        = basis.rot().mapv(|rl| 1.0 - ds * rot_rate * rl);
    a * &decay - ds * &wa
}

// semi-implicit BDF3 step: implicit rotational diffusion, explicit
// third-order extrapolation of the potential term
fn semiflex_bdf3<S>(
    basis: &AngularBasis,
    dir: Direction,
    w: &Arr1<S>,
    rot_rate: f64,
    ds: f64,
    an: &nd::Array2<f64>,
    anm1: &nd::Array2<f64>,
    anm2: &nd::Array2<f64>,
) -> nd::Array2<f64>
where S: nd::Data<Elem = f64>
{
    let aext = 3.0 * an - 3.0 * anm1 + anm2;
    let wa = wterm(basis, dir, w, &aext);
    let rhs = 3.0 * an - 1.5 * anm1 + anm2 / 3.0 - ds * &wa;
    let denom: nd::Array1<f64>
        = basis.rot().mapv(|rl| 11.0 / 6.0 + ds * rot_rate * rl);
    rhs / &denom
}

fn flex_block<G>(
    grid: &G,
    op: &FlexOp,
    q0: nd::Array1<f64>,
    ns: usize,
    dir: Direction,
) -> nd::Array2<f64>
where G: GridTransform
{
    let n = q0.len();
    let mut rows: nd::Array2<f64> = nd::Array2::zeros((ns + 1, n));
    let mut q = q0;
    let order: Box<dyn Iterator<Item = usize>> = match dir {
        Direction::Forward => Box::new(0..=ns),
        Direction::Backward => Box::new((0..=ns).rev()),
    };
    for (k, s) in order.enumerate() {
        if k > 0 { q = flex_step(grid, op, &q); }
        rows.row_mut(s).assign(&q);
    }
    rows
}

fn semiflex_block<S>(
    basis: &AngularBasis,
    w: &Arr1<S>,
    kuhn: f64,
    ds: f64,
    ns: usize,
    a0: nd::Array2<f64>,
    dir: Direction,
) -> nd::Array3<f64>
where S: nd::Data<Elem = f64>
{
    let (n, n_sph) = a0.dim();
    // the segment length parametrizes the rotational relaxation rate
    let rot_rate = 1.0 / (2.0 * kuhn);
    let mut rows: nd::Array3<f64> = nd::Array3::zeros((ns + 1, n, n_sph));
    // multistep history, local to this block: restarts at every kind
    // transition; anm2 is overwritten twice before the first BDF3 read
    let mut anm2: nd::Array2<f64> = a0.clone();
    let mut anm1: nd::Array2<f64> = a0.clone();
    let mut an: nd::Array2<f64> = a0;
    let row_of = |k: usize| -> usize {
        match dir {
            Direction::Forward => k,
            Direction::Backward => ns - k,
        }
    };
    rows.index_axis_mut(nd::Axis(0), row_of(0)).assign(&an);
    for k in 1..=ns {
        let next = if k <= 2 {
            semiflex_euler(basis, dir, w, rot_rate, ds, &an)
        } else {
            semiflex_bdf3(basis, dir, w, rot_rate, ds, &an, &anm1, &anm2)
        };
        anm2 = anm1;
        anm1 = an;
        an = next;
        rows.index_axis_mut(nd::Axis(0), row_of(k)).assign(&an);
    }
    rows
}

fn propagate<G>(
    grid: &G,
    basis: &AngularBasis,
    monomers: &[Monomer],
    chain: &Chain,
    w: &[nd::Array1<f64>],
    dir: Direction,
) -> PropResult<Vec<BlockProp>>
where G: GridTransform
{
    let n = grid.n_grid();
    let block_order: Vec<&Block> = match dir {
        Direction::Forward => chain.blocks.iter().collect(),
        Direction::Backward => chain.blocks.iter().rev().collect(),
    };
    let mut props: Vec<BlockProp> = Vec::with_capacity(chain.blocks.len());
    let mut carry = Carry::Scalar(nd::Array1::ones(n));
    for block in block_order {
        ScfError::check_monomer(block.monomer, monomers.len())?;
        let kuhn = monomers[block.monomer].kuhn;
        let wb = &w[block.monomer];
        ScfError::check_field_len(n, wb.len())?;
        let ds = block.ds();
        match block.kind {
            BlockKind::Flexible => {
                let op = flex_op(grid, wb, kuhn, ds);
                let q0 = carry.into_scalar(basis);
                let rows = flex_block(grid, &op, q0, block.ns, dir);
                let last = match dir {
                    Direction::Forward => rows.row(block.ns).to_owned(),
                    Direction::Backward => rows.row(0).to_owned(),
                };
                carry = Carry::Scalar(last);
                props.push(BlockProp::Flexible(rows));
            },
            BlockKind::Semiflexible => {
                let a0 = carry.into_angular(basis);
                let rows
                    = semiflex_block(basis, wb, kuhn, ds, block.ns, a0, dir);
                let last_row = match dir {
                    Direction::Forward => block.ns,
                    Direction::Backward => 0,
                };
                let last
                    = rows.index_axis(nd::Axis(0), last_row).to_owned();
                carry = Carry::Angular(last);
                props.push(BlockProp::Semiflexible(rows));
            },
        }
    }
    if dir == Direction::Backward { props.reverse(); }
    Ok(props)
}

// grid (and, for a semiflexible terminus, angular-projected) average of the
// forward propagator's terminal contour value
fn partition(basis: &AngularBasis, forward: &[BlockProp]) -> f64 {
    let last = forward.last().unwrap();
    let terminal = last.scalar_row(last.ns(), basis);
    grid_mean(&terminal)
}

/// Compute forward and backward propagators and the partition function for
/// one chain species under the per-monomer potential grids `w`.
///
/// Both directions start from a uniform initial condition; the partition
/// function is only computed after both passes complete.
pub fn solve_chain<G>(
    grid: &G,
    basis: &AngularBasis,
    monomers: &[Monomer],
    chain: &Chain,
    w: &[nd::Array1<f64>],
) -> PropResult<ChainProp>
where G: GridTransform
{
    ScfError::check_field_count(monomers.len(), w.len())?;
    let forward
        = propagate(grid, basis, monomers, chain, w, Direction::Forward)?;
    let backward
        = propagate(grid, basis, monomers, chain, w, Direction::Backward)?;
    let q = partition(basis, &forward);
    Ok(ChainProp { forward, backward, q })
}
