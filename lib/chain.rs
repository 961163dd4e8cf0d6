//! Chain topology: monomer types, blocks, chain and solvent species, and the
//! mixture record consumed by the solver.
//!
//! All topology is validated once at construction time and is immutable for
//! the duration of a solve; violated discretization constraints (odd step
//! counts, too few steps for the semiflexible corrector) are configuration
//! errors, not recoverable conditions.

use ndarray as nd;
use crate::error::ScfError;

pub type ChainResult<T> = Result<T, ScfError>;

/// A chemical monomer type with an associated statistical segment (Kuhn)
/// length.
///
/// For semiflexible blocks the same length parameter plays the role of the
/// persistence length in the rotational-diffusion operator.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Monomer {
    /// Statistical segment length, in units of the reference length.
    pub kuhn: f64,
}

impl Monomer {
    pub fn new(kuhn: f64) -> Self { Self { kuhn } }
}

/// Conformational statistics of a single block.
///
/// This is a closed set: every block is one of these two kinds, and each kind
/// carries its own contour-stepping rule in [`crate::propagator`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Ideal random walk; scalar propagator obeying a diffusion-type
    /// equation, advanced by the split-operator pseudo-spectral step.
    Flexible,
    /// Wormlike segment; orientation-dependent propagator carried as an
    /// angular-spectral vector, advanced by the multistep angular scheme.
    Semiflexible,
}

/// One block of a chain species.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Block {
    /// Monomer type index into the mixture's monomer list.
    pub monomer: usize,
    /// Contour length, in units of the reference length.
    pub length: f64,
    /// Number of contour steps; must be even, and at least 4 for
    /// semiflexible blocks.
    pub ns: usize,
    /// Conformational statistics.
    pub kind: BlockKind,
}

impl Block {
    pub fn new(monomer: usize, length: f64, ns: usize, kind: BlockKind)
        -> ChainResult<Self>
    {
        ScfError::check_block_steps(ns)?;
        if kind == BlockKind::Semiflexible {
            ScfError::check_semiflex_steps(ns)?;
        }
        if !(length > 0.0) {
            return Err(ScfError::BadBlockLength(length));
        }
        Ok(Self { monomer, length, ns, kind })
    }

    /// Contour step size.
    pub fn ds(&self) -> f64 { self.length / self.ns as f64 }
}

/// A chain species: an ordered sequence of blocks with an overall volume
/// fraction (canonical ensemble) or chemical potential (grand-canonical).
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    pub blocks: Vec<Block>,
    /// Species volume fraction; input in canonical mode, output in
    /// grand-canonical mode.
    pub phi: f64,
    /// Species chemical potential; output in canonical mode, input in
    /// grand-canonical mode.
    pub mu: f64,
}

impl Chain {
    pub fn new(blocks: Vec<Block>, phi: f64, mu: f64) -> ChainResult<Self> {
        if blocks.is_empty() { return Err(ScfError::EmptyChain); }
        Ok(Self { blocks, phi, mu })
    }

    /// Total contour length of the chain.
    pub fn length(&self) -> f64 {
        self.blocks.iter().map(|b| b.length).sum()
    }

    /// Fraction of the chain's contour occupied by blocks of a given monomer
    /// type.
    pub fn monomer_fraction(&self, monomer: usize) -> f64 {
        self.blocks.iter()
            .filter(|b| b.monomer == monomer)
            .map(|b| b.length)
            .sum::<f64>()
            / self.length()
    }
}

/// A point-like solvent species: a monomer type and a molecular volume
/// relative to the reference volume. Contributes a Boltzmann-weighted
/// density with no contour integration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Solvent {
    pub monomer: usize,
    /// Molecular volume relative to the reference volume.
    pub size: f64,
    pub phi: f64,
    pub mu: f64,
}

impl Solvent {
    pub fn new(monomer: usize, size: f64, phi: f64, mu: f64) -> Self {
        Self { monomer, size, phi, mu }
    }
}

/// Statistical ensemble for a solve; selects which of volume fraction and
/// chemical potential is the externally fixed quantity for every species.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ensemble {
    /// Species volume fractions fixed; chemical potentials are outputs.
    Canonical,
    /// Species chemical potentials fixed; volume fractions are outputs.
    GrandCanonical,
}

/// The full mixture: the read-only chain-topology registry view consumed by
/// the solver during a solve.
#[derive(Clone, Debug)]
pub struct Mixture {
    pub monomers: Vec<Monomer>,
    pub chains: Vec<Chain>,
    pub solvents: Vec<Solvent>,
    /// Flory-Huggins interaction matrix, symmetric, one row/column per
    /// monomer type.
    pub chi: nd::Array2<f64>,
    pub ensemble: Ensemble,
}

impl Mixture {
    /// Create a new `Mixture`, validating monomer references, block
    /// discretizations, and the chi matrix.
    pub fn new(
        monomers: Vec<Monomer>,
        chains: Vec<Chain>,
        solvents: Vec<Solvent>,
        chi: nd::Array2<f64>,
        ensemble: Ensemble,
    ) -> ChainResult<Self> {
        let new = Self { monomers, chains, solvents, chi, ensemble };
        new.validate()?;
        Ok(new)
    }

    /// Check every construction-time invariant: chi matrix shape and
    /// symmetry, monomer index ranges, and block discretizations.
    ///
    /// The fields are public, so a mixture assembled by struct literal can
    /// skip [`new`][Self::new]; consumers that accept a mixture from outside
    /// re-run this before touching the topology.
    pub fn validate(&self) -> ChainResult<()> {
        let nm = self.monomers.len();
        let (rows, cols) = self.chi.dim();
        if rows != nm || cols != nm {
            return Err(ScfError::ChiShape { expected: nm, rows, cols });
        }
        for i in 0..nm {
            for j in i + 1..nm {
                if (self.chi[[i, j]] - self.chi[[j, i]]).abs() > 1e-12 {
                    return Err(ScfError::ChiAsymmetric(i, j));
                }
            }
        }
        for chain in self.chains.iter() {
            if chain.blocks.is_empty() { return Err(ScfError::EmptyChain); }
            for block in chain.blocks.iter() {
                ScfError::check_monomer(block.monomer, nm)?;
                ScfError::check_block_steps(block.ns)?;
                if block.kind == BlockKind::Semiflexible {
                    ScfError::check_semiflex_steps(block.ns)?;
                }
                if !(block.length > 0.0) {
                    return Err(ScfError::BadBlockLength(block.length));
                }
            }
        }
        for solvent in self.solvents.iter() {
            ScfError::check_monomer(solvent.monomer, nm)?;
        }
        Ok(())
    }

    /// Number of monomer types.
    pub fn n_monomers(&self) -> usize { self.monomers.len() }

    /// Overall mean volume fraction of a monomer type, using the species'
    /// current `phi` values.
    pub fn mean_fraction(&self, monomer: usize) -> f64 {
        let from_chains: f64
            = self.chains.iter()
            .map(|c| c.phi * c.monomer_fraction(monomer))
            .sum();
        let from_solvents: f64
            = self.solvents.iter()
            .filter(|s| s.monomer == monomer)
            .map(|s| s.phi)
            .sum();
        from_chains + from_solvents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chi2() -> nd::Array2<f64> {
        nd::array![[0.0, 1.2], [1.2, 0.0]]
    }

    #[test]
    fn block_rejects_odd_steps() {
        assert!(Block::new(0, 1.0, 5, BlockKind::Flexible).is_err());
        assert!(Block::new(0, 1.0, 6, BlockKind::Flexible).is_ok());
    }

    #[test]
    fn block_rejects_coarse_semiflex() {
        assert!(Block::new(0, 1.0, 2, BlockKind::Semiflexible).is_err());
        assert!(Block::new(0, 1.0, 4, BlockKind::Semiflexible).is_ok());
    }

    #[test]
    fn mixture_rejects_bad_monomer_index() {
        let blocks = vec![Block::new(2, 1.0, 4, BlockKind::Flexible).unwrap()];
        let chain = Chain::new(blocks, 1.0, 0.0).unwrap();
        let res = Mixture::new(
            vec![Monomer::new(1.0), Monomer::new(1.0)],
            vec![chain],
            Vec::new(),
            chi2(),
            Ensemble::Canonical,
        );
        assert!(matches!(res, Err(ScfError::MonomerIndex { index: 2, .. })));
    }

    #[test]
    fn mixture_rejects_asymmetric_chi() {
        let chi = nd::array![[0.0, 1.0], [2.0, 0.0]];
        let res = Mixture::new(
            vec![Monomer::new(1.0), Monomer::new(1.0)],
            Vec::new(),
            Vec::new(),
            chi,
            Ensemble::Canonical,
        );
        assert!(matches!(res, Err(ScfError::ChiAsymmetric(0, 1))));
    }

    #[test]
    fn validate_catches_mutated_topology() {
        let blocks = vec![Block::new(0, 1.0, 4, BlockKind::Flexible).unwrap()];
        let chain = Chain::new(blocks, 1.0, 0.0).unwrap();
        let mix = Mixture::new(
            vec![Monomer::new(1.0), Monomer::new(1.0)],
            vec![chain],
            Vec::new(),
            chi2(),
            Ensemble::Canonical,
        ).unwrap();
        assert!(mix.validate().is_ok());
        let mut bad = mix.clone();
        bad.chains[0].blocks[0].ns = 3;
        assert!(matches!(bad.validate(), Err(ScfError::OddBlockSteps(3))));
        let mut bad = mix;
        bad.chains[0].blocks[0].length = 0.0;
        assert!(matches!(bad.validate(), Err(ScfError::BadBlockLength(_))));
    }

    #[test]
    fn monomer_fractions() {
        let blocks = vec![
            Block::new(0, 0.25, 4, BlockKind::Flexible).unwrap(),
            Block::new(1, 0.75, 8, BlockKind::Flexible).unwrap(),
        ];
        let chain = Chain::new(blocks, 0.8, 0.0).unwrap();
        assert!((chain.length() - 1.0).abs() < 1e-15);
        assert!((chain.monomer_fraction(0) - 0.25).abs() < 1e-15);
        let mix = Mixture::new(
            vec![Monomer::new(1.0), Monomer::new(1.0)],
            vec![chain],
            vec![Solvent::new(0, 1.0, 0.2, 0.0)],
            chi2(),
            Ensemble::Canonical,
        ).unwrap();
        assert!((mix.mean_fraction(0) - 0.4).abs() < 1e-15);
        assert!((mix.mean_fraction(1) - 0.6).abs() < 1e-15);
    }
}
