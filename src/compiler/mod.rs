//! Compiler passes and pipelines.
//!
//! A pass consumes a [`Specification`] and returns a new one accepting the
//! same witnesses, with some pending queries taken over by new columns,
//! coins, queries and actions. The standard commitment pipeline lowers
//! every query down to one univariate evaluation per round structure and
//! then hands the committed columns to Vortex:
//!
//! | Order | Pass | Takes over |
//! |-------|------|------------|
//! | 1 | [`RangeLowering`] | range checks (as lookups) |
//! | 2 | [`PermutationLowering`] | permutations |
//! | 3 | [`LookupLowering`] | inclusions |
//! | 4 | [`InnerProductLowering`] | inner products |
//! | 5 | [`LocalLowering`] | local constraints |
//! | 6 | [`GlobalLowering`] | global constraints |
//! | 7 | [`OpeningLowering`] | local openings |
//! | 8 | [`MultiPointReduction`] | univariate evaluations |
//! | 9 | [`VortexCompiler`] | committed columns and the final evaluation |
//!
//! Self-recursion appends, per level, [`SelfRecursionCompiler`], the
//! lowering passes and a fresh [`VortexCompiler`].

use tracing::{debug, info, instrument};

use crate::iop::{DefinitionError, Specification};
use crate::params::{CompilerParams, ParamsError};

pub mod actions;
pub mod dummy;
pub mod global;
pub mod inner_product;
pub mod local;
pub mod lookup;
pub mod mpts;
pub mod opening;
pub mod permutation;
pub mod range;
pub mod selfrecursion;
pub mod vortex;

pub use actions::{ProverAction, VerifierAction};
pub use dummy::DummyCompiler;
pub use global::GlobalLowering;
pub use inner_product::InnerProductLowering;
pub use local::LocalLowering;
pub use lookup::LookupLowering;
pub use mpts::MultiPointReduction;
pub use opening::OpeningLowering;
pub use permutation::PermutationLowering;
pub use range::RangeLowering;
pub use selfrecursion::SelfRecursionCompiler;
pub use vortex::VortexCompiler;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileErrorKind {
    #[error("unsupported {0} query")]
    Unsupported(&'static str),
    #[error("irregular dimensions: {0}")]
    IrregularDimensions(String),
    #[error("column `{0}` is outside the committed set")]
    OutsideCommittedSet(String),
    #[error("precondition not met: {0}")]
    Precondition(String),
    #[error("compiled protocol needs {rounds} rounds, budget is {budget}")]
    RoundBudget { rounds: usize, budget: usize },
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Params(#[from] ParamsError),
}

/// Failure of one pass; aborts the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pass `{pass}` failed{}: {kind}", query_suffix(.query))]
pub struct CompileError {
    pub pass: String,
    pub query: Option<String>,
    pub kind: CompileErrorKind,
}

fn query_suffix(query: &Option<String>) -> String {
    query
        .as_ref()
        .map(|name| format!(" on query `{name}`"))
        .unwrap_or_default()
}

impl CompileError {
    pub fn new(pass: &str, kind: impl Into<CompileErrorKind>) -> Self {
        Self {
            pass: pass.to_owned(),
            query: None,
            kind: kind.into(),
        }
    }

    pub fn on_query(pass: &str, query: &str, kind: impl Into<CompileErrorKind>) -> Self {
        Self {
            pass: pass.to_owned(),
            query: Some(query.to_owned()),
            kind: kind.into(),
        }
    }
}

/// A semantics-preserving transformation of a specification.
pub trait CompilerPass: Send + Sync {
    fn name(&self) -> &'static str;

    fn compile(&self, spec: Specification) -> Result<Specification, CompileError>;
}

/// Ordered list of passes applied under one parameter set.
pub struct Pipeline {
    params: CompilerParams,
    passes: Vec<Box<dyn CompilerPass>>,
}

impl core::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pipeline")
            .field("params", &self.params)
            .field("passes", &self.pass_names())
            .finish()
    }
}

impl Pipeline {
    pub fn new(params: CompilerParams) -> Self {
        Self {
            params,
            passes: Vec::new(),
        }
    }

    pub fn then(mut self, pass: impl CompilerPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Plaintext pipeline: every query is checked by the verifier on
    /// columns sent in the clear.
    pub fn dummy(params: CompilerParams) -> Self {
        Self::new(params).then(DummyCompiler)
    }

    fn lowering(self) -> Self {
        self.then(RangeLowering)
            .then(PermutationLowering)
            .then(LookupLowering)
            .then(InnerProductLowering)
            .then(LocalLowering)
            .then(GlobalLowering)
            .then(OpeningLowering)
            .then(MultiPointReduction)
    }

    /// Lowering passes followed by one Vortex commitment.
    pub fn commitment(params: CompilerParams) -> Self {
        let vortex = VortexCompiler::new(&params);
        Self::new(params).lowering().then(vortex)
    }

    /// Commitment pipeline followed by `self_recursion_levels` rounds of
    /// self-recursion, each closed by a fresh Vortex instance.
    pub fn self_recursive(params: CompilerParams) -> Self {
        let levels = params.self_recursion_levels();
        let mut pipeline = Self::commitment(params);
        for _ in 0..levels {
            let vortex = VortexCompiler::new(&pipeline.params);
            pipeline = pipeline.then(SelfRecursionCompiler).lowering().then(vortex);
        }
        pipeline
    }

    pub fn params(&self) -> &CompilerParams {
        &self.params
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Applies every pass in order. The input is left untouched.
    #[instrument(level = "debug", skip_all, fields(passes = self.passes.len()))]
    pub fn compile(&self, spec: &Specification) -> Result<Specification, CompileError> {
        let mut current = spec.clone();
        current.params_hash = self.params.params_hash();
        current.cell_limit = Some(self.params.max_committed_cells());
        let budget = self.params.round_budget();
        for pass in &self.passes {
            current = pass.compile(current)?;
            current.passes.push(pass.name().to_owned());
            let rounds = current.num_rounds();
            debug!(
                pass = pass.name(),
                rounds,
                columns = current.columns().len(),
                queries = current.queries().len(),
                "pass applied"
            );
            if rounds > budget {
                return Err(CompileError::new(
                    pass.name(),
                    CompileErrorKind::RoundBudget { rounds, budget },
                ));
            }
        }
        info!(
            rounds = current.num_rounds(),
            columns = current.columns().len(),
            pending = current.pending_queries().len(),
            "pipeline compiled"
        );
        Ok(current)
    }
}
