//! JSON persistence of compiled specifications.
//!
//! Actions registered by one pass instance share a context, and passes may
//! re-point actions of earlier passes at a new context. The document keeps
//! that sharing explicit: every distinct context and precomputed vector is
//! written once into an identity table under the id of its first visit, and
//! actions refer to it by id. Loading hands out clones of one `Arc` per id.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::coin::{CoinInfo, CoinRegistry};
use super::column::{ColumnInfo, ColumnRegistry, VerifierColumn};
use super::errors::DefinitionError;
use super::ids::{ColumnId, QueryId};
use super::query::{QueryInfo, QueryRegistry};
use super::specification::{DigestSlot, Specification};
use crate::compiler::actions::{ProverAction, VerifierAction};
use crate::compiler::global::GlobalCtx;
use crate::compiler::inner_product::InnerProductCtx;
use crate::compiler::local::LocalCtx;
use crate::compiler::lookup::LookupCtx;
use crate::compiler::mpts::MptsCtx;
use crate::compiler::opening::OpeningCtx;
use crate::compiler::permutation::PermutationCtx;
use crate::compiler::selfrecursion::SelfRecursionCtx;
use crate::compiler::vortex::VortexCtx;
use crate::field::FieldElement;

/// Layout version of the persisted document.
pub const PERSIST_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("unsupported document version {found}, expected {PERSIST_VERSION}")]
    Version { found: u32 },
    #[error("identity table has no {table} entry {id}")]
    Dangling { table: &'static str, id: usize },
    #[error("entry {id} of the identity table is not a {expected} context")]
    ContextKind { id: usize, expected: &'static str },
    #[error("round tables disagree: {prover} prover rounds, {verifier} verifier rounds")]
    Rounds { prover: usize, verifier: usize },
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum StoredContext {
    Permutation(PermutationCtx),
    Lookup(LookupCtx),
    InnerProduct(InnerProductCtx),
    Local(LocalCtx),
    Global(GlobalCtx),
    Opening(OpeningCtx),
    Mpts(MptsCtx),
    Vortex(VortexCtx),
    SelfRecursion(SelfRecursionCtx),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum StoredProverAction {
    PermutationProducts(usize),
    LookupMultiplicities(usize),
    LookupSums(usize),
    InnerProductSums(usize),
    GlobalQuotient(usize),
    MptsQuotient(usize),
    VortexCommit { ctx: usize, matrix: usize },
    VortexSplit(usize),
    VortexCombine(usize),
    VortexOpen(usize),
    SelfRecursionTrace(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum StoredVerifierAction {
    Plaintext(QueryId),
    PermutationProduct(usize),
    LookupSum(usize),
    InnerProductResult(usize),
    LocalConstraint(usize),
    GlobalIdentity(usize),
    OpeningConsistency(usize),
    MptsCheck(usize),
    VortexPublicEvals(usize),
    VortexOpening(usize),
    SelfRecursionClaim(usize),
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    version: u32,
    columns: Vec<ColumnInfo>,
    coins: Vec<CoinInfo>,
    queries: Vec<QueryInfo>,
    slots: Vec<DigestSlot>,
    vectors: Vec<Vec<FieldElement>>,
    precomputed: Vec<(ColumnId, usize)>,
    verifier_columns: Vec<(ColumnId, VerifierColumn)>,
    contexts: Vec<StoredContext>,
    prover_actions: Vec<Vec<StoredProverAction>>,
    verifier_actions: Vec<Vec<StoredVerifierAction>>,
    frozen_rounds: usize,
    passes: Vec<String>,
    params_hash: [u8; 32],
    cell_limit: Option<u64>,
}

/// Assigns ids to shared objects in first-visit order.
struct Interner<T> {
    ids: BTreeMap<usize, usize>,
    entries: Vec<T>,
}

impl<T> Interner<T> {
    fn new() -> Self {
        Self {
            ids: BTreeMap::new(),
            entries: Vec::new(),
        }
    }

    fn intern<S>(&mut self, shared: &Arc<S>, store: impl FnOnce(&S) -> T) -> usize {
        let address = Arc::as_ptr(shared) as *const () as usize;
        if let Some(id) = self.ids.get(&address) {
            return *id;
        }
        let id = self.entries.len();
        self.entries.push(store(&**shared));
        self.ids.insert(address, id);
        id
    }
}

/// Serializes `spec` into a self-contained JSON document.
pub fn save(spec: &Specification) -> Result<String, PersistError> {
    let mut vectors: Interner<Vec<FieldElement>> = Interner::new();
    let precomputed = spec
        .precomputed
        .iter()
        .map(|(id, values)| (*id, vectors.intern(values, |values| values.clone())))
        .collect();

    let mut contexts: Interner<StoredContext> = Interner::new();
    let prover_actions = spec
        .prover_actions
        .iter()
        .map(|round| round.iter().map(|action| store_prover_action(&mut contexts, action)).collect())
        .collect();
    let verifier_actions = spec
        .verifier_actions
        .iter()
        .map(|round| round.iter().map(|action| store_verifier_action(&mut contexts, action)).collect())
        .collect();

    let document = Document {
        version: PERSIST_VERSION,
        columns: spec.columns.iter().map(|(_, info)| info.clone()).collect(),
        coins: spec.coins.iter().map(|(_, info)| info.clone()).collect(),
        queries: spec.queries.iter().map(|(_, info)| info.clone()).collect(),
        slots: spec.slots.clone(),
        vectors: vectors.entries,
        precomputed,
        verifier_columns: spec.verifier_columns.iter().map(|(id, recipe)| (*id, recipe.clone())).collect(),
        contexts: contexts.entries,
        prover_actions,
        verifier_actions,
        frozen_rounds: spec.frozen_rounds,
        passes: spec.passes.clone(),
        params_hash: spec.params_hash,
        cell_limit: spec.cell_limit,
    };
    debug!(
        contexts = document.contexts.len(),
        vectors = document.vectors.len(),
        "specification persisted"
    );
    Ok(serde_json::to_string(&document)?)
}

fn store_prover_action(contexts: &mut Interner<StoredContext>, action: &ProverAction) -> StoredProverAction {
    use StoredContext as C;
    use StoredProverAction as P;
    match action {
        ProverAction::PermutationProducts(ctx) => P::PermutationProducts(contexts.intern(ctx, |c| C::Permutation(c.clone()))),
        ProverAction::LookupMultiplicities(ctx) => P::LookupMultiplicities(contexts.intern(ctx, |c| C::Lookup(c.clone()))),
        ProverAction::LookupSums(ctx) => P::LookupSums(contexts.intern(ctx, |c| C::Lookup(c.clone()))),
        ProverAction::InnerProductSums(ctx) => P::InnerProductSums(contexts.intern(ctx, |c| C::InnerProduct(c.clone()))),
        ProverAction::GlobalQuotient(ctx) => P::GlobalQuotient(contexts.intern(ctx, |c| C::Global(c.clone()))),
        ProverAction::MptsQuotient(ctx) => P::MptsQuotient(contexts.intern(ctx, |c| C::Mpts(c.clone()))),
        ProverAction::VortexCommit { ctx, matrix } => P::VortexCommit {
            ctx: contexts.intern(ctx, |c| C::Vortex(c.clone())),
            matrix: *matrix,
        },
        ProverAction::VortexSplit(ctx) => P::VortexSplit(contexts.intern(ctx, |c| C::Vortex(c.clone()))),
        ProverAction::VortexCombine(ctx) => P::VortexCombine(contexts.intern(ctx, |c| C::Vortex(c.clone()))),
        ProverAction::VortexOpen(ctx) => P::VortexOpen(contexts.intern(ctx, |c| C::Vortex(c.clone()))),
        ProverAction::SelfRecursionTrace(ctx) => {
            P::SelfRecursionTrace(contexts.intern(ctx, |c| C::SelfRecursion(c.clone())))
        }
    }
}

fn store_verifier_action(contexts: &mut Interner<StoredContext>, action: &VerifierAction) -> StoredVerifierAction {
    use StoredContext as C;
    use StoredVerifierAction as V;
    match action {
        VerifierAction::Plaintext(id) => V::Plaintext(*id),
        VerifierAction::PermutationProduct(ctx) => V::PermutationProduct(contexts.intern(ctx, |c| C::Permutation(c.clone()))),
        VerifierAction::LookupSum(ctx) => V::LookupSum(contexts.intern(ctx, |c| C::Lookup(c.clone()))),
        VerifierAction::InnerProductResult(ctx) => V::InnerProductResult(contexts.intern(ctx, |c| C::InnerProduct(c.clone()))),
        VerifierAction::LocalConstraint(ctx) => V::LocalConstraint(contexts.intern(ctx, |c| C::Local(c.clone()))),
        VerifierAction::GlobalIdentity(ctx) => V::GlobalIdentity(contexts.intern(ctx, |c| C::Global(c.clone()))),
        VerifierAction::OpeningConsistency(ctx) => V::OpeningConsistency(contexts.intern(ctx, |c| C::Opening(c.clone()))),
        VerifierAction::MptsCheck(ctx) => V::MptsCheck(contexts.intern(ctx, |c| C::Mpts(c.clone()))),
        VerifierAction::VortexPublicEvals(ctx) => V::VortexPublicEvals(contexts.intern(ctx, |c| C::Vortex(c.clone()))),
        VerifierAction::VortexOpening(ctx) => V::VortexOpening(contexts.intern(ctx, |c| C::Vortex(c.clone()))),
        VerifierAction::SelfRecursionClaim(ctx) => {
            V::SelfRecursionClaim(contexts.intern(ctx, |c| C::SelfRecursion(c.clone())))
        }
    }
}

/// One `Arc` per identity-table entry.
enum SharedContext {
    Permutation(Arc<PermutationCtx>),
    Lookup(Arc<LookupCtx>),
    InnerProduct(Arc<InnerProductCtx>),
    Local(Arc<LocalCtx>),
    Global(Arc<GlobalCtx>),
    Opening(Arc<OpeningCtx>),
    Mpts(Arc<MptsCtx>),
    Vortex(Arc<VortexCtx>),
    SelfRecursion(Arc<SelfRecursionCtx>),
}

impl From<StoredContext> for SharedContext {
    fn from(stored: StoredContext) -> Self {
        match stored {
            StoredContext::Permutation(ctx) => SharedContext::Permutation(Arc::new(ctx)),
            StoredContext::Lookup(ctx) => SharedContext::Lookup(Arc::new(ctx)),
            StoredContext::InnerProduct(ctx) => SharedContext::InnerProduct(Arc::new(ctx)),
            StoredContext::Local(ctx) => SharedContext::Local(Arc::new(ctx)),
            StoredContext::Global(ctx) => SharedContext::Global(Arc::new(ctx)),
            StoredContext::Opening(ctx) => SharedContext::Opening(Arc::new(ctx)),
            StoredContext::Mpts(ctx) => SharedContext::Mpts(Arc::new(ctx)),
            StoredContext::Vortex(ctx) => SharedContext::Vortex(Arc::new(ctx)),
            StoredContext::SelfRecursion(ctx) => SharedContext::SelfRecursion(Arc::new(ctx)),
        }
    }
}

struct ContextTable(Vec<SharedContext>);

macro_rules! shared_accessor {
    ($method:ident, $variant:ident, $ty:ty, $label:literal) => {
        fn $method(&self, id: usize) -> Result<Arc<$ty>, PersistError> {
            match self.0.get(id) {
                Some(SharedContext::$variant(ctx)) => Ok(Arc::clone(ctx)),
                Some(_) => Err(PersistError::ContextKind { id, expected: $label }),
                None => Err(PersistError::Dangling { table: "context", id }),
            }
        }
    };
}

impl ContextTable {
    shared_accessor!(permutation, Permutation, PermutationCtx, "permutation");
    shared_accessor!(lookup, Lookup, LookupCtx, "lookup");
    shared_accessor!(inner_product, InnerProduct, InnerProductCtx, "inner-product");
    shared_accessor!(local, Local, LocalCtx, "local");
    shared_accessor!(global, Global, GlobalCtx, "global");
    shared_accessor!(opening, Opening, OpeningCtx, "opening");
    shared_accessor!(mpts, Mpts, MptsCtx, "mpts");
    shared_accessor!(vortex, Vortex, VortexCtx, "vortex");
    shared_accessor!(self_recursion, SelfRecursion, SelfRecursionCtx, "self-recursion");

    fn prover_action(&self, stored: &StoredProverAction) -> Result<ProverAction, PersistError> {
        use StoredProverAction as P;
        Ok(match stored {
            P::PermutationProducts(id) => ProverAction::PermutationProducts(self.permutation(*id)?),
            P::LookupMultiplicities(id) => ProverAction::LookupMultiplicities(self.lookup(*id)?),
            P::LookupSums(id) => ProverAction::LookupSums(self.lookup(*id)?),
            P::InnerProductSums(id) => ProverAction::InnerProductSums(self.inner_product(*id)?),
            P::GlobalQuotient(id) => ProverAction::GlobalQuotient(self.global(*id)?),
            P::MptsQuotient(id) => ProverAction::MptsQuotient(self.mpts(*id)?),
            P::VortexCommit { ctx, matrix } => ProverAction::VortexCommit {
                ctx: self.vortex(*ctx)?,
                matrix: *matrix,
            },
            P::VortexSplit(id) => ProverAction::VortexSplit(self.vortex(*id)?),
            P::VortexCombine(id) => ProverAction::VortexCombine(self.vortex(*id)?),
            P::VortexOpen(id) => ProverAction::VortexOpen(self.vortex(*id)?),
            P::SelfRecursionTrace(id) => ProverAction::SelfRecursionTrace(self.self_recursion(*id)?),
        })
    }

    fn verifier_action(&self, stored: &StoredVerifierAction) -> Result<VerifierAction, PersistError> {
        use StoredVerifierAction as V;
        Ok(match stored {
            V::Plaintext(id) => VerifierAction::Plaintext(*id),
            V::PermutationProduct(id) => VerifierAction::PermutationProduct(self.permutation(*id)?),
            V::LookupSum(id) => VerifierAction::LookupSum(self.lookup(*id)?),
            V::InnerProductResult(id) => VerifierAction::InnerProductResult(self.inner_product(*id)?),
            V::LocalConstraint(id) => VerifierAction::LocalConstraint(self.local(*id)?),
            V::GlobalIdentity(id) => VerifierAction::GlobalIdentity(self.global(*id)?),
            V::OpeningConsistency(id) => VerifierAction::OpeningConsistency(self.opening(*id)?),
            V::MptsCheck(id) => VerifierAction::MptsCheck(self.mpts(*id)?),
            V::VortexPublicEvals(id) => VerifierAction::VortexPublicEvals(self.vortex(*id)?),
            V::VortexOpening(id) => VerifierAction::VortexOpening(self.vortex(*id)?),
            V::SelfRecursionClaim(id) => VerifierAction::SelfRecursionClaim(self.self_recursion(*id)?),
        })
    }
}

/// Rebuilds a specification saved by [`save`], restoring shared contexts.
pub fn load(json: &str) -> Result<Specification, PersistError> {
    let document: Document = serde_json::from_str(json)?;
    if document.version != PERSIST_VERSION {
        return Err(PersistError::Version { found: document.version });
    }
    if document.prover_actions.len() != document.verifier_actions.len() {
        return Err(PersistError::Rounds {
            prover: document.prover_actions.len(),
            verifier: document.verifier_actions.len(),
        });
    }

    let mut columns = ColumnRegistry::default();
    for info in document.columns {
        columns.insert(info)?;
    }
    let mut coins = CoinRegistry::default();
    for info in document.coins {
        coins.insert(info)?;
    }
    let mut queries = QueryRegistry::default();
    for info in document.queries {
        queries.insert(info)?;
    }

    let vectors: Vec<Arc<Vec<FieldElement>>> = document.vectors.into_iter().map(Arc::new).collect();
    let mut precomputed = BTreeMap::new();
    for (column, id) in document.precomputed {
        let values = vectors.get(id).ok_or(PersistError::Dangling { table: "vector", id })?;
        precomputed.insert(column, Arc::clone(values));
    }

    let table = ContextTable(document.contexts.into_iter().map(SharedContext::from).collect());
    let prover_actions = document
        .prover_actions
        .iter()
        .map(|round| round.iter().map(|action| table.prover_action(action)).collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()?;
    let verifier_actions = document
        .verifier_actions
        .iter()
        .map(|round| round.iter().map(|action| table.verifier_action(action)).collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Specification {
        columns,
        coins,
        queries,
        slots: document.slots,
        precomputed,
        verifier_columns: document.verifier_columns.into_iter().collect(),
        prover_actions,
        verifier_actions,
        frozen_rounds: document.frozen_rounds,
        passes: document.passes,
        params_hash: document.params_hash,
        cell_limit: document.cell_limit,
    })
}
