use tracing::{debug, trace};

use super::VortexCtx;
use crate::fft;
use crate::field::polynomial::horner;
use crate::field::FieldElement;
use crate::iop::check::resolve_point;
use crate::merkle::{hasher_for, Digest, MerkleTree};
use crate::prover::{AssignmentError, ProverRuntime};
use crate::utils::{next_power_of_two, par_try_map};

/// Encoded rows of one committed round, kept by the prover until the
/// opening round.
#[derive(Debug, Clone)]
pub struct CommittedMatrix {
    /// One codeword of length `width * blowup` per matrix row.
    pub codewords: Vec<Vec<FieldElement>>,
    pub tree: MerkleTree,
}

impl CommittedMatrix {
    /// Symbols of every row at codeword position `position`.
    pub fn leaf(&self, position: usize) -> Vec<FieldElement> {
        self.codewords.iter().map(|codeword| codeword[position]).collect()
    }
}

impl VortexCtx {
    fn matrix<'r>(&self, rt: &'r ProverRuntime<'_>, index: usize) -> Result<&'r CommittedMatrix, AssignmentError> {
        rt.matrices.get(&(self.instance, index)).ok_or_else(|| {
            AssignmentError::action("vortex", format!("matrix {index} of `{}` was never committed", self.name))
        })
    }

    pub(crate) fn commit(&self, rt: &mut ProverRuntime<'_>, index: usize) -> Result<(), AssignmentError> {
        let matrix = self
            .matrices
            .get(index)
            .ok_or_else(|| AssignmentError::action("vortex", format!("`{}` has no matrix {index}", self.name)))?;
        let mut rows = Vec::with_capacity(matrix.columns.len());
        for column in &matrix.columns {
            rows.push(rt.column(*column)?);
        }
        let (width, blowup) = (self.width, self.blowup);
        let codewords: Vec<Vec<FieldElement>> =
            par_try_map(rt.parallel(), &rows, |row| -> Result<Vec<Vec<FieldElement>>, AssignmentError> {
                if row.len() <= width {
                    let extended = fft::extend(row, width)?;
                    return Ok(vec![fft::encode(&extended, blowup)?]);
                }
                let coefficients = fft::interpolate(row)?;
                coefficients
                    .chunks(width)
                    .map(|chunk| fft::evaluate(chunk, width * blowup).map_err(AssignmentError::from))
                    .collect()
            })?
            .into_iter()
            .flatten()
            .collect();

        let leaves: Vec<Vec<FieldElement>> = (0..self.codeword_len())
            .map(|position| codewords.iter().map(|codeword| codeword[position]).collect())
            .collect();
        let tree = MerkleTree::from_rows(hasher_for(self.hash), &leaves, rt.parallel())?;
        let root = tree.root();
        rt.set_digests(matrix.root, vec![root])?;
        debug!(
            name = %self.name,
            round = matrix.round,
            rows = codewords.len(),
            root = ?root,
            "matrix committed"
        );
        rt.matrices.insert((self.instance, index), CommittedMatrix { codewords, tree });
        Ok(())
    }

    /// Sends `C_k(x)` for every chunk of every split column.
    pub(crate) fn evaluate_chunks(&self, rt: &mut ProverRuntime<'_>) -> Result<(), AssignmentError> {
        let Some(split) = self.split else {
            return Ok(());
        };
        let spec = rt.spec();
        let x = resolve_point(spec, &self.point, &*rt).map_err(|failure| AssignmentError::QueryViolated {
            query: self.name.clone(),
            failure,
        })?;
        let mut evaluations = Vec::with_capacity(spec.columns().info(split).size);
        for (column, chunks) in self.columns() {
            if chunks == 1 {
                continue;
            }
            let coefficients = fft::interpolate(rt.column(column)?)?;
            evaluations.extend(coefficients.chunks(self.width).map(|chunk| horner(chunk, x)));
        }
        evaluations.resize(spec.columns().info(split).size, FieldElement::ZERO);
        rt.assign_derived(split, evaluations)
    }

    /// Sends `U = sum_g alpha^(W-1-g) C_g` over `H_s`.
    pub(crate) fn combine(&self, rt: &mut ProverRuntime<'_>) -> Result<(), AssignmentError> {
        let alpha = rt.field_coin(self.alpha)?;
        let mut combined = vec![FieldElement::ZERO; self.width];
        for index in 0..self.matrices.len() {
            let matrix = self.matrix(rt, index)?;
            for codeword in &matrix.codewords {
                // Message symbol i sits at codeword position i * b.
                for (i, acc) in combined.iter_mut().enumerate() {
                    *acc = *acc * alpha + codeword[i * self.blowup];
                }
            }
        }
        rt.assign_derived(self.u_alpha, combined)
    }

    /// Opens every matrix at the sampled positions.
    pub(crate) fn open(&self, rt: &mut ProverRuntime<'_>) -> Result<(), AssignmentError> {
        let spots = rt.integer_coin(self.spots)?.to_vec();
        let total = self.num_rows();
        let mut opened = Vec::with_capacity(next_power_of_two(spots.len() * total));
        let mut siblings: Vec<Digest> = Vec::with_capacity(spots.len() * self.matrices.len() * self.depth);
        for &spot in &spots {
            for index in 0..self.matrices.len() {
                let matrix = self.matrix(rt, index)?;
                opened.extend(matrix.leaf(spot));
                let path = matrix.tree.open(spot)?;
                siblings.extend(path.siblings);
            }
        }
        let opened_size = rt.spec().columns().info(self.opened).size;
        opened.resize(opened_size, FieldElement::ZERO);
        trace!(name = %self.name, spots = spots.len(), "spot checks opened");
        rt.assign_derived(self.opened, opened)?;
        rt.set_digests(self.paths, siblings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::vortex::contexts;
    use crate::compiler::{CompilerPass, ProverAction, VortexCompiler};
    use crate::iop::{Builder, Specification};
    use crate::params::{BuiltinProfile, CompilerParamsBuilder};
    use crate::proof::Proof;
    use crate::prover::{ProverOptions, RoundAssignment, Witness, WitnessSource};
    use crate::verifier::{verify, VerificationFailure};

    fn single_column(spot_checks: u32) -> Specification {
        let params = CompilerParamsBuilder::from_profile(BuiltinProfile::TEST_FAST)
            .spot_checks(spot_checks)
            .build()
            .unwrap();
        let spec = Builder::define(|b| {
            b.commit("a", 8)?;
            Ok(())
        })
        .unwrap();
        VortexCompiler::new(&params).compile(spec).unwrap()
    }

    /// Commits `a` with the symbol at `position` of its codeword bumped.
    fn commit_with_bad_symbol(ctx: &VortexCtx, rt: &mut ProverRuntime<'_>, index: usize, position: usize) {
        let matrix = &ctx.matrices[index];
        let column = rt.column(matrix.columns[0]).unwrap().to_vec();
        let mut codeword = fft::encode(&fft::extend(&column, ctx.width).unwrap(), ctx.blowup).unwrap();
        codeword[position] += FieldElement::ONE;
        let leaves: Vec<Vec<FieldElement>> = codeword.iter().map(|symbol| vec![*symbol]).collect();
        let tree = MerkleTree::from_rows(hasher_for(ctx.hash), &leaves, false).unwrap();
        rt.set_digests(matrix.root, vec![tree.root()]).unwrap();
        rt.matrices.insert(
            (ctx.instance, index),
            CommittedMatrix {
                codewords: vec![codeword],
                tree,
            },
        );
    }

    /// Proof over a corrupted codeword, with the spots the verifier samples.
    fn prove_with_bad_symbol(spec: &Specification, values: Vec<FieldElement>, position: usize) -> (Proof, Vec<usize>) {
        let mut rt = ProverRuntime::new(spec, &ProverOptions::default(), false);
        let mut witness = Witness::new().with("a", values);
        for round in 0..spec.num_rounds() {
            rt.begin_round(round).unwrap();
            witness.assign_round(round, &mut RoundAssignment::new(&mut rt)).unwrap();
            for action in spec.prover_actions(round) {
                match action {
                    ProverAction::VortexCommit { ctx, matrix } => commit_with_bad_symbol(ctx, &mut rt, *matrix, position),
                    other => other.run(&mut rt).unwrap(),
                }
            }
            rt.close_round().unwrap();
        }
        let ctx = contexts(spec).pop().unwrap();
        let spots = rt.integer_coin(ctx.spots).unwrap().to_vec();
        (rt.finish().unwrap().0, spots)
    }

    #[test]
    fn a_bad_symbol_is_caught_exactly_when_sampled() {
        const TRIALS: u64 = 256;
        // Off the message positions, so `U` itself stays honest.
        let position = 1;
        for spot_checks in [1u32, 4, 16] {
            let spec = single_column(spot_checks);
            let codeword_len = contexts(&spec).pop().unwrap().codeword_len();
            let mut rejected = 0u64;
            for trial in 0..TRIALS {
                let values = (0..8).map(|row| FieldElement::from(trial * 8 + row)).collect();
                let (proof, spots) = prove_with_bad_symbol(&spec, values, position);
                let verdict = verify(&spec, &proof);
                assert_eq!(verdict.is_err(), spots.contains(&position), "trial {trial}, spots {spots:?}");
                if let Err(error) = verdict {
                    assert!(matches!(error.reason, VerificationFailure::LinearCombination { .. }), "{error}");
                    rejected += 1;
                }
            }
            let miss = 1.0 - 1.0 / codeword_len as f64;
            let p = 1.0 - miss.powi(spot_checks as i32);
            let expected = TRIALS as f64 * p;
            let sigma = (TRIALS as f64 * p * (1.0 - p)).sqrt();
            assert!(
                (rejected as f64 - expected).abs() <= 5.0 * sigma,
                "{spot_checks} spot checks: {rejected} rejections, expected about {expected:.1}"
            );
        }
    }
}
