use super::VortexCtx;
use crate::fft;
use crate::field::polynomial::{horner, lagrange_evaluate};
use crate::field::FieldElement;
use crate::iop::check::resolve_point;
use crate::merkle::{hasher_for, verify_path, Digest, MerklePath};
use crate::verifier::{VerificationError, VerificationFailure, VerifierRuntime};

impl VortexCtx {
    fn chunk_evaluations<'r>(&self, rt: &'r VerifierRuntime<'_>) -> Result<&'r [FieldElement], VerificationError> {
        match self.split {
            Some(split) => rt.read_column(&self.name, split),
            None => Ok(&[]),
        }
    }

    /// Evaluation `y_g` of every matrix row at `x`, in matrix order.
    fn row_evaluations(&self, rt: &VerifierRuntime<'_>) -> Result<Vec<FieldElement>, VerificationError> {
        let chunks = self.chunk_evaluations(rt)?;
        let mut rows = Vec::with_capacity(self.num_rows());
        let mut offset = 0;
        for ((_, count), (query, index)) in self.columns().zip(&self.claims) {
            if count == 1 {
                rows.push(rt.read_param(&self.name, *query, *index)?);
                continue;
            }
            let values = chunks
                .get(offset..offset + count)
                .ok_or_else(|| VerificationError::malformed(self.name.clone(), "missing chunk evaluations"))?;
            rows.extend_from_slice(values);
            offset += count;
        }
        Ok(rows)
    }

    /// `sum_g alpha^(W-1-g) y_g` over the row evaluations.
    pub(crate) fn combined_claim(&self, rt: &VerifierRuntime<'_>, alpha: FieldElement) -> Result<FieldElement, VerificationError> {
        Ok(self
            .row_evaluations(rt)?
            .into_iter()
            .fold(FieldElement::ZERO, |acc, value| acc * alpha + value))
    }

    /// Checks public columns natively and `sum_k x^(k*s) C_k(x) = C(x)` for
    /// every split column.
    pub(crate) fn check_public_evals(&self, rt: &VerifierRuntime<'_>) -> Result<(), VerificationError> {
        if self.public_claims.is_empty() && self.split.is_none() {
            return Ok(());
        }
        let spec = rt.spec();
        let x = resolve_point(spec, &self.point, rt).map_err(|failure| VerificationError::new(self.name.clone(), failure))?;

        let chunks = self.chunk_evaluations(rt)?;
        let step = x.pow(self.width as u64);
        let mut offset = 0;
        for ((column, count), (query, index)) in self.columns().zip(&self.claims) {
            if count == 1 {
                continue;
            }
            let values = chunks
                .get(offset..offset + count)
                .ok_or_else(|| VerificationError::malformed(self.name.clone(), "missing chunk evaluations"))?;
            offset += count;
            if horner(values, step) != rt.read_param(&self.name, *query, *index)? {
                return Err(VerificationError::new(
                    self.name.clone(),
                    VerificationFailure::ChunkRecombination {
                        column: spec.columns().info(column).name.clone(),
                    },
                ));
            }
        }
        if chunks[offset..].iter().any(|value| !value.is_zero()) {
            return Err(VerificationError::malformed(self.name.clone(), "chunk padding is not zero"));
        }
        for claim in &self.public_claims {
            let values = rt.read_column(&self.name, claim.column)?;
            let column = spec.columns().info(claim.column).name.clone();
            let expected = lagrange_evaluate(values, x)
                .ok_or_else(|| VerificationError::new(self.name.clone(), VerificationFailure::PublicEval { column: column.clone() }))?;
            if rt.read_param(&self.name, claim.query, claim.index)? != expected {
                return Err(VerificationError::new(self.name.clone(), VerificationFailure::PublicEval { column }));
            }
        }
        Ok(())
    }

    pub(crate) fn check_opening(&self, rt: &VerifierRuntime<'_>) -> Result<(), VerificationError> {
        if self.self_recursed {
            return Ok(());
        }
        let fail = |reason: VerificationFailure| VerificationError::new(self.name.clone(), reason);
        let alpha = rt.read_field_coin(&self.name, self.alpha)?;
        let spots = rt.read_integer_coin(&self.name, self.spots)?;
        let combined = rt.read_column(&self.name, self.u_alpha)?;
        let opened = rt.read_column(&self.name, self.opened)?;
        let siblings = rt
            .slot_digests(self.paths)
            .ok_or_else(|| VerificationError::malformed(self.name.clone(), "missing Merkle paths"))?;
        let total = self.num_rows();
        let matrices = self.matrices.len();
        if opened.len() < spots.len() * total || siblings.len() != spots.len() * matrices * self.depth {
            return Err(VerificationError::malformed(self.name.clone(), "opening has the wrong shape"));
        }
        if opened[spots.len() * total..].iter().any(|value| !value.is_zero()) {
            return Err(VerificationError::malformed(self.name.clone(), "opening padding is not zero"));
        }

        let codeword = fft::encode(combined, self.blowup).map_err(|_| fail(VerificationFailure::Codec))?;
        let hasher = hasher_for(self.hash);
        let mut roots: Vec<Digest> = Vec::with_capacity(matrices);
        for matrix in &self.matrices {
            let root = rt
                .slot_digests(matrix.root)
                .and_then(|digests| digests.first().copied())
                .ok_or_else(|| VerificationError::malformed(self.name.clone(), "missing matrix root"))?;
            roots.push(root);
        }

        for (spot, &position) in spots.iter().enumerate() {
            let symbols = &opened[spot * total..(spot + 1) * total];
            let folded = symbols.iter().fold(FieldElement::ZERO, |acc, value| acc * alpha + *value);
            if codeword.get(position) != Some(&folded) {
                return Err(fail(VerificationFailure::LinearCombination { spot }));
            }
            let mut offset = 0;
            for (matrix, info) in self.matrices.iter().enumerate() {
                let leaf = hasher.hash_leaf(&symbols[offset..offset + info.num_rows()]);
                offset += info.num_rows();
                let start = (spot * matrices + matrix) * self.depth;
                let path = MerklePath {
                    index: position,
                    siblings: siblings[start..start + self.depth].to_vec(),
                };
                verify_path(hasher, &roots[matrix], self.depth, leaf, &path)
                    .map_err(|error| fail(VerificationFailure::MerklePath { spot, matrix, error }))?;
            }
        }

        let x = resolve_point(rt.spec(), &self.point, rt).map_err(|failure| fail(failure.into()))?;
        let at_x = lagrange_evaluate(combined, x).ok_or_else(|| fail(VerificationFailure::CombinedClaim))?;
        if at_x != self.combined_claim(rt, alpha)? {
            return Err(fail(VerificationFailure::CombinedClaim));
        }
        Ok(())
    }
}
