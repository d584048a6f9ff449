/// Per-run prover switches.
///
/// | Field | Default | Effect |
/// |-------|---------|--------|
/// | `parallel` | `true` | Distributes encoding, hashing and quotient work over rayon. |
/// | `max_committed_cells` | `None` | Extra ceiling on top of the one bound at compilation. |
///
/// Every query of a round is checked in plaintext before the round is
/// committed, so an unsatisfying witness never yields a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProverOptions {
    pub(crate) check_witness: bool,
    pub parallel: bool,
    pub max_committed_cells: Option<u64>,
}

impl Default for ProverOptions {
    fn default() -> Self {
        Self {
            check_witness: true,
            parallel: cfg!(feature = "parallel"),
            max_committed_cells: None,
        }
    }
}

impl ProverOptions {
    /// Skips the plaintext checks so the verifier can be exercised against
    /// proofs of unsatisfying witnesses. Test builds only.
    #[cfg(feature = "unchecked-prover")]
    #[doc(hidden)]
    pub fn unchecked() -> Self {
        Self {
            check_witness: false,
            ..Self::default()
        }
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn with_max_committed_cells(mut self, cells: u64) -> Self {
        self.max_committed_cells = Some(cells);
        self
    }

    /// Whether the prover refuses unsatisfying witnesses.
    pub fn checks_witness(&self) -> bool {
        self.check_witness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_fail_closed() {
        let options = ProverOptions::default();
        assert!(options.checks_witness());
        assert!(options.sequential().with_max_committed_cells(8).checks_witness());
        assert_eq!(options.with_max_committed_cells(8).max_committed_cells, Some(8));
    }
}
