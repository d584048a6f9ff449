//! Data-parallel helpers.
//!
//! Parallelism is requested explicitly by the caller (see
//! [`crate::prover::ProverOptions`]); without the `parallel` feature every
//! helper degrades to a sequential loop. Results are always returned in input
//! order so the output never depends on scheduling.

const DEFAULT_CHUNK_SIZE: usize = 64;

pub fn preferred_chunk_size(total_items: usize) -> usize {
    if total_items == 0 {
        1
    } else {
        DEFAULT_CHUNK_SIZE.min(total_items.max(1))
    }
}

/// Maps `f` over `items`, in parallel when `parallel` is set.
pub fn par_map<T, R, F>(parallel: bool, min_len: usize, items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    #[cfg(feature = "parallel")]
    if parallel && items.len() > 1 {
        use rayon::prelude::*;
        return items
            .par_iter()
            .with_min_len(min_len.max(1))
            .map(f)
            .collect();
    }
    let _ = (parallel, min_len);
    items.iter().map(f).collect()
}

/// Fallible variant of [`par_map`]; the first error in input order wins.
pub fn par_try_map<T, R, E, F>(parallel: bool, items: &[T], f: F) -> Result<Vec<R>, E>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(&T) -> Result<R, E> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    if parallel && items.len() > 1 {
        use rayon::prelude::*;
        let results: Vec<Result<R, E>> = items.par_iter().map(f).collect();
        return results.into_iter().collect();
    }
    let _ = parallel;
    items.iter().map(f).collect()
}
