use crate::error::Result;
use rayon::prelude::*;

/// Renders every item on the rayon pool and returns per-item results in input
/// order. One failed document never aborts the rest of the batch.
pub fn render_batch<T, F>(items: &[T], render: F) -> Vec<Result<Vec<u8>>>
where
    T: Sync,
    F: Fn(&T) -> Result<Vec<u8>> + Sync,
{
    let mut indexed: Vec<(usize, Result<Vec<u8>>)> = items
        .par_iter()
        .enumerate()
        .map(|(index, item)| (index, render(item)))
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}
