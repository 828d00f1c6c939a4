//! Contig-overlap scoring, kept as an alternate fuzzy matcher.
//!
//! Not used by insertion, exact search, or autolinking.
//!
//! # Complexity
//! Every substring of the query at least the minimum contig length is
//! counted against the source: O(n^2) substrings for a query of n chars,
//! each scanned across the source. Fine for short lookups such as names and
//! commands; it does not scale to long queries.

/// Shortest contig ever counted.
pub const MIN_CONTIG_LEN: usize = 3;

/// Scores how well `query` overlaps `source`.
///
/// Sum over query substrings of at least `max(3, len(source) / 3)` chars of
/// (non-overlapping occurrences in `source`) x (substring length), divided
/// by `len(source)`. Lengths are in chars. An empty source scores 0.
pub fn match_score(query: &str, source: &str) -> f64 {
    let source_len = source.chars().count();
    if source_len == 0 {
        return 0.0;
    }
    let min_len = MIN_CONTIG_LEN.max(source_len / 3);

    let bounds: Vec<usize> = query
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(query.len()))
        .collect();
    let query_len = bounds.len() - 1;

    let mut total = 0usize;
    for start in 0..query_len {
        for end in (start + min_len)..=query_len {
            let contig = &query[bounds[start]..bounds[end]];
            total += source.matches(contig).count() * (end - start);
        }
    }
    total as f64 / source_len as f64
}
