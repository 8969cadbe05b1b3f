//! C2: the prefix-free parse (PFP) view over the reference text.
//!
//! `PfpView` is the read-only seam [`crate::builder`] streams over: a
//! dictionary of distinct phrases (with its own suffix/LCP arrays), the parse
//! (the phrase-id sequence in text order, with its own suffix array and an
//! inverted list per phrase), and per-occurrence text offsets with a
//! corresponding LCP/RMQ structure.
//!
//! A production PFP is normally produced by an external, parallelized parser
//! (see `gsacak`-based tooling's `newscan`/`pscan` binaries); the builder only
//! ever needs the accessors below, so [`construct::build`] supplies an
//! in-process, single-threaded producer behind the same seam: Karp-Rabin
//! triggered phrase boundaries, SA-IS for the dictionary, and a generic
//! doubling-rank suffix array for the parse.

mod construct;
mod rmq;

pub use construct::{build, PfpData, PfpParams};

/// Read-only view over a prefix-free parse, as consumed by the DAP builder.
///
/// All positions below are 0-indexed and refer to either the dictionary
/// string `D` or the occurrence-rank space of the parse's own suffix array
/// (never to raw parse-sequence order), unless stated otherwise.
pub trait PfpView {
    /// The window size `w` used to trigger phrase boundaries.
    fn w(&self) -> usize;

    /// Length of the padded text this parse was built over (`n_real + w`).
    fn n(&self) -> usize;

    /// Number of phrase occurrences in the parse (the length of `P`).
    fn num_occurrences(&self) -> usize;

    /// Number of distinct phrases.
    fn num_phrases(&self) -> usize;

    /// Length of the dictionary string `D` (every phrase, `EndOfDict`-terminated).
    fn dict_len(&self) -> usize;

    /// `D[i]`.
    fn dict_byte(&self, i: usize) -> u8;

    /// `saD[i]`: the suffix array of `D`.
    fn sa_d(&self, i: usize) -> usize;

    /// `lcpD[i]`: the LCP array of `saD`.
    fn lcp_d(&self, i: usize) -> usize;

    /// Whether dictionary position `pos` is the first byte of some phrase.
    fn is_phrase_start(&self, pos: usize) -> bool;

    /// Number of phrase starts at dictionary positions `< pos`.
    fn rank_phrase_start(&self, pos: usize) -> usize;

    /// Dictionary position where phrase `k` (0-indexed) begins.
    fn select_phrase_start(&self, k: usize) -> usize;

    /// `ilist[idx]`: a parse-suffix-array rank at which some phrase occurs.
    fn ilist(&self, idx: usize) -> usize;

    /// Start offset, in `ilist`, of phrase `k`'s occurrence block.
    /// `select_ilist_s(num_phrases())` is `ilist`'s length.
    fn select_ilist_s(&self, k: usize) -> usize;

    /// `pos_T[k]`: the padded text offset (exclusive end) of the phrase
    /// occurrence ranked `k`-th in the parse's suffix array.
    fn pos_t(&self, k: usize) -> usize;

    /// Minimum of `s_lcp_T[l..=r]` (inclusive). `s_lcp_T[k]` is `w` plus the
    /// text-character LCP between the continuations of the occurrences ranked
    /// `k - 1` and `k`; `s_lcp_T[0]` is `0` by convention. Range-min over this
    /// array gives the same quantity for any pair of ranks in `[l, r]`.
    fn rmq_s_lcp_t(&self, l: usize, r: usize) -> usize;
}
