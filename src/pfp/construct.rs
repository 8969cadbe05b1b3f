//! In-process producer for [`PfpView`]: Karp-Rabin phrase boundaries, SA-IS
//! over the resulting dictionary, and a doubling-rank suffix array over the
//! parse sequence.
//!
//! The dictionary is stored internally as `u16` rather than `u8`: the real
//! alphabet already uses byte `0` as [`crate::refs::TERMINATOR`], which can
//! legitimately appear as ordinary content inside the last phrase, so it
//! cannot double as the separator SA-IS requires between phrases. Every real
//! byte is shifted up by one (`b as u16 + 1`); `0` is reserved for `EndOfDict`.

use crate::converter::NoOpConverter;
use crate::error::{Error, Result};
use crate::pfp::rmq::SparseTable;
use crate::pfp::PfpView;
use crate::suffix_array::sais;

/// Byte prepended `w` times before the real text, so that every genuine
/// phrase suffix has a full window of left-context to trigger on.
const PAD_BYTE: u8 = 0x02;

#[derive(Clone, Copy, Debug)]
pub struct PfpParams {
    pub w: usize,
    pub hash_mod: u64,
}

impl Default for PfpParams {
    fn default() -> Self {
        PfpParams { w: 10, hash_mod: 100 }
    }
}

pub struct PfpData {
    w: usize,
    n: usize,
    dict: Vec<u16>,
    phrase_starts: Vec<usize>,
    sa_d: Vec<usize>,
    lcp_d: Vec<usize>,
    ilist_starts: Vec<usize>,
    pos_t: Vec<usize>,
    s_lcp_t: SparseTable,
}

/// Builds a [`PfpData`] over `real_text`, internally prepending `params.w`
/// padding bytes so the first genuine phrase still has a full trigger window.
pub fn build(real_text: &[u8], params: PfpParams) -> Result<PfpData> {
    let w = params.w;
    if w == 0 {
        return Err(Error::invariant("pfp window size w must be at least 1"));
    }
    if params.hash_mod == 0 {
        return Err(Error::invariant("pfp hash modulus must be at least 1"));
    }
    if real_text.is_empty() {
        return Err(Error::invariant("pfp requires a non-empty text"));
    }

    let mut padded = Vec::with_capacity(w + real_text.len());
    padded.resize(w, PAD_BYTE);
    padded.extend_from_slice(real_text);
    let n = padded.len();

    let cuts = karp_rabin_cuts(&padded, w, params.hash_mod);

    // Derive phrases from cut positions: phrase k spans padded[start_k..end_k),
    // consecutive phrases overlapping by w bytes.
    let mut raw_occ_end = Vec::with_capacity(cuts.len());
    let mut raw_occ_content: Vec<&[u8]> = Vec::with_capacity(cuts.len());
    let mut start = 0usize;
    for &j in &cuts {
        let end = j + 1;
        raw_occ_content.push(&padded[start..end]);
        raw_occ_end.push(end);
        start = end - w;
    }
    let m = raw_occ_end.len();

    // Dictionary: distinct phrases, ids assigned in order of first
    // appearance. The first raw occurrence (the leading w padding bytes, at
    // minimum) is always seen first and so always gets id 0, which is why
    // the first w bytes of `dict` never start a proper phrase suffix.
    let mut phrase_id_of_content: std::collections::HashMap<&[u8], usize> =
        std::collections::HashMap::new();
    let mut phrase_content_by_id: Vec<&[u8]> = Vec::new();
    let mut parse_ids: Vec<usize> = Vec::with_capacity(m);
    for &content in &raw_occ_content {
        let id = *phrase_id_of_content.entry(content).or_insert_with(|| {
            phrase_content_by_id.push(content);
            phrase_content_by_id.len() - 1
        });
        parse_ids.push(id);
    }
    let num_phrases = phrase_content_by_id.len();

    let mut dict: Vec<u16> = Vec::new();
    let mut phrase_starts = Vec::with_capacity(num_phrases);
    for content in &phrase_content_by_id {
        phrase_starts.push(dict.len());
        dict.extend(content.iter().map(|&b| b as u16 + 1));
        dict.push(0);
    }

    let converter = NoOpConverter::new(256u16);
    let sa_d = sais::build_suffix_array(&dict, &converter);
    let lcp_d = kasai_lcp(&dict, &sa_d);

    // ilist groups parse-SA ranks by leading phrase id. Suffixes sharing a
    // leading symbol form one contiguous SA bucket, so within a bucket the
    // ranks are already `bucket_start, bucket_start + 1, ...` in order: the
    // bucket boundaries (from phrase-id counts) are all `ilist` needs.
    let mut counts = vec![0usize; num_phrases];
    for &id in &parse_ids {
        counts[id] += 1;
    }
    let mut ilist_starts = Vec::with_capacity(num_phrases + 1);
    let mut acc = 0usize;
    for c in &counts {
        ilist_starts.push(acc);
        acc += c;
    }
    ilist_starts.push(acc);
    debug_assert_eq!(acc, m);

    let sa_p = doubling_rank_sa(&parse_ids);
    let pos_t: Vec<usize> = sa_p.iter().map(|&occ| raw_occ_end[occ]).collect();

    let mut s_lcp_t_raw = vec![0usize; m];
    for k in 1..m {
        let a = &padded[pos_t[k - 1]..];
        let b = &padded[pos_t[k]..];
        s_lcp_t_raw[k] = w + common_prefix_len(a, b);
    }
    let s_lcp_t = SparseTable::build(s_lcp_t_raw);

    Ok(PfpData {
        w,
        n,
        dict,
        phrase_starts,
        sa_d,
        lcp_d,
        ilist_starts,
        pos_t,
        s_lcp_t,
    })
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Positions `j` where a window `text[j - w + 1 ..= j]` triggers a phrase
/// boundary: the rolling hash is `0 mod hash_mod`, or `j` is the last index.
fn karp_rabin_cuts(text: &[u8], w: usize, hash_mod: u64) -> Vec<usize> {
    const BASE: u64 = 256;
    const PRIME: u64 = 1_000_000_007;

    let n = text.len();
    let mut base_pow = 1u64;
    for _ in 0..w - 1 {
        base_pow = (base_pow * BASE) % PRIME;
    }

    let mut hash = 0u64;
    for &b in &text[0..w] {
        hash = (hash * BASE + b as u64) % PRIME;
    }

    let mut cuts = Vec::new();
    let mut j = w - 1;
    loop {
        let is_last = j == n - 1;
        if hash % hash_mod == 0 || is_last {
            cuts.push(j);
        }
        if is_last {
            break;
        }
        let leaving = text[j - w + 1] as u64;
        let entering = text[j + 1] as u64;
        let without_leaving = (hash + PRIME - (leaving * base_pow) % PRIME) % PRIME;
        hash = (without_leaving * BASE + entering) % PRIME;
        j += 1;
    }
    cuts
}

fn kasai_lcp(text: &[u16], sa: &[usize]) -> Vec<usize> {
    let n = text.len();
    if n == 0 {
        return vec![];
    }
    let mut rank = vec![0usize; n];
    for (i, &s) in sa.iter().enumerate() {
        rank[s] = i;
    }
    let mut lcp = vec![0usize; n];
    let mut h = 0usize;
    for i in 0..n {
        if rank[i] > 0 {
            let j = sa[rank[i] - 1];
            while i + h < n && j + h < n && text[i + h] == text[j + h] {
                h += 1;
            }
            lcp[rank[i]] = h;
            if h > 0 {
                h -= 1;
            }
        } else {
            h = 0;
        }
    }
    lcp
}

/// A generic O(m log^2 m) suffix array over a dense symbol sequence, built by
/// doubling the compared context length each round and re-ranking by ties.
/// A missing continuation (running off the end) sorts before every real one,
/// matching ordinary suffix-array convention.
fn doubling_rank_sa(ids: &[usize]) -> Vec<usize> {
    let m = ids.len();
    if m == 0 {
        return vec![];
    }
    let mut sa: Vec<usize> = (0..m).collect();
    let mut rank: Vec<i64> = ids.iter().map(|&x| x as i64).collect();
    let mut tmp = vec![0i64; m];
    let mut k = 1usize;
    loop {
        let key = |i: usize| -> (i64, i64) {
            let second = if i + k < m { rank[i + k] } else { -1 };
            (rank[i], second)
        };
        sa.sort_by(|&a, &b| key(a).cmp(&key(b)));
        tmp[sa[0]] = 0;
        for i in 1..m {
            let bump = if key(sa[i - 1]) < key(sa[i]) { 1 } else { 0 };
            tmp[sa[i]] = tmp[sa[i - 1]] + bump;
        }
        rank.copy_from_slice(&tmp);
        if rank[sa[m - 1]] as usize == m - 1 || k >= m {
            break;
        }
        k *= 2;
    }
    sa
}

impl PfpView for PfpData {
    fn w(&self) -> usize {
        self.w
    }

    fn n(&self) -> usize {
        self.n
    }

    fn num_occurrences(&self) -> usize {
        self.pos_t.len()
    }

    fn num_phrases(&self) -> usize {
        self.phrase_starts.len()
    }

    fn dict_len(&self) -> usize {
        self.dict.len()
    }

    fn dict_byte(&self, i: usize) -> u8 {
        let v = self.dict[i];
        if v == 0 {
            0
        } else {
            (v - 1) as u8
        }
    }

    fn sa_d(&self, i: usize) -> usize {
        self.sa_d[i]
    }

    fn lcp_d(&self, i: usize) -> usize {
        self.lcp_d[i]
    }

    fn is_phrase_start(&self, pos: usize) -> bool {
        self.phrase_starts.binary_search(&pos).is_ok()
    }

    fn rank_phrase_start(&self, pos: usize) -> usize {
        self.phrase_starts.partition_point(|&s| s < pos)
    }

    fn select_phrase_start(&self, k: usize) -> usize {
        self.phrase_starts[k]
    }

    fn ilist(&self, idx: usize) -> usize {
        idx
    }

    fn select_ilist_s(&self, k: usize) -> usize {
        self.ilist_starts[k]
    }

    fn pos_t(&self, k: usize) -> usize {
        self.pos_t[k]
    }

    fn rmq_s_lcp_t(&self, l: usize, r: usize) -> usize {
        self.s_lcp_t.min(l, r)
    }
}
