//! C3: `DapBuilder` streams the run-length BWT and per-run document-array
//! profiles of the reference text from a [`PfpView`] plus a [`RefCatalog`],
//! grounded on the priority-queue merge over phrase occurrences described in
//! `pfp_lcp_doc.hpp`: dictionary suffixes are scanned in SA order, suffixes
//! that are byte-identical across phrases are merged by ascending parse-SA
//! rank (the order the prefix-free parse theorem guarantees corresponds to
//! text-suffix order), and adjacent suffixes are compared to find run
//! boundaries and document-array profile rows.
//!
//! The document-array profile itself is the bounded-memory backward walk of
//! `pfp_lcp_doc.hpp` verbatim: a queue of `(run_id, bwt_ch, doc_num, is_start,
//! is_end, lcp_with_prev)` entries, one per emitted BWT position, amended by
//! later positions' Case A/B1/B2 backward walks and retired — to SDAP/EDAP if
//! a run boundary — once `ch_doc_counters[ch][doc]` shows a newer entry
//! already witnesses that pair. See `DESIGN.md`.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::pfp::PfpView;
use crate::refs::RefCatalog;
use crate::util::{modular_sub, write_le};

pub const THRBYTES: usize = 3;
pub const SSABYTES: usize = 5;
pub const BWTBYTES: usize = 5;

#[derive(Clone, Debug)]
struct PhraseSuffixCursor {
    sn: usize,
    phrase: usize,
    suffix_length: usize,
    bwt_char: u8,
}

fn cursor_at<P: PfpView>(pfp: &P, i: usize) -> PhraseSuffixCursor {
    let sn = pfp.sa_d(i);
    let phrase = pfp.rank_phrase_start(sn + 1).saturating_sub(1);
    let next_start = if phrase + 1 < pfp.num_phrases() {
        pfp.select_phrase_start(phrase + 1)
    } else {
        pfp.dict_len()
    };
    let suffix_length = next_start - 1 - sn;
    let bwt_char = if sn == pfp.w() { 0 } else { pfp.dict_byte(sn - 1) };
    PhraseSuffixCursor {
        sn,
        phrase,
        suffix_length,
        bwt_char,
    }
}

fn is_valid_suffix<P: PfpView>(pfp: &P, c: &PhraseSuffixCursor) -> bool {
    c.sn >= pfp.w() && !pfp.is_phrase_start(c.sn) && c.suffix_length >= pfp.w()
}

struct GroupOccurrence {
    r: usize,
    bwt_char: u8,
    ssa: usize,
}

/// Merges every text occurrence of every phrase in `group` (all sharing the
/// same dictionary suffix, by construction) into one sequence ordered by
/// ascending parse-SA rank, via a k-way merge over each phrase's own
/// (already-sorted) occurrence cursor. Ascending parse-SA rank corresponds
/// to ascending text-suffix order by the prefix-free parse correctness
/// theorem, so the merged order is already the correct BWT order.
fn merge_group_occurrences<P: PfpView>(pfp: &P, group: &[PhraseSuffixCursor]) -> Vec<GroupOccurrence> {
    let modulus = pfp.n() - pfp.w();
    let mut cursors: Vec<(usize, usize)> = Vec::with_capacity(group.len());
    let mut heap: BinaryHeap<Reverse<(usize, usize)>> = BinaryHeap::new();
    for (mi, member) in group.iter().enumerate() {
        let lo = pfp.select_ilist_s(member.phrase);
        let hi = pfp.select_ilist_s(member.phrase + 1);
        cursors.push((lo, hi));
        if lo < hi {
            heap.push(Reverse((pfp.ilist(lo), mi)));
        }
    }

    let mut out = Vec::new();
    while let Some(Reverse((r, mi))) = heap.pop() {
        let member = &group[mi];
        let ssa = modular_sub(pfp.pos_t(r), member.suffix_length, modulus);
        out.push(GroupOccurrence {
            r,
            bwt_char: member.bwt_char,
            ssa,
        });
        let (lo, hi) = &mut cursors[mi];
        *lo += 1;
        if *lo < *hi {
            heap.push(Reverse((pfp.ilist(*lo), mi)));
        }
    }
    out
}

/// The materialized BWT of `T`: one entry per suffix-array position, built
/// by scanning the dictionary's suffix array and merging occurrences of
/// byte-identical phrase suffixes by text order.
struct BwtSequence {
    chars: Vec<u8>,
    sa: Vec<usize>,
    lcp: Vec<usize>,
}

fn build_bwt_sequence<P: PfpView>(pfp: &P) -> BwtSequence {
    let dict_len = pfp.dict_len();
    let mut consumed = vec![false; dict_len];

    let mut chars = Vec::with_capacity(pfp.num_occurrences());
    let mut sa = Vec::with_capacity(pfp.num_occurrences());
    let mut lcp = Vec::with_capacity(pfp.num_occurrences());

    let mut min_lcp_since_last_occ = usize::MAX;
    let mut has_any_occurrence = false;

    let mut i = 0;
    while i < dict_len {
        if i > 0 {
            min_lcp_since_last_occ = min_lcp_since_last_occ.min(pfp.lcp_d(i));
        }
        if consumed[i] {
            i += 1;
            continue;
        }
        let cur = cursor_at(pfp, i);
        if !is_valid_suffix(pfp, &cur) {
            consumed[i] = true;
            i += 1;
            continue;
        }

        let mut group = vec![cur.clone()];
        let mut j = i + 1;
        while j < dict_len && pfp.lcp_d(j) >= cur.suffix_length {
            let nxt = cursor_at(pfp, j);
            if is_valid_suffix(pfp, &nxt) && nxt.suffix_length == cur.suffix_length {
                group.push(nxt);
                consumed[j] = true;
            }
            j += 1;
        }
        consumed[i] = true;

        let merged = merge_group_occurrences(pfp, &group);
        let boundary_lcp = if has_any_occurrence { min_lcp_since_last_occ } else { 0 };

        for (idx, occ) in merged.iter().enumerate() {
            let lcp_with_prev = if idx == 0 {
                boundary_lcp
            } else {
                let prev_r = merged[idx - 1].r;
                let extra = pfp.rmq_s_lcp_t(prev_r + 1, occ.r).saturating_sub(pfp.w());
                cur.suffix_length + extra
            };
            chars.push(occ.bwt_char);
            sa.push(occ.ssa);
            lcp.push(lcp_with_prev);
        }

        has_any_occurrence = has_any_occurrence || !merged.is_empty();
        min_lcp_since_last_occ = usize::MAX;
        i = j;
    }

    BwtSequence { chars, sa, lcp }
}

/// One flushed BWT run, ready to be written to the output streams.
struct Run {
    ch: u8,
    len: u64,
    threshold: usize,
    ssa: usize,
    esa: usize,
    start_profile: Vec<u64>,
    end_profile: Vec<u64>,
}

pub struct DapBuilder<'a, P: PfpView> {
    pfp: &'a P,
    refs: &'a RefCatalog,
}

impl<'a, P: PfpView> DapBuilder<'a, P> {
    pub fn new(pfp: &'a P, refs: &'a RefCatalog) -> Self {
        DapBuilder { pfp, refs }
    }

    /// Builds the BWT, LCP and document-array profile streams and writes
    /// them under `prefix`, one entry per run in the output files.
    pub fn build(&self, prefix: &Path) -> Result<()> {
        let seq = build_bwt_sequence(self.pfp);
        let n = seq.chars.len();
        if n != self.refs.total_length() {
            return Err(Error::invariant(format!(
                "constructed BWT has {} positions, expected {} (reference text length)",
                n,
                self.refs.total_length()
            )));
        }

        let num_docs = self.refs.num_docs();

        let mut runs: Vec<(u8, u64, usize, usize, usize)> = Vec::new();
        let mut i = 0;
        while i < n {
            let ch = seq.chars[i];
            let mut j = i + 1;
            while j < n && seq.chars[j] == ch {
                j += 1;
            }
            runs.push((ch, (j - i) as u64, seq.lcp[i], seq.sa[i], seq.sa[j - 1]));
            i = j;
        }

        let (sdap, edap) = compute_profiles(&seq, self.refs, runs.len());

        let runs: Vec<Run> = runs
            .into_iter()
            .zip(sdap)
            .zip(edap)
            .map(|(((ch, len, threshold, ssa, esa), start_profile), end_profile)| Run {
                ch,
                len,
                threshold,
                ssa,
                esa,
                start_profile,
                end_profile,
            })
            .collect();

        write_outputs(prefix, num_docs, &runs)
    }
}

/// One entry in the bounded-memory backward-walk queue: one per BWT
/// position, in BWT order. `doc_num` is the document owning the
/// LF-predecessor of this position, not the position's own suffix.
struct QueueEntry {
    run_num: usize,
    bwt_ch: u8,
    doc_num: usize,
    is_start: bool,
    is_end: bool,
    lcp_with_prev: usize,
}

/// Computes the per-run SDAP/EDAP document-array profile rows by the
/// bounded-memory backward walk of `pfp_lcp_doc.hpp`: each BWT position is
/// pushed onto a queue with a self-seeded profile row (`n - pos_of_LF_i` in
/// its own document's column), then a backward walk over the queue fills in
/// the remaining columns and amends the profile rows of earlier positions
/// that still lack their own document's column (Case B2's back-patch, the
/// only write into an already-queued row). An entry is retired from the
/// queue — its profile row written to SDAP (if it starts a run) and/or EDAP
/// (if it ends one) — once `ch_doc_counters` shows a newer entry already
/// witnesses its `(bwt_ch, doc_num)` pair, which bounds the queue at
/// `o(alphabet_size * num_docs)` regardless of `n`.
fn compute_profiles(seq: &BwtSequence, refs: &RefCatalog, num_runs: usize) -> (Vec<Vec<u64>>, Vec<Vec<u64>>) {
    let n = seq.chars.len();
    let num_docs = refs.num_docs();

    let mut sdap: Vec<Option<Vec<u64>>> = vec![None; num_runs];
    let mut edap: Vec<Option<Vec<u64>>> = vec![None; num_runs];

    let mut ch_doc_counters: Vec<Vec<usize>> = vec![vec![0usize; num_docs]; 256];
    let mut queue: VecDeque<QueueEntry> = VecDeque::new();
    let mut profiles: VecDeque<Vec<u64>> = VecDeque::new();

    let mut prev_bwt_ch: u8 = 0;
    let mut curr_run_num: usize = 0;

    for pos in 0..n {
        let curr_bwt_ch = seq.chars[pos];
        let lcp_i = seq.lcp[pos];
        let sa_i = seq.sa[pos];

        let is_start = pos == 0 || curr_bwt_ch != prev_bwt_ch;
        let is_end = pos == n - 1;

        if pos != 0 && prev_bwt_ch != curr_bwt_ch {
            if let Some(last) = queue.back_mut() {
                last.is_end = true;
            }
        }
        if is_start {
            curr_run_num += 1;
        }

        let pos_of_lf_i = if sa_i > 0 { sa_i - 1 } else { n - 1 };
        let doc_of_lf_i = usize::from(refs.doc_of(pos_of_lf_i));

        queue.push_back(QueueEntry {
            run_num: curr_run_num - 1,
            bwt_ch: curr_bwt_ch,
            doc_num: doc_of_lf_i,
            is_start,
            is_end,
            lcp_with_prev: lcp_i,
        });
        ch_doc_counters[curr_bwt_ch as usize][doc_of_lf_i] += 1;

        let mut min_lcp = lcp_i;
        let mut passed_same_document = false;
        let mut docs_to_collect = vec![false; num_docs];
        docs_to_collect[doc_of_lf_i] = true;

        let mut curr_da_profile = vec![0u64; num_docs];
        curr_da_profile[doc_of_lf_i] = (n - pos_of_lf_i) as u64;

        let qlen = queue.len();
        if qlen >= 2 {
            let mut queue_pos = qlen as isize - 2;
            while queue_pos >= 0 && (!docs_to_collect.iter().all(|&collected| collected) || !passed_same_document) {
                let idx = queue_pos as usize;
                let entry_ch = queue[idx].bwt_ch;
                let entry_doc = queue[idx].doc_num;
                let entry_is_boundary = queue[idx].is_start || queue[idx].is_end;
                let entry_lcp = queue[idx].lcp_with_prev;

                if entry_ch == curr_bwt_ch && entry_doc == doc_of_lf_i {
                    passed_same_document = true;
                } else if entry_ch == curr_bwt_ch && entry_doc != doc_of_lf_i {
                    if !docs_to_collect[entry_doc] {
                        curr_da_profile[entry_doc] = (min_lcp + 1) as u64;
                        docs_to_collect[entry_doc] = true;
                    }
                    if !passed_same_document && entry_is_boundary {
                        let slot = &mut profiles[idx][doc_of_lf_i];
                        *slot = (*slot).max((min_lcp + 1) as u64);
                    }
                }
                min_lcp = min_lcp.min(entry_lcp);
                queue_pos -= 1;
            }
        }

        profiles.push_back(curr_da_profile);

        let mut records_to_remove = 0usize;
        for entry in queue.iter() {
            if ch_doc_counters[entry.bwt_ch as usize][entry.doc_num] == 1 {
                break;
            }
            records_to_remove += 1;
        }
        for _ in 0..records_to_remove {
            let entry = queue.pop_front().expect("records_to_remove bounded by queue length");
            ch_doc_counters[entry.bwt_ch as usize][entry.doc_num] -= 1;
            let profile = profiles.pop_front().expect("queue and profiles stay the same length");
            if entry.is_start {
                sdap[entry.run_num] = Some(profile.clone());
            }
            if entry.is_end {
                edap[entry.run_num] = Some(profile);
            }
        }

        prev_bwt_ch = curr_bwt_ch;
    }

    while let Some(entry) = queue.pop_front() {
        let profile = profiles.pop_front().expect("queue and profiles stay the same length");
        if entry.is_start {
            sdap[entry.run_num] = Some(profile.clone());
        }
        if entry.is_end {
            edap[entry.run_num] = Some(profile);
        }
    }

    let sdap = sdap
        .into_iter()
        .map(|row| row.expect("every run has exactly one start-of-run BWT position"))
        .collect();
    let edap = edap
        .into_iter()
        .map(|row| row.expect("every run has exactly one end-of-run BWT position"))
        .collect();
    (sdap, edap)
}

fn write_outputs(prefix: &Path, num_docs: usize, runs: &[Run]) -> Result<()> {
    let mut heads = create(prefix, "bwt.heads")?;
    let mut lens = create(prefix, "bwt.len")?;
    let mut lcps = create(prefix, "lcp")?;
    let mut ssas = create(prefix, "ssa")?;
    let mut esas = create(prefix, "esa")?;
    let mut sdap = create(prefix, "sdap")?;
    let mut edap = create(prefix, "edap")?;

    sdap.write_all(&(num_docs as u64).to_le_bytes())
        .map_err(|e| Error::io_failure(path_for(prefix, "sdap"), e))?;
    edap.write_all(&(num_docs as u64).to_le_bytes())
        .map_err(|e| Error::io_failure(path_for(prefix, "edap"), e))?;

    let mut buf = Vec::new();
    for run in runs {
        heads
            .write_all(&[run.ch])
            .map_err(|e| Error::io_failure(path_for(prefix, "bwt.heads"), e))?;

        buf.clear();
        write_le(run.len, BWTBYTES, &mut buf);
        lens.write_all(&buf)
            .map_err(|e| Error::io_failure(path_for(prefix, "bwt.len"), e))?;

        buf.clear();
        write_le(run.threshold as u64, THRBYTES, &mut buf);
        lcps.write_all(&buf)
            .map_err(|e| Error::io_failure(path_for(prefix, "lcp"), e))?;

        buf.clear();
        write_le(run.ssa as u64, SSABYTES, &mut buf);
        ssas.write_all(&buf)
            .map_err(|e| Error::io_failure(path_for(prefix, "ssa"), e))?;

        buf.clear();
        write_le(run.esa as u64, SSABYTES, &mut buf);
        esas.write_all(&buf)
            .map_err(|e| Error::io_failure(path_for(prefix, "esa"), e))?;

        for &v in &run.start_profile {
            sdap.write_all(&v.to_le_bytes())
                .map_err(|e| Error::io_failure(path_for(prefix, "sdap"), e))?;
        }
        for &v in &run.end_profile {
            edap.write_all(&v.to_le_bytes())
                .map_err(|e| Error::io_failure(path_for(prefix, "edap"), e))?;
        }
    }

    for w in [&mut heads, &mut lens, &mut lcps, &mut ssas, &mut esas, &mut sdap, &mut edap] {
        w.flush().map_err(|e| Error::io_failure(prefix, e))?;
    }

    log::info!("wrote {} BWT runs under {}", runs.len(), prefix.display());
    Ok(())
}

fn path_for(prefix: &Path, ext: &str) -> PathBuf {
    let mut s = prefix.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

fn create(prefix: &Path, ext: &str) -> Result<BufWriter<File>> {
    let path = path_for(prefix, ext);
    let f = File::create(&path).map_err(|e| Error::io_failure(&path, e))?;
    Ok(BufWriter::new(f))
}
