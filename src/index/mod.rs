//! C4: `DapIndex` — a run-length FM-index over the persisted BWT streams,
//! plus the per-run document-array profile matrices.
//!
//! The rank/select structure (`s`, `b`, `bp`, `cs`) follows the usual
//! run-length FM-index layout (`s`: run heads as a wavelet matrix, `b`: run
//! starts over the full BWT, `bp`: runs re-grouped by character, `cs`:
//! per-character run-count prefix sums), but built here by reading the
//! `.bwt.heads`/`.bwt.len` streams in the order [`crate::builder::DapBuilder`]
//! wrote them, since `DapIndex` never holds a suffix array of its own.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use vers_vecs::{BitVec, RsVec, WaveletMatrix};

use crate::error::{Error, Result};
use crate::util::{log2, read_le};

const THRBYTES: usize = crate::builder::THRBYTES;
const SSABYTES: usize = crate::builder::SSABYTES;
const BWTBYTES: usize = crate::builder::BWTBYTES;

const ALPHABET: usize = 256;

pub struct DapIndex {
    s: WaveletMatrix,
    b: RsVec,
    bp: RsVec,
    cs: Vec<usize>,
    f: [u64; ALPHABET],
    len: usize,

    run_ssa: Vec<u64>,
    run_esa: Vec<u64>,
    run_threshold: Vec<u64>,
    run_lengths: Vec<u64>,

    num_docs: usize,
    sdap: Vec<u64>,
    edap: Vec<u64>,
}

impl DapIndex {
    /// Reloads an index previously written by [`crate::builder::DapBuilder::build`].
    pub fn load(prefix: &Path) -> Result<Self> {
        let heads = read_whole(prefix, "bwt.heads")?;
        let lens_raw = read_whole(prefix, "bwt.len")?;
        let lcp_raw = read_whole(prefix, "lcp")?;
        let ssa_raw = read_whole(prefix, "ssa")?;
        let esa_raw = read_whole(prefix, "esa")?;

        if lens_raw.len() % BWTBYTES != 0 {
            return Err(Error::input_shape(path_for(prefix, "bwt.len"), "size is not a multiple of BWTBYTES"));
        }
        let r = lens_raw.len() / BWTBYTES;
        if heads.len() != r {
            return Err(Error::input_shape(
                path_for(prefix, "bwt.heads"),
                "run-head count does not match run-length count",
            ));
        }

        let run_lengths: Vec<u64> = (0..r).map(|k| read_le(&lens_raw[k * BWTBYTES..(k + 1) * BWTBYTES])).collect();
        let run_threshold: Vec<u64> = read_fixed_width(&lcp_raw, THRBYTES, r, prefix, "lcp")?;
        let run_ssa: Vec<u64> = read_fixed_width(&ssa_raw, SSABYTES, r, prefix, "ssa")?;
        let run_esa: Vec<u64> = read_fixed_width(&esa_raw, SSABYTES, r, prefix, "esa")?;

        let len: u64 = run_lengths.iter().sum();

        // Build s/b/bp/cs from the run-head/run-length streams directly, in
        // the order the builder wrote them (BWT order), exactly mirroring
        // the live-SA construction but sourced from the persisted streams.
        let mut s_seq: Vec<u64> = Vec::with_capacity(r);
        let mut b = BitVec::new();
        let mut runs_by_char: Vec<Vec<u64>> = vec![Vec::new(); ALPHABET];
        let mut char_counts = [0u64; ALPHABET];
        for (k, &ch) in heads.iter().enumerate() {
            s_seq.push(ch as u64);
            b.append(true);
            let len_k = run_lengths[k];
            for _ in 1..len_k {
                b.append(false);
            }
            runs_by_char[ch as usize].push(len_k);
            char_counts[ch as usize] += len_k;
        }

        let s = WaveletMatrix::from_slice(&s_seq, (log2(ALPHABET as u64 - 1) + 1) as u16);

        let mut bp = BitVec::new();
        let mut cs = vec![0usize; ALPHABET];
        let mut acc = 0usize;
        for (c, runs) in runs_by_char.into_iter().enumerate() {
            cs[c] = acc;
            acc += runs.len();
            for run_len in runs {
                bp.append(true);
                for _ in 1..run_len {
                    bp.append(false);
                }
            }
        }
        let b = RsVec::from_bit_vec(b);
        let bp = RsVec::from_bit_vec(bp);

        let mut f = [0u64; ALPHABET];
        let mut running = 0u64;
        for c in 0..ALPHABET {
            f[c] = running;
            running += char_counts[c];
        }

        let num_docs_sdap = read_header(prefix, "sdap")?;
        let num_docs_edap = read_header(prefix, "edap")?;
        if num_docs_sdap != num_docs_edap {
            return Err(Error::input_shape(
                path_for(prefix, "sdap"),
                "sdap/edap document counts disagree",
            ));
        }
        let num_docs = num_docs_sdap as usize;
        let sdap = read_profile_matrix(prefix, "sdap", num_docs, r)?;
        let edap = read_profile_matrix(prefix, "edap", num_docs, r)?;

        Ok(DapIndex {
            s,
            b,
            bp,
            cs,
            f,
            len: len as usize,
            run_ssa,
            run_esa,
            run_threshold,
            run_lengths,
            num_docs,
            sdap,
            edap,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_runs(&self) -> usize {
        self.run_lengths.len()
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    /// `F[c]`: the number of BWT characters strictly less than `c`.
    pub fn f(&self, c: u8) -> u64 {
        self.f[c as usize]
    }

    /// `BWT[i]`.
    pub fn get_l(&self, i: usize) -> u8 {
        self.s.get_u64_unchecked(self.b.rank1(i + 1) - 1) as u8
    }

    /// Number of occurrences of `c` in `BWT[0..i)`.
    pub fn rank(&self, i: usize, c: u8) -> usize {
        (self.lf_like(c, i) as u64 - self.f[c as usize]) as usize
    }

    /// `LF(i, c) = F[c] + rank(i, c)`: the row the backward search lands on
    /// after prepending `c`, given the current interval starts/ends at `i`.
    pub fn lf(&self, i: usize, c: u8) -> usize {
        self.f[c as usize] as usize + self.rank(i, c)
    }

    fn lf_like(&self, c: u8, i: usize) -> usize {
        let j = self.b.rank1(i);
        let nr = self.s.rank_u64_unchecked(j, c as u64);
        let base = self.bp.select1(self.cs[c as usize] + nr);
        if self.get_l(i) == c {
            base + i - self.b.select1(j)
        } else {
            base
        }
    }

    /// The run index containing BWT position `i`.
    pub fn run_of(&self, i: usize) -> usize {
        self.b.rank1(i + 1) - 1
    }

    pub fn run_len(&self, run: usize) -> u64 {
        self.run_lengths[run]
    }

    pub fn run_threshold(&self, run: usize) -> u64 {
        self.run_threshold[run]
    }

    pub fn run_ssa(&self, run: usize) -> u64 {
        self.run_ssa[run]
    }

    pub fn run_esa(&self, run: usize) -> u64 {
        self.run_esa[run]
    }

    /// The document-array profile recorded at the start of `run`.
    pub fn start_profile(&self, run: usize) -> &[u64] {
        let d = self.num_docs;
        &self.sdap[run * d..(run + 1) * d]
    }

    /// The document-array profile recorded at the end of `run`.
    pub fn end_profile(&self, run: usize) -> &[u64] {
        let d = self.num_docs;
        &self.edap[run * d..(run + 1) * d]
    }
}

fn path_for(prefix: &Path, ext: &str) -> std::path::PathBuf {
    let mut s = prefix.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    std::path::PathBuf::from(s)
}

fn read_whole(prefix: &Path, ext: &str) -> Result<Vec<u8>> {
    let path = path_for(prefix, ext);
    let mut buf = Vec::new();
    File::open(&path)
        .map_err(|e| Error::input_missing(&path, e))?
        .read_to_end(&mut buf)
        .map_err(|e| Error::io_failure(&path, e))?;
    Ok(buf)
}

fn read_fixed_width(bytes: &[u8], width: usize, count: usize, prefix: &Path, ext: &str) -> Result<Vec<u64>> {
    if bytes.len() != width * count {
        return Err(Error::input_shape(path_for(prefix, ext), "unexpected stream size"));
    }
    Ok((0..count).map(|k| read_le(&bytes[k * width..(k + 1) * width])).collect())
}

fn read_header(prefix: &Path, ext: &str) -> Result<u64> {
    let bytes = read_whole(prefix, ext)?;
    if bytes.len() < 8 {
        return Err(Error::input_shape(path_for(prefix, ext), "missing document-count header"));
    }
    Ok(u64::from_le_bytes(bytes[0..8].try_into().unwrap()))
}

fn read_profile_matrix(prefix: &Path, ext: &str, num_docs: usize, num_runs: usize) -> Result<Vec<u64>> {
    let bytes = read_whole(prefix, ext)?;
    let expected = 8 + 8 * num_docs * num_runs;
    if bytes.len() != expected {
        return Err(Error::input_shape(
            path_for(prefix, ext),
            format!("expected {expected} bytes for {num_runs} runs x {num_docs} docs, got {}", bytes.len()),
        ));
    }
    let mut out = Vec::with_capacity(num_docs * num_runs);
    let mut off = 8;
    for _ in 0..(num_docs * num_runs) {
        out.push(u64::from_le_bytes(bytes[off..off + 8].try_into().unwrap()));
        off += 8;
    }
    Ok(out)
}
