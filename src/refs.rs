//! C1: `RefCatalog` — document boundaries over the concatenated reference text.
//!
//! Holds the monotone sequence of document end positions `E[0..d-1]` and answers
//! `doc_of(p)` by rank over a succinct bitvector (`vers_vecs::RsVec`), rather than by
//! a linear or cursor-based scan, since the builder queries it in suffix-array order
//! and not left-to-right text order.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vers_vecs::{BitVec, RsVec};

use crate::error::{Error, Result};

/// A unique id identifying a single document in a text.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct DocId(usize);

impl From<usize> for DocId {
    fn from(value: usize) -> Self {
        DocId(value)
    }
}

impl From<DocId> for usize {
    fn from(value: DocId) -> usize {
        value.0
    }
}

/// Separator byte appended after every document but the last.
pub const DOC_SEPARATOR: u8 = 0x01;
/// Sentinel byte appended once, after the final document, ending `T`.
pub const TERMINATOR: u8 = 0x00;

/// Document boundaries over a concatenated reference text `T`.
///
/// `doc_of(p) = |{k : E[k] <= p}|`, clamped into `[0, d-1]` (the clamp only bites at
/// `p == n - 1`, the terminator position, where the raw count would be `d`).
#[derive(Debug, Serialize, Deserialize)]
pub struct RefCatalog {
    n: usize,
    doc_ends: Vec<usize>,
    #[serde(skip)]
    ends_rank: Option<RsVec>,
}

impl RefCatalog {
    /// Builds a catalog directly from already-known total length and document ends.
    pub fn new(n: usize, doc_ends: Vec<usize>) -> Result<Self> {
        if doc_ends.is_empty() {
            return Err(Error::invariant("a reference catalog needs at least one document"));
        }
        for w in doc_ends.windows(2) {
            if w[0] >= w[1] {
                return Err(Error::invariant("document ends must be strictly increasing"));
            }
        }
        if *doc_ends.last().unwrap() != n - 1 {
            return Err(Error::invariant("last document end must equal n - 1"));
        }
        let mut catalog = RefCatalog {
            n,
            doc_ends,
            ends_rank: None,
        };
        catalog.build_rank_support();
        Ok(catalog)
    }

    fn build_rank_support(&mut self) {
        let mut bits = BitVec::from_zeros(self.n);
        for &e in &self.doc_ends {
            bits.set(e, 1).expect("doc end within text bounds");
        }
        self.ends_rank = Some(RsVec::from_bit_vec(bits));
    }

    pub fn num_docs(&self) -> usize {
        self.doc_ends.len()
    }

    pub fn total_length(&self) -> usize {
        self.n
    }

    pub fn doc_ends(&self) -> &[usize] {
        &self.doc_ends
    }

    /// The document owning text position `p`, `0 <= p < n`.
    pub fn doc_of(&self, p: usize) -> DocId {
        debug_assert!(p < self.n);
        let rank = self
            .ends_rank
            .as_ref()
            .expect("rank support built in new()")
            .rank1(p + 1);
        let d = self.num_docs();
        DocId(rank.min(d - 1))
    }

    /// Concatenates the files listed (one path per line) in `file_list` into
    /// `<prefix>.fna`, appending a separator after each document and the global
    /// terminator after the last, and persists the document boundaries to
    /// `<prefix>.docs.json`. Returns the constructed catalog and the path to the
    /// concatenated text.
    pub fn build_from_file_list(file_list: &Path, prefix: &Path) -> Result<(Self, PathBuf)> {
        let list_file = File::open(file_list)
            .map_err(|e| Error::input_missing(file_list, e))?;
        let reader = BufReader::new(list_file);

        let fna_path = with_extension(prefix, "fna");
        let mut out = BufWriter::new(
            File::create(&fna_path).map_err(|e| Error::io_failure(&fna_path, e))?,
        );

        let mut doc_ends = Vec::new();
        let mut pos: usize = 0;
        let mut paths = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| Error::io_failure(file_list, e))?;
            let path = line.trim();
            if path.is_empty() {
                continue;
            }
            paths.push(PathBuf::from(path));
        }
        if paths.is_empty() {
            return Err(Error::input_shape(file_list, "file list is empty"));
        }

        let num_docs = paths.len();
        for (i, path) in paths.iter().enumerate() {
            let mut buf = Vec::new();
            File::open(path)
                .map_err(|e| Error::input_missing(path, e))?
                .read_to_end(&mut buf)
                .map_err(|e| Error::io_failure(path, e))?;
            out.write_all(&buf)
                .map_err(|e| Error::io_failure(&fna_path, e))?;
            pos += buf.len();

            let sep = if i + 1 == num_docs {
                TERMINATOR
            } else {
                DOC_SEPARATOR
            };
            out.write_all(&[sep])
                .map_err(|e| Error::io_failure(&fna_path, e))?;
            doc_ends.push(pos);
            pos += 1;
        }
        out.flush().map_err(|e| Error::io_failure(&fna_path, e))?;

        let catalog = RefCatalog::new(pos, doc_ends)?;
        catalog.persist(prefix)?;
        log::info!(
            "built reference catalog: {} documents, {} bytes",
            catalog.num_docs(),
            catalog.total_length()
        );
        Ok((catalog, fna_path))
    }

    /// Persists the document boundaries (not the text) to `<prefix>.docs.json`.
    pub fn persist(&self, prefix: &Path) -> Result<()> {
        let side_path = with_extension(prefix, "docs.json");
        let sidecar = Sidecar {
            n: self.n,
            doc_ends: self.doc_ends.clone(),
        };
        let f = File::create(&side_path).map_err(|e| Error::io_failure(&side_path, e))?;
        serde_json::to_writer(f, &sidecar)
            .map_err(|e| Error::input_shape(&side_path, e.to_string()))?;
        Ok(())
    }

    /// Reloads a catalog previously written by [`RefCatalog::persist`].
    pub fn load(prefix: &Path) -> Result<Self> {
        let side_path = with_extension(prefix, "docs.json");
        let f = File::open(&side_path).map_err(|e| Error::input_missing(&side_path, e))?;
        let sidecar: Sidecar = serde_json::from_reader(f)
            .map_err(|e| Error::input_shape(&side_path, e.to_string()))?;
        RefCatalog::new(sidecar.n, sidecar.doc_ends)
    }
}

#[derive(Serialize, Deserialize)]
struct Sidecar {
    n: usize,
    doc_ends: Vec<usize>,
}

fn with_extension(prefix: &Path, ext: &str) -> PathBuf {
    let mut s = prefix.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_doc_of_two_docs() {
        // T = "ACAA" + sep + "GG" + term, n = 4 + 1 + 2 + 1 = 8
        let n = 8;
        let doc_ends = vec![4, 7];
        let catalog = RefCatalog::new(n, doc_ends).unwrap();
        assert_eq!(catalog.num_docs(), 2);
        for p in 0..=3 {
            assert_eq!(usize::from(catalog.doc_of(p)), 0, "position {p}");
        }
        assert_eq!(usize::from(catalog.doc_of(4)), 1); // first document's separator
        for p in 5..=6 {
            assert_eq!(usize::from(catalog.doc_of(p)), 1, "position {p}");
        }
        assert_eq!(usize::from(catalog.doc_of(7)), 1); // terminator, clamped
    }

    #[test]
    fn test_doc_of_monotone() {
        let n = 20;
        let doc_ends = vec![3, 9, 19];
        let catalog = RefCatalog::new(n, doc_ends).unwrap();
        let mut prev = 0usize;
        for p in 0..n {
            let d = usize::from(catalog.doc_of(p));
            assert!(d >= prev);
            prev = d;
        }
        assert_eq!(prev, catalog.num_docs() - 1);
    }

    #[test]
    fn test_build_from_file_list_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let f1 = dir.path().join("a.txt");
        let f2 = dir.path().join("b.txt");
        std::fs::write(&f1, b"ACGT").unwrap();
        std::fs::write(&f2, b"TTGG").unwrap();

        let list_path = dir.path().join("list.txt");
        let mut list = File::create(&list_path).unwrap();
        writeln!(list, "{}", f1.display()).unwrap();
        writeln!(list, "{}", f2.display()).unwrap();
        drop(list);

        let prefix = dir.path().join("out");
        let (catalog, fna_path) =
            RefCatalog::build_from_file_list(&list_path, &prefix).unwrap();

        assert_eq!(catalog.num_docs(), 2);
        assert_eq!(catalog.total_length(), 10); // 4 + 1 + 4 + 1
        let text = std::fs::read(&fna_path).unwrap();
        assert_eq!(text, b"ACGT\x01TTGG\x00");

        let reloaded = RefCatalog::load(&prefix).unwrap();
        assert_eq!(reloaded.doc_ends(), catalog.doc_ends());
        assert_eq!(reloaded.total_length(), catalog.total_length());
    }
}
