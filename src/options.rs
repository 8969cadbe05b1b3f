//! Ambient configuration: build-time parameters, validated eagerly so a bad
//! combination fails before any output file is opened.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default Karp-Rabin window size, matching the reference PFP parser.
pub const DEFAULT_WINDOW: usize = 10;
/// Default hash modulus used to trigger phrase boundaries.
pub const DEFAULT_HASH_MOD: u64 = 100;

/// Parameters controlling a single `build` run: which files to index, where
/// to write the resulting streams, and how the parse is triggered.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub file_list: PathBuf,
    pub output_prefix: PathBuf,
    pub w: usize,
    pub hash_mod: u64,
}

impl BuildOptions {
    pub fn new(file_list: PathBuf, output_prefix: PathBuf, w: usize, hash_mod: u64) -> Result<Self> {
        if w == 0 {
            return Err(Error::invariant("window size w must be at least 1"));
        }
        if hash_mod == 0 {
            return Err(Error::invariant("hash modulus must be at least 1"));
        }
        Ok(BuildOptions {
            file_list,
            output_prefix,
            w,
            hash_mod,
        })
    }
}
