//! Suffix array construction, used to build the dictionary's suffix array
//! in [`crate::pfp::construct`].

pub mod sais;
