//! Test utilities for the Parcel crates.
//!
//! This crate writes the on-disk structures the readers consume:
//! - Thrift compact-protocol page headers
//! - Plain, dictionary-index and level encodings
//! - Compressed column chunks and whole files with matching metadata
//! - Canned fixtures shared by the reader test suites
//!
//! It is intended for tests only and panics on misuse.

pub mod chunk;
pub mod compress;
pub mod encode;
pub mod file;
pub mod fixtures;
pub mod thrift;
