//! # krcode
//!
//! A decoder for KR codes: the compact linear notation used by Hungarian
//! morphological analyzers to encode a word's part of speech, inflectional
//! attributes and full derivational history.
//!
//! The decoder parses a code into an owned tree structure, validates the
//! result by rendering it back and comparing it with the source token, and
//! flattens the selected constituent into a nested attribute dictionary
//! with category defaults filled in. The decoder is tag-agnostic: it parses
//! structure, not the semantics of any particular tagset.
//!
//! Decoding is pure and synchronous; every call owns its values, so
//! independent inputs may be decoded from separate threads without
//! coordination.

pub mod kr;
