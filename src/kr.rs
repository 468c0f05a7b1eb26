//! Main module for KR decoding functionality

pub mod ast;
pub mod attributes;
pub mod error;
pub mod parser;
pub mod reader;

pub use ast::{Compound, KrCode, Node};
pub use attributes::{apply_defaults, decode, AttrValue, AttributeMap};
pub use error::{DecodeError, DecodeResult};
pub use parser::{parse_compound, parse_constituent, parse_tree};
