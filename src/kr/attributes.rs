//! Flattened attribute dictionaries for decoded KR codes
//!
//! A constituent's chain is folded into a nested dictionary: the last chain
//! position contributes the surface category and inflection attributes, and
//! each earlier position is reachable through a `SRC` record holding the
//! derivation step (`DERIV`) and the underlying stem analysis (`STEM`).

use std::collections::BTreeMap;

use serde::Serialize;

use super::ast::KrCode;
use super::error::{DecodeError, DecodeResult};
use super::parser::{parse_compound, MAX_NESTING_DEPTH};

/// A scalar or nested attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Presence flag for a qualifier that carries no value of its own.
    Flag(u8),
    Text(String),
    Nested(AttributeMap),
}

impl AttrValue {
    pub fn text(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&AttributeMap> {
        match self {
            AttrValue::Nested(map) => Some(map),
            _ => None,
        }
    }
}

/// Mapping from attribute name to value. Ordered for stable output.
pub type AttributeMap = BTreeMap<String, AttrValue>;

/// Builds the dictionary for chain position `i`, walking the derivation
/// chain backwards through nested `SRC.STEM` records.
fn build_attributes(code: &KrCode, i: usize) -> AttributeMap {
    let node = &code.chain_nodes[i];
    let mut map = AttributeMap::new();
    map.insert("CAT".to_string(), AttrValue::text(&node.value));

    for child in &node.children {
        // A qualifier with no children is a bare presence flag; otherwise
        // its first child carries the value (deeper nesting is not
        // represented). PLUR is re-emitted as NUM=PLUR.
        let (attr, value) = if child.value == "PLUR" {
            ("NUM".to_string(), AttrValue::text("PLUR"))
        } else if child.children.is_empty() {
            (child.value.clone(), AttrValue::Flag(1))
        } else {
            (
                child.value.clone(),
                AttrValue::text(&child.children[0].value),
            )
        };
        map.insert(attr, value);
    }

    if i > 0 {
        let step = &code.decorator_groups[i - 1][0];
        let mut deriv = AttributeMap::new();
        deriv.insert("CAT".to_string(), AttrValue::text(&step.value));
        if let Some(first) = step.children.first() {
            deriv.insert("TYPE".to_string(), AttrValue::text(&first.value));
        }
        let mut src = AttributeMap::new();
        src.insert("DERIV".to_string(), AttrValue::Nested(deriv));
        src.insert(
            "STEM".to_string(),
            AttrValue::Nested(build_attributes(code, i - 1)),
        );
        map.insert("SRC".to_string(), AttrValue::Nested(src));
    }

    map
}

/// Converts a parsed constituent's chain into its attribute dictionary,
/// starting from the last chain position.
///
/// The backward walk recurses once per chain position, so chains past the
/// nesting cap are rejected up front.
pub fn constituent_attributes(code: &KrCode) -> DecodeResult<AttributeMap> {
    if code.chain_nodes.is_empty() || !code.chain_invariant_holds() {
        return Err(DecodeError::ParserInvariantViolation {
            detail: format!(
                "constituent '{}' has a malformed chain ({} nodes, {} decorator groups)",
                code.stem,
                code.chain_nodes.len(),
                code.decorator_groups.len()
            ),
        });
    }
    if code.chain_nodes.len() > MAX_NESTING_DEPTH {
        return Err(DecodeError::NestingTooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }
    Ok(build_attributes(code, code.chain_nodes.len() - 1))
}

/// Fills category defaults, walking down every nested `SRC.STEM` record.
/// Present values are never overwritten, so the operation is idempotent.
pub fn apply_defaults(map: &mut AttributeMap) {
    let mut current = map;
    loop {
        let cat = current
            .get("CAT")
            .and_then(AttrValue::as_text)
            .unwrap_or("")
            .to_string();
        if cat == "NOUN" {
            for (key, value) in [
                ("CAS", "NOM"),
                ("NUM", "SING"),
                ("ANP", "0"),
                ("DEF", "0"),
                ("POSS", "0"),
            ] {
                current
                    .entry(key.to_string())
                    .or_insert_with(|| AttrValue::text(value));
            }
        }
        if cat == "ADJ" {
            current
                .entry("CAS".to_string())
                .or_insert_with(|| AttrValue::text("NOM"));
        }
        let Some(AttrValue::Nested(src)) = current.get_mut("SRC") else {
            break;
        };
        let Some(AttrValue::Nested(stem)) = src.get_mut("STEM") else {
            break;
        };
        current = stem;
    }
}

/// Decodes a raw KR code into its attribute dictionary, with defaults
/// applied.
///
/// Only the first "+"-joined constituent is flattened, matching the
/// original behavior; the other constituents are still fully parsed and
/// round-trip validated.
pub fn decode(code: &str) -> DecodeResult<AttributeMap> {
    let compound = parse_compound(code)?;
    let first = compound
        .first()
        .ok_or_else(|| DecodeError::ParserInvariantViolation {
            detail: format!("'{}' produced an empty compound", code),
        })?;
    let mut map = constituent_attributes(first)?;
    apply_defaults(&mut map);
    Ok(map)
}
