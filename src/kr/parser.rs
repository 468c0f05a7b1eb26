//! Recursive-descent parsing of KR codes
//!
//! Grammar:
//!
//! ```text
//! COMPOUND     = CONSTITUENT ( "+" CONSTITUENT )*
//! CONSTITUENT  = STEM ( "/" DECORATED )+
//! DECORATED    = TREE ( "[" TREE "]" )*
//! TREE         = HEAD ( "<" TREE ">" )*
//! ```
//!
//! The stem may carry a trailing `{...}` ambiguity marker; heads are
//! uppercase ASCII variable names, stems are free text without the
//! structural characters `+ / [ ] < > { }`.
//!
//! Every accepted constituent is rendered back and compared with its source
//! token. The grammar is hand specified and ambiguous in places, so the
//! round-trip check is the primary defense against silent misparses.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::{Compound, KrCode, Node};
use super::error::{DecodeError, DecodeResult};

/// Depth cap for `<...>` nesting and for the derivation chain; input that
/// would reach this depth is rejected instead of recursing further.
pub const MAX_NESTING_DEPTH: usize = 64;

/// A stem carrying a trailing `{...}` ambiguity marker.
static MARKER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^{}]*)\{([^{}]*)\}$").expect("marker pattern is valid"));

// ============================================================================
// KR Tree Parser
// ============================================================================

/// Scans `code` from `pos`, filling `node`, and returns the offset just past
/// the consumed prefix. `>` closes one level and hands control back to the
/// caller; a head must be in place before any `<` opens a qualifier.
fn descent(code: &str, mut pos: usize, node: &mut Node, depth: usize) -> DecodeResult<usize> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(DecodeError::NestingTooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }
    while pos < code.len() {
        match code.as_bytes()[pos] {
            b'<' => {
                if node.value.is_empty() {
                    return Err(DecodeError::GrammarViolation {
                        fragment: code.to_string(),
                        reason: format!("qualifier at offset {} has no preceding head", pos),
                    });
                }
                let mut child = Node::new();
                pos = descent(code, pos + 1, &mut child, depth + 1)?;
                node.children.push(child);
            }
            b'>' => return Ok(pos + 1),
            _ => {
                let next = code[pos..]
                    .find(['<', '>'])
                    .map(|i| pos + i)
                    .unwrap_or(code.len());
                if !node.value.is_empty() {
                    return Err(DecodeError::ParserInvariantViolation {
                        detail: format!("value '{}' assigned twice in '{}'", node.value, code),
                    });
                }
                node.value = code[pos..next].to_string();
                pos = next;
            }
        }
    }
    Ok(pos)
}

/// Parses one bracket-free code fragment into a tree.
///
/// The fragment must be fully consumed; leftover input means an unbalanced
/// `>` closed the tree early.
pub fn parse_tree(code: &str) -> DecodeResult<Node> {
    let mut root = Node::new();
    let end = descent(code, 0, &mut root, 0)?;
    if end != code.len() {
        return Err(DecodeError::GrammarViolation {
            fragment: code.to_string(),
            reason: format!("unbalanced '>' at offset {}", end.saturating_sub(1)),
        });
    }
    Ok(root)
}

// ============================================================================
// Decorator Scanner
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Start,
    Out,
    In,
}

/// Characters accepted inside a decorator bracket. Decorators are pure KR
/// variable trees, never free stem text.
fn is_decorator_char(c: u8) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, b'_' | b'-' | b'<' | b'>')
}

/// Extracts the `[...]`-bracketed decorator sub-codes trailing a chain
/// position. `rest` starts at the first `[` of the segment; each bracket's
/// content is parsed into its own tree.
pub fn scan_decorators(rest: &str) -> DecodeResult<Vec<Node>> {
    let mut group = Vec::new();
    let mut state = ScanState::Start;
    let mut buffer = String::new();
    for (pos, c) in rest.bytes().enumerate() {
        match state {
            ScanState::Start | ScanState::Out => {
                if c != b'[' {
                    return Err(DecodeError::GrammarViolation {
                        fragment: rest.to_string(),
                        reason: format!("expected '[' at offset {}", pos),
                    });
                }
                state = ScanState::In;
                buffer.clear();
            }
            ScanState::In => {
                if c == b']' {
                    group.push(parse_tree(&buffer)?);
                    state = ScanState::Out;
                } else if is_decorator_char(c) {
                    buffer.push(c as char);
                } else {
                    return Err(DecodeError::GrammarViolation {
                        fragment: rest.to_string(),
                        reason: format!(
                            "character at offset {} is not allowed inside a decorator",
                            pos
                        ),
                    });
                }
            }
        }
    }
    if state == ScanState::In {
        return Err(DecodeError::GrammarViolation {
            fragment: rest.to_string(),
            reason: "unterminated decorator bracket".to_string(),
        });
    }
    Ok(group)
}

// ============================================================================
// Constituent Parser
// ============================================================================

/// Splits a raw stem into the real stem and its optional ambiguity marker.
fn split_stem(stem: &str) -> DecodeResult<(String, Option<String>)> {
    if stem.contains(['<', '>', '[', ']']) {
        return Err(DecodeError::GrammarViolation {
            fragment: stem.to_string(),
            reason: "stem contains structural characters".to_string(),
        });
    }
    if stem.ends_with('}') {
        match MARKER_PATTERN.captures(stem) {
            Some(caps) => Ok((caps[1].to_string(), Some(caps[2].to_string()))),
            None => Err(DecodeError::GrammarViolation {
                fragment: stem.to_string(),
                reason: "malformed ambiguity marker".to_string(),
            }),
        }
    } else if stem.contains('{') {
        Err(DecodeError::GrammarViolation {
            fragment: stem.to_string(),
            reason: "'{' without a closing ambiguity marker".to_string(),
        })
    } else {
        Ok((stem.to_string(), None))
    }
}

/// Parses one "/"-joined constituent token into a [`KrCode`].
///
/// Chain rules: every position except the last must carry at least one
/// decorator, and only the first position may leave its main category empty
/// (a word may derive its category purely through the decorator). The built
/// value is rendered back and compared with `token` before being returned.
pub fn parse_constituent(token: &str) -> DecodeResult<KrCode> {
    let segments: Vec<&str> = token.split('/').collect();
    let (stem, ambiguity) = split_stem(segments[0])?;

    let mut code = KrCode::new();
    code.stem = stem;
    code.ambiguity = ambiguity;

    let chain = &segments[1..];
    for (i, segment) in chain.iter().enumerate() {
        let bracket = segment.find('[');
        if bracket.is_none() && i + 1 != chain.len() {
            eprintln!("MISSING DERIVATION MARKER: {}", segment);
            return Err(DecodeError::MissingDerivationMarker {
                position: i,
                segment: segment.to_string(),
            });
        }
        let main_len = bracket.unwrap_or(segment.len());
        if main_len == 0 && i != 0 {
            eprintln!(
                "SUBCATEGORIZATION (EMPTY MAIN CATEGORY) IS ONLY ALLOWED AT THE FIRST POSITION: {}",
                segment
            );
            return Err(DecodeError::GrammarViolation {
                fragment: segment.to_string(),
                reason: format!("empty main category at chain position {}", i),
            });
        }
        code.chain_nodes.push(parse_tree(&segment[..main_len])?);
        if let Some(start) = bracket {
            let group = scan_decorators(&segment[start..])?;
            if !group.is_empty() {
                code.decorator_groups.push(group);
            }
        }
    }

    let rendered = code.to_string();
    if rendered != token {
        return Err(DecodeError::RoundTripMismatch {
            input: token.to_string(),
            rendered,
        });
    }
    Ok(code)
}

// ============================================================================
// Compound Analyzer
// ============================================================================

/// Splits a full code on top-level "+" and parses each constituent. No
/// cross-constituent checks are performed; "+" never nests inside brackets
/// in valid input.
pub fn parse_compound(code: &str) -> DecodeResult<Compound> {
    let mut constituents = Vec::new();
    for token in code.split('+') {
        constituents.push(parse_constituent(token)?);
    }
    Ok(Compound::new(constituents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree_leaf() {
        let node = parse_tree("NOUN").unwrap();
        assert_eq!(node, Node::leaf("NOUN"));
    }

    #[test]
    fn test_parse_tree_nested() {
        let node = parse_tree("IGE<MOD<FELT>>").unwrap();
        assert_eq!(
            node,
            Node::with_children(
                "IGE",
                vec![Node::with_children("MOD", vec![Node::leaf("FELT")])]
            )
        );
    }

    #[test]
    fn test_parse_tree_siblings() {
        let node = parse_tree("NOUN<PLUR><CAS<ACC>>").unwrap();
        assert_eq!(node.value, "NOUN");
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0], Node::leaf("PLUR"));
        assert_eq!(node.children[1].value, "CAS");
    }

    #[test]
    fn test_parse_tree_empty_is_valid() {
        // The first chain position may leave its category empty.
        let node = parse_tree("").unwrap();
        assert_eq!(node, Node::new());
    }

    #[test]
    fn test_qualifier_without_head_is_grammar_violation() {
        let err = parse_tree("<FELT>").unwrap_err();
        assert!(matches!(err, DecodeError::GrammarViolation { .. }));
    }

    #[test]
    fn test_value_after_closed_child_is_invariant_violation() {
        let err = parse_tree("A<B>C").unwrap_err();
        assert!(matches!(err, DecodeError::ParserInvariantViolation { .. }));
    }

    #[test]
    fn test_nesting_depth_is_capped() {
        let mut code = "A".to_string();
        for _ in 0..(MAX_NESTING_DEPTH + 4) {
            code = format!("A<{}>", code);
        }
        let err = parse_tree(&code).unwrap_err();
        assert!(matches!(err, DecodeError::NestingTooDeep { .. }));
    }

    #[test]
    fn test_nesting_depth_cap_is_exclusive() {
        let mut code = "A".to_string();
        for _ in 0..(MAX_NESTING_DEPTH - 1) {
            code = format!("A<{}>", code);
        }
        assert!(parse_tree(&code).is_ok());

        let code = format!("A<{}>", code);
        let err = parse_tree(&code).unwrap_err();
        assert!(matches!(err, DecodeError::NestingTooDeep { .. }));
    }

    #[test]
    fn test_scan_single_decorator() {
        let group = scan_decorators("[IGE]").unwrap();
        assert_eq!(group, vec![Node::leaf("IGE")]);
    }

    #[test]
    fn test_scan_decorator_with_tree() {
        let group = scan_decorators("[MED<CAUS>]").unwrap();
        assert_eq!(
            group,
            vec![Node::with_children("MED", vec![Node::leaf("CAUS")])]
        );
    }

    #[test]
    fn test_scan_multiple_decorators() {
        let group = scan_decorators("[IGE][FN]").unwrap();
        assert_eq!(group, vec![Node::leaf("IGE"), Node::leaf("FN")]);
    }

    #[test]
    fn test_scan_rejects_text_between_brackets() {
        let err = scan_decorators("[IGE]x[FN]").unwrap_err();
        assert!(matches!(err, DecodeError::GrammarViolation { .. }));
    }

    #[test]
    fn test_scan_rejects_lowercase_inside_bracket() {
        let err = scan_decorators("[ige]").unwrap_err();
        assert!(matches!(err, DecodeError::GrammarViolation { .. }));
    }

    #[test]
    fn test_scan_rejects_unterminated_bracket() {
        let err = scan_decorators("[IGE").unwrap_err();
        assert!(matches!(err, DecodeError::GrammarViolation { .. }));
    }

    #[test]
    fn test_parse_constituent_simple() {
        let code = parse_constituent("kéz/NOUN").unwrap();
        assert_eq!(code.stem, "kéz");
        assert_eq!(code.chain_nodes, vec![Node::leaf("NOUN")]);
        assert!(code.decorator_groups.is_empty());
    }

    #[test]
    fn test_parse_constituent_derivation_chain() {
        let code = parse_constituent("alapszó/FN[IGE]/IGE<MOD<FELT>>").unwrap();
        assert_eq!(code.stem, "alapszó");
        assert_eq!(code.chain_nodes.len(), 2);
        assert_eq!(code.chain_nodes[0], Node::leaf("FN"));
        assert_eq!(code.chain_nodes[1].value, "IGE");
        assert_eq!(code.decorator_groups, vec![vec![Node::leaf("IGE")]]);
        assert!(code.chain_invariant_holds());
    }

    #[test]
    fn test_parse_constituent_strips_ambiguity_marker() {
        let code = parse_constituent("vár{2}/NOUN").unwrap();
        assert_eq!(code.stem, "vár");
        assert_eq!(code.ambiguity, Some("2".to_string()));
        assert_eq!(code.to_string(), "vár{2}/NOUN");
    }

    #[test]
    fn test_parse_constituent_rejects_marker_without_open_brace() {
        let err = parse_constituent("vár2}/NOUN").unwrap_err();
        assert!(matches!(err, DecodeError::GrammarViolation { .. }));
    }

    #[test]
    fn test_parse_constituent_rejects_unclosed_marker() {
        let err = parse_constituent("vá{r/NOUN").unwrap_err();
        assert!(matches!(err, DecodeError::GrammarViolation { .. }));
    }

    #[test]
    fn test_parse_constituent_rejects_structural_chars_in_stem() {
        let err = parse_constituent("vá<r/NOUN").unwrap_err();
        assert!(matches!(err, DecodeError::GrammarViolation { .. }));
    }

    #[test]
    fn test_missing_derivation_marker() {
        let err = parse_constituent("x/NOUN/NOUN<CAS<NOM>>").unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingDerivationMarker {
                position: 0,
                segment: "NOUN".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_main_category_allowed_at_first_position() {
        let code = parse_constituent("fut/[IGE]/IGE").unwrap();
        assert_eq!(code.chain_nodes[0], Node::new());
        assert_eq!(code.decorator_groups, vec![vec![Node::leaf("IGE")]]);
    }

    #[test]
    fn test_empty_main_category_rejected_later() {
        let err = parse_constituent("fut/FN[IGE]/[IGE]").unwrap_err();
        assert!(matches!(err, DecodeError::GrammarViolation { .. }));
    }

    #[test]
    fn test_round_trip_mismatch_on_stray_close() {
        // A stray '>' parses as an early close; the renderer exposes it.
        let err = parse_constituent("x/A>").unwrap_err();
        assert!(matches!(err, DecodeError::RoundTripMismatch { .. }));
    }

    #[test]
    fn test_round_trip_mismatch_on_unclosed_qualifier() {
        let err = parse_constituent("x/A<B").unwrap_err();
        assert!(matches!(err, DecodeError::RoundTripMismatch { .. }));
    }

    #[test]
    fn test_parse_compound_splits_on_plus() {
        let compound = parse_compound("a/CAT1+b/CAT2").unwrap();
        assert_eq!(compound.len(), 2);
        assert_eq!(compound.constituents[0].stem, "a");
        assert_eq!(compound.constituents[1].stem, "b");
        assert_eq!(compound.to_string(), "a/CAT1+b/CAT2");
    }

    #[test]
    fn test_parse_compound_propagates_constituent_errors() {
        let err = parse_compound("a/CAT1+b/<X>").unwrap_err();
        assert!(matches!(err, DecodeError::GrammarViolation { .. }));
    }
}
