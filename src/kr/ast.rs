//! Value types for decoded KR codes
//!
//! A KR code is a compact linear notation for one word's morphological
//! analysis. [`Node`] holds one `<head<qualifier>>` tree, [`KrCode`] one
//! "/"-chained constituent, and [`Compound`] the "+"-joined whole.
//!
//! The `Display` impls are the canonical renderer: for every accepted input
//! they reproduce the source text exactly, and the parser relies on that to
//! validate its own output.

use std::fmt;

/// One level of a `<...>`-nested category tree.
///
/// The value is assigned exactly once during parsing, before any child is
/// attached; children are owned exclusively by their parent and keep their
/// source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    pub value: String,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new() -> Self {
        Self {
            value: String::new(),
            children: Vec::new(),
        }
    }

    pub fn leaf(value: &str) -> Self {
        Self {
            value: value.to_string(),
            children: Vec::new(),
        }
    }

    pub fn with_children(value: &str, children: Vec<Node>) -> Self {
        Self {
            value: value.to_string(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        for child in &self.children {
            write!(f, "<{}>", child)?;
        }
        Ok(())
    }
}

/// One "/"-chained constituent of a KR code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KrCode {
    /// Lexical root, with any `{...}` ambiguity marker stripped.
    pub stem: String,
    /// The stripped ambiguity marker, if the stem carried one.
    pub ambiguity: Option<String>,
    /// One tree per "/"-separated chain position.
    pub chain_nodes: Vec<Node>,
    /// Decorator groups, aligned with the chain: every position except
    /// possibly the last carries one.
    pub decorator_groups: Vec<Vec<Node>>,
}

impl KrCode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decorators may lag the chain by at most one position, and every
    /// group carries at least one decorator.
    pub fn chain_invariant_holds(&self) -> bool {
        let nodes = self.chain_nodes.len();
        let groups = self.decorator_groups.len();
        nodes >= groups
            && nodes - groups <= 1
            && self.decorator_groups.iter().all(|group| !group.is_empty())
    }
}

impl fmt::Display for KrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_assert!(self.chain_invariant_holds());
        write!(f, "{}", self.stem)?;
        if let Some(marker) = &self.ambiguity {
            write!(f, "{{{}}}", marker)?;
        }
        write!(f, "/")?;
        let last = self.chain_nodes.len().saturating_sub(1);
        for (i, node) in self.chain_nodes.iter().enumerate() {
            write!(f, "{}", node)?;
            if let Some(group) = self.decorator_groups.get(i) {
                for decorator in group {
                    write!(f, "[{}]", decorator)?;
                }
            }
            if i < last {
                write!(f, "/")?;
            }
        }
        Ok(())
    }
}

/// All "+"-joined constituents of one code, in source order.
///
/// Constituents share no state; each is a fully independent analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Compound {
    pub constituents: Vec<KrCode>,
}

impl Compound {
    pub fn new(constituents: Vec<KrCode>) -> Self {
        Self { constituents }
    }

    pub fn first(&self) -> Option<&KrCode> {
        self.constituents.first()
    }

    pub fn len(&self) -> usize {
        self.constituents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constituents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KrCode> {
        self.constituents.iter()
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, constituent) in self.constituents.iter().enumerate() {
            if i > 0 {
                write!(f, "+")?;
            }
            write!(f, "{}", constituent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_display_leaf() {
        assert_eq!(Node::leaf("NOUN").to_string(), "NOUN");
    }

    #[test]
    fn test_node_display_nested() {
        let node = Node::with_children(
            "IGE",
            vec![Node::with_children("MOD", vec![Node::leaf("FELT")])],
        );
        assert_eq!(node.to_string(), "IGE<MOD<FELT>>");
    }

    #[test]
    fn test_node_display_sibling_qualifiers() {
        let node = Node::with_children("NOUN", vec![Node::leaf("PLUR"), Node::leaf("ACC")]);
        assert_eq!(node.to_string(), "NOUN<PLUR><ACC>");
    }

    #[test]
    fn test_krcode_display_with_decorators() {
        let mut code = KrCode::new();
        code.stem = "alapszó".to_string();
        code.chain_nodes = vec![Node::leaf("FN"), Node::leaf("IGE")];
        code.decorator_groups = vec![vec![Node::leaf("IGE")]];
        assert_eq!(code.to_string(), "alapszó/FN[IGE]/IGE");
    }

    #[test]
    fn test_krcode_display_reattaches_ambiguity_marker() {
        let mut code = KrCode::new();
        code.stem = "vár".to_string();
        code.ambiguity = Some("1".to_string());
        code.chain_nodes = vec![Node::leaf("NOUN")];
        assert_eq!(code.to_string(), "vár{1}/NOUN");
    }

    #[test]
    fn test_chain_invariant() {
        let mut code = KrCode::new();
        code.chain_nodes = vec![Node::leaf("A"), Node::leaf("B")];
        code.decorator_groups = vec![vec![Node::leaf("X")]];
        assert!(code.chain_invariant_holds());

        code.decorator_groups.clear();
        assert!(!code.chain_invariant_holds());
    }

    #[test]
    fn test_chain_invariant_rejects_empty_decorator_group() {
        let mut code = KrCode::new();
        code.chain_nodes = vec![Node::leaf("A"), Node::leaf("B")];
        code.decorator_groups = vec![Vec::new()];
        assert!(!code.chain_invariant_holds());
    }

    #[test]
    fn test_compound_display() {
        let mut a = KrCode::new();
        a.stem = "a".to_string();
        a.chain_nodes = vec![Node::leaf("CAT1")];
        let mut b = KrCode::new();
        b.stem = "b".to_string();
        b.chain_nodes = vec![Node::leaf("CAT2")];
        let compound = Compound::new(vec![a, b]);
        assert_eq!(compound.to_string(), "a/CAT1+b/CAT2");
    }
}
