//! Error types for KR decoding
//!
//! Decoding is all-or-nothing: any of these errors aborts the current
//! constituent with no partial result. The taxonomy separates input errors
//! (grammar violations, missing derivation markers, excessive nesting) from
//! internal faults (round-trip mismatches, broken parser invariants).

use std::fmt;

/// Errors that can occur while decoding a KR code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Malformed bracket/angle structure or a character the grammar rejects
    GrammarViolation { fragment: String, reason: String },
    /// A non-final chain position without the required decorator group
    MissingDerivationMarker { position: usize, segment: String },
    /// The canonical rendering differs from the source token, so the parser
    /// and the renderer disagree about what was read
    RoundTripMismatch { input: String, rendered: String },
    /// An internal invariant broke; a fault in the decoder, not the input
    ParserInvariantViolation { detail: String },
    /// Nesting beyond the supported depth
    NestingTooDeep { limit: usize },
}

impl DecodeError {
    /// True for errors caused by the input itself, false for errors that
    /// indicate a defect inside the decoder.
    pub fn is_input_error(&self) -> bool {
        match self {
            DecodeError::GrammarViolation { .. } => true,
            DecodeError::MissingDerivationMarker { .. } => true,
            DecodeError::NestingTooDeep { .. } => true,
            DecodeError::RoundTripMismatch { .. } => false,
            DecodeError::ParserInvariantViolation { .. } => false,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::GrammarViolation { fragment, reason } => {
                write!(f, "grammar violation in '{}': {}", fragment, reason)
            }
            DecodeError::MissingDerivationMarker { position, segment } => {
                write!(
                    f,
                    "chain position {} ('{}') has no derivation marker",
                    position, segment
                )
            }
            DecodeError::RoundTripMismatch { input, rendered } => {
                write!(
                    f,
                    "round-trip mismatch: '{}' renders back as '{}'",
                    input, rendered
                )
            }
            DecodeError::ParserInvariantViolation { detail } => {
                write!(f, "parser invariant violated: {}", detail)
            }
            DecodeError::NestingTooDeep { limit } => {
                write!(f, "nesting exceeds the supported depth of {}", limit)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Type alias for decoder results
pub type DecodeResult<T> = Result<T, DecodeError>;
