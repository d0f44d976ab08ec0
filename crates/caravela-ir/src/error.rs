//! Typed failure surface for the IR core.
//!
//! Every variant here is evidence of a construction bug in the embedding
//! tool, not a runtime condition to recover from. The default entry points
//! fail fast (panic with the error's message); `try_*` twins return the
//! error so a builder can catch the category before it escalates.

use thiserror::Error;

/// The three ways IR construction or rendering can go wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IrError {
    /// An arena chunk cannot hold a requested allocation.
    #[error("arena capacity violation: {0}")]
    Capacity(String),

    /// The printer was asked to render an operator with no textual form.
    #[error("unmapped operator: {0}")]
    UnmappedOperator(String),

    /// The `none` type, an unsupported access width, or a nonzero offset
    /// appeared where the data model forbids it.
    #[error("invalid type usage: {0}")]
    InvalidType(String),
}

impl IrError {
    pub fn capacity(msg: impl Into<String>) -> Self {
        IrError::Capacity(msg.into())
    }

    pub fn unmapped_operator(msg: impl Into<String>) -> Self {
        IrError::UnmappedOperator(msg.into())
    }

    pub fn invalid_type(msg: impl Into<String>) -> Self {
        IrError::InvalidType(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_distinguishable() {
        let errors = [
            IrError::capacity("chunk of 0 nodes"),
            IrError::unmapped_operator("unary Sqrt"),
            IrError::invalid_type("none as operand"),
        ];
        assert!(matches!(errors[0], IrError::Capacity(_)));
        assert!(matches!(errors[1], IrError::UnmappedOperator(_)));
        assert!(matches!(errors[2], IrError::InvalidType(_)));
    }

    #[test]
    fn test_display_names_the_category() {
        let err = IrError::invalid_type("the none type has no size");
        assert_eq!(
            err.to_string(),
            "invalid type usage: the none type has no size"
        );
    }
}
