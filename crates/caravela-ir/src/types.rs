//! Value types, literals and symbolic names.
//!
//! The four concrete WebAssembly number types plus `none` ("no result"),
//! tagged literal values, and the `$`-prefixed identifiers used for
//! functions, locals, labels and type names.

use std::fmt;

use smol_str::SmolStr;

use crate::error::IrError;

/// WebAssembly value type.
///
/// `None` denotes "no result" and is never a valid operand type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ValueType {
    #[default]
    None,
    I32,
    I64,
    F32,
    F64,
}

impl ValueType {
    /// Returns the size in bytes. Asking for the size of `None` is fatal.
    pub fn size_of(self) -> u32 {
        self.try_size_of().unwrap_or_else(|e| panic!("{}", e))
    }

    /// Validating twin of [`size_of`](Self::size_of).
    pub fn try_size_of(self) -> Result<u32, IrError> {
        match self {
            ValueType::None => Err(IrError::invalid_type("the none type has no size")),
            ValueType::I32 | ValueType::F32 => Ok(4),
            ValueType::I64 | ValueType::F64 => Ok(8),
        }
    }

    /// Checks if this is one of the floating types.
    pub fn is_float(self) -> bool {
        matches!(self, ValueType::F32 | ValueType::F64)
    }

    /// The type produced by a memory access of `bytes` width.
    ///
    /// Narrow accesses (1 or 2 bytes) always widen to `I32`; 4- and 8-byte
    /// accesses pick the integer or floating type per `float`. Any other
    /// width is fatal.
    pub fn from_memory_access(bytes: u32, float: bool) -> Self {
        Self::try_from_memory_access(bytes, float).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Validating twin of [`from_memory_access`](Self::from_memory_access).
    pub fn try_from_memory_access(bytes: u32, float: bool) -> Result<Self, IrError> {
        match bytes {
            1 | 2 => Ok(ValueType::I32),
            4 => Ok(if float { ValueType::F32 } else { ValueType::I32 }),
            8 => Ok(if float { ValueType::F64 } else { ValueType::I64 }),
            other => Err(IrError::invalid_type(format!(
                "unsupported memory access width of {} bytes",
                other
            ))),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            ValueType::None => "none",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
        };
        write!(f, "{}", keyword)
    }
}

/// Symbolic identifier, rendered with a leading `$`.
///
/// Compared and ordered by value. Cloning is cheap; short names are stored
/// inline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(SmolStr);

impl Name {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Name(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Name::new(name)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the reference interpreter requires the $ prefix on all names
        write!(f, "${}", self.0)
    }
}

/// A numeric value tagged with its value type.
///
/// The original representation was a tag plus an untagged union, where
/// reading the wrong field was a contract violation; the enum makes that
/// misread unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Literal {
    pub fn value_type(&self) -> ValueType {
        match self {
            Literal::I32(_) => ValueType::I32,
            Literal::I64(_) => ValueType::I64,
            Literal::F32(_) => ValueType::F32,
            Literal::F64(_) => ValueType::F64,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::I32(v) => write!(f, "{}", v),
            Literal::I64(v) => write!(f, "{}", v),
            Literal::F32(v) => write_float_text(f, &v.to_string()),
            Literal::F64(v) => write_float_text(f, &v.to_string()),
        }
    }
}

/// Writes formatted float text, correcting bare-dot decimals.
///
/// The downstream text consumer rejects decimals that start with `.`, so a
/// leading `"."` becomes `"0."` and a leading `"-."` becomes `"-0."`. The
/// formatter itself must already be round-trip safe.
pub fn write_float_text(out: &mut impl fmt::Write, text: &str) -> fmt::Result {
    if let Some(rest) = text.strip_prefix("-.") {
        write!(out, "-0.{}", rest)
    } else if let Some(rest) = text.strip_prefix('.') {
        write!(out, "0.{}", rest)
    } else {
        out.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_of() {
        assert_eq!(ValueType::I32.size_of(), 4);
        assert_eq!(ValueType::F32.size_of(), 4);
        assert_eq!(ValueType::I64.size_of(), 8);
        assert_eq!(ValueType::F64.size_of(), 8);
        assert!(matches!(
            ValueType::None.try_size_of(),
            Err(IrError::InvalidType(_))
        ));
    }

    #[test]
    #[should_panic(expected = "invalid type usage")]
    fn test_size_of_none_is_fatal() {
        ValueType::None.size_of();
    }

    #[test]
    fn test_is_float() {
        assert!(ValueType::F32.is_float());
        assert!(ValueType::F64.is_float());
        assert!(!ValueType::I32.is_float());
        assert!(!ValueType::I64.is_float());
        assert!(!ValueType::None.is_float());
    }

    #[test]
    fn test_from_memory_access() {
        assert_eq!(ValueType::from_memory_access(1, false), ValueType::I32);
        assert_eq!(ValueType::from_memory_access(1, true), ValueType::I32);
        assert_eq!(ValueType::from_memory_access(2, false), ValueType::I32);
        assert_eq!(ValueType::from_memory_access(2, true), ValueType::I32);
        assert_eq!(ValueType::from_memory_access(4, false), ValueType::I32);
        assert_eq!(ValueType::from_memory_access(4, true), ValueType::F32);
        assert_eq!(ValueType::from_memory_access(8, false), ValueType::I64);
        assert_eq!(ValueType::from_memory_access(8, true), ValueType::F64);
    }

    #[test]
    fn test_from_memory_access_rejects_odd_widths() {
        assert!(ValueType::try_from_memory_access(3, false).is_err());
        assert!(ValueType::try_from_memory_access(5, true).is_err());
        assert!(ValueType::try_from_memory_access(0, false).is_err());
    }

    #[test]
    fn test_value_type_display() {
        assert_eq!(ValueType::None.to_string(), "none");
        assert_eq!(ValueType::I64.to_string(), "i64");
    }

    #[test]
    fn test_name_display() {
        assert_eq!(Name::new("add").to_string(), "$add");
    }

    #[test]
    fn test_literal_types() {
        assert_eq!(Literal::I32(1).value_type(), ValueType::I32);
        assert_eq!(Literal::F64(0.5).value_type(), ValueType::F64);
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(Literal::I32(-7).to_string(), "-7");
        assert_eq!(Literal::I64(1 << 40).to_string(), "1099511627776");
        assert_eq!(Literal::F64(0.5).to_string(), "0.5");
        assert_eq!(Literal::F32(-0.5).to_string(), "-0.5");
    }

    #[test]
    fn test_write_float_text_corrections() {
        let mut out = String::new();
        write_float_text(&mut out, ".5").unwrap();
        assert_eq!(out, "0.5");

        let mut out = String::new();
        write_float_text(&mut out, "-.5").unwrap();
        assert_eq!(out, "-0.5");

        let mut out = String::new();
        write_float_text(&mut out, "2.25").unwrap();
        assert_eq!(out, "2.25");
    }
}
