//! Runtime value kinds as seen through the call context.

use std::fmt;

/// Tag of the value stored at a stack position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueKind {
    /// The position lies outside the current frame.
    NoValue = 0,
    Nil = 1,
    Boolean = 2,
    Number = 3,
    String = 4,
    Table = 5,
    Function = 6,
}

impl ValueKind {
    /// Name used in conversion error messages.
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::NoValue => "no value",
            ValueKind::Nil => "nil",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Table => "table",
            ValueKind::Function => "function",
        }
    }

    #[inline]
    pub const fn is_nil_or_none(self) -> bool {
        matches!(self, ValueKind::NoValue | ValueKind::Nil)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ValueKind::Number.to_string(), "number");
        assert_eq!(ValueKind::NoValue.to_string(), "no value");
        assert!(ValueKind::Nil.is_nil_or_none());
        assert!(!ValueKind::Table.is_nil_or_none());
    }
}
