//! Typed values exchanged with the remote script runtime.

use std::fmt;

/// Opaque handle to a live host object, as produced by an
/// [`ObjectResolver`](crate::dispatcher::ObjectResolver).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    /// Host-side numeric identifier.
    pub id: u32,
    /// Subtype tag the object was resolved as (e.g. `"actor"`).
    pub type_tag: String,
}

impl ObjectHandle {
    pub fn new(id: u32, type_tag: impl Into<String>) -> Self {
        Self {
            id,
            type_tag: type_tag.into(),
        }
    }
}

/// The host's currently selected object.
///
/// `identifier` is its textual form in the object identifier grammar; it is
/// what the binder injects into the `selected` argument slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub identifier: String,
}

impl Target {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }
}

/// How an object argument refers to the object to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRef<'a> {
    /// The host's selected target.
    Selected(&'a Target),
    /// A bare symbolic identifier.
    Symbol(&'a str),
    /// `<hex id>|<origin>`.
    Qualified { id: u32, origin: &'a str },
}

impl<'a> ObjectRef<'a> {
    /// Parses a literal token.
    ///
    /// A token containing `|` is a qualified reference: hexadecimal id on the
    /// left (an optional `0x` prefix is accepted), origin on the right.
    /// Returns `None` if the id is not valid hexadecimal.
    pub fn parse(token: &'a str) -> Option<Self> {
        match token.split_once('|') {
            Some((id, origin)) => {
                let id = id.trim();
                let digits = id
                    .strip_prefix("0x")
                    .or_else(|| id.strip_prefix("0X"))
                    .unwrap_or(id);
                let id = u32::from_str_radix(digits, 16).ok()?;
                Some(Self::Qualified {
                    id,
                    origin: origin.trim(),
                })
            }
            None => Some(Self::Symbol(token)),
        }
    }
}

/// A typed argument handed to the remote callable.
#[derive(Debug, Clone, PartialEq)]
pub enum CallValue {
    None,
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
    Object(ObjectHandle),
}

impl CallValue {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// The single value a remote callable answers with.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnValue {
    None,
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
    Object(ObjectHandle),
}

/// Text shown for a returned object; rendering arbitrary objects is left to
/// the script itself.
pub const OBJECT_RESULT_TEXT: &str = "success";

impl ReturnValue {
    /// Renders the value for the host display.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Object(_) => f.write_str(OBJECT_RESULT_TEXT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbol() {
        assert_eq!(ObjectRef::parse("Lydia"), Some(ObjectRef::Symbol("Lydia")));
    }

    #[test]
    fn test_parse_qualified() {
        assert_eq!(
            ObjectRef::parse("A2C94|Skyrim.esm"),
            Some(ObjectRef::Qualified {
                id: 0xA2C94,
                origin: "Skyrim.esm"
            })
        );
        assert_eq!(
            ObjectRef::parse("0x14|Skyrim.esm"),
            Some(ObjectRef::Qualified {
                id: 0x14,
                origin: "Skyrim.esm"
            })
        );
    }

    #[test]
    fn test_parse_qualified_bad_hex() {
        assert_eq!(ObjectRef::parse("zz|Skyrim.esm"), None);
        assert_eq!(ObjectRef::parse("|Skyrim.esm"), None);
    }

    #[test]
    fn test_render_return_values() {
        assert_eq!(ReturnValue::None.render(), "none");
        assert_eq!(ReturnValue::Int(-3).render(), "-3");
        assert_eq!(ReturnValue::Float(1.5).render(), "1.5");
        assert_eq!(ReturnValue::Bool(true).render(), "true");
        assert_eq!(ReturnValue::String("hi there".into()).render(), "hi there");
        assert_eq!(
            ReturnValue::Object(ObjectHandle::new(0x14, "actor")).render(),
            OBJECT_RESULT_TEXT
        );
    }
}
