//! C to Java type mapping.
//!
//! Pointers travel as opaque `long` handles, enums as `int`, and builtin
//! scalars through a fixed table. Anything else maps to the `???` sentinel so
//! the generated file stays visibly broken until someone fixes it by hand.

use std::fmt;

use super::types::CTypeDescriptor;

/// Literal emitted for types that have no Java counterpart.
pub const SENTINEL: &str = "???";

/// A Java primitive type name, or the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JavaType {
    Void,
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// No mapping exists
    Unsupported,
}

impl JavaType {
    /// Get the Java spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            JavaType::Void => "void",
            JavaType::Boolean => "boolean",
            JavaType::Byte => "byte",
            JavaType::Short => "short",
            JavaType::Int => "int",
            JavaType::Long => "long",
            JavaType::Float => "float",
            JavaType::Double => "double",
            JavaType::Unsupported => SENTINEL,
        }
    }

    /// Check if this is the sentinel.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, JavaType::Unsupported)
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a classified C type to its Java type.
pub fn map(ty: &CTypeDescriptor) -> JavaType {
    match ty {
        CTypeDescriptor::Pointer { .. } => JavaType::Long,
        CTypeDescriptor::Enum { .. } => JavaType::Int,
        CTypeDescriptor::Builtin { spelling } => map_builtin(spelling),
        CTypeDescriptor::Unsupported { .. } => JavaType::Unsupported,
    }
}

/// Map a canonical builtin spelling.
fn map_builtin(spelling: &str) -> JavaType {
    match spelling {
        "void" => JavaType::Void,
        "_Bool" => JavaType::Boolean,
        "char" | "signed char" | "unsigned char" => JavaType::Byte,
        "short" | "unsigned short" => JavaType::Short,
        "int" | "unsigned int" => JavaType::Int,
        "long" | "unsigned long" | "long long" | "unsigned long long" => JavaType::Long,
        "float" => JavaType::Float,
        "double" => JavaType::Double,
        _ => JavaType::Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_maps_to_long() {
        for pointee in ["void", "char", "const double", "int*", "struct matrix", "enum Color"] {
            assert_eq!(map(&CTypeDescriptor::pointer(pointee)), JavaType::Long);
        }
    }

    #[test]
    fn test_enum_maps_to_int() {
        assert_eq!(map(&CTypeDescriptor::enumeral(Some("Color"))), JavaType::Int);
        assert_eq!(map(&CTypeDescriptor::enumeral(None)), JavaType::Int);
    }

    #[test]
    fn test_builtin_table() {
        let cases = [
            ("void", "void"),
            ("_Bool", "boolean"),
            ("char", "byte"),
            ("unsigned char", "byte"),
            ("short", "short"),
            ("int", "int"),
            ("unsigned int", "int"),
            ("long", "long"),
            ("unsigned long long", "long"),
            ("float", "float"),
            ("double", "double"),
        ];

        for (c, java) in cases {
            let ty = CTypeDescriptor::builtin(c);
            assert_eq!(map(&ty).as_str(), java, "mapping {}", c);
            // Repeated calls agree
            assert_eq!(map(&ty), map(&ty));
        }
    }

    #[test]
    fn test_unmapped_yields_sentinel() {
        assert_eq!(map(&CTypeDescriptor::builtin("long double")), JavaType::Unsupported);
        assert_eq!(map(&CTypeDescriptor::builtin("__int128")), JavaType::Unsupported);
        assert_eq!(
            map(&CTypeDescriptor::unsupported("struct matrix")),
            JavaType::Unsupported
        );
        assert_eq!(JavaType::Unsupported.to_string(), "???");
    }
}
