//! Type definitions for binding generation.
//!
//! These types carry exactly what the emitter needs from a C function
//! declaration: its name, its classified return type and its ordered
//! parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a C type, computed once when a declaration is extracted.
///
/// The set is closed: everything the mapper cannot represent lands in
/// [`CTypeDescriptor::Unsupported`] with its spelling kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CTypeDescriptor {
    /// Pointer of any depth to any pointee
    Pointer { pointee: String },

    /// Enumeral type (tag name if known)
    Enum { name: Option<String> },

    /// Builtin scalar with its canonical spelling (e.g. `unsigned long`)
    Builtin { spelling: String },

    /// Aggregates, function pointers, arrays, unknown names
    Unsupported { spelling: String },
}

impl CTypeDescriptor {
    /// Create a pointer descriptor.
    pub fn pointer(pointee: impl Into<String>) -> Self {
        CTypeDescriptor::Pointer {
            pointee: pointee.into(),
        }
    }

    /// Create an enum descriptor.
    pub fn enumeral(name: Option<&str>) -> Self {
        CTypeDescriptor::Enum {
            name: name.map(str::to_string),
        }
    }

    /// Create a builtin descriptor.
    pub fn builtin(spelling: impl Into<String>) -> Self {
        CTypeDescriptor::Builtin {
            spelling: spelling.into(),
        }
    }

    /// Create an unsupported descriptor.
    pub fn unsupported(spelling: impl Into<String>) -> Self {
        CTypeDescriptor::Unsupported {
            spelling: spelling.into(),
        }
    }
}

impl fmt::Display for CTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CTypeDescriptor::Pointer { pointee } => write!(f, "{}*", pointee),
            CTypeDescriptor::Enum { name: Some(name) } => write!(f, "enum {}", name),
            CTypeDescriptor::Enum { name: None } => write!(f, "enum <anonymous>"),
            CTypeDescriptor::Builtin { spelling } => write!(f, "{}", spelling),
            CTypeDescriptor::Unsupported { spelling } => write!(f, "{}", spelling),
        }
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name (may be empty for unnamed params)
    pub name: String,

    /// Parameter type
    pub ty: CTypeDescriptor,
}

impl Parameter {
    /// Create a new parameter.
    pub fn new(name: impl Into<String>, ty: CTypeDescriptor) -> Self {
        Parameter {
            name: name.into(),
            ty,
        }
    }
}

/// The signature of one eligible function, ready for emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,

    /// Return type
    pub return_type: CTypeDescriptor,

    /// Parameters in source order
    pub parameters: Vec<Parameter>,
}

impl FunctionSignature {
    /// Create a new signature with no parameters.
    pub fn new(name: impl Into<String>, return_type: CTypeDescriptor) -> Self {
        FunctionSignature {
            name: name.into(),
            return_type,
            parameters: Vec::new(),
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }
}

/// Where an unmappable type appeared in a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypePosition {
    Return,
    Parameter { index: usize, name: String },
}

impl fmt::Display for TypePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypePosition::Return => write!(f, "return type"),
            TypePosition::Parameter { index, name } if name.is_empty() => {
                write!(f, "parameter #{}", index)
            }
            TypePosition::Parameter { index, name } => {
                write!(f, "parameter #{} `{}`", index, name)
            }
        }
    }
}

/// A type that was emitted as the sentinel and needs a manual fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedType {
    /// Function the type belongs to
    pub function: String,

    /// Position within the signature
    pub position: TypePosition,

    /// C spelling of the offending type
    pub spelling: String,
}

impl fmt::Display for UnsupportedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}`: {} has unsupported type `{}`",
            self.function, self.position, self.spelling
        )
    }
}
