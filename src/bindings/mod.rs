//! Native-method binding generation.
//!
//! Maps C function declarations to Java `native` method declarations and
//! writes them, together with a companion native stub file.

pub mod emitter;
pub mod error;
pub mod mapper;
pub mod selector;
pub mod signature;
pub mod types;

pub use emitter::{BindingEmitter, BindingLayout};
pub use error::BindingError;
pub use mapper::JavaType;
pub use selector::{DeclarationSelector, NameFilter, SelectionPolicy, SelectionStats};
pub use types::{CTypeDescriptor, FunctionSignature, Parameter, TypePosition, UnsupportedType};
