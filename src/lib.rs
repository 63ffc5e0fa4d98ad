//! jbindgen - Java native method bindings from C declarations
//!
//! This crate reads C and C++ translation units, selects function
//! declarations and writes a Java class with one `native` method per
//! declaration, plus a companion native stub file.

pub mod bindings;
pub mod frontend;
pub mod ops;
pub mod util;

pub use bindings::{BindingEmitter, BindingError, BindingLayout, SelectionPolicy};
pub use frontend::{CSourceFrontend, Frontend, FunctionDecl, TranslationUnit};
pub use ops::{generate, GenerateOptions, GenerateReport};
