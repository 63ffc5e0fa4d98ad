//! Rendering of native method declarations.

use super::mapper;
use super::types::{FunctionSignature, Parameter};

/// Java keywords and literals that cannot name a parameter.
const JAVA_RESERVED: &[&str] = &[
    "_", "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
    "const", "continue", "default", "do", "double", "else", "enum", "extends", "false", "final",
    "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "null", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw",
    "throws", "transient", "true", "try", "void", "volatile", "while",
];

/// Check whether `name` is reserved in Java.
pub fn is_java_reserved(name: &str) -> bool {
    JAVA_RESERVED.contains(&name)
}

/// Java name for a C parameter.
///
/// Unnamed parameters become `arg<index>`; names reserved in Java get a
/// trailing underscore.
pub fn parameter_name(param: &Parameter, index: usize) -> String {
    if param.name.is_empty() {
        format!("arg{}", index)
    } else if is_java_reserved(&param.name) {
        tracing::warn!(
            "parameter `{}` is reserved in Java, renamed to `{}_`",
            param.name,
            param.name
        );
        format!("{}_", param.name)
    } else {
        param.name.clone()
    }
}

/// Method name plus mapped parameter types, e.g. `foo(double,long)`.
///
/// Two declarations with the same key clash in the generated class no
/// matter how their parameters are named.
pub fn method_key(signature: &FunctionSignature) -> String {
    let types = signature
        .parameters
        .iter()
        .map(|p| mapper::map(&p.ty).as_str())
        .collect::<Vec<_>>()
        .join(",");
    format!("{}({})", signature.name, types)
}

/// Render `"<Type> <name>"` for each parameter, joined by `", "`.
pub fn format_parameter_list(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} {}", mapper::map(&p.ty), parameter_name(p, i)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the start of a declaration, up to and including the opening paren.
pub fn format_declaration_header(signature: &FunctionSignature, visibility: &str) -> String {
    format!(
        "{} native {} {}(",
        visibility,
        mapper::map(&signature.return_type),
        signature.name
    )
}

/// Render a complete declaration statement.
pub fn format_declaration(signature: &FunctionSignature, visibility: &str) -> String {
    format!(
        "{}{});",
        format_declaration_header(signature, visibility),
        format_parameter_list(&signature.parameters)
    )
}
