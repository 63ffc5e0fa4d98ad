//! Top-level declaration scanner.
//!
//! Splits a token stream into external declarations, skips function bodies
//! and aggregate definitions, and extracts every function declarator it
//! finds. Typedefs are recorded as they appear so later declarations see
//! their underlying types. This is not a C compiler: macros are not
//! expanded, and anything the scanner does not recognize is ignored.

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;

use super::lexer::{self, Token, TokenKind};
use super::{FunctionDecl, Language, ParamDecl, ParseError};
use crate::bindings::types::CTypeDescriptor;

/// Storage classes, function specifiers and calling conventions.
const IGNORED_SPECIFIERS: &[&str] = &[
    "extern",
    "static",
    "inline",
    "__inline",
    "__inline__",
    "__extension__",
    "register",
    "auto",
    "_Noreturn",
    "_Thread_local",
    "__cdecl",
    "__stdcall",
    "__fastcall",
    "__vectorcall",
    "WINAPI",
    "APIENTRY",
    "JNIEXPORT",
    "JNICALL",
];

/// Keywords followed by a parenthesized argument list that carry no type.
const ATTRIBUTE_KEYWORDS: &[&str] = &[
    "__attribute__",
    "__attribute",
    "__declspec",
    "__asm__",
    "__asm",
    "asm",
    "_Alignas",
    "alignas",
];

const QUALIFIERS: &[&str] = &[
    "const",
    "__const",
    "volatile",
    "__volatile__",
    "restrict",
    "__restrict",
    "__restrict__",
    "_Atomic",
];

const BUILTIN_KEYWORDS: &[&str] = &[
    "void", "_Bool", "char", "short", "int", "long", "float", "double", "signed", "__signed__",
    "unsigned", "_Complex", "__int128",
];

/// Declarations that start with these are not modeled.
const SKIPPED_LEADERS: &[&str] = &[
    "template",
    "using",
    "namespace",
    "friend",
    "operator",
    "static_assert",
    "_Static_assert",
];

/// Standard library typedefs, resolved to their LP64 builtin spelling.
fn well_known_typedef(name: &str) -> Option<&'static str> {
    let spelling = match name {
        "bool" => "_Bool",
        "int8_t" | "int_least8_t" | "int_fast8_t" => "signed char",
        "uint8_t" | "uint_least8_t" | "uint_fast8_t" => "unsigned char",
        "int16_t" | "int_least16_t" => "short",
        "uint16_t" | "uint_least16_t" => "unsigned short",
        "int32_t" | "int_least32_t" | "wchar_t" => "int",
        "uint32_t" | "uint_least32_t" => "unsigned int",
        "int64_t" | "int_least64_t" | "int_fast16_t" | "int_fast32_t" | "int_fast64_t"
        | "intmax_t" | "intptr_t" | "ptrdiff_t" | "ssize_t" | "off_t" => "long",
        "uint64_t" | "uint_least64_t" | "uint_fast16_t" | "uint_fast32_t" | "uint_fast64_t"
        | "uintmax_t" | "uintptr_t" | "size_t" => "unsigned long",
        _ => return None,
    };
    Some(spelling)
}

/// Type named by a specifier sequence, before any declarator applies.
#[derive(Debug, Clone)]
struct BaseType {
    ty: CTypeDescriptor,
    /// How the type was written (`const char`, `struct matrix`, `real`)
    spelling: String,
}

/// Shape of a declarator after its name.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Plain,
    Array,
    Function { params: Range<usize> },
    /// Parenthesized declarator: function pointers, pointers to arrays
    Nested,
}

#[derive(Debug, Clone)]
struct Declarator {
    pointers: usize,
    /// Index of the name token within the declarator slice
    name: Option<usize>,
    shape: Shape,
}

/// Parser for one translation unit.
#[derive(Debug, Clone)]
pub struct DeclarationParser {
    language: Language,
    typedefs: HashMap<String, CTypeDescriptor>,
}

impl DeclarationParser {
    /// Create a parser for `language`.
    pub fn new(language: Language) -> Self {
        DeclarationParser {
            language,
            typedefs: HashMap::new(),
        }
    }

    /// Extract all function declarations from `source`, in document order.
    pub fn parse(mut self, source: &str, path: &Path) -> Result<Vec<FunctionDecl>, ParseError> {
        let tokens = lexer::tokenize(source)
            .map_err(|e| ParseError::syntax(path, source, e.message, e.offset, e.len))?;

        if let Err((message, token)) = check_balance(&tokens) {
            return Err(ParseError::syntax(
                path,
                source,
                message,
                token.offset,
                token.text.len(),
            ));
        }

        let mut decls = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < tokens.len() {
            let tok = &tokens[i];

            if tok.is_punct(';') {
                self.handle_declaration(&tokens[start..i], false, path, &mut decls);
                i += 1;
                start = i;
            } else if tok.is_punct('(') || tok.is_punct('[') {
                let Some(close) = matching_close(&tokens, i) else {
                    break;
                };
                if let Some(semi) = tokens[i..close].iter().find(|t| t.is_punct(';')) {
                    return Err(ParseError::syntax(
                        path,
                        source,
                        format!("unexpected `;` inside `{}` from line {}", tok.text, tok.line),
                        semi.offset,
                        semi.text.len(),
                    ));
                }
                i = close + 1;
            } else if tok.is_punct('{') {
                let Some(close) = matching_close(&tokens, i) else {
                    break;
                };
                let head = &tokens[start..i];

                if is_transparent_block(head) {
                    // extern "C" { ... } and namespaces: keep scanning inside
                    i += 1;
                    start = i;
                } else if is_function_head(head) {
                    self.handle_declaration(head, true, path, &mut decls);
                    i = close + 1;
                    start = i;
                } else if head.is_empty() {
                    i = close + 1;
                    start = i;
                } else {
                    // Aggregate body or initializer; the declaration continues
                    i = close + 1;
                }
            } else if tok.is_punct('}') {
                // Only transparent blocks close here; everything else was skipped whole
                if start < i {
                    tracing::debug!(
                        "{}:{}: dropping unterminated declaration",
                        path.display(),
                        tokens[start].line
                    );
                }
                i += 1;
                start = i;
            } else {
                i += 1;
            }
        }

        if start < tokens.len() {
            tracing::debug!(
                "{}:{}: ignoring trailing tokens without `;`",
                path.display(),
                tokens[start].line
            );
        }

        Ok(decls)
    }

    fn handle_declaration(
        &mut self,
        raw: &[Token<'_>],
        is_definition: bool,
        path: &Path,
        out: &mut Vec<FunctionDecl>,
    ) {
        let tokens = strip_noise(raw);
        let Some(first) = tokens.first() else {
            return;
        };

        if first.kind == TokenKind::Ident && SKIPPED_LEADERS.contains(&first.text) {
            return;
        }

        let is_typedef = first.is_ident("typedef");
        let mut pos = usize::from(is_typedef);

        let Some(base) = self.parse_specifiers(&tokens, &mut pos) else {
            tracing::debug!("{}:{}: no type specifier, skipping", path.display(), first.line);
            return;
        };

        let rest = &tokens[pos..];
        for range in split_top_level(rest, ',') {
            let part = &rest[range];
            let Some(declarator) = self.parse_declarator(part) else {
                tracing::debug!(
                    "{}:{}: unrecognized declarator, skipping",
                    path.display(),
                    part.first().map_or(first.line, |t| t.line)
                );
                continue;
            };

            let Some(name_idx) = declarator.name else {
                continue;
            };
            let name_tok = &part[name_idx];

            if is_typedef {
                let ty = self.typedef_target(&base, &declarator, name_tok.text);
                self.typedefs.insert(name_tok.text.to_string(), ty);
                continue;
            }

            let Shape::Function { params } = &declarator.shape else {
                continue;
            };

            let (params, is_variadic, has_prototype) = self.parse_params(&part[params.clone()]);
            out.push(FunctionDecl {
                name: name_tok.text.to_string(),
                return_type: pointer_to(&base, declarator.pointers),
                params,
                is_definition,
                has_prototype,
                is_variadic,
                file: path.to_path_buf(),
                line: name_tok.line,
            });
        }
    }

    /// Parse a specifier sequence starting at `*pos`.
    fn parse_specifiers(&self, tokens: &[Token<'_>], pos: &mut usize) -> Option<BaseType> {
        let mut is_const = false;
        let mut keywords: Vec<&str> = Vec::new();
        let mut named: Option<BaseType> = None;

        while let Some(tok) = tokens.get(*pos) {
            if tok.kind != TokenKind::Ident {
                break;
            }

            match tok.text {
                q if QUALIFIERS.contains(&q) => {
                    is_const |= q == "const" || q == "__const";
                    *pos += 1;
                }
                k if BUILTIN_KEYWORDS.contains(&k) => {
                    if named.is_some() {
                        break;
                    }
                    keywords.push(k);
                    *pos += 1;
                }
                tag @ ("struct" | "union" | "enum") => {
                    if named.is_some() || !keywords.is_empty() {
                        break;
                    }
                    *pos += 1;
                    let name = match tokens.get(*pos) {
                        Some(t) if t.kind == TokenKind::Ident => {
                            *pos += 1;
                            Some(t.text)
                        }
                        _ => None,
                    };
                    if tokens.get(*pos).is_some_and(|t| t.is_punct('{')) {
                        *pos = matching_close(tokens, *pos).map_or(tokens.len(), |c| c + 1);
                    }
                    named = Some(tagged_type(tag, name));
                }
                ident => {
                    let next_is_ident = tokens
                        .get(*pos + 1)
                        .is_some_and(|t| t.kind == TokenKind::Ident && !QUALIFIERS.contains(&t.text));

                    if named.is_none() && keywords.is_empty() {
                        let known = self.typedefs.contains_key(ident)
                            || well_known_typedef(ident).is_some();
                        // Qualifiers may sit between a macro and the type (`API const T`)
                        // or after the type itself (`T const *p`)
                        let mut ahead = *pos + 1;
                        while tokens
                            .get(ahead)
                            .is_some_and(|t| t.kind == TokenKind::Ident && QUALIFIERS.contains(&t.text))
                        {
                            ahead += 1;
                        }
                        if !known && tokens.get(ahead).is_some_and(|t| self.starts_type(t)) {
                            // Export/visibility macro in front of the real type
                            *pos += 1;
                            continue;
                        }
                        named = Some(self.resolve_name(ident));
                        *pos += 1;
                    } else if next_is_ident {
                        // Calling convention macro between type and name
                        *pos += 1;
                    } else {
                        break;
                    }
                }
            }
        }

        let mut base = match named {
            Some(base) => base,
            None if !keywords.is_empty() => {
                let spelling = canonical_builtin(&keywords);
                BaseType {
                    ty: CTypeDescriptor::builtin(spelling.clone()),
                    spelling,
                }
            }
            None => return None,
        };

        if is_const {
            base.spelling = format!("const {}", base.spelling);
        }
        Some(base)
    }

    /// Whether `tok` is a type specifier proper, not a qualifier.
    fn starts_type(&self, tok: &Token<'_>) -> bool {
        tok.kind == TokenKind::Ident
            && (BUILTIN_KEYWORDS.contains(&tok.text)
                || matches!(tok.text, "struct" | "union" | "enum")
                || self.typedefs.contains_key(tok.text)
                || well_known_typedef(tok.text).is_some())
    }

    /// Resolve a typedef name to the type it stands for.
    fn resolve_name(&self, name: &str) -> BaseType {
        let ty = if let Some(ty) = self.typedefs.get(name) {
            match ty {
                CTypeDescriptor::Unsupported { .. } => CTypeDescriptor::unsupported(name),
                other => other.clone(),
            }
        } else if let Some(spelling) = well_known_typedef(name) {
            CTypeDescriptor::builtin(spelling)
        } else {
            tracing::debug!("unknown type name `{}`", name);
            CTypeDescriptor::unsupported(name)
        };

        BaseType {
            ty,
            spelling: name.to_string(),
        }
    }

    fn typedef_target(&self, base: &BaseType, declarator: &Declarator, name: &str) -> CTypeDescriptor {
        match (&base.ty, &declarator.shape, declarator.pointers) {
            (CTypeDescriptor::Enum { name: None }, Shape::Plain, 0) => {
                CTypeDescriptor::enumeral(Some(name))
            }
            _ => declarator_type(base, declarator),
        }
    }

    /// Parse the tokens between a function declarator's parentheses.
    ///
    /// Returns the parameters, whether `...` was present, and whether the
    /// list is a prototype.
    fn parse_params(&self, tokens: &[Token<'_>]) -> (Vec<ParamDecl>, bool, bool) {
        if tokens.is_empty() {
            // `f()` declares no prototype in C
            return (Vec::new(), false, self.language == Language::Cpp);
        }

        if tokens.len() == 1 && tokens[0].is_ident("void") {
            return (Vec::new(), false, true);
        }

        let mut params = Vec::new();
        let mut variadic = false;

        for range in split_top_level(tokens, ',') {
            let part = &tokens[range];
            if part.len() == 1 && part[0].kind == TokenKind::Ellipsis {
                variadic = true;
                continue;
            }
            params.push(self.parse_param(part));
        }

        (params, variadic, true)
    }

    fn parse_param(&self, tokens: &[Token<'_>]) -> ParamDecl {
        let mut pos = 0;
        let parsed = self
            .parse_specifiers(tokens, &mut pos)
            .and_then(|base| self.parse_declarator(&tokens[pos..]).map(|d| (base, d)));

        match parsed {
            Some((base, declarator)) => {
                let name = declarator
                    .name
                    .map(|i| tokens[pos + i].text.to_string())
                    .unwrap_or_default();
                ParamDecl::new(name, declarator_type(&base, &declarator))
            }
            None => ParamDecl::new("", CTypeDescriptor::unsupported(join_tokens(tokens))),
        }
    }

    /// Parse one declarator (`**name`, `name[4]`, `name(int)`, `(*name)(void)`).
    fn parse_declarator(&self, tokens: &[Token<'_>]) -> Option<Declarator> {
        let mut pos = 0;
        let mut pointers = 0;

        while let Some(tok) = tokens.get(pos) {
            if tok.is_punct('*') {
                pointers += 1;
                pos += 1;
            } else if tok.kind == TokenKind::Ident && QUALIFIERS.contains(&tok.text) {
                pos += 1;
            } else {
                break;
            }
        }

        let mut name = None;
        let mut shape = Shape::Plain;

        if tokens.get(pos).is_some_and(|t| t.is_punct('(')) {
            let close = matching_close(tokens, pos)?;
            name = tokens[pos + 1..close]
                .iter()
                .position(|t| t.kind == TokenKind::Ident && !QUALIFIERS.contains(&t.text))
                .map(|i| pos + 1 + i);
            shape = Shape::Nested;
            pos = close + 1;
            while tokens.get(pos).is_some_and(|t| t.is_punct('(') || t.is_punct('[')) {
                pos = matching_close(tokens, pos)? + 1;
            }
        } else {
            if tokens.get(pos).is_some_and(|t| t.kind == TokenKind::Ident) {
                name = Some(pos);
                pos += 1;
            }

            if tokens.get(pos).is_some_and(|t| t.is_punct('[')) {
                shape = Shape::Array;
                while tokens.get(pos).is_some_and(|t| t.is_punct('[')) {
                    pos = matching_close(tokens, pos)? + 1;
                }
            } else if tokens.get(pos).is_some_and(|t| t.is_punct('(')) {
                let close = matching_close(tokens, pos)?;
                shape = Shape::Function {
                    params: pos + 1..close,
                };
                pos = close + 1;
                if tokens.get(pos).is_some_and(|t| t.is_punct('(') || t.is_punct('[')) {
                    return None;
                }
            }
        }

        let Some(tok) = tokens.get(pos) else {
            return Some(Declarator {
                pointers,
                name,
                shape,
            });
        };

        if tok.is_punct('=') || (tok.is_punct(':') && shape == Shape::Plain) {
            // Initializer or bit-field width
            return Some(Declarator {
                pointers,
                name,
                shape,
            });
        }

        if matches!(shape, Shape::Function { .. }) && self.trailing_macros_only(&tokens[pos..]) {
            return Some(Declarator {
                pointers,
                name,
                shape,
            });
        }

        None
    }

    /// `__THROW __nonnull ((1)) __wur` and similar after a function declarator.
    ///
    /// Type names rule the tokens out: `f(a) int a` is the head of a K&R
    /// definition, not a prototype.
    fn trailing_macros_only(&self, tokens: &[Token<'_>]) -> bool {
        let mut pos = 0;
        while let Some(tok) = tokens.get(pos) {
            if tok.kind != TokenKind::Ident || QUALIFIERS.contains(&tok.text) || self.starts_type(tok) {
                return false;
            }
            pos += 1;
            if tokens.get(pos).is_some_and(|t| t.is_punct('(')) {
                let Some(close) = matching_close(tokens, pos) else {
                    return false;
                };
                pos = close + 1;
            }
        }
        true
    }
}

fn tagged_type(tag: &str, name: Option<&str>) -> BaseType {
    let spelling = format!("{} {}", tag, name.unwrap_or("<anonymous>"));
    let ty = if tag == "enum" {
        CTypeDescriptor::enumeral(name)
    } else {
        CTypeDescriptor::unsupported(spelling.clone())
    };
    BaseType { ty, spelling }
}

/// Canonical spelling of a builtin keyword combination.
fn canonical_builtin(keywords: &[&str]) -> String {
    let has = |k: &str| keywords.contains(&k);
    let unsigned = has("unsigned");
    let signed = has("signed") || has("__signed__");
    let longs = keywords.iter().filter(|k| **k == "long").count();

    let base = if has("void") {
        "void"
    } else if has("_Bool") {
        "_Bool"
    } else if has("char") {
        if unsigned {
            "unsigned char"
        } else if signed {
            "signed char"
        } else {
            "char"
        }
    } else if has("float") {
        "float"
    } else if has("double") {
        if longs > 0 {
            "long double"
        } else {
            "double"
        }
    } else if has("__int128") {
        if unsigned {
            "unsigned __int128"
        } else {
            "__int128"
        }
    } else if has("short") {
        if unsigned {
            "unsigned short"
        } else {
            "short"
        }
    } else if longs >= 2 {
        if unsigned {
            "unsigned long long"
        } else {
            "long long"
        }
    } else if longs == 1 {
        if unsigned {
            "unsigned long"
        } else {
            "long"
        }
    } else if unsigned {
        "unsigned int"
    } else {
        "int"
    };

    if has("_Complex") {
        format!("_Complex {}", base)
    } else {
        base.to_string()
    }
}

fn pointer_to(base: &BaseType, pointers: usize) -> CTypeDescriptor {
    if pointers == 0 {
        base.ty.clone()
    } else {
        CTypeDescriptor::pointer(format!("{}{}", base.spelling, "*".repeat(pointers - 1)))
    }
}

fn declarator_type(base: &BaseType, declarator: &Declarator) -> CTypeDescriptor {
    let spelled = format!("{}{}", base.spelling, "*".repeat(declarator.pointers));
    match declarator.shape {
        Shape::Plain => pointer_to(base, declarator.pointers),
        Shape::Array => CTypeDescriptor::unsupported(format!("{}[]", spelled)),
        Shape::Function { .. } => CTypeDescriptor::unsupported(format!("{} ()", spelled)),
        Shape::Nested => CTypeDescriptor::unsupported(format!("{} (*)()", spelled)),
    }
}

/// Drop attributes, storage classes and linkage specs.
fn strip_noise<'s>(tokens: &[Token<'s>]) -> Vec<Token<'s>> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let tok = tokens[i];
        if tok.kind == TokenKind::Ident {
            if ATTRIBUTE_KEYWORDS.contains(&tok.text) {
                i += 1;
                if tokens.get(i).is_some_and(|t| t.is_punct('(')) {
                    i = matching_close(tokens, i).map_or(tokens.len(), |c| c + 1);
                }
                continue;
            }
            if tok.text == "extern" && tokens.get(i + 1).is_some_and(|t| t.kind == TokenKind::Str) {
                i += 2;
                continue;
            }
            if IGNORED_SPECIFIERS.contains(&tok.text) {
                i += 1;
                continue;
            }
        }
        out.push(tok);
        i += 1;
    }

    out
}

fn is_transparent_block(head: &[Token<'_>]) -> bool {
    match head {
        [ext, lit] => ext.is_ident("extern") && lit.kind == TokenKind::Str,
        [ns] | [ns, _] => ns.is_ident("namespace"),
        _ => false,
    }
}

fn is_function_head(head: &[Token<'_>]) -> bool {
    strip_noise(head).last().is_some_and(|t| t.is_punct(')'))
}

/// Ranges of `tokens` separated by `sep` at nesting depth zero.
fn split_top_level(tokens: &[Token<'_>], sep: char) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::Punct('(' | '[' | '{') => depth += 1,
            TokenKind::Punct(')' | ']' | '}') => depth = depth.saturating_sub(1),
            TokenKind::Punct(c) if c == sep && depth == 0 => {
                ranges.push(start..i);
                start = i + 1;
            }
            _ => {}
        }
    }

    if start < tokens.len() {
        ranges.push(start..tokens.len());
    }
    ranges
}

/// Index of the delimiter closing the one at `open`, if it is in `tokens`.
fn matching_close(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::Punct('(' | '[' | '{') => depth += 1,
            TokenKind::Punct(')' | ']' | '}') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Verify that every delimiter is closed by its partner.
fn check_balance<'t, 's>(tokens: &'t [Token<'s>]) -> Result<(), (String, &'t Token<'s>)> {
    let mut stack: Vec<&Token<'s>> = Vec::new();

    for tok in tokens {
        let TokenKind::Punct(c) = tok.kind else {
            continue;
        };
        match c {
            '(' | '[' | '{' => stack.push(tok),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some(open) if open.is_punct(expected) => {}
                    Some(open) => {
                        return Err((
                            format!("`{}` does not close `{}` from line {}", c, open.text, open.line),
                            tok,
                        ))
                    }
                    None => return Err((format!("unexpected `{}`", c), tok)),
                }
            }
            _ => {}
        }
    }

    match stack.pop() {
        Some(open) => Err((format!("unclosed `{}`", open.text), open)),
        None => Ok(()),
    }
}

fn join_tokens(tokens: &[Token<'_>]) -> String {
    tokens.iter().map(|t| t.text).collect::<Vec<_>>().join(" ")
}
