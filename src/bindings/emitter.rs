//! Output sinks for the binding class and its native stub file.
//!
//! Both files are written to temporaries next to their destinations and
//! renamed into place on [`BindingEmitter::close`], so a failed run never
//! leaves a half-written binding class behind.

use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::error::{BindingError, Result};
use super::mapper;
use super::signature;
use super::types::{FunctionSignature, TypePosition, UnsupportedType};

/// Indentation for members of the generated class.
const INDENT: &str = "    ";

/// Names and paths that shape one binding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingLayout {
    /// Name of the generated class
    pub class_name: String,

    /// Library passed to `System.loadLibrary`
    pub library_name: String,

    /// Where the binding class is written
    pub host_output: PathBuf,

    /// Where the native stub file is written
    pub native_output: PathBuf,

    /// Visibility keyword for native methods
    pub visibility: String,
}

impl BindingLayout {
    /// Create a layout with every name derived from the class name.
    pub fn new(class_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        BindingLayout {
            library_name: class_name.clone(),
            host_output: PathBuf::from(format!("{}.java", class_name)),
            native_output: PathBuf::from(format!("{}.c", class_name)),
            visibility: "public".to_string(),
            class_name,
        }
    }

    /// Set the library name.
    pub fn with_library_name(mut self, name: impl Into<String>) -> Self {
        self.library_name = name.into();
        self
    }

    /// Set the binding class path.
    pub fn with_host_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.host_output = path.into();
        self
    }

    /// Set the native stub path.
    pub fn with_native_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.native_output = path.into();
        self
    }

    /// Set the method visibility.
    pub fn with_visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = visibility.into();
        self
    }

    /// Class declaration and the static block that loads the library.
    pub fn host_prologue(&self) -> String {
        format!(
            "public class {class} {{\n\
             {i}static {{\n\
             {i}{i}System.loadLibrary(\"{lib}\");\n\
             {i}}}\n\
             \n",
            class = self.class_name,
            lib = self.library_name,
            i = INDENT,
        )
    }

    /// Closing brace of the class.
    pub fn host_epilogue(&self) -> &'static str {
        "}\n"
    }

    /// Header of the native stub file.
    pub fn native_prologue(&self) -> String {
        format!(
            "/* Native bridge implementations for {}. */\n#include <jni.h>\n",
            self.class_name
        )
    }
}

type Sink = BufWriter<NamedTempFile>;

enum EmitterState {
    Open { host: Sink, native: Sink },
    Closed,
}

/// Writer for the binding class and the native stub file.
///
/// Exclusively owns both sinks for the lifetime of a run.
pub struct BindingEmitter {
    layout: BindingLayout,
    state: EmitterState,
    emitted: HashSet<String>,
    declarations: usize,
    duplicates: usize,
    warnings: Vec<UnsupportedType>,
}

impl BindingEmitter {
    /// Create both sinks and write their prologues.
    pub fn open(layout: BindingLayout) -> Result<Self> {
        let mut host = create_sink(&layout.host_output)?;
        let mut native = create_sink(&layout.native_output)?;

        host.write_all(layout.host_prologue().as_bytes())
            .map_err(BindingError::io(&layout.host_output))?;
        native
            .write_all(layout.native_prologue().as_bytes())
            .map_err(BindingError::io(&layout.native_output))?;

        tracing::debug!(
            "opened binding sinks {} and {}",
            layout.host_output.display(),
            layout.native_output.display()
        );

        Ok(BindingEmitter {
            layout,
            state: EmitterState::Open { host, native },
            emitted: HashSet::new(),
            declarations: 0,
            duplicates: 0,
            warnings: Vec::new(),
        })
    }

    /// Append one native method declaration.
    ///
    /// Returns `false` when a method with the same name and Java parameter
    /// types was already written. The first declaration wins, whatever its
    /// parameters are called.
    pub fn add_declaration(&mut self, sig: &FunctionSignature) -> Result<bool> {
        let EmitterState::Open { host, .. } = &mut self.state else {
            return Err(BindingError::Closed {
                class_name: self.layout.class_name.clone(),
            });
        };

        let key = signature::method_key(sig);
        if self.emitted.contains(&key) {
            tracing::debug!("skipping duplicate declaration of `{}`", key);
            self.duplicates += 1;
            return Ok(false);
        }

        let line = signature::format_declaration(sig, &self.layout.visibility);
        writeln!(host, "{}{}", INDENT, line).map_err(BindingError::io(&self.layout.host_output))?;
        self.emitted.insert(key);
        self.declarations += 1;
        self.record_unsupported(sig);

        Ok(true)
    }

    fn record_unsupported(&mut self, sig: &FunctionSignature) {
        if mapper::map(&sig.return_type).is_unsupported() {
            self.push_warning(sig, TypePosition::Return, sig.return_type.to_string());
        }

        for (index, param) in sig.parameters.iter().enumerate() {
            if mapper::map(&param.ty).is_unsupported() {
                let position = TypePosition::Parameter {
                    index,
                    name: param.name.clone(),
                };
                self.push_warning(sig, position, param.ty.to_string());
            }
        }
    }

    fn push_warning(&mut self, sig: &FunctionSignature, position: TypePosition, spelling: String) {
        let warning = UnsupportedType {
            function: sig.name.clone(),
            position,
            spelling,
        };
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Write the epilogue and move both files into place.
    ///
    /// Both temporaries are flushed before either is renamed. The stub goes
    /// first, so the binding class is only replaced once its stub is in
    /// place. Calling this on a closed emitter does nothing.
    pub fn close(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, EmitterState::Closed);
        let EmitterState::Open { host, native } = state else {
            return Ok(());
        };

        let host = seal(host, &self.layout.host_output, self.layout.host_epilogue())?;
        let native = seal(native, &self.layout.native_output, "")?;

        persist(native, &self.layout.native_output)?;
        persist(host, &self.layout.host_output)?;

        tracing::debug!(
            "wrote {} declaration(s) to {}",
            self.declarations,
            self.layout.host_output.display()
        );
        Ok(())
    }

    /// Close without moving anything into place.
    ///
    /// The temporaries are removed and existing outputs stay untouched.
    pub fn discard(&mut self) {
        if let EmitterState::Open { .. } = std::mem::replace(&mut self.state, EmitterState::Closed) {
            tracing::debug!("discarded binding output for {}", self.layout.class_name);
        }
    }

    /// Check whether the sinks are still open.
    pub fn is_open(&self) -> bool {
        matches!(self.state, EmitterState::Open { .. })
    }

    /// The layout this emitter writes.
    pub fn layout(&self) -> &BindingLayout {
        &self.layout
    }

    /// Number of declarations written.
    pub fn declaration_count(&self) -> usize {
        self.declarations
    }

    /// Number of repeated declarations that were dropped.
    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    /// Unsupported types seen in written declarations.
    pub fn warnings(&self) -> &[UnsupportedType] {
        &self.warnings
    }
}

impl Drop for BindingEmitter {
    fn drop(&mut self) {
        if !self.is_open() {
            return;
        }

        if std::thread::panicking() {
            self.discard();
            return;
        }

        if let Err(e) = self.close() {
            tracing::error!("failed to finalize {}: {}", self.layout.class_name, e);
        }
    }
}

/// Create a temporary file in the destination's directory.
fn create_sink(path: &Path) -> Result<Sink> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let file = tempfile::Builder::new()
        .prefix(".jbindgen-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(BindingError::io(path))?;

    Ok(BufWriter::new(file))
}

/// Write the trailer and flush everything to the temporary.
fn seal(mut sink: Sink, path: &Path, trailer: &str) -> Result<NamedTempFile> {
    sink.write_all(trailer.as_bytes())
        .map_err(BindingError::io(path))?;

    sink.into_inner()
        .map_err(|e| BindingError::io(path)(e.into_error()))
}

fn persist(file: NamedTempFile, path: &Path) -> Result<()> {
    file.persist(path)
        .map_err(|e| BindingError::io(path)(e.error))?;

    set_readable(path)
}

/// Temporaries are created owner-only; generated sources should not be.
#[cfg(unix)]
fn set_readable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
        .map_err(BindingError::io(path))
}

#[cfg(not(unix))]
fn set_readable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::types::{CTypeDescriptor, Parameter};
    use tempfile::TempDir;

    fn layout_in(dir: &Path) -> BindingLayout {
        BindingLayout::new("LapackJNI")
            .with_host_output(dir.join("LapackJNI.java"))
            .with_native_output(dir.join("LapackJNI.c"))
    }

    fn foo() -> FunctionSignature {
        FunctionSignature::new("foo", CTypeDescriptor::builtin("int"))
            .with_param(Parameter::new("x", CTypeDescriptor::builtin("double")))
            .with_param(Parameter::new("y", CTypeDescriptor::pointer("char")))
    }

    #[test]
    fn test_layout_defaults() {
        let layout = BindingLayout::new("Mat");
        assert_eq!(layout.library_name, "Mat");
        assert_eq!(layout.host_output, PathBuf::from("Mat.java"));
        assert_eq!(layout.native_output, PathBuf::from("Mat.c"));
        assert_eq!(layout.visibility, "public");
    }

    #[test]
    fn test_emits_class() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(tmp.path());

        let mut emitter = BindingEmitter::open(layout.clone()).unwrap();
        assert!(emitter.add_declaration(&foo()).unwrap());
        emitter.close().unwrap();

        let java = std::fs::read_to_string(&layout.host_output).unwrap();
        assert_eq!(
            java,
            "public class LapackJNI {\n    static {\n        System.loadLibrary(\"LapackJNI\");\n    }\n\n    public native int foo(double x, long y);\n}\n"
        );

        let native = std::fs::read_to_string(&layout.native_output).unwrap();
        assert!(native.contains("#include <jni.h>"));
        assert!(!native.contains("foo"));
    }

    #[test]
    fn test_duplicate_declaration_written_once() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(tmp.path());

        let mut emitter = BindingEmitter::open(layout.clone()).unwrap();
        assert!(emitter.add_declaration(&foo()).unwrap());
        assert!(!emitter.add_declaration(&foo()).unwrap());
        assert_eq!(emitter.declaration_count(), 1);
        assert_eq!(emitter.duplicate_count(), 1);
        emitter.close().unwrap();

        let java = std::fs::read_to_string(&layout.host_output).unwrap();
        assert_eq!(java.matches("foo(").count(), 1);
    }

    #[test]
    fn test_redeclaration_with_other_parameter_names_written_once() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(tmp.path());
        let unnamed = FunctionSignature::new("foo", CTypeDescriptor::builtin("int"))
            .with_param(Parameter::new("", CTypeDescriptor::builtin("double")))
            .with_param(Parameter::new("", CTypeDescriptor::pointer("char")));
        let overload = FunctionSignature::new("foo", CTypeDescriptor::builtin("int"))
            .with_param(Parameter::new("x", CTypeDescriptor::builtin("double")));

        let mut emitter = BindingEmitter::open(layout.clone()).unwrap();
        assert!(emitter.add_declaration(&foo()).unwrap());
        assert!(!emitter.add_declaration(&unnamed).unwrap());
        assert!(emitter.add_declaration(&overload).unwrap());
        assert_eq!(emitter.duplicate_count(), 1);
        emitter.close().unwrap();

        let java = std::fs::read_to_string(&layout.host_output).unwrap();
        assert!(java.contains("    public native int foo(double x, long y);\n"));
        assert!(java.contains("    public native int foo(double x);\n"));
        assert!(!java.contains("arg0"));
    }

    #[test]
    fn test_failed_stub_persist_keeps_class_unchanged() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(tmp.path());
        std::fs::write(&layout.host_output, "previous").unwrap();

        let mut emitter = BindingEmitter::open(layout.clone()).unwrap();
        emitter.add_declaration(&foo()).unwrap();
        // A directory at the stub path makes the rename fail
        std::fs::create_dir(&layout.native_output).unwrap();

        let err = emitter.close().unwrap_err();
        assert!(matches!(err, BindingError::Io { .. }));
        assert!(!emitter.is_open());

        let java = std::fs::read_to_string(&layout.host_output).unwrap();
        assert_eq!(java, "previous");
        assert!(layout.native_output.is_dir());
    }

    #[test]
    fn test_close_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mut emitter = BindingEmitter::open(layout_in(tmp.path())).unwrap();
        emitter.close().unwrap();
        emitter.close().unwrap();
        assert!(!emitter.is_open());
    }

    #[test]
    fn test_add_after_close_fails() {
        let tmp = TempDir::new().unwrap();
        let mut emitter = BindingEmitter::open(layout_in(tmp.path())).unwrap();
        emitter.close().unwrap();

        let err = emitter.add_declaration(&foo()).unwrap_err();
        assert!(matches!(err, BindingError::Closed { .. }));
    }

    #[test]
    fn test_drop_finalizes() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(tmp.path());
        {
            let mut emitter = BindingEmitter::open(layout.clone()).unwrap();
            emitter.add_declaration(&foo()).unwrap();
        }

        let java = std::fs::read_to_string(&layout.host_output).unwrap();
        assert!(java.ends_with("}\n"));
    }

    #[test]
    fn test_missing_parent_directory_is_io_failure() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(tmp.path())
            .with_host_output(tmp.path().join("missing").join("LapackJNI.java"));

        let err = BindingEmitter::open(layout.clone()).err().unwrap();
        assert!(matches!(err, BindingError::Io { .. }));
        assert!(!layout.host_output.exists());
        assert!(!layout.native_output.exists());
    }

    #[test]
    fn test_nothing_visible_before_close() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(tmp.path());

        let mut emitter = BindingEmitter::open(layout.clone()).unwrap();
        emitter.add_declaration(&foo()).unwrap();
        assert!(!layout.host_output.exists());

        emitter.close().unwrap();
        assert!(layout.host_output.exists());
    }

    #[test]
    fn test_unsupported_types_recorded() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(tmp.path());
        let sig = FunctionSignature::new("solve", CTypeDescriptor::unsupported("struct result"))
            .with_param(Parameter::new("n", CTypeDescriptor::builtin("int")))
            .with_param(Parameter::new("m", CTypeDescriptor::unsupported("struct matrix")));

        let mut emitter = BindingEmitter::open(layout.clone()).unwrap();
        emitter.add_declaration(&sig).unwrap();
        assert_eq!(emitter.warnings().len(), 2);
        assert_eq!(emitter.warnings()[0].position, TypePosition::Return);
        emitter.close().unwrap();

        let java = std::fs::read_to_string(&layout.host_output).unwrap();
        assert!(java.contains("public native ??? solve(int n, ??? m);"));
    }

    #[test]
    fn test_discard_leaves_outputs_untouched() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(tmp.path());
        std::fs::write(&layout.host_output, "previous").unwrap();

        let mut emitter = BindingEmitter::open(layout.clone()).unwrap();
        emitter.add_declaration(&foo()).unwrap();
        emitter.discard();
        assert!(!emitter.is_open());
        drop(emitter);

        let java = std::fs::read_to_string(&layout.host_output).unwrap();
        assert_eq!(java, "previous");
        assert!(!layout.native_output.exists());
        let leftovers = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
