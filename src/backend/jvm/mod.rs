//! Java source backend for the managed runtime.
//!
//! A unit becomes one public class named after it:
//!
//! - top-level functions are `public static` methods, top-level `val`/`var` are `private static`
//!   fields assigned by `main(String[])`, which also runs the top-level statements in order and
//!   finally calls a user `main()` when there is one
//! - classes, data classes and interfaces become nested types; extension functions become static
//!   methods named `Receiver_name` that take the receiver as `self`
//! - parameters with default values get one overload per omittable suffix
//!
//! ## Notes
//!
//! - Java has no block or `match` expressions, so those are hoisted: their statements are written
//!   before the statement that uses them and the expression becomes a temporary. `while` and
//!   `else if` conditions that need hoisting are restructured; positions where hoisting would
//!   change what gets evaluated (short-circuit operands, conditional branches, `for` headers)
//!   report [`EmitError::Unsupported`] instead.
//! - Java lambdas may only capture effectively final locals, so capturing a `var` (or the counter
//!   of a range loop) is unsupported.
//! - Java forbids a local from shadowing another local of the same method, so every local gets a
//!   name that is unique within its method.
//! - `async`/`await` have no counterpart here and are unsupported.

mod decls;
mod exprs;
mod patterns;
mod stmts;
mod types;

use std::collections::{HashMap, HashSet};

use crate::frontend::ast::*;
use crate::frontend::symbols::Symbol;

use super::emitter::{CodeWriter, NameAllocator, identifier_from, unwrap_parens};
use super::{Backend, EmitError, EmitResult, Target, TypedUnit};

/// Words a Java identifier may not be.
const RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "null", "package", "private", "protected", "public", "record", "return",
    "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "true", "try", "var", "void", "volatile", "while", "yield", "_",
];

/// Generates Java source.
#[derive(Debug, Clone, Default)]
pub struct JvmBackend {
    class_name: Option<String>,
}

impl JvmBackend {
    /// `class_name` overrides the class name derived from the unit name.
    pub fn new(class_name: Option<String>) -> Self {
        Self { class_name }
    }

    fn class_name(&self, unit: &TypedUnit) -> String {
        identifier_from(self.class_name.as_deref().unwrap_or(&unit.name))
    }
}

impl Backend for JvmBackend {
    fn target(&self) -> Target {
        Target::Jvm
    }

    #[tracing::instrument(skip_all, fields(unit = %unit.name, target = "jvm"))]
    fn generate(&self, unit: &TypedUnit) -> EmitResult<String> {
        let mut emitter = JvmEmitter::new(unit, self.class_name(unit));
        emitter.emit_program()?;
        let source = emitter.out.finish();
        tracing::debug!(bytes = source.len(), "generated java");
        Ok(source)
    }

    /// Java requires the file to be named after its public class.
    fn output_file_name(&self, unit: &TypedUnit) -> String {
        format!("{}.java", self.class_name(unit))
    }
}

/// Emission state for one unit.
pub(super) struct JvmEmitter<'u> {
    unit: &'u TypedUnit,
    class_name: String,
    out: CodeWriter,
    /// Java names of locals and parameters of the method being emitted.
    names: HashMap<SymbolId, String>,
    locals: NameAllocator,
    /// Top-level `val`/`var` symbols, emitted as static fields.
    globals: HashSet<SymbolId>,
    next_temp: u32,
    /// Set while emitting an expression whose hoisted statements would run at the wrong time.
    hoist_barrier: Option<&'static str>,
    /// Spelling of the receiver inside the current body (`this`, or `self` in extensions).
    receiver: &'static str,
    /// Return type of the function or lambda being emitted.
    return_ty: Option<starlight_core::types::Type>,
    /// Nested type whose members are being emitted.
    current_type: Option<String>,
    /// Locals declared inside each enclosing lambda, innermost last.
    lambda_locals: Vec<HashSet<SymbolId>>,
    /// Loop variables of counted `for` loops; Java mutates them in place.
    counters: HashSet<SymbolId>,
    needs_assert: bool,
    needs_map_of: bool,
}

impl<'u> JvmEmitter<'u> {
    fn new(unit: &'u TypedUnit, class_name: String) -> Self {
        Self {
            unit,
            class_name,
            out: CodeWriter::new(),
            names: HashMap::new(),
            locals: NameAllocator::default(),
            globals: HashSet::new(),
            next_temp: 0,
            hoist_barrier: None,
            receiver: "this",
            return_ty: None,
            current_type: None,
            lambda_locals: Vec::new(),
            counters: HashSet::new(),
            needs_assert: false,
            needs_map_of: false,
        }
    }

    fn unsupported(&self, construct: impl Into<String>, span: Span) -> EmitError {
        EmitError::unsupported(Target::Jvm, construct, span)
    }

    fn symbol(&self, id: SymbolId) -> &'u Symbol {
        self.unit.symbols.symbol(id)
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Start a new method body: local names may be reused again.
    fn begin_body(&mut self) {
        self.locals.reset();
        self.locals.reserve("$args");
    }

    /// Allocate the Java name of a local or parameter declared by `symbol`.
    fn declare_local(&mut self, symbol: Option<SymbolId>, name: &str) -> String {
        let java = self.locals.fresh(name, RESERVED);
        if let Some(id) = symbol {
            self.names.insert(id, java.clone());
            if let Some(scope) = self.lambda_locals.last_mut() {
                scope.insert(id);
            }
        }
        java
    }

    /// Java name of a previously declared local.
    fn local_name(&self, symbol: Option<SymbolId>, name: &str) -> String {
        symbol
            .and_then(|id| self.names.get(&id).cloned())
            .unwrap_or_else(|| member_name(name))
    }

    /// A fresh compiler temporary such as `$m0`.
    fn temp(&mut self, prefix: &str) -> String {
        let name = format!("${prefix}{}", self.next_temp);
        self.next_temp += 1;
        self.locals.reserve(&name);
        name
    }

    // ========================================================================
    // Hoisting
    // ========================================================================

    /// Run `f` where statements must not be hoisted; `context` names the position for errors.
    fn without_hoisting<T>(
        &mut self,
        context: &'static str,
        f: impl FnOnce(&mut Self) -> EmitResult<T>,
    ) -> EmitResult<T> {
        let saved = self.hoist_barrier;
        self.hoist_barrier = saved.or(Some(context));
        let result = f(self);
        self.hoist_barrier = saved;
        result
    }

    fn check_hoist(&self, construct: &str, span: Span) -> EmitResult<()> {
        match self.hoist_barrier {
            Some(context) => Err(self.unsupported(format!("{construct} inside {context}"), span)),
            None => Ok(()),
        }
    }

    /// Emit statements into a separate buffer one level deeper (lambda bodies).
    fn capture(&mut self, f: impl FnOnce(&mut Self) -> EmitResult<()>) -> EmitResult<String> {
        self.capture_at(self.out.level() + 1, f)
    }

    /// Emit statements into a separate buffer whose lines start `level` steps deep.
    fn capture_at(&mut self, level: usize, f: impl FnOnce(&mut Self) -> EmitResult<()>) -> EmitResult<String> {
        let nested = CodeWriter::with_level(level);
        let saved_out = std::mem::replace(&mut self.out, nested);
        let saved_barrier = self.hoist_barrier.take();
        let result = f(self);
        self.hoist_barrier = saved_barrier;
        let nested = std::mem::replace(&mut self.out, saved_out);
        result?;
        Ok(nested.finish())
    }

    // ========================================================================
    // Program
    // ========================================================================

    fn emit_program(&mut self) -> EmitResult<()> {
        let unit = self.unit;
        let program = &unit.program;
        for decl in &program.declarations {
            match &decl.node {
                Declaration::Statement(Statement::Var(var)) => self.globals.extend(var.symbol),
                Declaration::Class(ClassDecl { name, name_span, .. })
                | Declaration::Data(DataClassDecl { name, name_span, .. })
                | Declaration::Interface(InterfaceDecl { name, name_span, .. })
                    if *name == self.class_name =>
                {
                    return Err(self.unsupported(
                        format!("type `{name}` sharing its name with the generated class"),
                        *name_span,
                    ));
                }
                _ => {}
            }
        }

        self.out.open(&format!("public class {}", self.class_name));
        self.emit_static_fields(program)?;
        for decl in &program.declarations {
            match &decl.node {
                Declaration::Function(f) => self.emit_function(f, decls::MethodKind::Static)?,
                Declaration::Extension(e) => self.emit_extension(e)?,
                _ => {}
            }
        }
        for decl in &program.declarations {
            match &decl.node {
                Declaration::Class(c) => self.emit_class(c)?,
                Declaration::Data(d) => self.emit_data_class(d)?,
                Declaration::Interface(i) => self.emit_interface(i)?,
                _ => {}
            }
        }
        self.emit_main(program)?;
        self.emit_helpers();
        self.out.close();
        Ok(())
    }

    fn emit_static_fields(&mut self, program: &Program) -> EmitResult<()> {
        let mut any = false;
        for decl in &program.declarations {
            let Declaration::Statement(Statement::Var(var)) = &decl.node else { continue };
            let ty = self.var_type(var);
            let java = self.java_type(&ty, var.name_span)?;
            if !any {
                self.out.blank_line();
                any = true;
            }
            self.out.line(&format!("private static {java} {};", member_name(&var.name)));
        }
        Ok(())
    }

    /// `main(String[])`: global initializers and top-level statements in order.
    fn emit_main(&mut self, program: &Program) -> EmitResult<()> {
        self.begin_body();
        self.receiver = "this";
        self.return_ty = Some(starlight_core::types::Type::void());
        self.out.blank_line();
        self.out.open("public static void main(String[] $args)");
        for decl in &program.declarations {
            if let Declaration::Statement(stmt) = &decl.node {
                self.emit_stmt(stmt)?;
            }
        }
        let has_user_main = program.declarations.iter().any(|d| {
            matches!(&d.node, Declaration::Function(f) if f.name == "main" && f.params.is_empty() && !f.is_async)
        });
        if has_user_main {
            self.out.line("main();");
        }
        self.out.close();
        Ok(())
    }

    fn emit_helpers(&mut self) {
        if self.needs_assert {
            self.out.blank_line();
            self.out.open("private static void $assert(boolean condition)");
            self.out.open("if (!condition)");
            self.out.line("throw new AssertionError(\"assertion failed\");");
            self.out.close();
            self.out.close();
        }
        if self.needs_map_of {
            self.out.blank_line();
            self.out.line("@SuppressWarnings(\"unchecked\")");
            self.out.open("private static <K, V> java.util.Map<K, V> $mapOf(Object... entries)");
            self.out.line("java.util.Map<K, V> map = new java.util.LinkedHashMap<>();");
            self.out.open("for (int i = 0; i < entries.length; i += 2)");
            self.out.line("map.put((K) entries[i], (V) entries[i + 1]);");
            self.out.close();
            self.out.line("return map;");
            self.out.close();
        }
    }
}

/// Java spelling of a field, method or function name.
fn member_name(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Static method name of an extension function (`string_shout`).
fn extension_name(receiver_key: &str, name: &str) -> String {
    format!("{}_{name}", identifier_from(receiver_key))
}

#[cfg(test)]
mod tests;
