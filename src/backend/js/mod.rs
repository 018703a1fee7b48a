//! JavaScript (ES2020) backend for the dynamic runtime.
//!
//! A unit becomes one script:
//!
//! - classes and data classes become `class` declarations, interfaces a comment line
//! - functions become `function` / `async function`, extension functions `Receiver_name(self, ..)`
//! - top-level `val`/`var` become `const`/`let` and run with the other top-level statements in
//!   order, followed by a call of a user `main()` when there is one
//!
//! ## Notes
//!
//! - `match` and block expressions used as values become immediately invoked arrow functions.
//!   A `return`, `break` or `continue` would leave that function instead of the enclosing one, so
//!   those jumps are unsupported there. In statement position both are emitted inline.
//! - Numbers are IEEE doubles: `long` values beyond 2^53 lose precision, and `int` arithmetic does
//!   not wrap. Integer division truncates through `Math.trunc`.
//! - Equality on values that are not primitives goes through the `$eq` helper, so data classes and
//!   lists compare by value like on the managed runtime.

mod decls;
mod exprs;
mod patterns;
mod stmts;

use std::collections::HashMap;

use starlight_core::types::{PrimitiveType, Type};

use crate::frontend::ast::*;
use crate::frontend::symbols::Symbol;

use super::emitter::{CodeWriter, NameAllocator};
use super::{Backend, EmitError, EmitResult, Target, TypedUnit};

/// Words a JavaScript binding may not be.
const RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let", "new",
    "null", "package", "private", "protected", "public", "return", "static", "super", "switch",
    "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while", "with", "yield",
    "NaN", "Infinity", "Map", "Math", "Number", "String", "Array", "Error", "TypeError", "console",
    "process",
];

/// Generates JavaScript.
#[derive(Debug, Clone)]
pub struct JsBackend {
    strict: bool,
}

impl JsBackend {
    /// `strict` emits a `"use strict";` header.
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }
}

impl Default for JsBackend {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Backend for JsBackend {
    fn target(&self) -> Target {
        Target::Js
    }

    #[tracing::instrument(skip_all, fields(unit = %unit.name, target = "js"))]
    fn generate(&self, unit: &TypedUnit) -> EmitResult<String> {
        let mut emitter = JsEmitter::new(unit);
        if self.strict {
            emitter.out.line("\"use strict\";");
        }
        emitter.emit_program()?;
        let source = emitter.out.finish();
        tracing::debug!(bytes = source.len(), "generated javascript");
        Ok(source)
    }
}

/// What `return`, `break` and `continue` may target from the current position.
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Inside an immediately invoked arrow function standing for an expression.
    in_iife: bool,
    /// Loops opened since the frame started.
    loops: u32,
    is_async: bool,
}

impl Frame {
    fn function(is_async: bool) -> Self {
        Self { in_iife: false, loops: 0, is_async }
    }
}

/// Emission state for one unit.
pub(super) struct JsEmitter<'u> {
    unit: &'u TypedUnit,
    out: CodeWriter,
    /// JavaScript names of globals, locals and parameters.
    names: HashMap<SymbolId, String>,
    /// Names of top-level bindings; locals never reuse them.
    globals: NameAllocator,
    global_names: Vec<String>,
    locals: NameAllocator,
    frames: Vec<Frame>,
    next_temp: u32,
    /// Spelling of the receiver inside the current body (`this`, or `self` in extensions).
    receiver: &'static str,
    needs_eq: bool,
    needs_nn: bool,
    needs_assert: bool,
    needs_range: bool,
    needs_has: bool,
    needs_str: bool,
}

impl<'u> JsEmitter<'u> {
    fn new(unit: &'u TypedUnit) -> Self {
        Self {
            unit,
            out: CodeWriter::new(),
            names: HashMap::new(),
            globals: NameAllocator::default(),
            global_names: Vec::new(),
            locals: NameAllocator::default(),
            frames: vec![Frame::function(false)],
            next_temp: 0,
            receiver: "this",
            needs_eq: false,
            needs_nn: false,
            needs_assert: false,
            needs_range: false,
            needs_has: false,
            needs_str: false,
        }
    }

    fn unsupported(&self, construct: impl Into<String>, span: Span) -> EmitError {
        EmitError::unsupported(Target::Js, construct, span)
    }

    fn symbol(&self, id: SymbolId) -> &'u Symbol {
        self.unit.symbols.symbol(id)
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Start a new function body: locals are unique within it and never hide a global.
    fn begin_body(&mut self) {
        self.locals.reset();
        for name in &self.global_names {
            self.locals.reserve(name);
        }
    }

    fn declare_local(&mut self, symbol: Option<SymbolId>, name: &str) -> String {
        let js = self.locals.fresh(name, RESERVED);
        if let Some(id) = symbol {
            self.names.insert(id, js.clone());
        }
        js
    }

    fn declare_global(&mut self, symbol: Option<SymbolId>, name: &str) -> String {
        let js = self.globals.fresh(name, RESERVED);
        if let Some(id) = symbol {
            self.names.insert(id, js.clone());
        }
        self.global_names.push(js.clone());
        js
    }

    fn local_name(&self, symbol: Option<SymbolId>, name: &str) -> String {
        symbol
            .and_then(|id| self.names.get(&id).cloned())
            .unwrap_or_else(|| binding_name(name))
    }

    /// JavaScript name of a user class or data class.
    fn type_name(&self, name: &str) -> String {
        let symbol = self.unit.symbols.type_def(name).map(|def| def.symbol);
        self.local_name(symbol, name)
    }

    fn temp(&mut self, prefix: &str) -> String {
        let name = format!("${prefix}{}", self.next_temp);
        self.next_temp += 1;
        self.locals.reserve(&name);
        name
    }

    // ========================================================================
    // Frames
    // ========================================================================

    fn frame(&self) -> Frame {
        self.frames.last().copied().unwrap_or(Frame::function(false))
    }

    fn in_frame<T>(&mut self, frame: Frame, f: impl FnOnce(&mut Self) -> EmitResult<T>) -> EmitResult<T> {
        self.frames.push(frame);
        let result = f(self);
        self.frames.pop();
        result
    }

    fn in_loop<T>(&mut self, f: impl FnOnce(&mut Self) -> EmitResult<T>) -> EmitResult<T> {
        if let Some(frame) = self.frames.last_mut() {
            frame.loops += 1;
        }
        let result = f(self);
        if let Some(frame) = self.frames.last_mut() {
            frame.loops -= 1;
        }
        result
    }

    /// An immediately invoked arrow function around statements written by `f`.
    fn iife(&mut self, f: impl FnOnce(&mut Self) -> EmitResult<()>) -> EmitResult<String> {
        let is_async = self.frame().is_async;
        let frame = Frame { in_iife: true, loops: 0, is_async };
        let body = self.in_frame(frame, |s| s.braced(f))?;
        Ok(if is_async {
            format!("(await (async () => {body})())")
        } else {
            format!("(() => {body})()")
        })
    }

    // ========================================================================
    // Program
    // ========================================================================

    fn emit_program(&mut self) -> EmitResult<()> {
        let unit = self.unit;
        let program = &unit.program;

        // Functions, types and globals share the script's top-level scope.
        for decl in &program.declarations {
            match &decl.node {
                Declaration::Function(f) => {
                    self.declare_global(f.symbol, &f.name);
                }
                Declaration::Class(c) => {
                    self.declare_global(c.symbol, &c.name);
                }
                Declaration::Data(d) => {
                    self.declare_global(d.symbol, &d.name);
                }
                Declaration::Statement(Statement::Var(var)) => {
                    self.declare_global(var.symbol, &var.name);
                }
                Declaration::Interface(_) | Declaration::Extension(_) | Declaration::Statement(_) => {}
            }
        }

        for decl in &program.declarations {
            match &decl.node {
                Declaration::Class(c) => self.emit_class(c)?,
                Declaration::Data(d) => self.emit_data_class(d)?,
                Declaration::Interface(i) => self.emit_interface(i),
                _ => {}
            }
        }
        for decl in &program.declarations {
            match &decl.node {
                Declaration::Function(f) => self.emit_function(f)?,
                Declaration::Extension(e) => self.emit_extension(e)?,
                _ => {}
            }
        }

        self.begin_body();
        self.receiver = "this";
        let mut first = true;
        for decl in &program.declarations {
            if let Declaration::Statement(stmt) = &decl.node {
                if first {
                    self.out.blank_line();
                    first = false;
                }
                self.emit_stmt(stmt, decl.span)?;
            }
        }
        let has_user_main = program
            .declarations
            .iter()
            .any(|d| matches!(&d.node, Declaration::Function(f) if f.name == "main" && f.params.is_empty()));
        if has_user_main {
            self.out.blank_line();
            let name = program
                .declarations
                .iter()
                .find_map(|d| match &d.node {
                    Declaration::Function(f) if f.name == "main" => Some(self.local_name(f.symbol, "main")),
                    _ => None,
                })
                .unwrap_or_else(|| "main".to_string());
            self.out.line(&format!("{name}();"));
        }
        self.emit_helpers();
        Ok(())
    }

    fn emit_helpers(&mut self) {
        if self.needs_eq {
            self.out.blank_line();
            self.out.open("function $eq(a, b)");
            self.out.open("if (a === b)");
            self.out.line("return true;");
            self.out.close();
            self.out.open("if (a == null || b == null)");
            self.out.line("return false;");
            self.out.close();
            self.out.open("if (Array.isArray(a) && Array.isArray(b))");
            self.out
                .line("return a.length === b.length && a.every((x, i) => $eq(x, b[i]));");
            self.out.close();
            self.out.open("if (typeof a.equals === \"function\")");
            self.out.line("return a.equals(b);");
            self.out.close();
            self.out.line("return false;");
            self.out.close();
        }
        if self.needs_has {
            self.out.blank_line();
            self.out.open("function $has(list, value)");
            self.out.line("return list.some((x) => $eq(x, value));");
            self.out.close();
        }
        if self.needs_str {
            self.out.blank_line();
            self.out.open("function $str(value)");
            self.out.open("if (Array.isArray(value))");
            self.out.line("return \"[\" + value.map($str).join(\", \") + \"]\";");
            self.out.close();
            self.out.open("if (value instanceof Map)");
            self.out.line(
                "return \"{\" + Array.from(value, ([k, v]) => $str(k) + \"=\" + $str(v)).join(\", \") + \"}\";",
            );
            self.out.close();
            self.out.line("return String(value);");
            self.out.close();
        }
        if self.needs_nn {
            self.out.blank_line();
            self.out.open("function $nn(value)");
            self.out.open("if (value == null)");
            self.out.line("throw new TypeError(\"unexpected null value\");");
            self.out.close();
            self.out.line("return value;");
            self.out.close();
        }
        if self.needs_assert {
            self.out.blank_line();
            self.out.open("function $assert(condition)");
            self.out.open("if (!condition)");
            self.out.line("throw new Error(\"assertion failed\");");
            self.out.close();
            self.out.close();
        }
        if self.needs_range {
            self.out.blank_line();
            self.out.open("function $range(start, end)");
            self.out.line("const out = [];");
            self.out.open("for (let i = start; i < end; i++)");
            self.out.line("out.push(i);");
            self.out.close();
            self.out.line("return out;");
            self.out.close();
        }
    }
}

/// JavaScript spelling of a binding (function, local, class) name.
fn binding_name(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Property name of a field or method; names with a special meaning on objects get a `_`.
fn property_name(name: &str) -> String {
    if matches!(name, "constructor" | "__proto__" | "prototype") {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Function name of an extension (`string_shout`).
fn extension_name(receiver_key: &str, name: &str) -> String {
    format!("{}_{name}", super::emitter::identifier_from(receiver_key))
}

/// `true` when values of `ty` compare correctly with `===`.
fn is_js_primitive(ty: &Type) -> bool {
    matches!(
        ty.non_null(),
        Type::Primitive(
            PrimitiveType::Int
                | PrimitiveType::Long
                | PrimitiveType::Float
                | PrimitiveType::Double
                | PrimitiveType::Boolean
                | PrimitiveType::Char
                | PrimitiveType::String
        )
    )
}

/// Initial value of a `var` declared without an initializer.
fn default_value(ty: &Type) -> &'static str {
    match ty {
        Type::Primitive(p) if p.is_numeric() => "0",
        Type::Primitive(PrimitiveType::Boolean) => "false",
        Type::Primitive(PrimitiveType::Char) => "\"\\0\"",
        _ => "null",
    }
}

#[cfg(test)]
mod tests;
