//! Functions, classes, data classes, interfaces and extensions.

use starlight_core::types::Type;

use crate::frontend::ast::*;

use super::super::EmitResult;
use super::{Frame, JsEmitter, default_value, extension_name, property_name};

impl JsEmitter<'_> {
    pub(super) fn emit_function(&mut self, f: &FunctionDecl) -> EmitResult<()> {
        let name = self.local_name(f.symbol, &f.name);
        self.emit_callable(f, &format!("function {name}"), false)
    }

    pub(super) fn emit_extension(&mut self, ext: &ExtensionDecl) -> EmitResult<()> {
        let Some(key) = ext.receiver_key.as_deref() else {
            return Err(self.unsupported("extension of an unnamed type", ext.receiver.span));
        };
        for func in &ext.functions {
            let name = extension_name(key, &func.node.name);
            self.emit_callable(&func.node, &format!("function {name}"), true)?;
        }
        self.receiver = "this";
        Ok(())
    }

    /// Emit a function or method; `header` is everything before the parameter list.
    fn emit_callable(&mut self, f: &FunctionDecl, header: &str, extension: bool) -> EmitResult<()> {
        let ret = return_type(self, f);
        self.begin_body();
        self.receiver = if extension { "self" } else { "this" };
        let prefix = if f.is_async { "async " } else { "" };
        self.in_frame(Frame::function(f.is_async), |s| {
            let mut params = Vec::with_capacity(f.params.len() + 1);
            if extension {
                s.locals.reserve("self");
                params.push("self".to_string());
            }
            for param in &f.params {
                let name = s.declare_local(param.symbol, &param.name);
                params.push(match &param.default {
                    Some(default) => format!("{name} = {}", s.expr(default)?),
                    None => name,
                });
            }
            s.out.blank_line();
            s.out.open(&format!("{prefix}{header}({})", params.join(", ")));
            match &f.body {
                FunctionBody::Block(block) => s.emit_statements(&block.statements)?,
                FunctionBody::Expr(expr) if ret.is_void() => s.emit_expr_stmt(expr)?,
                FunctionBody::Expr(expr) => {
                    let value = s.expr(expr)?;
                    s.out.line(&format!("return {value};"));
                }
            }
            s.out.close();
            Ok(())
        })
    }

    // ========================================================================
    // Types
    // ========================================================================

    pub(super) fn emit_class(&mut self, class: &ClassDecl) -> EmitResult<()> {
        let name = self.local_name(class.symbol, &class.name);
        self.out.blank_line();
        self.out.open(&format!("class {name}"));
        let body_fields: Vec<&VarDecl> = class
            .members
            .iter()
            .filter_map(|m| match m {
                ClassMember::Field(field) => Some(&field.node),
                ClassMember::Method(_) => None,
            })
            .collect();
        self.emit_constructor(&class.fields, &body_fields)?;
        for member in &class.members {
            if let ClassMember::Method(method) = member {
                self.emit_method(&method.node)?;
            }
        }
        self.out.close();
        Ok(())
    }

    pub(super) fn emit_data_class(&mut self, data: &DataClassDecl) -> EmitResult<()> {
        let name = self.local_name(data.symbol, &data.name);
        self.out.blank_line();
        self.out.open(&format!("class {name}"));
        self.emit_constructor(&data.fields, &[])?;
        for method in &data.methods {
            self.emit_method(&method.node)?;
        }

        let fields: Vec<String> = data.fields.iter().map(|f| property_name(&f.name)).collect();
        let defines = |method: &str| data.methods.iter().any(|m| m.node.name == method);
        if !defines("equals") {
            self.needs_eq = true;
            let mut checks = vec![format!("other instanceof {name}")];
            checks.extend(fields.iter().map(|f| format!("$eq(this.{f}, other.{f})")));
            self.out.blank_line();
            self.out.open("equals(other)");
            self.out.line(&format!("return {};", checks.join(" && ")));
            self.out.close();
        }
        if !defines("toString") {
            let parts: Vec<String> = fields.iter().map(|f| format!("\"{f}=\" + this.{f}")).collect();
            let body = if parts.is_empty() {
                format!("\"{}()\"", data.name)
            } else {
                format!("\"{}(\" + {} + \")\"", data.name, parts.join(" + \", \" + "))
            };
            self.out.blank_line();
            self.out.open("toString()");
            self.out.line(&format!("return {body};"));
            self.out.close();
        }
        self.out.close();
        Ok(())
    }

    /// Interfaces have no runtime representation.
    pub(super) fn emit_interface(&mut self, interface: &InterfaceDecl) {
        let methods: Vec<String> = interface
            .methods
            .iter()
            .map(|sig| {
                let params: Vec<&str> = sig.node.params.iter().map(|p| p.name.as_str()).collect();
                format!("{}({})", sig.node.name, params.join(", "))
            })
            .collect();
        self.out.blank_line();
        self.out
            .comment(&format!("interface {} {{ {} }}", interface.name, methods.join("; ")));
    }

    fn emit_method(&mut self, method: &FunctionDecl) -> EmitResult<()> {
        let name = property_name(&method.name);
        self.emit_callable(method, &name, false)
    }

    /// Assign header fields from the arguments, then body fields from their initializers.
    fn emit_constructor(&mut self, fields: &[FieldParam], body_fields: &[&VarDecl]) -> EmitResult<()> {
        if fields.is_empty() && body_fields.is_empty() {
            return Ok(());
        }
        self.begin_body();
        self.receiver = "this";
        let params: Vec<String> = fields.iter().map(|f| self.declare_local(None, &f.name)).collect();
        self.out.open(&format!("constructor({})", params.join(", ")));
        for (field, param) in fields.iter().zip(&params) {
            self.out
                .line(&format!("this.{} = {param};", property_name(&field.name)));
        }
        self.in_frame(Frame::function(false), |s| {
            for var in body_fields {
                let value = match &var.init {
                    Some(init) => s.expr(init)?,
                    None => default_value(&s.var_type(var)).to_string(),
                };
                s.out
                    .line(&format!("this.{} = {value};", property_name(&var.name)));
            }
            Ok(())
        })?;
        self.out.close();
        Ok(())
    }
}

fn return_type(emitter: &JsEmitter<'_>, f: &FunctionDecl) -> Type {
    f.resolved_return
        .clone()
        .or_else(|| match f.symbol.map(|id| &emitter.symbol(id).ty) {
            Some(Type::Function { ret, .. }) => Some((**ret).clone()),
            _ => None,
        })
        .unwrap_or_else(Type::void)
}
