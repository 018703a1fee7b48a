//! Functions, classes, data classes, interfaces and extensions.

use starlight_core::types::Type;

use crate::frontend::ast::*;

use super::super::EmitResult;
use super::super::emitter::capitalize;
use super::types::default_value;
use super::{JvmEmitter, extension_name, member_name};

/// How a function is declared in the generated class.
#[derive(Debug, Clone, Copy)]
pub(super) enum MethodKind<'a> {
    /// Top-level function.
    Static,
    /// Method of a nested class.
    Instance,
    /// Extension function: static, with the receiver as the first parameter.
    Extension { key: &'a str, receiver: &'a Type },
}

impl JvmEmitter<'_> {
    // ========================================================================
    // Functions
    // ========================================================================

    /// Emit a function, plus one forwarding overload per omittable trailing parameter.
    pub(super) fn emit_function(&mut self, f: &FunctionDecl, kind: MethodKind<'_>) -> EmitResult<()> {
        if f.is_async {
            return Err(self.unsupported("`async fun`", f.name_span));
        }
        let ret = f
            .resolved_return
            .clone()
            .or_else(|| match f.symbol.map(|id| &self.symbol(id).ty) {
                Some(Type::Function { ret, .. }) => Some((**ret).clone()),
                _ => None,
            })
            .unwrap_or_else(Type::void);
        let ret_java = self.java_type(&ret, f.name_span)?;
        let (modifiers, name) = match kind {
            MethodKind::Static => ("public static", member_name(&f.name)),
            MethodKind::Instance => ("public", member_name(&f.name)),
            MethodKind::Extension { key, .. } => ("public static", extension_name(key, &f.name)),
        };
        self.receiver = if matches!(kind, MethodKind::Extension { .. }) { "self" } else { "this" };
        self.return_ty = Some(ret.clone());

        self.begin_body();
        let params = self.declare_params(&f.params, f.params.len(), kind)?;
        self.out.blank_line();
        self.out
            .open(&format!("{modifiers} {ret_java} {name}({})", params.declarations.join(", ")));
        match &f.body {
            FunctionBody::Block(block) => self.emit_statements(&block.statements)?,
            FunctionBody::Expr(expr) if ret.is_void() => self.emit_expr_stmt(expr)?,
            FunctionBody::Expr(expr) => {
                let value = self.expr_as(expr, &ret)?;
                self.out.line(&format!("return {value};"));
            }
        }
        self.out.close();

        let required = f
            .params
            .iter()
            .rposition(|p| p.default.is_none())
            .map_or(0, |i| i + 1);
        for count in required..f.params.len() {
            self.begin_body();
            let params = self.declare_params(&f.params, count, kind)?;
            self.out.blank_line();
            self.out
                .open(&format!("{modifiers} {ret_java} {name}({})", params.declarations.join(", ")));
            let mut args = params.names;
            for param in &f.params[count..] {
                let Some(default) = &param.default else {
                    return Err(self.unsupported("parameter without a default after a defaulted one", param.span));
                };
                let ty = param.resolved.clone().unwrap_or_else(Type::any);
                args.push(self.expr_as(default, &ty)?);
            }
            let call = format!("{name}({})", args.join(", "));
            if ret.is_void() {
                self.out.line(&format!("{call};"));
            } else {
                self.out.line(&format!("return {call};"));
            }
            self.out.close();
        }
        Ok(())
    }

    /// Declare the first `count` parameters (after the receiver of an extension).
    fn declare_params(&mut self, params: &[Param], count: usize, kind: MethodKind<'_>) -> EmitResult<Params> {
        let mut out = Params::default();
        if let MethodKind::Extension { receiver, .. } = kind {
            let java = self.java_type(receiver, Span::default())?;
            self.locals.reserve("self");
            out.declarations.push(format!("{java} self"));
            out.names.push("self".to_string());
        }
        for param in &params[..count] {
            let ty = param.resolved.clone().unwrap_or_else(Type::any);
            let java = self.java_type(&ty, param.span)?;
            let name = self.declare_local(param.symbol, &param.name);
            out.declarations.push(format!("{java} {name}"));
            out.names.push(name);
        }
        Ok(out)
    }

    pub(super) fn emit_extension(&mut self, ext: &ExtensionDecl) -> EmitResult<()> {
        let Some(key) = ext.receiver_key.as_deref() else {
            return Err(self.unsupported("extension of an unnamed type", ext.receiver.span));
        };
        let receiver = ext.resolved_receiver.clone().unwrap_or_else(Type::any);
        for func in &ext.functions {
            self.emit_function(&func.node, MethodKind::Extension { key, receiver: &receiver })?;
        }
        self.receiver = "this";
        Ok(())
    }

    // ========================================================================
    // Types
    // ========================================================================

    pub(super) fn emit_class(&mut self, class: &ClassDecl) -> EmitResult<()> {
        self.current_type = Some(class.name.clone());
        self.out.blank_line();
        self.out
            .open(&format!("public static class {}{}", class.name, implements(&class.supertypes)));
        let header = self.header_fields(&class.fields)?;
        for (java, name) in &header {
            self.out.line(&format!("public final {java} {name};"));
        }
        let mut body_fields = Vec::new();
        for member in &class.members {
            let ClassMember::Field(field) = member else { continue };
            let var = &field.node;
            let ty = self.var_type(var);
            let java = self.java_type(&ty, var.name_span)?;
            let modifier = if var.mutable { "" } else { "final " };
            self.out
                .line(&format!("public {modifier}{java} {};", member_name(&var.name)));
            body_fields.push((var, ty));
        }

        self.begin_body();
        self.receiver = "this";
        self.return_ty = Some(Type::void());
        self.out.blank_line();
        self.open_constructor(&class.name, &header);
        for (var, ty) in body_fields {
            let value = match &var.init {
                Some(init) => self.expr_as(init, &ty)?,
                None => default_value(&ty).to_string(),
            };
            self.out.line(&format!("this.{} = {value};", member_name(&var.name)));
        }
        self.out.close();

        for member in &class.members {
            if let ClassMember::Method(method) = member {
                self.emit_function(&method.node, MethodKind::Instance)?;
            }
        }
        self.out.close();
        self.current_type = None;
        Ok(())
    }

    /// Data classes get private fields with getters, value equality and a readable `toString`.
    pub(super) fn emit_data_class(&mut self, data: &DataClassDecl) -> EmitResult<()> {
        self.current_type = Some(data.name.clone());
        self.out.blank_line();
        self.out
            .open(&format!("public static final class {}{}", data.name, implements(&data.supertypes)));
        let fields = self.header_fields(&data.fields)?;
        for (java, name) in &fields {
            self.out.line(&format!("private final {java} {name};"));
        }
        self.begin_body();
        self.out.blank_line();
        self.open_constructor(&data.name, &fields);
        self.out.close();

        for (java, name) in &fields {
            self.out.blank_line();
            self.out.open(&format!("public {java} get{}()", capitalize(name)));
            self.out.line(&format!("return this.{name};"));
            self.out.close();
        }
        for method in &data.methods {
            self.emit_function(&method.node, MethodKind::Instance)?;
        }

        let defines = |name: &str| data.methods.iter().any(|m| m.node.name == name);
        if !defines("equals") {
            self.emit_data_equals(&data.name, &fields);
        }
        if !defines("hashCode") {
            let names: Vec<String> = fields.iter().map(|(_, n)| format!("this.{n}")).collect();
            self.out.blank_line();
            self.out.line("@Override");
            self.out.open("public int hashCode()");
            self.out
                .line(&format!("return java.util.Objects.hash({});", names.join(", ")));
            self.out.close();
        }
        if !defines("toString") {
            let parts: Vec<String> = fields
                .iter()
                .map(|(_, n)| format!("\"{n}=\" + this.{n}"))
                .collect();
            let body = if parts.is_empty() {
                format!("\"{}()\"", data.name)
            } else {
                format!("\"{}(\" + {} + \")\"", data.name, parts.join(" + \", \" + "))
            };
            self.out.blank_line();
            self.out.line("@Override");
            self.out.open("public String toString()");
            self.out.line(&format!("return {body};"));
            self.out.close();
        }
        self.out.close();
        self.current_type = None;
        Ok(())
    }

    fn emit_data_equals(&mut self, name: &str, fields: &[(String, String)]) {
        self.out.blank_line();
        self.out.line("@Override");
        self.out.open("public boolean equals(Object other)");
        self.out.open(&format!("if (!(other instanceof {name}))"));
        self.out.line("return false;");
        self.out.close();
        if fields.is_empty() {
            self.out.line("return true;");
        } else {
            self.out.line(&format!("final {name} that = ({name}) other;"));
            let checks: Vec<String> = fields
                .iter()
                .map(|(_, n)| format!("java.util.Objects.equals(this.{n}, that.{n})"))
                .collect();
            self.out.line(&format!("return {};", checks.join(" && ")));
        }
        self.out.close();
    }

    pub(super) fn emit_interface(&mut self, interface: &InterfaceDecl) -> EmitResult<()> {
        self.out.blank_line();
        self.out.open(&format!("public interface {}", interface.name));
        for sig in &interface.methods {
            let sig = &sig.node;
            if let Some(param) = sig.params.iter().find(|p| p.default.is_some()) {
                return Err(self.unsupported("default value on an interface method parameter", param.span));
            }
            let ret = match sig.symbol.map(|id| &self.symbol(id).ty) {
                Some(Type::Function { ret, .. }) => (**ret).clone(),
                _ => Type::void(),
            };
            let ret_java = self.java_type(&ret, sig.params.first().map(|p| p.span).unwrap_or_default())?;
            let mut params = Vec::with_capacity(sig.params.len());
            for param in &sig.params {
                let ty = param.resolved.clone().unwrap_or_else(Type::any);
                params.push(format!("{} {}", self.java_type(&ty, param.span)?, member_name(&param.name)));
            }
            self.out
                .line(&format!("{ret_java} {}({});", member_name(&sig.name), params.join(", ")));
        }
        self.out.close();
        Ok(())
    }

    /// Java type and name of each header field.
    fn header_fields(&self, fields: &[FieldParam]) -> EmitResult<Vec<(String, String)>> {
        fields
            .iter()
            .map(|field| {
                let ty = field.resolved.clone().unwrap_or_else(Type::any);
                Ok((self.java_type(&ty, field.span)?, member_name(&field.name)))
            })
            .collect()
    }

    /// Open a constructor taking and assigning every header field.
    fn open_constructor(&mut self, name: &str, fields: &[(String, String)]) {
        for (_, field) in fields {
            self.locals.reserve(field);
        }
        let params: Vec<String> = fields.iter().map(|(java, n)| format!("{java} {n}")).collect();
        self.out.open(&format!("public {name}({})", params.join(", ")));
        for (_, field) in fields {
            self.out.line(&format!("this.{field} = {field};"));
        }
    }
}

#[derive(Debug, Default)]
struct Params {
    declarations: Vec<String>,
    names: Vec<String>,
}

fn implements(supertypes: &[Spanned<Ident>]) -> String {
    if supertypes.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = supertypes.iter().map(|s| s.node.as_str()).collect();
    format!(" implements {}", names.join(", "))
}
