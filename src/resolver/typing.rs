//! 型式の解決と式の型付け

use std::collections::HashSet;

use crate::ast::{ArrayLen, CallExpr, Expr, ExprKind, Signature, Span, TypeExpr, TypeExprKind, UnaryOp};
use crate::error::ResolutionError;
use crate::types::{BasicKind, Field, TypeId, TypeKind, UnsupportedKind};

use super::{Package, Scopes};

type TypeResult = Result<TypeId, ResolutionError>;

impl Package {
    /// ソース上の型を型アリーナの型に解決する
    pub(super) fn resolve_type_expr(&mut self, expr: &TypeExpr) -> TypeResult {
        match &expr.kind {
            TypeExprKind::Name(name) => self.resolve_type_name(name, expr.span),
            TypeExprKind::Qualified(pkg, name) => Ok(self
                .arena
                .intern(TypeKind::Unresolved(format!("{}.{}", pkg, name)))),
            TypeExprKind::Pointer(elem) => {
                let elem = self.resolve_type_expr(elem)?;
                Ok(self.arena.pointer(elem))
            }
            TypeExprKind::Slice(elem) => {
                let elem = self.resolve_type_expr(elem)?;
                Ok(self.arena.slice(elem))
            }
            TypeExprKind::Array(len, elem) => {
                let len = match len {
                    ArrayLen::Literal(n) => *n,
                    ArrayLen::Const(name) => match self.const_values.get(name) {
                        Some(n) => *n,
                        None => {
                            return Err(ResolutionError::InvalidArrayLength {
                                name: name.clone(),
                                span: expr.span,
                            })
                        }
                    },
                };
                let elem = self.resolve_type_expr(elem)?;
                Ok(self.arena.array(len, elem))
            }
            TypeExprKind::Map(key, value) => {
                let key = self.resolve_type_expr(key)?;
                let value = self.resolve_type_expr(value)?;
                Ok(self.arena.map(key, value))
            }
            TypeExprKind::Struct(decls) => {
                let mut fields = Vec::new();
                for decl in decls {
                    let ty = self.resolve_type_expr(&decl.ty)?;
                    for name in &decl.names {
                        fields.push(Field {
                            name: name.clone(),
                            ty,
                            embedded: decl.embedded,
                            tag: decl.tag.clone(),
                        });
                    }
                }
                Ok(self.arena.intern(TypeKind::Struct(fields)))
            }
            TypeExprKind::Chan(dir, elem) => {
                let elem = self.resolve_type_expr(elem)?;
                Ok(self
                    .arena
                    .intern(TypeKind::Unsupported(UnsupportedKind::Chan(*dir, elem))))
            }
            TypeExprKind::Func(signature) => self.resolve_signature(signature),
            TypeExprKind::Interface => Ok(self.interface_type()),
        }
    }

    /// 型名を解決する（パッケージの型、別名、事前宣言された型の順）
    pub(super) fn resolve_type_name(&mut self, name: &str, span: Span) -> TypeResult {
        if let Some(&id) = self.type_names.get(name) {
            return Ok(id);
        }

        if let Some(target) = self.alias_decls.get(name).cloned() {
            if self.resolving_aliases.iter().any(|n| n == name) {
                return Err(ResolutionError::InvalidRecursiveType {
                    name: name.to_string(),
                });
            }
            self.resolving_aliases.push(name.to_string());
            let resolved = self.resolve_type_expr(&target);
            self.resolving_aliases.pop();
            let id = resolved?;
            self.type_names.insert(name.to_string(), id);
            return Ok(id);
        }

        self.predeclared_type(name)
            .ok_or_else(|| ResolutionError::UndefinedName {
                name: name.to_string(),
                span,
            })
    }

    fn predeclared_type(&mut self, name: &str) -> Option<TypeId> {
        if let Some(kind) = BasicKind::from_name(name) {
            return Some(self.arena.basic(kind));
        }
        match name {
            "any" => Some(self.interface_type()),
            "error" => Some(self.error_type()),
            _ => None,
        }
    }

    fn interface_type(&mut self) -> TypeId {
        self.arena.intern(TypeKind::Unsupported(UnsupportedKind::Interface))
    }

    fn error_type(&mut self) -> TypeId {
        if let Some(id) = self.error_type {
            return id;
        }
        let iface = self.interface_type();
        let id = self.arena.declare_named("error");
        self.arena.define_named(id, iface);
        self.error_type = Some(id);
        id
    }

    pub(super) fn resolve_signature(&mut self, signature: &Signature) -> TypeResult {
        let mut params = Vec::with_capacity(signature.params.len());
        let mut variadic = false;
        for param in &signature.params {
            let ty = self.resolve_type_expr(&param.ty)?;
            if param.variadic {
                variadic = true;
                params.push(self.arena.slice(ty));
            } else {
                params.push(ty);
            }
        }
        let mut results = Vec::with_capacity(signature.results.len());
        for result in &signature.results {
            results.push(self.resolve_type_expr(&result.ty)?);
        }
        Ok(self.arena.intern(TypeKind::Unsupported(UnsupportedKind::Func {
            params,
            results,
            variadic,
        })))
    }

    /// 名前がローカルに隠されていない型名か
    fn names_type(&self, name: &str, scopes: &Scopes) -> bool {
        if scopes.is_local(name) || self.values.contains_key(name) {
            return false;
        }
        self.type_names.contains_key(name)
            || self.alias_decls.contains_key(name)
            || BasicKind::from_name(name).is_some()
            || matches!(name, "any" | "error")
    }

    fn names_import(&self, name: &str, scopes: &Scopes) -> bool {
        !scopes.is_local(name) && !self.values.contains_key(name) && self.imports.contains(name)
    }

    /// 式が型を表していればその型式
    fn expr_as_type(&self, expr: &Expr, scopes: &Scopes) -> Option<TypeExpr> {
        let kind = match &expr.kind {
            ExprKind::Type(ty) => return Some(ty.clone()),
            ExprKind::Paren(inner) => return self.expr_as_type(inner, scopes),
            ExprKind::Ident(name) if self.names_type(name, scopes) => {
                TypeExprKind::Name(name.clone())
            }
            ExprKind::Selector(base, member) => match &base.kind {
                ExprKind::Ident(pkg) if self.names_import(pkg, scopes) => {
                    TypeExprKind::Qualified(pkg.clone(), member.clone())
                }
                _ => return None,
            },
            ExprKind::Unary(UnaryOp::Deref, inner) => {
                TypeExprKind::Pointer(Box::new(self.expr_as_type(inner, scopes)?))
            }
            _ => return None,
        };
        Some(TypeExpr {
            kind,
            span: expr.span,
        })
    }

    fn untyped(expr: &Expr) -> ResolutionError {
        ResolutionError::UntypedExpression {
            expr: expr.to_string(),
            span: expr.span,
        }
    }

    /// 式の静的な型
    pub(super) fn type_of(&mut self, expr: &Expr, scopes: &Scopes) -> TypeResult {
        match &expr.kind {
            ExprKind::Ident(name) => self.type_of_ident(name, expr, scopes),
            ExprKind::IntLit(_) => Ok(self.arena.basic(BasicKind::Int)),
            ExprKind::FloatLit(_) => Ok(self.arena.basic(BasicKind::Float64)),
            ExprKind::ImaginaryLit(_) => Ok(self.arena.basic(BasicKind::Complex128)),
            ExprKind::RuneLit(_) => Ok(self.arena.basic(BasicKind::Int32)),
            ExprKind::StringLit(_) => Ok(self.arena.basic(BasicKind::String)),
            ExprKind::Paren(inner) => self.type_of(inner, scopes),

            ExprKind::Unary(op, operand) => match op {
                UnaryOp::Ref => {
                    let elem = self.type_of(operand, scopes)?;
                    Ok(self.arena.pointer(elem))
                }
                UnaryOp::Deref => {
                    let ptr = self.type_of(operand, scopes)?;
                    match self.arena.underlying_kind(ptr) {
                        TypeKind::Pointer(elem) => Ok(*elem),
                        _ => Err(Self::untyped(expr)),
                    }
                }
                UnaryOp::Not => Ok(self.arena.basic(BasicKind::Bool)),
                UnaryOp::Recv => {
                    let chan = self.type_of(operand, scopes)?;
                    match self.arena.underlying_kind(chan) {
                        TypeKind::Unsupported(UnsupportedKind::Chan(_, elem)) => Ok(*elem),
                        _ => Err(Self::untyped(expr)),
                    }
                }
                UnaryOp::Neg | UnaryOp::Plus | UnaryOp::Complement => {
                    self.type_of(operand, scopes)
                }
            },

            ExprKind::Binary(op, left, right) => match op.as_str() {
                "==" | "!=" | "<" | "<=" | ">" | ">=" | "&&" | "||" => {
                    Ok(self.arena.basic(BasicKind::Bool))
                }
                "<<" | ">>" => self.type_of(left, scopes),
                // 型なし定数は相手の型に合わせる
                _ if is_literal(left) && !is_literal(right) => self.type_of(right, scopes),
                _ => self.type_of(left, scopes),
            },

            ExprKind::Selector(base, member) => self.type_of_selector(base, member, expr, scopes),

            ExprKind::Index(base, _) => {
                let base_ty = self.type_of(base, scopes)?;
                let container = self.deref_array(base_ty);
                match self.arena.underlying_kind(container) {
                    TypeKind::Slice(elem) | TypeKind::Array(_, elem) => Ok(*elem),
                    TypeKind::Map(_, value) => Ok(*value),
                    TypeKind::Basic(BasicKind::String) => Ok(self.arena.basic(BasicKind::Uint8)),
                    _ => Err(Self::untyped(expr)),
                }
            }

            ExprKind::SliceExpr(base) => {
                let base_ty = self.type_of(base, scopes)?;
                let container = self.deref_array(base_ty);
                match self.arena.underlying_kind(container).clone() {
                    TypeKind::Array(_, elem) => Ok(self.arena.slice(elem)),
                    TypeKind::Slice(_) | TypeKind::Basic(BasicKind::String) => Ok(base_ty),
                    _ => Err(Self::untyped(expr)),
                }
            }

            ExprKind::TypeAssert(_, Some(ty)) => self.resolve_type_expr(ty),
            ExprKind::TypeAssert(_, None) => Err(Self::untyped(expr)),

            ExprKind::Call(call) => self.type_of_call(call, expr, scopes),

            ExprKind::Composite(ty, _) => self.resolve_type_expr(ty),
            ExprKind::FuncLit(signature, _) => self.resolve_signature(signature),

            ExprKind::Range(target, position) => {
                let target_ty = self.type_of(target, scopes)?;
                let container = self.deref_array(target_ty);
                match (self.arena.underlying_kind(container).clone(), *position) {
                    (TypeKind::Slice(_) | TypeKind::Array(_, _), 0) => {
                        Ok(self.arena.basic(BasicKind::Int))
                    }
                    (TypeKind::Slice(elem) | TypeKind::Array(_, elem), _) => Ok(elem),
                    (TypeKind::Basic(BasicKind::String), 0) => Ok(self.arena.basic(BasicKind::Int)),
                    (TypeKind::Basic(BasicKind::String), _) => {
                        Ok(self.arena.basic(BasicKind::Int32))
                    }
                    (TypeKind::Map(key, _), 0) => Ok(key),
                    (TypeKind::Map(_, value), _) => Ok(value),
                    (TypeKind::Unsupported(UnsupportedKind::Chan(_, elem)), 0) => Ok(elem),
                    (TypeKind::Basic(kind), 0) if kind.is_integer() => Ok(target_ty),
                    _ => Err(Self::untyped(expr)),
                }
            }

            ExprKind::Type(_)
            | ExprKind::ElidedComposite(_)
            | ExprKind::KeyValue(_, _) => Err(Self::untyped(expr)),
        }
    }

    fn type_of_ident(&mut self, name: &str, expr: &Expr, scopes: &Scopes) -> TypeResult {
        if let Some(binding) = scopes.lookup(name) {
            return binding.clone();
        }
        if let Some(binding) = self.values.get(name) {
            return binding.clone();
        }
        match name {
            "true" | "false" => Ok(self.arena.basic(BasicKind::Bool)),
            "nil" => Ok(self.arena.basic(BasicKind::UntypedNil)),
            "iota" => Ok(self.arena.basic(BasicKind::Int)),
            _ => Err(ResolutionError::UndefinedName {
                name: name.to_string(),
                span: expr.span,
            }),
        }
    }

    /// `*[N]T` を `[N]T` として扱う
    fn deref_array(&self, ty: TypeId) -> TypeId {
        if let TypeKind::Pointer(elem) = self.arena.underlying_kind(ty) {
            if matches!(self.arena.underlying_kind(*elem), TypeKind::Array(_, _)) {
                return *elem;
            }
        }
        ty
    }

    fn type_of_selector(
        &mut self,
        base: &Expr,
        member: &str,
        expr: &Expr,
        scopes: &Scopes,
    ) -> TypeResult {
        // 他パッケージのメンバーの型は知り得ない
        if let ExprKind::Ident(pkg) = &base.kind {
            if self.names_import(pkg, scopes) {
                return Err(Self::untyped(expr));
            }
        }

        let base_ty = self.type_of(base, scopes)?;
        if let Some(field) = self.lookup_field(base_ty, member) {
            return Ok(field);
        }
        if let Some(method) = self.lookup_method(base_ty, member) {
            return Ok(method);
        }
        Err(ResolutionError::UnknownField {
            ty: crate::types::type_string(&self.arena, base_ty),
            field: member.to_string(),
            span: expr.span,
        })
    }

    /// ポインタを自動で外し、埋め込みフィールドを浅い順にたどってフィールドを探す
    pub(super) fn lookup_field(&self, ty: TypeId, name: &str) -> Option<TypeId> {
        let mut level = vec![ty];
        let mut seen = HashSet::new();
        while !level.is_empty() {
            let mut next = Vec::new();
            for candidate in level {
                let candidate = self.auto_deref(candidate);
                if !seen.insert(candidate) {
                    continue;
                }
                let TypeKind::Struct(fields) = self.arena.underlying_kind(candidate) else {
                    continue;
                };
                if let Some(field) = fields.iter().find(|f| f.name == name) {
                    return Some(field.ty);
                }
                next.extend(fields.iter().filter(|f| f.embedded).map(|f| f.ty));
            }
            level = next;
        }
        None
    }

    fn lookup_method(&self, ty: TypeId, name: &str) -> Option<TypeId> {
        let receiver = self.auto_deref(ty);
        self.methods.get(&(receiver, name.to_string())).copied()
    }

    fn auto_deref(&self, ty: TypeId) -> TypeId {
        match self.arena.kind(ty) {
            TypeKind::Pointer(elem) => *elem,
            _ => ty,
        }
    }

    fn type_of_call(&mut self, call: &CallExpr, expr: &Expr, scopes: &Scopes) -> TypeResult {
        // 型変換 `T(x)`
        if let Some(ty) = self.expr_as_type(&call.callee, scopes) {
            return self.resolve_type_expr(&ty);
        }

        if let Some(name) = call.callee_name() {
            if !scopes.is_local(name) && !self.values.contains_key(name) {
                if let Some(result) = self.type_of_builtin(name, call, expr, scopes) {
                    return result;
                }
            }
        }

        let callee = self.type_of(&call.callee, scopes)?;
        match self.arena.underlying_kind(callee).clone() {
            TypeKind::Unsupported(UnsupportedKind::Func { results, .. }) if results.len() == 1 => {
                Ok(results[0])
            }
            TypeKind::Unsupported(UnsupportedKind::Func { results, .. }) if results.len() > 1 => {
                Ok(self.arena.intern(TypeKind::Unsupported(UnsupportedKind::Tuple(results))))
            }
            _ => Err(Self::untyped(expr)),
        }
    }

    fn type_of_builtin(
        &mut self,
        name: &str,
        call: &CallExpr,
        expr: &Expr,
        scopes: &Scopes,
    ) -> Option<TypeResult> {
        let result = match name {
            "len" | "cap" | "copy" => Ok(self.arena.basic(BasicKind::Int)),
            "new" => match call.args.first().and_then(|arg| self.expr_as_type(arg, scopes)) {
                Some(ty) => self.resolve_type_expr(&ty).map(|elem| self.arena.pointer(elem)),
                None => Err(Self::untyped(expr)),
            },
            "make" => match call.args.first().and_then(|arg| self.expr_as_type(arg, scopes)) {
                Some(ty) => self.resolve_type_expr(&ty),
                None => Err(Self::untyped(expr)),
            },
            "append" | "min" | "max" => match call.args.first() {
                Some(first) => self.type_of(first, scopes),
                None => Err(Self::untyped(expr)),
            },
            "real" | "imag" => match call.args.first() {
                Some(first) => self.type_of(first, scopes).map(|ty| {
                    let kind = match self.arena.underlying_kind(ty) {
                        TypeKind::Basic(BasicKind::Complex64) => BasicKind::Float32,
                        _ => BasicKind::Float64,
                    };
                    self.arena.basic(kind)
                }),
                None => Err(Self::untyped(expr)),
            },
            "complex" => Ok(self.arena.basic(BasicKind::Complex128)),
            "recover" => Ok(self.interface_type()),
            _ => return None,
        };
        Some(result)
    }
}

fn is_literal(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::IntLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::ImaginaryLit(_)
        | ExprKind::RuneLit(_) => true,
        ExprKind::Paren(inner) => is_literal(inner),
        _ => false,
    }
}
