//! 関数本体を走査して呼び出し箇所を集める

use crate::ast::{BodyItem, Decl, Expr, ExprKind, FuncDecl, Param, SourceFile};
use crate::error::ResolutionError;

use super::{Argument, CallSite, Package, Scopes};

impl Package {
    /// 識別子を呼び出すすべての呼び出しを、引数の型付きでソース順に集める
    pub(super) fn extract_calls(&mut self, files: &[SourceFile]) -> Vec<CallSite> {
        let mut calls = Vec::new();
        for file in files {
            for decl in &file.decls {
                match decl {
                    Decl::Func(func) => self.walk_func(func, &mut calls),
                    Decl::Var(spec) => {
                        let scopes = Scopes::new();
                        for value in &spec.values {
                            self.walk_expr(value, &scopes, &mut calls);
                        }
                    }
                    Decl::Type(_) | Decl::Const(_) => {}
                }
            }
        }
        calls
    }

    fn walk_func(&mut self, func: &FuncDecl, calls: &mut Vec<CallSite>) {
        let Some(body) = &func.body else {
            return;
        };

        let mut scopes = Scopes::new();
        scopes.push();
        if let Some(receiver) = &func.receiver {
            if let Some(name) = &receiver.name {
                let binding = self
                    .resolve_type_name(&receiver.type_name, receiver.span)
                    .map(|ty| {
                        if receiver.is_pointer {
                            self.arena.pointer(ty)
                        } else {
                            ty
                        }
                    });
                scopes.declare(name, binding);
            }
        }
        self.declare_params(&func.signature.params, &mut scopes);
        self.declare_params(&func.signature.results, &mut scopes);

        self.walk_items(body, &mut scopes, calls);
    }

    fn declare_params(&mut self, params: &[Param], scopes: &mut Scopes) {
        for param in params {
            let Some(name) = &param.name else {
                continue;
            };
            let binding = self.resolve_type_expr(&param.ty).map(|ty| {
                if param.variadic {
                    self.arena.slice(ty)
                } else {
                    ty
                }
            });
            scopes.declare(name, binding);
        }
    }

    fn walk_items(&mut self, items: &[BodyItem], scopes: &mut Scopes, calls: &mut Vec<CallSite>) {
        let base_depth = scopes.depth();
        for item in items {
            match item {
                BodyItem::Enter(params) => {
                    scopes.push();
                    self.declare_params(params, scopes);
                }
                BodyItem::Leave => {
                    if scopes.depth() > base_depth {
                        scopes.pop();
                    }
                }
                BodyItem::Local(local) => {
                    if let Some(value) = &local.value {
                        // `range` の対象は式文として別に走査済み
                        if !matches!(value.kind, ExprKind::Range(..)) {
                            self.walk_expr(value, scopes, calls);
                        }
                    }
                    let binding = match (&local.ty, &local.value) {
                        (Some(ty), _) => self.resolve_type_expr(ty),
                        (None, Some(value)) => self.type_of(value, scopes),
                        (None, None) => Err(ResolutionError::UntypedExpression {
                            expr: local.name.clone(),
                            span: local.span,
                        }),
                    };
                    scopes.declare(&local.name, binding);
                }
                BodyItem::Expr(expr) => self.walk_expr(expr, scopes, calls),
            }
        }
        while scopes.depth() > base_depth {
            scopes.pop();
        }
    }

    /// 式を前順に走査する（外側の呼び出しが先）
    fn walk_expr(&mut self, expr: &Expr, scopes: &Scopes, calls: &mut Vec<CallSite>) {
        match &expr.kind {
            ExprKind::Call(call) => {
                if let Some(callee) = call.callee_name() {
                    let args = call
                        .args
                        .iter()
                        .map(|arg| Argument {
                            text: arg.to_string(),
                            span: arg.span,
                            ty: self.type_of(arg, scopes),
                        })
                        .collect();
                    calls.push(CallSite {
                        callee: callee.to_string(),
                        args,
                        span: call.span,
                    });
                }
                self.walk_expr(&call.callee, scopes, calls);
                for arg in &call.args {
                    self.walk_expr(arg, scopes, calls);
                }
            }
            ExprKind::FuncLit(signature, body) => {
                // 関数リテラルは外側のスコープを引き継ぐ
                let mut nested = scopes.clone();
                nested.push();
                self.declare_params(&signature.params, &mut nested);
                self.declare_params(&signature.results, &mut nested);
                self.walk_items(body, &mut nested, calls);
            }
            ExprKind::Unary(_, inner)
            | ExprKind::Paren(inner)
            | ExprKind::Selector(inner, _)
            | ExprKind::SliceExpr(inner)
            | ExprKind::TypeAssert(inner, _)
            | ExprKind::Range(inner, _) => self.walk_expr(inner, scopes, calls),
            ExprKind::Binary(_, left, right)
            | ExprKind::Index(left, right)
            | ExprKind::KeyValue(left, right) => {
                self.walk_expr(left, scopes, calls);
                self.walk_expr(right, scopes, calls);
            }
            ExprKind::Composite(_, elems) | ExprKind::ElidedComposite(elems) => {
                for elem in elems {
                    self.walk_expr(elem, scopes, calls);
                }
            }
            ExprKind::Ident(_)
            | ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::ImaginaryLit(_)
            | ExprKind::RuneLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::Type(_) => {}
        }
    }
}
