// Copyright 2025 Cornell University
// released under MIT License

use crate::ir::*;

/// Pretty-printer for `BinOp`s, using CSP-M operator syntax
impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Mod => write!(f, "%"),
            BinOp::Equal => write!(f, "=="),
            BinOp::NotEqual => write!(f, "!="),
            BinOp::Less => write!(f, "<"),
            BinOp::LessEqual => write!(f, "<="),
            BinOp::Greater => write!(f, ">"),
            BinOp::GreaterEqual => write!(f, ">="),
            BinOp::And => write!(f, "and"),
            BinOp::Or => write!(f, "or"),
        }
    }
}

/// Pretty-printer for `UnaryOp`s
impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "not "),
            UnaryOp::Neg => write!(f, "-"),
        }
    }
}

/// Pretty prints a `Type` as the CSP-M set of its values. Integers are
/// bounded by `NatMax` like naturals, FDR cannot enumerate `Int`.
impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Nat => write!(f, "Nat"),
            Type::Int => write!(f, "{{-NatMax..NatMax}}"),
            Type::Bool => write!(f, "Bool"),
            Type::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Pretty-prints an `Expression` (identified by its `ExprId`) as CSP-M.
/// Variables print as their bare name, which is the name the memory
/// loads bind them to; constants print fully-qualified.
pub fn serialize_expr(it: &Interaction, st: &SymbolTable, expr_id: ExprId) -> String {
    serialize_expr_helper(it, st, expr_id, false)
}

fn serialize_expr_helper(it: &Interaction, st: &SymbolTable, expr_id: ExprId, nested: bool) -> String {
    match &it[expr_id] {
        Expr::Nat(n) => n.to_string(),
        Expr::Bool(b) => b.to_string(),
        Expr::Var(var) => st[var].name().to_string(),
        Expr::Const(c) => st[*c].qualified_name().to_string(),
        Expr::Unary(op, e) => {
            let inner = serialize_expr_helper(it, st, *e, true);
            // `--` starts a comment in CSP-M
            if matches!(it[*e], Expr::Unary(..)) {
                format!("{op}({inner})")
            } else {
                format!("{op}{inner}")
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let e1 = serialize_expr_helper(it, st, *lhs, true);
            let e2 = serialize_expr_helper(it, st, *rhs, true);
            if nested {
                format!("({e1} {op} {e2})")
            } else {
                format!("{e1} {op} {e2}")
            }
        }
    }
}

/// Collects every variable reference in `expr_id`, in the order they are
/// encountered (left to right). Duplicates are kept.
pub fn referenced_vars(it: &Interaction, expr_id: ExprId) -> Vec<VarId> {
    let mut out = vec![];
    referenced_vars_helper(it, expr_id, &mut out);
    out
}

fn referenced_vars_helper(it: &Interaction, expr_id: ExprId, out: &mut Vec<VarId>) {
    match &it[expr_id] {
        Expr::Var(var) => out.push(*var),
        Expr::Nat(_) | Expr::Bool(_) | Expr::Const(_) => {}
        Expr::Unary(_, e) => referenced_vars_helper(it, *e, out),
        Expr::Binary(_, lhs, rhs) => {
            referenced_vars_helper(it, *lhs, out);
            referenced_vars_helper(it, *rhs, out);
        }
    }
}

/// Whether the expression is the literal `0`
pub fn is_literal_zero(it: &Interaction, expr_id: ExprId) -> bool {
    matches!(it[expr_id], Expr::Nat(0))
}
