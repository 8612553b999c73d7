//! Visitor pattern for stage AST traversal.

use crate::ast::{Cte, Expr, FromEntry, JoinEntry, Relation, Select, TableRef};

/// A visitor over the stage AST.
///
/// The default methods traverse every child. Implementors override the hooks
/// they care about; an override that still wants the default traversal calls
/// the matching `walk_*` function.
pub trait Visitor {
    fn visit_select(&mut self, select: &Select) {
        walk_select(self, select);
    }

    fn visit_cte(&mut self, cte: &Cte) {
        self.visit_select(&cte.query);
    }

    fn visit_from_entry(&mut self, entry: &FromEntry) {
        match entry {
            FromEntry::Relation(relation) => self.visit_relation(relation),
            FromEntry::Join(join) => self.visit_join(join),
        }
    }

    fn visit_relation(&mut self, relation: &Relation) {
        walk_relation(self, relation);
    }

    fn visit_table(&mut self, _table: &TableRef) {}

    fn visit_join(&mut self, join: &JoinEntry) {
        walk_join(self, join);
    }

    /// The WHERE expression.
    fn visit_selection(&mut self, expr: &Expr) {
        self.visit_expr(expr);
    }

    fn visit_group_by(&mut self, exprs: &[Expr]) {
        for expr in exprs {
            self.visit_expr(expr);
        }
    }

    /// A set-operation branch after the first.
    fn visit_compound(&mut self, branch: &Select) {
        self.visit_select(branch);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_column(&mut self, _table: Option<&str>, _column: &str) {}
}

/// Visit the `WITH` clause, then the body.
pub fn walk_select<V: Visitor + ?Sized>(visitor: &mut V, select: &Select) {
    for cte in &select.with {
        visitor.visit_cte(cte);
    }
    walk_select_body(visitor, select);
}

/// Visit everything except the `WITH` clause.
pub fn walk_select_body<V: Visitor + ?Sized>(visitor: &mut V, select: &Select) {
    for expr in &select.projection {
        visitor.visit_expr(expr);
    }
    for entry in &select.from {
        visitor.visit_from_entry(entry);
    }
    if let Some(selection) = &select.selection {
        visitor.visit_selection(selection);
    }
    if !select.group_by.is_empty() {
        visitor.visit_group_by(&select.group_by);
    }
    if let Some(having) = &select.having {
        visitor.visit_expr(having);
    }
    for branch in &select.compound {
        visitor.visit_compound(branch);
    }
}

pub fn walk_relation<V: Visitor + ?Sized>(visitor: &mut V, relation: &Relation) {
    match relation {
        Relation::Table(table) => visitor.visit_table(table),
        Relation::Derived(derived) => visitor.visit_select(&derived.subquery),
        Relation::Other { .. } | Relation::Unrecognized => {}
    }
}

pub fn walk_join<V: Visitor + ?Sized>(visitor: &mut V, join: &JoinEntry) {
    visitor.visit_relation(&join.relation);
    if let Some(on) = &join.on {
        visitor.visit_expr(on);
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::Column { table, column } => visitor.visit_column(table.as_deref(), column),
        Expr::List { items } => {
            for item in items {
                visitor.visit_expr(item);
            }
        }
        Expr::Function { args, over, .. } => {
            for arg in args {
                visitor.visit_expr(arg);
            }
            if let Some(window) = over {
                for expr in &window.partition_by {
                    visitor.visit_expr(expr);
                }
                for key in &window.order_by {
                    visitor.visit_expr(&key.expr);
                }
            }
        }
        Expr::Case {
            operand,
            branches,
            else_result,
        } => {
            if let Some(operand) = operand {
                visitor.visit_expr(operand);
            }
            for branch in branches {
                visitor.visit_expr(&branch.condition);
                visitor.visit_expr(&branch.result);
            }
            if let Some(otherwise) = else_result {
                visitor.visit_expr(otherwise);
            }
        }
        Expr::Cast { expr, .. } | Expr::Nested { expr } | Expr::Unary { expr, .. } => {
            visitor.visit_expr(expr)
        }
        Expr::Subquery { query, .. } => visitor.visit_select(query),
        Expr::Number { .. }
        | Expr::String { .. }
        | Expr::Literal { .. }
        | Expr::Unknown { .. }
        | Expr::Unrecognized => {}
    }
}
