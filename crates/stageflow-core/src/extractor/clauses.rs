//! Clause collection for a single stage.
//!
//! Only the stage's own query block is inspected: derived tables and
//! subqueries show up as one FROM/JOIN item each and are not descended into.

use super::visitor::{walk_select_body, Visitor};
use crate::ast::{Expr, JoinEntry, Relation, Select};
use crate::naming::raw_identifier;
use crate::rehydrate::{rehydrate, COMPLEX_EXPRESSION};
use crate::types::{FromItem, GroupByItem, JoinItem, Stage, WhereItem};

/// Collects FROM, JOIN, WHERE and GROUP BY items into a stage.
pub(crate) struct ClauseCollector<'a> {
    stage: &'a mut Stage,
}

impl<'a> ClauseCollector<'a> {
    pub(crate) fn new(stage: &'a mut Stage) -> Self {
        Self { stage }
    }

    pub(crate) fn collect(mut self, select: &Select) {
        self.visit_select(select);
    }
}

impl Visitor for ClauseCollector<'_> {
    fn visit_select(&mut self, select: &Select) {
        walk_select_body(self, select);
    }

    fn visit_relation(&mut self, relation: &Relation) {
        let (table, alias) = match relation {
            Relation::Table(table) => (raw_identifier(&table.name), table.alias.clone()),
            other => (None, other.alias().map(str::to_string)),
        };
        self.stage.from.push(FromItem {
            sql: relation_sql(relation),
            table,
            alias,
        });
    }

    fn visit_join(&mut self, join: &JoinEntry) {
        self.stage.joins.push(join_item(join));
    }

    fn visit_selection(&mut self, expr: &Expr) {
        let mut predicates = Vec::new();
        conjuncts(expr, &mut predicates);
        self.stage
            .filters
            .extend(predicates.into_iter().map(|predicate| WhereItem {
                sql: rehydrate(predicate),
            }));
    }

    fn visit_group_by(&mut self, exprs: &[Expr]) {
        self.stage
            .group_by
            .extend(exprs.iter().map(|expr| GroupByItem {
                sql: rehydrate(expr),
            }));
    }

    fn visit_compound(&mut self, branch: &Select) {
        walk_select_body(self, branch);
    }

    // Projection and HAVING carry no clause items.
    fn visit_expr(&mut self, _expr: &Expr) {}
}

/// Split a predicate on top-level `AND`, left to right.
fn conjuncts<'e>(expr: &'e Expr, out: &mut Vec<&'e Expr>) {
    match expr {
        Expr::Binary { left, right, .. } if expr.is_conjunction() => {
            conjuncts(left, out);
            conjuncts(right, out);
        }
        _ => out.push(expr),
    }
}

fn relation_sql(relation: &Relation) -> String {
    let (body, alias) = match relation {
        Relation::Table(table) => (
            raw_identifier(&table.name).unwrap_or_else(|| COMPLEX_EXPRESSION.to_string()),
            table.alias.as_deref(),
        ),
        Relation::Derived(derived) => {
            let text = derived
                .text
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .unwrap_or(COMPLEX_EXPRESSION);
            (format!("({text})"), derived.alias.as_deref())
        }
        Relation::Other { text, alias } => (
            text.as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .unwrap_or(COMPLEX_EXPRESSION)
                .to_string(),
            alias.as_deref(),
        ),
        Relation::Unrecognized => (COMPLEX_EXPRESSION.to_string(), None),
    };

    match alias.map(str::trim).filter(|alias| !alias.is_empty()) {
        Some(alias) => format!("{body} AS {alias}"),
        None => body,
    }
}

fn join_item(join: &JoinEntry) -> JoinItem {
    let join_type = normalize_join_type(&join.join);
    let condition = join.on.as_ref().map(rehydrate);

    let mut sql = format!("{join_type} {}", relation_sql(&join.relation));
    if let Some(condition) = &condition {
        sql.push_str(" ON ");
        sql.push_str(condition);
    }
    if !join.using.is_empty() {
        sql.push_str(&format!(" USING ({})", join.using.join(", ")));
    }

    JoinItem {
        sql,
        join_type,
        condition,
    }
}

/// Normalize a join keyword to `<TYPE> JOIN`.
///
/// `OUTER` is dropped and a bare `JOIN` becomes `INNER JOIN`. `APPLY` forms
/// are kept as written.
pub fn normalize_join_type(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    let tokens: Vec<&str> = upper.split_whitespace().collect();
    if tokens.contains(&"APPLY") {
        return tokens.join(" ");
    }

    let kept: Vec<&str> = tokens
        .iter()
        .map(|token| token.trim_end_matches("_JOIN"))
        .filter(|token| !token.is_empty() && *token != "JOIN" && *token != "OUTER")
        .collect();

    if kept.is_empty() {
        "INNER JOIN".to_string()
    } else {
        format!("{} JOIN", kept.join(" "))
    }
}
