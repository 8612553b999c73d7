//! Alias mapping and dependency inference.
//!
//! Both passes walk the whole stage sub-AST, including derived tables,
//! expression subqueries and set-operation branches. The alias pass runs
//! first so that column qualifiers anywhere in the stage can be resolved.

use std::collections::{BTreeMap, BTreeSet};

use super::visitor::{walk_select, walk_select_body, Visitor};
use super::ExtractionContext;
use crate::ast::{Select, TableRef};
use crate::naming::{canonicalize_str, extract_identifier};
use crate::types::CanonicalName;

/// Canonical alias (or bare table name) to the canonical table it names.
pub(crate) type AliasMap = BTreeMap<CanonicalName, CanonicalName>;

/// How much of a stage's query block belongs to the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Include the block's own `WITH` clause (CTE bodies, whose nested CTEs
    /// are not stages of their own).
    WithClause,
    /// Skip the `WITH` clause; its CTEs are separate stages.
    BodyOnly,
}

fn walk_scoped<V: Visitor>(visitor: &mut V, select: &Select, scope: Scope) {
    match scope {
        Scope::WithClause => walk_select(visitor, select),
        Scope::BodyOnly => walk_select_body(visitor, select),
    }
}

#[derive(Default)]
struct AliasCollector {
    aliases: AliasMap,
}

impl Visitor for AliasCollector {
    fn visit_table(&mut self, table: &TableRef) {
        let Some(target) = extract_identifier(&table.name) else {
            return;
        };
        if let Some(alias) = table.alias.as_deref().and_then(canonicalize_str) {
            self.aliases.insert(alias, target.clone());
        }
        self.aliases.insert(target.clone(), target);
    }
}

/// Build the alias map for a stage.
pub(crate) fn collect_aliases(select: &Select, scope: Scope) -> AliasMap {
    let mut collector = AliasCollector::default();
    walk_scoped(&mut collector, select, scope);
    collector.aliases
}

struct DependencyCollector<'a> {
    ctx: &'a ExtractionContext,
    aliases: &'a AliasMap,
    own_name: Option<&'a CanonicalName>,
    dependencies: BTreeSet<CanonicalName>,
}

impl DependencyCollector<'_> {
    fn record(&mut self, name: CanonicalName) {
        if self.own_name == Some(&name) {
            return;
        }
        if self.ctx.is_stage(&name) {
            self.dependencies.insert(name);
        }
    }
}

impl Visitor for DependencyCollector<'_> {
    fn visit_table(&mut self, table: &TableRef) {
        if let Some(name) = extract_identifier(&table.name) {
            self.record(name);
        }
    }

    fn visit_column(&mut self, table: Option<&str>, _column: &str) {
        let resolved = table
            .and_then(canonicalize_str)
            .and_then(|qualifier| self.aliases.get(&qualifier).cloned());
        if let Some(name) = resolved {
            self.record(name);
        }
    }
}

/// Infer the stages a stage reads from.
///
/// Only names present in the context's stage set become dependencies, and
/// the stage's own name is never one of them.
pub(crate) fn collect_dependencies(
    ctx: &ExtractionContext,
    select: &Select,
    scope: Scope,
    own_name: Option<&CanonicalName>,
) -> BTreeSet<CanonicalName> {
    let aliases = collect_aliases(select, scope);
    let mut collector = DependencyCollector {
        ctx,
        aliases: &aliases,
        own_name,
        dependencies: BTreeSet::new(),
    };
    walk_scoped(&mut collector, select, scope);
    collector.dependencies
}
