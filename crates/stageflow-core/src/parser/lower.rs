//! Lowering from the `sqlparser` AST into the stage AST.
//!
//! Only the shapes the stage pipeline understands are mapped structurally.
//! Everything else keeps sqlparser's `Display` rendering as its text, which is
//! what the rehydrator falls back to.

use sqlparser::ast::{
    self as sql, DuplicateTreatment, FunctionArg, FunctionArgExpr, FunctionArguments,
    GroupByExpr, JoinConstraint, JoinOperator, SelectItem, SetExpr, TableFactor, TableWithJoins,
    WindowType,
};

use crate::ast::{
    CaseBranch, Cte, DerivedTable, Expr, FromEntry, Insert, JoinEntry, NameNode, OrderKey,
    Relation, Select, Statement, TableRef, WindowSpec,
};
use crate::naming::name_node_from_str;

/// Lower one parsed statement.
pub fn lower_statement(statement: &sql::Statement) -> Statement {
    match statement {
        sql::Statement::Query(query) => match query.body.as_ref() {
            // `WITH ... INSERT INTO ...` parses as a query wrapping the insert.
            SetExpr::Insert(inner) => {
                let mut lowered = lower_statement(inner);
                if let Statement::Insert(insert) = &mut lowered {
                    let mut with = lower_ctes(query);
                    with.append(&mut insert.with);
                    insert.with = with;
                }
                lowered
            }
            SetExpr::Select(_) | SetExpr::Query(_) | SetExpr::SetOperation { .. } => {
                Statement::Select(lower_query(query))
            }
            _ => unknown_statement(statement),
        },
        sql::Statement::Insert(insert) => {
            let mut source = insert
                .source
                .as_ref()
                .filter(|query| !matches!(query.body.as_ref(), SetExpr::Values(_)))
                .map(|query| lower_query(query));
            let with = source
                .as_mut()
                .map(|select| std::mem::take(&mut select.with))
                .unwrap_or_default();
            Statement::Insert(Insert {
                with,
                table: name_node_from_str(&insert.table.to_string()),
                source,
            })
        }
        sql::Statement::CreateTable(create) => match &create.query {
            Some(query) => {
                let mut select = lower_query(query);
                select.into = Some(name_node_from_str(&create.name.to_string()));
                Statement::Select(select)
            }
            None => unknown_statement(statement),
        },
        _ => unknown_statement(statement),
    }
}

fn unknown_statement(statement: &sql::Statement) -> Statement {
    Statement::Unknown {
        text: Some(statement.to_string()),
    }
}

fn lower_query(query: &sql::Query) -> Select {
    let mut select = lower_set_expr(&query.body);
    let mut ctes = lower_ctes(query);
    ctes.append(&mut select.with);
    select.with = ctes;
    select
}

fn lower_ctes(query: &sql::Query) -> Vec<Cte> {
    query
        .with
        .iter()
        .flat_map(|with| &with.cte_tables)
        .map(|cte| Cte {
            name: NameNode::Plain(cte.alias.name.value.clone()),
            query: lower_query(&cte.query),
        })
        .collect()
}

/// Set operations flatten into the first branch's `compound` list, in
/// source order.
fn lower_set_expr(body: &SetExpr) -> Select {
    match body {
        SetExpr::Select(select) => lower_select(select),
        SetExpr::Query(query) => lower_query(query),
        SetExpr::SetOperation { left, right, .. } => {
            let mut first = lower_set_expr(left);
            let mut second = lower_set_expr(right);
            let rest = std::mem::take(&mut second.compound);
            first.compound.push(second);
            first.compound.extend(rest);
            first
        }
        // Row sources such as VALUES carry no clauses or table references.
        _ => Select::default(),
    }
}

fn lower_select(select: &sql::Select) -> Select {
    let group_by = match &select.group_by {
        GroupByExpr::Expressions(exprs, _) => exprs.iter().map(lower_expr).collect(),
        GroupByExpr::All(_) => vec![Expr::Literal {
            value: "ALL".to_string(),
        }],
    };

    Select {
        with: Vec::new(),
        projection: select.projection.iter().map(lower_select_item).collect(),
        from: select.from.iter().flat_map(lower_table_with_joins).collect(),
        selection: select.selection.as_ref().map(lower_expr),
        group_by,
        having: select.having.as_ref().map(lower_expr),
        into: select
            .into
            .as_ref()
            .map(|into| name_node_from_str(&into.name.to_string())),
        compound: Vec::new(),
    }
}

fn lower_table_with_joins(table: &TableWithJoins) -> Vec<FromEntry> {
    let mut entries = vec![FromEntry::Relation(lower_relation(&table.relation))];
    for join in &table.joins {
        let (keyword, constraint) = join_keyword(&join.join_operator);
        let mut entry = JoinEntry {
            join: keyword.to_string(),
            relation: lower_relation(&join.relation),
            on: None,
            using: Vec::new(),
        };
        match constraint {
            Some(JoinConstraint::On(expr)) => entry.on = Some(lower_expr(expr)),
            Some(JoinConstraint::Using(columns)) => {
                entry.using = columns.iter().map(ToString::to_string).collect();
            }
            Some(JoinConstraint::Natural) => entry.join = format!("NATURAL {}", entry.join),
            Some(JoinConstraint::None) | None => {}
        }
        entries.push(FromEntry::Join(entry));
    }
    entries
}

/// The join keyword as written, and the constraint when the operator has one.
fn join_keyword(operator: &JoinOperator) -> (&'static str, Option<&JoinConstraint>) {
    match operator {
        JoinOperator::Join(c) => ("JOIN", Some(c)),
        JoinOperator::Inner(c) => ("INNER JOIN", Some(c)),
        JoinOperator::Left(c) => ("LEFT JOIN", Some(c)),
        JoinOperator::LeftOuter(c) => ("LEFT OUTER JOIN", Some(c)),
        JoinOperator::Right(c) => ("RIGHT JOIN", Some(c)),
        JoinOperator::RightOuter(c) => ("RIGHT OUTER JOIN", Some(c)),
        JoinOperator::FullOuter(c) => ("FULL OUTER JOIN", Some(c)),
        JoinOperator::CrossJoin(c) => ("CROSS JOIN", Some(c)),
        JoinOperator::Semi(c) => ("SEMI JOIN", Some(c)),
        JoinOperator::LeftSemi(c) => ("LEFT SEMI JOIN", Some(c)),
        JoinOperator::RightSemi(c) => ("RIGHT SEMI JOIN", Some(c)),
        JoinOperator::Anti(c) => ("ANTI JOIN", Some(c)),
        JoinOperator::LeftAnti(c) => ("LEFT ANTI JOIN", Some(c)),
        JoinOperator::RightAnti(c) => ("RIGHT ANTI JOIN", Some(c)),
        JoinOperator::StraightJoin(c) => ("STRAIGHT_JOIN", Some(c)),
        JoinOperator::AsOf { constraint, .. } => ("ASOF JOIN", Some(constraint)),
        JoinOperator::CrossApply => ("CROSS APPLY", None),
        JoinOperator::OuterApply => ("OUTER APPLY", None),
    }
}

fn lower_relation(factor: &TableFactor) -> Relation {
    match factor {
        TableFactor::Table { name, alias, .. } => Relation::Table(TableRef {
            name: name_node_from_str(&name.to_string()),
            alias: alias.as_ref().map(|alias| alias.name.value.clone()),
        }),
        TableFactor::Derived {
            subquery, alias, ..
        } => Relation::Derived(DerivedTable {
            subquery: Box::new(lower_query(subquery)),
            alias: alias.as_ref().map(|alias| alias.name.value.clone()),
            text: Some(subquery.to_string()),
        }),
        // A parenthesized join behaves like a derived table over its members.
        TableFactor::NestedJoin {
            table_with_joins,
            alias,
        } => Relation::Derived(DerivedTable {
            subquery: Box::new(Select {
                from: lower_table_with_joins(table_with_joins),
                ..Select::default()
            }),
            alias: alias.as_ref().map(|alias| alias.name.value.clone()),
            text: Some(table_with_joins.to_string()),
        }),
        _ => Relation::Other {
            text: Some(factor.to_string()),
            alias: None,
        },
    }
}

fn lower_select_item(item: &SelectItem) -> Expr {
    match item {
        SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
            lower_expr(expr)
        }
        SelectItem::Wildcard(_) => Expr::column(None, "*"),
        _ => {
            let text = item.to_string();
            match text.split_once(".*") {
                Some((table, _)) => Expr::column(Some(table), "*"),
                None => Expr::Unknown { text: Some(text) },
            }
        }
    }
}

fn lower_expr(expr: &sql::Expr) -> Expr {
    match expr {
        sql::Expr::Identifier(ident) => Expr::column(None, ident.value.clone()),
        sql::Expr::CompoundIdentifier(idents) => match idents.split_last() {
            Some((column, [])) => Expr::column(None, column.value.clone()),
            Some((column, qualifiers)) => {
                let table = qualifiers
                    .iter()
                    .map(|ident| ident.value.as_str())
                    .collect::<Vec<_>>()
                    .join(".");
                Expr::column(Some(table.as_str()), column.value.clone())
            }
            None => unknown(expr),
        },
        sql::Expr::Value(value) => match &value.value {
            sql::Value::Number(number, _) => Expr::number(number.to_string()),
            sql::Value::SingleQuotedString(text) => Expr::string(text.clone()),
            other => Expr::Literal {
                value: other.to_string(),
            },
        },
        sql::Expr::BinaryOp { left, op, right } => {
            Expr::binary(lower_expr(left), op.to_string(), lower_expr(right))
        }
        sql::Expr::UnaryOp { op, expr } => Expr::Unary {
            operator: op.to_string(),
            expr: Box::new(lower_expr(expr)),
        },
        sql::Expr::Nested(inner) => Expr::Nested {
            expr: Box::new(lower_expr(inner)),
        },
        sql::Expr::InList {
            expr,
            list,
            negated,
        } => Expr::binary(
            lower_expr(expr),
            if *negated { "NOT IN" } else { "IN" },
            Expr::List {
                items: list.iter().map(lower_expr).collect(),
            },
        ),
        sql::Expr::InSubquery {
            expr,
            subquery,
            negated,
        } => Expr::binary(
            lower_expr(expr),
            if *negated { "NOT IN" } else { "IN" },
            subquery_expr(subquery),
        ),
        sql::Expr::Exists { subquery, negated } => Expr::Unary {
            operator: if *negated { "NOT EXISTS" } else { "EXISTS" }.to_string(),
            expr: Box::new(subquery_expr(subquery)),
        },
        sql::Expr::Subquery(query) => subquery_expr(query),
        sql::Expr::Like {
            negated,
            expr,
            pattern,
            ..
        } => Expr::binary(
            lower_expr(expr),
            if *negated { "NOT LIKE" } else { "LIKE" },
            lower_expr(pattern),
        ),
        sql::Expr::ILike {
            negated,
            expr,
            pattern,
            ..
        } => Expr::binary(
            lower_expr(expr),
            if *negated { "NOT ILIKE" } else { "ILIKE" },
            lower_expr(pattern),
        ),
        sql::Expr::Tuple(items) => Expr::List {
            items: items.iter().map(lower_expr).collect(),
        },
        sql::Expr::Function(function) => lower_function(expr, function),
        sql::Expr::Case {
            operand,
            conditions,
            else_result,
            ..
        } => Expr::Case {
            operand: operand.as_ref().map(|operand| Box::new(lower_expr(operand))),
            branches: conditions
                .iter()
                .map(|when| CaseBranch {
                    condition: lower_expr(&when.condition),
                    result: lower_expr(&when.result),
                })
                .collect(),
            else_result: else_result
                .as_ref()
                .map(|otherwise| Box::new(lower_expr(otherwise))),
        },
        sql::Expr::Cast {
            expr: inner,
            data_type,
            ..
        } => Expr::Cast {
            expr: Box::new(lower_expr(inner)),
            data_type: data_type.to_string(),
        },
        sql::Expr::Convert {
            expr: inner,
            data_type: Some(data_type),
            ..
        } => Expr::Cast {
            expr: Box::new(lower_expr(inner)),
            data_type: data_type.to_string(),
        },
        _ => unknown(expr),
    }
}

fn unknown(expr: &sql::Expr) -> Expr {
    Expr::Unknown {
        text: Some(expr.to_string()),
    }
}

fn subquery_expr(query: &sql::Query) -> Expr {
    Expr::Subquery {
        query: Box::new(lower_query(query)),
        text: Some(query.to_string()),
    }
}

fn lower_function(expr: &sql::Expr, function: &sql::Function) -> Expr {
    let (args, distinct) = match &function.args {
        FunctionArguments::List(list) => (
            list.args.iter().map(lower_function_arg).collect(),
            list.duplicate_treatment == Some(DuplicateTreatment::Distinct),
        ),
        FunctionArguments::Subquery(query) => (vec![subquery_expr(query)], false),
        // Niladic forms such as CURRENT_TIMESTAMP render without parentheses.
        FunctionArguments::None if function.over.is_none() => {
            return Expr::Literal {
                value: expr.to_string(),
            }
        }
        FunctionArguments::None => (Vec::new(), false),
    };

    let over = match &function.over {
        Some(WindowType::WindowSpec(spec)) => Some(WindowSpec {
            partition_by: spec.partition_by.iter().map(lower_expr).collect(),
            order_by: spec
                .order_by
                .iter()
                .map(|key| OrderKey {
                    expr: lower_expr(&key.expr),
                    asc: key.options.asc,
                })
                .collect(),
        }),
        Some(WindowType::NamedWindow(_)) => return unknown(expr),
        None => None,
    };

    Expr::Function {
        name: function.name.to_string(),
        args,
        distinct,
        over,
    }
}

fn lower_function_arg(arg: &FunctionArg) -> Expr {
    match arg {
        FunctionArg::Unnamed(arg) | FunctionArg::Named { arg, .. } => match arg {
            FunctionArgExpr::Expr(expr) => lower_expr(expr),
            FunctionArgExpr::Wildcard => Expr::column(None, "*"),
            FunctionArgExpr::QualifiedWildcard(name) => {
                Expr::column(Some(name.to_string().as_str()), "*")
            }
        },
        other => Expr::Unknown {
            text: Some(other.to_string()),
        },
    }
}
