//! Identifier canonicalization.
//!
//! Stage names and table references are compared through [`CanonicalName`]s:
//! quoting, bracketing, schema/database qualifiers and case are all dropped so
//! that `[dbo].[Orders]`, `"Orders"` and `orders` refer to the same stage.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::ast::NameNode;
use crate::types::CanonicalName;

/// Field names checked first when scanning an unrecognized name node.
const PREFERRED_FIELDS: &[&str] = &["table", "name", "value", "expr", "as"];

/// Canonicalize a raw identifier.
///
/// Returns `None` for absent, empty or whitespace-only input. `#` temp-table
/// markers are preserved.
///
/// # Examples
/// - `[dbo].[Orders]` → `orders`
/// - `"Sales"."dbo"."Orders"` → `orders`
/// - `#Staging` → `#staging`
pub fn canonicalize(raw: Option<&str>) -> Option<CanonicalName> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let unwrapped = strip_enclosing(trimmed);
    let last_segment = unwrapped.rsplit('.').next().unwrap_or(unwrapped);
    let cleaned: String = last_segment
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '"' | '`'))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(CanonicalName::from_canonical(cleaned.to_lowercase()))
    }
}

/// Canonicalize a raw identifier string.
pub fn canonicalize_str(raw: &str) -> Option<CanonicalName> {
    canonicalize(Some(raw))
}

/// Strip one layer of surrounding brackets or double quotes.
fn strip_enclosing(value: &str) -> &str {
    value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .or_else(|| {
            value
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
        })
        .unwrap_or(value)
}

/// Recover a best-effort raw identifier from a name node of unknown shape.
///
/// The node's variants are tried in priority order; unrecognized objects get
/// a shallow scan of their fields. Returns `None` when nothing usable is
/// found, which callers treat as "not a dependency candidate".
pub fn raw_identifier(node: &NameNode) -> Option<String> {
    let raw = match node {
        NameNode::Plain(value) => Some(value.clone()),
        NameNode::Qualified {
            database,
            schema,
            table,
        } => {
            let parts: Vec<&str> = [database.as_deref(), schema.as_deref(), Some(table.as_str())]
                .into_iter()
                .flatten()
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect();
            Some(parts.join("."))
        }
        NameNode::Nested { table } => raw_identifier(table),
        NameNode::Value { value } => Some(value.clone()),
        NameNode::Expr { expr } => raw_identifier(expr),
        NameNode::Named { name } => raw_identifier(name),
        NameNode::Fields(fields) => scan_fields(fields),
    }?;

    let raw = raw.trim().to_string();
    (!raw.is_empty()).then_some(raw)
}

/// The name shown for a stage defined by `node`.
pub fn display_name(node: &NameNode) -> Option<String> {
    raw_identifier(node)
}

/// Recover and canonicalize the identifier carried by a name node.
pub fn extract_identifier(node: &NameNode) -> Option<CanonicalName> {
    canonicalize(raw_identifier(node).as_deref())
}

fn scan_fields(fields: &std::collections::BTreeMap<String, Value>) -> Option<String> {
    let preferred = PREFERRED_FIELDS.iter().filter_map(|key| fields.get(*key));
    let remaining = fields
        .iter()
        .filter(|(key, _)| !PREFERRED_FIELDS.contains(&key.as_str()))
        .map(|(_, value)| value);

    preferred
        .chain(remaining)
        .filter_map(Value::as_str)
        .find(|candidate| looks_like_identifier(candidate))
        .map(str::to_string)
}

/// Heuristic used by the shallow field scan.
pub fn looks_like_identifier(candidate: &str) -> bool {
    static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = IDENTIFIER_REGEX.get_or_init(|| {
        Regex::new(r#"^[#@]?[\[\]"`A-Za-z_][\w$#@\[\]"`.]*$"#).expect("Invalid regex pattern")
    });
    re.is_match(candidate.trim())
}

/// Split a dotted identifier into its parts, honoring quotes and brackets.
///
/// Used when a collaborator hands over a table name as a single string.
pub fn split_qualified(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut closing: Option<char> = None;

    for ch in name.chars() {
        if let Some(close) = closing {
            current.push(ch);
            if ch == close {
                closing = None;
            }
            continue;
        }

        match ch {
            '"' | '`' => {
                closing = Some(ch);
                current.push(ch);
            }
            '[' => {
                closing = Some(']');
                current.push(ch);
            }
            '.' => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() || parts.is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Build a name node from a dotted string, keeping up to three qualifiers.
pub fn name_node_from_str(name: &str) -> NameNode {
    let unquote = |part: &str| {
        let stripped = strip_enclosing(part);
        stripped
            .strip_prefix('`')
            .and_then(|rest| rest.strip_suffix('`'))
            .unwrap_or(stripped)
            .to_string()
    };

    let mut parts: Vec<String> = split_qualified(name)
        .iter()
        .map(|part| unquote(part.as_str()))
        .collect();
    let table = parts.pop().unwrap_or_default();
    let schema = parts.pop();
    let database = if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    };

    NameNode::qualified(database, schema, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canon(raw: &str) -> Option<String> {
        canonicalize_str(raw).map(|name| name.as_str().to_string())
    }

    #[test]
    fn test_canonicalize_strips_qualifiers_and_case() {
        assert_eq!(canon("[dbo].Orders").as_deref(), Some("orders"));
        assert_eq!(canon("ORDERS").as_deref(), Some("orders"));
        assert_eq!(canon("sales.dbo.orders").as_deref(), Some("orders"));
        assert_eq!(canon(r#""Sales"."Orders""#).as_deref(), Some("orders"));
        assert_eq!(canon("[dbo].[Orders]").as_deref(), Some("orders"));
    }

    #[test]
    fn test_canonicalize_preserves_temp_marker() {
        assert_eq!(canon("#Staging").as_deref(), Some("#staging"));
        assert_eq!(canon("tempdb..[#Staging]").as_deref(), Some("#staging"));
    }

    #[test]
    fn test_canonicalize_empty_input() {
        assert_eq!(canonicalize(None), None);
        assert_eq!(canon(""), None);
        assert_eq!(canon("   "), None);
        assert_eq!(canon("[]"), None);
        assert_eq!(canon("dbo."), None);
    }

    #[test]
    fn test_raw_identifier_field_lookup() {
        assert_eq!(
            raw_identifier(&NameNode::Plain(" a ".into())).as_deref(),
            Some("a")
        );
        assert_eq!(
            raw_identifier(&NameNode::qualified(
                Some("sales".into()),
                Some("dbo".into()),
                "orders"
            ))
            .as_deref(),
            Some("sales.dbo.orders")
        );
        let nested = NameNode::Nested {
            table: Box::new(NameNode::Value {
                value: "Orders".into(),
            }),
        };
        assert_eq!(raw_identifier(&nested).as_deref(), Some("Orders"));
        let named = NameNode::Named {
            name: Box::new(NameNode::Expr {
                expr: Box::new(NameNode::Plain("cte_a".into())),
            }),
        };
        assert_eq!(
            extract_identifier(&named).map(|n| n.to_string()).as_deref(),
            Some("cte_a")
        );
    }

    #[test]
    fn test_raw_identifier_shallow_scan() {
        let node: NameNode =
            serde_json::from_value(json!({"kind": 3, "label": "not an id!", "ref": "Orders"}))
                .unwrap();
        assert_eq!(raw_identifier(&node).as_deref(), Some("Orders"));

        let node: NameNode = serde_json::from_value(json!({"n": 1, "flag": true})).unwrap();
        assert_eq!(raw_identifier(&node), None);
    }

    #[test]
    fn test_split_qualified_respects_quotes() {
        assert_eq!(
            split_qualified(r#"[my.db].dbo."a.b""#),
            vec!["[my.db]", "dbo", "\"a.b\""]
        );
        assert_eq!(split_qualified("orders"), vec!["orders"]);
    }

    #[test]
    fn test_name_node_from_str() {
        assert_eq!(
            name_node_from_str("[sales].[dbo].[Orders]"),
            NameNode::qualified(Some("sales".into()), Some("dbo".into()), "Orders")
        );
        assert_eq!(
            name_node_from_str("#temp"),
            NameNode::qualified(None, None, "#temp")
        );
    }
}
