//! Positional `?` substitution

use super::dialect::Dialect;
use super::literal::{scan_literals, LiteralScan, MalformedLiteral};
use super::value::Value;

/// Result of substituting arguments into a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub sql: String,
    /// Placeholders outside of literals
    pub placeholders: usize,
    /// Arguments consumed, never more than `placeholders`
    pub bound: usize,
    pub malformed: Vec<MalformedLiteral>,
}

impl Substitution {
    /// Placeholders left as `?` because the argument list ran out
    pub fn unbound(&self) -> usize {
        self.placeholders - self.bound
    }
}

/// Substitute `arguments` into `template` using MySQL quoting rules.
///
/// Extra arguments are ignored and missing ones leave their `?` in place.
pub fn substitute(template: &str, arguments: &[Value]) -> String {
    substitute_with(template, arguments, Dialect::default()).sql
}

/// Substitute using the literal and quoting rules of `dialect`
pub fn substitute_with(template: &str, arguments: &[Value], dialect: Dialect) -> Substitution {
    let scan = scan_literals(template, dialect);
    substitute_scanned(template, &scan, arguments, |value| dialect.quote(value))
}

/// Byte offsets of every `?` in `template`, ascending
pub fn placeholder_offsets(template: &str) -> Vec<usize> {
    template.match_indices('?').map(|(offset, _)| offset).collect()
}

/// Substitute against an existing scan, quoting each bound value with `quote`
pub fn substitute_scanned<F>(
    template: &str,
    scan: &LiteralScan,
    arguments: &[Value],
    quote: F,
) -> Substitution
where
    F: Fn(&Value) -> String,
{
    let mut sql = String::with_capacity(template.len() + arguments.len() * 8);
    let mut copied = 0;
    let mut cursor = 0;
    let mut placeholders = 0;

    for offset in placeholder_offsets(template) {
        if scan.contains(offset) {
            continue;
        }
        placeholders += 1;

        let Some(argument) = arguments.get(cursor) else {
            continue;
        };
        sql.push_str(&template[copied..offset]);
        sql.push_str(&quote(argument));
        copied = offset + 1;
        cursor += 1;
    }
    sql.push_str(&template[copied..]);

    Substitution {
        sql,
        placeholders,
        bound: cursor,
        malformed: scan.malformed.clone(),
    }
}
