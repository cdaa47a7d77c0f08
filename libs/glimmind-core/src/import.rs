//! Bulk import parser for pasted association rows.
//!
//! # Format
//! ```text
//! run, correr
//! eat; comer
//! "to be, or not", ser
//! drink	beber
//! ```
//!
//! One row per line. Fields are separated by a tab, a semicolon or a comma;
//! a comma only splits when an even number of double quotes follows it on
//! the line, so commas inside quotes stay put. The first field is the term
//! and the second the definition. Extra fields are ignored.
//!
//! A stray quote never rejects the import: the row is kept, split by the
//! same rule, and a warning is logged.

use crate::types::Association;

/// A row parsed from bulk text, before it gets an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAssociation {
    pub term: String,
    pub definition: String,
    pub line_number: usize,
}

/// Parse bulk text into raw rows. Blank lines and empty rows are skipped.
pub fn parse(content: &str) -> Vec<RawAssociation> {
    let mut rows = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_num = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields = split_fields(line);
        if line.matches('"').count() % 2 == 1 {
            tracing::warn!(line = line_num, "unbalanced quote in import row");
        }
        let mut fields = fields.into_iter().map(|f| clean_field(&f));
        let term = fields.next().unwrap_or_default();
        let definition = fields.next().unwrap_or_default();

        if term.is_empty() && definition.is_empty() {
            continue;
        }

        rows.push(RawAssociation {
            term,
            definition,
            line_number: line_num,
        });
    }

    rows
}

/// Turn raw rows into fresh, unknown associations.
pub fn into_associations(rows: Vec<RawAssociation>) -> Vec<Association> {
    rows.into_iter()
        .map(|row| Association::new(row.term, row.definition))
        .collect()
}

fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quotes_ahead = line.matches('"').count();

    for c in line.chars() {
        match c {
            '"' => {
                quotes_ahead -= 1;
                current.push(c);
            }
            // Tabs and semicolons always separate
            '\t' | ';' => fields.push(std::mem::take(&mut current)),
            ',' if quotes_ahead % 2 == 0 => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    fields.push(current);
    fields
}

fn clean_field(field: &str) -> String {
    let field = field.trim();
    let field = field.strip_prefix('"').unwrap_or(field);
    let field = field.strip_suffix('"').unwrap_or(field);
    field.trim().to_string()
}
