//! Bulk import row parsing
//!
//! Spreadsheet exports arrive with loosely named columns. A row is kept as a
//! map from header to cell text; the fields the reconciler needs are looked up
//! through a short list of accepted header aliases.

use std::collections::BTreeMap;

use thiserror::Error;

/// One row of an import file, header -> cell text
pub type ImportRow = BTreeMap<String, String>;

/// Accepted headers for the product code, in priority order
pub const CODE_ALIASES: &[&str] = &[
    "code",
    "codigo",
    "código",
    "product_code",
    "product_id",
    "sku",
    "barcode",
];

/// Accepted headers for the received quantity, in priority order
pub const QUANTITY_ALIASES: &[&str] = &["quantity", "qty", "cantidad", "cant"];

/// Accepted headers for the product description, in priority order
pub const DESCRIPTION_ALIASES: &[&str] = &[
    "description",
    "descripcion",
    "descripción",
    "name",
    "nombre",
    "producto",
];

/// Why a row was left out of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("row has no product code")]
    MissingCode,
    #[error("row has no quantity")]
    MissingQuantity,
    #[error("quantity is zero or not a number")]
    InvalidQuantity,
}

/// Fields extracted from a usable row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLine {
    pub code: String,
    pub quantity: i32,
    pub description: Option<String>,
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// First non-empty cell among the given aliases, trimmed.
///
/// Aliases are tried in order; header matching ignores case and surrounding
/// whitespace.
pub fn column_value<'a>(row: &'a ImportRow, aliases: &[&str]) -> Option<&'a str> {
    aliases.iter().find_map(|alias| {
        row.iter()
            .filter(|(header, _)| normalize_header(header) == *alias)
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
    })
}

/// Parse a quantity cell by dropping every non-digit character, so `"16 pcs"`
/// reads as 16. Returns `None` for empty, zero or out-of-range results.
pub fn parse_quantity(raw: &str) -> Option<i32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.parse::<i32>() {
        Ok(0) | Err(_) => None,
        Ok(quantity) => Some(quantity),
    }
}

/// Extract the product code, quantity and description of a row
pub fn extract_line(row: &ImportRow) -> Result<ImportLine, SkipReason> {
    let code = column_value(row, CODE_ALIASES).ok_or(SkipReason::MissingCode)?;
    let raw_quantity = column_value(row, QUANTITY_ALIASES).ok_or(SkipReason::MissingQuantity)?;
    let quantity = parse_quantity(raw_quantity).ok_or(SkipReason::InvalidQuantity)?;

    Ok(ImportLine {
        code: code.to_string(),
        quantity,
        description: column_value(row, DESCRIPTION_ALIASES).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> ImportRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_quantity_strips_units() {
        assert_eq!(parse_quantity("16 pcs"), Some(16));
        assert_eq!(parse_quantity(" 1,200 "), Some(1200));
        assert_eq!(parse_quantity("0"), None);
        assert_eq!(parse_quantity("n/a"), None);
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("99999999999"), None);
    }

    #[test]
    fn test_extract_line_with_aliases() {
        let line = extract_line(&row(&[
            ("Código ", "Z9"),
            ("Cantidad", "16 pcs"),
            ("Descripción", "Green tea"),
        ]))
        .unwrap();

        assert_eq!(line.code, "Z9");
        assert_eq!(line.quantity, 16);
        assert_eq!(line.description.as_deref(), Some("Green tea"));
    }

    #[test]
    fn test_first_non_empty_alias_wins() {
        let line = extract_line(&row(&[
            ("code", ""),
            ("sku", "A1"),
            ("barcode", "B2"),
            ("qty", "3"),
        ]))
        .unwrap();

        assert_eq!(line.code, "A1");
        assert_eq!(line.description, None);
    }

    #[test]
    fn test_skip_reasons() {
        assert_eq!(
            extract_line(&row(&[("qty", "3")])),
            Err(SkipReason::MissingCode)
        );
        assert_eq!(
            extract_line(&row(&[("code", "A1")])),
            Err(SkipReason::MissingQuantity)
        );
        assert_eq!(
            extract_line(&row(&[("code", "A1"), ("qty", "none")])),
            Err(SkipReason::InvalidQuantity)
        );
    }
}
