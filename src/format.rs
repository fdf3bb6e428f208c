//! Formatting and Input Validation
//!
//! Display helpers and the client-side checks that run before any request.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;

use crate::error::ApiError;
use crate::models::TableGroupWithItems;

static INVITE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"chat\.whatsapp\.com/([A-Za-z0-9]+)").expect("valid invite regex"));

/// Rate with rupee sign and two decimals, e.g. `₹1234.50`
pub fn format_currency(amount: f64) -> String {
    format!("₹{amount:.2}")
}

/// Render a backend timestamp as `18 Oct 2026, 03:45 pm`.
/// Timestamps without an offset are taken as-is; unparseable input is echoed.
pub fn format_date(raw: &str) -> String {
    let naive = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"));
    match naive {
        Ok(dt) => dt.format("%-d %b %Y, %I:%M %P").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// First `max_len` characters, with `...` appended when cut
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let head: String = text.chars().take(max_len).collect();
    format!("{head}...")
}

/// Invite code from a `https://chat.whatsapp.com/<code>` link
pub fn extract_invite_id(link: &str) -> Option<String> {
    INVITE_RE
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse a rate typed by the user: finite and not negative
pub fn parse_rate(input: &str) -> Result<f64, ApiError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("Rate is required".into()));
    }
    match trimmed.parse::<f64>() {
        Ok(r) if r.is_finite() && r >= 0.0 => Ok(r),
        Ok(_) => Err(ApiError::Validation("Rate must be zero or more".into())),
        Err(_) => Err(ApiError::Validation(format!("\"{trimmed}\" is not a valid rate"))),
    }
}

/// Non-empty trimmed text, or a validation error naming the field
pub fn require(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::Validation(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Homepage search: keep items whose count or quality contains `query`
/// (case-insensitive) and drop tables left empty
pub fn filter_tables(tables: &[TableGroupWithItems], query: &str) -> Vec<TableGroupWithItems> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return tables.to_vec();
    }
    tables
        .iter()
        .filter_map(|table| {
            let items: Vec<_> = table
                .items
                .iter()
                .filter(|item| {
                    item.count.to_lowercase().contains(&query)
                        || item.quality.to_lowercase().contains(&query)
                })
                .cloned()
                .collect();
            (!items.is_empty()).then(|| TableGroupWithItems { items, ..table.clone() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::YarnItemPublic;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(120.0), "₹120.00");
        assert_eq!(format_currency(99.456), "₹99.46");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2026-10-18T15:45:00"), "18 Oct 2026, 03:45 pm");
        assert_eq!(format_date("2026-10-18T09:05:00.123456"), "18 Oct 2026, 09:05 am");
        assert_eq!(format_date("2026-01-02T10:00:00+05:30"), "2 Jan 2026, 10:00 am");
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("Rates for today", 5), "Rates...");
    }

    #[test]
    fn test_extract_invite_id() {
        assert_eq!(extract_invite_id("https://chat.whatsapp.com/ABC123").as_deref(), Some("ABC123"));
        assert_eq!(
            extract_invite_id("https://chat.whatsapp.com/Kx9zQ2?mode=r").as_deref(),
            Some("Kx9zQ2")
        );
        assert_eq!(extract_invite_id("https://whatsapp.com/ABC123"), None);
        assert_eq!(extract_invite_id("https://chat.whatsapp.com/"), None);
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate(" 120.5 "), Ok(120.5));
        assert_eq!(parse_rate("0"), Ok(0.0));
        assert!(matches!(parse_rate("abc"), Err(ApiError::Validation(_))));
        assert!(matches!(parse_rate("-1"), Err(ApiError::Validation(_))));
        assert!(matches!(parse_rate(""), Err(ApiError::Validation(_))));
        assert!(matches!(parse_rate("inf"), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_require() {
        assert_eq!(require("Group name", "  Weavers  ").unwrap(), "Weavers");
        assert_eq!(require("Table name", "   ").unwrap_err().to_string(), "Table name is required");
    }

    #[test]
    fn test_filter_tables() {
        let item = |id: u32, count: &str, quality: &str| YarnItemPublic {
            id,
            serial_number: id,
            count: count.into(),
            quality: quality.into(),
            rate: 100.0,
        };
        let tables = vec![
            TableGroupWithItems {
                id: 1,
                table_name: "Polyester".into(),
                display_order: 0,
                items: vec![item(1, "30/1", "Combed"), item(2, "40/1", "Carded")],
            },
            TableGroupWithItems {
                id: 2,
                table_name: "Viscose".into(),
                display_order: 1,
                items: vec![item(3, "20/1", "Ring spun")],
            },
        ];

        let found = filter_tables(&tables, "COMBED");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].items.len(), 1);
        assert_eq!(found[0].items[0].id, 1);

        assert_eq!(filter_tables(&tables, "  ").len(), 2);
        assert!(filter_tables(&tables, "nylon").is_empty());
    }
}
