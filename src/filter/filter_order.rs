use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse a sort string against a whitelist of sortable columns.
    ///
    /// Accepted forms, comma separated: `name`, `name:asc`, `created_at:desc`,
    /// `-created_at` (descending), `name asc`.
    pub fn validate_and_parse(requested: &str, allowed: &[&str]) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in requested.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }

            let (column, sort) = if let Some(col) = trimmed.strip_prefix('-') {
                (col.trim(), SortDirection::Desc)
            } else {
                let mut it = trimmed.splitn(2, |c: char| c == ':' || c.is_whitespace());
                let col = it.next().unwrap_or_default().trim();
                let sort = match it.next().map(|d| d.trim().to_ascii_lowercase()).as_deref() {
                    None | Some("") | Some("asc") => SortDirection::Asc,
                    Some("desc") => SortDirection::Desc,
                    Some(other) => return Err(FilterError::InvalidSort(format!("{} {}", col, other))),
                };
                (col, sort)
            };

            if !allowed.contains(&column) {
                return Err(FilterError::InvalidSort(column.to_string()));
            }
            out.push(FilterOrderInfo { column: column.to_string(), sort });
        }
        Ok(out)
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[&str] = &["name", "created_at"];

    #[test]
    fn parses_all_forms() {
        let parsed = FilterOrder::validate_and_parse("name, -created_at", ALLOWED).unwrap();
        assert_eq!(parsed[0], FilterOrderInfo { column: "name".into(), sort: SortDirection::Asc });
        assert_eq!(parsed[1], FilterOrderInfo { column: "created_at".into(), sort: SortDirection::Desc });

        let parsed = FilterOrder::validate_and_parse("created_at:desc,name asc", ALLOWED).unwrap();
        assert_eq!(parsed[0].sort, SortDirection::Desc);
        assert_eq!(parsed[1].sort, SortDirection::Asc);
    }

    #[test]
    fn rejects_unknown_column_and_direction() {
        assert!(FilterOrder::validate_and_parse("password_hash", ALLOWED).is_err());
        assert!(FilterOrder::validate_and_parse("name:sideways", ALLOWED).is_err());
    }

    #[test]
    fn generates_order_clause() {
        let parsed = FilterOrder::validate_and_parse("-created_at,name", ALLOWED).unwrap();
        assert_eq!(FilterOrder::generate(&parsed), "ORDER BY \"created_at\" DESC, \"name\" ASC");
        assert_eq!(FilterOrder::generate(&[]), "");
    }
}
