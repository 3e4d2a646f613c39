use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::ApiError;
use crate::filter::{Filter, SortDirection};
use crate::types::ListParams;

/// Start every list query the same way: soft-delete guard, `q` search,
/// whitelisted `sort` and the page window.
pub fn list_filter(
    table: &str,
    params: &ListParams,
    searchable: &[&str],
    sortable: &[&str],
    default_sort: (&str, SortDirection),
) -> Result<Filter, ApiError> {
    let mut filter = Filter::new(table)?;
    filter
        .search(searchable, params.search())
        .order(params.sort(), sortable, default_sort)?
        .paginate(params.page_request());
    Ok(filter)
}

/// `a,b,c` into UUIDs; blanks are skipped, anything else malformed is a 400
pub fn parse_ids(raw: &str) -> Result<Vec<Uuid>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Uuid::parse_str(s).map_err(|_| ApiError::bad_request(format!("invalid id '{}'", s))))
        .collect()
}

/// Start of the day, for `*_from` bounds on timestamp columns
pub fn day_start(date: Option<NaiveDate>) -> Option<DateTime<Utc>> {
    date.map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Last instant of the day, for inclusive `*_to` bounds on timestamp columns
pub fn day_end(date: Option<NaiveDate>) -> Option<DateTime<Utc>> {
    date.and_then(|d| d.succ_opt())
        .map(|next| next.and_time(NaiveTime::MIN).and_utc() - chrono::Duration::microseconds(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_filter_rejects_unknown_sort() {
        let params = ListParams { sort: Some("password_hash".into()), ..Default::default() };
        let err = list_filter("users", &params, &["username"], &["username"], ("username", SortDirection::Asc)).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn list_filter_pages_and_searches() {
        let params = ListParams { page: Some(2), per_page: Some(5), q: Some("acme".into()), ..Default::default() };
        let filter = list_filter("clients", &params, &["name"], &["name"], ("name", SortDirection::Asc)).unwrap();
        let sql = filter.to_sql().unwrap();
        assert!(sql.query.ends_with("ORDER BY \"name\" ASC, \"id\" ASC LIMIT 5 OFFSET 5"));
        assert_eq!(sql.params.len(), 1);
    }

    #[test]
    fn ids_are_split_and_checked() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(parse_ids(&format!("{}, {},", a, b)).unwrap(), vec![a, b]);
        assert!(parse_ids("nope").is_err());
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29);
        assert_eq!(day_start(d).unwrap().to_rfc3339(), "2024-02-29T00:00:00+00:00");
        assert_eq!(day_end(d).unwrap().to_rfc3339(), "2024-02-29T23:59:59.999999+00:00");
        assert!(day_end(None).is_none());
    }
}
