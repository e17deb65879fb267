//! Provider search-query construction.
//!
//! The scanner does not classify from scratch: it asks the mail provider for
//! messages that already look like application traffic, then refines locally.
//! The term lists below are the provider-side half of that split.

use chrono::{DateTime, Duration, Utc};

/// Page size used when the caller passes nothing usable.
pub const DEFAULT_PAGE_SIZE: i64 = 200;
/// Largest page a single listing call may request.
pub const MAX_PAGE_SIZE: i64 = 500;

/// Subject phrases and ATS sender domains that mark application confirmations.
const APPLICATION_QUERIES: [&str; 13] = [
    r#"subject:"application received""#,
    r#"subject:"thanks for applying""#,
    r#"subject:"we received your application""#,
    r#"subject:"your application to""#,
    r#"subject:"applied for""#,
    "from:jobs-lever.co",
    "from:greenhouse.io",
    "from:workday.com",
    "from:smartrecruiters.com",
    "from:ashbyhq.com",
    "from:workable.com",
    "from:indeed.com",
    "from:linkedin.com",
];

/// Subject phrases that mark rejection mail.
const REJECTION_QUERIES: [&str; 6] = [
    r#"subject:"we regret""#,
    r#"subject:"unfortunately""#,
    r#"subject:"not moving forward""#,
    r#"subject:"no longer being considered""#,
    r#"subject:"pursue other candidates""#,
    r#"subject:"not selected""#,
];

/// Which class of mail a scan should surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Confirmations and rejections together.
    #[default]
    All,
    Applied,
    Rejected,
}

impl ScanMode {
    /// Parses a query-string value. Unrecognized input falls back to `All`.
    pub fn from_param(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "applied" => ScanMode::Applied,
            "rejected" => ScanMode::Rejected,
            _ => ScanMode::All,
        }
    }
}

fn joined(terms: &[&str]) -> String {
    format!("({})", terms.join(" OR "))
}

/// Builds the provider search expression for one scan.
///
/// Both bounds are inclusive calendar days. The provider's `before:` operator
/// is exclusive, so the upper bound moves one day forward.
pub fn build_search_query(
    mode: ScanMode,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> String {
    let mut query = match mode {
        ScanMode::Applied => joined(&APPLICATION_QUERIES),
        ScanMode::Rejected => joined(&REJECTION_QUERIES),
        ScanMode::All => format!(
            "{} OR {}",
            joined(&APPLICATION_QUERIES),
            joined(&REJECTION_QUERIES)
        ),
    };

    if let Some(since) = since {
        query.push_str(&format!(" after:{}", since.format("%Y/%m/%d")));
    }
    if let Some(until) = until {
        let bound = until + Duration::days(1);
        query.push_str(&format!(" before:{}", bound.format("%Y/%m/%d")));
    }

    query
}

/// Clamps a caller-supplied page size into the accepted range.
pub fn clamp_page_size(requested: i64) -> i64 {
    if requested <= 0 {
        DEFAULT_PAGE_SIZE
    } else if requested > MAX_PAGE_SIZE {
        MAX_PAGE_SIZE
    } else {
        requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(ScanMode::from_param("applied"), ScanMode::Applied);
        assert_eq!(ScanMode::from_param(" Rejected "), ScanMode::Rejected);
        assert_eq!(ScanMode::from_param("all"), ScanMode::All);
        assert_eq!(ScanMode::from_param(""), ScanMode::All);
        assert_eq!(ScanMode::from_param("bogus"), ScanMode::All);
    }

    #[test]
    fn test_applied_query_holds_application_terms_only() {
        let query = build_search_query(ScanMode::Applied, None, None);
        assert!(query.starts_with('('));
        assert!(query.ends_with(')'));
        assert!(query.contains(r#"subject:"thanks for applying""#));
        assert!(query.contains("from:greenhouse.io"));
        assert!(!query.contains(r#"subject:"we regret""#));
    }

    #[test]
    fn test_rejected_query_holds_rejection_terms_only() {
        let query = build_search_query(ScanMode::Rejected, None, None);
        assert!(query.contains(r#"subject:"not moving forward""#));
        assert!(!query.contains("from:linkedin.com"));
    }

    #[test]
    fn test_all_query_unions_both_groups() {
        let query = build_search_query(ScanMode::All, None, None);
        assert_eq!(
            query,
            format!(
                "{} OR {}",
                joined(&APPLICATION_QUERIES),
                joined(&REJECTION_QUERIES)
            )
        );
    }

    #[test]
    fn test_date_filters_use_provider_format() {
        let since = Utc.with_ymd_and_hms(2025, 1, 15, 8, 30, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2025, 3, 31, 23, 0, 0).unwrap();
        let query = build_search_query(ScanMode::Applied, Some(since), Some(until));
        assert!(query.contains(" after:2025/01/15"));
        // before: is exclusive, so an inclusive March 31st becomes April 1st
        assert!(query.contains(" before:2025/04/01"));
    }

    #[test]
    fn test_clamp_page_size() {
        assert_eq!(clamp_page_size(0), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_page_size(-5), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_page_size(1), 1);
        assert_eq!(clamp_page_size(500), 500);
        assert_eq!(clamp_page_size(501), MAX_PAGE_SIZE);
    }
}
