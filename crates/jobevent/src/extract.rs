//! Subject-line heuristics for recognizing job-application emails.
//!
//! Patterns are matched in order from most to least specific; the first
//! capture wins. Company detection falls back to the sender's domain when
//! nothing in the subject matches.

use std::sync::LazyLock;

use regex::Regex;

use crate::EventStatus;

static COMPANY_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)your application to ([\w\s\.\-&']+)").unwrap(),
        Regex::new(r"(?i)application received (?:at|from) ([\w\s\.\-&']+)").unwrap(),
        Regex::new(r"(?i)thanks for applying to ([\w\s\.\-&']+)").unwrap(),
    ]
});

static AT_COMPANY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bat\s+([A-Za-z0-9&\.\-'\s]+)").unwrap());

static TITLE_PATTERNS: LazyLock<[Regex; 6]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\bfor (?:the )?position of ([\w\s\.\-/&']+?)\b").unwrap(),
        Regex::new(r"(?i)\bapplication (?:for|to) ([\w\s\.\-/&']+?) (?:at|with)\b").unwrap(),
        Regex::new(r"(?i)\byour application to .*? for ([\w\s\.\-/&']+)$").unwrap(),
        // “Software Engineer”: next steps
        Regex::new(r#"(?i)[“"]([^”"]+)[”"]\s*:"#).unwrap(),
        // Software Engineer: next steps
        Regex::new(r"(?i)^\s*([^:]+?)\s*:\s*").unwrap(),
        // Software Engineer at Acme
        Regex::new(r#"(?i)^["“]?([^"”]+?)["”]?\s+at\s+"#).unwrap(),
    ]
});

/// Phrases that mark a message as a rejection, checked case-insensitively
/// against the subject and snippet together.
const REJECTION_INDICATORS: [&str; 7] = [
    "not moving forward",
    "unfortunately",
    "no longer being considered",
    "not selected",
    "pursue other candidates",
    "we regret",
    "regret to inform",
];

/// Pulls a company name out of the subject line, falling back to the sender
/// address when the subject gives nothing away.
pub fn extract_company(subject: &str, from: &str) -> Option<String> {
    let subject = subject.trim();
    for pattern in COMPANY_PATTERNS.iter() {
        if let Some(found) = first_capture(pattern, subject) {
            return Some(found);
        }
    }
    if let Some(found) = first_capture(&AT_COMPANY, subject) {
        return Some(found);
    }
    company_from_sender(from)
}

/// Pulls a position title out of the subject line.
pub fn extract_title(subject: &str) -> Option<String> {
    let subject = subject.trim();
    for pattern in TITLE_PATTERNS.iter() {
        if let Some(found) = first_capture(pattern, subject) {
            return Some(found);
        }
    }
    None
}

/// Classifies a message as applied or rejected based on rejection phrases
/// anywhere in the subject or snippet. Applied is the default.
pub fn classify_status(subject: &str, snippet: &str) -> EventStatus {
    let haystack = format!("{subject} {snippet}").to_lowercase();
    if REJECTION_INDICATORS.iter().any(|kw| haystack.contains(kw)) {
        EventStatus::Rejected
    } else {
        EventStatus::Applied
    }
}

fn first_capture(pattern: &Regex, haystack: &str) -> Option<String> {
    let captures = pattern.captures(haystack)?;
    let found = captures.get(1)?.as_str().trim();
    if found.is_empty() {
        return None;
    }
    Some(found.to_string())
}

/// Derives a company name from the sender's domain: `jobs@mail.acme.com`
/// becomes `Acme`. Senders without a dotted domain yield nothing.
fn company_from_sender(from: &str) -> Option<String> {
    let (_, raw) = from.split_once('@')?;
    let mut domain = raw.trim().to_lowercase();
    if let Some(stripped) = domain.strip_prefix("mail.") {
        domain = stripped.to_string();
    }
    if let Some(end) = domain.find('>') {
        domain.truncate(end);
    }
    let label = domain.split_once('.')?.0;
    if label.is_empty() {
        return None;
    }
    Some(capitalize(label))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_company_from_subject_patterns() {
        assert_eq!(
            extract_company("Your application to Acme Corp", ""),
            Some("Acme Corp".to_string())
        );
        assert_eq!(
            extract_company("Application received from Globex", ""),
            Some("Globex".to_string())
        );
        assert_eq!(
            extract_company("Thanks for applying to Initech", ""),
            Some("Initech".to_string())
        );
    }

    #[test]
    fn company_falls_back_to_at_phrase() {
        assert_eq!(
            extract_company("Following up on your interview at Hooli", ""),
            Some("Hooli".to_string())
        );
    }

    #[test]
    fn company_falls_back_to_sender_domain() {
        assert_eq!(
            extract_company("Status update", "Acme Careers <no-reply@mail.acme.com>"),
            Some("Acme".to_string())
        );
        assert_eq!(
            extract_company("Status update", "jobs@greenhouse.io"),
            Some("Greenhouse".to_string())
        );
    }

    #[test]
    fn company_is_none_without_any_signal() {
        assert_eq!(extract_company("Hello there", "not-an-address"), None);
        // A bare host with no dot carries no usable company name.
        assert_eq!(extract_company("Hello there", "root@localhost"), None);
    }

    #[test]
    fn extracts_title_from_position_of_phrase() {
        assert_eq!(
            extract_title("Your application for the position of Accountant"),
            Some("Accountant".to_string())
        );
    }

    #[test]
    fn extracts_title_between_application_and_company() {
        assert_eq!(
            extract_title("Your application for Senior Rust Engineer at Acme"),
            Some("Senior Rust Engineer".to_string())
        );
        assert_eq!(
            extract_title("Your application to Acme for Backend Engineer"),
            Some("Backend Engineer".to_string())
        );
    }

    #[test]
    fn extracts_title_from_quoted_or_colon_prefix() {
        assert_eq!(
            extract_title("\u{201c}Software Engineer\u{201d}: next steps"),
            Some("Software Engineer".to_string())
        );
        assert_eq!(
            extract_title("\"Platform Engineer\": interview availability"),
            Some("Platform Engineer".to_string())
        );
        assert_eq!(
            extract_title("Data Analyst: application received"),
            Some("Data Analyst".to_string())
        );
    }

    #[test]
    fn extracts_title_before_at_company() {
        assert_eq!(
            extract_title("Rust Engineer at Canva"),
            Some("Rust Engineer".to_string())
        );
    }

    #[test]
    fn title_is_none_without_any_signal() {
        assert_eq!(extract_title("Welcome aboard"), None);
    }

    #[test]
    fn rejection_phrases_classify_as_rejected() {
        assert_eq!(
            classify_status(
                "Update on your application",
                "Unfortunately, we have decided to move forward with other candidates."
            ),
            EventStatus::Rejected
        );
        assert_eq!(
            classify_status("We regret to inform you", ""),
            EventStatus::Rejected
        );
        assert_eq!(
            classify_status("Application update", "you are no longer being considered"),
            EventStatus::Rejected
        );
    }

    #[test]
    fn defaults_to_applied_without_rejection_phrase() {
        assert_eq!(
            classify_status("Thanks for applying", "We'll be in touch soon."),
            EventStatus::Applied
        );
    }
}
