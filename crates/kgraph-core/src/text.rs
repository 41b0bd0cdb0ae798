//! Label normalization shared by the merge passes.
//!
//! Three different normal forms are in play and they are not interchangeable:
//!
//! - [`normalize_name`] produces the id-safe slug used by [`generate_id`].
//! - [`strip_legal_suffix`] produces the exact-match key used by the entity
//!   merger ("TechNova Inc." and "TechNova" share a key, case is preserved).
//! - [`comparison_form`] produces the loose form used by [`is_alias`].

/// Shorter comparison forms than this never alias by containment.
pub const MIN_ALIAS_LEN: usize = 4;

const LEGAL_SUFFIXES: &[&str] = &["inc", "corp", "llc", "ltd", "co", "corporation"];

const INVALID_LABELS: &[&str] = &[
    "founded",
    "launched",
    "rolled out",
    "focuses on",
    "established",
    "created",
    "started",
    "began",
    "introduced",
    "announced",
    "provides",
    "offers",
    "delivers",
    "enables",
    "supports",
];

const INVALID_PREFIXES: &[&str] = &["founded", "launched", "rolled", "focuses", "established"];

/// Lowercase, trim, and replace every character outside `[a-z0-9]` with `_`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '_' })
        .collect()
}

/// Deterministic node id: lowercase type, `_`, slug of the label.
#[must_use]
pub fn generate_id(label: &str, node_type: &str) -> String {
    format!("{}_{}", node_type.to_lowercase(), normalize_name(label))
}

/// "AgroSupply Co." -> "AgroSupply". Case is preserved.
#[must_use]
pub fn strip_legal_suffix(name: &str) -> String {
    let trimmed = name.trim();

    let Some(split) = trimmed.rfind(char::is_whitespace) else {
        return trimmed.to_string();
    };

    let (head, tail) = trimmed.split_at(split);
    let tail = tail.trim_start();
    let dots = tail.len() - tail.trim_end_matches('.').len();
    let word = tail.trim_end_matches('.').to_lowercase();

    if dots <= 2 && LEGAL_SUFFIXES.contains(&word.as_str()) {
        head.trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// "Nimbus Solutions" -> "nimbussolutions"
#[must_use]
pub fn comparison_form(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Two labels alias when their comparison forms are equal, or one contains
/// the other and the shorter one is at least [`MIN_ALIAS_LEN`] long.
#[must_use]
pub fn is_alias(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }

    let a = comparison_form(a);
    let b = comparison_form(b);

    if a == b {
        return true;
    }

    (a.contains(&b) || b.contains(&a)) && a.len().min(b.len()) >= MIN_ALIAS_LEN
}

/// Sentence fragments the rule-based extractor tends to capture as names.
#[must_use]
pub fn is_invalid_label(label: &str) -> bool {
    if label.chars().count() < 3 {
        return true;
    }

    let lower = label.trim().to_lowercase();

    INVALID_LABELS.contains(&lower.as_str())
        || INVALID_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Longest label wins; ties go to the alphabetically first one.
#[must_use]
pub fn choose_best_label<'a, I>(labels: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    labels.into_iter().min_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        assert_eq!(generate_id("NovaCloud", "Platform"), "platform_novacloud");
        assert_eq!(generate_id("DataFlow Systems", "Partner"), "partner_dataflow_systems");
        assert_eq!(generate_id("  AI-powered service ", "Service"), "service_ai_powered_service");
    }

    #[test]
    fn test_strip_legal_suffix() {
        assert_eq!(strip_legal_suffix("TechNova Inc."), "TechNova");
        assert_eq!(strip_legal_suffix("TechNova Inc"), "TechNova");
        assert_eq!(strip_legal_suffix("AgroSupply Co"), "AgroSupply");
        assert_eq!(strip_legal_suffix("Acme corporation"), "Acme");
        assert_eq!(strip_legal_suffix("Widgets LLC "), "Widgets");
        assert_eq!(strip_legal_suffix("TechNova"), "TechNova");
        // Suffix must be a separate word.
        assert_eq!(strip_legal_suffix("Cisco"), "Cisco");
    }

    #[test]
    fn test_is_alias() {
        assert!(is_alias("Nimbus", "Nimbus Solutions"));
        assert!(is_alias("Nova-Cloud", "novacloud"));
        assert!(!is_alias("Co", "Cobalt"));
        assert!(!is_alias("AI", "QuantumAI"));
        assert!(!is_alias("", "anything"));
        assert!(!is_alias("TechNova", "QuantumAI"));
    }

    #[test]
    fn test_is_invalid_label() {
        assert!(is_invalid_label("Founded"));
        assert!(is_invalid_label("rolled out"));
        assert!(is_invalid_label("Launched in 2020 by"));
        assert!(is_invalid_label("AI"));
        assert!(!is_invalid_label("TechNova"));
        assert!(!is_invalid_label("Launch in 2020"));
    }

    #[test]
    fn test_choose_best_label() {
        assert_eq!(
            choose_best_label(["Nimbus", "Nimbus Solutions"]),
            Some("Nimbus Solutions")
        );
        assert_eq!(choose_best_label(["beta", "alfa"]), Some("alfa"));
        assert_eq!(choose_best_label(std::iter::empty()), None);
    }
}
