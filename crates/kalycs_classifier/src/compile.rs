//! Compilation of persisted rules into matchable predicates.

use kalycs_catalog::{Rule, RuleKind};
use regex::Regex;
use std::borrow::Cow;
use thiserror::Error;

/// Per-rule compilation failures. The reload path skips offending rules
/// instead of rejecting the whole set.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("invalid texts format: must be a JSON array of strings: {0}")]
    Texts(#[from] serde_json::Error),

    #[error("regex rule requires exactly one pattern")]
    PatternCount,

    #[error("invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// A rule ready for matching: texts parsed from their stored JSON form,
/// case folding applied at compile time, regex built when applicable.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule_id: String,
    pub project_id: String,
    pub kind: RuleKind,
    pub texts: Vec<String>,
    pub case_sensitive: bool,
    pub regex: Option<Regex>,
    /// Lower values are evaluated first.
    pub priority: i32,
}

/// Compile one rule row.
///
/// For `regex` rules the single pattern is compiled, with `(?i)` prepended
/// when matching case-insensitively. For every other kind, case-insensitive
/// texts are lower-cased here so match-time work stays allocation-light.
pub fn compile_rule(rule: &Rule) -> Result<CompiledRule, CompileError> {
    let mut texts: Vec<String> = serde_json::from_str(&rule.texts)?;

    let mut regex = None;
    if rule.kind == RuleKind::Regex {
        if texts.len() != 1 {
            return Err(CompileError::PatternCount);
        }
        let pattern = if rule.case_sensitive {
            Cow::Borrowed(texts[0].as_str())
        } else {
            Cow::Owned(format!("(?i){}", texts[0]))
        };
        regex = Some(Regex::new(&pattern)?);
    } else if !rule.case_sensitive {
        for text in &mut texts {
            *text = text.to_lowercase();
        }
    }

    Ok(CompiledRule {
        rule_id: rule.id.clone(),
        project_id: rule.project_id.clone(),
        kind: rule.kind,
        texts,
        case_sensitive: rule.case_sensitive,
        regex,
        priority: rule.priority,
    })
}

impl CompiledRule {
    /// First-match predicate over a leaf file name and its lower-cased
    /// extension. Regex rules always see the original-case name; the case
    /// folding is baked into the pattern.
    pub fn matches(&self, name: &str, ext: &str) -> bool {
        let test_name: Cow<'_, str> = if !self.case_sensitive && self.kind != RuleKind::Regex {
            Cow::Owned(name.to_lowercase())
        } else {
            Cow::Borrowed(name)
        };

        match self.kind {
            RuleKind::StartsWith => self
                .texts
                .iter()
                .any(|text| test_name.starts_with(text.as_str())),
            RuleKind::Contains => self
                .texts
                .iter()
                .any(|text| test_name.contains(text.as_str())),
            RuleKind::EndsWith => self
                .texts
                .iter()
                .any(|text| test_name.ends_with(text.as_str())),
            RuleKind::Extension => self.texts.iter().any(|text| ext == text),
            RuleKind::Regex => self.regex.as_ref().is_some_and(|re| re.is_match(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kalycs_catalog::texts_to_json;

    fn rule(kind: RuleKind, texts: &[&str], case_sensitive: bool) -> Rule {
        let mut rule = Rule::new("project", "test", kind, texts_to_json(texts));
        rule.case_sensitive = case_sensitive;
        rule
    }

    #[test]
    fn lowercases_texts_when_case_insensitive() {
        let compiled = compile_rule(&rule(RuleKind::Contains, &["RePoRt"], false)).unwrap();
        assert_eq!(compiled.texts, vec!["report"]);
    }

    #[test]
    fn preserves_texts_when_case_sensitive() {
        let compiled = compile_rule(&rule(RuleKind::Contains, &["RePoRt"], true)).unwrap();
        assert_eq!(compiled.texts, vec!["RePoRt"]);
    }

    #[test]
    fn regex_gets_case_insensitive_flag() {
        let compiled = compile_rule(&rule(RuleKind::Regex, &["^foo\\d+"], false)).unwrap();
        let re = compiled.regex.as_ref().unwrap();
        assert!(re.is_match("FOO123"));
        assert!(re.is_match("foo42"));
    }

    #[test]
    fn case_sensitive_regex_is_compiled_verbatim() {
        let compiled = compile_rule(&rule(RuleKind::Regex, &["^foo\\d+"], true)).unwrap();
        let re = compiled.regex.as_ref().unwrap();
        assert!(!re.is_match("FOO123"));
        assert!(re.is_match("foo123"));
    }

    #[test]
    fn rejects_malformed_texts() {
        let mut bad = rule(RuleKind::Contains, &[], false);
        bad.texts = "not json".to_string();
        assert!(matches!(compile_rule(&bad), Err(CompileError::Texts(_))));
    }

    #[test]
    fn regex_needs_exactly_one_pattern() {
        assert!(matches!(
            compile_rule(&rule(RuleKind::Regex, &[], false)),
            Err(CompileError::PatternCount)
        ));
        assert!(matches!(
            compile_rule(&rule(RuleKind::Regex, &["a", "b"], false)),
            Err(CompileError::PatternCount)
        ));
    }

    #[test]
    fn invalid_regex_fails_compilation() {
        assert!(matches!(
            compile_rule(&rule(RuleKind::Regex, &["[unclosed"], false)),
            Err(CompileError::Regex(_))
        ));
    }

    #[test]
    fn starts_with_matches_any_prefix() {
        let compiled = compile_rule(&rule(RuleKind::StartsWith, &["inv", "rep"], false)).unwrap();
        assert!(compiled.matches("Invoice_2024.pdf", "pdf"));
        assert!(compiled.matches("report.txt", "txt"));
        assert!(!compiled.matches("summary.txt", "txt"));
    }

    #[test]
    fn ends_with_respects_case_sensitivity() {
        let compiled = compile_rule(&rule(RuleKind::EndsWith, &["_FINAL.txt"], true)).unwrap();
        assert!(compiled.matches("draft_FINAL.txt", "txt"));
        assert!(!compiled.matches("draft_final.txt", "txt"));
    }

    #[test]
    fn extension_compares_against_lowercased_ext() {
        let compiled = compile_rule(&rule(RuleKind::Extension, &["PDF"], false)).unwrap();
        assert!(compiled.matches("report.PDF", "pdf"));
        assert!(!compiled.matches("report.docx", "docx"));
    }
}
