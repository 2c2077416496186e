//! Recovery of labeled fields from generated free text.
//!
//! Completions are asked to answer as `LABEL: value` lines. Parsing yields a
//! partial result: every requested label maps to an optional value, so a
//! missing or garbled label only drops that field.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::llm::prompts::{code_labels, profile_labels};
use crate::models::{CodeInsights, ExperienceLevel, ProfileInsights};

fn label_line() -> &'static Regex {
    static LABEL_LINE: OnceLock<Regex> = OnceLock::new();
    LABEL_LINE.get_or_init(|| {
        // Tolerates markdown decoration such as `**SUMMARY:**` or `### SUMMARY:`
        Regex::new(r"^[\s#*>]*([A-Z][A-Z_]+)\**\s*:\**\s*(.*)$").expect("valid label regex")
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledFields {
    values: HashMap<&'static str, String>,
}

impl LabeledFields {
    /// Scans `text` for the given labels. A value runs from its label to the
    /// next label line (known or not) or the end of the text.
    pub fn parse(text: &str, labels: &[&'static str]) -> Self {
        let mut values = HashMap::new();
        let mut current: Option<(&'static str, Vec<&str>)> = None;

        for line in text.lines() {
            if let Some(caps) = label_line().captures(line) {
                if let Some((label, body)) = current.take() {
                    store(&mut values, label, &body);
                }

                let found = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                current = labels
                    .iter()
                    .find(|l| **l == found)
                    .map(|l| (*l, vec![caps.get(2).map(|m| m.as_str()).unwrap_or_default()]));
                continue;
            }

            if let Some((_, body)) = current.as_mut() {
                body.push(line);
            }
        }

        if let Some((label, body)) = current.take() {
            store(&mut values, label, &body);
        }

        Self { values }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.values.get(label).map(String::as_str)
    }

    pub fn text(&self, label: &str) -> Option<String> {
        self.get(label).map(str::to_string)
    }

    /// Comma separated value as an ordered set of trimmed, non-empty items.
    pub fn list(&self, label: &str) -> Vec<String> {
        let Some(value) = self.get(label) else {
            return Vec::new();
        };

        let value = value.trim_start_matches('[').trim_end_matches(']');
        let mut items: Vec<String> = Vec::new();
        for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !items.iter().any(|existing| existing == item) {
                items.push(item.to_string());
            }
        }
        items
    }

    /// Leading integer of the value, e.g. `8/10` gives 8.
    pub fn integer(&self, label: &str) -> Option<i64> {
        let value = self
            .get(label)?
            .trim_start_matches(|c: char| c == '*' || c == '[' || c.is_whitespace());
        let end = value
            .char_indices()
            .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
            .map(|(i, _)| i)
            .unwrap_or(value.len());
        value[..end].parse().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn store(values: &mut HashMap<&'static str, String>, label: &'static str, body: &[&str]) {
    let value = body.join("\n").trim().to_string();
    if value.is_empty() {
        values.remove(label);
    } else {
        values.insert(label, value);
    }
}

/// Scores outside 1..=10 are clamped; an absent or non-numeric score stays 0.
pub fn clamp_quality_score(raw: Option<i64>) -> u8 {
    match raw {
        Some(score) => score.clamp(1, 10) as u8,
        None => 0,
    }
}

pub fn parse_code_insights(response: &str) -> CodeInsights {
    let fields = LabeledFields::parse(response, &code_labels::ALL);
    if fields.is_empty() {
        tracing::warn!("Insight response contained none of the expected labels");
    }

    CodeInsights {
        quality_score: clamp_quality_score(fields.integer(code_labels::QUALITY_SCORE)),
        complexity_level: fields.text(code_labels::COMPLEXITY_LEVEL),
        maintainability: fields.text(code_labels::MAINTAINABILITY),
        architecture_pattern: fields.text(code_labels::ARCHITECTURE_PATTERN),
        strengths: fields.text(code_labels::STRENGTHS),
        improvements: fields.text(code_labels::IMPROVEMENTS),
        tech_insights: fields.text(code_labels::TECH_INSIGHTS),
    }
}

pub fn parse_profile_insights(response: &str) -> ProfileInsights {
    let fields = LabeledFields::parse(response, &profile_labels::ALL);
    if fields.is_empty() {
        tracing::warn!("Profile response contained none of the expected labels");
    }

    ProfileInsights {
        summary: fields.text(profile_labels::SUMMARY),
        skills: fields.list(profile_labels::SKILLS),
        technologies: fields.list(profile_labels::TECHNOLOGIES),
        experience_level: fields
            .get(profile_labels::EXPERIENCE)
            .and_then(ExperienceLevel::detect),
        personality: fields.text(profile_labels::PERSONALITY),
        strengths: fields.list(profile_labels::STRENGTHS),
        communication_style: fields.text(profile_labels::COMMUNICATION),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSIGHTS: &str = "Here is my assessment.\n\
QUALITY_SCORE: 7\n\
COMPLEXITY_LEVEL: Medium\n\
MAINTAINABILITY: Good\n\
ARCHITECTURE_PATTERN: MVC\n\
STRENGTHS: Clear module boundaries\n\
and consistent naming\n\
IMPROVEMENTS: Add tests\n\
TECH_INSIGHTS: Rails conventions throughout";

    #[test]
    fn test_parse_all_code_labels() {
        let insights = parse_code_insights(INSIGHTS);
        assert_eq!(insights.quality_score, 7);
        assert_eq!(insights.complexity_level.as_deref(), Some("Medium"));
        assert_eq!(insights.maintainability.as_deref(), Some("Good"));
        assert_eq!(insights.architecture_pattern.as_deref(), Some("MVC"));
        assert_eq!(
            insights.strengths.as_deref(),
            Some("Clear module boundaries\nand consistent naming")
        );
        assert_eq!(insights.improvements.as_deref(), Some("Add tests"));
        assert_eq!(insights.tech_insights.as_deref(), Some("Rails conventions throughout"));
    }

    #[test]
    fn test_missing_label_only_drops_that_field() {
        let insights = parse_code_insights("QUALITY_SCORE: 6\nIMPROVEMENTS: Split the god object");
        assert_eq!(insights.quality_score, 6);
        assert_eq!(insights.maintainability, None);
        assert_eq!(insights.improvements.as_deref(), Some("Split the god object"));
    }

    #[test]
    fn test_unknown_label_terminates_previous_value() {
        let fields = LabeledFields::parse("SUMMARY: short\nNOTES: ignored", &profile_labels::ALL);
        assert_eq!(fields.get("SUMMARY"), Some("short"));
        assert_eq!(fields.get("NOTES"), None);
    }

    #[test]
    fn test_markdown_decorated_labels() {
        let fields = LabeledFields::parse(
            "**SUMMARY:** Builds tools\n### SKILLS: Rust, Go",
            &profile_labels::ALL,
        );
        assert_eq!(fields.get("SUMMARY"), Some("Builds tools"));
        assert_eq!(fields.list("SKILLS"), vec!["Rust", "Go"]);
    }

    #[test]
    fn test_quality_score_is_clamped() {
        assert_eq!(parse_code_insights("QUALITY_SCORE: 42").quality_score, 10);
        assert_eq!(parse_code_insights("QUALITY_SCORE: -3").quality_score, 1);
        assert_eq!(parse_code_insights("QUALITY_SCORE: 8/10").quality_score, 8);
        assert_eq!(parse_code_insights("QUALITY_SCORE: high").quality_score, 0);
        assert_eq!(parse_code_insights("no labels at all").quality_score, 0);
    }

    #[test]
    fn test_bold_quality_score() {
        assert_eq!(parse_code_insights("QUALITY_SCORE: **8**").quality_score, 8);
        assert_eq!(parse_code_insights("**QUALITY_SCORE:** [ 7 ]").quality_score, 7);
    }

    #[test]
    fn test_parse_profile_sets() {
        let profile = parse_profile_insights(
            "SUMMARY: A pragmatic backend engineer.\n\
SKILLS: API design, testing, , API design\n\
TECHNOLOGIES: [Ruby, Rails, PostgreSQL]\n\
EXPERIENCE: Senior\n\
PERSONALITY: Methodical\n\
STRENGTHS: Mentoring,Documentation\n\
COMMUNICATION: Concise and direct",
        );

        assert_eq!(profile.summary.as_deref(), Some("A pragmatic backend engineer."));
        assert_eq!(profile.skills, vec!["API design", "testing"]);
        assert_eq!(profile.technologies, vec!["Ruby", "Rails", "PostgreSQL"]);
        assert_eq!(profile.experience_level, Some(ExperienceLevel::Senior));
        assert_eq!(profile.strengths, vec!["Mentoring", "Documentation"]);
        assert_eq!(profile.communication_style.as_deref(), Some("Concise and direct"));
    }

    #[test]
    fn test_unrecognized_experience_is_absent() {
        let profile = parse_profile_insights("EXPERIENCE: Wizard");
        assert_eq!(profile.experience_level, None);
    }
}
