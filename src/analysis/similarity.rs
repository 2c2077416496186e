use std::collections::HashSet;

use crate::analysis::commit_patterns::round_to;

const SKILL_WEIGHT: f64 = 0.6;
const TECHNOLOGY_WEIGHT: f64 = 0.4;

/// |A ∩ B| / |A ∪ B|, or 0 when both sets are empty.
pub fn jaccard<S: AsRef<str>>(a: &[S], b: &[S]) -> f64 {
    let a: HashSet<&str> = a.iter().map(|s| s.as_ref()).collect();
    let b: HashSet<&str> = b.iter().map(|s| s.as_ref()).collect();

    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Skills and technologies of one engineer.
#[derive(Debug, Clone, Copy)]
pub struct SkillSet<'a> {
    pub skills: &'a [String],
    pub technologies: &'a [String],
}

impl SkillSet<'_> {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.technologies.is_empty()
    }
}

/// Weighted similarity in `[0, 1]`.
pub fn combined(a: SkillSet<'_>, b: SkillSet<'_>) -> f64 {
    SKILL_WEIGHT * jaccard(a.skills, b.skills)
        + TECHNOLOGY_WEIGHT * jaccard(a.technologies, b.technologies)
}

/// Candidates scoring at least `threshold`, best first, with the score as a
/// one-decimal percentage.
pub fn rank<'a, T>(
    target: SkillSet<'_>,
    candidates: impl IntoIterator<Item = (T, SkillSet<'a>)>,
    threshold: f64,
) -> Vec<(T, f64)> {
    let mut scored: Vec<(T, f64)> = candidates
        .into_iter()
        .map(|(item, set)| (item, combined(target, set)))
        .filter(|(_, score)| *score >= threshold)
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
        .into_iter()
        .map(|(item, score)| (item, round_to(score * 100.0, 1)))
        .collect()
}
