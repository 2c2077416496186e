//! Read side over stored profiles: discovery, similar engineers, trending
//! skills and detailed engineer pages.

use std::collections::HashMap;

use crate::analysis::similarity::{self, SkillSet};
use crate::error::{Error, Result};
use crate::models::{
    DiscoverPage, DiscoverQuery, EngineerCard, EngineerDetail, Pagination, ProfileAnalysis,
    RankedEngineer, RepositorySnapshot, SimilarEngineers, TopRepository, Trending, TrendingEntry,
    User,
};
use crate::storage::Storage;

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 100;
const TRENDING_LIMIT: usize = 20;
const TOP_REPOSITORIES: usize = 5;
const TOP_LANGUAGES: usize = 5;

/// A user with a stored profile analysis and their repositories.
#[derive(Debug, Clone)]
pub struct Engineer {
    pub user: User,
    pub profile: ProfileAnalysis,
    pub repositories: Vec<RepositorySnapshot>,
}

impl Engineer {
    pub fn card(&self) -> EngineerCard {
        EngineerCard::new(&self.user, Some(&self.profile), &self.repositories)
    }

    fn total_stars(&self) -> u64 {
        self.repositories.iter().map(|r| r.stars as u64).sum()
    }

    fn skill_set(&self) -> SkillSet<'_> {
        SkillSet {
            skills: &self.profile.skills,
            technologies: &self.profile.technologies,
        }
    }
}

pub struct EngineerDirectory {
    similarity_threshold: f64,
}

impl EngineerDirectory {
    pub fn new(similarity_threshold: f64) -> Self {
        Self { similarity_threshold }
    }

    /// Every user that has a profile analysis, ordered by user id.
    pub fn engineers(&self, storage: &Storage) -> Result<Vec<Engineer>> {
        let mut engineers = Vec::new();
        for profile in storage.list_profile_analyses()? {
            let Some(user) = storage.get_user(profile.user_id)? else {
                tracing::warn!("Profile {} has no user row", profile.id);
                continue;
            };
            let repositories = storage.list_repositories(user.id)?;
            engineers.push(Engineer { user, profile, repositories });
        }
        Ok(engineers)
    }

    pub fn discover(&self, storage: &Storage, query: &DiscoverQuery) -> Result<DiscoverPage> {
        let page = query.page.max(1);
        let per_page = match query.per_page {
            0 => DEFAULT_PER_PAGE,
            n => n.clamp(1, MAX_PER_PAGE),
        };

        let mut matches: Vec<(usize, Engineer)> = self
            .engineers(storage)?
            .into_iter()
            .filter(|e| Some(e.user.id) != query.exclude_user)
            .filter(|e| match query.experience_level {
                Some(level) => e.profile.experience_level == Some(level),
                None => true,
            })
            .filter(|e| match query.technology.as_deref() {
                Some(tech) => contains_ignore_case(&e.profile.technologies, tech),
                None => true,
            })
            .filter_map(|e| {
                let matched = query
                    .skills
                    .iter()
                    .filter(|s| contains_ignore_case(&e.profile.skills, s))
                    .count();
                (query.skills.is_empty() || matched > 0).then_some((matched, e))
            })
            .collect();

        matches.sort_by(|(a_matched, a), (b_matched, b)| {
            b_matched
                .cmp(a_matched)
                .then_with(|| b.total_stars().cmp(&a.total_stars()))
                .then_with(|| a.user.id.cmp(&b.user.id))
        });

        let total_count = matches.len();
        let engineers = matches
            .iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .map(|(_, e)| e.card())
            .collect();

        tracing::debug!("Discover matched {} engineers", total_count);
        Ok(DiscoverPage {
            engineers,
            pagination: Pagination {
                current_page: page,
                per_page,
                total_count,
                total_pages: total_count.div_ceil(per_page),
            },
            filters: DiscoverQuery {
                page,
                per_page,
                ..query.clone()
            },
        })
    }

    pub fn similar_to(&self, storage: &Storage, user_id: i64) -> Result<SimilarEngineers> {
        let Some(own) = storage.get_profile_analysis(user_id)? else {
            return Ok(SimilarEngineers::default());
        };

        let target = SkillSet {
            skills: &own.skills,
            technologies: &own.technologies,
        };
        if target.is_empty() {
            return Ok(SimilarEngineers {
                engineers: Vec::new(),
                message: Some(
                    "Complete your profile analysis to find similar engineers".to_string(),
                ),
            });
        }

        let others: Vec<Engineer> = self
            .engineers(storage)?
            .into_iter()
            .filter(|e| e.user.id != user_id)
            .collect();

        let engineers: Vec<RankedEngineer> = similarity::rank(
            target,
            others.iter().map(|e| (e, e.skill_set())),
            self.similarity_threshold,
        )
        .into_iter()
        .map(|(e, similarity_score)| RankedEngineer {
            card: e.card(),
            similarity_score,
        })
        .collect();

        let message = engineers
            .is_empty()
            .then(|| "No similar engineers found".to_string());
        Ok(SimilarEngineers { engineers, message })
    }

    pub fn trending(&self, storage: &Storage) -> Result<Trending> {
        let profiles = storage.list_profile_analyses()?;
        Ok(Trending {
            trending_skills: top_counts(profiles.iter().flat_map(|p| p.skills.iter())),
            trending_technologies: top_counts(profiles.iter().flat_map(|p| p.technologies.iter())),
        })
    }

    /// Card, most starred repositories and most used languages of a user.
    /// Viewing one's own page through the directory is rejected.
    pub fn engineer_profile(
        &self,
        storage: &Storage,
        user_id: i64,
        viewer: Option<i64>,
    ) -> Result<EngineerDetail> {
        if viewer == Some(user_id) {
            return Err(Error::Validation(
                "Cannot view your own profile through the directory".to_string(),
            ));
        }

        let user = storage
            .get_user(user_id)?
            .ok_or_else(|| Error::UserNotFound(user_id.to_string()))?;
        let profile = storage.get_profile_analysis(user_id)?;
        let repos = storage.list_repositories(user_id)?;

        let mut by_stars: Vec<&RepositorySnapshot> = repos.iter().collect();
        by_stars.sort_by(|a, b| b.stars.cmp(&a.stars));
        let top_repositories = by_stars
            .into_iter()
            .take(TOP_REPOSITORIES)
            .map(TopRepository::from)
            .collect();

        let mut languages_used = count_desc(repos.iter().filter_map(|r| r.language.as_deref()));
        languages_used.truncate(TOP_LANGUAGES);

        Ok(EngineerDetail {
            card: EngineerCard::new(&user, profile.as_ref(), &repos),
            top_repositories,
            languages_used,
        })
    }
}

fn contains_ignore_case(items: &[String], wanted: &str) -> bool {
    let wanted = wanted.trim();
    items.iter().any(|item| item.eq_ignore_ascii_case(wanted))
}

/// Occurrences per distinct name, most frequent first, ties by name.
fn count_desc<'a>(names: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *counts.entry(name).or_insert(0) += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn top_counts<'a>(names: impl Iterator<Item = &'a String>) -> Vec<TrendingEntry> {
    count_desc(names.map(String::as_str))
        .into_iter()
        .take(TRENDING_LIMIT)
        .map(|(name, count)| TrendingEntry { name, count })
        .collect()
}
