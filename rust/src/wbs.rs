//! Work-breakdown input handed over by the quantity/price-matching collaborator.

use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Largest building the floor stagger will expand.
pub const MAX_FLOORS: u32 = 200;

/// A priced, quantified work item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WbsArticle {
    pub code: String,
    pub name: String,
    pub unit: String,
    pub quantity: f64,
    pub unit_cost: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WbsSubChapter {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub articles: Vec<WbsArticle>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WbsChapter {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub sub_chapters: Vec<WbsSubChapter>,
}

/// The project to schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WbsProject {
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default = "default_floors")]
    pub number_of_floors: u32,
    pub chapters: Vec<WbsChapter>,
}

fn default_floors() -> u32 {
    1
}

/// Price record matched to one article. Costs are per article unit after
/// applying `conversion_factor` to the article quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceMatch {
    pub materials: f64,
    pub labor: f64,
    pub machinery: f64,
    #[serde(default = "default_conversion")]
    pub conversion_factor: f64,
    /// Matching confidence in [0, 1]; reported, never used for scheduling.
    #[serde(default)]
    pub confidence: f64,
}

fn default_conversion() -> f64 {
    1.0
}

impl PriceMatch {
    pub fn unit_total(&self) -> f64 {
        self.materials + self.labor + self.machinery
    }

    pub(crate) fn validate(&self, article_code: &str) -> Result<(), ScheduleError> {
        let field = format!("price_matches[{}]", article_code);
        for (name, value) in [
            ("materials", self.materials),
            ("labor", self.labor),
            ("machinery", self.machinery),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScheduleError::input(
                    &field,
                    format!("{} cost must be a non-negative number, got {}", name, value),
                ));
            }
        }
        if !self.conversion_factor.is_finite() || self.conversion_factor <= 0.0 {
            return Err(ScheduleError::input(
                &field,
                format!("conversion factor must be positive, got {}", self.conversion_factor),
            ));
        }
        Ok(())
    }
}

impl WbsProject {
    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Articles with their chapter, in WBS order.
    pub fn articles(&self) -> impl Iterator<Item = (&WbsChapter, &WbsArticle)> {
        self.chapters.iter().flat_map(|chapter| {
            chapter
                .sub_chapters
                .iter()
                .flat_map(|sub| sub.articles.iter())
                .map(move |article| (chapter, article))
        })
    }

    /// Reject malformed WBS data before any scheduling work.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.name.trim().is_empty() {
            return Err(ScheduleError::input("name", "project name is empty"));
        }
        if self.number_of_floors == 0 {
            return Err(ScheduleError::input("number_of_floors", "must be at least 1"));
        }
        if self.number_of_floors > MAX_FLOORS {
            return Err(ScheduleError::input(
                "number_of_floors",
                format!("{} exceeds the limit of {}", self.number_of_floors, MAX_FLOORS),
            ));
        }

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for chapter in &self.chapters {
            if chapter.code.trim().is_empty() {
                return Err(ScheduleError::input(
                    "chapters.code",
                    format!("chapter '{}' has no code", chapter.name),
                ));
            }
            for sub in &chapter.sub_chapters {
                for article in &sub.articles {
                    validate_article(article)?;
                    if !seen.insert(article.code.as_str()) {
                        return Err(ScheduleError::input(
                            format!("articles[{}]", article.code),
                            "duplicate article code",
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

fn validate_article(article: &WbsArticle) -> Result<(), ScheduleError> {
    if article.code.trim().is_empty() {
        return Err(ScheduleError::input(
            "articles.code",
            format!("article '{}' has no code", article.name),
        ));
    }
    let field = format!("articles[{}]", article.code);
    if !article.quantity.is_finite() || article.quantity <= 0.0 {
        return Err(ScheduleError::input(
            field,
            format!("quantity must be positive, got {}", article.quantity),
        ));
    }
    if !article.unit_cost.is_finite() || article.unit_cost < 0.0 {
        return Err(ScheduleError::input(
            field,
            format!("unit cost must be non-negative, got {}", article.unit_cost),
        ));
    }
    Ok(())
}
