//! Temperature range rules.

use serde::{Deserialize, Serialize};

/// A rule before it has been stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRule {
    pub min_temp: f64,
    pub max_temp: f64,
    /// `None` matches any condition
    pub condition: Option<String>,
    pub text: String,
    pub drinks: Vec<String>,
}

impl NewRule {
    pub fn new(
        min_temp: f64,
        max_temp: f64,
        condition: Option<&str>,
        text: &str,
        drinks: &[&str],
    ) -> Self {
        Self {
            min_temp,
            max_temp,
            condition: condition.map(str::to_string),
            text: text.to_string(),
            drinks: drinks.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// A stored rule: `{min_temp, max_temp, condition} -> {text, drinks}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRule {
    pub id: i64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub condition: Option<String>,
    pub text: String,
    pub drinks: Vec<String>,
}

impl RecommendationRule {
    /// Inclusive on both ends; condition compared case-insensitively.
    pub fn matches(&self, temp: f64, condition: Option<&str>) -> bool {
        if !temp.is_finite() || temp < self.min_temp || temp > self.max_temp {
            return false;
        }
        match (&self.condition, condition) {
            (None, _) => true,
            (Some(expected), Some(observed)) => {
                expected.trim().to_lowercase() == observed.trim().to_lowercase()
            }
            (Some(_), None) => false,
        }
    }
}

/// First matching rule in id order.
pub fn first_match<'a>(
    rules: &'a [RecommendationRule],
    temp: f64,
    condition: Option<&str>,
) -> Option<&'a RecommendationRule> {
    let mut sorted: Vec<&RecommendationRule> = rules.iter().collect();
    sorted.sort_by_key(|r| r.id);
    sorted.into_iter().find(|r| r.matches(temp, condition))
}
