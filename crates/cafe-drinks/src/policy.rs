//! Recommendation policy.
//!
//! The threshold sort decides the order of the whole catalogue. Range rules
//! only add a line of text and a few featured drinks on top of it.

use cafe_core::DefaultsConfig;
use serde::{Deserialize, Serialize};

use crate::drink::Drink;
use crate::rules::RecommendationRule;

/// Readings strictly below this are "cold outside".
pub const DEFAULT_COLD_THRESHOLD: f64 = 10.0;

/// Catalogue order by temperature level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Level ascending: cold, warm, hot
    #[default]
    ColdFirst,
    /// Level descending: hot, warm, cold
    HotFirst,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    threshold: f64,
}

impl ThresholdPolicy {
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_finite() {
            threshold
        } else {
            tracing::warn!("Non-finite cold threshold {}, using default", threshold);
            DEFAULT_COLD_THRESHOLD
        };
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Hot drinks first below the threshold. No reading (or NaN) keeps the
    /// default cold-first order.
    pub fn order_for(&self, temperature: Option<f64>) -> SortOrder {
        match temperature {
            Some(t) if t.is_finite() && t < self.threshold => SortOrder::HotFirst,
            _ => SortOrder::ColdFirst,
        }
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COLD_THRESHOLD)
    }
}

impl From<&DefaultsConfig> for ThresholdPolicy {
    fn from(config: &DefaultsConfig) -> Self {
        Self::new(config.cold_threshold_celsius)
    }
}

/// Text and featured drinks for the current reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub text: String,
    pub featured: Vec<String>,
    /// Id of the rule that produced this, `None` for the fallback
    pub rule_id: Option<i64>,
}

impl Advice {
    pub fn from_rule(rule: RecommendationRule) -> Self {
        Self {
            text: rule.text,
            featured: rule.drinks,
            rule_id: Some(rule.id),
        }
    }

    /// Used when no rule covers the reading.
    pub fn fallback(order: SortOrder) -> Self {
        let (text, featured): (&str, &[&str]) = match order {
            SortOrder::HotFirst => ("Chilly out: any hot drink will do.", &["Americano", "Black tea"]),
            SortOrder::ColdFirst => (
                "Pick anything you like from the list.",
                &["Still water", "Lemonade"],
            ),
        };
        Self {
            text: text.to_string(),
            featured: featured.iter().map(|d| d.to_string()).collect(),
            rule_id: None,
        }
    }
}

/// Ordered catalogue plus advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub order: SortOrder,
    pub drinks: Vec<Drink>,
    pub advice: Advice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_is_hot_first() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.order_for(Some(5.0)), SortOrder::HotFirst);
        assert_eq!(policy.order_for(Some(9.99)), SortOrder::HotFirst);
        assert_eq!(policy.order_for(Some(-30.0)), SortOrder::HotFirst);
    }

    #[test]
    fn test_threshold_itself_is_cold_first() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.order_for(Some(10.0)), SortOrder::ColdFirst);
        assert_eq!(policy.order_for(Some(22.5)), SortOrder::ColdFirst);
    }

    #[test]
    fn test_no_reading_is_default_order() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.order_for(None), SortOrder::ColdFirst);
        assert_eq!(policy.order_for(Some(f64::NAN)), SortOrder::ColdFirst);
        assert_eq!(policy.order_for(None), SortOrder::default());
    }

    #[test]
    fn test_custom_threshold() {
        let policy = ThresholdPolicy::new(0.0);
        assert_eq!(policy.order_for(Some(5.0)), SortOrder::ColdFirst);
        assert_eq!(policy.order_for(Some(-0.5)), SortOrder::HotFirst);
        assert_eq!(ThresholdPolicy::new(f64::NAN).threshold(), DEFAULT_COLD_THRESHOLD);
    }

    #[test]
    fn test_fallback_never_empty() {
        for order in [SortOrder::ColdFirst, SortOrder::HotFirst] {
            let advice = Advice::fallback(order);
            assert!(!advice.text.is_empty());
            assert!(!advice.featured.is_empty());
            assert_eq!(advice.rule_id, None);
        }
    }
}
