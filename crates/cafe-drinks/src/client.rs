//! Async access to the drink store.
//!
//! SQLite work runs on the blocking pool; the store sits behind a mutex so
//! one `DrinkClient` can be cloned freely across tasks.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::drink::Drink;
use crate::policy::{Advice, Recommendation, SortOrder, ThresholdPolicy};
use crate::rules::RecommendationRule;
use crate::seed::{default_catalogue, default_rules};
use crate::store::{DrinkRepository, DrinkStoreError, DrinkStoreResult, SqliteDrinkStore};

#[derive(Clone)]
pub struct DrinkClient {
    store: Arc<Mutex<SqliteDrinkStore>>,
    seeded: Arc<OnceCell<()>>,
}

impl DrinkClient {
    pub fn new(store: SqliteDrinkStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            seeded: Arc::new(OnceCell::new()),
        }
    }

    /// Open the on-disk store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> DrinkStoreResult<Self> {
        Ok(Self::new(SqliteDrinkStore::new(path)?))
    }

    async fn run<T, F>(&self, f: F) -> DrinkStoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteDrinkStore) -> DrinkStoreResult<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(&store.lock()))
            .await
            .map_err(|e| DrinkStoreError::Unavailable(e.to_string()))?
    }

    /// Seed the catalogue and rules once per client. Concurrent callers wait
    /// for the same seeding run; a failed run is retried by the next caller.
    pub async fn ensure_seeded(&self) -> DrinkStoreResult<()> {
        self.seeded
            .get_or_try_init(|| async {
                self.run(|store| {
                    store.seed_if_empty(&default_catalogue())?;
                    store.seed_rules_if_empty(&default_rules())?;
                    Ok(())
                })
                .await
            })
            .await
            .map(|_| ())
    }

    pub async fn list(&self, order: SortOrder) -> DrinkStoreResult<Vec<Drink>> {
        self.ensure_seeded().await?;
        self.run(move |store| store.list(order)).await
    }

    pub async fn count(&self) -> DrinkStoreResult<usize> {
        self.ensure_seeded().await?;
        self.run(|store| store.count()).await
    }

    /// Replace the catalogue with the default drinks.
    pub async fn reseed(&self) -> DrinkStoreResult<usize> {
        self.run(|store| store.reseed(&default_catalogue())).await
    }

    pub async fn find_rule(
        &self,
        temp: f64,
        condition: Option<String>,
    ) -> DrinkStoreResult<Option<RecommendationRule>> {
        self.ensure_seeded().await?;
        self.run(move |store| store.find_rule(temp, condition.as_deref()))
            .await
    }

    /// Order the catalogue for `temperature` and attach the matching rule's
    /// advice (or the fallback). A missing reading still lists every drink.
    pub async fn recommend(
        &self,
        policy: ThresholdPolicy,
        temperature: Option<f64>,
        condition: Option<String>,
    ) -> DrinkStoreResult<Recommendation> {
        self.ensure_seeded().await?;
        let order = policy.order_for(temperature);

        self.run(move |store| {
            let drinks = store.list(order)?;
            let rule = match temperature {
                Some(t) => store.find_rule(t, condition.as_deref())?,
                None => None,
            };
            let advice = rule.map(Advice::from_rule).unwrap_or_else(|| Advice::fallback(order));

            tracing::debug!(
                "Recommendation for {:?}: {:?}, {} drinks, rule {:?}",
                temperature,
                order,
                drinks.len(),
                advice.rule_id
            );
            Ok(Recommendation {
                order,
                drinks,
                advice,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::drink::TemperatureLevel;

    fn client() -> DrinkClient {
        DrinkClient::new(SqliteDrinkStore::in_memory().expect("in-memory store"))
    }

    #[tokio::test]
    async fn test_list_seeds_on_first_use() {
        let client = client();
        let drinks = client.list(SortOrder::ColdFirst).await.unwrap();
        assert_eq!(drinks.len(), 25);
        assert_eq!(drinks[0].level, TemperatureLevel::Cold);
        assert_eq!(drinks[24].level, TemperatureLevel::Hot);
    }

    #[tokio::test]
    async fn test_concurrent_seeding_runs_once() {
        let client = client();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = client.clone();
                tokio::spawn(async move { c.count().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 25);
        }
    }

    #[tokio::test]
    async fn test_recommend_cold_reading() {
        let client = client();
        let rec = client
            .recommend(ThresholdPolicy::default(), Some(5.0), Some("snow".into()))
            .await
            .unwrap();

        assert_eq!(rec.order, SortOrder::HotFirst);
        assert_eq!(rec.drinks[0].level, TemperatureLevel::Hot);
        assert!(rec.advice.featured.contains(&"Hot chocolate".to_string()));
        assert!(rec.advice.rule_id.is_some());
    }

    #[tokio::test]
    async fn test_recommend_without_reading_uses_fallback() {
        let client = client();
        let rec = client
            .recommend(ThresholdPolicy::default(), None, None)
            .await
            .unwrap();

        assert_eq!(rec.order, SortOrder::ColdFirst);
        assert_eq!(rec.drinks.len(), 25);
        assert_eq!(rec.advice, Advice::fallback(SortOrder::ColdFirst));
    }

    #[tokio::test]
    async fn test_recommend_out_of_range_uses_fallback() {
        let client = client();
        let rec = client
            .recommend(ThresholdPolicy::default(), Some(-80.0), None)
            .await
            .unwrap();

        assert_eq!(rec.order, SortOrder::HotFirst);
        assert_eq!(rec.advice.rule_id, None);
        assert!(!rec.advice.featured.is_empty());
    }
}
