//! SQLite-backed drink catalogue and recommendation rules.
//!
//! `SqliteDrinkStore` is the local implementation of `DrinkRepository`. The
//! catalogue is read-mostly: it is written once on first run (or on reseed)
//! and otherwise only queried in one of the two level orders.

use std::path::Path;

use cafe_core::{AppError, DatabaseError, RusqliteErrorExt};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use thiserror::Error;

use crate::drink::{Drink, NewDrink, TemperatureLevel};
use crate::policy::SortOrder;
use crate::rules::{NewRule, RecommendationRule};

/// Errors from the catalogue store.
///
/// A failed query is always reported as an error, never as an empty list.
#[derive(Debug, Error)]
pub enum DrinkStoreError {
    /// Database error (open, query, constraint, bad row).
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The blocking task running the query did not complete.
    #[error("Store task failed: {0}")]
    Unavailable(String),
}

pub type DrinkStoreResult<T> = Result<T, DrinkStoreError>;

impl From<DrinkStoreError> for AppError {
    fn from(err: DrinkStoreError) -> Self {
        match err {
            DrinkStoreError::Storage(e) => AppError::Database(e.into_database_error()),
            DrinkStoreError::Unavailable(msg) => {
                AppError::Database(DatabaseError::Unavailable(msg))
            }
        }
    }
}

/// Catalogue operations.
///
/// Implementations don't need to be Sync; `DrinkClient` serializes access
/// through a mutex.
pub trait DrinkRepository: Send {
    /// Insert all drinks in one transaction. A name that already exists is
    /// replaced in place.
    fn insert_all(&self, drinks: &[NewDrink]) -> DrinkStoreResult<usize>;

    /// Insert `drinks` only if the table is empty. Returns how many rows were
    /// written (0 when already seeded).
    fn seed_if_empty(&self, drinks: &[NewDrink]) -> DrinkStoreResult<usize>;

    /// Cold first; equal levels in insertion order.
    fn list_ascending(&self) -> DrinkStoreResult<Vec<Drink>>;

    /// Hot first; equal levels in insertion order.
    fn list_descending(&self) -> DrinkStoreResult<Vec<Drink>>;

    fn clear_all(&self) -> DrinkStoreResult<()>;

    /// Clear and insert in a single transaction.
    fn reseed(&self, drinks: &[NewDrink]) -> DrinkStoreResult<usize>;

    fn count(&self) -> DrinkStoreResult<usize>;

    fn list(&self, order: SortOrder) -> DrinkStoreResult<Vec<Drink>> {
        match order {
            SortOrder::ColdFirst => self.list_ascending(),
            SortOrder::HotFirst => self.list_descending(),
        }
    }
}

/// SQLite-based drink storage.
pub struct SqliteDrinkStore {
    conn: Connection,
}

impl SqliteDrinkStore {
    /// Open (or create) the store at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> DrinkStoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> DrinkStoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create the schema, migrating a legacy catalogue in the same
    /// transaction so a failure leaves the old table untouched.
    fn init_schema(&self) -> DrinkStoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let legacy = Self::take_legacy_rows(&tx)?;

        tx.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS drinks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                temperature_level INTEGER NOT NULL CHECK (temperature_level IN (0, 1, 2))
            );

            CREATE INDEX IF NOT EXISTS idx_drinks_level ON drinks(temperature_level, id);

            CREATE TABLE IF NOT EXISTS recommendations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                min_temp REAL NOT NULL,
                max_temp REAL NOT NULL,
                condition TEXT NULL,
                recommendation_text TEXT NOT NULL,
                drinks TEXT NOT NULL DEFAULT '[]',
                CHECK (min_temp <= max_temp)
            );
            "#,
        )?;

        let migrated = match legacy {
            Some(drinks) => Some(Self::insert_in(&tx, &drinks)?),
            None => None,
        };
        tx.commit()?;

        if let Some(inserted) = migrated {
            tracing::info!("Migrated {} drinks from category strings to levels", inserted);
        }
        Ok(())
    }

    /// Older databases stored the level as a `category` string. Reads those
    /// rows and drops the table so it can be recreated with ordinals.
    fn take_legacy_rows(conn: &Connection) -> DrinkStoreResult<Option<Vec<NewDrink>>> {
        let columns: Vec<String> = conn
            .prepare("PRAGMA table_info(drinks)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;

        if columns.is_empty() || !columns.iter().any(|c| c == "category") {
            return Ok(None);
        }

        let rows: Vec<(String, String)> = conn
            .prepare("SELECT name, category FROM drinks ORDER BY id ASC")?
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut drinks = Vec::with_capacity(rows.len());
        for (name, category) in rows {
            match category.parse::<TemperatureLevel>() {
                Ok(level) => drinks.push(NewDrink::new(name, level)),
                Err(e) => tracing::warn!("Skipping legacy drink '{}': {}", name, e),
            }
        }

        conn.execute_batch("DROP TABLE drinks;")?;
        Ok(Some(drinks))
    }

    fn row_to_drink(row: &rusqlite::Row) -> rusqlite::Result<Drink> {
        let id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        let ordinal: i64 = row.get(2)?;

        let level = TemperatureLevel::from_ordinal(ordinal).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                Type::Integer,
                format!("temperature level out of range: {}", ordinal).into(),
            )
        })?;

        Ok(Drink { id, name, level })
    }

    fn row_to_rule(row: &rusqlite::Row) -> rusqlite::Result<RecommendationRule> {
        let drinks_json: String = row.get(5)?;
        let drinks: Vec<String> = serde_json::from_str(&drinks_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        Ok(RecommendationRule {
            id: row.get(0)?,
            min_temp: row.get(1)?,
            max_temp: row.get(2)?,
            condition: row.get(3)?,
            text: row.get(4)?,
            drinks,
        })
    }

    fn insert_in(tx: &Transaction<'_>, drinks: &[NewDrink]) -> rusqlite::Result<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO drinks (name, temperature_level) VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET temperature_level = excluded.temperature_level
            "#,
        )?;
        let mut written = 0;
        for drink in drinks {
            written += stmt.execute(params![drink.name, drink.level.ordinal()])?;
        }
        Ok(written)
    }

    fn count_in(conn: &Connection, table: &str) -> rusqlite::Result<usize> {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn query_drinks(&self, sql: &str) -> DrinkStoreResult<Vec<Drink>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], Self::row_to_drink)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Look up a drink by exact name.
    pub fn get_by_name(&self, name: &str) -> DrinkStoreResult<Option<Drink>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, temperature_level FROM drinks WHERE name = ?1",
                params![name],
                Self::row_to_drink,
            )
            .optional()?)
    }

    /// Insert rules in one transaction, keeping their order as id order.
    pub fn insert_rules(&self, rules: &[NewRule]) -> DrinkStoreResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let written = Self::insert_rules_in(&tx, rules)?;
        tx.commit()?;
        Ok(written)
    }

    fn insert_rules_in(tx: &Transaction<'_>, rules: &[NewRule]) -> DrinkStoreResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO recommendations (min_temp, max_temp, condition, recommendation_text, drinks)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;
        let mut written = 0;
        for rule in rules {
            let drinks = serde_json::to_string(&rule.drinks).map_err(|e| {
                rusqlite::Error::ToSqlConversionFailure(Box::new(e))
            })?;
            let condition = rule.condition.as_deref().map(fold_condition);
            written += stmt.execute(params![
                rule.min_temp,
                rule.max_temp,
                condition,
                rule.text,
                drinks
            ])?;
        }
        Ok(written)
    }

    pub fn seed_rules_if_empty(&self, rules: &[NewRule]) -> DrinkStoreResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        if Self::count_in(&tx, "recommendations")? > 0 {
            return Ok(0);
        }
        let written = Self::insert_rules_in(&tx, rules)?;
        tx.commit()?;
        tracing::info!("Seeded {} recommendation rules", written);
        Ok(written)
    }

    pub fn list_rules(&self) -> DrinkStoreResult<Vec<RecommendationRule>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, min_temp, max_temp, condition, recommendation_text, drinks
             FROM recommendations ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], Self::row_to_rule)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// First rule (by id) whose range contains `temp` and whose condition is
    /// either unset or equal to `condition` ignoring case. Conditions are
    /// stored folded, so the comparison in SQL is exact.
    pub fn find_rule(
        &self,
        temp: f64,
        condition: Option<&str>,
    ) -> DrinkStoreResult<Option<RecommendationRule>> {
        if !temp.is_finite() {
            return Ok(None);
        }
        let condition = condition.map(fold_condition).filter(|c| !c.is_empty());

        Ok(self
            .conn
            .query_row(
                "SELECT id, min_temp, max_temp, condition, recommendation_text, drinks
                 FROM recommendations
                 WHERE ?1 BETWEEN min_temp AND max_temp
                   AND (condition IS NULL OR condition = ?2)
                 ORDER BY id ASC
                 LIMIT 1",
                params![temp, condition],
                Self::row_to_rule,
            )
            .optional()?)
    }
}

/// SQLite's NOCASE only folds ASCII; descriptions may be Cyrillic.
fn fold_condition(condition: &str) -> String {
    condition.trim().to_lowercase()
}

impl DrinkRepository for SqliteDrinkStore {
    fn insert_all(&self, drinks: &[NewDrink]) -> DrinkStoreResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let written = Self::insert_in(&tx, drinks)?;
        tx.commit()?;
        tracing::debug!("Inserted {} drinks", written);
        Ok(written)
    }

    fn seed_if_empty(&self, drinks: &[NewDrink]) -> DrinkStoreResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        if Self::count_in(&tx, "drinks")? > 0 {
            tracing::debug!("Catalogue already seeded");
            return Ok(0);
        }
        let written = Self::insert_in(&tx, drinks)?;
        tx.commit()?;
        tracing::info!("Seeded catalogue with {} drinks", written);
        Ok(written)
    }

    fn list_ascending(&self) -> DrinkStoreResult<Vec<Drink>> {
        self.query_drinks(
            "SELECT id, name, temperature_level FROM drinks
             ORDER BY temperature_level ASC, id ASC",
        )
    }

    fn list_descending(&self) -> DrinkStoreResult<Vec<Drink>> {
        self.query_drinks(
            "SELECT id, name, temperature_level FROM drinks
             ORDER BY temperature_level DESC, id ASC",
        )
    }

    fn clear_all(&self) -> DrinkStoreResult<()> {
        let removed = self.conn.execute("DELETE FROM drinks", [])?;
        tracing::debug!("Cleared {} drinks", removed);
        Ok(())
    }

    fn reseed(&self, drinks: &[NewDrink]) -> DrinkStoreResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM drinks", [])?;
        let written = Self::insert_in(&tx, drinks)?;
        tx.commit()?;
        tracing::info!("Reseeded catalogue with {} drinks", written);
        Ok(written)
    }

    fn count(&self) -> DrinkStoreResult<usize> {
        Ok(Self::count_in(&self.conn, "drinks")?)
    }
}
