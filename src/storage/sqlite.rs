//! SQLite storage backend for careerlens

use super::traits::{
    InsightStore, OnboardingStore, OpenStore, ProfileStore, StorageError, StorageResult,
    StoreTransaction,
};
use crate::model::{
    ExternalId, IndustryInsight, InsightId, InsightWrite, NewInsight, ProfileFields, UserId,
    UserProfile,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// How long a writer waits for another connection's write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const PROFILE_COLUMNS: &str =
    "id, external_id, industry, experience, bio, skills_json, created_at, updated_at";

const INSIGHT_COLUMNS: &str = "id, industry, content_json, created_at, next_update";

/// Raw `users` row, in `PROFILE_COLUMNS` order
type ProfileRow = (
    String,
    String,
    Option<String>,
    Option<u32>,
    Option<String>,
    String,
    String,
    String,
);

/// Raw `industry_insights` row, in `INSIGHT_COLUMNS` order
type InsightRow = (String, String, String, String, String);

/// SQLite-backed onboarding store
///
/// Uses a single SQLite database file with tables for users and industry
/// insights. Thread-safe via internal mutex on the connection; several
/// stores (or processes) may open the same file, in which case the
/// `UNIQUE(industry)` constraint arbitrates concurrent insight creation.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            r#"
            -- Profiles, one per identity-provider account
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                external_id TEXT NOT NULL UNIQUE,
                industry TEXT,
                experience INTEGER,
                bio TEXT,
                skills_json TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_users_industry ON users(industry);

            -- Insights; users.industry refers here by value only
            CREATE TABLE IF NOT EXISTS industry_insights (
                id TEXT PRIMARY KEY,
                industry TEXT NOT NULL UNIQUE,
                content_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                next_update TEXT NOT NULL
            );

            -- WAL lets readers proceed while a writer holds the lock
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(e.to_string()))
}

fn read_profile_row(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn row_to_profile(row: ProfileRow) -> StorageResult<UserProfile> {
    let (id, external_id, industry, experience, bio, skills_json, created_at, updated_at) = row;
    let skills: BTreeSet<String> = serde_json::from_str(&skills_json)?;

    Ok(UserProfile {
        id: UserId::from_string(id),
        external_id: ExternalId::new(external_id),
        industry,
        experience,
        bio,
        skills,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn read_insight_row(row: &Row<'_>) -> rusqlite::Result<InsightRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn row_to_insight(row: InsightRow) -> StorageResult<IndustryInsight> {
    let (id, industry, content_json, created_at, next_update) = row;

    Ok(IndustryInsight {
        id: InsightId::from_string(id),
        industry,
        content: serde_json::from_str(&content_json)?,
        created_at: parse_timestamp(&created_at)?,
        next_update: parse_timestamp(&next_update)?,
    })
}

fn query_insight(conn: &Connection, industry: &str) -> StorageResult<Option<IndustryInsight>> {
    let sql = format!("SELECT {INSIGHT_COLUMNS} FROM industry_insights WHERE industry = ?1");
    conn.query_row(&sql, params![industry], read_insight_row)
        .optional()?
        .map(row_to_insight)
        .transpose()
}

fn query_profile_by_external(
    conn: &Connection,
    external_id: &ExternalId,
) -> StorageResult<Option<UserProfile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE external_id = ?1");
    conn.query_row(&sql, params![external_id.as_str()], read_profile_row)
        .optional()?
        .map(row_to_profile)
        .transpose()
}

fn query_profile_by_id(conn: &Connection, user_id: &UserId) -> StorageResult<Option<UserProfile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, params![user_id.as_str()], read_profile_row)
        .optional()?
        .map(row_to_profile)
        .transpose()
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl InsightStore for SqliteStore {
    fn find_insight(&self, industry: &str) -> StorageResult<Option<IndustryInsight>> {
        let conn = self.lock()?;
        query_insight(&conn, industry)
    }

    fn list_insights(&self) -> StorageResult<Vec<IndustryInsight>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {INSIGHT_COLUMNS} FROM industry_insights ORDER BY industry");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], read_insight_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(row_to_insight).collect()
    }
}

impl ProfileStore for SqliteStore {
    fn find_profile(&self, external_id: &ExternalId) -> StorageResult<Option<UserProfile>> {
        let conn = self.lock()?;
        query_profile_by_external(&conn, external_id)
    }

    fn ensure_profile(
        &self,
        external_id: &ExternalId,
        now: DateTime<Utc>,
    ) -> StorageResult<UserProfile> {
        let conn = self.lock()?;
        let profile = UserProfile::new(external_id.clone(), now);

        conn.execute(
            r#"
            INSERT INTO users (id, external_id, skills_json, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(external_id) DO NOTHING
            "#,
            params![
                profile.id.as_str(),
                profile.external_id.as_str(),
                serde_json::to_string(&profile.skills)?,
                profile.created_at.to_rfc3339(),
                profile.updated_at.to_rfc3339(),
            ],
        )?;

        query_profile_by_external(&conn, external_id)?
            .ok_or_else(|| StorageError::ProfileNotFound(external_id.to_string()))
    }
}

impl OnboardingStore for SqliteStore {
    fn begin(&self) -> StorageResult<Box<dyn StoreTransaction + '_>> {
        let tx = SqliteTransaction::begin(self.lock()?)?;
        Ok(Box::new(tx))
    }
}

/// An open `BEGIN IMMEDIATE` transaction holding the store's connection.
///
/// Rolls back on drop unless committed.
struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl<'a> SqliteTransaction<'a> {
    fn begin(conn: MutexGuard<'a, Connection>) -> StorageResult<Self> {
        // IMMEDIATE takes the write lock now, so two writers never
        // deadlock trying to upgrade shared locks at commit time.
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Self {
            conn,
            finished: false,
        })
    }
}

impl StoreTransaction for SqliteTransaction<'_> {
    fn find_insight(&mut self, industry: &str) -> StorageResult<Option<IndustryInsight>> {
        query_insight(&self.conn, industry)
    }

    fn create_insight_if_absent(&mut self, insight: NewInsight) -> StorageResult<InsightWrite> {
        let record = insight.into_insight();
        let inserted = self.conn.execute(
            r#"
            INSERT INTO industry_insights (id, industry, content_json, created_at, next_update)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(industry) DO NOTHING
            "#,
            params![
                record.id.as_str(),
                record.industry,
                serde_json::to_string(&record.content)?,
                record.created_at.to_rfc3339(),
                record.next_update.to_rfc3339(),
            ],
        )?;

        if inserted == 1 {
            return Ok(InsightWrite {
                insight: record,
                created: true,
            });
        }

        let existing = query_insight(&self.conn, &record.industry)?
            .ok_or_else(|| StorageError::InsightNotFound(record.industry.clone()))?;
        Ok(InsightWrite {
            insight: existing,
            created: false,
        })
    }

    fn update_profile(
        &mut self,
        user_id: &UserId,
        fields: &ProfileFields,
        now: DateTime<Utc>,
    ) -> StorageResult<UserProfile> {
        let updated = self.conn.execute(
            r#"
            UPDATE users
            SET industry = ?1, experience = ?2, bio = ?3, skills_json = ?4, updated_at = ?5
            WHERE id = ?6
            "#,
            params![
                fields.industry,
                fields.experience,
                fields.bio,
                serde_json::to_string(&fields.skills)?,
                now.to_rfc3339(),
                user_id.as_str(),
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::ProfileNotFound(user_id.to_string()));
        }

        query_profile_by_id(&self.conn, user_id)?
            .ok_or_else(|| StorageError::ProfileNotFound(user_id.to_string()))
    }

    fn commit(mut self: Box<Self>) -> StorageResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!(error = %e, "rollback failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InsightContent, ProfileUpdate};
    use chrono::TimeZone;
    use serde_json::json;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    fn draft(industry: &str, marker: &str) -> NewInsight {
        let content = InsightContent::from_value(json!({ "marker": marker })).unwrap();
        NewInsight::new(industry, content, test_time())
    }

    fn fields(industry: &str) -> ProfileFields {
        ProfileUpdate::new(industry, 4)
            .with_bio("Nurse")
            .with_skill("CPR")
            .with_skill("Triage")
            .validate()
            .unwrap()
    }

    #[test]
    fn test_ensure_profile_is_idempotent() {
        let store = create_test_store();
        let ext = ExternalId::from("user_abc");

        let first = store.ensure_profile(&ext, test_time()).unwrap();
        let second = store.ensure_profile(&ext, Utc::now()).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.created_at, test_time());
        assert!(!second.is_onboarded());
    }

    #[test]
    fn test_find_missing_profile_returns_none() {
        let store = create_test_store();
        assert!(store.find_profile(&ExternalId::from("nobody")).unwrap().is_none());
    }

    #[test]
    fn test_update_profile_round_trips_fields() {
        let store = create_test_store();
        let profile = store
            .ensure_profile(&ExternalId::from("user_abc"), test_time())
            .unwrap();

        let later = test_time() + chrono::Duration::hours(1);
        let mut tx = store.begin().unwrap();
        let updated = tx.update_profile(&profile.id, &fields("Healthcare"), later).unwrap();
        tx.commit().unwrap();

        assert_eq!(updated.industry.as_deref(), Some("Healthcare"));
        assert_eq!(updated.experience, Some(4));
        assert_eq!(updated.bio.as_deref(), Some("Nurse"));
        assert_eq!(updated.skills.len(), 2);
        assert_eq!(updated.updated_at, later);

        let loaded = store.find_profile(&profile.external_id).unwrap().unwrap();
        assert_eq!(loaded, updated);
    }

    #[test]
    fn test_update_unknown_profile_fails() {
        let store = create_test_store();
        let mut tx = store.begin().unwrap();
        let err = tx
            .update_profile(&UserId::new(), &fields("Finance"), test_time())
            .unwrap_err();
        assert!(matches!(err, StorageError::ProfileNotFound(_)));
    }

    #[test]
    fn test_create_if_absent_keeps_first_record() {
        let store = create_test_store();

        let mut tx = store.begin().unwrap();
        let first = tx.create_insight_if_absent(draft("Healthcare", "first")).unwrap();
        let second = tx.create_insight_if_absent(draft("Healthcare", "second")).unwrap();
        tx.commit().unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(second.insight, first.insight);
        assert_eq!(second.insight.content.get("marker"), Some(&json!("first")));
        assert_eq!(store.list_insights().unwrap().len(), 1);
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let store = create_test_store();
        let profile = store
            .ensure_profile(&ExternalId::from("user_abc"), test_time())
            .unwrap();

        {
            let mut tx = store.begin().unwrap();
            tx.create_insight_if_absent(draft("Healthcare", "dropped")).unwrap();
            tx.update_profile(&profile.id, &fields("Healthcare"), test_time()).unwrap();
        }

        assert!(store.find_insight("Healthcare").unwrap().is_none());
        let loaded = store.find_profile(&profile.external_id).unwrap().unwrap();
        assert_eq!(loaded, profile);

        // Connection is usable again after the rollback
        let mut tx = store.begin().unwrap();
        assert!(tx.find_insight("Healthcare").unwrap().is_none());
        tx.commit().unwrap();
    }

    #[test]
    fn test_list_insights_ordered_by_industry() {
        let store = create_test_store();
        let mut tx = store.begin().unwrap();
        tx.create_insight_if_absent(draft("Retail", "r")).unwrap();
        tx.create_insight_if_absent(draft("Finance", "f")).unwrap();
        tx.commit().unwrap();

        let industries: Vec<_> = store
            .list_insights()
            .unwrap()
            .into_iter()
            .map(|i| i.industry)
            .collect();
        assert_eq!(industries, vec!["Finance", "Retail"]);
    }

    #[test]
    fn test_insight_timestamps_persist() {
        let store = create_test_store();
        let mut tx = store.begin().unwrap();
        let written = tx.create_insight_if_absent(draft("Finance", "f")).unwrap();
        tx.commit().unwrap();

        let loaded = store.find_insight("Finance").unwrap().unwrap();
        assert_eq!(loaded, written.insight);
        assert_eq!((loaded.next_update - loaded.created_at).num_seconds(), 604_800);
    }

    #[test]
    fn test_wal_mode_enabled_at_connection() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test-wal.db");
        let store = SqliteStore::open(&db_path).unwrap();

        let journal_mode: String = store
            .conn
            .lock()
            .unwrap()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();

        assert_eq!(journal_mode, "wal");
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested/deeper/careerlens.db");
        SqliteStore::open(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_second_handle_sees_winning_insight() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("shared.db");

        let store_a = SqliteStore::open(&db_path).unwrap();
        let store_b = SqliteStore::open(&db_path).unwrap();

        let mut tx_a = store_a.begin().unwrap();
        let winner = tx_a.create_insight_if_absent(draft("Healthcare", "a")).unwrap();
        tx_a.commit().unwrap();

        let mut tx_b = store_b.begin().unwrap();
        let loser = tx_b.create_insight_if_absent(draft("Healthcare", "b")).unwrap();
        tx_b.commit().unwrap();

        assert!(winner.created);
        assert!(!loser.created);
        assert_eq!(loser.insight.id, winner.insight.id);
        assert_eq!(store_b.list_insights().unwrap().len(), 1);
    }

    #[test]
    fn test_reads_proceed_during_open_write() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("concurrent.db");

        let store_a = SqliteStore::open(&db_path).unwrap();
        let store_b = SqliteStore::open(&db_path).unwrap();
        let ext = ExternalId::from("user_abc");
        store_a.ensure_profile(&ext, test_time()).unwrap();

        let mut tx = store_a.begin().unwrap();
        tx.create_insight_if_absent(draft("Healthcare", "a")).unwrap();

        // Uncommitted writes are invisible to the other handle
        assert!(store_b.find_insight("Healthcare").unwrap().is_none());
        assert!(store_b.find_profile(&ext).unwrap().is_some());

        tx.commit().unwrap();
        assert!(store_b.find_insight("Healthcare").unwrap().is_some());
    }
}
