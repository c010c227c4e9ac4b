use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{res, tags::{Extracted, QueryMode}, AppResult};

/// A registered delivery target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEntry {
    pub key: String,
    pub name: String,
    pub url: String,

    // unique: key
}

impl RoomEntry {
    pub fn new(key: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            url: url.into(),
        }
    }
}

/// One indexed message. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub id: Uuid,
    pub sender_id: String,
    pub userbase_id: String,
    pub room_id: String,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub created_at: OffsetDateTime,
    pub message: String,
}

impl TagRecord {
    pub fn new(
        sender_id: &str,
        (userbase_id, room_id): (&str, &str),
        Extracted { tags, keywords }: Extracted,
        message: &str,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            sender_id: sender_id.to_owned(),
            userbase_id: userbase_id.to_owned(),
            room_id: room_id.to_owned(),
            tags,
            keywords,
            created_at: OffsetDateTime::now_utc(),
            message: message.to_owned(),
        }
    }
}

/// Which stored records a search may see.
#[derive(Debug, Clone, Copy)]
pub struct RecordFilter<'a> {
    pub userbase_id: &'a str,
    pub room_id: &'a str,
    /// Restrict to one author.
    pub sender_id: Option<&'a str>,
}

const RECORD_TERMS: &str = "SELECT value FROM json_each(tag_records.tags) \
     UNION SELECT value FROM json_each(tag_records.keywords)";

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn connect(url: &str, timeout: Duration) -> AppResult<Store> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(timeout);

        // every connection to an in-memory database is a fresh database
        let in_memory = url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .acquire_timeout(timeout)
            .idle_timeout(if in_memory { None } else { Some(Duration::from_secs(600)) })
            .max_lifetime(if in_memory { None } else { Some(Duration::from_secs(1800)) })
            .connect_with(options)
            .await?;

        let store = Store { pool };
        store.migrate().await?;
        info!(url, "connected to store");
        Ok(store)
    }

    pub async fn memory() -> AppResult<Store> {
        Self::connect("sqlite::memory:", Duration::from_secs(5)).await
    }

    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::raw_sql(res::SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Inserts the room, or updates its url (and name, when one is given) if the key exists.
    pub async fn upsert_room(
        &self,
        entry: &RoomEntry,
        userbase_id: &str,
        room_id: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO rooms (room_key,room_url,room_name,userbase_id,room_id)
             VALUES (?1,?2,?3,?4,?5)
             ON CONFLICT(room_key) DO UPDATE SET
                room_url=excluded.room_url,
                room_name=CASE WHEN excluded.room_name='' THEN rooms.room_name
                    ELSE excluded.room_name END,
                userbase_id=excluded.userbase_id,
                room_id=excluded.room_id",
        )
        .bind(&entry.key)
        .bind(&entry.url)
        .bind(&entry.name)
        .bind(userbase_id)
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn query_rooms(&self) -> AppResult<Vec<RoomEntry>> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT room_key,room_url,room_name FROM rooms")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(key, url, name)| RoomEntry { key, name, url })
            .collect())
    }

    pub async fn insert_tag_record(&self, record: &TagRecord) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO tag_records
             (id,sender_id,userbase_id,room_id,tags,keywords,created_at,message)
             VALUES (?,?,?,?,?,?,?,?)",
        )
        .bind(record.id.to_string())
        .bind(&record.sender_id)
        .bind(&record.userbase_id)
        .bind(&record.room_id)
        .bind(serde_json::to_string(&record.tags)?)
        .bind(serde_json::to_string(&record.keywords)?)
        .bind(to_millis(record.created_at))
        .bind(&record.message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Newest first. `Any` needs one shared term, `All` needs every term present
    /// among the record's tags and keywords.
    pub async fn query_tag_records(
        &self,
        filter: RecordFilter<'_>,
        terms: &[String],
        mode: QueryMode,
        limit: usize,
    ) -> AppResult<Vec<(OffsetDateTime, String)>> {
        let matcher = match mode {
            QueryMode::Any => format!(
                "EXISTS (SELECT 1 FROM json_each(?3) AS q WHERE q.value IN ({RECORD_TERMS}))"
            ),
            QueryMode::All => format!(
                "NOT EXISTS (SELECT 1 FROM json_each(?3) AS q \
                 WHERE q.value NOT IN ({RECORD_TERMS}))"
            ),
        };
        let sender = if filter.sender_id.is_some() { " AND sender_id=?5" } else { "" };
        let sql = format!(
            "SELECT created_at,message FROM tag_records
             WHERE userbase_id=?1 AND room_id=?2 AND {matcher}{sender}
             ORDER BY created_at DESC, rowid DESC LIMIT ?4"
        );

        let mut query = sqlx::query_as::<_, (i64, String)>(&sql)
            .bind(filter.userbase_id)
            .bind(filter.room_id)
            .bind(serde_json::to_string(terms)?)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX));
        if let Some(sender_id) = filter.sender_id {
            query = query.bind(sender_id);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|(ms, message)| from_millis(ms).map(|ts| (ts, message)))
            .collect()
    }
}

fn to_millis(ts: OffsetDateTime) -> i64 {
    (ts.unix_timestamp_nanos() / 1_000_000) as i64
}

fn from_millis(ms: i64) -> AppResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
        .map_err(|e| anyhow::Error::from(e).into())
}
