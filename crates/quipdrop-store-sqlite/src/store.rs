//! [`SqliteStore`] — the SQLite implementation of [`ReleaseStore`].

use std::{collections::HashSet, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use quipdrop_core::{
  release::{Candidate, Release},
  slot::SlotId,
  store::{FallbackRow, HistoryRow, ReleaseStore},
};

use crate::{
  Error, Result,
  encode::{
    RawRelease, decode_dt, decode_uuid, encode_date, encode_dt, encode_period,
    encode_uuid,
  },
  schema::SCHEMA,
};

const RELEASE_COLUMNS: &str =
  "release_id, release_date, period, setup, punchline, source_api_id, created_at";

fn raw_release(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRelease> {
  Ok(RawRelease {
    release_id:    row.get(0)?,
    release_date:  row.get(1)?,
    period:        row.get(2)?,
    setup:         row.get(3)?,
    punchline:     row.get(4)?,
    source_api_id: row.get(5)?,
    created_at:    row.get(6)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Quipdrop release store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Total number of committed release rows. Exposed for tests and
  /// operational checks; not part of the [`ReleaseStore`] contract.
  pub async fn release_count(&self) -> Result<u64> {
    let count: u64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM releases", [], |r| r.get(0))?)
      })
      .await?;
    Ok(count)
  }
}

// ─── ReleaseStore impl ───────────────────────────────────────────────────────

impl ReleaseStore for SqliteStore {
  type Error = Error;

  // ── Releases ──────────────────────────────────────────────────────────────

  async fn get_release(&self, slot: SlotId) -> Result<Option<Release>> {
    let date_str = encode_date(slot.date);
    let period_str = encode_period(slot.period).to_owned();

    let raw: Option<RawRelease> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {RELEASE_COLUMNS} FROM releases
                 WHERE release_date = ?1 AND period = ?2"
              ),
              rusqlite::params![date_str, period_str],
              raw_release,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRelease::into_release).transpose()
  }

  async fn get_release_by_id(&self, release_id: Uuid) -> Result<Option<Release>> {
    let id_str = encode_uuid(release_id);

    let raw: Option<RawRelease> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RELEASE_COLUMNS} FROM releases WHERE release_id = ?1"),
              rusqlite::params![id_str],
              raw_release,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRelease::into_release).transpose()
  }

  async fn releases_for_slots<'a>(&'a self, slots: &'a [SlotId]) -> Result<Vec<Release>> {
    let keys: Vec<(String, String)> = slots
      .iter()
      .map(|s| (encode_date(s.date), encode_period(s.period).to_owned()))
      .collect();

    let raws: Vec<RawRelease> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RELEASE_COLUMNS} FROM releases
           WHERE release_date = ?1 AND period = ?2"
        ))?;

        let mut rows = Vec::with_capacity(keys.len());
        for (date_str, period_str) in &keys {
          if let Some(raw) = stmt
            .query_row(rusqlite::params![date_str, period_str], raw_release)
            .optional()?
          {
            rows.push(raw);
          }
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRelease::into_release).collect()
  }

  async fn upsert_release<'a>(
    &'a self,
    slot:      SlotId,
    candidate: &'a Candidate,
  ) -> Result<Release> {
    let id_str        = encode_uuid(Uuid::new_v4());
    let date_str      = encode_date(slot.date);
    let period_str    = encode_period(slot.period).to_owned();
    let setup         = candidate.setup.clone();
    let punchline     = candidate.punchline.clone();
    let source_api_id = candidate.source_api_id.clone();
    let at_str        = encode_dt(Utc::now());

    // Insert-or-replace and read-back run inside one connection call, so the
    // row returned is the row that actually won the key.
    let raw: RawRelease = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO releases (
             release_id, release_date, period, setup, punchline,
             source_api_id, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (release_date, period) DO UPDATE SET
             setup         = excluded.setup,
             punchline     = excluded.punchline,
             source_api_id = excluded.source_api_id,
             created_at    = excluded.created_at",
          rusqlite::params![
            id_str,
            date_str,
            period_str,
            setup,
            punchline,
            source_api_id,
            at_str,
          ],
        )?;

        Ok(conn.query_row(
          &format!(
            "SELECT {RELEASE_COLUMNS} FROM releases
             WHERE release_date = ?1 AND period = ?2"
          ),
          rusqlite::params![date_str, period_str],
          raw_release,
        )?)
      })
      .await?;

    raw.into_release()
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn load_history(&self, limit: u32) -> Result<Vec<HistoryRow>> {
    let rows: Vec<HistoryRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT source_api_id, setup, punchline FROM releases
           ORDER BY created_at DESC, release_id DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(HistoryRow {
              source_api_id: row.get(0)?,
              setup:         row.get(1)?,
              punchline:     row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  // ── Curated fallback pool ─────────────────────────────────────────────────

  async fn active_fallbacks(&self) -> Result<Vec<FallbackRow>> {
    let raws: Vec<(String, String, String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT fallback_id, setup, punchline, created_at FROM fallback_pool
           WHERE is_active = 1
           LIMIT 200",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(id, setup, punchline, created_at)| {
        Ok(FallbackRow {
          fallback_id: decode_uuid(&id)?,
          setup,
          punchline,
          is_active: true,
          created_at: decode_dt(&created_at)?,
        })
      })
      .collect()
  }

  async fn add_fallback(&self, setup: String, punchline: String) -> Result<FallbackRow> {
    let row = FallbackRow {
      fallback_id: Uuid::new_v4(),
      setup,
      punchline,
      is_active: true,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(row.fallback_id);
    let setup     = row.setup.clone();
    let punchline = row.punchline.clone();
    let at_str    = encode_dt(row.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO fallback_pool (fallback_id, setup, punchline, is_active, created_at)
           VALUES (?1, ?2, ?3, 1, ?4)",
          rusqlite::params![id_str, setup, punchline, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(row)
  }

  async fn set_fallback_active(&self, fallback_id: Uuid, is_active: bool) -> Result<bool> {
    let id_str = encode_uuid(fallback_id);

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE fallback_pool SET is_active = ?1 WHERE fallback_id = ?2",
          rusqlite::params![is_active as i64, id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── User responses ────────────────────────────────────────────────────────

  async fn record_response(&self, user_id: Uuid, release_id: Uuid) -> Result<()> {
    let response_id = encode_uuid(Uuid::new_v4());
    let user_str    = encode_uuid(user_id);
    let release_str = encode_uuid(release_id);
    let at_str      = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO responses (response_id, user_id, release_id, submitted_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![response_id, user_str, release_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn responded_release_ids<'a>(
    &'a self,
    user_id:     Uuid,
    release_ids: &'a [Uuid],
  ) -> Result<HashSet<Uuid>> {
    let user_str = encode_uuid(user_id);
    let id_strs: Vec<String> = release_ids.iter().copied().map(encode_uuid).collect();

    let found: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT 1 FROM responses WHERE user_id = ?1 AND release_id = ?2",
        )?;

        let mut found = Vec::new();
        for id_str in &id_strs {
          let hit: bool = stmt
            .query_row(rusqlite::params![user_str, id_str], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
          if hit {
            found.push(id_str.clone());
          }
        }
        Ok(found)
      })
      .await?;

    found.iter().map(|s| decode_uuid(s)).collect()
  }
}
