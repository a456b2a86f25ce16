//! SQL schema for the Quipdrop SQLite store.
//!
//! Applied at every connection startup; `PRAGMA user_version` records the
//! schema revision so future migrations can gate on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One committed release per slot. The UNIQUE (release_date, period) key is
-- the serialization point for concurrent commits: no lock exists anywhere
-- else in the system.
CREATE TABLE IF NOT EXISTS releases (
    release_id    TEXT PRIMARY KEY,
    release_date  TEXT NOT NULL,   -- ISO calendar day, UTC reference
    period        TEXT NOT NULL,   -- 'early' | 'late'
    setup         TEXT NOT NULL,
    punchline     TEXT NOT NULL,
    source_api_id TEXT NOT NULL,
    created_at    TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    UNIQUE (release_date, period)
);

-- Operator-maintained backup content, consulted when the live provider
-- yields nothing novel.
CREATE TABLE IF NOT EXISTS fallback_pool (
    fallback_id TEXT PRIMARY KEY,
    setup       TEXT NOT NULL,
    punchline   TEXT NOT NULL,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
);

-- One row per (user, release) interaction. Consumed by lookback selection;
-- scoring lives outside this system.
CREATE TABLE IF NOT EXISTS responses (
    response_id  TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL,
    release_id   TEXT NOT NULL REFERENCES releases(release_id),
    submitted_at TEXT NOT NULL,
    UNIQUE (user_id, release_id)
);

CREATE INDEX IF NOT EXISTS releases_created_idx ON releases(created_at);
CREATE INDEX IF NOT EXISTS fallback_active_idx  ON fallback_pool(is_active);
CREATE INDEX IF NOT EXISTS responses_user_idx   ON responses(user_id);

PRAGMA user_version = 1;
";
