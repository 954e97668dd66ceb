use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, wishes, codes)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                email           TEXT NOT NULL UNIQUE,
                email_verified  INTEGER NOT NULL DEFAULT 0,
                password        TEXT NOT NULL,
                first_name      TEXT,
                last_name       TEXT,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE wishes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                owner       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name        TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                link        TEXT NOT NULL DEFAULT '',
                image       TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_wishes_owner ON wishes(owner, id);

            CREATE TABLE codes (
                user_id     TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                code_hash   TEXT NOT NULL,
                retry_count INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (friendships, fulfillment stages)");
        conn.execute_batch(
            "
            BEGIN;

            -- requests addressed to user_id, sent by requester_id
            CREATE TABLE friend_requests (
                user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                requester_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, requester_id)
            );

            -- always written in pairs: (a, b) and (b, a)
            CREATE TABLE friendships (
                user_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                friend_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, friend_id)
            );

            CREATE TABLE want_to_fulfill (
                wish_id INTEGER NOT NULL REFERENCES wishes(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (wish_id, user_id)
            );

            CREATE TABLE claimers (
                wish_id INTEGER NOT NULL REFERENCES wishes(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (wish_id, user_id)
            );

            CREATE TABLE fulfillers (
                wish_id INTEGER NOT NULL REFERENCES wishes(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (wish_id, user_id)
            );

            INSERT INTO schema_version (version) VALUES (2);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
