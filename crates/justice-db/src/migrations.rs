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
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                role        TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE TABLE reports (
                id          TEXT PRIMARY KEY,
                author_id   TEXT NOT NULL REFERENCES users(id),
                title       TEXT NOT NULL,
                description TEXT NOT NULL,
                location    TEXT NOT NULL,
                category    TEXT,
                image       TEXT,
                date        TEXT,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                author_id   TEXT NOT NULL REFERENCES users(id),
                text        TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            -- A report's comment sequence. Highest seq is the head of the list.
            CREATE TABLE report_comments (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                report_id   TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
                comment_id  TEXT NOT NULL UNIQUE REFERENCES comments(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_report_comments_report
                ON report_comments(report_id, seq);

            CREATE TABLE chats (
                id          TEXT PRIMARY KEY,
                pair_key    TEXT NOT NULL UNIQUE,
                sender_id   TEXT NOT NULL REFERENCES users(id),
                receiver_id TEXT NOT NULL REFERENCES users(id),
                message     TEXT NOT NULL,
                read        INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE INDEX idx_chats_sender ON chats(sender_id);
            CREATE INDEX idx_chats_receiver ON chats(receiver_id);

            CREATE TABLE stories (
                id          TEXT PRIMARY KEY,
                author_id   TEXT NOT NULL REFERENCES users(id),
                title       TEXT NOT NULL,
                body        TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE TABLE facts (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                text        TEXT NOT NULL,
                source      TEXT,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
