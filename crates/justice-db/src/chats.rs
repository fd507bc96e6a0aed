use crate::Database;
use crate::models::{ChatRow, ProfileRow};
use crate::queries::OptionalExt;
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row};

const CHAT_SELECT: &str = "SELECT c.id, c.message, c.read, c.created_at, c.updated_at,
            s.id, s.name, s.role, s.created_at,
            r.id, r.name, r.role, r.created_at
     FROM chats c
     JOIN users s ON c.sender_id = s.id
     JOIN users r ON c.receiver_id = r.id";

/// Order-independent key for a pair of users, so (a, b) and (b, a) share one chat.
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}:{}", a, b)
    } else {
        format!("{}:{}", b, a)
    }
}

impl Database {
    /// Every chat the user takes part in, most recently updated first.
    pub fn list_chats_for_user(&self, user_id: &str) -> Result<Vec<ChatRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{CHAT_SELECT}
                 WHERE c.sender_id = ?1 OR c.receiver_id = ?1
                 ORDER BY c.updated_at DESC, c.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], chat_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// The chat between two users, regardless of who sent last.
    pub fn find_chat_between(&self, a: &str, b: &str) -> Result<Option<ChatRow>> {
        let key = pair_key(a, b);
        self.with_conn(|conn| query_chat(conn, "c.pair_key", &key))
    }

    pub fn get_chat(&self, id: &str) -> Result<Option<ChatRow>> {
        self.with_conn(|conn| query_chat(conn, "c.id", id))
    }

    /// Creates the pair's chat or overwrites its latest message.
    ///
    /// Either way the caller becomes the sender, `read` is cleared, and the
    /// row keyed by the pair is returned. `id` is only used on insert.
    pub fn upsert_chat(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
        message: &str,
    ) -> Result<ChatRow> {
        let key = pair_key(sender_id, receiver_id);
        self.with_conn_mut(|conn| {
            let chat_id: String = conn.query_row(
                "INSERT INTO chats (id, pair_key, sender_id, receiver_id, message)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(pair_key) DO UPDATE SET
                    sender_id = excluded.sender_id,
                    receiver_id = excluded.receiver_id,
                    message = excluded.message,
                    read = 0,
                    updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
                 RETURNING id",
                (id, key.as_str(), sender_id, receiver_id, message),
                |row| row.get(0),
            )?;

            query_chat(conn, "c.id", &chat_id)?
                .ok_or_else(|| anyhow!("Chat {} vanished after upsert", chat_id))
        })
    }

    /// Returns false if no chat has this id.
    pub fn mark_chat_read(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute("UPDATE chats SET read = 1 WHERE id = ?1", [id])?;
            Ok(updated > 0)
        })
    }
}

fn query_chat(conn: &Connection, column: &str, value: &str) -> Result<Option<ChatRow>> {
    let sql = format!("{CHAT_SELECT} WHERE {} = ?1", column);
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], chat_from_row).optional()?;
    Ok(row)
}

fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<ChatRow> {
    Ok(ChatRow {
        id: row.get(0)?,
        message: row.get(1)?,
        read: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        sender: ProfileRow {
            id: row.get(5)?,
            name: row.get(6)?,
            role: row.get(7)?,
            created_at: row.get(8)?,
        },
        receiver: ProfileRow {
            id: row.get(9)?,
            name: row.get(10)?,
            role: row.get(11)?,
            created_at: row.get(12)?,
        },
    })
}
