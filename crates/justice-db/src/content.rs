use crate::Database;
use crate::models::{FactRow, StoryRow};
use crate::queries::OptionalExt;
use anyhow::Result;
use rusqlite::Row;

impl Database {
    // -- Stories --

    pub fn insert_story(&self, id: &str, author_id: &str, title: &str, body: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO stories (id, author_id, title, body) VALUES (?1, ?2, ?3, ?4)",
                (id, author_id, title, body),
            )?;
            Ok(())
        })
    }

    pub fn list_stories(&self) -> Result<Vec<StoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.author_id, COALESCE(u.name, 'unknown'), s.title, s.body, s.created_at
                 FROM stories s
                 LEFT JOIN users u ON s.author_id = u.id
                 ORDER BY s.created_at DESC, s.rowid DESC",
            )?;
            let rows = stmt
                .query_map([], story_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_story(&self, id: &str) -> Result<Option<StoryRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT s.id, s.author_id, COALESCE(u.name, 'unknown'), s.title, s.body, s.created_at
                     FROM stories s
                     LEFT JOIN users u ON s.author_id = u.id
                     WHERE s.id = ?1",
                    [id],
                    story_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_story(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM stories WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Facts --

    pub fn insert_fact(&self, id: &str, title: &str, text: &str, source: Option<&str>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO facts (id, title, text, source) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, title, text, source],
            )?;
            Ok(())
        })
    }

    pub fn list_facts(&self) -> Result<Vec<FactRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, text, source, created_at FROM facts
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([], fact_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_fact(&self, id: &str) -> Result<Option<FactRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, text, source, created_at FROM facts WHERE id = ?1",
                    [id],
                    fact_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_fact(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM facts WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }
}

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<StoryRow> {
    Ok(StoryRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_name: row.get(2)?,
        title: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn fact_from_row(row: &Row<'_>) -> rusqlite::Result<FactRow> {
    Ok(FactRow {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        source: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::tests::seed_user;

    #[test]
    fn story_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "alice");
        let id = uuid::Uuid::new_v4().to_string();

        db.insert_story(&id, &author, "Walking home", "I was followed for three blocks").unwrap();
        let row = db.get_story(&id).unwrap().unwrap();
        assert_eq!(row.author_name, "alice");
        assert_eq!(db.list_stories().unwrap().len(), 1);

        assert!(db.delete_story(&id).unwrap());
        assert!(db.get_story(&id).unwrap().is_none());
        assert!(!db.delete_story(&id).unwrap());
    }

    #[test]
    fn fact_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let id = uuid::Uuid::new_v4().to_string();

        db.insert_fact(&id, "Lock up", "Most burglaries go through unlocked doors", None).unwrap();
        let row = db.get_fact(&id).unwrap().unwrap();
        assert_eq!(row.title, "Lock up");
        assert!(row.source.is_none());
        assert_eq!(db.list_facts().unwrap().len(), 1);

        assert!(db.delete_fact(&id).unwrap());
        assert!(db.list_facts().unwrap().is_empty());
    }
}
