use crate::Database;
use crate::models::{CommentRow, NewReport, ReportCommentRow, ReportRow};
use crate::queries::OptionalExt;
use anyhow::Result;
use rusqlite::{Connection, Row};

const REPORT_COLUMNS: &str = "r.id, r.author_id, COALESCE(u.name, 'unknown'), r.title, r.description,
     r.location, r.category, r.image, r.date, r.created_at, r.updated_at";

impl Database {
    pub fn insert_report(&self, report: &NewReport<'_>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO reports (id, author_id, title, description, location, category, image, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    report.id,
                    report.author_id,
                    report.title,
                    report.description,
                    report.location,
                    report.category,
                    report.image,
                    report.date,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_report(&self, id: &str) -> Result<Option<ReportRow>> {
        self.with_conn(|conn| query_report(conn, id))
    }

    /// All reports, newest first.
    pub fn list_reports(&self) -> Result<Vec<ReportRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch author_name in a single query
            let sql = format!(
                "SELECT {REPORT_COLUMNS}
                 FROM reports r
                 LEFT JOIN users u ON r.author_id = u.id
                 ORDER BY r.created_at DESC, r.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], report_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Overwrites the three editable text fields and bumps `updated_at`.
    /// Returns false if the report does not exist.
    pub fn update_report(
        &self,
        id: &str,
        title: &str,
        description: &str,
        location: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE reports
                 SET title = ?2, description = ?3, location = ?4,
                     updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
                 WHERE id = ?1",
                (id, title, description, location),
            )?;
            Ok(updated > 0)
        })
    }

    /// Deletes a report together with the comments attached to it.
    pub fn delete_report(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM comments WHERE id IN
                    (SELECT comment_id FROM report_comments WHERE report_id = ?1)",
                [id],
            )?;
            let deleted = tx.execute("DELETE FROM reports WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(deleted > 0)
        })
    }

    /// Creates a comment and puts it at the head of the report's comment
    /// sequence in one transaction. Returns `None` if the report is missing.
    pub fn add_comment(
        &self,
        report_id: &str,
        comment_id: &str,
        author_id: &str,
        text: &str,
    ) -> Result<Option<CommentRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists = tx
                .query_row("SELECT 1 FROM reports WHERE id = ?1", [report_id], |_| Ok(()))
                .optional()?
                .is_some();
            if !exists {
                return Ok(None);
            }

            tx.execute(
                "INSERT INTO comments (id, author_id, text) VALUES (?1, ?2, ?3)",
                (comment_id, author_id, text),
            )?;
            tx.execute(
                "INSERT INTO report_comments (report_id, comment_id) VALUES (?1, ?2)",
                (report_id, comment_id),
            )?;

            let row = tx
                .query_row(
                    "SELECT c.id, c.author_id, COALESCE(u.name, 'unknown'), c.text, c.created_at
                     FROM comments c
                     LEFT JOIN users u ON c.author_id = u.id
                     WHERE c.id = ?1",
                    [comment_id],
                    comment_from_row,
                )?;

            tx.commit()?;
            Ok(Some(row))
        })
    }

    /// A report's comments, newest first.
    pub fn get_comments(&self, report_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.author_id, COALESCE(u.name, 'unknown'), c.text, c.created_at
                 FROM report_comments rc
                 JOIN comments c ON rc.comment_id = c.id
                 LEFT JOIN users u ON c.author_id = u.id
                 WHERE rc.report_id = ?1
                 ORDER BY rc.seq DESC",
            )?;
            let rows = stmt
                .query_map([report_id], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch comment links for a set of reports, each report's links
    /// newest first.
    pub fn get_comment_ids(&self, report_ids: &[String]) -> Result<Vec<ReportCommentRow>> {
        if report_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=report_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT report_id, comment_id FROM report_comments
                 WHERE report_id IN ({})
                 ORDER BY seq DESC",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = report_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(ReportCommentRow {
                        report_id: row.get(0)?,
                        comment_id: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_report(conn: &Connection, id: &str) -> Result<Option<ReportRow>> {
    let sql = format!(
        "SELECT {REPORT_COLUMNS}
         FROM reports r
         LEFT JOIN users u ON r.author_id = u.id
         WHERE r.id = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([id], report_from_row).optional()?;
    Ok(row)
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_name: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        location: row.get(5)?,
        category: row.get(6)?,
        image: row.get(7)?,
        date: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_name: row.get(2)?,
        text: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::tests::seed_user;

    fn seed_report(db: &Database, author_id: &str, title: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        db.insert_report(&NewReport {
            id: &id,
            author_id,
            title,
            description: "Someone broke into the shed",
            location: "Main street",
            category: Some("burglary"),
            image: None,
            date: None,
        })
        .unwrap();
        id
    }

    #[test]
    fn insert_then_read_back() {
        let db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "alice");
        let id = seed_report(&db, &author, "Break-in");

        let row = db.get_report(&id).unwrap().unwrap();
        assert_eq!(row.title, "Break-in");
        assert_eq!(row.author_id, author);
        assert_eq!(row.author_name, "alice");
        assert_eq!(row.category.as_deref(), Some("burglary"));
        assert!(row.image.is_none());

        assert!(db.get_report("missing").unwrap().is_none());
    }

    #[test]
    fn list_is_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "alice");
        seed_report(&db, &author, "first");
        seed_report(&db, &author, "second");

        let titles: Vec<_> = db.list_reports().unwrap().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn update_overwrites_text_fields() {
        let db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "alice");
        let id = seed_report(&db, &author, "Break-in");

        assert!(db.update_report(&id, "Robbery", "Bike stolen from porch", "Elm road").unwrap());
        let row = db.get_report(&id).unwrap().unwrap();
        assert_eq!(row.title, "Robbery");
        assert_eq!(row.location, "Elm road");

        assert!(!db.update_report("missing", "a", "b", "c").unwrap());
    }

    #[test]
    fn comments_are_prepended() {
        let db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "alice");
        let id = seed_report(&db, &author, "Break-in");

        let first = uuid::Uuid::new_v4().to_string();
        let second = uuid::Uuid::new_v4().to_string();
        db.add_comment(&id, &first, &author, "first").unwrap().unwrap();
        let row = db.add_comment(&id, &second, &author, "second").unwrap().unwrap();
        assert_eq!(row.author_name, "alice");

        let texts: Vec<_> = db.get_comments(&id).unwrap().into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["second", "first"]);

        let links = db.get_comment_ids(&[id.clone()]).unwrap();
        let ids: Vec<_> = links.into_iter().map(|l| l.comment_id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn comment_on_missing_report_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "alice");

        let comment_id = uuid::Uuid::new_v4().to_string();
        assert!(db.add_comment("missing", &comment_id, &author, "hello").unwrap().is_none());

        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM comments", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn delete_removes_report_and_its_comments() {
        let db = Database::open_in_memory().unwrap();
        let author = seed_user(&db, "alice");
        let id = seed_report(&db, &author, "Break-in");
        let comment_id = uuid::Uuid::new_v4().to_string();
        db.add_comment(&id, &comment_id, &author, "hello").unwrap();

        assert!(db.delete_report(&id).unwrap());
        assert!(db.get_report(&id).unwrap().is_none());
        assert!(db.get_comments(&id).unwrap().is_empty());

        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM comments", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);

        assert!(!db.delete_report(&id).unwrap());
    }
}
