use crate::Database;
use crate::models::UserRow;
use anyhow::Result;
use justice_types::models::Role;
use rusqlite::{Connection, ErrorCode, Row};

/// Fields a user update may touch. `None` leaves the column as it is.
#[derive(Default)]
pub struct UserChanges<'a> {
    pub name: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub role: Option<Role>,
}

/// Outcome of a write to the users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserWrite {
    Written,
    /// No user has the given id.
    Missing,
    /// Another user already holds the requested name.
    NameTaken,
}

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, name: &str, password_hash: &str, role: Role) -> Result<UserWrite> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, name, password, role) VALUES (?1, ?2, ?3, ?4)",
                (id, name, password_hash, role.as_str()),
            );
            match inserted {
                Ok(_) => Ok(UserWrite::Written),
                Err(e) if is_unique_violation(&e) => Ok(UserWrite::NameTaken),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_name(&self, name: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "name", name))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Newest first. `limit` of `None` returns everyone.
    pub fn list_users(&self, limit: Option<u32>) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, password, role, created_at FROM users
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1",
            )?;

            // SQLite treats a negative LIMIT as unbounded
            let limit = limit.map(i64::from).unwrap_or(-1);
            let rows = stmt
                .query_map([limit], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn update_user(&self, id: &str, changes: &UserChanges<'_>) -> Result<UserWrite> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE users SET
                    name = COALESCE(?2, name),
                    password = COALESCE(?3, password),
                    role = COALESCE(?4, role)
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    changes.name,
                    changes.password_hash,
                    changes.role.map(Role::as_str),
                ],
            );
            match updated {
                Ok(0) => Ok(UserWrite::Missing),
                Ok(_) => Ok(UserWrite::Written),
                Err(e) if is_unique_violation(&e) => Ok(UserWrite::NameTaken),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn set_role_by_name(&self, name: &str, role: Role) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE users SET role = ?2 WHERE name = ?1",
                (name, role.as_str()),
            )?;
            Ok(updated > 0)
        })
    }

    /// Sign-up counts grouped by `YYYY-MM`, oldest month first, for users
    /// created on or after `since` (`YYYY-MM-DD`).
    pub fn signups_by_month(&self, since: &str) -> Result<Vec<(String, i64)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT strftime('%Y-%m', created_at) AS month, COUNT(*)
                 FROM users
                 WHERE created_at >= ?1
                 GROUP BY month
                 ORDER BY month ASC",
            )?;

            let rows = stmt
                .query_map([since], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is always one of our own literals, never client input
    let sql = format!(
        "SELECT id, name, password, role, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

/// `users.name` is the only UNIQUE column a client can collide on.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        password: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Inserts a plain user and returns its id.
    pub(crate) fn seed_user(db: &Database, name: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        assert_eq!(
            db.create_user(&id, name, "not-a-real-hash", Role::User).unwrap(),
            UserWrite::Written
        );
        id
    }

    #[test]
    fn create_and_lookup_user() {
        let db = Database::open_in_memory().unwrap();
        let id = seed_user(&db, "alice");

        let by_name = db.get_user_by_name("alice").unwrap().unwrap();
        assert_eq!(by_name.id, id);
        assert_eq!(by_name.role, "user");

        let by_id = db.get_user_by_id(&id).unwrap().unwrap();
        assert_eq!(by_id.name, "alice");

        assert!(db.get_user_by_name("bob").unwrap().is_none());
    }

    #[test]
    fn duplicate_name_reports_name_taken() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let id = uuid::Uuid::new_v4().to_string();
        assert_eq!(db.create_user(&id, "alice", "x", Role::User).unwrap(), UserWrite::NameTaken);
        assert!(db.get_user_by_id(&id).unwrap().is_none());

        let rename = UserChanges {
            name: Some("alice"),
            ..Default::default()
        };
        assert_eq!(db.update_user(&bob, &rename).unwrap(), UserWrite::NameTaken);
        assert_eq!(db.get_user_by_id(&bob).unwrap().unwrap().name, "bob");
    }

    #[test]
    fn update_user_keeps_untouched_columns() {
        let db = Database::open_in_memory().unwrap();
        let id = seed_user(&db, "alice");

        let changes = UserChanges {
            name: Some("alicia"),
            ..Default::default()
        };
        assert_eq!(db.update_user(&id, &changes).unwrap(), UserWrite::Written);

        let row = db.get_user_by_id(&id).unwrap().unwrap();
        assert_eq!(row.name, "alicia");
        assert_eq!(row.password, "not-a-real-hash");
        assert_eq!(row.role, "user");

        let other = UserChanges {
            name: Some("nobody"),
            ..Default::default()
        };
        assert_eq!(db.update_user("missing", &other).unwrap(), UserWrite::Missing);
    }

    #[test]
    fn list_users_newest_first_with_limit() {
        let db = Database::open_in_memory().unwrap();
        for name in ["a1", "a2", "a3"] {
            seed_user(&db, name);
        }

        let all = db.list_users(None).unwrap();
        let names: Vec<_> = all.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["a3", "a2", "a1"]);

        assert_eq!(db.list_users(Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn promote_by_name() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "root");

        assert!(db.set_role_by_name("root", Role::Admin).unwrap());
        assert!(!db.set_role_by_name("nobody", Role::Admin).unwrap());
        assert_eq!(db.get_user_by_name("root").unwrap().unwrap().role, "admin");
    }

    #[test]
    fn signups_grouped_by_month() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a1");
        seed_user(&db, "a2");

        let counts = db.signups_by_month("2000-01-01").unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].1, 2);

        assert!(db.signups_by_month("9999-01-01").unwrap().is_empty());
    }
}
