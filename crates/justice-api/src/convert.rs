//! Row → API model conversion. Corrupt columns are logged and defaulted
//! rather than failing the whole response.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use justice_db::models::{ChatRow, CommentRow, FactRow, ProfileRow, ReportRow, StoryRow, UserRow};
use justice_types::models::{AuthorRef, Chat, Comment, CrimeReport, Fact, Role, Story, UserProfile};

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub(crate) fn parse_role(raw: &str) -> Role {
    raw.parse().unwrap_or_else(|e| {
        warn!("{}, treating as user", e);
        Role::User
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores "YYYY-MM-DD HH:MM:SS.SSS" without timezone; treat as UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub(crate) fn user_profile(row: &UserRow) -> UserProfile {
    UserProfile {
        id: parse_uuid(&row.id, "user id"),
        name: row.name.clone(),
        role: parse_role(&row.role),
        created_at: parse_timestamp(&row.created_at),
    }
}

fn profile(row: ProfileRow) -> UserProfile {
    UserProfile {
        id: parse_uuid(&row.id, "user id"),
        name: row.name,
        role: parse_role(&row.role),
        created_at: parse_timestamp(&row.created_at),
    }
}

fn author(id: &str, name: String) -> AuthorRef {
    AuthorRef {
        id: parse_uuid(id, "author_id"),
        name,
    }
}

pub(crate) fn report(row: ReportRow, comments: Vec<Uuid>) -> CrimeReport {
    CrimeReport {
        id: parse_uuid(&row.id, "report id"),
        author: author(&row.author_id, row.author_name),
        title: row.title,
        description: row.description,
        location: row.location,
        category: row.category,
        image: row.image,
        date: row.date,
        comments,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}

pub(crate) fn comment(row: CommentRow) -> Comment {
    Comment {
        id: parse_uuid(&row.id, "comment id"),
        author: author(&row.author_id, row.author_name),
        text: row.text,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub(crate) fn chat(row: ChatRow) -> Chat {
    Chat {
        id: parse_uuid(&row.id, "chat id"),
        sender: profile(row.sender),
        receiver: profile(row.receiver),
        message: row.message,
        read: row.read,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}

pub(crate) fn story(row: StoryRow) -> Story {
    Story {
        id: parse_uuid(&row.id, "story id"),
        author: author(&row.author_id, row.author_name),
        title: row.title,
        body: row.body,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub(crate) fn fact(row: FactRow) -> Fact {
    Fact {
        id: parse_uuid(&row.id, "fact id"),
        title: row.title,
        text: row.text,
        source: row.source,
        created_at: parse_timestamp(&row.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_sqlite_timestamps() {
        let ts = parse_timestamp("2024-03-05 14:07:09.250");
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 3, 5));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (14, 7, 9));

        let plain = parse_timestamp("2024-03-05 14:07:09");
        assert_eq!(plain.second(), 9);

        let rfc = parse_timestamp("2024-03-05T14:07:09Z");
        assert_eq!(rfc.hour(), 14);
    }

    #[test]
    fn corrupt_values_fall_back() {
        assert_eq!(parse_timestamp("yesterday"), DateTime::<Utc>::default());
        assert_eq!(parse_uuid("nope", "test id"), Uuid::default());
        assert_eq!(parse_role("root"), Role::User);
    }
}
