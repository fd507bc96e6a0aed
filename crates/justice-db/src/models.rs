//! Database row types. These map directly to SQLite rows and stay
//! independent of the justice-types API models.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

/// A user joined into another row, without the credential hash.
pub struct ProfileRow {
    pub id: String,
    pub name: String,
    pub role: String,
    pub created_at: String,
}

pub struct NewReport<'a> {
    pub id: &'a str,
    pub author_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub category: Option<&'a str>,
    pub image: Option<&'a str>,
    pub date: Option<&'a str>,
}

pub struct ReportRow {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: Option<String>,
    pub image: Option<String>,
    pub date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ReportCommentRow {
    pub report_id: String,
    pub comment_id: String,
}

pub struct CommentRow {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: String,
}

pub struct ChatRow {
    pub id: String,
    pub sender: ProfileRow,
    pub receiver: ProfileRow,
    pub message: String,
    pub read: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub struct StoryRow {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
}

pub struct FactRow {
    pub id: String,
    pub title: String,
    pub text: String,
    pub source: Option<String>,
    pub created_at: String,
}
