use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// Identifiers are issued by the hosted store (posts) and the auth provider (users)
pub type PostId = Uuid;
pub type UserId = Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub initial_code: String,
    pub optimized_code: String,
    pub language: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub initial_code: String,
    pub optimized_code: String,
    pub language: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub username: String,
}

/// A post joined with its author and the like aggregate, as the feed and
/// profile tabs receive it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PostRecord {
    #[serde(flatten)]
    pub post: Post,
    #[serde(rename = "profiles")]
    pub author: Author,
    #[serde(rename = "likes", default, deserialize_with = "aggregate_count")]
    pub like_count: i64,
}

/// `likes(count)` embeds come back as `[{"count": n}]`.
fn aggregate_count<'de, D>(d: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Aggregate {
        count: i64,
    }
    let rows = Vec::<Aggregate>::deserialize(d)?;
    Ok(rows.first().map(|a| a.count).unwrap_or(0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LikeKey {
    pub post_id: PostId,
    pub user_id: UserId,
}

impl LikeKey {
    pub fn new(post_id: PostId, user_id: UserId) -> Self {
        Self { post_id, user_id }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
    pub post_id: PostId,
    pub user_id: UserId,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Like count and viewer flag for one post, derived from a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LikeSnapshot {
    pub count: i64,
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    pub bio: Option<String>,
    pub github_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub github_url: Option<String>,
}

/// Client-side comment; never persisted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub username: String,
    pub avatar_url: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub language: Option<String>,
    pub author: Option<UserId>,
    pub limit: Option<usize>,
}

impl PostQuery {
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn author(mut self, user_id: UserId) -> Self {
        self.author = Some(user_id);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Row-level match used by backends that filter client-side.
    pub fn matches(&self, post: &Post) -> bool {
        self.language.as_deref().map_or(true, |l| post.language == l)
            && self.author.map_or(true, |a| post.user_id == a)
    }
}

/// Distinct languages in sorted order.
pub fn distinct_languages<'a, I>(languages: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut v: Vec<String> = languages.into_iter().map(str::to_string).collect();
    v.sort();
    v.dedup();
    v
}
