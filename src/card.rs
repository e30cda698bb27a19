use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::comments::CommentThread;
use crate::engagement::LikeReconciler;
use crate::gateway::Gateway;
use crate::inflight::InFlightRegistry;
use crate::models::{NewPost, PostId, PostRecord, UserId};
use crate::notice::{Notice, NoticeSink};
use crate::session::{avatar_url, Session};

pub const DEFAULT_AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg";

/// Everything a view needs from its surroundings: the viewer, the gateway,
/// where to send notices, and the shared in-flight registry.
#[derive(Clone)]
pub struct ViewContext {
    pub viewer: Option<Session>,
    pub gateway: Arc<dyn Gateway>,
    pub notices: Arc<dyn NoticeSink>,
    pub inflight: InFlightRegistry,
    pub avatar_base_url: String,
}

impl ViewContext {
    pub fn new(gateway: Arc<dyn Gateway>, notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            viewer: None,
            gateway,
            notices,
            inflight: InFlightRegistry::new(),
            avatar_base_url: DEFAULT_AVATAR_BASE_URL.to_string(),
        }
    }

    pub fn with_viewer(mut self, viewer: Option<Session>) -> Self {
        self.viewer = viewer;
        self
    }

    pub fn with_avatar_base_url(mut self, base: impl Into<String>) -> Self {
        self.avatar_base_url = base.into();
        self
    }

    pub fn viewer_id(&self) -> Option<UserId> {
        self.viewer.as_ref().map(|v| v.user_id)
    }

    pub fn avatar_for(&self, seed: &str) -> String {
        avatar_url(&self.avatar_base_url, seed)
    }

    pub fn notify(&self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// One rendered snippet: author, both code blocks, likes and comments.
pub struct PostCard {
    pub author: String,
    pub avatar_url: String,
    pub title: String,
    pub initial_code: String,
    pub optimized_code: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub engagement: LikeReconciler,
    pub comments: CommentThread,
    comments_visible: bool,
}

impl PostCard {
    pub fn from_record(record: PostRecord, ctx: &ViewContext) -> Self {
        let PostRecord { post, author, like_count } = record;
        Self {
            author: author.username,
            avatar_url: ctx.avatar_for(&post.user_id.to_string()),
            title: post.title,
            initial_code: post.initial_code,
            optimized_code: post.optimized_code,
            language: post.language,
            created_at: post.created_at,
            engagement: LikeReconciler::new(Some(post.id), like_count, ctx.clone()),
            comments: CommentThread::new(),
            comments_visible: false,
        }
    }

    /// Card for a post that has not been saved; it has no identifier.
    pub fn preview(new: &NewPost, author: &str, ctx: &ViewContext) -> Self {
        Self {
            author: author.to_string(),
            avatar_url: ctx.avatar_for(&new.user_id.to_string()),
            title: new.title.clone(),
            initial_code: new.initial_code.clone(),
            optimized_code: new.optimized_code.clone(),
            language: new.language.clone(),
            created_at: Utc::now(),
            engagement: LikeReconciler::new(None, 0, ctx.clone()),
            comments: CommentThread::new(),
            comments_visible: false,
        }
    }

    pub fn post_id(&self) -> Option<PostId> {
        self.engagement.post_id()
    }

    pub fn toggle_comments(&mut self) -> bool {
        self.comments_visible = !self.comments_visible;
        self.comments_visible
    }

    pub fn comments_visible(&self) -> bool { self.comments_visible }

    pub fn comment_count(&self) -> usize { self.comments.len() }

    pub fn timestamp(&self) -> String {
        timestamp_label(self.created_at, Utc::now())
    }
}

/// Relative label for recent posts, calendar date for older ones.
pub fn timestamp_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(created_at);
    if age.num_minutes() < 1 {
        "Just now".to_string()
    } else if age.num_hours() < 1 {
        format!("{}m ago", age.num_minutes())
    } else if age.num_days() < 1 {
        format!("{}h ago", age.num_hours())
    } else {
        created_at.format("%Y-%m-%d").to_string()
    }
}
