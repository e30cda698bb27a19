use uuid::Uuid;

use crate::card::ViewContext;
use crate::error::ActionError;
use crate::models::Comment;

pub const JUST_NOW: &str = "Just now";

/// Comments held in memory for the lifetime of a card; append-only.
#[derive(Debug, Clone, Default)]
pub struct CommentThread {
    comments: Vec<Comment>,
}

impl CommentThread {
    pub fn new() -> Self { Self::default() }

    pub fn append(&mut self, comment: Comment) -> &Comment {
        self.comments.push(comment);
        &self.comments[self.comments.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> { self.comments.iter() }
    pub fn len(&self) -> usize { self.comments.len() }
    pub fn is_empty(&self) -> bool { self.comments.is_empty() }
}

/// Comment form state.
#[derive(Debug, Clone, Default)]
pub struct CommentComposer {
    draft: String,
}

impl CommentComposer {
    pub fn new() -> Self { Self::default() }

    pub fn draft(&self) -> &str { &self.draft }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Append the trimmed draft to `thread` as the signed-in viewer.
    /// Rejected submissions keep the draft for correction.
    pub fn submit<'t>(&mut self, ctx: &ViewContext, thread: &'t mut CommentThread) -> Result<&'t Comment, ActionError> {
        let Some(viewer) = ctx.viewer.as_ref() else {
            let err = ActionError::Unauthenticated;
            ctx.notify(err.notice());
            return Err(err);
        };
        let content = self.draft.trim();
        if content.is_empty() {
            let err = ActionError::Validation("Comment cannot be empty".into());
            ctx.notify(err.notice());
            return Err(err);
        }
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            username: viewer.display_name(),
            avatar_url: ctx.avatar_for(&viewer.avatar_seed()),
            content: content.to_string(),
            timestamp: JUST_NOW.to_string(),
        };
        self.draft.clear();
        Ok(thread.append(comment))
    }
}
