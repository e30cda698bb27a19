use tracing::{info, warn};

use crate::card::{PostCard, ViewContext};
use crate::error::ActionError;
use crate::models::{NewPost, Post};
use crate::notice::Notice;

pub const SUPPORTED_LANGUAGES: &[&str] = &["javascript", "typescript", "python"];

/// Form state for a new snippet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostComposer {
    pub title: String,
    pub language: String,
    pub initial_code: String,
    pub optimized_code: String,
}

impl PostComposer {
    pub fn new() -> Self { Self::default() }

    fn validate(&self) -> Result<(), ActionError> {
        let missing = [
            ("title", &self.title),
            ("initial code", &self.initial_code),
            ("optimized code", &self.optimized_code),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty());
        if let Some((field, _)) = missing {
            return Err(ActionError::Validation(format!("Please provide the {field}")));
        }
        if !SUPPORTED_LANGUAGES.contains(&self.language.as_str()) {
            return Err(ActionError::Validation("Please select a language".into()));
        }
        Ok(())
    }

    fn to_new_post(&self, ctx: &ViewContext) -> Result<NewPost, ActionError> {
        let user_id = ctx.viewer_id().ok_or(ActionError::Unauthenticated)?;
        Ok(NewPost {
            title: self.title.trim().to_string(),
            initial_code: self.initial_code.clone(),
            optimized_code: self.optimized_code.clone(),
            language: self.language.clone(),
            user_id,
        })
    }

    /// Card showing the snippet as it would appear once posted.
    pub fn preview(&self, ctx: &ViewContext) -> Result<PostCard, ActionError> {
        let new = self.to_new_post(ctx)?;
        let author = ctx.viewer.as_ref().map(|v| v.display_name()).unwrap_or_default();
        Ok(PostCard::preview(&new, &author, ctx))
    }

    pub async fn submit(&mut self, ctx: &ViewContext) -> Result<Post, ActionError> {
        let checked = self.to_new_post(ctx).and_then(|new| self.validate().map(|_| new));
        let new = match checked {
            Ok(new) => new,
            Err(err) => {
                ctx.notify(err.notice());
                return Err(err);
            }
        };
        match ctx.gateway.create_post(new).await {
            Ok(post) => {
                info!(post_id = %post.id, language = %post.language, "snippet posted");
                ctx.notify(Notice::success("Your code snippet has been posted!"));
                *self = Self::default();
                Ok(post)
            }
            Err(e) => {
                warn!("failed to create post: {e}");
                ctx.notify(Notice::error("Error", "Failed to post your snippet"));
                Err(e.into())
            }
        }
    }
}
