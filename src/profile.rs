use tracing::{info, warn};

use crate::card::{PostCard, ViewContext};
use crate::error::ActionError;
use crate::models::{PostQuery, Profile, ProfileUpdate, UserId};
use crate::notice::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileTab {
    #[default]
    Posts,
    Likes,
}

/// Edit form for the two mutable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub bio: String,
    pub github_url: String,
}

impl ProfileDraft {
    fn from_profile(p: &Profile) -> Self {
        Self {
            bio: p.bio.clone().unwrap_or_default(),
            github_url: p.github_url.clone().unwrap_or_default(),
        }
    }

    // blank fields are stored as absent
    fn to_update(&self) -> ProfileUpdate {
        fn field(s: &str) -> Option<String> {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        ProfileUpdate { bio: field(&self.bio), github_url: field(&self.github_url) }
    }
}

pub struct ProfileView {
    ctx: ViewContext,
    profile_id: UserId,
    profile: Option<Profile>,
    posts: Vec<PostCard>,
    liked_posts: Vec<PostCard>,
    tab: ProfileTab,
    draft: Option<ProfileDraft>,
    loading: bool,
}

impl ProfileView {
    pub fn new(profile_id: UserId, ctx: ViewContext) -> Self {
        Self {
            ctx,
            profile_id,
            profile: None,
            posts: Vec::new(),
            liked_posts: Vec::new(),
            tab: ProfileTab::Posts,
            draft: None,
            loading: true,
        }
    }

    pub fn profile(&self) -> Option<&Profile> { self.profile.as_ref() }
    pub fn posts(&self) -> &[PostCard] { &self.posts }
    pub fn liked_posts(&self) -> &[PostCard] { &self.liked_posts }
    pub fn is_loading(&self) -> bool { self.loading }
    pub fn tab(&self) -> ProfileTab { self.tab }
    pub fn select_tab(&mut self, tab: ProfileTab) { self.tab = tab; }

    /// Cards for the selected tab.
    pub fn visible_posts(&self) -> &[PostCard] {
        match self.tab {
            ProfileTab::Posts => &self.posts,
            ProfileTab::Likes => &self.liked_posts,
        }
    }

    pub fn is_own_profile(&self) -> bool {
        self.ctx.viewer_id() == Some(self.profile_id)
    }

    /// Load the profile and both post collections. Each fetch fails on its
    /// own; the view stays loading until the profile itself arrives.
    pub async fn load(&mut self) {
        let gw = &self.ctx.gateway;
        let (profile, posts, liked) = tokio::join!(
            gw.get_profile(self.profile_id),
            gw.list_posts(PostQuery::default().author(self.profile_id)),
            gw.liked_posts(self.profile_id),
        );

        match profile {
            Ok(p) => {
                self.profile = Some(p);
                self.loading = false;
            }
            Err(e) => {
                warn!(profile = %self.profile_id, "failed to load profile: {e}");
                self.ctx.notify(Notice::error("Error", "Failed to load profile"));
            }
        }
        match posts {
            Ok(r) => self.posts = r.into_iter().map(|r| PostCard::from_record(r, &self.ctx)).collect(),
            Err(e) => {
                warn!(profile = %self.profile_id, "failed to load posts: {e}");
                self.ctx.notify(Notice::error("Error", "Failed to load posts"));
            }
        }
        match liked {
            Ok(r) => self.liked_posts = r.into_iter().map(|r| PostCard::from_record(r, &self.ctx)).collect(),
            Err(e) => {
                warn!(profile = %self.profile_id, "failed to load liked posts: {e}");
                self.ctx.notify(Notice::error("Error", "Failed to load liked posts"));
            }
        }
        for card in self.posts.iter().chain(&self.liked_posts) {
            let _ = card.engagement.mount().await;
        }
    }

    async fn refetch_profile(&mut self) -> Result<(), ActionError> {
        match self.ctx.gateway.get_profile(self.profile_id).await {
            Ok(p) => {
                self.profile = Some(p);
                Ok(())
            }
            Err(e) => {
                warn!(profile = %self.profile_id, "failed to reload profile: {e}");
                self.ctx.notify(Notice::error("Error", "Failed to load profile"));
                Err(e.into())
            }
        }
    }

    pub fn is_editing(&self) -> bool { self.draft.is_some() }
    pub fn draft(&self) -> Option<&ProfileDraft> { self.draft.as_ref() }
    pub fn draft_mut(&mut self) -> Option<&mut ProfileDraft> { self.draft.as_mut() }

    /// Open the edit form; only the profile's owner may.
    pub fn begin_edit(&mut self) -> Result<&mut ProfileDraft, ActionError> {
        if !self.is_own_profile() {
            let err = ActionError::Forbidden;
            self.ctx.notify(err.notice());
            return Err(err);
        }
        let draft = self.profile.as_ref().map(ProfileDraft::from_profile).unwrap_or_default();
        Ok(self.draft.insert(draft))
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// Persist the draft in one update call, then re-fetch the profile.
    /// A failed update keeps the form open.
    pub async fn save(&mut self) -> Result<(), ActionError> {
        if !self.is_own_profile() {
            let err = ActionError::Forbidden;
            self.ctx.notify(err.notice());
            return Err(err);
        }
        let Some(draft) = self.draft.as_ref() else {
            return Ok(());
        };
        let update = draft.to_update();
        if let Err(e) = self.ctx.gateway.update_profile(self.profile_id, update).await {
            warn!(profile = %self.profile_id, "profile update rejected: {e}");
            self.ctx.notify(Notice::error("Error", "Failed to update profile"));
            return Err(e.into());
        }
        info!(profile = %self.profile_id, "profile updated");
        self.ctx.notify(Notice::success("Profile updated successfully"));
        self.draft = None;
        self.refetch_profile().await
    }
}
