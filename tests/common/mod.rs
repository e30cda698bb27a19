#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use snipfeed::error::{GatewayError, GatewayResult};
use snipfeed::gateway::inmem::InMemGateway;
use snipfeed::gateway::{LikeGateway, PostGateway, ProfileGateway};
use snipfeed::models::*;
use snipfeed::notice::NoticeBoard;
use snipfeed::session::Session;
use snipfeed::ViewContext;
use uuid::Uuid;

/// In-memory gateway with switchable failures and call counters.
#[derive(Default)]
pub struct FlakyGateway {
    pub inner: InMemGateway,
    pub fail_likes: AtomicBool,
    pub fail_posts: AtomicBool,
    pub fail_profile_update: AtomicBool,
    /// Yield to the scheduler before every like mutation.
    pub yield_on_mutation: AtomicBool,
    /// Yield to the scheduler after a like mutation reached the store.
    pub yield_after_mutation: AtomicBool,
    /// Yield to the scheduler after a snapshot was read.
    pub yield_after_snapshot: AtomicBool,
    pub like_mutations: AtomicUsize,
    pub snapshot_calls: AtomicUsize,
}

impl FlakyGateway {
    pub fn new(inner: InMemGateway) -> Self {
        Self { inner, ..Default::default() }
    }

    fn fail(flag: &AtomicBool) -> GatewayResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected { status: 500, message: "boom".into() });
        }
        Ok(())
    }

    async fn before_mutation(&self) -> GatewayResult<()> {
        self.like_mutations.fetch_add(1, Ordering::SeqCst);
        if self.yield_on_mutation.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        Self::fail(&self.fail_likes)
    }

    async fn pause_if(flag: &AtomicBool) {
        if flag.load(Ordering::SeqCst) {
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
        }
    }
}

#[async_trait]
impl PostGateway for FlakyGateway {
    async fn list_posts(&self, query: PostQuery) -> GatewayResult<Vec<PostRecord>> {
        Self::fail(&self.fail_posts)?;
        self.inner.list_posts(query).await
    }
    async fn list_languages(&self) -> GatewayResult<Vec<String>> {
        self.inner.list_languages().await
    }
    async fn create_post(&self, new: NewPost) -> GatewayResult<Post> {
        Self::fail(&self.fail_posts)?;
        self.inner.create_post(new).await
    }
}

#[async_trait]
impl LikeGateway for FlakyGateway {
    async fn find_like(&self, post_id: PostId, user_id: UserId) -> GatewayResult<Option<Like>> {
        self.inner.find_like(post_id, user_id).await
    }
    async fn like_snapshot(&self, post_id: PostId, user_id: UserId) -> GatewayResult<LikeSnapshot> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        let snap = self.inner.like_snapshot(post_id, user_id).await;
        Self::pause_if(&self.yield_after_snapshot).await;
        snap
    }
    async fn insert_like(&self, post_id: PostId, user_id: UserId) -> GatewayResult<Like> {
        self.before_mutation().await?;
        let like = self.inner.insert_like(post_id, user_id).await;
        Self::pause_if(&self.yield_after_mutation).await;
        like
    }
    async fn delete_like(&self, post_id: PostId, user_id: UserId) -> GatewayResult<()> {
        self.before_mutation().await?;
        self.inner.delete_like(post_id, user_id).await
    }
    async fn liked_posts(&self, user_id: UserId) -> GatewayResult<Vec<PostRecord>> {
        Self::fail(&self.fail_posts)?;
        self.inner.liked_posts(user_id).await
    }
}

#[async_trait]
impl ProfileGateway for FlakyGateway {
    async fn get_profile(&self, id: UserId) -> GatewayResult<Profile> {
        self.inner.get_profile(id).await
    }
    async fn update_profile(&self, id: UserId, upd: ProfileUpdate) -> GatewayResult<()> {
        Self::fail(&self.fail_profile_update)?;
        self.inner.update_profile(id, upd).await
    }
}

pub fn set(flag: &AtomicBool) {
    flag.store(true, Ordering::SeqCst);
}

pub fn count(c: &AtomicUsize) -> usize {
    c.load(Ordering::SeqCst)
}

pub fn user(gw: &InMemGateway, username: &str) -> UserId {
    let id = Uuid::new_v4();
    gw.insert_profile(Profile { id, username: username.into(), bio: None, github_url: None });
    id
}

pub fn session(user_id: UserId, email: &str) -> Session {
    Session { user_id, email: Some(email.into()), access_token: "test-token".into() }
}

/// Seed a post `minutes_ago` minutes old.
pub fn post(gw: &InMemGateway, author: UserId, title: &str, language: &str, minutes_ago: i64) -> PostId {
    let id = Uuid::new_v4();
    gw.seed_post(Post {
        id,
        title: title.into(),
        initial_code: "slow()".into(),
        optimized_code: "fast()".into(),
        language: language.into(),
        user_id: author,
        created_at: Utc::now() - Duration::minutes(minutes_ago),
    });
    id
}

pub fn context(gw: Arc<FlakyGateway>, viewer: Option<Session>) -> (ViewContext, NoticeBoard) {
    let board = NoticeBoard::new();
    let ctx = ViewContext::new(gw, Arc::new(board.clone())).with_viewer(viewer);
    (ctx, board)
}
