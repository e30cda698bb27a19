use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::models::*;

#[async_trait]
pub trait PostGateway: Send + Sync {
    /// Posts matching `query`, newest first.
    async fn list_posts(&self, query: PostQuery) -> GatewayResult<Vec<PostRecord>>;
    /// Distinct languages across every post, regardless of any filter.
    async fn list_languages(&self) -> GatewayResult<Vec<String>>;
    async fn create_post(&self, new: NewPost) -> GatewayResult<Post>;
}

#[async_trait]
pub trait LikeGateway: Send + Sync {
    async fn find_like(&self, post_id: PostId, user_id: UserId) -> GatewayResult<Option<Like>>;
    async fn like_snapshot(&self, post_id: PostId, user_id: UserId) -> GatewayResult<LikeSnapshot>;
    async fn insert_like(&self, post_id: PostId, user_id: UserId) -> GatewayResult<Like>;
    async fn delete_like(&self, post_id: PostId, user_id: UserId) -> GatewayResult<()>;
    async fn liked_posts(&self, user_id: UserId) -> GatewayResult<Vec<PostRecord>>;
}

#[async_trait]
pub trait ProfileGateway: Send + Sync {
    async fn get_profile(&self, id: UserId) -> GatewayResult<Profile>;
    async fn update_profile(&self, id: UserId, upd: ProfileUpdate) -> GatewayResult<()>;
}

pub trait Gateway: PostGateway + LikeGateway + ProfileGateway {}

impl<T> Gateway for T where T: PostGateway + LikeGateway + ProfileGateway {}

#[cfg(feature = "inmem-gateway")]
pub mod inmem {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::error::GatewayError;

    #[derive(Default)]
    struct State {
        profiles: HashMap<UserId, Profile>,
        posts: HashMap<PostId, Post>,
        likes: HashMap<LikeKey, Like>,
    }

    impl State {
        fn like_count(&self, post_id: PostId) -> i64 {
            self.likes.keys().filter(|k| k.post_id == post_id).count() as i64
        }

        // Rows whose author profile is missing are skipped, matching an inner join.
        fn record(&self, post: &Post) -> Option<PostRecord> {
            let profile = self.profiles.get(&post.user_id)?;
            Some(PostRecord {
                post: post.clone(),
                author: Author { username: profile.username.clone() },
                like_count: self.like_count(post.id),
            })
        }
    }

    /// Process-local gateway with the same row semantics as the hosted store.
    #[derive(Clone, Default)]
    pub struct InMemGateway {
        state: Arc<RwLock<State>>,
    }

    impl InMemGateway {
        pub fn new() -> Self { Self::default() }

        fn read(&self) -> RwLockReadGuard<'_, State> {
            self.state.read().unwrap_or_else(PoisonError::into_inner)
        }

        fn write(&self) -> RwLockWriteGuard<'_, State> {
            self.state.write().unwrap_or_else(PoisonError::into_inner)
        }

        /// Profiles are created by the auth provider on sign-up; this stands in for that.
        pub fn insert_profile(&self, profile: Profile) {
            self.write().profiles.insert(profile.id, profile);
        }

        /// Insert a fully formed post row (explicit id and timestamp).
        pub fn seed_post(&self, post: Post) {
            self.write().posts.insert(post.id, post);
        }

        pub fn like_rows(&self) -> usize {
            self.read().likes.len()
        }

        /// The two sample snippets shown on an empty feed.
        pub fn with_sample_posts() -> Self {
            let gw = Self::new();
            let now = Utc::now();
            let samples = [
                (
                    "sarah_dev",
                    "Optimizing array manipulation in TypeScript",
                    "typescript",
                    "const numbers = [1, 2, 3, 4, 5];\nconst doubled = [];\nfor (let i = 0; i < numbers.length; i++) {\n  doubled.push(numbers[i] * 2);\n}",
                    "const numbers = [1, 2, 3, 4, 5];\nconst doubled = numbers.map(n => n * 2);",
                    2,
                ),
                (
                    "code_master",
                    "Better React state management",
                    "javascript",
                    "const [name, setName] = useState(\"\");\nconst [age, setAge] = useState(0);\nconst [email, setEmail] = useState(\"\");",
                    "const [user, setUser] = useState({\n  name: \"\",\n  age: 0,\n  email: \"\"\n});",
                    4,
                ),
            ];
            for (username, title, language, initial, optimized, hours_ago) in samples {
                let user_id = Uuid::new_v4();
                gw.insert_profile(Profile { id: user_id, username: username.into(), bio: None, github_url: None });
                gw.seed_post(Post {
                    id: Uuid::new_v4(),
                    title: title.into(),
                    initial_code: initial.into(),
                    optimized_code: optimized.into(),
                    language: language.into(),
                    user_id,
                    created_at: now - Duration::hours(hours_ago),
                });
            }
            gw
        }
    }

    #[async_trait]
    impl PostGateway for InMemGateway {
        async fn list_posts(&self, query: PostQuery) -> GatewayResult<Vec<PostRecord>> {
            let s = self.read();
            let mut v: Vec<_> = s.posts.values()
                .filter(|p| query.matches(p))
                .filter_map(|p| s.record(p))
                .collect();
            v.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));     // newest first
            if let Some(limit) = query.limit { v.truncate(limit); }
            Ok(v)
        }

        async fn list_languages(&self) -> GatewayResult<Vec<String>> {
            let s = self.read();
            Ok(distinct_languages(s.posts.values().map(|p| p.language.as_str())))
        }

        async fn create_post(&self, new: NewPost) -> GatewayResult<Post> {
            let mut s = self.write();
            if !s.profiles.contains_key(&new.user_id) { return Err(GatewayError::NotFound); }
            let post = Post {
                id: Uuid::new_v4(),
                title: new.title,
                initial_code: new.initial_code,
                optimized_code: new.optimized_code,
                language: new.language,
                user_id: new.user_id,
                created_at: Utc::now(),
            };
            s.posts.insert(post.id, post.clone());
            Ok(post)
        }
    }

    #[async_trait]
    impl LikeGateway for InMemGateway {
        async fn find_like(&self, post_id: PostId, user_id: UserId) -> GatewayResult<Option<Like>> {
            Ok(self.read().likes.get(&LikeKey::new(post_id, user_id)).cloned())
        }

        async fn like_snapshot(&self, post_id: PostId, user_id: UserId) -> GatewayResult<LikeSnapshot> {
            let s = self.read();
            if !s.posts.contains_key(&post_id) { return Err(GatewayError::NotFound); }
            Ok(LikeSnapshot {
                count: s.like_count(post_id),
                liked: s.likes.contains_key(&LikeKey::new(post_id, user_id)),
            })
        }

        async fn insert_like(&self, post_id: PostId, user_id: UserId) -> GatewayResult<Like> {
            let mut s = self.write();
            if !s.posts.contains_key(&post_id) { return Err(GatewayError::NotFound); }
            let key = LikeKey::new(post_id, user_id);
            // one row per (post, user)
            if s.likes.contains_key(&key) { return Err(GatewayError::Conflict); }
            let like = Like { post_id, user_id, created_at: Utc::now() };
            s.likes.insert(key, like.clone());
            Ok(like)
        }

        async fn delete_like(&self, post_id: PostId, user_id: UserId) -> GatewayResult<()> {
            let mut s = self.write();
            s.likes.remove(&LikeKey::new(post_id, user_id)).map(|_| ()).ok_or(GatewayError::NotFound)
        }

        async fn liked_posts(&self, user_id: UserId) -> GatewayResult<Vec<PostRecord>> {
            let s = self.read();
            let mut likes: Vec<_> = s.likes.values().filter(|l| l.user_id == user_id).collect();
            likes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(likes.into_iter()
                .filter_map(|l| s.posts.get(&l.post_id))
                .filter_map(|p| s.record(p))
                .collect())
        }
    }

    #[async_trait]
    impl ProfileGateway for InMemGateway {
        async fn get_profile(&self, id: UserId) -> GatewayResult<Profile> {
            self.read().profiles.get(&id).cloned().ok_or(GatewayError::NotFound)
        }

        async fn update_profile(&self, id: UserId, upd: ProfileUpdate) -> GatewayResult<()> {
            let mut s = self.write();
            let profile = s.profiles.get_mut(&id).ok_or(GatewayError::NotFound)?;
            profile.bio = upd.bio;
            profile.github_url = upd.github_url;
            Ok(())
        }
    }
}
