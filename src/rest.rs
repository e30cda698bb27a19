//! Gateway backed by the hosted store's REST interface (PostgREST dialect).

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{LikeGateway, PostGateway, ProfileGateway};
use crate::models::*;
use crate::session::Session;

const POST_SELECT: &str = "*,profiles(username),likes(count)";

#[derive(Clone)]
pub struct RestGateway {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl RestGateway {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: None,
        }
    }

    pub fn from_config(cfg: &Config) -> Option<Self> {
        let url = cfg.gateway_url.as_ref()?;
        let key = cfg.anon_key.as_ref()?;
        Some(Self::new(url.clone(), key.clone()))
    }

    /// Same gateway, issuing requests as the signed-in viewer.
    pub fn with_session(&self, session: &Session) -> Self {
        Self { access_token: Some(session.access_token.clone()), ..self.clone() }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    async fn send(&self, rb: RequestBuilder) -> GatewayResult<reqwest::Response> {
        let resp = rb.send().await.map_err(|e| {
            error!("gateway request failed: {e}");
            GatewayError::Internal(e.to_string())
        })?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        warn!("gateway rejected request status={status} body={body}");
        Err(status_error(status, body))
    }

    async fn fetch<T: DeserializeOwned>(&self, rb: RequestBuilder) -> GatewayResult<T> {
        self.send(rb).await?.json::<T>().await.map_err(|e| {
            error!("gateway response decode failed: {e}");
            GatewayError::Internal(format!("decode: {e}"))
        })
    }
}

fn status_error(status: StatusCode, body: String) -> GatewayError {
    match status {
        StatusCode::NOT_FOUND => GatewayError::NotFound,
        StatusCode::CONFLICT => GatewayError::Conflict,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Unauthorized,
        s => GatewayError::Rejected { status: s.as_u16(), message: body },
    }
}

fn eq(v: impl std::fmt::Display) -> String {
    format!("eq.{v}")
}

#[async_trait]
impl PostGateway for RestGateway {
    async fn list_posts(&self, query: PostQuery) -> GatewayResult<Vec<PostRecord>> {
        let mut params = vec![
            ("select", POST_SELECT.to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(l) = &query.language { params.push(("language", eq(l))); }
        if let Some(a) = query.author { params.push(("user_id", eq(a))); }
        if let Some(n) = query.limit { params.push(("limit", n.to_string())); }
        debug!("list_posts {params:?}");
        self.fetch(self.request(Method::GET, "posts").query(&params)).await
    }

    async fn list_languages(&self) -> GatewayResult<Vec<String>> {
        #[derive(Deserialize)]
        struct Row { language: String }
        let rows: Vec<Row> = self
            .fetch(self.request(Method::GET, "posts").query(&[("select", "language")]))
            .await?;
        Ok(distinct_languages(rows.iter().map(|r| r.language.as_str())))
    }

    async fn create_post(&self, new: NewPost) -> GatewayResult<Post> {
        let rows: Vec<Post> = self
            .fetch(
                self.request(Method::POST, "posts")
                    .header("Prefer", "return=representation")
                    .json(&new),
            )
            .await?;
        rows.into_iter().next().ok_or_else(|| GatewayError::Internal("insert returned no row".into()))
    }
}

#[async_trait]
impl LikeGateway for RestGateway {
    async fn find_like(&self, post_id: PostId, user_id: UserId) -> GatewayResult<Option<Like>> {
        let rows: Vec<Like> = self
            .fetch(self.request(Method::GET, "likes").query(&[
                ("select", "*".to_string()),
                ("post_id", eq(post_id)),
                ("user_id", eq(user_id)),
            ]))
            .await?;
        Ok(rows.into_iter().next())
    }

    // Count and viewer flag come from the same response.
    async fn like_snapshot(&self, post_id: PostId, user_id: UserId) -> GatewayResult<LikeSnapshot> {
        #[derive(Deserialize)]
        struct Count { count: i64 }
        #[derive(Deserialize)]
        struct Row {
            #[serde(default)]
            likes: Vec<Count>,
            #[serde(default)]
            viewer: Vec<serde_json::Value>,
        }
        let rows: Vec<Row> = self
            .fetch(self.request(Method::GET, "posts").query(&[
                ("select", "id,likes(count),viewer:likes(user_id)".to_string()),
                ("id", eq(post_id)),
                ("viewer.user_id", eq(user_id)),
            ]))
            .await?;
        let row = rows.into_iter().next().ok_or(GatewayError::NotFound)?;
        Ok(LikeSnapshot {
            count: row.likes.first().map(|c| c.count).unwrap_or(0),
            liked: !row.viewer.is_empty(),
        })
    }

    async fn insert_like(&self, post_id: PostId, user_id: UserId) -> GatewayResult<Like> {
        let rows: Vec<Like> = self
            .fetch(
                self.request(Method::POST, "likes")
                    .header("Prefer", "return=representation")
                    .json(&json!({ "post_id": post_id, "user_id": user_id })),
            )
            .await?;
        rows.into_iter().next().ok_or_else(|| GatewayError::Internal("insert returned no row".into()))
    }

    async fn delete_like(&self, post_id: PostId, user_id: UserId) -> GatewayResult<()> {
        let rows: Vec<Like> = self
            .fetch(
                self.request(Method::DELETE, "likes")
                    .header("Prefer", "return=representation")
                    .query(&[("post_id", eq(post_id)), ("user_id", eq(user_id))]),
            )
            .await?;
        if rows.is_empty() { return Err(GatewayError::NotFound); }
        Ok(())
    }

    async fn liked_posts(&self, user_id: UserId) -> GatewayResult<Vec<PostRecord>> {
        #[derive(Deserialize)]
        struct Row { posts: Option<PostRecord> }
        let rows: Vec<Row> = self
            .fetch(self.request(Method::GET, "likes").query(&[
                ("select", format!("posts({POST_SELECT})")),
                ("user_id", eq(user_id)),
                ("order", "created_at.desc".to_string()),
            ]))
            .await?;
        Ok(rows.into_iter().filter_map(|r| r.posts).collect())
    }
}

#[async_trait]
impl ProfileGateway for RestGateway {
    async fn get_profile(&self, id: UserId) -> GatewayResult<Profile> {
        let rows: Vec<Profile> = self
            .fetch(self.request(Method::GET, "profiles").query(&[("select", "*".to_string()), ("id", eq(id))]))
            .await?;
        rows.into_iter().next().ok_or(GatewayError::NotFound)
    }

    async fn update_profile(&self, id: UserId, upd: ProfileUpdate) -> GatewayResult<()> {
        let rows: Vec<Profile> = self
            .fetch(
                self.request(Method::PATCH, "profiles")
                    .header("Prefer", "return=representation")
                    .query(&[("id", eq(id))])
                    .json(&upd),
            )
            .await?;
        if rows.is_empty() { return Err(GatewayError::NotFound); }
        Ok(())
    }
}
