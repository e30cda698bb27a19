#![cfg(feature = "rest-gateway")]

use serde_json::json;
use snipfeed::gateway::{LikeGateway, PostGateway, ProfileGateway};
use snipfeed::models::{PostQuery, ProfileUpdate};
use snipfeed::rest::RestGateway;
use snipfeed::session::Session;
use snipfeed::GatewayError;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POST_ID: &str = "6f1c2b3a-0000-4000-8000-000000000001";
const USER_ID: &str = "6f1c2b3a-0000-4000-8000-000000000002";

fn post_row(title: &str, language: &str, likes: i64) -> serde_json::Value {
    json!({
        "id": POST_ID,
        "title": title,
        "initial_code": "slow()",
        "optimized_code": "fast()",
        "language": language,
        "user_id": USER_ID,
        "created_at": "2024-03-01T10:00:00.123456+00:00",
        "profiles": { "username": "sarah_dev" },
        "likes": [ { "count": likes } ]
    })
}

async fn server() -> (MockServer, RestGateway) {
    let server = MockServer::start().await;
    let gw = RestGateway::new(server.uri(), "anon-key");
    (server, gw)
}

#[tokio::test]
async fn list_posts_sends_filter_order_and_keys() {
    let (server, gw) = server().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .and(query_param("select", "*,profiles(username),likes(count)"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("language", "eq.python"))
        .and(query_param("limit", "20"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_row("fast loop", "python", 3)])))
        .expect(1)
        .mount(&server)
        .await;

    let posts = gw.list_posts(PostQuery::default().language("python").limit(20)).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].author.username, "sarah_dev");
    assert_eq!(posts[0].like_count, 3);
}

#[tokio::test]
async fn session_token_is_used_as_bearer() {
    let (server, gw) = server().await;
    let session = Session { user_id: Uuid::parse_str(USER_ID).unwrap(), email: None, access_token: "user-jwt".into() };
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{USER_ID}")))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": USER_ID, "username": "sarah_dev", "bio": null, "github_url": "https://github.com/sarah" }
        ])))
        .mount(&server)
        .await;

    let p = gw.with_session(&session).get_profile(session.user_id).await.unwrap();
    assert_eq!(p.username, "sarah_dev");
    assert_eq!(p.bio, None);
}

#[tokio::test]
async fn empty_profile_result_is_not_found() {
    let (server, gw) = server().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    assert_eq!(gw.get_profile(Uuid::new_v4()).await.unwrap_err(), GatewayError::NotFound);
}

#[tokio::test]
async fn languages_are_distinct_and_sorted() {
    let (server, gw) = server().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .and(query_param("select", "language"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"language": "typescript"}, {"language": "python"}, {"language": "typescript"}
        ])))
        .mount(&server)
        .await;
    assert_eq!(gw.list_languages().await.unwrap(), ["python", "typescript"]);
}

#[tokio::test]
async fn like_snapshot_reads_count_and_viewer_from_one_response() {
    let (server, gw) = server().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .and(query_param("select", "id,likes(count),viewer:likes(user_id)"))
        .and(query_param("id", format!("eq.{POST_ID}")))
        .and(query_param("viewer.user_id", format!("eq.{USER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": POST_ID, "likes": [ { "count": 7 } ], "viewer": [ { "user_id": USER_ID } ] }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let snap = gw
        .like_snapshot(Uuid::parse_str(POST_ID).unwrap(), Uuid::parse_str(USER_ID).unwrap())
        .await
        .unwrap();
    assert_eq!(snap.count, 7);
    assert!(snap.liked);
}

#[tokio::test]
async fn duplicate_like_maps_to_conflict() {
    let (server, gw) = server().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/likes"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({ "post_id": POST_ID, "user_id": USER_ID })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505", "message": "duplicate key value violates unique constraint"
        })))
        .mount(&server)
        .await;

    let err = gw
        .insert_like(Uuid::parse_str(POST_ID).unwrap(), Uuid::parse_str(USER_ID).unwrap())
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Conflict);
}

#[tokio::test]
async fn delete_without_matching_row_is_not_found() {
    let (server, gw) = server().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/likes"))
        .and(query_param("post_id", format!("eq.{POST_ID}")))
        .and(query_param("user_id", format!("eq.{USER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = gw
        .delete_like(Uuid::parse_str(POST_ID).unwrap(), Uuid::parse_str(USER_ID).unwrap())
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::NotFound);
}

#[tokio::test]
async fn liked_posts_unwraps_embedded_rows() {
    let (server, gw) = server().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/likes"))
        .and(query_param("select", "posts(*,profiles(username),likes(count))"))
        .and(query_param("user_id", format!("eq.{USER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "posts": post_row("liked one", "typescript", 1) },
            { "posts": null }
        ])))
        .mount(&server)
        .await;

    let liked = gw.liked_posts(Uuid::parse_str(USER_ID).unwrap()).await.unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].post.title, "liked one");
}

#[tokio::test]
async fn profile_update_is_one_patch() {
    let (server, gw) = server().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{USER_ID}")))
        .and(body_json(json!({ "bio": "new", "github_url": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": USER_ID, "username": "sarah_dev", "bio": "new", "github_url": null }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    gw.update_profile(
        Uuid::parse_str(USER_ID).unwrap(),
        ProfileUpdate { bio: Some("new".into()), github_url: None },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn expired_session_maps_to_unauthorized() {
    let (server, gw) = server().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "JWT expired" })))
        .mount(&server)
        .await;
    assert_eq!(gw.list_posts(PostQuery::default()).await.unwrap_err(), GatewayError::Unauthorized);
}
