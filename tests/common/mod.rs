#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use time::OffsetDateTime;

use lierre::domain::engagement::{Comment, Reply};
use lierre::domain::post::{Author, FeedPage, Post};
use lierre::infra::api::{ApiError, BlogApi};
use lierre::session::Session;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn author(id: &str, username: &str) -> Author {
    Author {
        id: id.to_string(),
        username: username.to_string(),
    }
}

pub fn post(id: &str, title: &str, by: Author, likes: &[&str]) -> Post {
    Post {
        id: id.to_string(),
        title: title.to_string(),
        content: format!("<p>{}</p>", title),
        author: by,
        likes: likes.iter().map(|s| s.to_string()).collect(),
        created_at: OffsetDateTime::now_utc(),
    }
}

pub fn comment(
    id: &str,
    post_id: &str,
    by: Author,
    text: &str,
    likes: &[&str],
    replies: Vec<Reply>,
) -> Comment {
    Comment {
        id: id.to_string(),
        post_id: post_id.to_string(),
        author: by,
        text: text.to_string(),
        likes: likes.iter().map(|s| s.to_string()).collect(),
        replies,
    }
}

pub fn reply(id: &str, by: Author, text: &str) -> Reply {
    Reply {
        id: id.to_string(),
        author: by,
        text: text.to_string(),
    }
}

/// Builds a credential whose payload segment decodes to `{"id": user_id}`,
/// shaped like the tokens the authentication collaborator issues.
pub fn make_token(user_id: &str) -> String {
    let claims = serde_json::json!({ "id": user_id, "iat": 1_700_000_000 });
    format!("header.{}.signature", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

/// Points the session and the fake server at the same user.
pub fn login(api: &FakeApi, user_id: &str) -> Session {
    api.set_viewer(user_id);
    Session::with_token(make_token(user_id))
}

// ---------------------------------------------------------------------------
// FakeApi — in-memory stand-in for the remote platform
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeState {
    posts: Vec<Post>,
    comments: Vec<Comment>,
    viewer: Option<String>,
    failing: HashSet<String>,
    fail_once: HashSet<String>,
    delay_once: HashMap<String, u64>,
    calls: HashMap<String, u32>,
    next_id: u64,
}

/// In-memory `BlogApi` with per-endpoint failure injection, one-shot delays
/// and request counters, so tests can observe which requests fired and drive
/// in-flight interleavings deterministically.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The user id the server attributes bearer-authenticated calls to.
    pub fn set_viewer(&self, user_id: &str) {
        self.state.lock().unwrap().viewer = Some(user_id.to_string());
    }

    pub fn add_post(&self, post: Post) {
        self.state.lock().unwrap().posts.push(post);
    }

    /// Seeds `count` posts titled "post 1".."post N", all by the same author.
    pub fn seed_posts(&self, count: usize) {
        let mut state = self.state.lock().unwrap();
        for i in 1..=count {
            state.posts.push(post(
                &format!("p{}", i),
                &format!("post {}", i),
                author("u9", "seeder"),
                &[],
            ));
        }
    }

    pub fn add_comment(&self, comment: Comment) {
        self.state.lock().unwrap().comments.push(comment);
    }

    /// Server-side view of one comment, for asserting authoritative state.
    pub fn comment_snapshot(&self, comment_id: &str) -> Option<Comment> {
        self.state
            .lock()
            .unwrap()
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .cloned()
    }

    pub fn post_snapshot(&self, post_id: &str) -> Option<Post> {
        self.state
            .lock()
            .unwrap()
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
    }

    /// Every call to `endpoint` fails with a 500 until cleared.
    pub fn set_failing(&self, endpoint: &str, failing: bool) {
        let mut state = self.state.lock().unwrap();
        if failing {
            state.failing.insert(endpoint.to_string());
        } else {
            state.failing.remove(endpoint);
        }
    }

    /// The next call to `endpoint` fails with a 500; later calls succeed.
    pub fn fail_next(&self, endpoint: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_once
            .insert(endpoint.to_string());
    }

    /// The next call to `endpoint` sleeps before answering, keeping that
    /// request in flight while the test interleaves other operations.
    pub fn delay_next(&self, endpoint: &str, millis: u64) {
        self.state
            .lock()
            .unwrap()
            .delay_once
            .insert(endpoint.to_string(), millis);
    }

    pub fn calls(&self, endpoint: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    async fn begin(&self, endpoint: &str) -> Result<(), ApiError> {
        let (delay, fail) = {
            let mut state = self.state.lock().unwrap();
            *state.calls.entry(endpoint.to_string()).or_insert(0) += 1;
            let delay = state.delay_once.remove(endpoint);
            let fail = state.failing.contains(endpoint) || state.fail_once.remove(endpoint);
            (delay, fail)
        };
        if let Some(millis) = delay {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        if fail {
            return Err(ApiError::Status {
                status: 500,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        format!("{}{}", prefix, 100 + state.next_id)
    }

    fn viewer_author(&self) -> Result<Author, ApiError> {
        let state = self.state.lock().unwrap();
        match &state.viewer {
            Some(id) => Ok(author(id, &format!("user-{}", id))),
            None => Err(ApiError::Status {
                status: 401,
                message: "missing token".to_string(),
            }),
        }
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("{} not found", what),
    }
}

#[async_trait]
impl BlogApi for FakeApi {
    async fn search_posts(
        &self,
        search: &str,
        page: u32,
        limit: u32,
    ) -> Result<FeedPage, ApiError> {
        self.begin("search_posts").await?;
        let state = self.state.lock().unwrap();
        let needle = search.to_lowercase();
        let matching: Vec<Post> = state
            .posts
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let start = ((page.max(1) - 1) * limit) as usize;
        let posts = matching
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect();
        Ok(FeedPage { posts, total })
    }

    async fn get_post(&self, post_id: &str) -> Result<Post, ApiError> {
        self.begin("get_post").await?;
        self.post_snapshot(post_id).ok_or_else(|| not_found("post"))
    }

    async fn create_post(&self, title: &str, content: &str) -> Result<Post, ApiError> {
        self.begin("create_post").await?;
        let by = self.viewer_author()?;
        let created = Post {
            id: self.fresh_id("p"),
            title: title.to_string(),
            content: content.to_string(),
            author: by,
            likes: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.state.lock().unwrap().posts.push(created.clone());
        Ok(created)
    }

    async fn update_post(
        &self,
        post_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Post, ApiError> {
        self.begin("update_post").await?;
        let by = self.viewer_author()?;
        let mut state = self.state.lock().unwrap();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| not_found("post"))?;
        if post.author.id != by.id {
            return Err(ApiError::Status {
                status: 403,
                message: "not the author".to_string(),
            });
        }
        post.title = title.to_string();
        post.content = content.to_string();
        Ok(post.clone())
    }

    async fn toggle_post_like(&self, post_id: &str) -> Result<(), ApiError> {
        self.begin("toggle_post_like").await?;
        let by = self.viewer_author()?;
        let mut state = self.state.lock().unwrap();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| not_found("post"))?;
        if post.likes.iter().any(|id| id == &by.id) {
            post.likes.retain(|id| id != &by.id);
        } else {
            post.likes.push(by.id);
        }
        Ok(())
    }

    async fn delete_post(&self, post_id: &str) -> Result<(), ApiError> {
        self.begin("delete_post").await?;
        let by = self.viewer_author()?;
        let mut state = self.state.lock().unwrap();
        let post = state
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .ok_or_else(|| not_found("post"))?;
        if post.author.id != by.id {
            return Err(ApiError::Status {
                status: 403,
                message: "not the author".to_string(),
            });
        }
        state.posts.retain(|p| p.id != post_id);
        Ok(())
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, ApiError> {
        self.begin("list_comments").await?;
        let state = self.state.lock().unwrap();
        Ok(state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn create_comment(&self, post_id: &str, text: &str) -> Result<Comment, ApiError> {
        self.begin("create_comment").await?;
        let by = self.viewer_author()?;
        let created = Comment {
            id: self.fresh_id("c"),
            post_id: post_id.to_string(),
            author: by,
            text: text.to_string(),
            likes: Vec::new(),
            replies: Vec::new(),
        };
        self.state.lock().unwrap().comments.push(created.clone());
        Ok(created)
    }

    async fn create_reply(&self, comment_id: &str, text: &str) -> Result<Reply, ApiError> {
        self.begin("create_reply").await?;
        let by = self.viewer_author()?;
        let created = Reply {
            id: self.fresh_id("r"),
            author: by,
            text: text.to_string(),
        };
        let mut state = self.state.lock().unwrap();
        let comment = state
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| not_found("comment"))?;
        comment.replies.push(created.clone());
        Ok(created)
    }

    async fn toggle_comment_like(&self, comment_id: &str) -> Result<(), ApiError> {
        self.begin("toggle_comment_like").await?;
        let by = self.viewer_author()?;
        let mut state = self.state.lock().unwrap();
        let comment = state
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| not_found("comment"))?;
        if comment.likes.iter().any(|id| id == &by.id) {
            comment.likes.retain(|id| id != &by.id);
        } else {
            comment.likes.push(by.id);
        }
        Ok(())
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError> {
        self.begin("delete_comment").await?;
        let mut state = self.state.lock().unwrap();
        if !state.comments.iter().any(|c| c.id == comment_id) {
            return Err(not_found("comment"));
        }
        // Replies are embedded in the comment, so the cascade is implicit.
        state.comments.retain(|c| c.id != comment_id);
        Ok(())
    }

    async fn delete_reply(&self, comment_id: &str, reply_id: &str) -> Result<(), ApiError> {
        self.begin("delete_reply").await?;
        let mut state = self.state.lock().unwrap();
        let comment = state
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| not_found("comment"))?;
        if !comment.replies.iter().any(|r| r.id == reply_id) {
            return Err(not_found("reply"));
        }
        comment.replies.retain(|r| r.id != reply_id);
        Ok(())
    }
}
