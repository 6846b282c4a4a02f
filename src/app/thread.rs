use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::app::likes::{LikeHandle, LikeTarget, LikeToggleController};
use crate::domain::engagement::{Comment, Reply};
use crate::error::{EngineError, Result};
use crate::infra::api::BlogApi;
use crate::session::Session;

struct ThreadState {
    comments: Vec<Comment>,
    like_states: HashMap<String, LikeHandle>,
    // Local-only visibility state, keyed by comment id; never sent to the
    // server and preserved across re-fetches.
    expanded_replies: HashMap<String, bool>,
    comments_visible: bool,
    generation: u64,
}

/// Owns the comment/reply tree for exactly one post.
///
/// The server's comment list is the sole source of truth: every mutation
/// re-fetches the whole tree rather than merging incrementally. Owner-gated
/// deletes are rejected locally before a request is issued.
pub struct ThreadService {
    api: Arc<dyn BlogApi>,
    session: Session,
    likes: LikeToggleController,
    post_id: String,
    state: Mutex<ThreadState>,
}

impl ThreadService {
    pub fn new(api: Arc<dyn BlogApi>, session: Session, post_id: impl Into<String>) -> Self {
        Self {
            likes: LikeToggleController::new(api.clone()),
            api,
            session,
            post_id: post_id.into(),
            state: Mutex::new(ThreadState {
                comments: Vec::new(),
                like_states: HashMap::new(),
                expanded_replies: HashMap::new(),
                comments_visible: true,
                generation: 0,
            }),
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.state.lock().unwrap().comments.clone()
    }

    pub fn comment_count(&self) -> usize {
        self.state.lock().unwrap().comments.len()
    }

    /// Live like state for a loaded comment. The handle survives re-fetches,
    /// so in-flight toggles keep pointing at the state the view renders.
    pub fn comment_like(&self, comment_id: &str) -> Option<LikeHandle> {
        self.state
            .lock()
            .unwrap()
            .like_states
            .get(comment_id)
            .cloned()
    }

    /// Replaces the entire local tree with the server's current comment list.
    /// A load that was superseded by a newer one is discarded on arrival.
    pub async fn load_thread(&self) -> Result<()> {
        let generation = {
            let mut state = self.state.lock().unwrap();
            state.generation += 1;
            state.generation
        };

        let comments = self.api.list_comments(&self.post_id).await?;
        let viewer = self.session.user_id();

        let mut state = self.state.lock().unwrap();
        if state.generation != generation {
            debug!(post = %self.post_id, "discarding stale thread snapshot");
            return Ok(());
        }

        let mut like_states = HashMap::with_capacity(comments.len());
        for comment in &comments {
            let liked = viewer
                .as_deref()
                .map(|id| comment.liked_by(id))
                .unwrap_or(false);
            let count = comment.like_count();
            let handle = match state.like_states.get(&comment.id) {
                Some(handle) => {
                    handle.reconcile(liked, count);
                    handle.clone()
                }
                None => LikeHandle::new(liked, count),
            };
            like_states.insert(comment.id.clone(), handle);
        }
        state.like_states = like_states;
        state
            .expanded_replies
            .retain(|id, _| comments.iter().any(|c| &c.id == id));
        state.comments = comments;
        Ok(())
    }

    /// Creates a comment authored by the current identity, then re-fetches
    /// the thread for the canonical state. Whitespace-only text is rejected
    /// before any request; the local tree is untouched on failure so the
    /// caller can keep the form input and resubmit.
    pub async fn post_comment(&self, text: &str) -> Result<Comment> {
        let text = validate_text(text)?;
        let created = self.api.create_comment(&self.post_id, text).await?;
        self.load_thread().await?;
        Ok(created)
    }

    pub async fn post_reply(&self, comment_id: &str, text: &str) -> Result<Reply> {
        let text = validate_text(text)?;
        let created = self.api.create_reply(comment_id, text).await?;
        self.load_thread().await?;
        Ok(created)
    }

    /// Optimistic flip of the comment's like state, then a full re-fetch to
    /// reconcile the authoritative counts. A failed toggle reverts without
    /// re-fetching.
    pub async fn toggle_comment_like(&self, comment_id: &str) -> Result<()> {
        let handle = self
            .comment_like(comment_id)
            .ok_or_else(|| EngineError::Validation(format!("unknown comment: {}", comment_id)))?;
        self.likes
            .toggle(LikeTarget::Comment(comment_id), &handle)
            .await?;
        self.load_thread().await
    }

    pub fn can_delete_comment(&self, comment: &Comment) -> bool {
        self.session.user_id().as_deref() == Some(comment.author.id.as_str())
    }

    pub fn can_delete_reply(&self, reply: &Reply) -> bool {
        self.session.user_id().as_deref() == Some(reply.author.id.as_str())
    }

    /// Deletes a comment and, as a cascade, all of its replies. Only the
    /// comment's author may delete it; everyone else is rejected before any
    /// request. The removal is applied optimistically and reconciled by a
    /// re-fetch; on remote failure the re-fetch restores server truth.
    pub async fn delete_comment(&self, comment_id: &str) -> Result<()> {
        let author_id = {
            let state = self.state.lock().unwrap();
            state
                .comments
                .iter()
                .find(|c| c.id == comment_id)
                .map(|c| c.author.id.clone())
        }
        .ok_or_else(|| EngineError::Validation(format!("unknown comment: {}", comment_id)))?;

        if self.session.user_id().as_deref() != Some(author_id.as_str()) {
            return Err(EngineError::NotAuthorized);
        }

        {
            let mut state = self.state.lock().unwrap();
            state.comments.retain(|c| c.id != comment_id);
            state.like_states.remove(comment_id);
            state.expanded_replies.remove(comment_id);
        }

        match self.api.delete_comment(comment_id).await {
            Ok(()) => self.load_thread().await,
            Err(err) => {
                warn!(error = %err, comment = %comment_id, "comment delete failed");
                if let Err(reload_err) = self.load_thread().await {
                    warn!(error = %reload_err, "thread restore after failed delete also failed");
                }
                Err(err.into())
            }
        }
    }

    /// Deletes a single reply; the rest of the comment's replies stay.
    pub async fn delete_reply(&self, comment_id: &str, reply_id: &str) -> Result<()> {
        let author_id = {
            let state = self.state.lock().unwrap();
            state
                .comments
                .iter()
                .find(|c| c.id == comment_id)
                .and_then(|c| c.reply(reply_id))
                .map(|r| r.author.id.clone())
        }
        .ok_or_else(|| EngineError::Validation(format!("unknown reply: {}", reply_id)))?;

        if self.session.user_id().as_deref() != Some(author_id.as_str()) {
            return Err(EngineError::NotAuthorized);
        }

        {
            let mut state = self.state.lock().unwrap();
            if let Some(comment) = state.comments.iter_mut().find(|c| c.id == comment_id) {
                comment.replies.retain(|r| r.id != reply_id);
            }
        }

        match self.api.delete_reply(comment_id, reply_id).await {
            Ok(()) => self.load_thread().await,
            Err(err) => {
                warn!(error = %err, reply = %reply_id, "reply delete failed");
                if let Err(reload_err) = self.load_thread().await {
                    warn!(error = %reload_err, "thread restore after failed delete also failed");
                }
                Err(err.into())
            }
        }
    }

    pub fn replies_expanded(&self, comment_id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .expanded_replies
            .get(comment_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn toggle_replies(&self, comment_id: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        let expanded = state
            .expanded_replies
            .entry(comment_id.to_string())
            .or_insert(false);
        *expanded = !*expanded;
        *expanded
    }

    pub fn comments_visible(&self) -> bool {
        self.state.lock().unwrap().comments_visible
    }

    pub fn toggle_comments_visible(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.comments_visible = !state.comments_visible;
        state.comments_visible
    }
}

fn validate_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation("text must not be empty".into()));
    }
    Ok(trimmed)
}
