use std::sync::Arc;

use crate::app::likes::{LikeHandle, LikeTarget, LikeToggleController};
use crate::domain::post::Post;
use crate::error::{EngineError, Result};
use crate::infra::api::BlogApi;
use crate::session::Session;

/// A loaded post plus the live like state backing the detail view.
#[derive(Debug)]
pub struct PostView {
    pub post: Post,
    pub like: LikeHandle,
}

pub struct PostService {
    api: Arc<dyn BlogApi>,
    session: Session,
    likes: LikeToggleController,
}

impl PostService {
    pub fn new(api: Arc<dyn BlogApi>, session: Session) -> Self {
        Self {
            likes: LikeToggleController::new(api.clone()),
            api,
            session,
        }
    }

    pub async fn load(&self, post_id: &str) -> Result<PostView> {
        let post = self.api.get_post(post_id).await?;
        let viewer = self.session.user_id();
        let liked = viewer
            .as_deref()
            .map(|id| post.liked_by(id))
            .unwrap_or(false);
        let like = LikeHandle::new(liked, post.like_count());
        Ok(PostView { post, like })
    }

    /// Optimistic like toggle. On success the local state stands as final;
    /// on failure it reverts to the pre-toggle values.
    pub async fn toggle_like(&self, view: &PostView) -> Result<()> {
        self.likes
            .toggle(LikeTarget::Post(&view.post.id), &view.like)
            .await
    }

    pub fn can_edit(&self, post: &Post) -> bool {
        self.session.user_id().as_deref() == Some(post.author.id.as_str())
    }

    pub async fn create(&self, title: &str, content: &str) -> Result<Post> {
        let (title, content) = validate_post_fields(title, content)?;
        Ok(self.api.create_post(title, content).await?)
    }

    pub async fn update(&self, post: &Post, title: &str, content: &str) -> Result<Post> {
        if !self.can_edit(post) {
            return Err(EngineError::NotAuthorized);
        }
        let (title, content) = validate_post_fields(title, content)?;
        Ok(self.api.update_post(&post.id, title, content).await?)
    }

    pub async fn delete(&self, post: &Post) -> Result<()> {
        if !self.can_edit(post) {
            return Err(EngineError::NotAuthorized);
        }
        Ok(self.api.delete_post(&post.id).await?)
    }
}

fn validate_post_fields<'a>(title: &'a str, content: &'a str) -> Result<(&'a str, &'a str)> {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() {
        return Err(EngineError::Validation("title must not be empty".into()));
    }
    if content.is_empty() {
        return Err(EngineError::Validation("content must not be empty".into()));
    }
    Ok((title, content))
}
