pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod session;

use std::sync::Arc;

use crate::app::feed::FeedService;
use crate::app::posts::PostService;
use crate::app::thread::ThreadService;
use crate::config::ClientConfig;
use crate::infra::api::{BlogApi, HttpApi};
use crate::session::Session;

#[derive(Clone)]
pub struct ClientState {
    pub api: Arc<dyn BlogApi>,
    pub session: Session,
    pub feed_page_size: u32,
}

impl ClientState {
    pub fn connect(config: &ClientConfig) -> anyhow::Result<Self> {
        let session = match &config.auth_token {
            Some(token) => Session::with_token(token.clone()),
            None => Session::new(),
        };
        let api = HttpApi::new(config, session.clone())?;
        Ok(Self {
            api: Arc::new(api),
            session,
            feed_page_size: config.feed_page_size,
        })
    }

    pub fn feed(&self) -> FeedService {
        FeedService::new(self.api.clone(), self.feed_page_size)
    }

    pub fn posts(&self) -> PostService {
        PostService::new(self.api.clone(), self.session.clone())
    }

    pub fn thread(&self, post_id: impl Into<String>) -> ThreadService {
        ThreadService::new(self.api.clone(), self.session.clone(), post_id)
    }
}
