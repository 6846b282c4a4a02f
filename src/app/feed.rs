use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::domain::post::Post;
use crate::error::Result;
use crate::infra::api::BlogApi;

pub const DEFAULT_PAGE_SIZE: u32 = 5;

struct FeedState {
    search: String,
    page: u32,
    posts: Vec<Post>,
    total: u64,
    loaded_once: bool,
    // Bumped on every search/page change; an in-flight fetch only lands if
    // nothing newer superseded it.
    generation: u64,
}

/// Owns the feed snapshot: search term, 1-indexed page, the fetched posts
/// and the total matching count. Pagination arithmetic lives here.
pub struct FeedService {
    api: Arc<dyn BlogApi>,
    page_size: u32,
    state: Mutex<FeedState>,
}

impl FeedService {
    pub fn new(api: Arc<dyn BlogApi>, page_size: u32) -> Self {
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        Self {
            api,
            page_size,
            state: Mutex::new(FeedState {
                search: String::new(),
                page: 1,
                posts: Vec::new(),
                total: 0,
                loaded_once: false,
                generation: 0,
            }),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn search(&self) -> String {
        self.state.lock().unwrap().search.clone()
    }

    pub fn page(&self) -> u32 {
        self.state.lock().unwrap().page
    }

    pub fn posts(&self) -> Vec<Post> {
        self.state.lock().unwrap().posts.clone()
    }

    pub fn total(&self) -> u64 {
        self.state.lock().unwrap().total
    }

    pub fn total_pages(&self) -> u32 {
        let total = self.total();
        let page_size = self.page_size as u64;
        ((total + page_size - 1) / page_size) as u32
    }

    /// 1-indexed page choices for the selector UI; empty when nothing matches.
    pub fn page_numbers(&self) -> Vec<u32> {
        (1..=self.total_pages()).collect()
    }

    /// Changing the search term always lands the feed back on page 1 before
    /// any fetch fires.
    pub fn set_search(&self, term: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.search = term.into();
        state.page = 1;
        state.generation += 1;
    }

    pub fn set_page(&self, page: u32) {
        let mut state = self.state.lock().unwrap();
        state.page = page.max(1);
        state.generation += 1;
    }

    /// Fetches the current search/page. On failure the previously fetched
    /// page stays displayed, except on first load where the feed shows empty;
    /// either way the error is returned for display.
    pub async fn refresh(&self) -> Result<()> {
        let (search, page, generation) = {
            let state = self.state.lock().unwrap();
            (state.search.clone(), state.page, state.generation)
        };

        match self.api.search_posts(&search, page, self.page_size).await {
            Ok(feed) => {
                let mut state = self.state.lock().unwrap();
                if state.generation != generation {
                    debug!(search = %search, page, "discarding stale feed page");
                    return Ok(());
                }
                state.posts = feed.posts;
                state.total = feed.total;
                state.loaded_once = true;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, search = %search, page, "feed fetch failed");
                let mut state = self.state.lock().unwrap();
                if state.generation == generation && !state.loaded_once {
                    state.posts.clear();
                    state.total = 0;
                }
                Err(err.into())
            }
        }
    }
}
