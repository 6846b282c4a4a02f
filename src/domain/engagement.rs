use serde::{Deserialize, Serialize};

use crate::domain::post::Author;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "user")]
    pub author: Author,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "post")]
    pub post_id: String,
    #[serde(rename = "user")]
    pub author: Author,
    pub text: String,
    #[serde(default)]
    pub likes: Vec<String>,
    /// Insertion order is display order; append-only from the client's view.
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Comment {
    pub fn like_count(&self) -> u64 {
        self.likes.len() as u64
    }

    pub fn liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    pub fn reply(&self, reply_id: &str) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == reply_id)
    }
}
