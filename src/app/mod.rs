pub mod feed;
pub mod likes;
pub mod posts;
pub mod thread;
