use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lierre::config::ClientConfig;
use lierre::ClientState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env()?;
    let state = ClientState::connect(&config)?;

    let feed = state.feed();
    if let Some(search) = std::env::args().nth(1) {
        feed.set_search(search);
    }
    feed.refresh().await?;

    let posts = feed.posts();
    if posts.is_empty() {
        println!("no blog posts yet");
        return Ok(());
    }

    for post in &posts {
        println!(
            "{}  {}  by {}  [{} likes]",
            post.id,
            post.title,
            post.author.username,
            post.like_count()
        );
    }
    println!(
        "page {} of {} ({} matching posts)",
        feed.page(),
        feed.total_pages(),
        feed.total()
    );

    Ok(())
}
