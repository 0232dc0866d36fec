//! Boundary between the bot and the discussion platform
//!
//! The decision loop only sees the [`Platform`] trait; [`RedditClient`] is the
//! production implementation and tests substitute an in-memory one.

pub mod reddit;

pub use reddit::RedditClient;

use crate::models::Comment;
use crate::models::InboxMessage;
use crate::models::Mention;
use crate::models::Post;
use crate::Result;

/// Operations the bot needs from the platform
///
/// Calls are awaited one at a time; implementations need not be `Sync`.
#[allow(async_fn_in_trait)]
pub trait Platform {
    /// Account name the bot is logged in as
    fn username(&self) -> &str;

    /// Newest posts across `streams`, newest first
    async fn fetch_new_posts(&self, streams: &[String], limit: u32) -> Result<Vec<Post>>;

    /// Reply to the post or comment named by `parent_fullname`
    async fn reply(&self, parent_fullname: &str, text: &str) -> Result<Comment>;

    /// Replace the text of one of the bot's own comments
    async fn edit(&self, fullname: &str, text: &str) -> Result<()>;

    async fn delete(&self, fullname: &str) -> Result<()>;

    async fn send_message(&self, user: &str, subject: &str, body: &str) -> Result<()>;

    /// Username mentions in the bot's inbox
    async fn fetch_mentions(&self) -> Result<Vec<Mention>>;

    /// Private messages in the bot's inbox
    async fn fetch_inbox_messages(&self) -> Result<Vec<InboxMessage>>;

    /// Comments written by `user`, newest first
    async fn fetch_user_comments(&self, user: &str) -> Result<Vec<Comment>>;

    /// Look up one comment by id, including its submission's author
    async fn fetch_comment(&self, id: &str) -> Result<Comment>;
}
