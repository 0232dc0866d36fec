//! The classify-and-react pass
//!
//! One pass runs three independent scans in order: new posts, summons, and
//! purging of unwanted bot comments. Every decision is appended to history
//! before the matching reply is posted, so a pass that dies halfway can be
//! rerun without double-commenting on what it already handled.

pub mod decision;

use std::path::Path;

use tracing::debug;
use tracing::info;
use tracing::warn;

pub use decision::decide;
pub use decision::Decision;
pub use decision::Reason;

use crate::classifier::Classifier;
use crate::errors::TonkbotError;
use crate::history::DeletedLog;
use crate::history::HistoryLog;
use crate::models::Comment;
use crate::models::DecisionRecord;
use crate::models::Post;
use crate::models::Prediction;
use crate::models::RunSummary;
use crate::platform::Platform;
use crate::AppConfig;
use crate::Result;

pub const FOUND_SUBJECT: &str = "Tonkatsu Found";
pub const SUMMONED_SUBJECT: &str = "Bot Summoned";
pub const REMOVED_SUBJECT: &str = "Comment Removed";

/// Placeholder in the comment template replaced by the reply's fullname
const ID_PLACEHOLDER: &str = "{id}";
const NO_TITLE: &str = "NA";

/// Read the canned reply text
pub fn read_comment_template(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(TonkbotError::MissingFile(path.to_path_buf()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Remove every `?context=<digits>` from a mention's context link
fn strip_context_query(context: &str) -> String {
    const MARKER: &str = "?context=";
    let mut out = String::with_capacity(context.len());
    let mut rest = context;
    while let Some(start) = rest.find(MARKER) {
        let after = &rest[start + MARKER.len()..];
        let digits = after.len() - after.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            out.push_str(&rest[..start + MARKER.len()]);
        } else {
            out.push_str(&rest[..start]);
        }
        rest = &after[digits..];
    }
    out.push_str(rest);
    out
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// State for one pass of the bot
pub struct Bot<'a, P: Platform> {
    config: &'a AppConfig,
    platform: &'a P,
    classifier: &'a Classifier,
    comment_template: String,
    history: HistoryLog,
    deleted: DeletedLog,
}

impl<'a, P: Platform> Bot<'a, P> {
    /// Read the comment template and both logs named in `config.paths`
    pub fn new(config: &'a AppConfig, platform: &'a P, classifier: &'a Classifier) -> Result<Self> {
        Ok(Self {
            config,
            platform,
            classifier,
            comment_template: read_comment_template(&config.paths.comment)?,
            history: HistoryLog::open(&config.paths.history)?,
            deleted: DeletedLog::open(&config.paths.deleted)?,
        })
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn deleted(&self) -> &DeletedLog {
        &self.deleted
    }

    /// Run every scan once
    pub async fn run_once(&mut self) -> Result<RunSummary> {
        let (assessed, commented) = self.investigate().await?;
        let summons_answered = self.check_summons().await?;
        let comments_removed = self.purge().await?;

        Ok(RunSummary {
            assessed,
            commented,
            summons_answered,
            comments_removed,
        })
    }

    /// Scan new posts for the target term and react to unseen ones
    ///
    /// Returns `(assessed, commented)`.
    pub async fn investigate(&mut self) -> Result<(usize, usize)> {
        let term = self.config.target_term();
        let limit = self.config.bot.max_posts_per_run;

        info!("Scanning posts...");
        let posts = self
            .platform
            .fetch_new_posts(&self.config.bot.streams, self.config.bot.fetch_limit)
            .await?;
        debug!("Fetched {} posts", posts.len());

        let mut assessed = 0;
        let mut commented = 0;
        for post in posts {
            if !post.title.to_lowercase().contains(&term) || self.history.contains(&post.id) {
                continue;
            }
            info!("{term} found in post: {}", post.id);
            info!("Post title: {}", post.title);

            let prediction = self.classifier.classify(&post.title)?;
            let decision = decide(prediction, &post.community, self.config);
            self.react_to_post(&post, &decision).await?;
            self.notify(FOUND_SUBJECT, &decision::found_message(&decision, &post))
                .await?;

            assessed += 1;
            if decision.act {
                commented += 1;
            }
            if limit != 0 && assessed >= limit {
                break;
            }
        }

        info!("Done scanning.");
        info!("Commented on {commented} post{}.", plural(commented));
        Ok((assessed, commented))
    }

    /// Record the decision, then comment when the decision says so
    async fn react_to_post(&mut self, post: &Post, decision: &Decision) -> Result<()> {
        info!(
            "Model predicted {}correct spelling. {}ommenting.",
            if decision.prediction.is_mistake() { "in" } else { "" },
            if decision.act { "C" } else { "Not c" }
        );

        self.history.append(&DecisionRecord::new(
            &post.id,
            decision.prediction,
            decision.act,
            &post.community,
            &post.title,
        ))?;

        if decision.act {
            self.leave_comment(&post.fullname).await?;
            info!("Commented on post.");
        }
        Ok(())
    }

    /// Reply with the template, then fill in the reply's own fullname
    async fn leave_comment(&self, parent_fullname: &str) -> Result<Comment> {
        let comment = self
            .platform
            .reply(parent_fullname, &self.comment_template)
            .await?;

        if self.comment_template.contains(ID_PLACEHOLDER) {
            let text = self
                .comment_template
                .replace(ID_PLACEHOLDER, &comment.fullname);
            self.platform.edit(&comment.fullname, &text).await?;
        }
        Ok(comment)
    }

    /// Message the bot account and the operator account
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        for recipient in self.config.notification_recipients() {
            self.platform.send_message(recipient, subject, body).await?;
        }
        debug!("Sent messages.");
        Ok(())
    }

    /// Answer unseen username mentions without consulting the classifier
    ///
    /// Returns the number of summons answered with a comment.
    pub async fn check_summons(&mut self) -> Result<usize> {
        info!("Checking for summons...");
        let mentions = self.platform.fetch_mentions().await?;

        let mut answered = 0;
        for mention in mentions {
            if self.history.contains(&mention.id) {
                continue;
            }
            info!("Summon found: {}", mention.id);

            let post_id = mention.parent_post_id().map(ToString::to_string);
            let post_seen = post_id
                .as_deref()
                .is_some_and(|id| self.history.contains(id));
            let act = match &post_id {
                None => {
                    info!("Summon was not a reply to a post, recording only");
                    false
                }
                Some(_) if post_seen => {
                    info!("Post already handled, recording only");
                    false
                }
                Some(_) if self.config.is_summon_excluded(&mention.community) => {
                    info!("Summons in {} are not answered", mention.community);
                    false
                }
                Some(_) => true,
            };

            self.history.append(&DecisionRecord::new(
                &mention.id,
                Prediction::Summon,
                act,
                &mention.community,
                NO_TITLE,
            ))?;
            if let Some(id) = post_id.as_deref().filter(|id| !self.history.contains(id)) {
                self.history.append(&DecisionRecord::new(
                    id,
                    Prediction::Summon,
                    act,
                    &mention.community,
                    NO_TITLE,
                ))?;
            }

            if act {
                info!("Responding to summon.");
                self.leave_comment(&mention.parent_id).await?;
                if let Some(summoner) = &mention.author {
                    self.platform
                        .reply(
                            &format!("t1_{}", mention.id),
                            &format!("Thank you /u/{summoner} for the tip!"),
                        )
                        .await?;
                    debug!("Thanked {summoner}");
                }
                answered += 1;
            }

            let body = format!(
                "Summon found: [{}]({})\n\n\"{}\"",
                mention.id,
                strip_context_query(&mention.context),
                mention.body
            );
            self.notify(SUMMONED_SUBJECT, &body).await?;
        }

        info!("Done checking for summons.");
        Ok(answered)
    }

    /// Remove downvoted bot comments and honour deletion requests
    ///
    /// Returns the number of comments deleted.
    pub async fn purge(&mut self) -> Result<usize> {
        let me = self.platform.username().to_string();
        let threshold = self.config.bot.downvote_threshold;
        let mut removed = 0;

        info!("Scanning bot comments...");
        for comment in self.platform.fetch_user_comments(&me).await? {
            if comment.score < threshold && !self.deleted.contains(&comment.id) {
                info!("Comment {} scored {}", comment.id, comment.score);
                if self.remove_comment(&comment).await? {
                    removed += 1;
                }
            }
        }

        info!("Scanning PMs...");
        for message in self.platform.fetch_inbox_messages().await? {
            if message.subject != self.config.bot.deletion_subject {
                continue;
            }
            let requested = message.body.trim();
            let requested = requested.strip_prefix("t1_").unwrap_or(requested);
            if requested.is_empty() || self.deleted.contains(requested) {
                continue;
            }

            let comment = match self.platform.fetch_comment(requested).await {
                Ok(comment) => comment,
                Err(e) => {
                    warn!("Deletion request {} names an unknown comment: {e}", message.id);
                    continue;
                }
            };
            if self.deleted.contains(&comment.id) {
                continue;
            }

            let is_post_author = message.author.is_some()
                && comment.submission_author.is_some()
                && message.author == comment.submission_author;
            if is_post_author {
                if self.remove_comment(&comment).await? {
                    removed += 1;
                }
            } else {
                info!(
                    "Ignoring deletion request for {} from {}: not the post author",
                    comment.id,
                    message.author.as_deref().unwrap_or("[deleted]")
                );
            }
        }

        info!("Done purging.");
        Ok(removed)
    }

    /// Delete `comment` if the bot wrote it; record it as settled either way
    async fn remove_comment(&mut self, comment: &Comment) -> Result<bool> {
        let platform = self.platform;
        let me = platform.username();
        let is_mine = comment.author.as_deref() == Some(me);

        if is_mine {
            platform.delete(&comment.fullname).await?;
            let msg = format!("Comment removed: {}.", comment.id);
            platform.send_message(me, REMOVED_SUBJECT, &msg).await?;
            info!("{msg}");
        } else {
            info!(
                "Comment by {}, leaving it in place",
                comment.author.as_deref().unwrap_or("[deleted]")
            );
        }

        self.deleted.append(&comment.id)?;
        Ok(is_mine)
    }
}
