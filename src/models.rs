use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// A submission fetched from a polled community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    /// Type-prefixed id (`t3_...`) used as the parent of replies
    pub fullname: String,
    pub title: String,
    pub community: String,
    pub permalink: String,
    pub author: Option<String>,
}

/// A comment, usually one the bot wrote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub fullname: String,
    pub author: Option<String>,
    pub score: i64,
    /// Author of the submission the comment lives under, when known
    pub submission_author: Option<String>,
}

/// A username mention of the bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub id: String,
    pub author: Option<String>,
    pub community: String,
    /// Fullname of the thing the mention replied to (`t3_` post or `t1_` comment)
    pub parent_id: String,
    pub context: String,
    pub body: String,
}

impl Mention {
    /// Id of the parent submission, when the mention was a top-level reply
    pub fn parent_post_id(&self) -> Option<&str> {
        self.parent_id.strip_prefix("t3_")
    }
}

/// A private message in the bot's inbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxMessage {
    pub id: String,
    pub author: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Outcome recorded for an assessed post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prediction {
    /// Classifier says the title misspells the dish
    Mistake,
    /// Classifier says the usage is correct
    Correct,
    /// A user summoned the bot; no classification ran
    Summon,
}

impl Prediction {
    pub fn from_label(label: bool) -> Self {
        if label {
            Self::Mistake
        } else {
            Self::Correct
        }
    }

    pub fn is_mistake(self) -> bool {
        matches!(self, Self::Mistake)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mistake => "1",
            Self::Correct => "0",
            Self::Summon => "s",
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prediction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Self::Mistake),
            "0" => Ok(Self::Correct),
            "s" => Ok(Self::Summon),
            other => Err(format!("unknown prediction {other:?}")),
        }
    }
}

/// One line of the history log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRecord {
    pub post_id: String,
    pub prediction: Prediction,
    /// Whether the bot commented
    pub action: bool,
    pub community: String,
    pub title: String,
}

impl DecisionRecord {
    pub fn new(
        post_id: impl Into<String>,
        prediction: Prediction,
        action: bool,
        community: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            post_id: post_id.into(),
            prediction,
            action,
            community: community.into(),
            title: title.into(),
        }
    }
}

/// Tallies for one pass of the bot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub assessed: usize,
    pub commented: usize,
    pub summons_answered: usize,
    pub comments_removed: usize,
}
