//! Pure decision rules for assessed posts

use crate::models::Post;
use crate::models::Prediction;
use crate::AppConfig;

/// Why the bot did or did not comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Commented,
    UnauthorizedCommunity,
    PredictedCorrect,
}

impl Reason {
    pub fn message(self) -> &'static str {
        match self {
            Self::Commented => "Commented on post",
            Self::UnauthorizedCommunity => "Predicted as incorrect, unauthorized sub",
            Self::PredictedCorrect => "Post predicted as correct",
        }
    }
}

/// Outcome of classifying one post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub prediction: Prediction,
    pub act: bool,
    pub reason: Reason,
}

/// Comment only on predicted mistakes in allow-listed communities
pub fn decide(prediction: Prediction, community: &str, config: &AppConfig) -> Decision {
    let (act, reason) = if !prediction.is_mistake() {
        (false, Reason::PredictedCorrect)
    } else if config.is_allowed_community(community) {
        (true, Reason::Commented)
    } else {
        (false, Reason::UnauthorizedCommunity)
    };
    Decision {
        prediction,
        act,
        reason,
    }
}

/// Notification body: `<reason>: [<id>](<permalink>)` then the quoted title
pub fn found_message(decision: &Decision, post: &Post) -> String {
    format!(
        "{}: [{}]({})\n\"{}\"",
        decision.reason.message(),
        post.id,
        post.permalink,
        post.title
    )
}
