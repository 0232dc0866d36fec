use std::path::Path;
use std::sync::Mutex;

use tempfile::TempDir;
use tonkbot::bot::Bot;
use tonkbot::bot::FOUND_SUBJECT;
use tonkbot::bot::REMOVED_SUBJECT;
use tonkbot::bot::SUMMONED_SUBJECT;
use tonkbot::classifier::dataset::LabeledExample;
use tonkbot::classifier::trainer::fit_bundle;
use tonkbot::classifier::Classifier;
use tonkbot::history::HistoryLog;
use tonkbot::models::Comment;
use tonkbot::models::InboxMessage;
use tonkbot::models::Mention;
use tonkbot::models::Post;
use tonkbot::models::Prediction;
use tonkbot::platform::Platform;
use tonkbot::AppConfig;
use tonkbot::Result;
use tonkbot::TonkbotError;

const BOT: &str = "tonk_police";
const OPERATOR: &str = "operator";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Reply { parent: String, text: String },
    Edit { fullname: String, text: String },
    Delete(String),
    Message { to: String, subject: String },
}

/// In-memory platform that records every write
#[derive(Default)]
struct MockPlatform {
    posts: Vec<Post>,
    mentions: Vec<Mention>,
    inbox: Vec<InboxMessage>,
    own_comments: Vec<Comment>,
    known_comments: Vec<Comment>,
    calls: Mutex<Vec<Call>>,
}

impl MockPlatform {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn replies(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Reply { parent, text } => Some((parent, text)),
                _ => None,
            })
            .collect()
    }

    fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete(fullname) => Some(fullname),
                _ => None,
            })
            .collect()
    }

    fn messages_with_subject(&self, wanted: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Message { to, subject } if subject == wanted => Some(to),
                _ => None,
            })
            .collect()
    }
}

impl Platform for MockPlatform {
    fn username(&self) -> &str {
        BOT
    }

    async fn fetch_new_posts(&self, _streams: &[String], _limit: u32) -> Result<Vec<Post>> {
        Ok(self.posts.clone())
    }

    async fn reply(&self, parent_fullname: &str, text: &str) -> Result<Comment> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(Call::Reply {
            parent: parent_fullname.to_string(),
            text: text.to_string(),
        });
        let id = format!("c{}", calls.len());
        Ok(Comment {
            fullname: format!("t1_{id}"),
            id,
            author: Some(BOT.to_string()),
            score: 1,
            submission_author: None,
        })
    }

    async fn edit(&self, fullname: &str, text: &str) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Edit {
            fullname: fullname.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete(&self, fullname: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Delete(fullname.to_string()));
        Ok(())
    }

    async fn send_message(&self, user: &str, subject: &str, _body: &str) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Message {
            to: user.to_string(),
            subject: subject.to_string(),
        });
        Ok(())
    }

    async fn fetch_mentions(&self) -> Result<Vec<Mention>> {
        Ok(self.mentions.clone())
    }

    async fn fetch_inbox_messages(&self) -> Result<Vec<InboxMessage>> {
        Ok(self.inbox.clone())
    }

    async fn fetch_user_comments(&self, _user: &str) -> Result<Vec<Comment>> {
        Ok(self.own_comments.clone())
    }

    async fn fetch_comment(&self, id: &str) -> Result<Comment> {
        self.known_comments
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| TonkbotError::Platform(format!("no comment {id}")))
    }
}

fn labeled(title: &str, label: bool) -> LabeledExample {
    LabeledExample {
        title: title.to_string(),
        label,
        community: "ramen".to_string(),
    }
}

/// Ramen words mean the title meant tonkotsu; curry and cutlets mean it didn't
fn classifier() -> Classifier {
    let examples = vec![
        labeled("Tonkatsu ramen with chashu and egg", true),
        labeled("Rich tonkatsu ramen broth", true),
        labeled("Homemade tonkatsu ramen noodles", true),
        labeled("Tonkatsu broth noodles and chashu", true),
        labeled("Tonkatsu curry with rice", false),
        labeled("Crispy tonkatsu pork cutlet sandwich", false),
        labeled("Tonkatsu curry katsu sandwich", false),
        labeled("Fried pork cutlet tonkatsu with cabbage", false),
    ];
    let outcome = fit_bundle(&examples, "tonkatsu", 0.0, 7).unwrap();
    Classifier::from_bundle(outcome.bundle, true).unwrap()
}

fn post(id: &str, title: &str, community: &str) -> Post {
    Post {
        id: id.to_string(),
        fullname: format!("t3_{id}"),
        title: title.to_string(),
        community: community.to_string(),
        permalink: format!("/r/{community}/comments/{id}/"),
        author: Some("poster".to_string()),
    }
}

fn own_comment(id: &str, score: i64) -> Comment {
    Comment {
        id: id.to_string(),
        fullname: format!("t1_{id}"),
        author: Some(BOT.to_string()),
        score,
        submission_author: Some("poster".to_string()),
    }
}

fn setup(template: &str) -> (TempDir, AppConfig) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.reddit.username = BOT.to_string();
    config.reddit.human_account = OPERATOR.to_string();
    config.paths.comment = dir.path().join("comment.txt");
    config.paths.history = dir.path().join("id_file.txt");
    config.paths.deleted = dir.path().join("deleted.txt");
    std::fs::write(&config.paths.comment, template).unwrap();
    std::fs::write(&config.paths.history, "").unwrap();
    std::fs::write(&config.paths.deleted, "").unwrap();
    (dir, config)
}

fn reopen_history(path: &Path) -> HistoryLog {
    HistoryLog::open(path).unwrap()
}

#[tokio::test]
async fn test_misspelling_in_allowed_community_gets_comment() {
    let (_dir, config) = setup("You probably meant tonkotsu.");
    let classifier = classifier();
    let platform = MockPlatform {
        posts: vec![post("p1", "My first tonkatsu ramen bowl", "ramen")],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    let summary = bot.run_once().await.unwrap();

    assert_eq!(summary.assessed, 1);
    assert_eq!(summary.commented, 1);
    assert_eq!(
        platform.replies(),
        vec![("t3_p1".to_string(), "You probably meant tonkotsu.".to_string())]
    );
    assert_eq!(
        platform.messages_with_subject(FOUND_SUBJECT),
        vec![BOT.to_string(), OPERATOR.to_string()]
    );

    let entry = reopen_history(&config.paths.history).get("p1").unwrap();
    assert_eq!(entry.prediction, Prediction::Mistake);
    assert!(entry.action);
}

#[tokio::test]
async fn test_misspelling_outside_allowed_communities_is_only_recorded() {
    let (_dir, config) = setup("You probably meant tonkotsu.");
    let classifier = classifier();
    let platform = MockPlatform {
        posts: vec![post("p2", "Tonkatsu ramen noodles with chashu", "food")],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    let summary = bot.run_once().await.unwrap();

    assert_eq!(summary.assessed, 1);
    assert_eq!(summary.commented, 0);
    assert!(platform.replies().is_empty());
    assert_eq!(platform.messages_with_subject(FOUND_SUBJECT).len(), 2);

    let entry = bot.history().get("p2").unwrap();
    assert_eq!(entry.prediction, Prediction::Mistake);
    assert!(!entry.action);
}

#[tokio::test]
async fn test_correct_usage_is_left_alone() {
    let (_dir, config) = setup("You probably meant tonkotsu.");
    let classifier = classifier();
    let platform = MockPlatform {
        posts: vec![post("p3", "Tonkatsu curry with a pork cutlet", "ramen")],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    bot.run_once().await.unwrap();

    assert!(platform.replies().is_empty());
    let entry = bot.history().get("p3").unwrap();
    assert_eq!(entry.prediction, Prediction::Correct);
    assert!(!entry.action);
}

#[tokio::test]
async fn test_rerun_does_not_comment_twice() {
    let (_dir, config) = setup("You probably meant tonkotsu.");
    let classifier = classifier();
    let platform = MockPlatform {
        posts: vec![post("p1", "My first tonkatsu ramen bowl", "ramen")],
        ..Default::default()
    };

    let mut first = Bot::new(&config, &platform, &classifier).unwrap();
    first.run_once().await.unwrap();
    drop(first);

    let mut second = Bot::new(&config, &platform, &classifier).unwrap();
    let summary = second.run_once().await.unwrap();

    assert_eq!(summary.assessed, 0);
    assert_eq!(platform.replies().len(), 1);
    assert_eq!(reopen_history(&config.paths.history).len(), 1);
}

#[tokio::test]
async fn test_titles_without_term_are_skipped_and_limit_applies() {
    let (_dir, mut config) = setup("You probably meant tonkotsu.");
    config.bot.max_posts_per_run = 1;
    let classifier = classifier();
    let platform = MockPlatform {
        posts: vec![
            post("p0", "Shoyu ramen at home", "ramen"),
            post("p1", "My first tonkatsu ramen bowl", "ramen"),
            post("p2", "TONKATSU ramen broth again", "ramen"),
        ],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    let (assessed, _) = bot.investigate().await.unwrap();

    assert_eq!(assessed, 1);
    assert!(!bot.history().contains("p0"));
    assert!(bot.history().contains("p1"));
    assert!(!bot.history().contains("p2"));
}

#[tokio::test]
async fn test_template_id_placeholder_is_filled_by_edit() {
    let (_dir, config) = setup("Wrong soup? [delete](/message/compose?subject=deletion&message={id})");
    let classifier = classifier();
    let platform = MockPlatform {
        posts: vec![post("p1", "My first tonkatsu ramen bowl", "ramen")],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    bot.investigate().await.unwrap();

    let edits: Vec<Call> = platform
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::Edit { .. }))
        .collect();
    assert_eq!(
        edits,
        vec![Call::Edit {
            fullname: "t1_c1".to_string(),
            text: "Wrong soup? [delete](/message/compose?subject=deletion&message=t1_c1)".to_string(),
        }]
    );
}

fn mention(id: &str, parent_id: &str, community: &str) -> Mention {
    Mention {
        id: id.to_string(),
        author: Some("helper".to_string()),
        community: community.to_string(),
        parent_id: parent_id.to_string(),
        context: format!("/r/{community}/comments/p9/x/{id}/?context=3"),
        body: format!("/u/{BOT} look at this"),
    }
}

#[tokio::test]
async fn test_summons_are_answered_and_thanked_once() {
    let (_dir, config) = setup("You probably meant tonkotsu.");
    let classifier = classifier();
    let platform = MockPlatform {
        mentions: vec![mention("m1", "t3_p9", "ramen")],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    assert_eq!(bot.check_summons().await.unwrap(), 1);
    assert_eq!(
        platform.replies(),
        vec![
            ("t3_p9".to_string(), "You probably meant tonkotsu.".to_string()),
            ("t1_m1".to_string(), "Thank you /u/helper for the tip!".to_string()),
        ]
    );
    assert_eq!(platform.messages_with_subject(SUMMONED_SUBJECT).len(), 2);
    assert_eq!(bot.history().get("m1").unwrap().prediction, Prediction::Summon);
    assert!(bot.history().get("p9").unwrap().action);

    assert_eq!(bot.check_summons().await.unwrap(), 0);
    assert_eq!(platform.replies().len(), 2);
}

#[tokio::test]
async fn test_second_summons_on_same_post_is_recorded_only() {
    let (_dir, config) = setup("You probably meant tonkotsu.");
    let classifier = classifier();
    let platform = MockPlatform {
        mentions: vec![mention("m1", "t3_p3", "ramen"), mention("m2", "t3_p3", "ramen")],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    assert_eq!(bot.check_summons().await.unwrap(), 1);

    let on_post = platform.replies().into_iter().filter(|(parent, _)| parent == "t3_p3").count();
    assert_eq!(on_post, 1);
    assert!(bot.history().get("m1").unwrap().action);
    assert!(!bot.history().get("m2").unwrap().action);
}

#[tokio::test]
async fn test_summons_on_post_assessed_as_correct_is_not_answered() {
    let (_dir, config) = setup("You probably meant tonkotsu.");
    let classifier = classifier();
    let platform = MockPlatform {
        posts: vec![post("p3", "Tonkatsu curry with a pork cutlet", "ramen")],
        mentions: vec![mention("m1", "t3_p3", "ramen"), mention("m2", "t3_p3", "ramen")],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    let summary = bot.run_once().await.unwrap();

    assert_eq!(summary.assessed, 1);
    assert!(platform.replies().is_empty());
    assert_eq!(bot.history().get("p3").unwrap().prediction, Prediction::Correct);
    assert!(bot.history().contains("m1"));
    assert!(bot.history().contains("m2"));
}

#[tokio::test]
async fn test_post_already_in_history_is_not_reassessed() {
    let (_dir, config) = setup("You probably meant tonkotsu.");
    let line = "post123\t1\t1\tfood\tTonkatsu Ramen\n";
    std::fs::write(&config.paths.history, line).unwrap();
    let classifier = classifier();
    let platform = MockPlatform {
        posts: vec![post("post123", "Tonkatsu Ramen", "food")],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    let summary = bot.run_once().await.unwrap();

    assert_eq!(summary.assessed, 0);
    assert!(platform.replies().is_empty());
    assert!(platform.messages_with_subject(FOUND_SUBJECT).is_empty());
    assert_eq!(std::fs::read_to_string(&config.paths.history).unwrap(), line);
}

#[tokio::test]
async fn test_summons_in_excluded_community_are_recorded_only() {
    let (_dir, config) = setup("You probably meant tonkotsu.");
    let classifier = classifier();
    let platform = MockPlatform {
        mentions: vec![mention("m2", "t3_p8", "food")],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    assert_eq!(bot.check_summons().await.unwrap(), 0);
    assert!(platform.replies().is_empty());
    assert!(!bot.history().get("m2").unwrap().action);
}

#[tokio::test]
async fn test_downvoted_comments_are_purged_once() {
    let (_dir, config) = setup("You probably meant tonkotsu.");
    let classifier = classifier();
    let platform = MockPlatform {
        own_comments: vec![own_comment("c7", -3), own_comment("c8", 4)],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    assert_eq!(bot.purge().await.unwrap(), 1);
    assert_eq!(platform.deletes(), vec!["t1_c7".to_string()]);
    assert_eq!(platform.messages_with_subject(REMOVED_SUBJECT), vec![BOT.to_string()]);
    assert!(bot.deleted().contains("c7"));

    assert_eq!(bot.purge().await.unwrap(), 0);
    assert_eq!(platform.deletes().len(), 1);
}

#[tokio::test]
async fn test_score_at_threshold_is_kept() {
    let (_dir, config) = setup("You probably meant tonkotsu.");
    let classifier = classifier();
    let platform = MockPlatform {
        own_comments: vec![own_comment("c1", -1), own_comment("c2", -2)],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    assert_eq!(bot.purge().await.unwrap(), 1);
    assert_eq!(platform.deletes(), vec!["t1_c2".to_string()]);
    assert!(!bot.deleted().contains("c1"));
    assert_eq!(
        std::fs::read_to_string(&config.paths.deleted).unwrap().lines().collect::<Vec<_>>(),
        vec!["c2"]
    );
}

#[tokio::test]
async fn test_deletion_requests_only_honoured_from_post_author() {
    let (_dir, config) = setup("You probably meant tonkotsu.");
    let classifier = classifier();
    let platform = MockPlatform {
        inbox: vec![
            InboxMessage {
                id: "dm1".to_string(),
                author: Some("stranger".to_string()),
                subject: "deletion".to_string(),
                body: "t1_c5".to_string(),
            },
            InboxMessage {
                id: "dm2".to_string(),
                author: Some("poster".to_string()),
                subject: "deletion".to_string(),
                body: "t1_c6".to_string(),
            },
            InboxMessage {
                id: "dm3".to_string(),
                author: Some("poster".to_string()),
                subject: "deletion".to_string(),
                body: "t1_gone".to_string(),
            },
        ],
        known_comments: vec![own_comment("c5", 1), own_comment("c6", 1)],
        ..Default::default()
    };

    let mut bot = Bot::new(&config, &platform, &classifier).unwrap();
    assert_eq!(bot.purge().await.unwrap(), 1);
    assert_eq!(platform.deletes(), vec!["t1_c6".to_string()]);
    assert!(!bot.deleted().contains("c5"));
    assert!(bot.deleted().contains("c6"));
}
