use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::TonkbotError;

/// Config files probed by [`AppConfig::load`], in order.
const CONFIG_CANDIDATES: [&str; 2] = ["tonkbot.toml", "config.example.toml"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
    /// Account that receives copies of every notification
    pub human_account: String,
    pub user_agent: String,
    pub auth_url: String,
    pub api_base: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            human_account: String::new(),
            user_agent: "Tonkotsu Police v0.1".to_string(),
            auth_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            api_base: "https://oauth.reddit.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Misspelling the bot looks for in post titles
    pub target_term: String,
    /// Communities polled for new posts
    pub streams: Vec<String>,
    /// Communities where the bot may comment after a positive prediction
    pub allowed_communities: Vec<String>,
    /// Communities where summons are recorded but never answered
    pub summon_excluded: Vec<String>,
    /// Posts acted upon per pass, 0 for no limit
    pub max_posts_per_run: usize,
    /// Bot comments scoring strictly below this are removed
    pub downvote_threshold: i64,
    pub deletion_subject: String,
    pub fetch_limit: u32,
    /// Refuse to serve predictions from a bundle that fails its accuracy check.
    /// `false` restores the historical behaviour: log a warning and keep going.
    pub strict_integrity: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            target_term: "tonkatsu".to_string(),
            streams: vec![
                "test".to_string(),
                "ramen".to_string(),
                "food".to_string(),
                "FoodPorn".to_string(),
            ],
            allowed_communities: vec![
                "ramen".to_string(),
                "FoodPorn".to_string(),
                "test".to_string(),
            ],
            summon_excluded: vec!["food".to_string()],
            max_posts_per_run: 1,
            downvote_threshold: -1,
            deletion_subject: "deletion".to_string(),
            fetch_limit: 25,
            strict_integrity: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Canned reply; `{id}` is replaced with the posted comment's fullname
    pub comment: PathBuf,
    pub deleted: PathBuf,
    pub log: PathBuf,
    pub model: PathBuf,
    pub history: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            comment: PathBuf::from("data/comment.txt"),
            deleted: PathBuf::from("data/deleted.txt"),
            log: PathBuf::from("data/tonkbot.log"),
            model: PathBuf::from("data/model.json"),
            history: PathBuf::from("data/id_file.txt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub data: PathBuf,
    pub communities: Vec<String>,
    pub test_out: PathBuf,
    pub test_split: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data: PathBuf::from("data/all_labeled_data.txt"),
            communities: vec![
                "ramen".to_string(),
                "food".to_string(),
                "FoodPorn".to_string(),
            ],
            test_out: PathBuf::from("data/test_data.txt"),
            test_split: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reddit: RedditConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from the default file locations
    ///
    /// Falls back to built-in defaults when no file exists, which is enough
    /// for training but not for running the bot.
    pub fn load() -> crate::Result<Self> {
        for candidate in CONFIG_CANDIDATES {
            if Path::new(candidate).exists() {
                return Self::from_file(candidate);
            }
        }

        tracing::warn!(
            "No config file found ({}), using built-in defaults",
            CONFIG_CANDIDATES.join(", ")
        );
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Credentials from `TONKBOT_*` environment variables take precedence
    fn apply_env_overrides(&mut self) {
        let overrides = [
            ("TONKBOT_USERNAME", &mut self.reddit.username),
            ("TONKBOT_PASSWORD", &mut self.reddit.password),
            ("TONKBOT_CLIENT_ID", &mut self.reddit.client_id),
            ("TONKBOT_CLIENT_SECRET", &mut self.reddit.client_secret),
        ];
        for (var, field) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    *field = value;
                }
            }
        }
    }

    /// Check the settings the trainer depends on
    pub fn validate_training(&self) -> crate::Result<()> {
        let split = self.training.test_split;
        if !(0.0..1.0).contains(&split) {
            return Err(TonkbotError::Config(format!(
                "test split must be in [0, 1), got {split}"
            )));
        }
        if self.bot.target_term.trim().is_empty() {
            return Err(TonkbotError::Config("target term is empty".to_string()));
        }
        Ok(())
    }

    /// Check the settings the bot runner depends on
    pub fn validate_bot(&self) -> crate::Result<()> {
        let missing: Vec<&str> = [
            ("reddit.username", &self.reddit.username),
            ("reddit.password", &self.reddit.password),
            ("reddit.client_id", &self.reddit.client_id),
            ("reddit.client_secret", &self.reddit.client_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(TonkbotError::Config(format!(
                "missing credentials: {}",
                missing.join(", ")
            )));
        }
        if self.bot.streams.is_empty() {
            return Err(TonkbotError::Config("no streams to poll".to_string()));
        }
        if self.bot.target_term.trim().is_empty() {
            return Err(TonkbotError::Config("target term is empty".to_string()));
        }
        Ok(())
    }

    /// Get the lowercased target term
    pub fn target_term(&self) -> String {
        self.bot.target_term.to_lowercase()
    }

    /// Check whether the bot may comment in `community`
    pub fn is_allowed_community(&self, community: &str) -> bool {
        self.bot.allowed_communities.iter().any(|c| c == community)
    }

    /// Check whether summons in `community` must go unanswered
    pub fn is_summon_excluded(&self, community: &str) -> bool {
        self.bot.summon_excluded.iter().any(|c| c == community)
    }

    /// Accounts that receive decision notifications
    pub fn notification_recipients(&self) -> Vec<&str> {
        let mut recipients = vec![self.reddit.username.as_str()];
        if !self.reddit.human_account.is_empty() {
            recipients.push(self.reddit.human_account.as_str());
        }
        recipients
    }
}

/// Split a comma separated list as given on the command line
pub fn parse_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
