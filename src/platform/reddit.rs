//! Reddit OAuth API client

use reqwest::Client;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use tracing::info;

use super::Platform;
use crate::config::RedditConfig;
use crate::errors::TonkbotError;
use crate::models::Comment;
use crate::models::InboxMessage;
use crate::models::Mention;
use crate::models::Post;
use crate::Result;

/// Upper bound on items read from one paginated listing
const MAX_LISTING_ITEMS: usize = 1000;
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
    children: Vec<Thing<T>>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thing<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
    name: String,
    title: String,
    subreddit: String,
    permalink: String,
    author: Option<String>,
}

impl From<PostData> for Post {
    fn from(data: PostData) -> Self {
        Self {
            id: data.id,
            fullname: data.name,
            title: data.title,
            community: data.subreddit,
            permalink: data.permalink,
            author: data.author,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommentData {
    id: String,
    name: String,
    author: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    link_id: Option<String>,
    #[serde(default)]
    link_author: Option<String>,
}

impl From<CommentData> for Comment {
    fn from(data: CommentData) -> Self {
        Self {
            id: data.id,
            fullname: data.name,
            author: data.author,
            score: data.score,
            submission_author: data.link_author,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MentionData {
    id: String,
    author: Option<String>,
    subreddit: Option<String>,
    parent_id: Option<String>,
    #[serde(default)]
    context: String,
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct MessageData {
    id: String,
    author: Option<String>,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body: String,
}

/// `api_type=json` response envelope
#[derive(Debug, Deserialize)]
struct JsonEnvelope<T> {
    json: JsonBody<T>,
}

#[derive(Debug, Deserialize)]
struct JsonBody<T> {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ThingsData {
    things: Vec<Thing<CommentData>>,
}

/// Client for the Reddit API, logged in with the password grant
pub struct RedditClient {
    client: Client,
    api_base: String,
    access_token: String,
    username: String,
}

impl RedditClient {
    /// Log in with the script-app credentials from `config`
    pub async fn login(config: &RedditConfig) -> Result<Self> {
        info!("Logging in as {}", config.username);

        let client = Client::builder().user_agent(&config.user_agent).build()?;

        let response = client
            .post(&config.auth_url)
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", config.username.as_str()),
                ("password", config.password.as_str()),
            ])
            .send()
            .await?;
        let token: TokenResponse = check_status(response, "log in").await?.json().await?;

        let access_token = match (token.access_token, token.error) {
            (Some(access_token), None) => access_token,
            (_, Some(error)) => {
                return Err(TonkbotError::Platform(format!("Login rejected: {error}")))
            }
            (None, None) => {
                return Err(TonkbotError::Platform(
                    "Login response carried no access token".to_string(),
                ))
            }
        };

        info!("Logged in as {}", config.username);
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token,
            username: config.username.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        debug!("GET {path}");
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.access_token)
            .query(&[("raw_json", "1")])
            .query(query)
            .send()
            .await?;
        Ok(check_status(response, path).await?.json().await?)
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: &[(&str, &str)]) -> Result<T> {
        debug!("POST {path}");
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.access_token)
            .form(form)
            .send()
            .await?;
        Ok(check_status(response, path).await?.json().await?)
    }

    /// POST an `api_type=json` request and surface reported errors
    async fn post_api<T: DeserializeOwned>(&self, path: &str, form: &[(&str, &str)]) -> Result<Option<T>> {
        let mut fields = vec![("api_type", "json")];
        fields.extend_from_slice(form);

        let envelope: JsonEnvelope<T> = self.post_form(path, &fields).await?;
        if !envelope.json.errors.is_empty() {
            return Err(TonkbotError::Platform(format!(
                "{path} failed: {}",
                serde_json::Value::Array(envelope.json.errors)
            )));
        }
        Ok(envelope.json.data)
    }

    /// Follow `after` cursors until the listing ends or `max_items` are read
    async fn fetch_listing<T: DeserializeOwned>(&self, path: &str, max_items: usize) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let page_size = PAGE_SIZE.min(max_items - items.len());
            let mut query = vec![("limit", page_size.to_string())];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            let listing: Listing<T> = self.get_json(path, &query).await?;
            items.extend(listing.data.children.into_iter().map(|thing| thing.data));

            after = listing.data.after;
            if after.is_none() || items.len() >= max_items {
                break;
            }
        }
        Ok(items)
    }
}

/// Turn a non-2xx response into a platform error carrying the body
async fn check_status(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(TonkbotError::Platform(format!(
        "{action} failed (HTTP {status}): {body}"
    )))
}

impl Platform for RedditClient {
    fn username(&self) -> &str {
        &self.username
    }

    async fn fetch_new_posts(&self, streams: &[String], limit: u32) -> Result<Vec<Post>> {
        let path = format!("/r/{}/new", streams.join("+"));
        let listing: Listing<PostData> = self
            .get_json(&path, &[("limit", limit.to_string())])
            .await?;
        Ok(listing
            .data
            .children
            .into_iter()
            .map(|thing| thing.data.into())
            .collect())
    }

    async fn reply(&self, parent_fullname: &str, text: &str) -> Result<Comment> {
        let data: Option<ThingsData> = self
            .post_api("/api/comment", &[("thing_id", parent_fullname), ("text", text)])
            .await?;
        data.and_then(|d| d.things.into_iter().next())
            .map(|thing| thing.data.into())
            .ok_or_else(|| {
                TonkbotError::Platform(format!("Reply to {parent_fullname} returned no comment"))
            })
    }

    async fn edit(&self, fullname: &str, text: &str) -> Result<()> {
        self.post_api::<serde_json::Value>("/api/editusertext", &[("thing_id", fullname), ("text", text)])
            .await?;
        Ok(())
    }

    async fn delete(&self, fullname: &str) -> Result<()> {
        self.post_form::<serde_json::Value>("/api/del", &[("id", fullname)])
            .await?;
        Ok(())
    }

    async fn send_message(&self, user: &str, subject: &str, body: &str) -> Result<()> {
        self.post_api::<serde_json::Value>(
            "/api/compose",
            &[("to", user), ("subject", subject), ("text", body)],
        )
        .await?;
        Ok(())
    }

    async fn fetch_mentions(&self) -> Result<Vec<Mention>> {
        let items: Vec<MentionData> = self.fetch_listing("/message/mentions", PAGE_SIZE).await?;
        Ok(items
            .into_iter()
            .map(|data| Mention {
                id: data.id,
                author: data.author,
                community: data.subreddit.unwrap_or_default(),
                parent_id: data.parent_id.unwrap_or_default(),
                context: data.context,
                body: data.body,
            })
            .collect())
    }

    async fn fetch_inbox_messages(&self) -> Result<Vec<InboxMessage>> {
        let items: Vec<MessageData> = self.fetch_listing("/message/messages", PAGE_SIZE).await?;
        Ok(items
            .into_iter()
            .map(|data| InboxMessage {
                id: data.id,
                author: data.author,
                subject: data.subject,
                body: data.body,
            })
            .collect())
    }

    async fn fetch_user_comments(&self, user: &str) -> Result<Vec<Comment>> {
        let path = format!("/user/{user}/comments");
        let items: Vec<CommentData> = self.fetch_listing(&path, MAX_LISTING_ITEMS).await?;
        Ok(items.into_iter().map(Comment::from).collect())
    }

    async fn fetch_comment(&self, id: &str) -> Result<Comment> {
        let id = id.trim();
        let fullname = if id.starts_with("t1_") {
            id.to_string()
        } else {
            format!("t1_{id}")
        };

        let listing: Listing<CommentData> = self
            .get_json("/api/info", &[("id", fullname.clone())])
            .await?;
        let data = listing
            .data
            .children
            .into_iter()
            .next()
            .map(|thing| thing.data)
            .ok_or_else(|| TonkbotError::Platform(format!("Comment {fullname} not found")))?;

        let submission_author = match (&data.link_author, &data.link_id) {
            (Some(author), _) => Some(author.clone()),
            (None, Some(link_id)) => {
                let posts: Listing<PostData> = self
                    .get_json("/api/info", &[("id", link_id.clone())])
                    .await?;
                posts
                    .data
                    .children
                    .into_iter()
                    .next()
                    .and_then(|thing| thing.data.author)
            }
            (None, None) => None,
        };

        let mut comment = Comment::from(data);
        comment.submission_author = submission_author;
        Ok(comment)
    }
}
