use chrono::DateTime;
use chrono_tz::Tz;
use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::config::GhostConfig;
use crate::defaults::PLACEHOLDER_COVER;
use crate::error::FetchError;
use crate::models::Transmission;

const INCLUDE: &str = "tags,authors";
const EXCERPT_FALLBACK: &str = "Signal intercepted...";
const DEFAULT_READING_TIME: u32 = 5;

/// Envelope returned by every posts endpoint.
#[derive(Debug, Deserialize)]
struct PostsEnvelope {
    posts: Option<Vec<GhostPost>>,
}

#[derive(Debug, Default, Deserialize)]
struct GhostPost {
    id: String,
    #[serde(default)]
    title: String,
    excerpt: Option<String>,
    custom_excerpt: Option<String>,
    html: Option<String>,
    feature_image: Option<String>,
    reading_time: Option<u32>,
    tags: Option<Vec<GhostName>>,
    authors: Option<Vec<GhostName>>,
    primary_author: Option<GhostName>,
    published_at: Option<String>,
    #[serde(default)]
    slug: String,
}

#[derive(Debug, Default, Deserialize)]
struct GhostName {
    name: Option<String>,
}

/// Read-only client for the Ghost content API.
///
/// Every public operation makes exactly one request and never fails: errors are
/// logged and turned into `None` or an empty list. Nothing is cached.
pub struct ContentGateway {
    client: reqwest::Client,
    posts_url: Url,
    key: String,
    archive_limit: u32,
    tz: Tz,
}

impl ContentGateway {
    pub fn new(config: &GhostConfig, tz: Tz) -> Result<Self, FetchError> {
        let posts_url = config.posts_url();
        let parsed = Url::parse(&posts_url).map_err(|e| FetchError::Parse {
            url: posts_url.clone(),
            message: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("station445/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Http {
                url: posts_url,
                source: e,
            })?;

        Ok(Self {
            client,
            posts_url: parsed,
            key: config.key.clone(),
            archive_limit: config.archive_limit,
            tz,
        })
    }

    /// The most recent post.
    pub async fn get_latest(&self) -> Option<Transmission> {
        let url = self.posts_url.clone();
        match self.fetch_posts(url, Some(1)).await {
            Ok(envelope) => envelope
                .posts
                .and_then(|posts| posts.into_iter().next())
                .map(|post| map_post(post, self.tz)),
            Err(e) => {
                error!(error = %e, "signal lost: failed to fetch latest transmission");
                None
            }
        }
    }

    /// Archive page of up to `archive_limit` posts, newest first.
    pub async fn get_all(&self) -> Vec<Transmission> {
        let url = self.posts_url.clone();
        match self.fetch_posts(url, Some(self.archive_limit)).await {
            Ok(PostsEnvelope { posts: Some(posts) }) => posts.into_iter().map(|post| map_post(post, self.tz)).collect(),
            Ok(PostsEnvelope { posts: None }) => {
                error!("signal lost: archive response carried no posts");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "signal lost: failed to fetch archive");
                Vec::new()
            }
        }
    }

    /// The post whose slug matches exactly.
    pub async fn get_by_slug(&self, slug: &str) -> Option<Transmission> {
        let url = match self.slug_url(slug) {
            Some(url) => url,
            None => {
                warn!(slug = %slug, "cannot build slug URL");
                return None;
            }
        };
        match self.fetch_posts(url, None).await {
            Ok(envelope) => envelope
                .posts
                .and_then(|posts| posts.into_iter().next())
                .map(|post| map_post(post, self.tz)),
            // Ghost answers unknown slugs with 404 and an `errors` body.
            Err(FetchError::Status { status, .. }) if status == reqwest::StatusCode::NOT_FOUND => {
                debug!(slug = %slug, "no transmission with this slug");
                None
            }
            Err(e) => {
                warn!(slug = %slug, error = %e, "transmission lookup failed");
                None
            }
        }
    }

    fn slug_url(&self, slug: &str) -> Option<Url> {
        let mut url = self.posts_url.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push("slug")
            .push(slug)
            .push("");
        Some(url)
    }

    async fn fetch_posts(&self, mut url: Url, limit: Option<u32>) -> Result<PostsEnvelope, FetchError> {
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", &self.key);
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
            query.append_pair("include", INCLUDE);
        }

        // Never log the full URL: it carries the content key.
        debug!(path = %url.path(), "requesting posts");

        let response = self.client.get(url.clone()).send().await.map_err(|e| FetchError::Http {
            url: url.path().to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.path().to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Http {
            url: url.path().to_string(),
            source: e,
        })?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Parse {
            url: url.path().to_string(),
            message: e.to_string(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn map_post(post: GhostPost, tz: Tz) -> Transmission {
    let author = post
        .primary_author
        .and_then(|a| non_empty(a.name))
        .or_else(|| {
            post.authors
                .and_then(|authors| authors.into_iter().next())
                .and_then(|a| non_empty(a.name))
        })
        .unwrap_or_else(|| "Unknown".to_string());

    Transmission {
        id: post.id,
        title: post.title,
        excerpt: non_empty(post.excerpt)
            .or_else(|| non_empty(post.custom_excerpt))
            .unwrap_or_else(|| EXCERPT_FALLBACK.to_string()),
        content: post.html,
        cover_image: non_empty(post.feature_image).unwrap_or_else(|| PLACEHOLDER_COVER.to_string()),
        read_time: format!("{} min read", post.reading_time.unwrap_or(DEFAULT_READING_TIME)),
        tags: post
            .tags
            .map(|tags| tags.into_iter().filter_map(|t| t.name).collect())
            .unwrap_or_default(),
        publish_date: format_publish_date(post.published_at.as_deref(), tz),
        slug: post.slug,
        author: Some(author),
    }
}

/// `"Mar 7, 2026"` in the display timezone.
pub fn format_publish_date(published_at: Option<&str>, tz: Tz) -> String {
    published_at
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&tz).format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "Invalid Date".to_string())
}
