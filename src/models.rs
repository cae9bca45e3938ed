use serde::{Deserialize, Serialize};

/// A blog post read from the content API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transmission {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    /// Full post body as HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub cover_image: String,
    pub read_time: String,
    pub tags: Vec<String>,
    pub publish_date: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// A music episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoSignal {
    pub id: String,
    pub title: String,
    pub episode: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Image,
    Video,
}

impl MediaType {
    pub fn label(self) -> &'static str {
        match self {
            MediaType::Image => "IMG",
            MediaType::Video => "VID",
        }
    }
}

/// A gallery item. `image` holds the media URL (or `data:` URI) for both images and videos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurstMoment {
    pub id: String,
    pub title: String,
    pub image: String,
    #[serde(default)]
    pub media_type: MediaType,
    pub caption: String,
    pub tags: Vec<String>,
    pub read_time: String,
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StationStatus {
    Online,
    Offline,
    Critical,
    Silent,
}

impl StationStatus {
    pub const ALL: [StationStatus; 4] = [
        StationStatus::Online,
        StationStatus::Offline,
        StationStatus::Critical,
        StationStatus::Silent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StationStatus::Online => "ONLINE",
            StationStatus::Offline => "OFFLINE",
            StationStatus::Critical => "CRITICAL",
            StationStatus::Silent => "SILENT",
        }
    }
}

impl std::fmt::Display for StationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Site-wide display settings. Always saved whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub site_title: String,
    pub site_description: String,
    pub station_status: StationStatus,
    pub maintenance_mode: bool,
    pub admin_contact: String,
    pub enable_hero_alert_color: bool,
    pub enable_footer_pulse: bool,
}

/// Static spotlight card shown on the home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frequency {
    pub id: &'static str,
    pub title: &'static str,
    pub excerpt: &'static str,
    pub image: &'static str,
    pub tags: &'static [&'static str],
    pub date: &'static str,
}

/// Tags as they arrive from an edit form: a delimited string typed by hand, or the
/// list carried over from a loaded item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    Text(String),
    List(Vec<String>),
}

impl TagsInput {
    /// Comma-split and trim text input, dropping empty segments. Lists pass through.
    pub fn normalize(self) -> Vec<String> {
        match self {
            TagsInput::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            TagsInput::List(list) => list,
        }
    }
}

/// Admin form state for an episode. `id` set means edit, unset means create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EchoDraft {
    pub id: Option<String>,
    pub title: Option<String>,
    pub episode: Option<String>,
    pub duration: Option<String>,
    pub image: Option<String>,
}

/// Admin form state for a gallery item. `id` set means edit, unset means create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MomentDraft {
    pub id: Option<String>,
    pub title: Option<String>,
    pub image: Option<String>,
    pub media_type: Option<MediaType>,
    pub caption: Option<String>,
    pub tags: Option<TagsInput>,
    pub read_time: Option<String>,
    pub date: Option<String>,
}

impl From<&EchoSignal> for EchoDraft {
    fn from(echo: &EchoSignal) -> Self {
        Self {
            id: Some(echo.id.clone()),
            title: Some(echo.title.clone()),
            episode: Some(echo.episode.clone()),
            duration: Some(echo.duration.clone()),
            image: echo.image.clone(),
        }
    }
}

impl From<&BurstMoment> for MomentDraft {
    fn from(moment: &BurstMoment) -> Self {
        Self {
            id: Some(moment.id.clone()),
            title: Some(moment.title.clone()),
            image: Some(moment.image.clone()),
            media_type: Some(moment.media_type),
            caption: Some(moment.caption.clone()),
            tags: Some(TagsInput::List(moment.tags.clone())),
            read_time: Some(moment.read_time.clone()),
            date: Some(moment.date.clone()),
        }
    }
}
