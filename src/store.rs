use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::defaults::{FREQUENCIES, default_echoes, default_moments, default_site_config};
use crate::error::{EditError, StoreError};
use crate::kv::KeyValueStore;
use crate::models::{BurstMoment, EchoDraft, EchoSignal, Frequency, MediaType, MomentDraft, SiteConfig};

/// A typed value stored as JSON under one fixed key, with a seed used while nothing is stored.
pub struct LocalCollection<T> {
    key: &'static str,
    seed: fn() -> T,
    _marker: PhantomData<fn() -> T>,
}

impl<T> LocalCollection<T> {
    pub const fn new(key: &'static str, seed: fn() -> T) -> Self {
        Self {
            key,
            seed,
            _marker: PhantomData,
        }
    }

    #[cfg(test)]
    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl<T: Serialize + DeserializeOwned> LocalCollection<T> {
    /// Stored value, or the seed when the key is absent or empty.
    /// A stored value that does not decode as `T` is an error, never silently replaced.
    pub async fn get(&self, kv: &dyn KeyValueStore) -> Result<T, StoreError> {
        match kv.get(self.key).await? {
            Some(raw) if !raw.is_empty() => serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
                key: self.key.to_string(),
                source,
            }),
            _ => {
                debug!(key = self.key, "nothing stored, using seed data");
                Ok((self.seed)())
            }
        }
    }

    /// Overwrite the stored value. Last write wins.
    pub async fn save(&self, kv: &dyn KeyValueStore, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: self.key.to_string(),
            source,
        })?;
        kv.set(self.key, &raw).await
    }
}

pub const ECHOES: LocalCollection<Vec<EchoSignal>> = LocalCollection::new("station_echoes", default_echoes);
pub const MOMENTS: LocalCollection<Vec<BurstMoment>> = LocalCollection::new("station_moments", default_moments);
pub const SITE_CONFIG: LocalCollection<SiteConfig> = LocalCollection::new("station_config", default_site_config);

pub fn get_frequencies() -> &'static [Frequency] {
    FREQUENCIES
}

fn required(value: &Option<String>, field: &'static str) -> Result<(), EditError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(EditError::MissingField(field)),
    }
}

/// Create or edit an episode and save the whole collection. Returns the item id.
pub async fn upsert_echo(kv: &dyn KeyValueStore, draft: EchoDraft, now: DateTime<Utc>) -> Result<String, EditError> {
    required(&draft.title, "title")?;
    required(&draft.episode, "episode")?;

    let mut echoes = ECHOES.get(kv).await?;

    let id = match draft.id.clone() {
        Some(id) => {
            match echoes.iter_mut().find(|e| e.id == id) {
                Some(existing) => merge_echo(existing, draft),
                None => warn!(id = %id, "edited episode no longer exists, collection unchanged"),
            }
            id
        }
        None => {
            let id = format!("e-{}", now.timestamp_millis());
            echoes.push(EchoSignal {
                id: id.clone(),
                title: draft.title.unwrap_or_default(),
                episode: draft.episode.unwrap_or_default(),
                duration: draft.duration.unwrap_or_else(|| "0:00".to_string()),
                image: draft.image,
            });
            id
        }
    };

    ECHOES.save(kv, &echoes).await?;
    info!(id = %id, total = echoes.len(), "episode saved");
    Ok(id)
}

fn merge_echo(existing: &mut EchoSignal, draft: EchoDraft) {
    if let Some(title) = draft.title {
        existing.title = title;
    }
    if let Some(episode) = draft.episode {
        existing.episode = episode;
    }
    if let Some(duration) = draft.duration {
        existing.duration = duration;
    }
    if draft.image.is_some() {
        existing.image = draft.image;
    }
}

/// Remove an episode by id and save. Returns whether anything was removed.
pub async fn delete_echo(kv: &dyn KeyValueStore, id: &str) -> Result<bool, StoreError> {
    let mut echoes = ECHOES.get(kv).await?;
    let before = echoes.len();
    echoes.retain(|e| e.id != id);
    ECHOES.save(kv, &echoes).await?;
    info!(id = %id, removed = before - echoes.len(), "episode purge");
    Ok(echoes.len() != before)
}

/// Create or edit a gallery item and save the whole collection. New items go first.
/// Returns the item id.
pub async fn upsert_moment(
    kv: &dyn KeyValueStore,
    draft: MomentDraft,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<String, EditError> {
    required(&draft.title, "title")?;
    required(&draft.image, "image")?;

    let mut moments = MOMENTS.get(kv).await?;
    let tags = draft.tags.clone().map(|t| t.normalize());

    let id = match draft.id.clone() {
        Some(id) => {
            match moments.iter_mut().find(|m| m.id == id) {
                Some(existing) => merge_moment(existing, draft, tags),
                None => warn!(id = %id, "edited moment no longer exists, collection unchanged"),
            }
            id
        }
        None => {
            let id = format!("b-{}", now.timestamp_millis());
            moments.insert(
                0,
                BurstMoment {
                    id: id.clone(),
                    title: draft.title.unwrap_or_default(),
                    image: draft.image.unwrap_or_default(),
                    media_type: draft.media_type.unwrap_or_default(),
                    caption: draft.caption.unwrap_or_default(),
                    tags: tags.unwrap_or_default(),
                    read_time: draft.read_time.unwrap_or_else(|| "01:00".to_string()),
                    date: draft
                        .date
                        .unwrap_or_else(|| now.with_timezone(&tz).format("%-m/%-d/%Y").to_string()),
                },
            );
            id
        }
    };

    MOMENTS.save(kv, &moments).await?;
    info!(id = %id, total = moments.len(), "visual asset saved");
    Ok(id)
}

fn merge_moment(existing: &mut BurstMoment, draft: MomentDraft, tags: Option<Vec<String>>) {
    if let Some(title) = draft.title {
        existing.title = title;
    }
    if let Some(image) = draft.image {
        existing.image = image;
    }
    if let Some(media_type) = draft.media_type {
        existing.media_type = media_type;
    }
    if let Some(caption) = draft.caption {
        existing.caption = caption;
    }
    if let Some(tags) = tags {
        existing.tags = tags;
    }
    if let Some(read_time) = draft.read_time {
        existing.read_time = read_time;
    }
    if let Some(date) = draft.date {
        existing.date = date;
    }
}

/// Remove a gallery item by id and save. Returns whether anything was removed.
pub async fn delete_moment(kv: &dyn KeyValueStore, id: &str) -> Result<bool, StoreError> {
    let mut moments = MOMENTS.get(kv).await?;
    let before = moments.len();
    moments.retain(|m| m.id != id);
    MOMENTS.save(kv, &moments).await?;
    info!(id = %id, removed = before - moments.len(), "visual asset purge");
    Ok(moments.len() != before)
}

/// Media type for an uploaded file's MIME type.
pub fn media_type_for_mime(mime: &str) -> MediaType {
    if mime.starts_with("video") {
        MediaType::Video
    } else {
        MediaType::Image
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::kv::MemoryKv;
    use crate::models::{StationStatus, TagsInput};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn echoes_default_to_seed() {
        let kv = MemoryKv::new();
        let echoes = ECHOES.get(&kv).await.unwrap();
        assert_eq!(echoes.len(), 5);
        for echo in &echoes {
            assert!(!echo.id.is_empty());
            assert!(!echo.title.is_empty());
            assert!(!echo.episode.is_empty());
            assert!(!echo.duration.is_empty());
        }
        assert_eq!(echoes[0].episode, "SIG-01");
    }

    #[tokio::test]
    async fn empty_stored_value_falls_back_to_seed() {
        let kv = MemoryKv::new();
        kv.set(MOMENTS.key(), "").await.unwrap();
        assert_eq!(MOMENTS.get(&kv).await.unwrap(), default_moments());
    }

    #[tokio::test]
    async fn saved_collections_read_back_equal() {
        let kv = MemoryKv::new();

        let echoes = vec![EchoSignal {
            id: "e-x".to_string(),
            title: "Carrier Wave".to_string(),
            episode: "SIG-99".to_string(),
            duration: "3:33".to_string(),
            image: Some("https://cdn.example/x.png".to_string()),
        }];
        ECHOES.save(&kv, &echoes).await.unwrap();
        assert_eq!(ECHOES.get(&kv).await.unwrap(), echoes);

        ECHOES.save(&kv, &Vec::new()).await.unwrap();
        assert!(ECHOES.get(&kv).await.unwrap().is_empty());

        let mut moments = default_moments();
        moments[1].media_type = MediaType::Video;
        MOMENTS.save(&kv, &moments).await.unwrap();
        assert_eq!(MOMENTS.get(&kv).await.unwrap(), moments);
    }

    #[tokio::test]
    async fn saving_config_twice_is_same_as_once() {
        let kv = MemoryKv::new();
        let mut config = default_site_config();
        config.station_status = StationStatus::Silent;
        config.maintenance_mode = true;

        SITE_CONFIG.save(&kv, &config).await.unwrap();
        let once = SITE_CONFIG.get(&kv).await.unwrap();
        SITE_CONFIG.save(&kv, &config).await.unwrap();
        let twice = SITE_CONFIG.get(&kv).await.unwrap();

        assert_eq!(once, config);
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn corrupt_stored_value_is_a_decode_error() {
        let kv = MemoryKv::new();
        kv.set(SITE_CONFIG.key(), "{not json").await.unwrap();
        let err = SITE_CONFIG.get(&kv).await.unwrap_err();
        match err {
            StoreError::Decode { key, .. } => assert_eq!(key, "station_config"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn new_moment_normalizes_text_tags() {
        let kv = MemoryKv::new();
        let draft = MomentDraft {
            title: Some("Rift".to_string()),
            image: Some("https://cdn.example/rift.jpg".to_string()),
            tags: Some(TagsInput::Text("Alert, Anomaly , Sector-4".to_string())),
            ..Default::default()
        };

        let id = upsert_moment(&kv, draft, fixed_now(), chrono_tz::UTC).await.unwrap();
        assert_eq!(id, format!("b-{}", fixed_now().timestamp_millis()));

        let moments = MOMENTS.get(&kv).await.unwrap();
        assert_eq!(moments.len(), 4);
        let created = &moments[0];
        assert_eq!(created.id, id);
        assert_eq!(created.tags, vec!["Alert", "Anomaly", "Sector-4"]);
        assert_eq!(created.read_time, "01:00");
        assert_eq!(created.date, "3/7/2026");
        assert_eq!(created.media_type, MediaType::Image);
        assert_eq!(created.caption, "");
    }

    #[tokio::test]
    async fn editing_moment_merges_fields() {
        let kv = MemoryKv::new();
        let draft = MomentDraft {
            id: Some("b-2".to_string()),
            title: Some("The Abandoned Station (Restored)".to_string()),
            image: Some("https://cdn.example/station.mp4".to_string()),
            media_type: Some(MediaType::Video),
            tags: Some(TagsInput::Text("Ruins,Log".to_string())),
            ..Default::default()
        };

        upsert_moment(&kv, draft, fixed_now(), chrono_tz::UTC).await.unwrap();

        let moments = MOMENTS.get(&kv).await.unwrap();
        assert_eq!(moments.len(), 3);
        let edited = moments.iter().find(|m| m.id == "b-2").unwrap();
        assert_eq!(edited.title, "The Abandoned Station (Restored)");
        assert_eq!(edited.media_type, MediaType::Video);
        assert_eq!(edited.tags, vec!["Ruins", "Log"]);
        // untouched fields survive
        assert_eq!(edited.read_time, "12:00");
        assert_eq!(edited.date, "Yesterday");
    }

    #[tokio::test]
    async fn editing_moment_can_clear_caption_and_tags() {
        let kv = MemoryKv::new();
        let original = MOMENTS.get(&kv).await.unwrap().into_iter().find(|m| m.id == "b-1").unwrap();
        assert!(!original.caption.is_empty());
        assert!(!original.tags.is_empty());

        let draft = MomentDraft {
            caption: Some(String::new()),
            tags: Some(TagsInput::Text(String::new())),
            ..MomentDraft::from(&original)
        };
        upsert_moment(&kv, draft, fixed_now(), chrono_tz::UTC).await.unwrap();

        let edited = MOMENTS.get(&kv).await.unwrap().into_iter().find(|m| m.id == "b-1").unwrap();
        assert_eq!(edited.caption, "");
        assert!(edited.tags.is_empty());
        assert_eq!(edited.title, original.title);
    }

    #[tokio::test]
    async fn editing_echo_can_clear_duration() {
        let kv = MemoryKv::new();
        let original = ECHOES.get(&kv).await.unwrap().remove(0);
        let draft = EchoDraft {
            duration: Some(String::new()),
            ..EchoDraft::from(&original)
        };
        upsert_echo(&kv, draft, fixed_now()).await.unwrap();

        let edited = ECHOES.get(&kv).await.unwrap().remove(0);
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.duration, "");
    }

    #[tokio::test]
    async fn moment_requires_title_and_image() {
        let kv = MemoryKv::new();
        let err = upsert_moment(
            &kv,
            MomentDraft {
                title: Some("No media".to_string()),
                ..Default::default()
            },
            fixed_now(),
            chrono_tz::UTC,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EditError::MissingField("image")));
        assert_eq!(kv.get(MOMENTS.key()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn new_echo_is_appended_with_default_duration() {
        let kv = MemoryKv::new();
        let draft = EchoDraft {
            title: Some("Pulsar Lullaby".to_string()),
            episode: Some("SIG-99".to_string()),
            ..Default::default()
        };

        let id = upsert_echo(&kv, draft, fixed_now()).await.unwrap();

        let echoes = ECHOES.get(&kv).await.unwrap();
        assert_eq!(echoes.len(), 6);
        let last = echoes.last().unwrap();
        assert_eq!(last.id, id);
        assert!(id.starts_with("e-"));
        assert_eq!(last.duration, "0:00");
    }

    #[tokio::test]
    async fn editing_echo_keeps_position() {
        let kv = MemoryKv::new();
        let mut draft = EchoDraft::from(&default_echoes()[2]);
        draft.duration = Some("9:99".to_string());

        upsert_echo(&kv, draft, fixed_now()).await.unwrap();

        let echoes = ECHOES.get(&kv).await.unwrap();
        assert_eq!(echoes[2].id, "e-03");
        assert_eq!(echoes[2].duration, "9:99");
        assert_eq!(echoes[2].title, "Nebula Sounds: Music from the Gas...");
    }

    #[tokio::test]
    async fn echo_requires_episode() {
        let kv = MemoryKv::new();
        let err = upsert_echo(
            &kv,
            EchoDraft {
                title: Some("Untitled".to_string()),
                episode: Some(String::new()),
                ..Default::default()
            },
            fixed_now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EditError::MissingField("episode")));
    }

    #[tokio::test]
    async fn delete_filters_by_id() {
        let kv = MemoryKv::new();
        assert!(delete_echo(&kv, "e-01").await.unwrap());
        assert!(!delete_echo(&kv, "e-01").await.unwrap());
        let echoes = ECHOES.get(&kv).await.unwrap();
        assert_eq!(echoes.len(), 4);
        assert!(echoes.iter().all(|e| e.id != "e-01"));

        assert!(delete_moment(&kv, "b-3").await.unwrap());
        assert_eq!(MOMENTS.get(&kv).await.unwrap().len(), 2);
    }

    #[test]
    fn mime_to_media_type() {
        assert_eq!(media_type_for_mime("video/mp4"), MediaType::Video);
        assert_eq!(media_type_for_mime("image/png"), MediaType::Image);
        assert_eq!(media_type_for_mime(""), MediaType::Image);
    }

    #[test]
    fn frequencies_are_static() {
        let frequencies = get_frequencies();
        assert_eq!(frequencies.len(), 2);
        assert_eq!(frequencies[1].id, "f-2");
    }
}
