use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use base64::Engine;
use tracing::{info, warn};

use crate::config::Pacing;
use crate::models::BurstMoment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Media written to this file.
    Saved(PathBuf),
    /// Download failed; the caller should open the resource externally instead.
    OpenExternally(String),
}

pub fn archive_file_name(id: &str) -> String {
    format!("STATION445_ARCHIVE_{id}.jpg")
}

/// Ids come from stored JSON, so they must not be able to leave `dest_dir`.
fn is_safe_file_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\']) && !id.contains("..")
}

/// Download a gallery item's media into `dest_dir`. Single attempt; any failure falls
/// back to handing the URL back for external viewing.
pub async fn extract_moment(
    client: &reqwest::Client,
    moment: &BurstMoment,
    dest_dir: &Path,
    pacing: &Pacing,
) -> Extraction {
    // "Extraction" pause before the transfer starts.
    tokio::time::sleep(pacing.extraction_delay).await;

    if !is_safe_file_id(&moment.id) {
        warn!(id = %moment.id, "id is not usable as a file name, falling back to external view");
        return Extraction::OpenExternally(moment.image.clone());
    }

    match download(client, &moment.image, &dest_dir.join(archive_file_name(&moment.id))).await {
        Ok(path) => {
            info!(id = %moment.id, path = %path.display(), "visual asset extracted");
            Extraction::Saved(path)
        }
        Err(e) => {
            warn!(id = %moment.id, error = %e, "download failed, falling back to external view");
            Extraction::OpenExternally(moment.image.clone())
        }
    }
}

async fn download(client: &reqwest::Client, source: &str, target: &Path) -> Result<PathBuf> {
    let bytes = if source.starts_with("data:") {
        decode_data_uri(source)?
    } else {
        let response = client
            .get(source)
            .send()
            .await
            .with_context(|| format!("requesting {source}"))?
            .error_for_status()
            .with_context(|| format!("fetching {source}"))?;
        response.bytes().await.context("reading media body")?.to_vec()
    };

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tokio::fs::write(target, &bytes)
        .await
        .with_context(|| format!("writing {}", target.display()))?;
    Ok(target.to_path_buf())
}

/// Decode a base64 `data:` URI as produced by file uploads in the admin console.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri.strip_prefix("data:").context("not a data URI")?;
    let (meta, payload) = rest.split_once(',').context("data URI has no payload")?;
    if !meta.ends_with(";base64") {
        bail!("only base64 data URIs are supported");
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .context("invalid base64 payload")
}

/// MIME type for an uploaded file, from its extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Encode uploaded bytes as a `data:` URI for storage in a moment.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}
