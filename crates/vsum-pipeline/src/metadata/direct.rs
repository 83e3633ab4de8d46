//! Watch-page scrape back-end.
//!
//! The watch page embeds the player response as a script assignment
//! `ytInitialPlayerResponse = {...};</script>`. Descriptive fields come from
//! `microformat.playerMicroformatRenderer`, tracks from
//! `captions.playerCaptionsTracklistRenderer.captionTracks`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use vsum_models::{CaptionTrack, VideoMetadata};

use super::{lenient_u64, MetadataSource};
use crate::error::{FetchError, FetchResult};

const START_SENTINEL: &str = "ytInitialPlayerResponse = ";
const END_SENTINEL: &str = ";</script>";

/// Scrapes metadata from the video watch page.
pub struct DirectSource {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    microformat: Option<Microformat>,
    #[serde(default)]
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Microformat {
    player_microformat_renderer: MicroformatRenderer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MicroformatRenderer {
    title: SimpleText,
    #[serde(deserialize_with = "lenient_u64")]
    view_count: u64,
    #[serde(deserialize_with = "lenient_u64")]
    length_seconds: u64,
    external_channel_id: String,
    owner_channel_name: String,
    owner_profile_url: String,
    publish_date: String,
    category: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SimpleText {
    simple_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: TracklistRenderer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TracklistRenderer {
    caption_tracks: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrack {
    base_url: String,
    language_code: String,
}

impl DirectSource {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Slice the player response JSON out of a watch page.
fn extract_player_json(page: &str) -> FetchResult<&str> {
    let (_, rest) = page
        .split_once(START_SENTINEL)
        .ok_or_else(|| FetchError::parse("ytInitialPlayerResponse not found"))?;
    let (json, _) = rest
        .split_once(END_SENTINEL)
        .ok_or_else(|| FetchError::parse("ytInitialPlayerResponse end not found"))?;
    Ok(json)
}

/// Project a watch page into normalized metadata.
fn parse_watch_page(page: &str) -> FetchResult<VideoMetadata> {
    let json = extract_player_json(page)?;
    let player: PlayerResponse = serde_json::from_str(json)
        .map_err(|e| FetchError::parse(format!("invalid player response: {}", e)))?;

    let renderer = player
        .microformat
        .ok_or_else(|| FetchError::parse("player response has no microformat"))?
        .player_microformat_renderer;

    let captions = player
        .captions
        .map(|c| c.player_captions_tracklist_renderer.caption_tracks)
        .unwrap_or_default()
        .into_iter()
        .map(|t| CaptionTrack::new(t.base_url, t.language_code))
        .collect();

    Ok(VideoMetadata {
        title: renderer.title.simple_text,
        length_seconds: renderer.length_seconds,
        channel_id: renderer.external_channel_id,
        channel_name: renderer.owner_channel_name,
        channel_url: renderer.owner_profile_url,
        publish_date: renderer.publish_date,
        category: renderer.category,
        view_count: renderer.view_count,
        captions,
    })
}

#[async_trait]
impl MetadataSource for DirectSource {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn fetch(&self, video_id: &str) -> FetchResult<VideoMetadata> {
        let url = format!("{}/watch", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("v", video_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(status.as_u16(), "watch page request failed"));
        }

        let page = response.text().await?;
        parse_watch_page(&page)
    }
}
