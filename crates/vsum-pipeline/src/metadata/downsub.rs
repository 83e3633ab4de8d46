//! Downsub API back-end.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use vsum_models::{CaptionTrack, Language, VideoMetadata};

use super::{lenient_u64, MetadataSource};
use crate::error::{FetchError, FetchResult};

/// Fetches metadata and caption links from the Downsub API.
pub struct DownsubSource {
    http: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct DownsubRequest {
    url: String,
}

#[derive(Debug, Deserialize)]
struct DownsubResponse {
    #[serde(default)]
    status: String,
    data: Option<DownsubData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DownsubData {
    title: String,
    #[serde(deserialize_with = "lenient_u64")]
    duration: u64,
    metadata: DownsubMetadata,
    subtitles: Vec<Subtitle>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DownsubMetadata {
    author: String,
    channel_id: String,
    channel_url: String,
    publish_date: String,
    category: String,
    #[serde(deserialize_with = "lenient_u64")]
    view_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Subtitle {
    language: String,
    formats: Vec<Format>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Format {
    format: String,
    url: String,
}

impl DownsubSource {
    pub fn new(http: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

/// Keep the first SRT variant of each subtitle whose spelled-out language
/// maps onto the allow-list.
fn srt_tracks(subtitles: Vec<Subtitle>) -> Vec<CaptionTrack> {
    subtitles
        .into_iter()
        .filter_map(|subtitle| {
            let lang = Language::from_provider_name(&subtitle.language)?;
            let srt = subtitle
                .formats
                .into_iter()
                .find(|f| f.format.eq_ignore_ascii_case("srt"))?;
            Some(CaptionTrack::new(srt.url, lang.as_str()))
        })
        .collect()
}

fn into_metadata(response: DownsubResponse) -> FetchResult<VideoMetadata> {
    let data = response.data.ok_or_else(|| {
        FetchError::parse(format!("downsub response has no data (status {:?})", response.status))
    })?;

    Ok(VideoMetadata {
        title: data.title,
        length_seconds: data.duration,
        channel_id: data.metadata.channel_id,
        channel_name: data.metadata.author,
        channel_url: data.metadata.channel_url,
        publish_date: data.metadata.publish_date,
        category: data.metadata.category,
        view_count: data.metadata.view_count,
        captions: srt_tracks(data.subtitles),
    })
}

#[async_trait]
impl MetadataSource for DownsubSource {
    fn name(&self) -> &'static str {
        "downsub"
    }

    async fn fetch(&self, video_id: &str) -> FetchResult<VideoMetadata> {
        let request = DownsubRequest {
            url: format!("https://www.youtube.com/watch?v={}", video_id),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::status(status.as_u16(), body));
        }

        let body = response.text().await?;
        let parsed: DownsubResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::parse(format!("invalid downsub response: {}", e)))?;
        into_metadata(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn downsub_body() -> serde_json::Value {
        serde_json::json!({
            "status": "success",
            "data": {
                "state": "done",
                "title": "Never Gonna Give You Up",
                "duration": 212,
                "metadata": {
                    "author": "Rick Astley",
                    "channelId": "UCuAXFkgsw1L7xaCfnd5JJOw",
                    "channelUrl": "https://www.youtube.com/channel/UCuAXFkgsw1L7xaCfnd5JJOw",
                    "description": "The official video",
                    "publishDate": "2009-10-24",
                    "category": "Music",
                    "viewCount": 1500000000u64
                },
                "subtitles": [
                    { "language": "English (auto-generated)", "formats": [
                        { "format": "txt", "url": "https://dl/en.txt" },
                        { "format": "srt", "url": "https://dl/en.srt" },
                        { "format": "srt", "url": "https://dl/en-2.srt" }
                    ]},
                    { "language": "Japanese", "formats": [{ "format": "srt", "url": "https://dl/ja.srt" }] },
                    { "language": "Portuguese", "formats": [{ "format": "vtt", "url": "https://dl/pt.vtt" }] },
                    { "language": "German", "formats": [{ "format": "srt", "url": "https://dl/de.srt" }] }
                ],
                "translatedSubtitles": []
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_maps_languages_and_srt_links() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/download"))
            .and(header("authorization", "Bearer ds-key"))
            .and(body_json(serde_json::json!({
                "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(downsub_body()))
            .expect(1)
            .mount(&server)
            .await;

        let source = DownsubSource::new(Client::new(), format!("{}/download", server.uri()), "ds-key");
        let metadata = source.fetch("dQw4w9WgXcQ").await.unwrap();

        assert_eq!(metadata.title, "Never Gonna Give You Up");
        assert_eq!(metadata.length_seconds, 212);
        assert_eq!(metadata.channel_name, "Rick Astley");
        assert_eq!(metadata.view_count, 1_500_000_000);
        assert_eq!(
            metadata.captions,
            vec![
                CaptionTrack::new("https://dl/en.srt", "en"),
                CaptionTrack::new("https://dl/de.srt", "de"),
            ]
        );
    }

    #[test]
    fn test_view_count_as_string() {
        let mut body = downsub_body();
        body["data"]["metadata"]["viewCount"] = serde_json::json!("42");
        let response: DownsubResponse = serde_json::from_value(body).unwrap();
        assert_eq!(into_metadata(response).unwrap().view_count, 42);
    }

    #[test]
    fn test_missing_data_is_parse_error() {
        let response: DownsubResponse =
            serde_json::from_value(serde_json::json!({ "status": "error" })).unwrap();
        assert!(matches!(into_metadata(response), Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let source = DownsubSource::new(Client::new(), server.uri(), "wrong");
        let err = source.fetch("dQw4w9WgXcQ").await.unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("bad token"));
    }
}
