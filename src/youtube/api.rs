use std::path::Path;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::{PipelineError, Result};

const SERVICE: &str = "YouTube";
const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/youtube/v3";

/// Ingestion endpoint of a live stream: where the encoder pushes RTMP.
#[derive(Debug, Clone)]
pub struct StreamIngestion {
    pub rtmp_url: String,
    pub stream_key: String,
}

#[derive(Debug, Clone)]
pub struct BroadcastSummary {
    pub id: String,
    pub title: String,
}

/// Lifecycle snapshot used to decide whether a stream already finished.
#[derive(Debug, Clone)]
pub struct BroadcastStatus {
    pub life_cycle_status: String,
    pub finished: bool,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BroadcastItem {
    id: String,
    #[serde(default)]
    snippet: Option<BroadcastSnippet>,
    #[serde(default)]
    status: Option<BroadcastLifeCycle>,
    #[serde(default, rename = "contentDetails")]
    content_details: Option<BroadcastContentDetails>,
}

#[derive(Debug, Deserialize)]
struct BroadcastSnippet {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastLifeCycle {
    #[serde(default)]
    life_cycle_status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastContentDetails {
    #[serde(default)]
    actual_end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamItem {
    cdn: StreamCdn,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamCdn {
    ingestion_info: IngestionInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngestionInfo {
    ingestion_address: String,
    stream_name: String,
}

/// Bearer-token client for the handful of YouTube Data API calls the
/// pipeline needs. Every method is one request; a failed later step leaves
/// earlier writes in place (no rollback).
pub struct YouTubeClient<'a> {
    http: &'a Client,
    access_token: String,
}

async fn into_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PipelineError::upstream(SERVICE, status.as_u16(), body));
    }
    response
        .json()
        .await
        .map_err(|err| PipelineError::transport(SERVICE, err))
}

async fn check_ok(response: Response) -> Result<()> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PipelineError::upstream(SERVICE, status.as_u16(), body));
    }
    Ok(())
}

impl<'a> YouTubeClient<'a> {
    pub fn new(http: &'a Client, access_token: String) -> Self {
        YouTubeClient { http, access_token }
    }

    /// Creates a scheduled liveBroadcast and returns its id.
    pub async fn insert_broadcast(
        &self,
        title: &str,
        description: &str,
        start_time_rfc3339: &str,
        enable_auto_start: bool,
        enable_auto_stop: bool,
    ) -> Result<String> {
        let body = json!({
            "snippet": {
                "title": title,
                "description": description,
                "scheduledStartTime": start_time_rfc3339,
            },
            "status": {
                "privacyStatus": "public",
                "selfDeclaredMadeForKids": false,
            },
            "contentDetails": {
                "enableAutoStart": enable_auto_start,
                "enableAutoStop": enable_auto_stop,
            },
        });

        let response = self
            .http
            .post(format!("{API_BASE}/liveBroadcasts"))
            .bearer_auth(&self.access_token)
            .query(&[("part", "snippet,contentDetails,status")])
            .json(&body)
            .send()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;

        let created: InsertResponse = into_json(response).await?;
        info!("Created liveBroadcast {}", created.id);
        Ok(created.id)
    }

    /// Creates a variable-resolution RTMP liveStream and returns its id.
    pub async fn insert_stream(&self, title: &str) -> Result<String> {
        let body = json!({
            "snippet": { "title": title },
            "cdn": {
                "ingestionType": "rtmp",
                "resolution": "variable",
                "frameRate": "variable",
            },
        });

        let response = self
            .http
            .post(format!("{API_BASE}/liveStreams"))
            .bearer_auth(&self.access_token)
            .query(&[("part", "snippet,cdn")])
            .json(&body)
            .send()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;

        let created: InsertResponse = into_json(response).await?;
        info!("Created liveStream {}", created.id);
        Ok(created.id)
    }

    pub async fn bind_broadcast(&self, broadcast_id: &str, stream_id: &str) -> Result<()> {
        let response = self
            .http
            .post(format!("{API_BASE}/liveBroadcasts/bind"))
            .bearer_auth(&self.access_token)
            .query(&[
                ("part", "id,contentDetails"),
                ("id", broadcast_id),
                ("streamId", stream_id),
            ])
            .send()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;
        check_ok(response).await
    }

    pub async fn set_thumbnail(&self, video_id: &str, thumbnail_path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(thumbnail_path).await?;
        let response = self
            .http
            .post(format!("{UPLOAD_BASE}/thumbnails/set"))
            .bearer_auth(&self.access_token)
            .query(&[("videoId", video_id)])
            .header("Content-Type", "image/jpeg")
            .body(bytes)
            .send()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;
        check_ok(response).await
    }

    pub async fn add_to_playlist(&self, playlist_id: &str, video_id: &str) -> Result<()> {
        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": {
                    "kind": "youtube#video",
                    "videoId": video_id,
                },
            },
        });

        let response = self
            .http
            .post(format!("{API_BASE}/playlistItems"))
            .bearer_auth(&self.access_token)
            .query(&[("part", "snippet")])
            .json(&body)
            .send()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;
        check_ok(response).await
    }

    /// RTMP address and stream key of a liveStream.
    pub async fn stream_ingestion(&self, stream_id: &str) -> Result<StreamIngestion> {
        let response = self
            .http
            .get(format!("{API_BASE}/liveStreams"))
            .bearer_auth(&self.access_token)
            .query(&[("part", "cdn"), ("id", stream_id)])
            .send()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;

        let listed: ListResponse<StreamItem> = into_json(response).await?;
        let item = listed.items.into_iter().next().ok_or_else(|| {
            PipelineError::Upstream {
                service: SERVICE,
                status: None,
                message: format!("no liveStream found with id {stream_id}"),
            }
        })?;
        Ok(StreamIngestion {
            rtmp_url: item.cdn.ingestion_info.ingestion_address,
            stream_key: item.cdn.ingestion_info.stream_name,
        })
    }

    /// All broadcasts owned by the channel, walked page by page.
    pub async fn list_broadcasts(&self) -> Result<Vec<BroadcastSummary>> {
        let mut broadcasts = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("part", "id,snippet".to_string()),
                ("mine", "true".to_string()),
                ("maxResults", "50".to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .http
                .get(format!("{API_BASE}/liveBroadcasts"))
                .bearer_auth(&self.access_token)
                .query(&query)
                .send()
                .await
                .map_err(|err| PipelineError::transport(SERVICE, err))?;

            let listed: ListResponse<BroadcastItem> = into_json(response).await?;
            for item in listed.items {
                broadcasts.push(BroadcastSummary {
                    id: item.id,
                    title: item.snippet.map(|s| s.title).unwrap_or_default(),
                });
            }

            match listed.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(broadcasts)
    }

    /// A broadcast counts as finished when it reports `complete` or carries
    /// an actual end time.
    pub async fn broadcast_status(&self, broadcast_id: &str) -> Result<BroadcastStatus> {
        let response = self
            .http
            .get(format!("{API_BASE}/liveBroadcasts"))
            .bearer_auth(&self.access_token)
            .query(&[("part", "status,contentDetails"), ("id", broadcast_id)])
            .send()
            .await
            .map_err(|err| PipelineError::transport(SERVICE, err))?;

        let listed: ListResponse<BroadcastItem> = into_json(response).await?;
        let Some(item) = listed.items.into_iter().next() else {
            return Ok(BroadcastStatus {
                life_cycle_status: "not found".to_string(),
                finished: false,
            });
        };

        let life_cycle_status = item
            .status
            .and_then(|s| s.life_cycle_status)
            .unwrap_or_else(|| "unknown".to_string());
        let has_end_time = item
            .content_details
            .and_then(|details| details.actual_end_time)
            .map(|value| !value.is_empty())
            .unwrap_or(false);

        Ok(BroadcastStatus {
            finished: life_cycle_status == "complete" || has_end_time,
            life_cycle_status,
        })
    }
}

/// Picks the broadcast whose title carries the given day label. The
/// scheduler always embeds the label, so this is how a day maps back to its
/// broadcast.
pub fn find_broadcast_by_label<'b>(
    broadcasts: &'b [BroadcastSummary],
    day_label: &str,
) -> Option<&'b BroadcastSummary> {
    broadcasts
        .iter()
        .find(|broadcast| broadcast.title.contains(day_label))
}
