use chrono::NaiveDate;
use reqwest::Client;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::facebook::FacebookClient;
use crate::ledger::PostedLedger;
use crate::prompt::calendar::{date_to_index, day_label};
use crate::youtube::api::{find_broadcast_by_label, YouTubeClient};
use crate::youtube::auth::load_access_token;

/// What `post-if-finished` decided for a given day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Posted { broadcast_id: String, post_id: String },
    AlreadyPosted { broadcast_id: String },
    NotFinished { broadcast_id: String, status: String },
    NoBroadcast,
    DryRun { broadcast_id: String },
}

pub fn post_message(index: i64) -> String {
    format!(
        "Master's touch meditation, day {index}.\nMeditaci\u{f3}n del toque del Maestro, d\u{ed}a {index}."
    )
}

pub fn watch_link(broadcast_id: &str) -> String {
    format!("https://youtube.com/live/{broadcast_id}")
}

/// Posts the day's stream to Facebook once it has finished, at most once per
/// broadcast. The ledger keeps the at-most-once guarantee across runs.
pub async fn post_if_finished(
    http: &Client,
    config: &Config,
    date: NaiveDate,
    dry_run: bool,
) -> Result<PostOutcome> {
    let index = date_to_index(date)?;
    let label = day_label(index)?;
    info!("Looking for the {label} broadcast ({date})");

    let access_token = load_access_token(http, config).await?;
    let youtube = YouTubeClient::new(http, access_token);

    let broadcasts = youtube.list_broadcasts().await?;
    let Some(broadcast) = find_broadcast_by_label(&broadcasts, &label) else {
        warn!("No broadcast found for {label}");
        return Ok(PostOutcome::NoBroadcast);
    };
    let broadcast_id = broadcast.id.clone();
    info!("Found broadcast {broadcast_id}: {}", broadcast.title);

    let mut ledger = PostedLedger::load(&config.posted_streams_path);
    if ledger.contains(&broadcast_id) {
        info!("Broadcast {broadcast_id} was already posted; nothing to do");
        return Ok(PostOutcome::AlreadyPosted { broadcast_id });
    }

    let status = youtube.broadcast_status(&broadcast_id).await?;
    if !status.finished {
        info!(
            "Broadcast {broadcast_id} has not finished yet (status: {})",
            status.life_cycle_status
        );
        return Ok(PostOutcome::NotFinished {
            broadcast_id,
            status: status.life_cycle_status,
        });
    }

    let message = post_message(index);
    let link = watch_link(&broadcast_id);

    if dry_run {
        info!("Dry run: would post to Facebook:\n{message}\n{link}");
        return Ok(PostOutcome::DryRun { broadcast_id });
    }

    let facebook = FacebookClient::new(http, config)?;
    let post_id = facebook.create_post(&message, Some(&link)).await?;
    info!("Posted to Facebook as {post_id}");

    ledger.mark(&broadcast_id).map_err(|err| match err {
        // A post that succeeded but could not be recorded would repeat on
        // the next run; surface that loudly.
        PipelineError::Io(io) => PipelineError::config(format!(
            "posted to Facebook but failed to update {}: {io}",
            config.posted_streams_path.display()
        )),
        other => other,
    })?;

    Ok(PostOutcome::Posted {
        broadcast_id,
        post_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_message_is_bilingual() {
        let message = post_message(42);
        assert_eq!(
            message,
            "Master's touch meditation, day 42.\nMeditación del toque del Maestro, día 42."
        );
    }

    #[test]
    fn watch_link_uses_the_live_url_form() {
        assert_eq!(watch_link("abc123"), "https://youtube.com/live/abc123");
    }
}
