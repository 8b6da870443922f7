use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::prompt::calendar::{day_label, index_to_date};
use crate::youtube::api::{find_broadcast_by_label, YouTubeClient};
use crate::youtube::auth::load_access_token;

/// Whether broadcasts bind to the channel's permanent RTMP stream or each
/// get a stream of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Persistent,
    PerBroadcast,
}

impl StreamMode {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "persistent" => Ok(StreamMode::Persistent),
            "per-broadcast" | "per-day" => Ok(StreamMode::PerBroadcast),
            other => Err(PipelineError::invalid_argument(format!(
                "stream mode must be 'persistent' or 'per-broadcast', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleOptions {
    pub dry_run: bool,
    pub verbose_existing: bool,
    pub stream_mode: StreamMode,
    pub auto_start_stop: bool,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        ScheduleOptions {
            dry_run: true,
            verbose_existing: false,
            stream_mode: StreamMode::Persistent,
            auto_start_stop: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSpec {
    pub id: String,
    pub alias: &'static str,
}

/// Outcome of looking for a day's thumbnail. An explicit value instead of a
/// bare existence check, so callers decide what a missing file means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    Found(PathBuf),
    Missing(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ScheduledStream {
    pub broadcast_id: String,
    pub stream_id: String,
    pub watch_url: String,
    pub rtmp_url: String,
    pub stream_key: String,
}

/// Parses a `start-end` day range, normalizing reversed bounds.
pub fn parse_range(arg: &str) -> Result<(i64, i64)> {
    let Some((start_raw, end_raw)) = arg.split_once('-') else {
        return Err(PipelineError::invalid_argument(format!(
            "expected a range like 275-282, got '{arg}'"
        )));
    };

    let parse = |raw: &str| -> Result<i64> {
        raw.trim().parse().map_err(|_| {
            PipelineError::invalid_argument(format!("'{raw}' is not a valid day index"))
        })
    };

    let (start, end) = (parse(start_raw)?, parse(end_raw)?);
    if start > end {
        Ok((end, start))
    } else {
        Ok((start, end))
    }
}

/// General playlist always; Sundays get the full-length session, other days
/// the half version.
pub fn choose_playlists(config: &Config, date: NaiveDate) -> Vec<PlaylistSpec> {
    let mut playlists = Vec::new();

    if !config.general_playlist_id.trim().is_empty() {
        playlists.push(PlaylistSpec {
            id: config.general_playlist_id.clone(),
            alias: "General",
        });
    }

    if date.weekday() == Weekday::Sun {
        if !config.full_playlist_id.trim().is_empty() {
            playlists.push(PlaylistSpec {
                id: config.full_playlist_id.clone(),
                alias: "Full Version",
            });
        }
    } else if !config.half_playlist_id.trim().is_empty() {
        playlists.push(PlaylistSpec {
            id: config.half_playlist_id.clone(),
            alias: "1/2 Version",
        });
    }

    playlists
}

pub fn ensure_thumbnail(sequence_dir: &Path, index: i64) -> ThumbnailOutcome {
    let path = sequence_dir.join(format!("{index}.jpg"));
    if path.is_file() {
        ThumbnailOutcome::Found(path)
    } else {
        ThumbnailOutcome::Missing(path)
    }
}

pub fn build_title(index: i64) -> Result<String> {
    Ok(format!(
        "{index}. Master's Touch Meditation — {}",
        day_label(index)?
    ))
}

pub fn build_description() -> String {
    "#YogiBhajan #Meditation #Sadhana #DailyPractice #1000DaysChallenge \
     #MastersTouchMeditation #KundaliniYoga #MeditationJourney \
     #SpiritualDiscipline #MeditationChallenge #DailyMeditation \
     #LongMeditation #MeditationSadhana #YogaPractice #MeditationLife"
        .to_string()
}

pub fn start_time_rfc3339(date: NaiveDate, start_time: &str) -> String {
    format!("{}T{start_time}", date.format("%Y-%m-%d"))
}

/// Creates one scheduled broadcast: insert, bind to a stream, upload the
/// thumbnail, add to playlists. There is no rollback; a broadcast whose
/// thumbnail upload fails stays created.
pub async fn schedule_stream(
    youtube: &YouTubeClient<'_>,
    config: &Config,
    options: &ScheduleOptions,
    title: &str,
    description: &str,
    start_time: &str,
    thumbnail_path: &Path,
    playlists: &[PlaylistSpec],
) -> Result<ScheduledStream> {
    let broadcast_id = youtube
        .insert_broadcast(
            title,
            description,
            start_time,
            options.auto_start_stop,
            options.auto_start_stop,
        )
        .await?;

    let stream_id = match options.stream_mode {
        StreamMode::Persistent => config
            .require(&config.persistent_stream_id, "PERSISTENT_STREAM_ID")?
            .to_string(),
        StreamMode::PerBroadcast => youtube.insert_stream(title).await?,
    };

    youtube.bind_broadcast(&broadcast_id, &stream_id).await?;
    youtube.set_thumbnail(&broadcast_id, thumbnail_path).await?;

    let ingestion = youtube.stream_ingestion(&stream_id).await?;

    for playlist in playlists {
        info!("Adding broadcast to playlist: {}", playlist.alias);
        youtube.add_to_playlist(&playlist.id, &broadcast_id).await?;
    }

    Ok(ScheduledStream {
        watch_url: format!("https://www.youtube.com/watch?v={broadcast_id}"),
        broadcast_id,
        stream_id,
        rtmp_url: ingestion.rtmp_url,
        stream_key: ingestion.stream_key,
    })
}

/// Schedules every day in the inclusive range, skipping days without a
/// thumbnail or with an existing broadcast, and continuing past per-day
/// failures.
pub async fn schedule_range(
    http: &Client,
    config: &Config,
    options: &ScheduleOptions,
    start: i64,
    end: i64,
) -> Result<()> {
    info!(
        "Scheduling streams for days {start}..={end} (dry_run={})",
        options.dry_run
    );

    // One broadcast listing up front covers the existing-day check for the
    // whole range; in dry-run mode no network is touched at all.
    let (youtube, existing) = if options.dry_run {
        (None, Vec::new())
    } else {
        let access_token = load_access_token(http, config).await?;
        let client = YouTubeClient::new(http, access_token);
        let existing = client.list_broadcasts().await?;
        (Some(client), existing)
    };

    for index in start..=end {
        let date = index_to_date(index)?;
        let label = day_label(index)?;
        let start_time = start_time_rfc3339(date, &config.stream_start_time);

        let thumbnail_path = match ensure_thumbnail(&config.sequence_dir, index) {
            ThumbnailOutcome::Found(path) => path,
            ThumbnailOutcome::Missing(path) => {
                warn!("[{index}] no thumbnail at {}; skipping", path.display());
                continue;
            }
        };

        if let Some(found) = find_broadcast_by_label(&existing, &label) {
            if options.verbose_existing {
                info!(
                    "[{index}] already scheduled as broadcast {} ({}); skipping",
                    found.id, found.title
                );
            } else {
                debug!("[{index}] already scheduled; skipping");
            }
            continue;
        }

        let title = build_title(index)?;
        let description = build_description();
        let playlists = choose_playlists(config, date);

        if options.dry_run {
            info!("[{index}] dry run: would schedule '{title}' at {start_time}");
            info!("[{index}]   thumbnail: {}", thumbnail_path.display());
            for playlist in &playlists {
                info!("[{index}]   playlist: {}", playlist.alias);
            }
            continue;
        }

        let youtube = youtube.as_ref().ok_or_else(|| {
            PipelineError::config("YouTube client unavailable outside dry-run")
        })?;

        info!("[{index}] creating stream for {date} at {start_time}");
        match schedule_stream(
            youtube,
            config,
            options,
            &title,
            &description,
            &start_time,
            &thumbnail_path,
            &playlists,
        )
        .await
        {
            Ok(result) => {
                info!("[{index}] done: broadcast {}", result.broadcast_id);
                info!("[{index}]   watch_url:  {}", result.watch_url);
                info!("[{index}]   rtmp_url:   {}", result.rtmp_url);
                info!("[{index}]   stream_key: {}", result.stream_key);
            }
            Err(err) => {
                error!("[{index}] failed to create stream: {err}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_with_playlists() -> Config {
        let mut config = Config::load().unwrap();
        config.general_playlist_id = "GENERAL".to_string();
        config.half_playlist_id = "HALF".to_string();
        config.full_playlist_id = "FULL".to_string();
        config
    }

    #[test]
    fn parse_range_preserves_forward_order() {
        assert_eq!(parse_range("10-12").unwrap(), (10, 12));
    }

    #[test]
    fn parse_range_sorts_reversed_bounds() {
        assert_eq!(parse_range("12-10").unwrap(), (10, 12));
    }

    #[test]
    fn parse_range_requires_a_dash() {
        assert!(matches!(
            parse_range("101"),
            Err(PipelineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn sunday_gets_the_full_version_playlist() {
        let config = config_with_playlists();
        // 2025-02-23 is a Sunday.
        let playlists = choose_playlists(&config, NaiveDate::from_ymd_opt(2025, 2, 23).unwrap());
        let aliases: Vec<&str> = playlists.iter().map(|p| p.alias).collect();
        assert_eq!(aliases, vec!["General", "Full Version"]);
    }

    #[test]
    fn weekday_gets_the_half_version_playlist() {
        let config = config_with_playlists();
        let playlists = choose_playlists(&config, NaiveDate::from_ymd_opt(2025, 2, 24).unwrap());
        let aliases: Vec<&str> = playlists.iter().map(|p| p.alias).collect();
        assert_eq!(aliases, vec!["General", "1/2 Version"]);
    }

    #[test]
    fn unset_playlists_are_left_out() {
        let mut config = config_with_playlists();
        config.general_playlist_id = String::new();
        config.half_playlist_id = String::new();
        let playlists = choose_playlists(&config, NaiveDate::from_ymd_opt(2025, 2, 24).unwrap());
        assert!(playlists.is_empty());
    }

    #[test]
    fn ensure_thumbnail_reports_found_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("7.jpg"), b"jpeg").unwrap();

        match ensure_thumbnail(dir.path(), 7) {
            ThumbnailOutcome::Found(path) => assert!(path.ends_with("7.jpg")),
            other => panic!("expected Found, got {other:?}"),
        }
        assert!(matches!(
            ensure_thumbnail(dir.path(), 8),
            ThumbnailOutcome::Missing(_)
        ));
    }

    #[test]
    fn title_embeds_the_day_label() {
        assert_eq!(
            build_title(12).unwrap(),
            "12. Master's Touch Meditation — Day 12 of 1000"
        );
        assert!(build_title(0).is_err());
    }

    #[test]
    fn start_time_is_rfc3339_with_the_configured_offset() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 20).unwrap();
        assert_eq!(
            start_time_rfc3339(date, "10:00:00-04:00"),
            "2025-02-20T10:00:00-04:00"
        );
    }

    #[test]
    fn stream_mode_is_a_closed_enumeration() {
        assert_eq!(StreamMode::parse("persistent").unwrap(), StreamMode::Persistent);
        assert_eq!(StreamMode::parse("per-day").unwrap(), StreamMode::PerBroadcast);
        assert!(StreamMode::parse("shared").is_err());
    }
}
