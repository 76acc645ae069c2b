//! Library-wide statistics over saved videos.

use std::collections::{BTreeMap, HashMap};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timestamp::{format_offset, parse_timestamp};
use crate::video::VideoRecord;

/// Width of a timeline bucket in seconds.
pub const TIMELINE_BUCKET_SECS: u64 = 15;

/// One event flattened together with the video it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyMoment {
    pub video_name: String,
    pub timestamp: String,
    pub description: String,
    pub is_dangerous: bool,
}

/// Dangerous incidents counted per video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VideoIncidents {
    pub name: String,
    pub incidents: u32,
}

/// Moments falling into one timeline bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimelineBucket {
    /// Bucket start as `MM:SS`
    pub time: String,
    pub incidents: u32,
}

/// Aggregate numbers shown on the statistics view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStatistics {
    pub total_moments: u32,
    pub dangerous_count: u32,
    pub safe_count: u32,
    pub active_videos: u32,
    /// Dangerous moments per video, in library order
    pub incidents_by_video: Vec<VideoIncidents>,
    /// All moments grouped into 15 second buckets, earliest first
    pub timeline: Vec<TimelineBucket>,
}

/// Flatten saved videos into key moments.
pub fn key_moments(videos: &[VideoRecord]) -> Vec<KeyMoment> {
    videos
        .iter()
        .flat_map(|video| {
            video.timestamps.iter().map(move |ts| KeyMoment {
                video_name: video.name.clone(),
                timestamp: ts.timestamp.clone(),
                description: ts.description.clone(),
                is_dangerous: ts.is_dangerous,
            })
        })
        .collect()
}

impl LibraryStatistics {
    pub fn compute(videos: &[VideoRecord]) -> Self {
        let moments = key_moments(videos);
        let dangerous_count = moments.iter().filter(|m| m.is_dangerous).count() as u32;

        let mut incidents_by_video: Vec<VideoIncidents> = Vec::new();
        let mut video_index: HashMap<&str, usize> = HashMap::new();
        for moment in moments.iter().filter(|m| m.is_dangerous) {
            let idx = *video_index
                .entry(moment.video_name.as_str())
                .or_insert_with(|| {
                    incidents_by_video.push(VideoIncidents {
                        name: moment.video_name.clone(),
                        incidents: 0,
                    });
                    incidents_by_video.len() - 1
                });
            incidents_by_video[idx].incidents += 1;
        }

        let mut buckets: BTreeMap<u64, u32> = BTreeMap::new();
        for moment in &moments {
            *buckets.entry(timeline_bucket_start(&moment.timestamp)).or_default() += 1;
        }

        Self {
            total_moments: moments.len() as u32,
            dangerous_count,
            safe_count: moments.len() as u32 - dangerous_count,
            active_videos: videos.len() as u32,
            incidents_by_video,
            timeline: buckets
                .into_iter()
                .map(|(start, incidents)| TimelineBucket {
                    time: format_offset(start as f64),
                    incidents,
                })
                .collect(),
        }
    }
}

/// Start (in seconds) of the timeline bucket a timestamp falls into.
///
/// Unparseable timestamps land in the first bucket.
pub fn timeline_bucket_start(timestamp: &str) -> u64 {
    let secs = parse_timestamp(timestamp).unwrap_or(0);
    secs / TIMELINE_BUCKET_SECS * TIMELINE_BUCKET_SECS
}

/// Render key moments as CSV with a header row.
pub fn moments_to_csv(moments: &[KeyMoment]) -> String {
    let mut lines = Vec::with_capacity(moments.len() + 1);
    lines.push("Video Name,Timestamp,Description,Is Dangerous".to_string());
    for moment in moments {
        lines.push(format!(
            "{},{},{},{}",
            csv_field(&moment.video_name),
            moment.timestamp,
            quote(&moment.description),
            moment.is_dangerous
        ));
    }
    lines.join("\n")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        quote(value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DetectionEvent, SampleOffset, TimestampedEvent};

    fn video(name: &str, events: &[(f64, &str, bool)]) -> VideoRecord {
        VideoRecord::new(
            name,
            format!("/videos/{}.mp4", name),
            events
                .iter()
                .map(|(offset, desc, danger)| {
                    TimestampedEvent::at(SampleOffset::new(*offset), DetectionEvent::new(*desc, *danger))
                })
                .collect(),
        )
    }

    #[test]
    fn test_statistics_counts() {
        let videos = vec![
            video("Parking Lot", &[(70.0, "Vehicle break-in", true), (205.0, "Regular parking", false)]),
            video("Lobby", &[(30.0, "Aggressive behavior", true), (72.0, "Unidentified person", true)]),
        ];
        let stats = LibraryStatistics::compute(&videos);

        assert_eq!(stats.total_moments, 4);
        assert_eq!(stats.dangerous_count, 3);
        assert_eq!(stats.safe_count, 1);
        assert_eq!(stats.active_videos, 2);
        assert_eq!(
            stats.incidents_by_video,
            vec![
                VideoIncidents { name: "Parking Lot".into(), incidents: 1 },
                VideoIncidents { name: "Lobby".into(), incidents: 2 },
            ]
        );
    }

    #[test]
    fn test_timeline_buckets_sorted() {
        let videos = vec![video(
            "Dock",
            &[(200.0, "a", false), (14.0, "b", true), (1.0, "c", false), (61.0, "d", true), (74.0, "e", false)],
        )];
        let stats = LibraryStatistics::compute(&videos);
        let timeline: Vec<(&str, u32)> = stats.timeline.iter().map(|b| (b.time.as_str(), b.incidents)).collect();
        assert_eq!(timeline, vec![("00:00", 2), ("01:00", 2), ("03:15", 1)]);
    }

    #[test]
    fn test_timeline_orders_by_offset_across_videos() {
        let videos = vec![
            video("Gate", &[(6000.0, "a", true), (605.0, "b", false)]),
            video("Yard", &[(90.0, "c", true), (6010.0, "d", true)]),
            video("Gate", &[(95.0, "e", true)]),
        ];
        let stats = LibraryStatistics::compute(&videos);

        let timeline: Vec<(&str, u32)> = stats.timeline.iter().map(|b| (b.time.as_str(), b.incidents)).collect();
        assert_eq!(timeline, vec![("01:30", 2), ("10:00", 1), ("100:00", 2)]);

        // Records sharing a name are counted together, in first-seen order
        assert_eq!(
            stats.incidents_by_video,
            vec![
                VideoIncidents { name: "Gate".into(), incidents: 2 },
                VideoIncidents { name: "Yard".into(), incidents: 2 },
            ]
        );
    }

    #[test]
    fn test_empty_library() {
        let stats = LibraryStatistics::compute(&[]);
        assert_eq!(stats, LibraryStatistics::default());
    }

    #[test]
    fn test_csv_export() {
        let videos = vec![video("Aisle 3", &[(45.0, "Shoplifting \"in progress\"", true)])];
        let csv = moments_to_csv(&key_moments(&videos));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Video Name,Timestamp,Description,Is Dangerous");
        assert_eq!(lines[1], "Aisle 3,00:45,\"Shoplifting \"\"in progress\"\"\",true");
    }

    #[test]
    fn test_bucket_for_unparseable_timestamp() {
        assert_eq!(timeline_bucket_start("garbage"), 0);
        assert_eq!(timeline_bucket_start("02:44"), 150);
    }
}
