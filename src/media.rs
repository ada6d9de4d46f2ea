// Presentation helpers shared by every status renderer.
// None of this touches playback state.

use chrono::{DateTime, Utc};

/// Resolves a possibly bare media path against the configured media base.
pub fn resolve_media_url(base: &str, url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return Some(url.to_string());
    }

    let path = url.trim_start_matches('/');
    let base = base.trim_end_matches('/');
    Some(format!("{}/{}", base, path))
}

/// Short "how long ago" label shown under the author's name.
pub fn relative_time_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - created_at).num_minutes();
    let hours = minutes / 60;

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else {
        created_at.format("%Y-%m-%d").to_string()
    }
}

/// Fill percentage of one segment of the progress strip.
pub fn segment_fill(segment: usize, current_index: usize, progress: u8) -> u8 {
    if segment < current_index {
        100
    } else if segment == current_index {
        progress.min(100)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_resolve_media_url() {
        let base = "http://192.168.8.101:8000/";
        assert_eq!(
            resolve_media_url(base, "/media/status/1.jpg").as_deref(),
            Some("http://192.168.8.101:8000/media/status/1.jpg")
        );
        assert_eq!(
            resolve_media_url("http://cdn.local", "media/a.png").as_deref(),
            Some("http://cdn.local/media/a.png")
        );
        assert_eq!(
            resolve_media_url(base, "https://cdn.example.com/x.mp4").as_deref(),
            Some("https://cdn.example.com/x.mp4")
        );
        assert_eq!(resolve_media_url(base, "  "), None);
    }

    #[test]
    fn test_relative_time_label() {
        let now = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        assert_eq!(relative_time_label(now - Duration::seconds(30), now), "Just now");
        assert_eq!(relative_time_label(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(relative_time_label(now - Duration::minutes(185), now), "3h ago");
        assert_eq!(relative_time_label(now - Duration::days(2), now), "2024-05-01");
    }

    #[test]
    fn test_segment_fill() {
        assert_eq!(segment_fill(0, 2, 40), 100);
        assert_eq!(segment_fill(2, 2, 40), 40);
        assert_eq!(segment_fill(3, 2, 40), 0);
    }
}
