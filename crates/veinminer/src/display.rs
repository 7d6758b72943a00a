//! Player-facing rendering of statistics.

use veinminer_stats::StatsSnapshot;

const HOUR_MS: u64 = 60 * 60 * 1000;

/// "Last mined" phrase for a timestamp, or `None` if never mined.
#[must_use]
pub fn format_last_mined(last_mined_at: u64, now: u64) -> Option<String> {
    if last_mined_at == 0 {
        return None;
    }

    let hours = now.saturating_sub(last_mined_at) / HOUR_MS;
    let phrase = match hours {
        0 => "Less than an hour ago".to_string(),
        1 => "1 hour ago".to_string(),
        2..=23 => format!("{hours} hours ago"),
        _ => {
            let days = hours / 24;
            if days == 1 {
                "1 day ago".to_string()
            } else {
                format!("{days} days ago")
            }
        }
    };
    Some(phrase)
}

/// The statistics report shown to a player, with `&` colour codes.
#[must_use]
pub fn format_stats(stats: &StatsSnapshot, now: u64) -> String {
    let mut lines = vec![
        "&6&l=== VeinMiner Statistics ===".to_string(),
        format!("&eTotal Veins Mined: &f{}", stats.total_veins),
        format!("&eTotal Blocks Mined: &f{}", stats.total_blocks),
        format!("&eLargest Vein: &f{} blocks", stats.largest_vein),
    ];
    if let Some(ago) = format_last_mined(stats.last_mined_at, now) {
        lines.push(format!("&eLast Mined: &f{ago}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000_000;

    #[test]
    fn test_last_mined_phrases() {
        assert_eq!(format_last_mined(0, NOW), None);
        assert_eq!(format_last_mined(NOW - 5_000, NOW).unwrap(), "Less than an hour ago");
        assert_eq!(format_last_mined(NOW - HOUR_MS, NOW).unwrap(), "1 hour ago");
        assert_eq!(format_last_mined(NOW - 5 * HOUR_MS, NOW).unwrap(), "5 hours ago");
        assert_eq!(format_last_mined(NOW - 30 * HOUR_MS, NOW).unwrap(), "1 day ago");
        assert_eq!(format_last_mined(NOW - 72 * HOUR_MS, NOW).unwrap(), "3 days ago");
        // A clock running behind the record reads as recent
        assert_eq!(format_last_mined(NOW + 10, NOW).unwrap(), "Less than an hour ago");
    }

    #[test]
    fn test_report_lines() {
        let stats = StatsSnapshot {
            name: "Steve".to_string(),
            total_veins: 3,
            total_blocks: 120,
            largest_vein: 64,
            last_mined_at: NOW - 2 * HOUR_MS,
        };
        let report = format_stats(&stats, NOW);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "&eTotal Veins Mined: &f3");
        assert_eq!(lines[3], "&eLargest Vein: &f64 blocks");
        assert_eq!(lines[4], "&eLast Mined: &f2 hours ago");
    }

    #[test]
    fn test_report_without_history() {
        let report = format_stats(&StatsSnapshot::empty("New"), NOW);
        assert_eq!(report.lines().count(), 4);
    }
}
