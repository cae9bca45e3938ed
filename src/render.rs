//! Plain-text views of site records for the terminal.

use std::fmt::Write;

use crate::models::{BurstMoment, EchoSignal, Frequency, SiteConfig, StationStatus, Transmission};

const WIDTH: usize = 80;

pub fn banner(config: &SiteConfig) -> String {
    let mut out = format!("{} [{}]", config.site_title, config.station_status);
    if config.maintenance_mode {
        out.push_str(" // MAINTENANCE MODE");
    }
    out
}

pub fn transmission_summary(t: &Transmission) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", t.title);
    let _ = writeln!(
        out,
        "  {} · {} · {}",
        t.publish_date,
        t.read_time,
        t.author.as_deref().unwrap_or("Unknown")
    );
    if !t.tags.is_empty() {
        let _ = writeln!(out, "  [{}]", t.tags.join("] ["));
    }
    let _ = writeln!(out, "  {}", t.excerpt);
    let _ = write!(out, "  /transmissions/{}", t.slug);
    out
}

pub fn transmission_full(t: &Transmission) -> String {
    let mut out = transmission_summary(t);
    out.push_str("\n\n");
    match t.content.as_deref() {
        Some(html) if !html.is_empty() => out.push_str(&html_to_text(html)),
        _ => out.push_str("[ NO SIGNAL BODY ]"),
    }
    out
}

/// Convert HTML to plain text. If the input doesn't look like HTML, return it as-is.
fn html_to_text(text: &str) -> String {
    if !text.contains('<') {
        return text.to_string();
    }
    html2text::from_read(text.as_bytes(), WIDTH).unwrap_or_else(|_| text.to_string())
}

pub fn echo_line(e: &EchoSignal) -> String {
    format!("{:<8} {:<48} {:>6}  ({})", e.episode, e.title, e.duration, e.id)
}

pub fn moment_block(m: &BurstMoment) -> String {
    let mut out = format!("[{}] {} ({})\n", m.media_type.label(), m.title, m.id);
    if !m.caption.is_empty() {
        let _ = writeln!(out, "  {}", m.caption);
    }
    let _ = writeln!(out, "  tags: {}", m.tags.join(", "));
    let _ = write!(out, "  duration {} · {}", m.read_time, m.date);
    out
}

pub fn frequency_block(f: &Frequency) -> String {
    format!("{} ({})\n  {}\n  [{}]", f.title, f.date, f.excerpt, f.tags.join("] ["))
}

/// Status headline shown on the admin dashboard.
pub fn status_health(status: StationStatus) -> &'static str {
    match status {
        StationStatus::Online => "Optimal",
        _ => "Check Logs",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{default_echoes, default_site_config};

    fn transmission(content: Option<&str>) -> Transmission {
        Transmission {
            id: "p-1".to_string(),
            title: "The Hum".to_string(),
            excerpt: "Low frequency.".to_string(),
            content: content.map(str::to_string),
            cover_image: String::new(),
            read_time: "3 min read".to_string(),
            tags: vec!["Audio".to_string(), "Anomaly".to_string()],
            publish_date: "Jan 5, 2024".to_string(),
            slug: "the-hum".to_string(),
            author: None,
        }
    }

    #[test]
    fn summary_lists_metadata() {
        let text = transmission_summary(&transmission(None));
        assert!(text.contains("Jan 5, 2024 · 3 min read · Unknown"));
        assert!(text.contains("[Audio] [Anomaly]"));
        assert!(text.ends_with("/transmissions/the-hum"));
    }

    #[test]
    fn full_view_strips_html() {
        let text = transmission_full(&transmission(Some("<p>It <strong>hums</strong>.</p>")));
        assert!(text.contains("hums"));
        assert!(!text.contains("<p>"));
        assert!(transmission_full(&transmission(None)).ends_with("[ NO SIGNAL BODY ]"));
    }

    #[test]
    fn banner_flags_maintenance() {
        let mut config = default_site_config();
        assert_eq!(banner(&config), "Station445 | Cosmic Relay [ONLINE]");
        config.maintenance_mode = true;
        assert!(banner(&config).ends_with("// MAINTENANCE MODE"));
    }

    #[test]
    fn echo_line_contains_episode_and_id() {
        let line = echo_line(&default_echoes()[0]);
        assert!(line.starts_with("SIG-01"));
        assert!(line.ends_with("(e-01)"));
    }

    #[test]
    fn health_is_optimal_only_when_online() {
        assert_eq!(status_health(StationStatus::Online), "Optimal");
        assert_eq!(status_health(StationStatus::Silent), "Check Logs");
    }
}
