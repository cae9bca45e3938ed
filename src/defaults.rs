//! Seed data returned when a collection has never been saved.

use crate::models::{BurstMoment, EchoSignal, Frequency, MediaType, SiteConfig, StationStatus};

/// Cover shown for posts without a feature image.
pub const PLACEHOLDER_COVER: &str =
    "https://images.unsplash.com/photo-1614730341194-75c60740a3d3?q=80&w=2000&auto=format&fit=crop";

pub fn default_echoes() -> Vec<EchoSignal> {
    [
        ("e-01", "Static Speaks: Decoding the Background...", "SIG-01", "0:54"),
        ("e-02", "Lost Colony Reports: Sector 7G...", "SIG-02", "1:02"),
        ("e-03", "Nebula Sounds: Music from the Gas...", "SIG-03", "0:42"),
        ("e-04", "The Artificial Mind: Can AI Dream?", "SIG-04", "0:42"),
        ("e-05", "Void Whispers: Audio Logs recovered...", "SIG-05", "0:56"),
    ]
    .into_iter()
    .map(|(id, title, episode, duration)| EchoSignal {
        id: id.to_string(),
        title: title.to_string(),
        episode: episode.to_string(),
        duration: duration.to_string(),
        image: None,
    })
    .collect()
}

pub fn default_moments() -> Vec<BurstMoment> {
    let moment = |id: &str, title: &str, caption: &str, image: &str, tags: [&str; 3], read_time: &str, date: &str| {
        BurstMoment {
            id: id.to_string(),
            title: title.to_string(),
            image: image.to_string(),
            media_type: MediaType::Image,
            caption: caption.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            read_time: read_time.to_string(),
            date: date.to_string(),
        }
    };

    vec![
        moment(
            "b-1",
            "Anomaly Detected in Sector 4",
            "Sensors indicate a tear in the fabric of reality. Visual confirmation pending.",
            "https://images.unsplash.com/photo-1506318137071-a8bcbf6755dd?q=80&w=800&auto=format&fit=crop",
            ["Alert", "Anomaly", "Sector-4"],
            "02:00",
            "Today",
        ),
        moment(
            "b-2",
            "The Abandoned Station",
            "Interior shots of Station 99. No life signs detected, but systems are active.",
            "https://images.unsplash.com/photo-1518544806352-a228605200bd?q=80&w=800&auto=format&fit=crop",
            ["Exploration", "Ruins", "Log"],
            "12:00",
            "Yesterday",
        ),
        moment(
            "b-3",
            "Tech Analysis: Alien Artifacts",
            "Declassified blueprints of the recovered propulsion drive. It defies physics.",
            "https://images.unsplash.com/photo-1518005052357-e98475018297?q=80&w=800&auto=format&fit=crop",
            ["Tech", "Xeno", "Science"],
            "06:00",
            "Cycle 444",
        ),
    ]
}

pub fn default_site_config() -> SiteConfig {
    SiteConfig {
        site_title: "Station445 | Cosmic Relay".to_string(),
        site_description: "An ultra-minimalist, cosmic horror/sci-fi blog platform broadcasting signals from the void."
            .to_string(),
        station_status: StationStatus::Online,
        maintenance_mode: false,
        admin_contact: "sys_admin@station445.void".to_string(),
        enable_hero_alert_color: true,
        enable_footer_pulse: true,
    }
}

pub const FREQUENCIES: &[Frequency] = &[
    Frequency {
        id: "f-1",
        title: "Auditory Hallucinations of Deep Space",
        excerpt: "Explore the work of Comms Officer H. Webb, who documented the singing of the stars before vanishing.",
        image: "https://images.unsplash.com/photo-1451187580459-43490279c0fa?q=80&w=800&auto=format&fit=crop",
        tags: &["Audio", "Mystery", "Logs"],
        date: "Cycle 440.12",
    },
    Frequency {
        id: "f-2",
        title: "Visualizing the 4th Dimension",
        excerpt: "Rare imagery captured by the drone fleet near the wormhole entrance. Viewer discretion advised.",
        image: "https://images.unsplash.com/photo-1534447677768-be436bb09401?q=80&w=800&auto=format&fit=crop",
        tags: &["Visual", "Physics", "Drone"],
        date: "Cycle 442.88",
    },
];
