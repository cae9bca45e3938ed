//! Interactive station command console.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use inquire::{Confirm, Select, Text};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Pacing;
use crate::extract::{encode_data_uri, guess_mime};
use crate::gate::AdminGate;
use crate::models::{EchoDraft, MediaType, MomentDraft, SiteConfig, StationStatus, TagsInput};
use crate::render;
use crate::session::BrowserSession;
use crate::store::{self, ECHOES, MOMENTS, SITE_CONFIG};
use crate::terminal::{self, ConsoleReply, SequenceOutcome};

pub struct Console<'a> {
    pub session: &'a BrowserSession,
    pub gate: AdminGate,
    pub pacing: Pacing,
    pub tz: Tz,
}

#[derive(Clone, Copy)]
enum Tab {
    Dashboard,
    Visuals,
    Music,
    Seo,
    Terminal,
    Logout,
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tab::Dashboard => "Dashboard",
            Tab::Visuals => "Visual Archives",
            Tab::Music => "Echo Signals",
            Tab::Seo => "Site Protocol",
            Tab::Terminal => "Terminal",
            Tab::Logout => "Logout",
        })
    }
}

#[derive(Clone, Copy)]
enum Action {
    Add,
    Edit,
    Delete,
    Back,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Add => "Add",
            Action::Edit => "Edit",
            Action::Delete => "Delete",
            Action::Back => "Back",
        })
    }
}

const ACTIONS: [Action; 4] = [Action::Add, Action::Edit, Action::Delete, Action::Back];

impl Console<'_> {
    pub async fn run(&self, cancel: &CancellationToken) -> Result<()> {
        if !self.gate.is_granted(self.session).await? && !self.login(cancel).await? {
            return Ok(());
        }

        println!("Welcome, Administrator");

        loop {
            let tabs = vec![Tab::Dashboard, Tab::Visuals, Tab::Music, Tab::Seo, Tab::Terminal, Tab::Logout];
            let tab = Select::new("STATION COMMAND", tabs).prompt()?;
            match tab {
                Tab::Dashboard => self.dashboard().await?,
                Tab::Visuals => self.visuals().await?,
                Tab::Music => self.music().await?,
                Tab::Seo => self.seo().await?,
                Tab::Terminal => self.terminal().await?,
                Tab::Logout => {
                    self.gate.logout(self.session).await?;
                    println!("Uplink closed.");
                    return Ok(());
                }
            }
        }
    }

    /// Returns false when the operator gives up (empty passcode) or the sequence is cancelled.
    async fn login(&self, cancel: &CancellationToken) -> Result<bool> {
        loop {
            let pass = rpassword::prompt_password_stdout("Clearance code: ").context("reading clearance code")?;
            if pass.is_empty() {
                return Ok(false);
            }

            let outcome = self
                .gate
                .login(self.session, &pass, &self.pacing, cancel, |line| println!("> {line}"))
                .await?;

            match outcome {
                SequenceOutcome::Granted => return Ok(true),
                SequenceOutcome::Denied => continue,
                SequenceOutcome::Cancelled => return Ok(false),
            }
        }
    }

    async fn dashboard(&self) -> Result<()> {
        let config = SITE_CONFIG.get(self.session.local()).await?;
        let echoes = ECHOES.get(self.session.local()).await?;
        let moments = MOMENTS.get(self.session.local()).await?;

        println!("{}", render::banner(&config));
        println!(
            "  System status: {} ({})",
            config.station_status,
            render::status_health(config.station_status)
        );
        println!("  Echo signals:  {}", echoes.len());
        println!("  Visual assets: {}", moments.len());
        println!("  Admin contact: {}", config.admin_contact);
        Ok(())
    }

    async fn visuals(&self) -> Result<()> {
        loop {
            let moments = MOMENTS.get(self.session.local()).await?;
            for moment in &moments {
                println!("{}", render::moment_block(moment));
            }

            match Select::new("Visual Archives", ACTIONS.to_vec()).prompt()? {
                Action::Add => {
                    let draft = moment_form(MomentDraft {
                        media_type: Some(MediaType::Image),
                        ..Default::default()
                    })?;
                    self.save_moment(draft).await?;
                }
                Action::Edit => {
                    let Some(index) = pick(moments.iter().map(|m| format!("{} ({})", m.title, m.id)).collect())? else {
                        continue;
                    };
                    let draft = moment_form(MomentDraft::from(&moments[index]))?;
                    self.save_moment(draft).await?;
                }
                Action::Delete => {
                    let Some(index) = pick(moments.iter().map(|m| format!("{} ({})", m.title, m.id)).collect())? else {
                        continue;
                    };
                    if Confirm::new("CONFIRM PURGE: Visual data will be lost.")
                        .with_default(false)
                        .prompt()?
                    {
                        store::delete_moment(self.session.local(), &moments[index].id).await?;
                    }
                }
                Action::Back => return Ok(()),
            }
        }
    }

    async fn save_moment(&self, draft: MomentDraft) -> Result<()> {
        match store::upsert_moment(self.session.local(), draft, Utc::now(), self.tz).await {
            Ok(id) => println!("Committed {id}"),
            Err(crate::error::EditError::MissingField(field)) => println!("Not saved: {field} is required"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    async fn music(&self) -> Result<()> {
        loop {
            let echoes = ECHOES.get(self.session.local()).await?;
            for echo in &echoes {
                println!("{}", render::echo_line(echo));
            }

            match Select::new("Echo Signals", ACTIONS.to_vec()).prompt()? {
                Action::Add => {
                    let draft = echo_form(EchoDraft::default())?;
                    self.save_echo(draft).await?;
                }
                Action::Edit => {
                    let Some(index) = pick(echoes.iter().map(render::echo_line).collect())? else {
                        continue;
                    };
                    let draft = echo_form(EchoDraft::from(&echoes[index]))?;
                    self.save_echo(draft).await?;
                }
                Action::Delete => {
                    let Some(index) = pick(echoes.iter().map(render::echo_line).collect())? else {
                        continue;
                    };
                    if Confirm::new("CONFIRM DELETION: This action cannot be undone.")
                        .with_default(false)
                        .prompt()?
                    {
                        store::delete_echo(self.session.local(), &echoes[index].id).await?;
                    }
                }
                Action::Back => return Ok(()),
            }
        }
    }

    async fn save_echo(&self, draft: EchoDraft) -> Result<()> {
        match store::upsert_echo(self.session.local(), draft, Utc::now()).await {
            Ok(id) => println!("Committed {id}"),
            Err(crate::error::EditError::MissingField(field)) => println!("Not saved: {field} is required"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    async fn seo(&self) -> Result<()> {
        let mut config = SITE_CONFIG.get(self.session.local()).await?;
        loop {
            let fields = vec![
                format!("Site title: {}", config.site_title),
                format!("Description: {}", config.site_description),
                format!("Station status: {}", config.station_status),
                format!("Maintenance mode: {}", on_off(config.maintenance_mode)),
                format!("Admin contact: {}", config.admin_contact),
                format!("Hero alert color: {}", on_off(config.enable_hero_alert_color)),
                format!("Footer pulse: {}", on_off(config.enable_footer_pulse)),
                "Update protocol".to_string(),
                "Discard".to_string(),
            ];
            let Some(index) = pick(fields)? else {
                return Ok(());
            };
            match index {
                0 => config.site_title = Text::new("Site title").with_initial_value(&config.site_title).prompt()?,
                1 => {
                    config.site_description = Text::new("Description")
                        .with_initial_value(&config.site_description)
                        .prompt()?
                }
                2 => config.station_status = Select::new("Station status", StationStatus::ALL.to_vec()).prompt()?,
                3 => config.maintenance_mode = !config.maintenance_mode,
                4 => {
                    config.admin_contact = Text::new("Admin contact")
                        .with_initial_value(&config.admin_contact)
                        .prompt()?
                }
                5 => config.enable_hero_alert_color = !config.enable_hero_alert_color,
                6 => config.enable_footer_pulse = !config.enable_footer_pulse,
                7 => {
                    SITE_CONFIG.save(self.session.local(), &config).await?;
                    info!(status = %config.station_status, "site protocol updated");
                    println!("{}", render::banner(&config));
                    return Ok(());
                }
                _ => return Ok(()),
            }
        }
    }

    async fn terminal(&self) -> Result<()> {
        let mut config: SiteConfig = SITE_CONFIG.get(self.session.local()).await?;
        for line in terminal::CONSOLE_BANNER {
            println!("{line}");
        }
        loop {
            let input = Text::new(">").prompt()?;
            if input.trim().eq_ignore_ascii_case("exit") {
                return Ok(());
            }
            match terminal::respond(&input, &config, Utc::now()) {
                ConsoleReply::Text(text) => println!("  {text}"),
                ConsoleReply::Clear => print!("\x1B[2J\x1B[1;1H"),
                ConsoleReply::Reboot(text) => {
                    println!("  {text}");
                    config = SITE_CONFIG.get(self.session.local()).await?;
                }
                ConsoleReply::Nothing => {}
            }
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

/// Select one of `labels`, returning its index. `None` for an empty list or Esc.
fn pick(labels: Vec<String>) -> Result<Option<usize>> {
    if labels.is_empty() {
        println!("Nothing here.");
        return Ok(None);
    }
    Ok(Select::new("Select", labels).raw_prompt_skippable()?.map(|choice| choice.index))
}

/// Prompt for one form field. When editing, an emptied field is kept as `""` so it
/// overwrites the stored value; a new item leaves it unset so defaults apply.
fn prompt_field(label: &str, current: Option<&str>, editing: bool) -> Result<Option<String>> {
    let mut text = Text::new(label);
    if let Some(current) = current {
        text = text.with_initial_value(current);
    }
    Ok(form_value(text.prompt()?, editing))
}

fn form_value(value: String, editing: bool) -> Option<String> {
    if value.is_empty() && !editing { None } else { Some(value) }
}

fn echo_form(mut draft: EchoDraft) -> Result<EchoDraft> {
    let editing = draft.id.is_some();
    draft.episode = prompt_field("EPISODE ID (e.g. SIG-99)", draft.episode.as_deref(), editing)?;
    draft.title = prompt_field("TRANSMISSION TITLE", draft.title.as_deref(), editing)?;
    draft.duration = prompt_field("DURATION (MM:SS)", draft.duration.as_deref(), editing)?;
    Ok(draft)
}

fn moment_form(mut draft: MomentDraft) -> Result<MomentDraft> {
    let editing = draft.id.is_some();
    let media = prompt_field("MEDIA (file path or URL)", draft.image.as_deref(), editing)?;
    if let Some(media) = media.filter(|m| !m.is_empty()) {
        let path = Path::new(&media);
        if !media.starts_with("data:") && path.is_file() {
            let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            let mime = guess_mime(path);
            draft.media_type = Some(store::media_type_for_mime(mime));
            draft.image = Some(encode_data_uri(mime, &bytes));
            println!("Embedded {} bytes ({mime})", bytes.len());
        } else {
            draft.image = Some(media);
            let current = draft.media_type.unwrap_or_default();
            let options = if current == MediaType::Video {
                vec!["Video Feed", "Image Asset"]
            } else {
                vec!["Image Asset", "Video Feed"]
            };
            let choice = Select::new("Media type", options).prompt()?;
            draft.media_type = Some(if choice == "Video Feed" { MediaType::Video } else { MediaType::Image });
        }
    } else {
        draft.image = None;
    }

    draft.title = prompt_field("TITLE", draft.title.as_deref(), editing)?;
    draft.caption = prompt_field("CAPTION", draft.caption.as_deref(), editing)?;

    let current_tags = match &draft.tags {
        Some(TagsInput::List(list)) => Some(list.join(", ")),
        Some(TagsInput::Text(text)) => Some(text.clone()),
        None => None,
    };
    draft.tags = prompt_field("TAGS (comma separated)", current_tags.as_deref(), editing)?.map(TagsInput::Text);
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emptied_field_clears_only_when_editing() {
        assert_eq!(form_value(String::new(), true), Some(String::new()));
        assert_eq!(form_value(String::new(), false), None);
        assert_eq!(form_value("SIG-06".to_string(), false), Some("SIG-06".to_string()));
    }
}
