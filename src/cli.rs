//! Command-line host for the settings panels
//!
//! Each command mounts one panel per domain, waits for it to become ready,
//! then reads or edits it the way an admin screen would.

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::debug;

use crate::notify::{Notice, NoticeFeed, NoticeLevel};
use crate::panel::{PanelView, SettingsPanel};
use crate::settings::{CanonicalRecord, SchemaMapper, SettingsContext, SettingsDomain};

#[derive(Debug, Parser)]
#[command(name = "admin-settings", version, about = "View and edit restaurant admin settings")]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use a throwaway in-memory store
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load and print settings
    Show(ShowArgs),
    /// Edit fields and save
    Set(SetArgs),
    /// Flip an on/off field and save
    Toggle(ToggleArgs),
    /// List the known fields and their defaults
    Fields(FieldsArgs),
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Domains to show (all when omitted)
    pub domains: Vec<SettingsDomain>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    pub domain: SettingsDomain,

    /// Edits as KEY=VALUE
    #[arg(required = true, value_parser = parse_assignment)]
    pub assignments: Vec<(String, String)>,

    /// Apply the edits without saving them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ToggleArgs {
    pub domain: SettingsDomain,
    pub key: String,

    /// Apply the toggle without saving it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct FieldsArgs {
    pub domain: Option<SettingsDomain>,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn run(command: Command, context: &SettingsContext) -> Result<()> {
    match command {
        Command::Show(args) => show(args, context).await,
        Command::Set(args) => set(args, context).await,
        Command::Toggle(args) => toggle(args, context).await,
        Command::Fields(args) => {
            fields(args);
            Ok(())
        }
    }
}

async fn show(args: ShowArgs, context: &SettingsContext) -> Result<()> {
    let domains = if args.domains.is_empty() {
        SettingsDomain::ALL.to_vec()
    } else {
        args.domains
    };

    let mut records = Vec::with_capacity(domains.len());
    for domain in domains {
        let panel = open_panel(context, domain).await?;
        records.push(ready_record(&panel)?);
    }

    if args.json {
        let mut json = Map::new();
        for record in &records {
            json.insert(record.domain().to_string(), serde_json::to_value(record)?);
        }
        println!("{}", serde_json::to_string_pretty(&Value::Object(json))?);
    } else {
        for record in &records {
            print_record(record);
        }
    }
    Ok(())
}

async fn set(args: SetArgs, context: &SettingsContext) -> Result<()> {
    let panel = open_panel(context, args.domain).await?;
    for (key, value) in &args.assignments {
        panel.edit(key, value)?;
    }
    finish_edit(&panel, args.dry_run).await
}

async fn toggle(args: ToggleArgs, context: &SettingsContext) -> Result<()> {
    let panel = open_panel(context, args.domain).await?;
    panel.toggle(&args.key)?;
    finish_edit(&panel, args.dry_run).await
}

async fn finish_edit(panel: &SettingsPanel, dry_run: bool) -> Result<()> {
    if dry_run {
        debug!(domain = %panel.domain(), "Dry run, not saving");
    } else {
        panel.save().await?;
    }
    print_record(&ready_record(panel)?);
    Ok(())
}

fn fields(args: FieldsArgs) {
    let domains = match args.domain {
        Some(domain) => vec![domain],
        None => SettingsDomain::ALL.to_vec(),
    };
    for domain in domains {
        println!("{} Settings ({domain})", domain.title());
        for spec in SchemaMapper::fields(domain) {
            println!(
                "  {:<20} {:<8} default={:<6} stored as '{}'",
                spec.key,
                spec.kind(),
                spec.default.to_value(),
                spec.external
            );
            println!("      {}: {}", spec.label, spec.description);
        }
        println!();
    }
}

/// Mount a panel and wait until it is ready or has failed
async fn open_panel(context: &SettingsContext, domain: SettingsDomain) -> Result<SettingsPanel> {
    let panel = SettingsPanel::mount(context, domain);
    if let Some(handle) = panel.activate() {
        handle.await.context("Settings load task failed")?;
    }
    match panel.view() {
        PanelView::Ready(_) => Ok(panel),
        PanelView::Failed(message) => Err(anyhow!(message)),
        other => Err(anyhow!("{domain} settings did not finish loading ({other:?})")),
    }
}

fn ready_record(panel: &SettingsPanel) -> Result<CanonicalRecord> {
    panel
        .record()
        .ok_or_else(|| anyhow!("{} settings are not loaded", panel.domain()))
}

fn print_record(record: &CanonicalRecord) {
    println!("{} Settings", record.domain().title());
    for spec in SchemaMapper::fields(record.domain()) {
        if let Some(value) = record.get(spec.key) {
            println!("  {:<36} {:<8} ({})", spec.label, value, spec.key);
        }
    }
    println!();
}

/// Print notices until every notifier is gone; returns how many were printed
pub async fn print_notices(feed: &mut NoticeFeed) -> usize {
    let mut printed = 0;
    while let Some(notice) = feed.recv().await {
        print_notice(&notice);
        printed += 1;
    }
    printed
}

fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Success => println!("✓ {}", notice.message),
        NoticeLevel::Info => println!("• {}", notice.message),
        NoticeLevel::Error => eprintln!("✗ {}", notice.message),
    }
}
