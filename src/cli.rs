use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input, Select};

use crate::config::{self, Config};
use crate::core::albums;
use crate::core::progress::StdoutSink;
use crate::core::{export, CancelToken};
use crate::models::{AlbumFilter, ExportRequest};

#[derive(Parser)]
#[command(
    name = "ximaexport",
    version,
    about = "Export downloaded Ximalaya audio into per-album folders"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Launch the GUI
    #[arg(long)]
    pub gui: bool,

    /// Database to preload in the GUI
    #[arg(value_name = "DBFILE")]
    pub database: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export downloaded audio
    Export {
        /// Path to the app's "ting.sqlite" database
        dbfile: PathBuf,
        /// Folder to save exported files in
        outdir: PathBuf,
        /// Export only this album (all albums if omitted)
        #[arg(short, long)]
        album: Option<String>,
        /// Pick the album from a list
        #[arg(long, conflicts_with = "album")]
        choose: bool,
        /// Only print errors and the summary
        #[arg(short, long)]
        quiet: bool,
        /// Do not write tags into exported files
        #[arg(long)]
        no_tags: bool,
    },
    /// List the albums in a database
    Albums {
        /// Path to the app's "ting.sqlite" database
        dbfile: PathBuf,
    },
    /// Edit export settings
    Config,
}

/// Runs the parsed command line and returns the process exit code.
pub fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Some(Commands::Export {
            dbfile,
            outdir,
            album,
            choose,
            quiet,
            no_tags,
        }) => cmd_export(&dbfile, &outdir, album, choose, quiet, no_tags),
        Some(Commands::Albums { dbfile }) => cmd_albums(&dbfile).map(|_| 0),
        Some(Commands::Config) => cmd_config().map(|_| 0),
        None => {
            if cli.gui {
                #[cfg(feature = "gui")]
                {
                    crate::gui::launch(cli.database);
                    Ok(0)
                }
                #[cfg(not(feature = "gui"))]
                {
                    anyhow::bail!("built without GUI support; rebuild with: cargo build --features gui");
                }
            } else {
                println!("usage: ximaexport <COMMAND> or ximaexport --gui");
                println!("run ximaexport --help for details.");
                Ok(0)
            }
        }
    }
}

fn cmd_export(
    dbfile: &Path,
    outdir: &Path,
    album: Option<String>,
    choose: bool,
    quiet: bool,
    no_tags: bool,
) -> Result<i32> {
    let mut cfg = config::load_config();
    if no_tags {
        cfg.export.write_tags = false;
    }

    let database = std::path::absolute(dbfile)
        .with_context(|| format!("invalid database path {}", dbfile.display()))?;
    let output_dir = std::path::absolute(outdir)
        .with_context(|| format!("invalid output path {}", outdir.display()))?;

    let album = if choose { choose_album(&database)? } else { album };

    let request = ExportRequest {
        database,
        output_dir,
        album: AlbumFilter::from(album),
        verbose: !quiet,
    };

    export::run_configured(&request, &cfg, &CancelToken::new(), &mut StdoutSink)
}

/// Asks for one album; `None` means all of them.
fn choose_album(database: &Path) -> Result<Option<String>> {
    let summaries = albums::album_summaries(database)?;

    let mut items = vec!["All albums".to_string()];
    items.extend(
        summaries
            .iter()
            .map(|s| format!("{} ({} tracks)", s.album_name, s.tracks)),
    );

    let selection = Select::new()
        .with_prompt("Album to export")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(selection
        .checked_sub(1)
        .and_then(|i| summaries.get(i))
        .map(|s| s.album_name.clone()))
}

fn cmd_albums(dbfile: &Path) -> Result<()> {
    let summaries = albums::album_summaries(dbfile)?;

    if summaries.is_empty() {
        println!("no albums in {}", dbfile.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Album", "Tracks", "Downloaded", "Length"]);

    for s in &summaries {
        table.add_row(vec![
            Cell::new(s.album_id),
            Cell::new(&s.album_name),
            Cell::new(s.tracks),
            Cell::new(s.complete),
            Cell::new(format_duration(s.duration)),
        ]);
    }

    println!("{table}");
    println!(
        "\n{} albums, {} tracks ({} fully downloaded)",
        summaries.len(),
        summaries.iter().map(|s| s.tracks).sum::<usize>(),
        summaries.iter().map(|s| s.complete).sum::<usize>(),
    );

    Ok(())
}

/// `h:mm:ss` for album lengths.
fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}:{:02}", total / 3600, total / 60 % 60, total % 60)
}

fn cmd_config() -> Result<()> {
    let current = config::load_config();

    println!("ximaexport settings\n");

    let comment: String = Input::new()
        .with_prompt("Tag comment")
        .with_initial_text(current.export.comment.clone())
        .allow_empty(true)
        .interact_text()?;

    let write_tags = Confirm::new()
        .with_prompt("Write tags into exported files?")
        .default(current.export.write_tags)
        .interact()?;

    let user_agent: String = Input::new()
        .with_prompt("HTTP User-Agent")
        .with_initial_text(current.http.user_agent.clone())
        .interact_text()?;

    let timeout_secs: u64 = Input::new()
        .with_prompt("HTTP timeout (seconds)")
        .with_initial_text(current.http.timeout_secs.to_string())
        .interact_text()?;

    let mut cfg = Config::default();
    cfg.export.comment = comment;
    cfg.export.write_tags = write_tags;
    cfg.http.user_agent = user_agent;
    cfg.http.timeout_secs = timeout_secs;

    config::save_config(&cfg)?;
    println!("\nsettings saved.");
    Ok(())
}
