//! CLI entry point for keymap-weaver
//!
//! Provides commands for inspecting keymap sources, rendering key
//! meanings, and editing keys or layers in place.

use anyhow::{anyhow, bail};
use clap::{Parser, Subcommand};
use colored::*;
use keymap_weaver::config::{KeymapFile, KeymapTransaction};
use keymap_weaver::core::{
    evaluate,
    keycodes::KeymapExecutor,
    parser::{find_invocation, parse},
    patcher::{add_layer, set_key_checked},
    settings::{find_settings_block, parse_settings, Settings},
    ParseError, SemanticResult,
};
use keymap_weaver::logging::{init_logging, LoggingConfig};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "keymap-weaver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a keymap and list its layers
    Parse {
        /// Path to the keymap source
        keymap: PathBuf,

        /// Number of keys the keyboard has
        #[arg(long)]
        keys: Option<usize>,

        /// Print the syntax tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the settings block as JSON
    Settings {
        /// Path to the keymap source
        keymap: PathBuf,
    },

    /// Show what each key of a layer does
    Render {
        /// Path to the keymap source
        keymap: PathBuf,

        /// Layer index
        #[arg(short, long, default_value_t = 0)]
        layer: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace a single key
    SetKey {
        /// Path to the keymap source
        keymap: PathBuf,

        /// Layer index
        #[arg(short, long)]
        layer: usize,

        /// Key index within the layer
        #[arg(short, long)]
        key: usize,

        /// New key expression, e.g. "LT(1, KC_SPC)"
        value: String,

        /// Number of keys the keyboard has
        #[arg(long)]
        keys: Option<usize>,

        /// Write the result back to the file (a backup is kept)
        #[arg(short, long)]
        write: bool,
    },

    /// Append a layer of transparent keys
    AddLayer {
        /// Path to the keymap source
        keymap: PathBuf,

        /// Invocation keyword for the new layer (defaults to the first one used)
        #[arg(long)]
        keyword: Option<String>,

        /// Write the result back to the file (a backup is kept)
        #[arg(short, long)]
        write: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        default_level: if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        },
        ..LoggingConfig::default()
    });

    match cli.command {
        Commands::Parse { keymap, keys, json } => parse_keymap(&keymap, keys, json)?,
        Commands::Settings { keymap } => show_settings(&keymap)?,
        Commands::Render { keymap, layer, json } => render_layer(&keymap, layer, json)?,
        Commands::SetKey {
            keymap,
            layer,
            key,
            value,
            keys,
            write,
        } => edit_key(&keymap, layer, key, &value, keys, write)?,
        Commands::AddLayer {
            keymap,
            keyword,
            write,
        } => append_layer(&keymap, keyword, write)?,
    }

    Ok(())
}

/// Expand tilde and read the keymap source
fn read_keymap(keymap_path: &Path) -> anyhow::Result<(PathBuf, String)> {
    let expanded_path = shellexpand::tilde(
        keymap_path
            .to_str()
            .ok_or_else(|| anyhow!("Invalid path encoding"))?,
    );
    let path = PathBuf::from(expanded_path.as_ref());

    let content = fs::read_to_string(&path)
        .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;

    Ok((path, content))
}

/// Parse, printing the offending line with a caret on failure
fn parse_or_report(
    path: &Path,
    content: &str,
    keys: Option<usize>,
) -> anyhow::Result<keymap_weaver::ParseResult> {
    parse(content, keys).map_err(|e| {
        report_parse_error(path, content, &e);
        anyhow!(e)
    })
}

fn report_parse_error(path: &Path, content: &str, error: &ParseError) {
    eprintln!("{} {}: {}", "✗".red().bold(), path.display(), error);

    let Some(offset) = error.offset() else {
        return;
    };
    let offset = offset.min(content.len());
    let line_start = content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = content[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(content.len());
    let line_number = content[..offset].matches('\n').count() + 1;
    let column = content[line_start..offset].chars().count();

    eprintln!("{:>5} | {}", line_number, &content[line_start..line_end]);
    eprintln!("{:>5} | {}{}", "", " ".repeat(column), "^".red().bold());
}

fn parse_keymap(keymap_path: &Path, keys: Option<usize>, json: bool) -> anyhow::Result<()> {
    let (path, content) = read_keymap(keymap_path)?;
    let keymap = parse_or_report(&path, &content, keys)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&keymap)?);
        return Ok(());
    }

    println!(
        "{} {} layer(s) × {} key(s) using {}\n",
        "✓".green(),
        keymap.layers.len(),
        keymap.key_count(),
        keymap.invocation_keyword.bold()
    );

    for (index, layer) in keymap.layers.iter().enumerate() {
        println!("{}", format!("Layer {}", index).yellow().bold());
        for (key, node) in layer.iter().enumerate() {
            println!("  {} {}", format!("{:>3}.", key).dimmed(), node.to_string().cyan());
        }
        println!();
    }

    if !keymap.settings.is_empty() {
        println!("{} settings entries: {}", "→".cyan(), keymap.settings.len());
    }

    Ok(())
}

fn show_settings(keymap_path: &Path) -> anyhow::Result<()> {
    let (_, content) = read_keymap(keymap_path)?;

    // Read the block directly so errors surface instead of being ignored
    let preamble_end = find_invocation(&content, 0)
        .map(|inv| inv.start)
        .unwrap_or(content.len());
    let settings = match find_settings_block(&content[..preamble_end]) {
        Some(block) => parse_settings(block)?,
        None => Settings::default(),
    };

    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn render_layer(keymap_path: &Path, layer: usize, json: bool) -> anyhow::Result<()> {
    let (path, content) = read_keymap(keymap_path)?;
    let keymap = parse_or_report(&path, &content, None)?;

    let keys = keymap
        .layers
        .get(layer)
        .ok_or_else(|| anyhow!("Layer {} does not exist ({} layers)", layer, keymap.layers.len()))?;

    let executor = KeymapExecutor::new();
    let results: Vec<Option<SemanticResult>> =
        keys.iter().map(|node| evaluate(node, &executor)).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("{}", format!("Layer {} of {}\n", layer, path.display()).bold());

    for (index, (node, result)) in keys.iter().zip(&results).enumerate() {
        let meaning = match result {
            None => "(no meaning)".dimmed().to_string(),
            Some(SemanticResult::Error { message }) => message.red().to_string(),
            Some(SemanticResult::Keycode(keycode)) => keycode.clone(),
            Some(other) => {
                let rendered = other.rendered().cloned().unwrap_or_default();
                let center = rendered.center.unwrap_or_default();
                match rendered.bottom_center {
                    Some(bottom) => format!("{} / {}", center.green(), bottom.magenta()),
                    None => center.green().to_string(),
                }
            }
        };

        println!(
            "  {} {} → {}",
            format!("{:>3}.", index).dimmed(),
            node.to_string().cyan(),
            meaning
        );
    }

    Ok(())
}

fn edit_key(
    keymap_path: &Path,
    layer: usize,
    key: usize,
    value: &str,
    keys: Option<usize>,
    write: bool,
) -> anyhow::Result<()> {
    let (path, content) = read_keymap(keymap_path)?;

    let patched = set_key_checked(&content, layer, key, value, keys);
    if !patched.changed {
        // Surface the reason: either a parse error or a bad index
        parse_or_report(&path, &content, keys)?;
        bail!("No key {} on layer {}", key, layer);
    }

    if let Some(e) = &patched.validation {
        eprintln!("{} Edit leaves the keymap invalid: {}", "⚠".yellow(), e);
    }

    if write {
        let file = KeymapFile::new(path)?;
        let tx = KeymapTransaction::begin(&file)?;
        tx.commit_with_validation(&patched.text)?;
        println!("{} Updated {}", "✓".green(), file.path().display());
    } else {
        print!("{}", patched.text);
    }

    Ok(())
}

fn append_layer(keymap_path: &Path, keyword: Option<String>, write: bool) -> anyhow::Result<()> {
    let (path, content) = read_keymap(keymap_path)?;
    let keymap = parse_or_report(&path, &content, None)?;

    let keyword = keyword.unwrap_or(keymap.invocation_keyword);
    let edited = add_layer(&content, &keyword);

    if write {
        let file = KeymapFile::new(path)?;
        let tx = KeymapTransaction::begin(&file)?;
        tx.commit_with_validation(&edited)?;
        println!(
            "{} Added layer {} to {}",
            "✓".green(),
            keymap.layers.len(),
            file.path().display()
        );
    } else {
        print!("{}", edited);
    }

    Ok(())
}
