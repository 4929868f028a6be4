use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nightsky::clock::SystemClock;
use nightsky::config::{parse_hex_color, SkyConfig};
use nightsky::surface::Rgb;
use nightsky::term::{TerminalPresenter, TerminalScheduler};
use nightsky::viewport::ViewportMetrics;
use nightsky::{CancelToken, Session};

/// Night sky for the terminal: drifting stars, shooting stars and a fractal
/// ridge line. Press 'q', ESC, or Ctrl+C to exit.
#[derive(Parser, Debug)]
#[command(name = "nightsky", version)]
struct Cli {
    /// Sky color as hex (e.g. 05004c)
    #[arg(long, value_parser = parse_hex_color)]
    bg_color: Option<Rgb>,

    /// Star and shooting star color as hex
    #[arg(long, value_parser = parse_hex_color)]
    star_color: Option<Rgb>,

    /// Ridge silhouette color as hex
    #[arg(long, value_parser = parse_hex_color)]
    terrain_color: Option<Rgb>,

    /// Largest ridge perturbation in pixels
    #[arg(long)]
    displacement: Option<f32>,

    /// Displacement multiplier per halving level, in (0, 1]
    #[arg(long)]
    roughness: Option<f32>,

    #[arg(long)]
    shooting_stars: Option<usize>,

    #[arg(long)]
    fps: Option<u32>,

    /// Seed for a reproducible sky
    #[arg(long)]
    seed: Option<u64>,

    /// Logical pixels per terminal cell
    #[arg(long)]
    pixels_per_cell: Option<usize>,

    /// Logical sky width in pixels (defaults to the terminal width)
    #[arg(long)]
    width: Option<usize>,

    /// Content height in pixels; values outside 900..=1100 become 900
    #[arg(long)]
    height: Option<usize>,

    /// Exit after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Write logs here (RUST_LOG filters, default info)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> Result<SkyConfig> {
        let mut config = SkyConfig::default();
        if let Some(color) = self.bg_color {
            config.background = color;
        }
        if let Some(color) = self.star_color {
            config.star_color = color;
        }
        if let Some(color) = self.terrain_color {
            config.terrain_color = color;
        }
        if let Some(displacement) = self.displacement {
            config.terrain.initial_displacement = displacement;
        }
        if let Some(roughness) = self.roughness {
            config.terrain.roughness = roughness;
        }
        if let Some(count) = self.shooting_stars {
            config.shooting_stars = count;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(ppc) = self.pixels_per_cell {
            config.pixels_per_cell = ppc;
        }
        config.seed = self.seed;

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(path: Option<&Path>) -> Result<()> {
    // The alternate screen owns the terminal, so logs only go to a file
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Raw mode and the alternate screen for as long as it lives. Dropping it
/// restores the terminal, whichever way `run` returns.
struct TerminalGuard<W: Write> {
    out: W,
}

impl<W: Write> TerminalGuard<W> {
    fn enter(out: W) -> Result<Self> {
        terminal::enable_raw_mode()?;
        // Built before the escapes so a failed write still leaves raw mode
        let mut guard = Self { out };
        execute!(guard.out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(guard)
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        let _ = execute!(self.out, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn run(cli: &Cli, config: &SkyConfig) -> Result<()> {
    let (cols, rows) = terminal::size().context("reading terminal size")?;
    let columns = cols.max(1) as usize;
    let pixel_rows = rows.max(1) as usize * 2;

    let width = cli.width.unwrap_or(columns * config.pixels_per_cell);
    let content_height = cli.height.unwrap_or(pixel_rows * config.pixels_per_cell);
    let viewport = ViewportMetrics::new(width, content_height);

    // Build everything before touching terminal modes so setup errors print normally
    let mut session = Session::start(viewport, config, columns, pixel_rows, SystemClock)
        .context("starting sky session")?;

    let token = CancelToken::new();
    let mut scheduler = TerminalScheduler::new(config.fps, token.clone());
    let mut presenter = TerminalPresenter::new(BufWriter::with_capacity(1024 * 64, stdout()));

    let guard = TerminalGuard::enter(stdout())?;
    let result = session.run(&mut scheduler, &mut presenter, &token, cli.frames);
    drop(guard);

    let rendered = result.context("rendering sky")?;
    info!(rendered, "sky session finished");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;
    let config = cli.config()?;
    run(&cli, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightsky::config::DEFAULT_STAR_COLOR;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "nightsky",
            "--bg-color",
            "#1a1b26",
            "--roughness",
            "0.5",
            "--shooting-stars",
            "4",
            "--seed",
            "99",
        ]);
        let config = cli.config().unwrap();

        assert_eq!(config.background, (0x1a, 0x1b, 0x26));
        assert_eq!(config.terrain.roughness, 0.5);
        assert_eq!(config.terrain.initial_displacement, 140.0);
        assert_eq!(config.shooting_stars, 4);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.star_color, DEFAULT_STAR_COLOR);
    }

    #[test]
    fn bad_color_is_a_parse_error() {
        assert!(Cli::try_parse_from(["nightsky", "--bg-color", "purple"]).is_err());
    }

    #[test]
    fn invalid_values_fail_config() {
        let cli = Cli::parse_from(["nightsky", "--fps", "0"]);
        assert!(cli.config().is_err());
    }

    #[test]
    fn guard_restores_terminal_on_error() {
        fn failing_session(out: &mut Vec<u8>) -> Result<()> {
            let _guard = TerminalGuard { out };
            anyhow::bail!("presenter failed")
        }

        let mut out = Vec::new();
        assert!(failing_session(&mut out).is_err());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\x1b[?25h"), "cursor shown: {text:?}");
        assert!(text.contains("\x1b[?1049l"), "alternate screen left: {text:?}");
    }
}
