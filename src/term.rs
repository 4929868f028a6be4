use crate::compositor::{CancelToken, FixedRateScheduler, FrameScheduler, Presenter};
use crate::error::Result;
use crate::surface::{Canvas, Rgb};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use std::io::Write;
use std::time::Instant;
use tracing::debug;

/// Draws frames with upper-half blocks: two canvas rows per terminal row, the
/// top one as background color and the bottom one as foreground.
pub struct TerminalPresenter<W: Write> {
    out: W,
    output_buf: Vec<u8>,
    size: (usize, usize),
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            output_buf: Vec::new(),
            size: (0, 0),
        }
    }

    /// Writes `frame` scaled (nearest neighbour) to `cols x rows` cells.
    pub fn draw(&mut self, frame: &Canvas, cols: usize, rows: usize) -> Result<()> {
        self.output_buf.clear();
        if self.size != (cols, rows) {
            if self.size != (0, 0) {
                debug!(cols, rows, "terminal resized");
            }
            self.size = (cols, rows);
            self.output_buf.extend_from_slice(b"\x1b[2J");
        }
        self.output_buf.extend_from_slice(b"\x1b[H"); // Move to home

        let height = rows * 2;
        let sample = |x: usize, y: usize| -> Rgb {
            let column = x * frame.columns() / cols.max(1);
            let row = y * frame.rows() / height.max(1);
            frame.rgb_at(column, row)
        };

        // None after every reset so the first cell of a row always sets its colors
        let mut prev_top: Option<Rgb> = None;
        let mut prev_bot: Option<Rgb> = None;

        for y in (0..height).step_by(2) {
            for x in 0..cols {
                let top = sample(x, y);
                let bot = sample(x, y + 1);

                // Only emit color codes if changed
                if prev_top != Some(top) {
                    write!(self.output_buf, "\x1b[48;2;{};{};{}m", top.0, top.1, top.2)?;
                    prev_top = Some(top);
                }
                if prev_bot != Some(bot) {
                    write!(self.output_buf, "\x1b[38;2;{};{};{}m", bot.0, bot.1, bot.2)?;
                    prev_bot = Some(bot);
                }
                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top = None;
            prev_bot = None;
            if y + 2 < height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        self.out.write_all(&self.output_buf)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn present(&mut self, frame: &Canvas) -> Result<()> {
        let (cols, rows) = terminal::size()?;
        self.draw(frame, cols.max(1) as usize, rows.max(1) as usize)
    }
}

/// Fixed-rate pacing that watches the keyboard while it waits, cancelling the
/// session on an exit key.
pub struct TerminalScheduler {
    pacer: FixedRateScheduler,
    token: CancelToken,
}

impl TerminalScheduler {
    pub fn new(fps: u32, token: CancelToken) -> Self {
        Self {
            pacer: FixedRateScheduler::new(fps),
            token,
        }
    }
}

impl FrameScheduler for TerminalScheduler {
    fn wait_for_frame(&mut self) -> Result<()> {
        let deadline = self.pacer.next_deadline();
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if !event::poll(timeout)? {
                return Ok(());
            }
            if is_exit(&event::read()?) {
                self.token.cancel();
                return Ok(());
            }
        }
    }
}

pub fn is_exit(event: &Event) -> bool {
    match event {
        Event::Key(key) => {
            key.code == KeyCode::Char('q')
                || key.code == KeyCode::Esc
                || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        }
        _ => false,
    }
}
