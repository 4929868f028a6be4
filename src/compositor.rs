use crate::clock::Clock;
use crate::config::SkyConfig;
use crate::error::Result;
use crate::sky::SkyField;
use crate::surface::Canvas;
use crate::terrain::HeightProfile;
use crate::viewport::ViewportMetrics;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

/// Shared stop flag; the frame loop checks it before every frame.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Blocks until the next frame is due.
pub trait FrameScheduler {
    fn wait_for_frame(&mut self) -> Result<()>;
}

pub trait Presenter {
    fn present(&mut self, frame: &Canvas) -> Result<()>;
}

/// Paces frames at a fixed rate. When a frame runs late the schedule restarts
/// from now instead of bursting to catch up.
pub struct FixedRateScheduler {
    interval: Duration,
    deadline: Option<Instant>,
}

impl FixedRateScheduler {
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_deadline(&mut self) -> Instant {
        let now = Instant::now();
        let next = match self.deadline {
            Some(previous) => (previous + self.interval).max(now),
            None => now,
        };
        self.deadline = Some(next);
        next
    }
}

impl FrameScheduler for FixedRateScheduler {
    fn wait_for_frame(&mut self) -> Result<()> {
        let deadline = self.next_deadline();
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Running,
}

/// One mount-to-teardown lifetime of the background: a terrain layer drawn
/// once, and a sky layer redrawn every frame beneath it.
pub struct Session<C: Clock> {
    state: SessionState,
    terrain: Canvas,
    sky: Canvas,
    field: SkyField<C>,
    frames: u64,
}

impl<C: Clock> Session<C> {
    /// Builds both layers at `columns x rows` device pixels. Fails if either
    /// surface cannot be created.
    pub fn start(viewport: ViewportMetrics, config: &SkyConfig, columns: usize, rows: usize, clock: C) -> Result<Self> {
        let state = SessionState::Initializing;
        info!(?state, width = viewport.width, height = viewport.height, columns, rows, "starting sky session");

        let mut terrain = Canvas::new(viewport.width, viewport.height, columns, rows)?;
        let mut sky = Canvas::new(viewport.width, viewport.height, columns, rows)?;

        let mut rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        let profile = HeightProfile::generate(viewport.width, viewport.height, config.terrain, &mut rng);
        profile.rasterize(&mut terrain, config.terrain_color);

        let field = SkyField::new(viewport, config, rng, clock);
        field.paint_background(&mut sky);

        let state = SessionState::Running;
        info!(?state, particles = field.len(), terrain_power = profile.power(), "sky session running");

        Ok(Self {
            state,
            terrain,
            sky,
            field,
            frames: 0,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn field(&self) -> &SkyField<C> {
        &self.field
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advances the sky one step and lays the terrain over it.
    pub fn frame(&mut self) -> Result<&Canvas> {
        self.field.advance(&mut self.sky);
        self.sky.draw_layer(&self.terrain)?;
        self.frames += 1;
        Ok(&self.sky)
    }

    /// Renders frames until `token` is cancelled or `frame_limit` frames have
    /// been shown. Returns the number of frames rendered by this call.
    pub fn run(
        &mut self,
        scheduler: &mut impl FrameScheduler,
        presenter: &mut impl Presenter,
        token: &CancelToken,
        frame_limit: Option<u64>,
    ) -> Result<u64> {
        let mut rendered = 0;
        loop {
            if token.is_cancelled() {
                info!(rendered, "sky session cancelled");
                break;
            }
            if frame_limit.is_some_and(|limit| rendered >= limit) {
                info!(rendered, "frame limit reached");
                break;
            }

            scheduler.wait_for_frame()?;
            let frame = self.frame()?;
            presenter.present(frame)?;
            rendered += 1;
        }
        Ok(rendered)
    }
}
