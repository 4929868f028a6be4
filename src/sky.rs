use crate::clock::Clock;
use crate::config::SkyConfig;
use crate::surface::{DrawingSurface, Rgb};
use crate::viewport::ViewportMetrics;
use tracing::debug;

pub const STAR_MAX_SIZE: f32 = 2.0;
pub const STAR_MAX_SPEED: f32 = 0.1;

pub const SHOOTING_MIN_LENGTH: f32 = 10.0;
pub const SHOOTING_LENGTH_RANGE: f32 = 80.0;
pub const SHOOTING_MIN_SPEED: f32 = 6.0;
pub const SHOOTING_SPEED_RANGE: f32 = 10.0;
pub const SHOOTING_MIN_SIZE: f32 = 0.1;
pub const SHOOTING_SIZE_RANGE: f32 = 1.0;
// Idle time before a shooting star fires, in ms
pub const SHOOTING_MIN_WAIT: f64 = 500.0;
pub const SHOOTING_WAIT_RANGE: f64 = 3000.0;

/// Slowly drifts left; re-enters from the right edge once it falls off.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub speed: f32,
}

impl Star {
    fn new(x: f32, y: f32, rng: &mut fastrand::Rng) -> Self {
        Self {
            x,
            y,
            size: rng.f32() * STAR_MAX_SIZE,
            speed: rng.f32() * STAR_MAX_SPEED,
        }
    }

    fn reset(&mut self, viewport: &ViewportMetrics, rng: &mut fastrand::Rng) {
        self.size = rng.f32() * STAR_MAX_SIZE;
        self.speed = rng.f32() * STAR_MAX_SPEED;
        self.x = viewport.width as f32;
        self.y = rng.f32() * viewport.content_height as f32;
    }

    fn update(&mut self, surface: &mut impl DrawingSurface, viewport: &ViewportMetrics, rng: &mut fastrand::Rng) {
        self.x -= self.speed;
        if self.x < 0.0 {
            self.reset(viewport, rng);
        } else {
            surface.fill_rect(self.x, self.y, self.size, self.size);
        }
    }
}

/// Waits for `activation_time`, then streaks down and to the left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShootingStar {
    pub x: f32,
    pub y: f32,
    pub length: f32,
    pub speed: f32,
    pub size: f32,
    pub activation_time: f64,
    pub active: bool,
}

impl ShootingStar {
    fn spawn(viewport: &ViewportMetrics, rng: &mut fastrand::Rng, now: f64) -> Self {
        Self {
            x: rng.f32() * viewport.width as f32,
            y: 0.0,
            length: rng.f32() * SHOOTING_LENGTH_RANGE + SHOOTING_MIN_LENGTH,
            speed: rng.f32() * SHOOTING_SPEED_RANGE + SHOOTING_MIN_SPEED,
            size: rng.f32() * SHOOTING_SIZE_RANGE + SHOOTING_MIN_SIZE,
            activation_time: now + rng.f64() * SHOOTING_WAIT_RANGE + SHOOTING_MIN_WAIT,
            active: false,
        }
    }

    fn update(
        &mut self,
        surface: &mut impl DrawingSurface,
        viewport: &ViewportMetrics,
        rng: &mut fastrand::Rng,
        now: f64,
    ) {
        if !self.active {
            if self.activation_time < now {
                self.active = true;
                debug!(x = self.x, speed = self.speed, "shooting star fired");
            }
            return;
        }

        self.x -= self.speed;
        self.y += self.speed;
        if self.x < 0.0 || self.y >= viewport.height as f32 {
            *self = Self::spawn(viewport, rng, now);
            debug!(next_in_ms = self.activation_time - now, "shooting star reset");
        } else {
            surface.set_line_width(self.size);
            surface.stroke_line(self.x, self.y, self.x + self.length, self.y - self.length);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Particle {
    Star(Star),
    ShootingStar(ShootingStar),
}

/// Fixed particle population over a solid background. Particles are reset in
/// place; the population never grows or shrinks after construction.
pub struct SkyField<C: Clock> {
    viewport: ViewportMetrics,
    background: Rgb,
    color: Rgb,
    particles: Vec<Particle>,
    rng: fastrand::Rng,
    clock: C,
}

impl<C: Clock> SkyField<C> {
    pub fn new(viewport: ViewportMetrics, config: &SkyConfig, mut rng: fastrand::Rng, clock: C) -> Self {
        let star_count = viewport.height;
        let mut particles = Vec::with_capacity(star_count + config.shooting_stars);

        let (w, h) = (viewport.width as f32, viewport.height as f32);
        for _ in 0..star_count {
            let (x, y) = (rng.f32() * w, rng.f32() * h);
            particles.push(Particle::Star(Star::new(x, y, &mut rng)));
        }

        let now = clock.now_ms();
        for _ in 0..config.shooting_stars {
            particles.push(Particle::ShootingStar(ShootingStar::spawn(&viewport, &mut rng, now)));
        }

        Self {
            viewport,
            background: config.background,
            color: config.star_color,
            particles,
            rng,
            clock,
        }
    }

    pub fn viewport(&self) -> &ViewportMetrics {
        &self.viewport
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn stars(&self) -> impl Iterator<Item = &Star> {
        self.particles.iter().filter_map(|p| match p {
            Particle::Star(star) => Some(star),
            Particle::ShootingStar(_) => None,
        })
    }

    pub fn shooting_stars(&self) -> impl Iterator<Item = &ShootingStar> {
        self.particles.iter().filter_map(|p| match p {
            Particle::ShootingStar(shooting) => Some(shooting),
            Particle::Star(_) => None,
        })
    }

    pub fn paint_background(&self, surface: &mut impl DrawingSurface) {
        surface.set_fill_color(self.background);
        surface.fill_rect(0.0, 0.0, self.viewport.width as f32, self.viewport.height as f32);
    }

    /// One animation frame: repaint the background, move every particle and
    /// draw the ones still on screen.
    pub fn advance(&mut self, surface: &mut impl DrawingSurface) {
        self.paint_background(surface);
        surface.set_fill_color(self.color);
        surface.set_stroke_color(self.color);

        let now = self.clock.now_ms();
        let viewport = self.viewport;
        for particle in &mut self.particles {
            match particle {
                Particle::Star(star) => star.update(surface, &viewport, &mut self.rng),
                Particle::ShootingStar(shooting) => shooting.update(surface, &viewport, &mut self.rng, now),
            }
        }
    }
}
