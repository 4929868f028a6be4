use crate::error::{Result, SkyError};

pub type Rgb = (u8, u8, u8);

// Vertical subsamples per device row when filling polygons
const POLYGON_SUBSAMPLES: usize = 4;

/// The drawing capabilities the sky and terrain need, in logical pixels.
pub trait DrawingSurface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn clear(&mut self);
    fn set_fill_color(&mut self, color: Rgb);
    fn set_stroke_color(&mut self, color: Rgb);
    fn set_line_width(&mut self, width: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32);
    fn fill_polygon(&mut self, points: &[(f32, f32)]);
}

/// RGBA raster of `columns x rows` device pixels addressed in logical
/// `width x height` coordinates. Colors are stored premultiplied by alpha.
///
/// Shapes thinner than a device pixel are splatted onto a one-pixel footprint
/// with their brightness scaled by their logical size, so a 1px star stays
/// visible however far the logical viewport is scaled down.
pub struct Canvas {
    width: usize,
    height: usize,
    columns: usize,
    rows: usize,
    scale_x: f32,
    scale_y: f32,
    fill: Rgb,
    stroke: Rgb,
    line_width: f32,
    pixels: Vec<[f32; 4]>,
}

impl Canvas {
    pub fn new(width: usize, height: usize, columns: usize, rows: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SkyError::InvalidSurface { width, height });
        }
        if columns == 0 || rows == 0 {
            return Err(SkyError::InvalidSurface {
                width: columns,
                height: rows,
            });
        }

        Ok(Self {
            width,
            height,
            columns,
            rows,
            scale_x: columns as f32 / width as f32,
            scale_y: rows as f32 / height as f32,
            fill: (0, 0, 0),
            stroke: (0, 0, 0),
            line_width: 1.0,
            pixels: vec![[0.0; 4]; columns * rows],
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn pixel(&self, column: usize, row: usize) -> [f32; 4] {
        self.pixels[row * self.columns + column]
    }

    pub fn alpha_at(&self, column: usize, row: usize) -> f32 {
        self.pixel(column, row)[3]
    }

    // Color as seen over black
    pub fn rgb_at(&self, column: usize, row: usize) -> Rgb {
        let p = self.pixel(column, row);
        (
            p[0].round().clamp(0.0, 255.0) as u8,
            p[1].round().clamp(0.0, 255.0) as u8,
            p[2].round().clamp(0.0, 255.0) as u8,
        )
    }

    /// Blends `layer` over this canvas. Both must share the same raster size.
    pub fn draw_layer(&mut self, layer: &Canvas) -> Result<()> {
        if layer.columns != self.columns || layer.rows != self.rows {
            return Err(SkyError::InvalidConfig(format!(
                "layer is {}x{} device pixels, target is {}x{}",
                layer.columns, layer.rows, self.columns, self.rows
            )));
        }

        for (dst, src) in self.pixels.iter_mut().zip(&layer.pixels) {
            let keep = 1.0 - src[3];
            if keep >= 1.0 {
                continue;
            }
            for c in 0..4 {
                dst[c] = src[c] + dst[c] * keep;
            }
        }
        Ok(())
    }

    #[inline]
    fn blend(&mut self, column: usize, row: usize, color: Rgb, coverage: f32) {
        let a = coverage.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let keep = 1.0 - a;
        let p = &mut self.pixels[row * self.columns + column];
        p[0] = color.0 as f32 * a + p[0] * keep;
        p[1] = color.1 as f32 * a + p[1] * keep;
        p[2] = color.2 as f32 * a + p[2] * keep;
        p[3] = a + p[3] * keep;
    }

    // Widens [lo, hi) to at least one device pixel around its center
    fn footprint(lo: f32, hi: f32) -> (f32, f32) {
        if hi - lo >= 1.0 {
            (lo, hi)
        } else {
            let mid = (lo + hi) * 0.5;
            (mid - 0.5, mid + 0.5)
        }
    }

    fn column_range(&self, lo: f32, hi: f32) -> std::ops::Range<usize> {
        let start = lo.floor().max(0.0) as usize;
        let end = (hi.ceil().max(0.0) as usize).min(self.columns);
        start..end
    }

    fn row_range(&self, lo: f32, hi: f32) -> std::ops::Range<usize> {
        let start = lo.floor().max(0.0) as usize;
        let end = (hi.ceil().max(0.0) as usize).min(self.rows);
        start..end
    }
}

fn overlap(lo: f32, hi: f32, cell: usize) -> f32 {
    let c0 = cell as f32;
    (hi.min(c0 + 1.0) - lo.max(c0)).max(0.0)
}

impl DrawingSurface for Canvas {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self) {
        self.pixels.fill([0.0; 4]);
    }

    fn set_fill_color(&mut self, color: Rgb) {
        self.fill = color;
    }

    fn set_stroke_color(&mut self, color: Rgb) {
        self.stroke = color;
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width.max(0.0);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        if !(w > 0.0 && h > 0.0) {
            return;
        }

        // Dimmed by logical area only when the footprint had to grow it
        let widened = w * self.scale_x < 1.0 || h * self.scale_y < 1.0;
        let intensity = if widened { (w * h).min(1.0) } else { 1.0 };
        let (x0, x1) = Self::footprint(x * self.scale_x, (x + w) * self.scale_x);
        let (y0, y1) = Self::footprint(y * self.scale_y, (y + h) * self.scale_y);
        let color = self.fill;

        for row in self.row_range(y0, y1) {
            let oy = overlap(y0, y1, row);
            for column in self.column_range(x0, x1) {
                let ox = overlap(x0, x1, column);
                self.blend(column, row, color, ox * oy * intensity);
            }
        }
    }

    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        if self.line_width <= 0.0 {
            return;
        }

        let (ax, ay) = (x0 * self.scale_x, y0 * self.scale_y);
        let (bx, by) = (x1 * self.scale_x, y1 * self.scale_y);
        let device_width = self.line_width * (self.scale_x + self.scale_y) * 0.5;
        let half = device_width.max(1.0) * 0.5;
        let intensity = if device_width < 1.0 { self.line_width.min(1.0) } else { 1.0 };

        let dx = bx - ax;
        let dy = by - ay;
        let len_sq = dx * dx + dy * dy;
        let color = self.stroke;

        let pad = half + 1.0;
        let rows = self.row_range(ay.min(by) - pad, ay.max(by) + pad);
        let columns = self.column_range(ax.min(bx) - pad, ax.max(bx) + pad);

        for row in rows {
            let py = row as f32 + 0.5;
            for column in columns.clone() {
                let px = column as f32 + 0.5;
                // Distance from the pixel center to the segment
                let t = if len_sq > 0.0 {
                    (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let cx = ax + dx * t - px;
                let cy = ay + dy * t - py;
                let dist = (cx * cx + cy * cy).sqrt();

                let coverage = (half + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(column, row, color, coverage * intensity);
                }
            }
        }
    }

    fn fill_polygon(&mut self, points: &[(f32, f32)]) {
        if points.len() < 3 {
            return;
        }

        let device: Vec<(f32, f32)> = points
            .iter()
            .map(|&(x, y)| (x * self.scale_x, y * self.scale_y))
            .collect();
        let min_y = device.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
        let max_y = device.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);

        let color = self.fill;
        let weight = 1.0 / POLYGON_SUBSAMPLES as f32;
        let mut coverage = vec![0.0f32; self.columns];
        let mut crossings: Vec<f32> = Vec::with_capacity(8);

        for row in self.row_range(min_y, max_y) {
            coverage.fill(0.0);

            for sub in 0..POLYGON_SUBSAMPLES {
                let sy = row as f32 + (sub as f32 + 0.5) * weight;
                crossings.clear();

                for i in 0..device.len() {
                    let (ax, ay) = device[i];
                    let (bx, by) = device[(i + 1) % device.len()];
                    if ay == by {
                        continue;
                    }
                    // Half-open so shared vertices are counted once
                    if (sy >= ay && sy < by) || (sy >= by && sy < ay) {
                        crossings.push(ax + (sy - ay) * (bx - ax) / (by - ay));
                    }
                }

                crossings.sort_by(|a, b| a.total_cmp(b));
                for span in crossings.chunks_exact(2) {
                    let (lo, hi) = (span[0], span[1]);
                    for column in self.column_range(lo, hi) {
                        coverage[column] += overlap(lo, hi, column) * weight;
                    }
                }
            }

            for column in 0..self.columns {
                if coverage[column] > 0.0 {
                    self.blend(column, row, color, coverage[column]);
                }
            }
        }
    }
}
