//! Software rasterizer: frame/depth buffers, textures, triangles and lines
use serde::{Deserialize, Serialize};

use crate::math::{Vector2, Vector3};
use crate::projection::ScreenVertex;

/// Triangles with a smaller absolute screen-space area are skipped
pub const MIN_TRIANGLE_AREA: f64 = 1e-9;

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Multiply every channel by `factor`, clamped to the valid range
    pub fn scale(self, factor: f64) -> Self {
        let channel = |c: u8| (f64::from(c) * factor).round().clamp(0.0, 255.0) as u8;
        Self::new(channel(self.r), channel(self.g), channel(self.b))
    }

    /// Relative luminance in `[0, 1]`
    pub fn luminance(self) -> f64 {
        (0.2126 * f64::from(self.r) + 0.7152 * f64::from(self.g) + 0.0722 * f64::from(self.b))
            / 255.0
    }
}

/// Colour plus depth target, row 0 at the top
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    color: Vec<Color>,
    depth: Vec<f64>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            color: vec![Color::BLACK; size],
            depth: vec![f64::INFINITY; size],
        }
    }

    /// Reset every pixel to `background` and every depth to +infinity
    pub fn clear(&mut self, background: Color) {
        self.color.fill(background);
        self.depth.fill(f64::INFINITY);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        self.index(x, y).map(|i| self.color[i])
    }

    pub fn depth_at(&self, x: usize, y: usize) -> Option<f64> {
        self.index(x, y).map(|i| self.depth[i])
    }

    pub fn pixels(&self) -> &[Color] {
        &self.color
    }

    pub fn depths(&self) -> &[f64] {
        &self.depth
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}

/// Nearest-neighbour sampled RGB image
#[derive(Debug, Clone)]
pub struct Texture {
    width: usize,
    height: usize,
    texels: Vec<Color>,
}

impl Texture {
    /// `None` unless `texels` holds exactly `width * height` entries, both non-zero
    pub fn new(width: usize, height: usize, texels: Vec<Color>) -> Option<Self> {
        (width > 0 && height > 0 && texels.len() == width * height).then_some(Self {
            width,
            height,
            texels,
        })
    }

    /// Two-colour checkerboard with `cells` squares per side
    pub fn checkerboard(size: usize, cells: usize, a: Color, b: Color) -> Self {
        let size = size.max(1);
        let cell = (size / cells.max(1)).max(1);
        let texels = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                if (x / cell + y / cell) % 2 == 0 {
                    a
                } else {
                    b
                }
            })
            .collect();
        Self {
            width: size,
            height: size,
            texels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Nearest texel for `uv`; `v = 0` is the bottom row. Coordinates outside
    /// `[0, 1]` are clamped to the border.
    pub fn sample(&self, uv: Vector2) -> Color {
        let x = texel_index(uv.x, self.width);
        let y = texel_index(1.0 - uv.y, self.height);
        self.texels[y * self.width + x]
    }
}

fn texel_index(t: f64, size: usize) -> usize {
    let max = (size - 1) as f64;
    let i = (t * size as f64).floor();
    if i.is_nan() {
        0
    } else {
        i.clamp(0.0, max) as usize
    }
}

/// Triangle corner with the attributes the shader may need
#[derive(Debug, Clone, Copy)]
pub struct RasterVertex {
    pub screen: ScreenVertex,
    pub world: Vector3,
    pub uv: Option<Vector2>,
    pub normal: Option<Vector3>,
}

/// A pixel that passed the depth test, with perspective-correct attributes
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub x: usize,
    pub y: usize,
    pub depth: f64,
    pub world: Vector3,
    pub uv: Option<Vector2>,
    pub normal: Option<Vector3>,
}

/// Twice the signed area of `(a, b, p)`; positive when `p` is left of `a -> b`
/// in a y-up frame
pub fn edge_function(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> f64 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

/// Inclusive pixel range covering `[lo, hi]`, clipped to `[0, size)`
fn pixel_span(lo: f64, hi: f64, size: usize) -> Option<(usize, usize)> {
    if size == 0 || hi < 0.0 || lo >= size as f64 {
        return None;
    }
    let first = lo.floor().max(0.0) as usize;
    let last = (hi.ceil().min(size as f64 - 1.0)) as usize;
    (first <= last).then_some((first, last))
}

fn interpolate2(values: [Vector2; 3], weights: [f64; 3]) -> Vector2 {
    values[0] * weights[0] + values[1] * weights[1] + values[2] * weights[2]
}

fn interpolate3(values: [Vector3; 3], weights: [f64; 3]) -> Vector3 {
    values[0] * weights[0] + values[1] * weights[1] + values[2] * weights[2]
}

/// Fills a triangle with depth testing, calling `shade` only for pixels
/// that pass.
///
/// Pixel centres are sampled at `(x + 0.5, y + 0.5)` and either winding
/// fills. Fragments outside the `[-1, 1]` depth range are clipped. The depth
/// buffer is updated before `shade` runs. Returns `None` for a degenerate
/// triangle (which touches nothing), otherwise the number of pixels written.
pub fn rasterize_triangle<F>(
    target: &mut FrameBuffer,
    vertices: &[RasterVertex; 3],
    mut shade: F,
) -> Option<usize>
where
    F: FnMut(&Fragment) -> Color,
{
    let vertices = *vertices;
    let [v0, v1, v2] = vertices.map(|v| v.screen);
    let (p0, p1, p2) = ((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y));

    let area = edge_function(p0, p1, p2);
    if !(area.abs() >= MIN_TRIANGLE_AREA) {
        return None;
    }

    let xs = (v0.x.min(v1.x).min(v2.x), v0.x.max(v1.x).max(v2.x));
    let ys = (v0.y.min(v1.y).min(v2.y), v0.y.max(v1.y).max(v2.y));
    let (Some((min_x, max_x)), Some((min_y, max_y))) = (
        pixel_span(xs.0, xs.1, target.width),
        pixel_span(ys.0, ys.1, target.height),
    ) else {
        return Some(0);
    };

    let uvs = match vertices.map(|v| v.uv) {
        [Some(a), Some(b), Some(c)] => Some([a, b, c]),
        _ => None,
    };
    let normals = match vertices.map(|v| v.normal) {
        [Some(a), Some(b), Some(c)] => Some([a, b, c]),
        _ => None,
    };
    let worlds = vertices.map(|v| v.world);

    let mut written = 0;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = (x as f64 + 0.5, y as f64 + 0.5);

            // Normalizing by the signed area makes inside weights positive for both windings
            let w0 = edge_function(p1, p2, p) / area;
            let w1 = edge_function(p2, p0, p) / area;
            let w2 = edge_function(p0, p1, p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
            if !(-1.0..=1.0).contains(&depth) {
                continue;
            }

            let idx = y * target.width + x;
            if depth >= target.depth[idx] {
                continue;
            }
            target.depth[idx] = depth;

            let perspective = [w0 * v0.inv_w, w1 * v1.inv_w, w2 * v2.inv_w];
            let sum: f64 = perspective.iter().sum();
            let weights = perspective.map(|w| w / sum);

            let fragment = Fragment {
                x,
                y,
                depth,
                world: interpolate3(worlds, weights),
                uv: uvs.map(|uvs| interpolate2(uvs, weights)),
                normal: normals.map(|normals| interpolate3(normals, weights)),
            };
            target.color[idx] = shade(&fragment);
            written += 1;
        }
    }

    Some(written)
}

/// Visible parameter range `[t0, t1]` of `a + t (b - a)` inside the frame
/// (Liang-Barsky)
fn clip_segment(a: (f64, f64), b: (f64, f64), width: f64, height: f64) -> Option<(f64, f64)> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for (p, q) in [
        (-dx, a.0),
        (dx, width - a.0),
        (-dy, a.1),
        (dy, height - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
        }
    }
    (t0 <= t1).then_some((t0, t1))
}

/// Draws a line segment with linearly interpolated depth.
///
/// With `depth_bias` set, a pixel is drawn only where the line depth is at
/// most the stored depth plus the bias; the depth buffer is never written.
/// Returns the number of pixels written.
pub fn draw_line(
    target: &mut FrameBuffer,
    a: &ScreenVertex,
    b: &ScreenVertex,
    color: Color,
    depth_bias: Option<f64>,
) -> usize {
    let (width, height) = (target.width as f64, target.height as f64);
    let Some((t0, t1)) = clip_segment((a.x, a.y), (b.x, b.y), width, height) else {
        return 0;
    };

    let lerp = |t: f64| {
        (
            a.x + (b.x - a.x) * t,
            a.y + (b.y - a.y) * t,
            a.depth + (b.depth - a.depth) * t,
        )
    };
    let (start, end) = (lerp(t0), lerp(t1));
    let steps = (end.0 - start.0).abs().max((end.1 - start.1).abs()).ceil().max(1.0) as usize;
    let n = steps as f64;

    let mut written = 0;
    for i in 0..=steps {
        let k = i as f64;
        let x = (start.0 + (end.0 - start.0) * k / n).floor();
        let y = (start.1 + (end.1 - start.1) * k / n).floor();
        let depth = start.2 + (end.2 - start.2) * k / n;
        if x < 0.0 || y < 0.0 || x >= width || y >= height {
            continue;
        }
        let idx = y as usize * target.width + x as usize;
        if let Some(bias) = depth_bias {
            if depth > target.depth[idx] + bias {
                continue;
            }
        }
        target.color[idx] = color;
        written += 1;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f64, y: f64, depth: f64) -> RasterVertex {
        RasterVertex {
            screen: ScreenVertex {
                x,
                y,
                depth,
                inv_w: 1.0,
            },
            world: Vector3::ZERO,
            uv: None,
            normal: None,
        }
    }

    fn flat(color: Color) -> impl FnMut(&Fragment) -> Color {
        move |_| color
    }

    #[test]
    fn test_collinear_triangle_draws_nothing() {
        let mut fb = FrameBuffer::new(16, 16);
        let tri = [vertex(1.0, 1.0, 0.0), vertex(5.0, 5.0, 0.0), vertex(9.0, 9.0, 0.0)];
        assert_eq!(rasterize_triangle(&mut fb, &tri, flat(Color::WHITE)), None);
        assert!(fb.depths().iter().all(|d| *d == f64::INFINITY));
        assert!(fb.pixels().iter().all(|c| *c == Color::BLACK));
    }

    #[test]
    fn test_nan_triangle_is_skipped() {
        let mut fb = FrameBuffer::new(4, 4);
        let tri = [vertex(f64::NAN, 1.0, 0.0), vertex(3.0, 0.0, 0.0), vertex(0.0, 3.0, 0.0)];
        assert_eq!(rasterize_triangle(&mut fb, &tri, flat(Color::WHITE)), None);
    }

    #[test]
    fn test_both_windings_fill() {
        let ccw = [vertex(0.0, 0.0, 0.0), vertex(8.0, 0.0, 0.0), vertex(0.0, 8.0, 0.0)];
        let cw = [ccw[0], ccw[2], ccw[1]];
        for tri in [ccw, cw] {
            let mut fb = FrameBuffer::new(8, 8);
            let written = rasterize_triangle(&mut fb, &tri, flat(Color::WHITE)).unwrap();
            // centres on or below the hypotenuse: x + y <= 7
            assert_eq!(written, 36);
            assert_eq!(fb.pixel(0, 0), Some(Color::WHITE));
            assert_eq!(fb.pixel(7, 7), Some(Color::BLACK));
        }
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let mut fb = FrameBuffer::new(8, 8);
        let red = Color::new(255, 0, 0);
        let blue = Color::new(0, 0, 255);
        let square = |d| [vertex(-1.0, -1.0, d), vertex(20.0, -1.0, d), vertex(-1.0, 20.0, d)];

        rasterize_triangle(&mut fb, &square(0.5), flat(red));
        rasterize_triangle(&mut fb, &square(0.2), flat(blue));
        rasterize_triangle(&mut fb, &square(0.7), flat(red));
        assert_eq!(fb.pixel(2, 2), Some(blue));
        assert!((fb.depth_at(2, 2).unwrap() - 0.2).abs() < 1e-12);

        // equal depth does not pass
        let written = rasterize_triangle(&mut fb, &square(0.2), flat(red)).unwrap();
        assert_eq!(written, 0);
    }

    #[test]
    fn test_shader_only_runs_for_visible_pixels() {
        let mut fb = FrameBuffer::new(8, 8);
        let tri = [vertex(-1.0, -1.0, -0.5), vertex(20.0, -1.0, -0.5), vertex(-1.0, 20.0, -0.5)];
        rasterize_triangle(&mut fb, &tri, flat(Color::WHITE));

        let mut calls = 0;
        let behind = [vertex(-1.0, -1.0, 0.5), vertex(20.0, -1.0, 0.5), vertex(-1.0, 20.0, 0.5)];
        rasterize_triangle(&mut fb, &behind, |_| {
            calls += 1;
            Color::BLACK
        });
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_fragments_outside_depth_range_are_clipped() {
        let mut fb = FrameBuffer::new(4, 4);
        let tri = [vertex(-1.0, -1.0, 1.5), vertex(10.0, -1.0, 1.5), vertex(-1.0, 10.0, 1.5)];
        assert_eq!(rasterize_triangle(&mut fb, &tri, flat(Color::WHITE)), Some(0));
    }

    #[test]
    fn test_uv_interpolation_is_perspective_correct() {
        let mut fb = FrameBuffer::new(64, 1);
        let mut left = vertex(0.0, -10.0, 0.0);
        let mut right = vertex(64.0, 0.5, 0.0);
        let mut bottom = vertex(0.0, 10.0, 0.0);
        left.uv = Some(Vector2::new(0.0, 0.0));
        bottom.uv = Some(Vector2::new(0.0, 0.0));
        right.uv = Some(Vector2::new(1.0, 0.0));
        // right edge is four times further away
        right.screen.inv_w = 0.25;
        left.screen.inv_w = 1.0;
        bottom.screen.inv_w = 1.0;

        let mut samples = vec![0.0; 64];
        rasterize_triangle(&mut fb, &[left, right, bottom], |f| {
            samples[f.x] = f.uv.unwrap().x;
            Color::WHITE
        });

        // halfway across the screen the far vertex only gets 1/5 of the weight
        let screen_t: f64 = 32.5 / 64.0;
        let expected = screen_t * 0.25 / ((1.0 - screen_t) + screen_t * 0.25);
        assert!((samples[32] - expected).abs() < 1e-9, "{}", samples[32]);
        assert!(samples[32] < 0.5);
    }

    #[test]
    fn test_texture_sampling_clamps() {
        let texels = vec![
            Color::new(1, 0, 0),
            Color::new(2, 0, 0),
            Color::new(3, 0, 0),
            Color::new(4, 0, 0),
        ];
        let texture = Texture::new(2, 2, texels).unwrap();
        // v = 0 is the bottom row
        assert_eq!(texture.sample(Vector2::new(0.1, 0.1)), Color::new(3, 0, 0));
        assert_eq!(texture.sample(Vector2::new(0.9, 0.9)), Color::new(2, 0, 0));
        assert_eq!(texture.sample(Vector2::new(-5.0, 7.0)), Color::new(1, 0, 0));
        assert_eq!(texture.sample(Vector2::new(1.0, 0.0)), Color::new(4, 0, 0));
        assert_eq!(texture.sample(Vector2::new(f64::NAN, 0.0)), Color::new(3, 0, 0));
        assert!(Texture::new(2, 2, vec![Color::BLACK]).is_none());
    }

    #[test]
    fn test_checkerboard() {
        let texture = Texture::checkerboard(4, 2, Color::WHITE, Color::BLACK);
        assert_eq!(texture.sample(Vector2::new(0.1, 0.9)), Color::WHITE);
        assert_eq!(texture.sample(Vector2::new(0.9, 0.9)), Color::BLACK);
    }

    #[test]
    fn test_line_is_clipped_and_closed() {
        let mut fb = FrameBuffer::new(10, 10);
        let a = ScreenVertex { x: -6.0, y: 5.5, depth: 0.0, inv_w: 1.0 };
        let b = ScreenVertex { x: 26.0, y: 5.5, depth: 0.0, inv_w: 1.0 };
        assert_eq!(draw_line(&mut fb, &a, &b, Color::WHITE, None), 10);
        assert!((0..10).all(|x| fb.pixel(x, 5) == Some(Color::WHITE)));
        assert!((0..10).all(|x| fb.pixel(x, 4) == Some(Color::BLACK)));

        // far off-screen endpoints only walk the visible part
        let far = ScreenVertex { x: 1e12, y: 1.5, ..a };
        let written = draw_line(&mut fb, &ScreenVertex { y: 1.5, ..a }, &far, Color::WHITE, None);
        assert!(written > 0 && written <= 11);
    }

    #[test]
    fn test_line_depth_test() {
        let mut fb = FrameBuffer::new(10, 10);
        let tri = [vertex(-1.0, -1.0, 0.0), vertex(30.0, -1.0, 0.0), vertex(-1.0, 30.0, 0.0)];
        rasterize_triangle(&mut fb, &tri, flat(Color::BLACK));

        let red = Color::new(255, 0, 0);
        let hidden_a = ScreenVertex { x: 0.0, y: 2.5, depth: 0.5, inv_w: 1.0 };
        let hidden_b = ScreenVertex { x: 9.0, y: 2.5, depth: 0.5, inv_w: 1.0 };
        assert_eq!(draw_line(&mut fb, &hidden_a, &hidden_b, red, Some(1e-3)), 0);

        let on_top_a = ScreenVertex { depth: 0.0, ..hidden_a };
        let on_top_b = ScreenVertex { depth: 0.0, ..hidden_b };
        assert!(draw_line(&mut fb, &on_top_a, &on_top_b, red, Some(1e-3)) > 0);
        assert_eq!(fb.depth_at(3, 2), Some(0.0));
    }

    #[test]
    fn test_offscreen_line() {
        let mut fb = FrameBuffer::new(10, 10);
        let a = ScreenVertex { x: -5.0, y: -5.0, depth: 0.0, inv_w: 1.0 };
        let b = ScreenVertex { x: -1.0, y: 20.0, depth: 0.0, inv_w: 1.0 };
        assert_eq!(draw_line(&mut fb, &a, &b, Color::WHITE, None), 0);
    }
}
