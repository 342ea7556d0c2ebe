//! ASCII presenter for the software frame buffer
use crossterm::{
    style::{Color as TermColor, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use sw3d_core::{Camera, Color, FrameBuffer, Mesh, RenderStats, Renderer, Transform};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: f64 = 0.5;

/// Renders meshes into a frame buffer sized to the terminal and prints it
/// as characters, one cell per pixel
pub struct AsciiRenderer {
    frame: FrameBuffer,
    background: Color,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            frame: FrameBuffer::new(width, height),
            background: Color::BLACK,
        }
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.frame.width() || height != self.frame.height() {
            self.frame = FrameBuffer::new(width, height);
        }
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Aspect ratio the camera needs so the model is not stretched by the
    /// cell shape
    pub fn camera_aspect(&self) -> f64 {
        if self.frame.width() == 0 || self.frame.height() == 0 {
            return 1.0;
        }
        self.frame.width() as f64 * CELL_ASPECT / self.frame.height() as f64
    }

    pub fn render_mesh(
        &mut self,
        renderer: &Renderer,
        camera: &Camera,
        mesh: &Mesh,
        transform: &Transform,
    ) -> RenderStats {
        self.background = renderer.options.background;
        renderer.render(&mut self.frame, camera, mesh, transform)
    }

    fn cell(&self, color: Color) -> char {
        if color == self.background {
            return ' ';
        }
        let index = (color.luminance() * (LUMINOSITY_RAMP.len() - 1) as f64).round() as usize;
        LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)]
    }

    /// The frame as text, one string per row
    pub fn lines(&self) -> Vec<String> {
        self.frame
            .pixels()
            .chunks(self.frame.width().max(1))
            .map(|row| row.iter().map(|&c| self.cell(c)).collect())
            .collect()
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let width = self.frame.width();
        for y in 0..self.frame.height() {
            for x in 0..width {
                let color = self.frame.pixels()[y * width + x];
                writer.queue(SetForegroundColor(TermColor::Rgb {
                    r: color.r,
                    g: color.g,
                    b: color.b,
                }))?;
                writer.queue(Print(self.cell(color)))?;
            }
            if y + 1 < self.frame.height() {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}
