//! # SW3D Terminal
//!
//! Interactive viewer that draws the software-rendered frame as ASCII art.
//!
//! ## Controls
//! - Arrow keys: orbit the camera around its target
//! - I/K/J/L: move the camera forward/back/left/right, PageUp/PageDown: up/down
//! - Y/H/U/N: turn the view in place
//! - +/-: zoom
//! - WASD, E/R: rotate the model
//! - M: wireframe/filled, O: wireframe overlay, G: lighting, T: texture
//! - Space: pause auto rotation, C: reset the camera
//! - Q/ESC: quit

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use log::info;
use std::io::{self, stdout, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use sw3d_core::{
    apply_transform, export_mesh, import_mesh, Camera, CameraAxis, Mesh, Point3, RenderMode,
    RenderStats, Renderer, Texture, Transform,
};

pub mod renderer;
pub mod settings;

pub use renderer::AsciiRenderer;
pub use settings::{FileSink, FileSource, ViewerSettings};

const MOVE_STEP: f64 = 0.25;
const TURN_STEP: f64 = 0.05;
const ZOOM_STEP: f64 = 0.5;
const MODEL_STEP: f64 = 0.1;

/// Terminal 3D model viewer
#[derive(Parser, Debug)]
#[command(name = "sw3d-terminal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// OBJ model to display; a cube is shown when omitted
    pub model: Option<PathBuf>,

    /// JSON file with the initial transform, render options and camera distance
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Write the transformed model as OBJ to this path instead of viewing it
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Start in wireframe mode
    #[arg(long)]
    pub wireframe: bool,

    /// Paint the model with a checkerboard texture
    #[arg(long)]
    pub checker: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    }

    let mut settings = match &cli.settings {
        Some(path) => ViewerSettings::load(path)?,
        None => ViewerSettings::default(),
    };
    if cli.wireframe {
        settings.render.mode = RenderMode::Wireframe;
    }

    let mesh = load_mesh(cli.model.as_deref())?;

    if let Some(path) = &cli.export {
        let transformed = apply_transform(&mesh, &settings.transform);
        export_mesh(&transformed, &mut FileSink::new(path))
            .with_context(|| format!("failed to export {}", path.display()))?;
        info!("wrote transformed model to {}", path.display());
        return Ok(());
    }

    let mut renderer = Renderer::new(settings.render);
    if cli.checker {
        renderer.set_texture(Some(checker_texture()));
    }

    let (width, height) = terminal::size()?;
    let mut app = TerminalApp::new(mesh, renderer, &settings, width as usize, height as usize);
    app.run()?;
    Ok(())
}

/// Load an OBJ model, or the unit cube when no path is given
pub fn load_mesh(path: Option<&Path>) -> Result<Mesh> {
    match path {
        Some(path) => import_mesh(&mut FileSource::new(path))
            .with_context(|| format!("failed to load {}", path.display())),
        None => Ok(Mesh::cube(2.0)),
    }
}

fn checker_texture() -> Texture {
    Texture::checkerboard(
        64,
        8,
        sw3d_core::Color::WHITE,
        sw3d_core::Color::new(90, 90, 90),
    )
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    mesh: Mesh,
    transform: Transform,
    camera: Camera,
    home: Camera,
    renderer: Renderer,
    ascii: AsciiRenderer,
    auto_rotate: bool,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
    stats: RenderStats,
}

impl TerminalApp {
    /// The top terminal row is kept for the status line
    pub fn new(
        mesh: Mesh,
        renderer: Renderer,
        settings: &ViewerSettings,
        width: usize,
        height: usize,
    ) -> Self {
        let ascii = AsciiRenderer::new(width, height.saturating_sub(1));
        let mut camera =
            Camera::looking_at(Point3::new(0.0, 0.0, settings.camera_distance), Point3::ORIGIN);
        camera.aspect = ascii.camera_aspect();

        Self {
            mesh,
            transform: settings.transform,
            home: camera.clone(),
            camera,
            renderer,
            ascii,
            auto_rotate: settings.auto_rotate,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            stats: RenderStats::default(),
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn ascii(&self) -> &AsciiRenderer {
        &self.ascii
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                match event::read()? {
                    Event::Key(KeyEvent {
                        code,
                        kind: KeyEventKind::Press | KeyEventKind::Repeat,
                        ..
                    }) => self.handle_key(code),
                    Event::Resize(width, height) => self.resize(width as usize, height as usize),
                    _ => {}
                }
            }

            self.update();
            self.render_frame();
            self.present()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.ascii.resize(width, height.saturating_sub(1));
        self.camera.aspect = self.ascii.camera_aspect();
        self.home.aspect = self.camera.aspect;
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        let options = &mut self.renderer.options;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,

            KeyCode::Left => self.camera.orbit(-TURN_STEP, 0.0),
            KeyCode::Right => self.camera.orbit(TURN_STEP, 0.0),
            KeyCode::Up => self.camera.orbit(0.0, TURN_STEP),
            KeyCode::Down => self.camera.orbit(0.0, -TURN_STEP),

            KeyCode::Char('i') => self.camera.translate(CameraAxis::Forward, MOVE_STEP),
            KeyCode::Char('k') => self.camera.translate(CameraAxis::Forward, -MOVE_STEP),
            KeyCode::Char('j') => self.camera.translate(CameraAxis::Right, -MOVE_STEP),
            KeyCode::Char('l') => self.camera.translate(CameraAxis::Right, MOVE_STEP),
            KeyCode::PageUp => self.camera.translate(CameraAxis::Up, MOVE_STEP),
            KeyCode::PageDown => self.camera.translate(CameraAxis::Up, -MOVE_STEP),

            KeyCode::Char('y') => self.camera.rotate(0.0, TURN_STEP),
            KeyCode::Char('n') => self.camera.rotate(0.0, -TURN_STEP),
            KeyCode::Char('h') => self.camera.rotate(TURN_STEP, 0.0),
            KeyCode::Char('u') => self.camera.rotate(-TURN_STEP, 0.0),

            KeyCode::Char('+') | KeyCode::Char('=') => self.camera.zoom(ZOOM_STEP),
            KeyCode::Char('-') => self.camera.zoom(-ZOOM_STEP),

            KeyCode::Char('w') => self.transform.rotation.rotate(MODEL_STEP, 0.0, 0.0),
            KeyCode::Char('s') => self.transform.rotation.rotate(-MODEL_STEP, 0.0, 0.0),
            KeyCode::Char('a') => self.transform.rotation.rotate(0.0, -MODEL_STEP, 0.0),
            KeyCode::Char('d') => self.transform.rotation.rotate(0.0, MODEL_STEP, 0.0),
            KeyCode::Char('e') => self.transform.rotation.rotate(0.0, 0.0, MODEL_STEP),
            KeyCode::Char('r') => self.transform.rotation.rotate(0.0, 0.0, -MODEL_STEP),

            KeyCode::Char('m') => {
                options.mode = match options.mode {
                    RenderMode::Filled => RenderMode::Wireframe,
                    RenderMode::Wireframe => RenderMode::Filled,
                }
            }
            KeyCode::Char('o') => options.wireframe_overlay = !options.wireframe_overlay,
            KeyCode::Char('g') => options.lighting = !options.lighting,
            KeyCode::Char('t') => options.textured = !options.textured,

            KeyCode::Char(' ') => self.auto_rotate = !self.auto_rotate,
            KeyCode::Char('c') => self.camera = self.home.clone(),
            _ => {}
        }
    }

    fn update(&mut self) {
        // Continuous slow rotation for demo effect
        if self.auto_rotate {
            self.transform.rotation.rotate(0.01, 0.015, 0.0);
        }
    }

    /// Render the mesh into the ASCII frame without touching the terminal
    pub fn render_frame(&mut self) -> RenderStats {
        self.stats = self
            .ascii
            .render_mesh(&self.renderer, &self.camera, &self.mesh, &self.transform);
        self.stats
    }

    fn present(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 1))?;

        self.ascii.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "SW3D | FPS: {:.1} | {:?} | tris {} | Arrows=Orbit IJKL=Move +/-=Zoom WASD=Rotate M=Mode Q=Quit",
                self.fps, self.renderer.options.mode, self.stats.triangles_drawn
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw3d_core::Vector3;

    fn app() -> TerminalApp {
        let settings = ViewerSettings {
            auto_rotate: false,
            ..ViewerSettings::default()
        };
        TerminalApp::new(Mesh::cube(2.0), Renderer::default(), &settings, 80, 41)
    }

    #[test]
    fn test_status_row_is_reserved() {
        let app = app();
        assert_eq!(app.ascii().height(), 40);
        assert!((app.camera().aspect - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_quit_key_stops_the_loop() {
        let mut app = app();
        assert!(app.is_running());
        app.handle_key(KeyCode::Char('q'));
        assert!(!app.is_running());
    }

    #[test]
    fn test_orbit_and_reset() {
        let mut app = app();
        let start = app.camera().position;
        app.handle_key(KeyCode::Right);
        assert_ne!(app.camera().position, start);
        assert!((app.camera().distance() - 5.0).abs() < 1e-9);

        app.handle_key(KeyCode::Char('c'));
        assert_eq!(app.camera().position, start);
    }

    #[test]
    fn test_zoom_and_move() {
        let mut app = app();
        app.handle_key(KeyCode::Char('+'));
        assert!((app.camera().distance() - 4.5).abs() < 1e-9);

        app.handle_key(KeyCode::Char('l'));
        assert!(app.camera().position.approx_eq(Point3::new(MOVE_STEP, 0.0, 4.5), 1e-9));
    }

    #[test]
    fn test_model_rotation_keys() {
        let mut app = app();
        app.handle_key(KeyCode::Char('d'));
        app.handle_key(KeyCode::Char('d'));
        assert!((app.transform().rotation.y - 2.0 * MODEL_STEP).abs() < 1e-12);
        assert_eq!(app.transform().translation, Vector3::ZERO);
    }

    #[test]
    fn test_mode_toggles() {
        let mut app = app();
        app.handle_key(KeyCode::Char('m'));
        assert_eq!(app.renderer().options.mode, RenderMode::Wireframe);
        app.handle_key(KeyCode::Char('m'));
        assert_eq!(app.renderer().options.mode, RenderMode::Filled);

        let lighting = app.renderer().options.lighting;
        app.handle_key(KeyCode::Char('g'));
        assert_eq!(app.renderer().options.lighting, !lighting);
    }

    #[test]
    fn test_render_frame_draws_the_model() {
        let mut app = app();
        let stats = app.render_frame();
        assert!(stats.triangles_drawn > 0);
        assert!(app.ascii().lines()[20].contains(|c: char| c != ' '));
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut app = app();
        app.resize(120, 21);
        assert_eq!(app.ascii().width(), 120);
        assert!((app.camera().aspect - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_load_mesh_defaults_to_cube() {
        let mesh = load_mesh(None).unwrap();
        assert_eq!(mesh.vertices.len(), 8);
        assert!(load_mesh(Some(Path::new("/nonexistent/model.obj"))).is_err());
    }
}
