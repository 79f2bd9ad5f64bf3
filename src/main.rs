use std::collections::HashSet;
use std::error::Error;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{LevelFilter, debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use portal_engine::camera::View;
use portal_engine::map::{DEMO_MAP, MapData, load_map, parse_map};
use portal_engine::movement::{self, set_stance};
use portal_engine::player::{MoveKeys, MoveParams, Player, Stance, approach, wish_velocity};
use portal_engine::renderer::{Canvas, render_frame};
use portal_engine::world::World;

use crate::cli::CliOptions;
use crate::scaler::{StretchLut, blit_stretch};

mod cli;
mod scaler;

/// Simulation step in seconds (100 Hz).
const SIM_DT: f32 = 0.01;
const MAX_SUBSTEPS: u32 = 8;
const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);
const MIN_RESOLUTION: usize = 16;

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    world: World,
    player: Player,
    params: MoveParams,

    // Internal framebuffer, stretched onto the window
    view: View,
    fb: Vec<u32>,
    lut: StretchLut,

    // Input
    keys_down: HashSet<KeyCode>,
    mouse_delta: (f32, f32),

    // Timing
    last_tick: Instant,
    accumulator: f32,
    frame_counter: u32,
    last_fps_print: Instant,
}

impl App {
    fn new(map: MapData, params: MoveParams, width: usize, height: usize) -> Self {
        let spawn = map.spawn;
        let player = Player::spawn(
            &map.world,
            spawn.x,
            spawn.y,
            spawn.angle,
            spawn.sector,
            &params,
        );
        Self {
            window: None,
            surface: None,
            world: map.world,
            player,
            params,
            view: View::new(width, height),
            fb: vec![0; width * height],
            lut: StretchLut::new(0, 0, width, height),
            keys_down: HashSet::new(),
            mouse_delta: (0.0, 0.0),
            last_tick: Instant::now(),
            accumulator: 0.0,
            frame_counter: 0,
            last_fps_print: Instant::now(),
        }
    }

    fn key(&self, code: KeyCode) -> bool {
        self.keys_down.contains(&code)
    }

    /// Advance the simulation by the wall-clock time since the last frame.
    fn step(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).min(MAX_FRAME_DELTA);
        self.last_tick = now;
        self.accumulator += dt.as_secs_f32();

        let (dx, dy) = std::mem::take(&mut self.mouse_delta);
        self.player.look(dx, dy);

        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.substep();
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS {
            // Drop the backlog rather than spiral
            self.accumulator = self.accumulator.min(SIM_DT);
        }
    }

    fn substep(&mut self) {
        let keys = MoveKeys {
            forward: self.key(KeyCode::KeyW),
            left: self.key(KeyCode::KeyA),
            back: self.key(KeyCode::KeyS),
            right: self.key(KeyCode::KeyD),
        };

        let stance = if self.key(KeyCode::ControlLeft) {
            Stance::Ducking
        } else {
            Stance::Standing
        };
        set_stance(&mut self.player, stance);
        if self.key(KeyCode::Space) && movement::jump(&mut self.player, &self.params) {
            debug!("jump from sector {}", self.player.sector);
        }

        let wish = wish_velocity(&self.player, &keys, self.params.walk_speed);
        let current = [self.player.velocity[0], self.player.velocity[1]];
        let desired = approach(current, wish, keys.any());
        self.player.velocity[0] = desired[0];
        self.player.velocity[1] = desired[1];

        let report = movement::tick(&mut self.player, desired, &self.world, &self.params, SIM_DT);
        if let Some(sector) = report.changed_sector {
            debug!("entered sector {}", sector);
        }
    }

    fn grab_cursor(window: &Window) {
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            warn!("Cursor grab unavailable: {}", e);
        }
        window.set_cursor_visible(false);
    }

    fn redraw(&mut self, id: WindowId) {
        let mut canvas = Canvas::new(&mut self.fb, self.view.width);
        canvas.clear(0);
        let stats = render_frame(&mut canvas, &self.view, &self.world, &self.player);
        if stats.dropped > 0 {
            debug!("queue full, {} portals skipped", stats.dropped);
        }

        let (window, surface) = match (&self.window, &mut self.surface) {
            (Some(w), Some(s)) if w.id() == id => (w, s),
            _ => return,
        };

        let size = window.inner_size();
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            return; // Minimized window, skip drawing
        };
        if let Err(e) = surface.resize(w, h) {
            warn!("Surface resize failed: {}", e);
            return;
        }

        let (dw, dh) = (size.width as usize, size.height as usize);
        if !self.lut.matches(dw, dh) {
            self.lut = StretchLut::new(dw, dh, self.view.width, self.view.height);
        }

        let mut buf = match surface.buffer_mut() {
            Ok(buf) => buf,
            Err(e) => {
                warn!("Surface buffer unavailable: {}", e);
                return;
            }
        };
        blit_stretch(&mut buf, &self.fb, &self.lut);
        if let Err(e) = buf.present() {
            warn!("Present failed: {}", e);
        }

        self.frame_counter += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_print).as_secs_f32();
        if elapsed >= 1.0 {
            info!(
                "FPS: {:.1} (sector {}, {} items)",
                self.frame_counter as f32 / elapsed,
                self.player.sector,
                stats.processed
            );
            self.frame_counter = 0;
            self.last_fps_print = now;
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("portal-engine")
            .with_inner_size(LogicalSize::new(self.view.width as f64, self.view.height as f64));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Rc::new(window),
            Err(e) => {
                error!("Could not create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let surface = softbuffer::Context::new(window.clone())
            .and_then(|context| softbuffer::Surface::new(&context, window.clone()));
        let surface = match surface {
            Ok(surface) => surface,
            Err(e) => {
                error!("Could not create drawing surface: {}", e);
                event_loop.exit();
                return;
            }
        };

        Self::grab_cursor(&window);
        window.request_redraw();

        self.surface = Some(surface);
        self.window = Some(window);
        self.last_tick = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, stopping");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    ..
                },
                ..
            } => match state {
                ElementState::Pressed if code == KeyCode::Escape => event_loop.exit(),
                ElementState::Pressed => {
                    self.keys_down.insert(code);
                }
                ElementState::Released => {
                    self.keys_down.remove(&code);
                }
            },

            WindowEvent::Focused(true) => {
                if let Some(window) = &self.window {
                    Self::grab_cursor(window);
                }
            }

            WindowEvent::Focused(false) => self.keys_down.clear(),

            WindowEvent::RedrawRequested => {
                self.step();
                self.redraw(id);
            }

            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.mouse_delta.0 += dx as f32;
            self.mouse_delta.1 += dy as f32;
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let options: CliOptions = argh::from_env();

    env_logger::Builder::new()
        .filter_level(options.verbose.unwrap_or(LevelFilter::Info))
        .parse_default_env()
        .init();

    if options.width < MIN_RESOLUTION || options.height < MIN_RESOLUTION {
        let msg = format!(
            "resolution {}x{} is too small, minimum is {}x{}",
            options.width, options.height, MIN_RESOLUTION, MIN_RESOLUTION
        );
        error!("{}", msg);
        return Err(msg.into());
    }

    let map = match &options.map {
        Some(path) => load_map(path),
        None => {
            info!("No map given, using the bundled demo");
            parse_map(DEMO_MAP)
        }
    };
    let map = map.inspect_err(|e| error!("Failed to load map: {}", e))?;

    let mut app = App::new(map, MoveParams::default(), options.width, options.height);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop.run_app(&mut app)?;
    Ok(())
}
