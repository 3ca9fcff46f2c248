//! Application event loop.
//!
//! The winit host owns the window and calls [`FrameDriver::step`] once per
//! redraw. Everything that can fail during start-up (device, shader program,
//! geometry upload) is checked before the first frame; a failure there is
//! logged and ends the loop instead of drawing a broken frame.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and builds the [`AppState`] (synchronously
//!    on native via tokio, through `spawn_local` and a user event on the web)
//! 2. `Resized` reconfigures the surface and the projection
//! 3. `RedrawRequested` steps the driver and requests the next redraw

use std::sync::Arc;

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::SwarmConfig,
    context::Context,
    data_structures::scene::Scene,
    driver::{motion_from_config, Chain, FrameDriver, FrameStats},
    error::{Error, Result},
    render::Renderer,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Driver, renderer and surface status.
pub struct AppState {
    driver: FrameDriver<Chain>,
    renderer: Renderer,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: SwarmConfig) -> Result<Self> {
        config.validate()?;
        let ctx = Context::new(window).await?;
        let scene = Scene::cube_field(&config)?;
        let motion = motion_from_config(&config)?;
        let mut renderer = Renderer::new(ctx, &config, scene.count()).await?;

        let mut driver = FrameDriver::new(scene, motion, config.transform_texture_width)?;
        driver.initialize(&mut renderer)?;

        Ok(Self {
            driver,
            renderer,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        match self.renderer.resize(width, height) {
            Ok(true) => self.is_surface_configured = true,
            Ok(false) => (),
            Err(e) => log::error!("resize to {}x{} failed: {}", width, height, e),
        }
    }

    fn render(&mut self) -> Result<Option<FrameStats>> {
        // invoke main render loop
        self.renderer.context().window().request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(None);
        }
        self.driver.step(&mut self.renderer).map(Some)
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    // Taken on the first `resumed` so the scene is only built once.
    config: Option<SwarmConfig>,
    state: Option<AppState>,
    failure: Option<Error>,
    last_report: Instant,
    frames_since_report: u64,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: SwarmConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config: Some(config),
            state: None,
            failure: None,
            last_report: Instant::now(),
            frames_since_report: 0,
        })
    }

    fn start(&mut self, mut state: AppState) {
        let size = state.renderer.context().window().inner_size();
        state.resize(size.width, size.height);
        state.renderer.context().window().request_redraw();
        self.state = Some(state);
        self.last_report = Instant::now();
        log::info!("swarm initialized");
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        log::error!("App initialization failed: {}", error);
        self.failure = Some(error);
        event_loop.exit();
    }

    fn report(&mut self, stats: FrameStats) {
        self.frames_since_report += 1;
        let elapsed = self.last_report.elapsed();
        if elapsed >= STATS_INTERVAL {
            log::debug!(
                "frame {}: {:.1} fps, {} instances, {} floats, {} indices",
                stats.frame,
                self.frames_since_report as f64 / elapsed.as_secs_f64(),
                stats.instances,
                stats.floats_uploaded,
                stats.indices_drawn
            );
            self.frames_since_report = 0;
            self.last_report = Instant::now();
        }
        if stats.texture_reallocated && stats.frame > 1 {
            log::info!("transform texture reallocated on frame {}", stats.frame);
        }
    }
}

pub enum FlowEvent {
    #[allow(dead_code)]
    Initialized(Box<Result<AppState>>),
}

impl std::fmt::Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(result) => match result.as_ref() {
                Ok(_) => f.write_str("Initialized(Ok(AppState))"),
                Err(e) => f.debug_tuple("Initialized").field(e).finish(),
            },
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(config) = self.config.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("swarm");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, Error::CreateWindow(e));
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(AppState::new(window, config)) {
                Ok(state) => self.start(state),
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = AppState::new(window, config).await;
                if proxy
                    .send_event(FlowEvent::Initialized(Box::new(result)))
                    .is_err()
                {
                    log::error!("event loop closed before initialization finished");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            FlowEvent::Initialized(result) => match *result {
                Ok(state) => self.start(state),
                Err(e) => self.fail(event_loop, e),
            },
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => match state.render() {
                Ok(Some(stats)) => self.report(stats),
                Ok(None) => (),
                // Reconfigure the surface if it's lost or outdated
                Err(Error::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                    let size = state.renderer.context().window().inner_size();
                    state.resize(size.width, size.height);
                }
                Err(Error::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                    log::error!("surface out of memory");
                    event_loop.exit();
                }
                Err(e) => {
                    log::error!("Unable to render {}", e);
                }
            },
            _ => {}
        }
    }
}

/// Open a window and animate the cube field until it is closed.
pub fn run(config: SwarmConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> std::result::Result<(), JsValue> {
    run(SwarmConfig::default()).map_err(|e| JsValue::from_str(&e.to_string()))
}
