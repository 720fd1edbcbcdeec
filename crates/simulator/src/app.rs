//! Main application logic and lifecycle management.
//!
//! The [`Application`] loads the configuration, builds the module manager,
//! brings every configured region up and then serves three sources of work
//! until shutdown: lifecycle requests coming from scenes, console lines and
//! termination signals.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    console::CommandConsole,
    logging::display_banner,
    modules::default_registry,
    scene::{run_frame_loop, Scene, SceneRequest, SceneRequestSender, SceneTable},
    signals::{wait_for_signal, wait_for_signal_silent},
};
use dashmap::DashMap;
use futures::future::join_all;
use module_system::ModuleManager;
use region_event_system::{RegionId, RegionInfo, SceneContext, ShutdownState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Main application struct.
///
/// # Architecture
///
/// * **Configuration Management**: Loads and validates configuration from files and CLI
/// * **Module Orchestration**: Builds modules through the explicit registry
/// * **Region Lifecycle**: One scene and frame loop per region; restarts
///   tear a region down and bring it back with the same id
/// * **Graceful Shutdown**: Signals, `quit`, or an in-world restart that
///   shuts the process down
pub struct Application {
    config: AppConfig,
    regions: Vec<RegionInfo>,
    console_enabled: bool,
    manager: Arc<ModuleManager>,
    scenes: SceneTable,
    frame_tasks: HashMap<RegionId, JoinHandle<()>>,
    requests_tx: SceneRequestSender,
    requests_rx: mpsc::UnboundedReceiver<SceneRequest>,
    shutdown_state: ShutdownState,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Load the configured region modules
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        // Apply CLI overrides
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Some(marker_path) = args.marker_path {
            config.restart.marker_path = Some(marker_path.to_string_lossy().to_string());
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        } else {
            info!("✅ Configuration loaded and validated successfully");
        }

        display_banner();

        let regions = config.region_infos(&args.regions)?;
        let mut app = Self::from_config(config, regions).await?;
        app.console_enabled = !args.no_console;
        Ok(app)
    }

    /// Builds the application around an already validated configuration.
    ///
    /// The stdin console is off; [`Application::new`] turns it on unless
    /// `--no-console` was given.
    pub async fn from_config(
        config: AppConfig,
        regions: Vec<RegionInfo>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let manager = Arc::new(ModuleManager::new(default_registry()?));
        let module_config = config.to_module_config()?;
        manager
            .load_modules(&config.simulator.modules, &module_config)
            .await?;

        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        Ok(Self {
            config,
            regions,
            console_enabled: false,
            manager,
            scenes: Arc::new(DashMap::new()),
            frame_tasks: HashMap::new(),
            requests_tx,
            requests_rx,
            shutdown_state: ShutdownState::new(),
        })
    }

    pub fn scenes(&self) -> SceneTable {
        self.scenes.clone()
    }

    pub fn manager(&self) -> Arc<ModuleManager> {
        self.manager.clone()
    }

    pub fn shutdown_state(&self) -> ShutdownState {
        self.shutdown_state.clone()
    }

    /// Runs the simulator until shutdown.
    pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Region Simulator");
        self.log_configuration_summary();
        self.start_regions().await;

        let mut console = CommandConsole::new(self.scenes.clone(), self.manager.clone());
        let mut console_lines = self.console_enabled.then(spawn_console_reader);

        let signal_handle = {
            let shutdown_state = self.shutdown_state.clone();
            tokio::spawn(async move {
                if let Err(e) = wait_for_signal(&shutdown_state).await {
                    error!("❌ Failed to set up shutdown signal handler: {e}");
                }
            })
        };

        info!("✅ Region simulator is now running!");
        if console_lines.is_some() {
            info!("⌨️ Console ready - type 'help' for a list of commands");
        }
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        let shutdown_state = self.shutdown_state.clone();
        loop {
            tokio::select! {
                _ = shutdown_state.wait_for_shutdown() => break,
                request = self.requests_rx.recv() => match request {
                    Some(request) => {
                        if self.handle_request(request).await {
                            break;
                        }
                    }
                    None => break,
                },
                line = next_console_line(&mut console_lines) => match line {
                    Some(line) => {
                        let output = console.execute(&line).await;
                        for line in &output.lines {
                            println!("{line}");
                        }
                        if output.quit {
                            shutdown_state.initiate_shutdown();
                            break;
                        }
                    }
                    None => {
                        info!("⌨️ Console input closed");
                        console_lines = None;
                    }
                },
            }
        }
        signal_handle.abort();

        // merciless shutdown
        tokio::spawn(async move {
            if let Err(e) = wait_for_signal_silent().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        info!("🛑 Beginning graceful shutdown...");

        info!("🏝️ Phase 1: Stopping regions...");
        self.stop_all_regions().await;

        info!("🔌 Phase 2: Closing region modules...");
        self.manager.shutdown().await;
        self.shutdown_state.complete_shutdown();

        info!("✅ Region simulator shutdown complete");
        Ok(())
    }

    /// Brings up every configured region.
    pub async fn start_regions(&mut self) {
        for info in self.regions.clone() {
            self.start_region(info).await;
        }
    }

    async fn start_region(&mut self, info: RegionInfo) -> Arc<Scene> {
        let region_id = info.region_id;
        let scene = Arc::new(Scene::new(info, self.requests_tx.clone()));
        self.scenes.insert(region_id, scene.clone());

        // Modules see add_region then region_loaded; stale markers go here
        self.manager.add_region(scene.clone()).await;
        scene.announce_started().await;

        let frame_interval = Duration::from_millis(self.config.simulator.frame_interval_ms);
        let task = tokio::spawn(run_frame_loop(scene.clone(), frame_interval));
        if let Some(previous) = self.frame_tasks.insert(region_id, task) {
            previous.abort();
        }

        info!("🏝️ Region {} ({}) is up", scene.name(), region_id);
        scene
    }

    async fn stop_region(&mut self, region_id: RegionId, restarting: bool) -> Option<RegionInfo> {
        if let Some(task) = self.frame_tasks.remove(&region_id) {
            task.abort();
        }
        let (_, scene) = self.scenes.remove(&region_id)?;
        stop_scene(&self.manager, &scene, restarting).await;
        Some(scene.region_info())
    }

    async fn stop_all_regions(&mut self) {
        for (_, task) in self.frame_tasks.drain() {
            task.abort();
        }
        let scenes: Vec<Arc<Scene>> = self
            .scenes
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.scenes.clear();

        let manager = &self.manager;
        join_all(scenes.iter().map(|scene| stop_scene(manager, scene, false))).await;
    }

    /// Carries out a scene's lifecycle request. Returns true when the
    /// simulator should shut down.
    pub async fn handle_request(&mut self, request: SceneRequest) -> bool {
        match request {
            SceneRequest::Restart(region_id) => {
                match self.stop_region(region_id, true).await {
                    Some(info) => {
                        let scene = self.start_region(info).await;
                        info!("🔄 Region {} restarted", scene.name());
                    }
                    None => warn!("⚠️ Restart requested for unknown region {}", region_id),
                }
                false
            }
            SceneRequest::Shutdown(region_id) => {
                let name = self
                    .scenes
                    .get(&region_id)
                    .map(|scene| scene.name().to_string())
                    .unwrap_or_else(|| region_id.to_string());
                info!("🛑 Region {} restarted in-world; shutting the simulator down", name);
                self.shutdown_state.initiate_shutdown();
                true
            }
        }
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!(
            "  🎞️ Frame interval: {}ms",
            self.config.simulator.frame_interval_ms
        );
        for region in &self.regions {
            info!("  🏝️ Region: {} ({})", region.region_name, region.region_id);
        }
        info!("  🧩 Modules: {}", self.manager.module_names().join(", "));
        info!(
            "  📍 Restart markers: {}",
            self.config.restart.marker_path.as_deref().unwrap_or("disabled")
        );
        info!(
            "  ⏩ Skip delay on empty region: {} | 🛑 In-world restart shuts down: {}",
            self.config.startup.skip_delay_on_empty_region,
            self.config.startup.inworld_restart_shuts_down
        );
    }
}

async fn stop_scene(manager: &ModuleManager, scene: &Arc<Scene>, restarting: bool) {
    scene.announce_stopped(restarting).await;
    manager.remove_region(scene.clone()).await;

    let stats = scene.events().get_stats().await;
    info!(
        "📊 Region {} stopped after {} frame(s), {} event(s) emitted",
        scene.name(),
        scene.frame(),
        stats.events_emitted
    );
}

fn spawn_console_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("⚠️ Failed to read console input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

async fn next_console_line(lines: &mut Option<mpsc::Receiver<String>>) -> Option<String> {
    match lines {
        Some(lines) => lines.recv().await,
        None => std::future::pending().await,
    }
}
