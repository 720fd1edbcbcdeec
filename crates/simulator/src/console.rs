//! Operator command console.
//!
//! Lines are tokenised (double quotes group words), matched against an
//! explicit command table by longest word prefix and dispatched. Commands act
//! on the selected region, or on every region when none is selected
//! (`change region root`). Output is collected into a [`ConsoleOutput`]
//! instead of being printed, so the application decides where it goes.

use crate::scene::{Scene, SceneTable};
use module_restart::{format_countdown, RestartCommand, RestartModule};
use module_system::ModuleManager;
use module_weather::WindModule;
use region_event_system::{AgentId, RegionId, SceneContext};
use std::sync::Arc;
use tracing::debug;

/// Lines produced by one console command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleOutput {
    pub lines: Vec<String>,
    /// The operator asked the simulator to shut down
    pub quit: bool,
}

impl ConsoleOutput {
    fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            quit: false,
        }
    }

    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleAction {
    RegionRestart,
    ShowRegions,
    ShowModules,
    ShowEvents,
    ShowAgents,
    ChangeRegion,
    AgentAdd,
    AgentRemove,
    Wind,
    Help,
    Quit,
}

struct ConsoleCommand {
    words: &'static [&'static str],
    usage: &'static str,
    help: &'static str,
    action: ConsoleAction,
}

const COMMANDS: &[ConsoleCommand] = &[
    ConsoleCommand {
        words: &["region", "restart"],
        usage: "region restart <mode> ...",
        help: "Schedule, delay or abort region restarts",
        action: ConsoleAction::RegionRestart,
    },
    ConsoleCommand {
        words: &["show", "regions"],
        usage: "show regions",
        help: "List the hosted regions",
        action: ConsoleAction::ShowRegions,
    },
    ConsoleCommand {
        words: &["show", "modules"],
        usage: "show modules",
        help: "List loaded and available region modules",
        action: ConsoleAction::ShowModules,
    },
    ConsoleCommand {
        words: &["show", "events"],
        usage: "show events",
        help: "Show the event subscriptions of each region",
        action: ConsoleAction::ShowEvents,
    },
    ConsoleCommand {
        words: &["show", "agents"],
        usage: "show agents",
        help: "List root agents and their last message",
        action: ConsoleAction::ShowAgents,
    },
    ConsoleCommand {
        words: &["change", "region"],
        usage: "change region <name>|root",
        help: "Select the region console commands act on",
        action: ConsoleAction::ChangeRegion,
    },
    ConsoleCommand {
        words: &["agent", "add"],
        usage: "agent add <name>",
        help: "Place a root agent in the selected region",
        action: ConsoleAction::AgentAdd,
    },
    ConsoleCommand {
        words: &["agent", "remove"],
        usage: "agent remove <name>",
        help: "Remove a root agent from the selected region",
        action: ConsoleAction::AgentRemove,
    },
    ConsoleCommand {
        words: &["wind"],
        usage: "wind [<param> [<value>]]",
        help: "Show or set wind model parameters",
        action: ConsoleAction::Wind,
    },
    ConsoleCommand {
        words: &["help"],
        usage: "help",
        help: "Show this list",
        action: ConsoleAction::Help,
    },
    ConsoleCommand {
        words: &["quit"],
        usage: "quit",
        help: "Shut the simulator down",
        action: ConsoleAction::Quit,
    },
    ConsoleCommand {
        words: &["shutdown"],
        usage: "shutdown",
        help: "Shut the simulator down",
        action: ConsoleAction::Quit,
    },
];

/// Splits a console line into words; double quotes group words together.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                has_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}

fn find_command(tokens: &[String]) -> Option<&'static ConsoleCommand> {
    COMMANDS
        .iter()
        .filter(|command| {
            tokens.len() >= command.words.len()
                && command
                    .words
                    .iter()
                    .zip(tokens)
                    .all(|(word, token)| word.eq_ignore_ascii_case(token))
        })
        .max_by_key(|command| command.words.len())
}

pub struct CommandConsole {
    scenes: SceneTable,
    manager: Arc<ModuleManager>,
    current: Option<RegionId>,
}

impl CommandConsole {
    pub fn new(scenes: SceneTable, manager: Arc<ModuleManager>) -> Self {
        Self {
            scenes,
            manager,
            current: None,
        }
    }

    pub fn current_region(&self) -> Option<RegionId> {
        self.current
    }

    /// Runs one console line.
    pub async fn execute(&mut self, line: &str) -> ConsoleOutput {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            return ConsoleOutput::default();
        }

        let Some(command) = find_command(&tokens) else {
            return ConsoleOutput::line(format!(
                "Invalid command: {}. Type 'help' for a list of commands",
                line.trim()
            ));
        };
        debug!("⌨️ Console command: {}", command.usage);

        match command.action {
            ConsoleAction::RegionRestart => self.region_restart(&tokens).await,
            ConsoleAction::ShowRegions => self.show_regions().await,
            ConsoleAction::ShowModules => self.show_modules(),
            ConsoleAction::ShowEvents => self.show_events().await,
            ConsoleAction::ShowAgents => self.show_agents(),
            ConsoleAction::ChangeRegion => self.change_region(&tokens[2..]),
            ConsoleAction::AgentAdd => self.agent_add(&tokens[2..]),
            ConsoleAction::AgentRemove => self.agent_remove(&tokens[2..]),
            ConsoleAction::Wind => self.wind(&tokens[1..]).await,
            ConsoleAction::Help => help(),
            ConsoleAction::Quit => ConsoleOutput {
                lines: vec!["Shutting down".to_string()],
                quit: true,
            },
        }
    }

    /// The selected scene, or every scene sorted by name.
    fn target_scenes(&self) -> Vec<Arc<Scene>> {
        if let Some(region_id) = self.current {
            if let Some(scene) = self.scenes.get(&region_id) {
                return vec![scene.value().clone()];
            }
        }

        let mut scenes: Vec<_> = self
            .scenes
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        scenes.sort_by(|a, b| a.name().cmp(b.name()));
        scenes
    }

    fn single_scene(&self) -> Result<Arc<Scene>, String> {
        let mut scenes = self.target_scenes();
        match scenes.len() {
            1 => Ok(scenes.remove(0)),
            0 => Err("No regions are running".to_string()),
            _ => Err("Select a region first with 'change region <name>'".to_string()),
        }
    }

    async fn region_restart(&self, tokens: &[String]) -> ConsoleOutput {
        // Parsed once, before any region is touched
        let command = match RestartCommand::parse(tokens) {
            Ok(command) => command,
            Err(e) => return ConsoleOutput::line(e.to_string()),
        };
        let Some(restart) = self.manager.get::<RestartModule>() else {
            return ConsoleOutput::line("RestartModule is not loaded");
        };

        let mut output = ConsoleOutput::default();
        for scene in self.target_scenes() {
            match restart
                .execute(scene.region_id(), AgentId::SYSTEM, &command)
                .await
            {
                Ok(line) => output.push(line),
                Err(e) => output.push(format!("{}: {}", scene.name(), e)),
            }
        }
        output
    }

    async fn show_regions(&self) -> ConsoleOutput {
        let restart = self.manager.get::<RestartModule>();
        let mut output = ConsoleOutput::default();

        for scene in self.target_scenes() {
            let mut line = format!(
                "{} ({}): {} agent(s), frame {}",
                scene.name(),
                scene.region_id(),
                scene.root_agent_count(),
                scene.frame()
            );
            if let Some(restart) = &restart {
                if let Ok(Some(remaining)) = restart.time_until_restart(scene.region_id()).await {
                    let seconds = remaining.as_secs_f64().ceil() as u64;
                    line.push_str(&format!(", restart in {}", format_countdown(seconds)));
                }
            }
            output.push(line);
        }

        if output.lines.is_empty() {
            output.push("No regions are running");
        }
        output
    }

    fn show_modules(&self) -> ConsoleOutput {
        let mut output = ConsoleOutput::line("Loaded modules:");
        for name in self.manager.module_names() {
            output.push(format!("  {}", name));
        }
        for name in self.manager.registry().names() {
            if !self.manager.is_module_loaded(&name) {
                output.push(format!("  {} (not loaded)", name));
            }
        }
        output
    }

    async fn show_events(&self) -> ConsoleOutput {
        let mut output = ConsoleOutput::default();
        for scene in self.target_scenes() {
            let events = scene.events();
            let stats = events.get_stats().await;
            output.push(format!(
                "{}: {} handler(s), {} event(s) emitted",
                scene.name(),
                stats.total_handlers,
                stats.events_emitted
            ));
            for (key, handlers) in events.subscriptions() {
                output.push(format!("  {} -> {}", key, handlers.join(", ")));
            }
        }
        output
    }

    fn show_agents(&self) -> ConsoleOutput {
        let mut output = ConsoleOutput::default();
        for scene in self.target_scenes() {
            output.push(format!("{}:", scene.name()));
            for (agent_id, name) in scene.agents() {
                let inbox = scene.inbox(agent_id).unwrap_or_default();
                match inbox.last() {
                    Some(message) => output.push(format!(
                        "  {} ({} message(s), last: {})",
                        name,
                        inbox.len(),
                        message.text
                    )),
                    None => output.push(format!("  {} (no messages)", name)),
                }
            }
        }
        output
    }

    fn change_region(&mut self, args: &[String]) -> ConsoleOutput {
        let name = args.join(" ");
        if name.is_empty() {
            return ConsoleOutput::line("Usage: change region <name>|root");
        }
        if name.eq_ignore_ascii_case("root") || name == ".." {
            self.current = None;
            return ConsoleOutput::line("Currently selected region is root");
        }

        let found = self
            .scenes
            .iter()
            .find(|entry| entry.value().name().eq_ignore_ascii_case(&name))
            .map(|entry| (*entry.key(), entry.value().name().to_string()));
        match found {
            Some((region_id, region_name)) => {
                self.current = Some(region_id);
                ConsoleOutput::line(format!("Currently selected region is {}", region_name))
            }
            None => ConsoleOutput::line(format!("Couldn't select region {}", name)),
        }
    }

    fn agent_add(&self, args: &[String]) -> ConsoleOutput {
        let name = args.join(" ");
        if name.is_empty() {
            return ConsoleOutput::line("Usage: agent add <name>");
        }
        match self.single_scene() {
            Ok(scene) => {
                scene.add_agent(name.clone());
                ConsoleOutput::line(format!("{} entered {}", name, scene.name()))
            }
            Err(e) => ConsoleOutput::line(e),
        }
    }

    fn agent_remove(&self, args: &[String]) -> ConsoleOutput {
        let name = args.join(" ");
        let scene = match self.single_scene() {
            Ok(scene) => scene,
            Err(e) => return ConsoleOutput::line(e),
        };
        match scene.find_agent(&name) {
            Some(agent_id) => {
                scene.remove_agent(agent_id);
                ConsoleOutput::line(format!("{} left {}", name, scene.name()))
            }
            None => ConsoleOutput::line(format!("No agent named {} in {}", name, scene.name())),
        }
    }

    async fn wind(&self, args: &[String]) -> ConsoleOutput {
        let Some(wind) = self.manager.get::<WindModule>() else {
            return ConsoleOutput::line("WindModule is not loaded");
        };

        let value = match args.get(1) {
            Some(raw) => match raw.parse::<f32>() {
                Ok(value) => Some(value),
                Err(_) => return ConsoleOutput::line(format!("Error: {} is not a valid number", raw)),
            },
            None => None,
        };

        let mut output = ConsoleOutput::default();
        for scene in self.target_scenes() {
            let region_id = scene.region_id();
            let model = wind.model_name(region_id).await.unwrap_or("none");
            let line = match (args.first(), value) {
                (None, _) => match wind.params(region_id).await {
                    Ok(params) => {
                        let params: Vec<String> = params
                            .iter()
                            .map(|(param, value)| format!("{}={}", param, value))
                            .collect();
                        format!("{}: {} {}", scene.name(), model, params.join(" "))
                    }
                    Err(e) => format!("{}: {}", scene.name(), e),
                },
                (Some(param), None) => match wind.get_param(region_id, param).await {
                    Ok(value) => format!("{}: {} {} = {}", scene.name(), model, param, value),
                    Err(e) => format!("{}: {}", scene.name(), e),
                },
                (Some(param), Some(value)) => match wind.set_param(region_id, param, value).await {
                    Ok(()) => format!("{}: {} set to {}", scene.name(), param, value),
                    Err(e) => format!("{}: {}", scene.name(), e),
                },
            };
            output.push(line);
        }
        output
    }
}

fn help() -> ConsoleOutput {
    let mut output = ConsoleOutput::line("Commands:");
    for command in COMMANDS
        .iter()
        .filter(|command| command.action != ConsoleAction::RegionRestart)
    {
        output.push(format!("  {:<50} {}", command.usage, command.help));
    }
    for (usage, text) in module_restart::command::HELP {
        output.push(format!("  {:<50} {}", usage, text));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::default_registry;
    use crate::scene::SceneRequest;
    use dashmap::DashMap;
    use region_event_system::{ModuleConfig, RegionInfo};
    use tokio::sync::mpsc;

    struct Fixture {
        console: CommandConsole,
        scenes: Vec<Arc<Scene>>,
        manager: Arc<ModuleManager>,
        _requests: mpsc::UnboundedReceiver<SceneRequest>,
    }

    async fn fixture(regions: &[&str]) -> Fixture {
        let registry = default_registry().unwrap();
        let manager = Arc::new(ModuleManager::new(registry));
        let names: Vec<String> = ["RestartModule", "WindModule"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        manager
            .load_modules(&names, &ModuleConfig::default())
            .await
            .unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        let table: SceneTable = Arc::new(DashMap::new());
        let mut scenes = Vec::new();
        for name in regions {
            let scene = Arc::new(Scene::new(RegionInfo::new(RegionId::new(), *name), tx.clone()));
            table.insert(scene.region_id(), scene.clone());
            manager.add_region(scene.clone()).await;
            scenes.push(scene);
        }

        Fixture {
            console: CommandConsole::new(table, manager.clone()),
            scenes,
            manager,
            _requests: rx,
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("  show   regions "), vec!["show", "regions"]);
        assert_eq!(
            tokenize(r#"region restart notice "Restart in {0}" 60 30"#),
            vec!["region", "restart", "notice", "Restart in {0}", "60", "30"]
        );
        assert_eq!(tokenize(r#"region restart abort """#), vec!["region", "restart", "abort", ""]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let tokens = tokenize("show regions");
        assert_eq!(find_command(&tokens).unwrap().action, ConsoleAction::ShowRegions);
        let tokens = tokenize("WIND strength 2");
        assert_eq!(find_command(&tokens).unwrap().action, ConsoleAction::Wind);
        assert!(find_command(&tokenize("show")).is_none());
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let mut f = fixture(&["Alpha"]).await;
        let output = f.console.execute("fly away").await;
        assert_eq!(
            output.lines,
            vec!["Invalid command: fly away. Type 'help' for a list of commands"]
        );
        assert!(!output.quit);
        f.manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_help_lists_restart_subcommands() {
        let mut f = fixture(&[]).await;
        let output = f.console.execute("help").await;
        assert!(output.lines.iter().any(|line| line.contains("region restart abort")));
        assert!(output.lines.iter().any(|line| line.contains("show events")));
    }

    #[tokio::test]
    async fn test_region_restart_schedules_each_region() {
        let mut f = fixture(&["Beta", "Alpha"]).await;

        let output = f
            .console
            .execute(r#"region restart notice "Restarting in {0}" 120 60"#)
            .await;
        assert_eq!(
            output.lines,
            vec![
                "Restart of Alpha scheduled in 2 minutes",
                "Restart of Beta scheduled in 2 minutes",
            ]
        );

        let restart = f.manager.get::<RestartModule>().unwrap();
        for scene in &f.scenes {
            let status = restart.status(scene.region_id()).await.unwrap();
            assert!(status.is_active());
        }

        let output = f.console.execute("region restart abort").await;
        assert_eq!(output.lines.len(), 2);
        for scene in &f.scenes {
            assert!(!restart.status(scene.region_id()).await.unwrap().is_active());
        }
        f.manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_restart_changes_nothing() {
        let mut f = fixture(&["Alpha"]).await;

        let output = f.console.execute("region restart bluebox msg 30 soon").await;
        assert_eq!(output.lines, vec!["Error: soon is not a valid number"]);

        let output = f.console.execute("region restart").await;
        assert_eq!(output.lines, vec![module_restart::command::USAGE]);

        let restart = f.manager.get::<RestartModule>().unwrap();
        let status = restart.status(f.scenes[0].region_id()).await.unwrap();
        assert!(!status.is_active());
        f.manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_change_region_scopes_commands() {
        let mut f = fixture(&["Alpha", "Beta"]).await;

        let output = f.console.execute("change region beta").await;
        assert_eq!(output.lines, vec!["Currently selected region is Beta"]);
        assert_eq!(f.console.current_region(), Some(f.scenes[1].region_id()));

        let output = f.console.execute("region restart bluebox bye 300").await;
        assert_eq!(output.lines, vec!["Restart of Beta scheduled in 5 minutes"]);

        let output = f.console.execute("change region Gamma").await;
        assert_eq!(output.lines, vec!["Couldn't select region Gamma"]);

        let output = f.console.execute("change region root").await;
        assert_eq!(output.lines, vec!["Currently selected region is root"]);
        assert_eq!(f.console.current_region(), None);

        let output = f.console.execute("show regions").await;
        assert_eq!(output.lines.len(), 2);
        assert!(output.lines[0].starts_with("Alpha ("));
        assert!(!output.lines[0].contains("restart in"));
        assert!(output.lines[1].contains("restart in 5 minutes"));
        f.manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_agents_need_a_single_region() {
        let mut f = fixture(&["Alpha", "Beta"]).await;

        let output = f.console.execute("agent add Ada Lovelace").await;
        assert_eq!(output.lines, vec!["Select a region first with 'change region <name>'"]);

        f.console.execute("change region Alpha").await;
        let output = f.console.execute("agent add Ada Lovelace").await;
        assert_eq!(output.lines, vec!["Ada Lovelace entered Alpha"]);
        assert_eq!(f.scenes[0].root_agent_count(), 1);

        let output = f.console.execute("agent remove ada lovelace").await;
        assert_eq!(output.lines, vec!["ada lovelace left Alpha"]);
        assert_eq!(f.scenes[0].root_agent_count(), 0);
        f.manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_wind_params() {
        let mut f = fixture(&["Alpha"]).await;

        let output = f.console.execute("wind strength 2.5").await;
        assert_eq!(output.lines, vec!["Alpha: strength set to 2.5"]);

        let output = f.console.execute("wind strength").await;
        assert_eq!(output.lines, vec!["Alpha: SimpleRandomWind strength = 2.5"]);

        let output = f.console.execute("wind").await;
        assert_eq!(output.lines, vec!["Alpha: SimpleRandomWind strength=2.5"]);

        let output = f.console.execute("wind gustiness 1").await;
        assert!(output.lines[0].contains("no parameter 'gustiness'"));

        let output = f.console.execute("wind strength strong").await;
        assert_eq!(output.lines, vec!["Error: strong is not a valid number"]);
        f.manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_show_modules_and_events() {
        let mut f = fixture(&["Alpha"]).await;

        let output = f.console.execute("show modules").await;
        assert_eq!(
            output.lines,
            vec![
                "Loaded modules:",
                "  RestartModule",
                "  WindModule",
                "  CloudModule (not loaded)",
            ]
        );

        let output = f.console.execute("show events").await;
        assert!(output.lines[0].starts_with("Alpha:"));
        assert!(output
            .lines
            .iter()
            .any(|line| line.starts_with("  core:frame -> ") && line.contains("WindModule")));
        f.manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_quit() {
        let mut f = fixture(&[]).await;
        let output = f.console.execute("quit").await;
        assert!(output.quit);
        assert!(f.console.execute("").await.lines.is_empty());
    }
}
