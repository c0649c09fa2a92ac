use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::non_interactive::NonInteractiveRunner;
use super::repl::{parse_input, render_message, ReplInput, HELP};
use crate::{
    app::{data_dir, load_config, load_config_from, Config, Identity},
    cli::{handle_command, list_models, list_sessions, report_persistence_failures, Cli},
    constants::is_supported_model,
    exchange::{ExchangeOutcome, HttpBackend, MessageExchange},
    session::{select_session, ChatState, MonotonicIds},
    store::FileStore,
    utils::log_status,
};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
    config: Config,
    store: Arc<FileStore>,
    state: ChatState,
    model: String,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let config = if let Some(config_path) = &cli.config {
            load_config_from(config_path)?
        } else {
            match load_config() {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("⚠️  Failed to load config: {}. Using defaults.", e);
                    Config::default()
                }
            }
        };

        let root = data_dir(&config.storage)?;
        let store = Arc::new(
            FileStore::open(&root, &config.storage.namespace)
                .with_context(|| format!("Failed to open session store in {}", root.display()))?,
        );
        info!(dir = %store.dir().display(), "session store opened");

        let state = ChatState::load(store.clone(), Box::new(MonotonicIds::new()));

        // CLI argument overrides config
        let model = cli
            .model
            .clone()
            .unwrap_or_else(|| config.chat.default_model.clone());
        if !is_supported_model(&model) {
            eprintln!(
                "⚠️  {} is not on the model menu; sending it to the backend anyway.",
                model
            );
        }

        Ok(Self {
            cli,
            config,
            store,
            state,
            model,
        })
    }

    /// Run the orchestrator
    pub async fn run(mut self) -> Result<()> {
        if let Some(prompt) = self.cli.prompt.clone() {
            return self.run_prompt(prompt).await;
        }

        if let Some(command) = &self.cli.command {
            let storage_dir = self.store.dir().to_path_buf();
            if handle_command(
                command,
                &mut self.state,
                self.store.as_ref(),
                &self.config,
                &storage_dir,
            )? {
                return Ok(());
            }
            // Continue to chat for Commands::Chat
        }

        self.run_chat().await
    }

    async fn run_prompt(mut self, prompt: String) -> Result<()> {
        let identity = Identity::load(self.store.as_ref());
        let exchange = self.exchange()?;
        let runner = NonInteractiveRunner::new(exchange, self.model.clone());

        let result = runner
            .execute(&mut self.state, &prompt, identity.authenticated)
            .await;
        report_persistence_failures(&mut self.state);
        println!("{}", runner.format_result(&result, self.cli.output_format));

        // Exit with appropriate code
        if !result.succeeded() {
            std::process::exit(1);
        }
        Ok(())
    }

    /// Interactive chat loop on stdin/stdout
    async fn run_chat(mut self) -> Result<()> {
        let exchange = self.exchange()?;
        let mut identity = Identity::load(self.store.as_ref());

        println!(
            "💬 Chatbox | model: {} | session: {}",
            self.model.green(),
            self.state.active_label().green()
        );
        if identity.authenticated {
            println!("👤 {}", identity.greeting_name());
        } else {
            println!("Not logged in. Use /login <name> to start chatting.");
        }
        println!("Type /help for commands.\n");
        for message in self.state.active_messages() {
            println!("{}", render_message(message));
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_input(&line) {
                ReplInput::Say(content) => {
                    let before = self.state.active_messages().len();
                    if !content.trim().is_empty() && identity.authenticated {
                        log_status("⏳ waiting for reply...".dimmed());
                    }
                    let outcome = exchange
                        .send(&mut self.state, &content, &self.model, identity.authenticated)
                        .await;
                    self.print_new_messages(before, &outcome);
                }
                ReplInput::Retry => {
                    let before = self.state.active_messages().len();
                    if self.state.last_user_message().is_none() {
                        println!("Nothing to retry yet.");
                        continue;
                    }
                    log_status("⏳ retrying...".dimmed());
                    let outcome = exchange
                        .retry(&mut self.state, &self.model, identity.authenticated)
                        .await;
                    self.print_new_messages(before, &outcome);
                }
                ReplInput::New(label) => {
                    self.state.new_session(label.as_deref());
                    println!("Started {}", self.state.active_label().green());
                }
                ReplInput::Clear => {
                    self.state.reset_to_new_session();
                    println!("Started {}", self.state.active_label().green());
                }
                ReplInput::List => list_sessions(&mut self.state),
                ReplInput::Switch(id) => self.switch(&id),
                ReplInput::Pick => {
                    let active = self.state.active_id();
                    match select_session(self.state.sessions(), &active) {
                        Ok(Some(id)) => self.switch(&id),
                        Ok(None) => {}
                        Err(e) => println!("⚠️  Session picker failed: {}", e),
                    }
                }
                ReplInput::Rename(label) => {
                    if self.state.rename_active(&label) {
                        println!("Renamed to {}", self.state.active_label().green());
                    }
                }
                ReplInput::Delete(id) => {
                    let id = id.unwrap_or_else(|| self.state.active_id());
                    if !self.state.registry().contains(&id) {
                        println!("No session with id {}", id);
                        continue;
                    }
                    let label = self.state.registry().display_label(&id);
                    if self.state.delete(&id).is_some() {
                        println!(
                            "Deleted {}. Started {}",
                            label,
                            self.state.active_label().green()
                        );
                    } else {
                        println!("Deleted {}", label);
                    }
                }
                ReplInput::Export(dir) => {
                    let dir = dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
                    if let Err(e) = self.export_active(&dir) {
                        println!("⚠️  Export failed: {:#}", e);
                    }
                }
                ReplInput::Model(Some(model)) => {
                    if !is_supported_model(&model) {
                        println!("⚠️  {} is not on the model menu; using it anyway.", model);
                    }
                    self.model = model;
                    println!("Model: {}", self.model.green());
                }
                ReplInput::Model(None) => println!("Model: {}", self.model.green()),
                ReplInput::Models => list_models(&self.model),
                ReplInput::Login(name) => {
                    match Identity::login(self.store.as_ref(), &name) {
                        Ok(logged_in) => {
                            identity = logged_in;
                            println!("👤 Logged in as {}", identity.greeting_name());
                        }
                        Err(e) => println!("⚠️  Login failed: {}", e),
                    }
                }
                ReplInput::Logout => {
                    if let Err(e) = Identity::logout(self.store.as_ref()) {
                        println!("⚠️  Could not clear saved login: {}", e);
                    }
                    identity = Identity::default();
                    println!("Logged out");
                }
                ReplInput::Help => println!("{}", HELP),
                ReplInput::Quit => break,
                ReplInput::Invalid(input) => {
                    println!("Unknown command or missing argument: {} (try /help)", input);
                }
            }
            report_persistence_failures(&mut self.state);
        }

        Ok(())
    }

    fn exchange(&self) -> Result<MessageExchange> {
        let backend = HttpBackend::new(&self.config.backend)?;
        info!(url = %backend.url(), "using chat backend");
        Ok(MessageExchange::new(Box::new(backend)))
    }

    fn switch(&mut self, id: &str) {
        if !self.state.registry().contains(id) {
            println!("No session with id {}", id);
            return;
        }

        let messages = self.state.switch_to(id);
        println!("Switched to {}", self.state.active_label().green());
        for message in &messages {
            println!("{}", render_message(message));
        }
    }

    fn export_active(&mut self, dir: &Path) -> Result<()> {
        let id = self.state.active_id();
        let artifact = self
            .state
            .export(&id)
            .with_context(|| format!("No session with id {}", id))?;
        let path = artifact.write_to(dir)?;
        println!("Exported to {}", path.display());
        Ok(())
    }

    /// Print what an exchange appended. A reply that was redirected to
    /// another session is announced rather than shown.
    fn print_new_messages(&mut self, before: usize, outcome: &ExchangeOutcome) {
        match outcome {
            ExchangeOutcome::Replied {
                redirected: true,
                session_id,
            } => {
                let label = self.state.registry().display_label(session_id);
                println!("(reply delivered to {})", label);
            }
            ExchangeOutcome::Discarded { .. } => {
                println!("(reply dropped: its session was deleted)");
            }
            _ => {
                for message in self.state.active_messages().iter().skip(before) {
                    println!("{}", render_message(message));
                }
            }
        }
    }
}
