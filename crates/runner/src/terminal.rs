//! Terminal orchestration
//!
//! Wires the shared state to the three long-lived tasks (router, dispatcher,
//! render loop) and owns the process-wide shutdown token.

use log::info;
use scalper_gateway::FeedSubscriber;
use scalper_ports::{ActivityLog, Clock, TradingApi};
use scalper_state::{LogBuffer, SharedState};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, TerminalConfig};
use crate::dispatcher::{Command, CommandDispatcher};
use crate::render::{FrameSink, RenderLoop};
use crate::router::{EventRouter, RouterStats};

#[derive(Error, Debug)]
pub enum TerminalError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("command queue closed")]
    CommandQueueClosed,
}

pub type Result<T> = std::result::Result<T, TerminalError>;

/// Totals reported by the tasks when they stop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalReport {
    pub router: RouterStats,
    pub commands: u64,
    pub frames: u64,
}

/// A configured terminal that has not started its tasks yet
pub struct Terminal {
    config: TerminalConfig,
    state: SharedState,
    log: Arc<LogBuffer>,
    shutdown: CancellationToken,
}

impl Terminal {
    pub fn new(config: TerminalConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: SharedState::new(clock),
            log: Arc::new(LogBuffer::new()),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn log(&self) -> Arc<LogBuffer> {
        self.log.clone()
    }

    /// Token that stops every task when cancelled; feed producers share it
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawn the router, dispatcher and render tasks
    pub fn start<F>(self, api: Arc<dyn TradingApi>, feed: FeedSubscriber, sink: F) -> RunningTerminal
    where
        F: FrameSink + 'static,
    {
        let log: Arc<dyn ActivityLog> = self.log.clone();
        let (command_tx, command_rx) = mpsc::channel(self.config.command_capacity);

        let dispatcher = CommandDispatcher::new(
            self.config.dispatch_config(),
            api.clone(),
            self.state.clone(),
            log.clone(),
        );
        let render = RenderLoop::new(
            self.config.render_config(),
            self.state.clone(),
            api,
            log,
            dispatcher.subscribe(),
        );
        let router = EventRouter::new(self.state.clone());

        info!(
            "Starting terminal: trading {} on {}",
            self.config.products.code(self.config.target_market),
            self.config.target_market
        );

        RunningTerminal {
            router: tokio::spawn(router.run(feed, self.shutdown.clone())),
            dispatcher: tokio::spawn(dispatcher.run(command_rx, self.shutdown.clone())),
            render: tokio::spawn(render.run(sink, self.shutdown.clone())),
            commands: command_tx,
            state: self.state,
            log: self.log,
            shutdown: self.shutdown,
        }
    }
}

/// Handles to a started terminal
pub struct RunningTerminal {
    router: JoinHandle<RouterStats>,
    dispatcher: JoinHandle<u64>,
    render: JoinHandle<u64>,
    commands: mpsc::Sender<Command>,
    state: SharedState,
    log: Arc<LogBuffer>,
    shutdown: CancellationToken,
}

impl RunningTerminal {
    /// Queue a command; waits while the queue is full
    pub async fn submit(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| TerminalError::CommandQueueClosed)
    }

    /// Sender for producers that outlive a borrow of the terminal
    pub fn commands(&self) -> mpsc::Sender<Command> {
        self.commands.clone()
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn log(&self) -> Arc<LogBuffer> {
        self.log.clone()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancel every task and wait for them to finish
    pub async fn shutdown(self) -> Result<TerminalReport> {
        self.shutdown.cancel();
        drop(self.commands);

        let router = self.router.await?;
        let commands = self.dispatcher.await?;
        let frames = self.render.await?;
        info!(
            "Terminal stopped: {} events routed, {} commands, {} frames",
            router.total(),
            commands,
            frames
        );
        Ok(TerminalReport {
            router,
            commands,
            frames,
        })
    }
}
