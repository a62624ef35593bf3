// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::{Context, Result};
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::Config;
use crate::modbus::serve_registers;
use crate::sync::SyncLoop;
use crate::telemetry::TelemetrySimulator;
use crate::utility::RegisterBlock;

/// Represents a daemon task that can be started and managed
///
/// The daemon owns the register block shared by the sync loop and the Modbus
/// server, plus the optional telemetry simulator feeding the watched directory.
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    running: Arc<AtomicBool>,
    registers: RegisterBlock,
    modbus_addr: Option<SocketAddr>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Self {
        Daemon {
            tasks: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            registers: RegisterBlock::default(),
            modbus_addr: None,
        }
    }

    /// Launch all configured tasks based on configuration
    ///
    /// The register block is sized from `modbus.register_count` before any task
    /// starts. Startup failures (unreadable indexed directory, unbindable Modbus
    /// address) are returned to the caller instead of being logged by a task.
    pub async fn launch(&mut self, config: &Config) -> Result<()> {
        self.registers = RegisterBlock::new(config.modbus.register_count);

        // The simulator goes first so the watched directory starts filling up
        if config.simulator.enabled {
            self.start_simulator(config)?;
        }

        if config.sync.enabled {
            self.start_sync_loop(config)?;
        }

        if config.modbus.enabled {
            self.start_modbus_server(config).await?;
        }

        Ok(())
    }

    /// Start the telemetry simulator task
    fn start_simulator(&mut self, config: &Config) -> Result<()> {
        info!(
            "Starting telemetry simulator for cabinet {}",
            config.simulator.cabinet_serial_number
        );
        std::fs::create_dir_all(&config.simulator.output_directory).with_context(|| {
            format!(
                "Cannot create simulator output directory {}",
                config.simulator.output_directory.display()
            )
        })?;

        let simulator = TelemetrySimulator::new(&config.simulator);
        let running = self.running.clone();
        let task = tokio::spawn(async move {
            simulator.run(running).await;
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Start the directory-to-register sync task
    fn start_sync_loop(&mut self, config: &Config) -> Result<()> {
        info!(
            "Starting sync loop on {} in {:?} mode",
            config.sync.directory.display(),
            config.sync.mode
        );
        let sync_loop = SyncLoop::new(&config.sync, self.registers.clone())
            .context("Cannot initialise the sync loop")?;

        let running = self.running.clone();
        let task = tokio::spawn(async move {
            sync_loop.run(running).await;
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Launch the modbus server daemon
    ///
    /// The listener is bound here so that an address already in use is reported
    /// at startup. The accept loop then runs in its own task and is aborted once
    /// the running flag is cleared.
    async fn start_modbus_server(&mut self, config: &Config) -> Result<()> {
        info!(
            "Starting modbus server on {}:{}",
            config.modbus.address, config.modbus.port
        );
        let socket_addr: SocketAddr = format!("{}:{}", config.modbus.address, config.modbus.port)
            .parse()
            .with_context(|| {
                format!(
                    "Invalid Modbus socket address {}:{}",
                    config.modbus.address, config.modbus.port
                )
            })?;
        let listener = TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("Cannot bind Modbus server to {}", socket_addr))?;
        self.modbus_addr = Some(listener.local_addr()?);

        let registers = self.registers.clone();
        let running = self.running.clone();
        let task = tokio::spawn(async move {
            let server_handle = tokio::spawn(async move {
                if let Err(e) = serve_registers(listener, registers).await {
                    log::error!("Modbus server error: {}", e);
                }
            });

            while running.load(Ordering::SeqCst) {
                time::sleep(Duration::from_millis(200)).await;
            }

            info!("Shutting down Modbus server...");
            server_handle.abort();

            match time::timeout(Duration::from_secs(5), server_handle).await {
                Ok(_) => info!("Modbus server shut down successfully"),
                Err(_) => warn!("Modbus server shutdown timed out, forcing termination"),
            }
            Ok(())
        });

        self.tasks.push(task);
        info!("Modbus server started");
        Ok(())
    }

    /// Register block shared by the sync loop and the Modbus server
    pub fn registers(&self) -> RegisterBlock {
        self.registers.clone()
    }

    /// Address the Modbus server actually listens on, once launched
    ///
    /// Differs from the configured one when port 0 was requested.
    pub fn modbus_addr(&self) -> Option<SocketAddr> {
        self.modbus_addr
    }

    /// Stop all running tasks
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.running.store(false, Ordering::SeqCst);
        // Tasks should check the running flag and terminate gracefully
    }

    /// Wait for all tasks to complete
    ///
    /// Should be called after `shutdown()`. A task that panics or does not stop
    /// within 5 seconds is logged and skipped.
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match time::timeout(Duration::from_secs(5), task).await {
                Ok(Ok(Err(e))) => log::error!("Task failed: {:#}", e),
                Ok(Err(e)) => log::error!("Task panicked: {}", e),
                Ok(Ok(Ok(()))) => {}
                Err(_) => {
                    log::warn!("Task did not complete within timeout period, may be hung");
                }
            }
        }
        Ok(())
    }
}
