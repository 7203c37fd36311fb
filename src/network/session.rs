//! Session Manager
//!
//! Keeps one controller connection alive on a dedicated thread.
//!
//! ## Cycle
//! Every idle interval the worker thread either connects (when
//! disconnected) or, when connected:
//! 1. sends a health check if the cycle counter hits the cadence,
//! 2. polls for one inbound message,
//! 3. sends at most one queued outbound message.
//!
//! A transport failure aborts the cycle, drops the connection and adds the
//! retry cooldown on top of the idle sleep.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{ElipError, Result};
use crate::protocol::{InboundMessage, OutboundMessage};
use super::transport::{TcpTransport, Transport};

/// Callback for messages received from the controller
pub type InboundHandler = Box<dyn FnMut(InboundMessage) + Send>;

/// Connection lifecycle as seen by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Result of a single cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
    Completed,
    TransportFailure,
}

/// Persistent session with one E-LIP controller
///
/// ## Concurrency
/// - `outbound`: crossbeam channel, many producers, the worker is the only
///   consumer
/// - `running`: cooperative stop flag, checked once per cycle
/// - all methods take `&self`; share a session through `Arc`
pub struct Session<T: Transport = TcpTransport> {
    /// Producer side of the outbound FIFO
    outbound: Sender<OutboundMessage>,

    /// Cleared to ask the worker to exit
    running: Arc<AtomicBool>,

    /// Worker state while no thread is running
    parked: Mutex<Option<Worker<T>>>,

    /// Worker thread, present while running
    handle: Mutex<Option<JoinHandle<Worker<T>>>>,
}

impl Session<TcpTransport> {
    /// Create a session talking TCP to the configured controller
    pub fn tcp(config: Config) -> Result<Self> {
        let transport = TcpTransport::new(&config);
        Self::new(config, transport)
    }
}

impl<T: Transport> Session<T> {
    /// Create a stopped session over the given transport
    pub fn new(config: Config, transport: T) -> Result<Self> {
        config.validate()?;

        let (outbound, queue) = channel::unbounded();
        let running = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            transport,
            queue,
            running: Arc::clone(&running),
            on_inbound: Box::new(|_| {}),
            state: ConnectionState::Disconnected,
            cycle: 0,
            in_flight: None,
            health_check_cycle: config.health_check_cycle(),
            idle_interval: config.idle_interval,
            retry_cooldown: config.retry_cooldown,
        };

        Ok(Self {
            outbound,
            running,
            parked: Mutex::new(Some(worker)),
            handle: Mutex::new(None),
        })
    }

    /// Install a callback for inbound messages
    ///
    /// Runs on the worker thread. A panic inside it is logged and the
    /// session keeps running.
    pub fn with_inbound_handler<F>(self, handler: F) -> Self
    where
        F: FnMut(InboundMessage) + Send + 'static,
    {
        if let Some(worker) = self.parked.lock().as_mut() {
            worker.on_inbound = Box::new(handler);
        }
        self
    }

    /// Launch the worker thread
    ///
    /// If the thread cannot be spawned the worker is gone with it: the
    /// session can no longer be started and every later `start` fails.
    pub fn start(&self) -> Result<()> {
        self.start_with(|worker| {
            thread::Builder::new()
                .name("elip-session".to_string())
                .spawn(move || worker.run())
        })
    }

    fn start_with<F>(&self, spawn: F) -> Result<()>
    where
        F: FnOnce(Worker<T>) -> std::io::Result<JoinHandle<Worker<T>>>,
    {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            return Err(ElipError::Session("session already running".to_string()));
        }

        let worker = self
            .parked
            .lock()
            .take()
            .ok_or_else(|| ElipError::Session("session worker was lost".to_string()))?;

        // Raised before the spawn so the worker's first check sees it
        self.running.store(true, Ordering::Release);

        match spawn(worker) {
            Ok(spawned) => {
                *handle = Some(spawned);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                tracing::error!("Failed to spawn session worker: {}", e);
                Err(e.into())
            }
        }
    }

    /// Ask the worker to exit and wait until it has closed the connection
    ///
    /// No-op when the session is not running.
    pub fn stop(&self) {
        let mut handle = self.handle.lock();
        let Some(worker_thread) = handle.take() else {
            return;
        };

        self.running.store(false, Ordering::Release);

        match worker_thread.join() {
            Ok(worker) => *self.parked.lock() = Some(worker),
            Err(_) => tracing::error!("Session worker thread panicked"),
        }
    }

    /// Enqueue a message for the controller (never blocks)
    ///
    /// Messages are sent in enqueue order, one per connected cycle.
    pub fn send(&self, message: impl Into<OutboundMessage>) {
        let message = message.into();
        tracing::debug!("Queued message: {}", message);

        // Only fails once the worker, and its receiver, has been lost
        if let Err(e) = self.outbound.send(message) {
            tracing::warn!("Session worker is gone, dropping message: {}", e.into_inner());
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Messages waiting to be sent
    pub fn pending(&self) -> usize {
        self.outbound.len()
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Worker
// =============================================================================

/// State owned by the session thread
struct Worker<T: Transport> {
    transport: T,
    queue: Receiver<OutboundMessage>,
    running: Arc<AtomicBool>,
    on_inbound: InboundHandler,
    state: ConnectionState,

    /// Cycles run since start
    cycle: u64,

    /// Dequeued message whose send failed; goes out first after reconnect
    in_flight: Option<OutboundMessage>,

    health_check_cycle: u64,
    idle_interval: Duration,
    retry_cooldown: Duration,
}

impl<T: Transport> Worker<T> {
    /// Thread body. Returns the worker so the session can be restarted.
    fn run(mut self) -> Self {
        tracing::info!("Starting connection to E-LIP");
        self.cycle = 0;

        while self.running.load(Ordering::Acquire) {
            if self.tick() == CycleOutcome::TransportFailure {
                thread::sleep(self.retry_cooldown);
            }
            thread::sleep(self.idle_interval);
        }

        self.transport.close();
        self.state = ConnectionState::Disconnected;
        tracing::info!("Stopping connection to E-LIP");
        self
    }

    /// One cycle plus failure handling, without the sleeps
    fn tick(&mut self) -> CycleOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run_cycle()));

        let outcome = match result {
            Ok(Ok(())) => CycleOutcome::Completed,
            Ok(Err(e)) if e.is_transport_failure() => {
                tracing::error!("Transport failure, dropping connection: {}", e);
                self.disconnect();
                CycleOutcome::TransportFailure
            }
            Ok(Err(e)) => {
                tracing::error!("Unexpected failure: {}", e);
                CycleOutcome::Completed
            }
            Err(_) => {
                tracing::error!("Unexpected panic during session cycle");
                CycleOutcome::Completed
            }
        };

        self.cycle = self.cycle.wrapping_add(1);
        outcome
    }

    fn run_cycle(&mut self) -> Result<()> {
        if self.state == ConnectionState::Disconnected || !self.transport.is_connected() {
            self.state = ConnectionState::Disconnected;
            self.transport.connect()?;
            self.state = ConnectionState::Connected;
            return Ok(());
        }

        if self.cycle % self.health_check_cycle == 0 {
            let health_check = OutboundMessage::HealthCheck;
            tracing::debug!("Sending message: {}", health_check);
            self.transport.send(&health_check)?;
        }

        if let Some(message) = self.transport.receive()? {
            tracing::info!("Received message: {}", message);
            (self.on_inbound)(message);
        }

        let next = self.in_flight.take().or_else(|| self.queue.try_recv().ok());
        if let Some(message) = next {
            tracing::info!("Sending message: {}", message);
            if let Err(e) = self.transport.send(&message) {
                self.in_flight = Some(message);
                return Err(e);
            }
        }

        Ok(())
    }

    fn disconnect(&mut self) {
        self.transport.close();
        self.state = ConnectionState::Disconnected;
    }
}
