//! TCP command channel between the editor and the render process.
//!
//! The editor opens one connection per command, writes the command frame and
//! the mandatory disconnect frame, and closes. Fire and forget: connect/write
//! success is the only acknowledgement. The render process keeps one accept
//! loop alive for the whole session and hands every decoded command into the
//! single-threaded event loop over an mpsc channel; handler threads never
//! touch widget state themselves.

use std::fmt;
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::core::prelude::*;
use crate::protocol::command::Command;
use crate::protocol::frame::{decode_frame, encode_frame};

pub const CONNECT_RETRY_LIMIT: u32 = 10;
pub const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// The (host, port) pair both processes agree on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    pub fn loopback(port: u16) -> Self {
        Self::new("127.0.0.1", port)
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr())
    }
}

/// Seam between the command log and the transport, so undo/redo is testable
/// without sockets. [`CommandSender`] is the production implementation.
pub trait CommandSink {
    fn send(&self, command: &Command) -> Result<()>;
}

pub struct CommandSender {
    endpoint: Endpoint,
    retry_limit: u32,
    retry_interval: Duration,
}

impl CommandSender {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_retry(endpoint, CONNECT_RETRY_LIMIT, CONNECT_RETRY_INTERVAL)
    }

    pub fn with_retry(
        endpoint: Endpoint,
        retry_limit: u32,
        retry_interval: Duration,
    ) -> Self {
        Self { endpoint, retry_limit, retry_interval }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Blocks until a connection succeeds (retrying on the configured
    /// budget), then writes exactly one command frame followed by the
    /// disconnect frame and closes. [`Error::ChannelUnavailable`] means the
    /// render process is gone and the caller should abort the session.
    pub fn send_command(&self, command: &Command) -> Result<()> {
        let mut stream = self.connect()?;
        trace!("Sending {:?} to {}", command.operation(), self.endpoint);

        stream.write_all(&encode_frame(&command.encode()?))?;
        stream.write_all(&encode_frame(&Command::Disconnect.encode()?))?;
        stream.flush()?;
        Ok(())
    }

    fn connect(&self) -> Result<TcpStream> {
        let addr = self.endpoint.addr();

        for attempt in 1..=self.retry_limit {
            match TcpStream::connect(&addr) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!(
                        "Connect attempt {}/{} to {} failed: {}",
                        attempt, self.retry_limit, addr, e
                    );
                }
            }
            if attempt < self.retry_limit {
                thread::sleep(self.retry_interval);
            }
        }

        Err(Error::ChannelUnavailable {
            endpoint: addr,
            attempts: self.retry_limit,
        })
    }
}

impl CommandSink for CommandSender {
    fn send(&self, command: &Command) -> Result<()> {
        self.send_command(command)
    }
}

/// Accept loop handle. The loop thread runs for the lifetime of the process;
/// dropping the handle does not tear the listener down.
pub struct CommandListener {
    port: u16,
}

impl CommandListener {
    /// Binds the endpoint and spawns the accept loop. Binding failure is
    /// fatal for the caller — the usual cause is a second render process on
    /// the same port, and the error is returned rather than retried.
    pub fn spawn(
        endpoint: &Endpoint,
        commands: mpsc::Sender<Command>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(endpoint.addr())?;
        let port = listener.local_addr()?.port();
        info!("Command listener bound on port {}", port);

        thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        let commands = commands.clone();
                        thread::spawn(move || {
                            if let Err(e) = handle_connection(stream, commands)
                            {
                                // Isolated per connection; the accept loop
                                // itself must survive.
                                warn!("Dropping connection: {}", e);
                            }
                        });
                    }
                    Err(e) => warn!("Accept failed: {}", e),
                }
            }
        });

        Ok(Self { port })
    }

    /// The actually-bound port (useful when spawned on port 0).
    pub fn port(&self) -> u16 {
        self.port
    }
}

fn handle_connection(
    mut stream: TcpStream,
    commands: mpsc::Sender<Command>,
) -> Result<()> {
    loop {
        let payload = match decode_frame(&mut stream) {
            Ok(payload) => payload,
            Err(e) if e.is_truncated_frame() => {
                // Partial frame means "no command", not a fatal error.
                trace!("Connection closed mid-frame: {}", e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let command = Command::decode(&payload)?;
        if command.is_disconnect() {
            return Ok(());
        }
        if commands.send(command).is_err() {
            // Event loop is gone; nothing left to dispatch to.
            return Ok(());
        }
    }
}
