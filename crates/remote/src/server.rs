use crate::channel::{ChannelError, CommandSender, REPLY_TIMEOUT};
use crate::protocol::{
    INVALID_REQUEST, JSONRPC_VERSION, PARSE_ERROR, RENDER_UNAVAILABLE, RpcError, RpcRequest,
    RpcResponse, encode_output, parse_command,
};
use std::io::{self, BufRead, BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often blocked accepts and reads check the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Remote control server, not yet running.
///
/// Each connection is served on its own thread, one request at a time.
/// Every request still goes through the one `CommandSender`, so the render
/// thread remains the only writer of the scene.
pub struct RemoteServer {
    listener: TcpListener,
    reply_timeout: Duration,
}

impl RemoteServer {
    pub fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            reply_timeout: REPLY_TIMEOUT,
        })
    }

    /// Override how long a request waits for the render thread.
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Start serving on a background thread.
    pub fn spawn(self, sender: CommandSender) -> io::Result<ServerHandle> {
        let local_addr = self.listener.local_addr()?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let thread = thread::Builder::new()
            .name("lumen-remote".into())
            .spawn(move || self.run(&sender, &flag))?;
        tracing::info!(%local_addr, "remote server listening");
        Ok(ServerHandle {
            local_addr,
            shutdown,
            thread: Some(thread),
        })
    }

    fn run(self, sender: &CommandSender, shutdown: &Arc<AtomicBool>) {
        let mut connections: Vec<JoinHandle<()>> = Vec::new();
        while !shutdown.load(Ordering::Relaxed) {
            connections.retain(|c| !c.is_finished());
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    let sender = sender.clone();
                    let shutdown = Arc::clone(shutdown);
                    let reply_timeout = self.reply_timeout;
                    let spawned = thread::Builder::new()
                        .name(format!("lumen-remote-{peer}"))
                        .spawn(move || {
                            let _span = tracing::info_span!("remote_connection", %peer).entered();
                            tracing::debug!("client connected");
                            if let Err(e) = serve(stream, &sender, &shutdown, reply_timeout) {
                                tracing::warn!("connection ended with error: {e}");
                            }
                            tracing::debug!("client disconnected");
                        });
                    match spawned {
                        Ok(connection) => connections.push(connection),
                        Err(e) => tracing::warn!(%peer, "could not start connection thread: {e}"),
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    tracing::warn!("accept failed: {e}");
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }
        for connection in connections {
            if connection.join().is_err() {
                tracing::error!("remote connection thread panicked");
            }
        }
        tracing::info!("remote server stopped");
    }
}

fn serve(
    stream: TcpStream,
    sender: &CommandSender,
    shutdown: &AtomicBool,
    reply_timeout: Duration,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(POLL_INTERVAL))?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();

    while !shutdown.load(Ordering::Relaxed) {
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => return Ok(()),
            Ok(_) if !line.ends_with(b"\n") => return Ok(()),
            Ok(_) => {}
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                continue;
            }
            Err(e) => return Err(e),
        }
        let text = String::from_utf8_lossy(&line);
        if !text.trim().is_empty() {
            let response = handle_line(text.trim(), sender, reply_timeout);
            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            writer.write_all(&encoded)?;
            writer.flush()?;
        }
        line.clear();
    }
    Ok(())
}

/// Answer one request line.
pub(crate) fn handle_line(
    text: &str,
    sender: &CommandSender,
    reply_timeout: Duration,
) -> RpcResponse {
    let request: RpcRequest = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(e) => {
            return RpcResponse::failure(None, RpcError::new(PARSE_ERROR, e.to_string()));
        }
    };
    let _span = tracing::debug_span!("rpc", method = %request.method).entered();
    let id = request.id;
    if request.jsonrpc != JSONRPC_VERSION {
        return RpcResponse::failure(
            id,
            RpcError::new(INVALID_REQUEST, "jsonrpc must be \"2.0\""),
        );
    }

    let command = match parse_command(&request.method, request.params) {
        Ok(command) => command,
        Err(e) => return RpcResponse::failure(id, e),
    };
    match sender.request(command, reply_timeout) {
        Ok(Ok(output)) => RpcResponse::success(id, encode_output(&output)),
        Ok(Err(e)) => RpcResponse::failure(id, e.into()),
        Err(e) => {
            if let ChannelError::Timeout(_) = e {
                tracing::warn!("{e}");
            }
            RpcResponse::failure(id, RpcError::new(RENDER_UNAVAILABLE, e.to_string()))
        }
    }
}

/// Running server. Dropping it stops the server and joins its thread.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("remote server thread panicked");
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
