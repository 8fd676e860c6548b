//! Telemetry transports: a TCP line stream and a replayed JSONL file.
//!
//! Both run their I/O on a background thread and hand lines to the frame
//! loop through an mpsc channel, polled by the bridge without blocking.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use journey_core::telemetry::{TelemetryTransport, TransportError};
use notify::{Event as NotifyEvent, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::io::AsyncBufReadExt;
use tokio::sync::oneshot;

/// How long a TCP connect may take.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// What the I/O thread reports.
#[derive(Debug, Clone, PartialEq)]
enum LinkMessage {
    Line(String),
    Failed(String),
    Closed,
}

fn poll_link(rx: &Mutex<Receiver<LinkMessage>>) -> Result<Option<String>, TransportError> {
    let rx = rx
        .lock()
        .map_err(|_| TransportError::Connect("receiver poisoned".to_string()))?;
    match rx.try_recv() {
        Ok(LinkMessage::Line(line)) => Ok(Some(line)),
        Ok(LinkMessage::Failed(reason)) => Err(TransportError::Connect(reason)),
        Ok(LinkMessage::Closed) | Err(TryRecvError::Disconnected) => Err(TransportError::Closed),
        Err(TryRecvError::Empty) => Ok(None),
    }
}

/// Newline-delimited JSON over TCP.
pub struct TcpLineTransport {
    addr: String,
    rx: Option<Mutex<Receiver<LinkMessage>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TcpLineTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            rx: None,
            shutdown: None,
        }
    }
}

impl TelemetryTransport for TcpLineTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        self.close();

        let (tx, rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let addr = self.addr.clone();

        std::thread::Builder::new()
            .name("telemetry-tcp".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build();
                match runtime {
                    Ok(runtime) => runtime.block_on(stream_lines(addr, tx, shutdown_rx)),
                    Err(e) => {
                        let _ = tx.send(LinkMessage::Failed(e.to_string()));
                    }
                }
            })?;

        self.rx = Some(Mutex::new(rx));
        self.shutdown = Some(shutdown_tx);
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<String>, TransportError> {
        match self.rx.as_ref() {
            Some(rx) => poll_link(rx),
            None => Err(TransportError::Closed),
        }
    }

    fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.rx = None;
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}

async fn stream_lines(
    addr: String,
    tx: Sender<LinkMessage>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let connect = tokio::time::timeout(CONNECT_TIMEOUT, tokio::net::TcpStream::connect(&addr));
    let stream = match connect.await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            let _ = tx.send(LinkMessage::Failed(e.to_string()));
            return;
        }
        Err(_) => {
            let _ = tx.send(LinkMessage::Failed(format!("timed out connecting to {}", addr)));
            return;
        }
    };
    tracing::debug!("Telemetry stream open to {}", addr);

    let mut lines = tokio::io::BufReader::new(stream).lines();
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if tx.send(LinkMessage::Line(line)).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    let _ = tx.send(LinkMessage::Closed);
                    break;
                }
                Err(e) => {
                    let _ = tx.send(LinkMessage::Failed(e.to_string()));
                    break;
                }
            }
        }
    }
}

/// Replays a JSONL file line by line, then follows appends.
pub struct ReplayFileTransport {
    path: PathBuf,
    interval: Duration,
    rx: Option<Mutex<Receiver<LinkMessage>>>,
    stop: Arc<AtomicBool>,
}

impl ReplayFileTransport {
    /// `interval` paces the lines already in the file.
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
            rx: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl TelemetryTransport for ReplayFileTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        self.close();

        let file = File::open(&self.path)?;
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        self.stop = stop.clone();

        let path = self.path.clone();
        let interval = self.interval;
        std::thread::Builder::new()
            .name("telemetry-replay".to_string())
            .spawn(move || replay_and_follow(&path, file, interval, tx, &stop))?;

        self.rx = Some(Mutex::new(rx));
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<String>, TransportError> {
        match self.rx.as_ref() {
            Some(rx) => poll_link(rx),
            None => Err(TransportError::Closed),
        }
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.rx = None;
    }

    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

/// Sends every complete line from `reader`, returning the bytes consumed.
fn send_lines(
    reader: &mut BufReader<File>,
    tx: &Sender<LinkMessage>,
    interval: Duration,
    stop: &AtomicBool,
) -> Option<u64> {
    let mut consumed = 0u64;
    let mut line = String::new();
    loop {
        if stop.load(Ordering::Relaxed) {
            return None;
        }
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return Some(consumed),
            Ok(n) if line.ends_with('\n') => {
                consumed += n as u64;
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    if tx.send(LinkMessage::Line(trimmed.to_string())).is_err() {
                        return None;
                    }
                    if !interval.is_zero() {
                        std::thread::sleep(interval);
                    }
                }
            }
            // A partial last line is picked up once it is terminated
            Ok(_) => return Some(consumed),
            Err(e) => {
                let _ = tx.send(LinkMessage::Failed(e.to_string()));
                return None;
            }
        }
    }
}

fn replay_and_follow(
    path: &Path,
    file: File,
    interval: Duration,
    tx: Sender<LinkMessage>,
    stop: &AtomicBool,
) {
    let mut reader = BufReader::new(file);
    let Some(mut offset) = send_lines(&mut reader, &tx, interval, stop) else { return };

    let (event_tx, event_rx) = mpsc::channel::<Result<NotifyEvent, notify::Error>>();
    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = event_tx.send(res);
        },
        notify::Config::default(),
    ) {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::warn!("Replay file will not be followed: {}", e);
            return;
        }
    };
    if let Err(e) = watcher.watch(path, RecursiveMode::NonRecursive) {
        tracing::warn!("Failed to watch {:?}: {}", path, e);
        return;
    }

    while !stop.load(Ordering::Relaxed) {
        match event_rx.recv_timeout(Duration::from_millis(250)) {
            Ok(Ok(event)) => {
                if !matches!(event.kind, notify::EventKind::Modify(_) | notify::EventKind::Create(_)) {
                    continue;
                }
                let reopened = File::open(path).and_then(|mut f| {
                    let len = f.metadata()?.len();
                    if len < offset {
                        // Truncated: start over
                        offset = 0;
                    }
                    f.seek(SeekFrom::Start(offset))?;
                    Ok(f)
                });
                match reopened {
                    Ok(f) => {
                        let mut reader = BufReader::new(f);
                        match send_lines(&mut reader, &tx, Duration::ZERO, stop) {
                            Some(n) => offset += n,
                            None => return,
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(LinkMessage::Failed(e.to_string()));
                        return;
                    }
                }
            }
            Ok(Err(e)) => tracing::warn!("Replay watcher error: {}", e),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Instant;
    use tempfile::NamedTempFile;

    fn poll_until(transport: &mut dyn TelemetryTransport, count: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut lines = Vec::new();
        while lines.len() < count && Instant::now() < deadline {
            match transport.poll() {
                Ok(Some(line)) => lines.push(line),
                Ok(None) => std::thread::sleep(Duration::from_millis(10)),
                Err(e) => panic!("unexpected transport error: {}", e),
            }
        }
        lines
    }

    #[test]
    fn test_replay_delivers_existing_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"metrics":{{"kp_index":1}}}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"metrics":{{"kp_index":2}}}}"#).unwrap();

        let mut transport = ReplayFileTransport::new(file.path(), Duration::ZERO);
        transport.open().unwrap();
        let lines = poll_until(&mut transport, 2);

        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"kp_index\":2"));
        transport.close();
        assert!(matches!(transport.poll(), Err(TransportError::Closed)));
    }

    #[test]
    fn test_replay_missing_file_fails_to_open() {
        let mut transport = ReplayFileTransport::new("/no/such/telemetry.jsonl", Duration::ZERO);
        assert!(matches!(transport.open(), Err(TransportError::Io(_))));
    }

    #[test]
    fn test_tcp_stream_lines_then_close() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            writeln!(socket, r#"{{"metrics":{{"kp_index":3}}}}"#).unwrap();
            writeln!(socket, r#"{{"metrics":{{"kp_index":4}}}}"#).unwrap();
        });

        let mut transport = TcpLineTransport::new(addr.to_string());
        assert_eq!(transport.describe(), format!("tcp://{}", addr));
        transport.open().unwrap();
        let lines = poll_until(&mut transport, 2);
        server.join().unwrap();

        assert_eq!(lines.len(), 2);

        // The server hung up
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut result = transport.poll();
        while matches!(result, Ok(None)) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            result = transport.poll();
        }
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[test]
    fn test_tcp_refused_reports_connect_error() {
        // Bind then drop to get a port nobody listens on
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let mut transport = TcpLineTransport::new(addr.to_string());
        transport.open().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut result = transport.poll();
        while matches!(result, Ok(None)) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            result = transport.poll();
        }
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
