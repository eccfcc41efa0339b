use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::{FutureExt, StreamExt};
use ratatui::crossterm::event::Event as CrosstermEvent;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub(super) struct EventChannels {
    tx: UnboundedSender<CrosstermEvent>,
    rx_paused: Arc<AtomicBool>,
}

impl EventChannels {
    fn new(tx: UnboundedSender<CrosstermEvent>) -> Self {
        Self {
            tx,
            rx_paused: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(super) fn pause(&self) {
        self.rx_paused.store(true, Ordering::Release);
    }

    pub(super) fn resume(&self) {
        self.rx_paused.store(false, Ordering::Release);
    }
}

pub(super) struct EventListener {
    receiver: UnboundedReceiver<CrosstermEvent>,
}

impl EventListener {
    pub(super) fn new() -> (Self, EventChannels) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { receiver: rx }, EventChannels::new(tx))
    }

    pub(super) async fn recv(&mut self) -> Option<CrosstermEvent> {
        self.receiver.recv().await
    }

    /// Drop input typed while the interface was not listening.
    pub(super) fn clear_queue(&mut self) {
        while self.receiver.try_recv().is_ok() {}
    }
}

/// The task reading crossterm's event stream. It is stopped outright, not
/// just paused, while a child owns the terminal so it does not consume the
/// child's input.
pub(super) struct EventLoop {
    channels: EventChannels,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl EventLoop {
    pub(super) fn start(channels: EventChannels) -> Self {
        let mut event_loop = Self {
            channels,
            token: CancellationToken::new(),
            handle: None,
        };
        event_loop.spawn();
        event_loop
    }

    pub(super) fn channels(&self) -> &EventChannels {
        &self.channels
    }

    fn spawn(&mut self) {
        self.token = CancellationToken::new();
        let tx = self.channels.tx.clone();
        let token = self.token.clone();
        let rx_paused = self.channels.rx_paused.clone();
        self.handle = Some(tokio::spawn(async move {
            read_events(tx, token, rx_paused).await;
        }));
    }

    pub(super) async fn stop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take()
            && tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err()
        {
            tracing::debug!("terminal event loop did not stop within the grace period");
        }
    }

    pub(super) fn restart(&mut self) {
        if self.handle.is_none() {
            self.spawn();
        }
    }
}

async fn read_events(
    event_tx: UnboundedSender<CrosstermEvent>,
    cancellation_token: CancellationToken,
    rx_paused: Arc<AtomicBool>,
) {
    let mut reader = crossterm::event::EventStream::new();

    loop {
        let crossterm_event = reader.next().fuse();

        tokio::select! {
            _ = cancellation_token.cancelled() => {
                break;
            }
            maybe_event = crossterm_event => {
                match maybe_event {
                    Some(Ok(event)) => {
                        if !rx_paused.load(Ordering::Acquire) {
                            let _ = event_tx.send(event);
                        }
                    }
                    Some(Err(error)) => {
                        tracing::error!(%error, "terminal event stream error");
                    }
                    None => break,
                }
            }
        }

        if event_tx.is_closed() {
            break;
        }
    }
}
