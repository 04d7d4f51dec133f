//! Connection lifecycle and dispatch.

use crate::event::Signal;
use crate::handle::{ClientHandle, UiRequest};
use crate::{ClientConfig, ConfigError, ConnectionEvent, Connector, Link, LinkEvents, ReconnectTimer};
use devlink_core::{
    CommandName, Endpoint, LogCategory, LogEntry, MessageLog, OutboundMessage, ReadyState,
    RenderSink, inbound,
};
use std::time::Duration;
use tokio::sync::mpsc;

/// How long shutdown waits for the transport to finish its close handshake.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Owns the one link to the device and everything that reacts to it.
///
/// All state changes happen in [`dispatch`](Self::dispatch) and the command
/// methods, one call at a time, so no locking is involved. Dropping the
/// manager cancels any pending reconnect and closes the live link.
pub struct ConnectionManager<C, S> {
    endpoint: Endpoint,
    retry_delay: Duration,
    request_status_on_open: bool,
    connector: C,
    sink: S,
    log: MessageLog,
    state: Option<ReadyState>,
    link: Option<Link>,
    reconnect: Option<ReconnectTimer>,
    /// Bumped for every link opened; events carry the value they were opened with.
    generation: u64,
    shut_down: bool,
    signal_tx: mpsc::UnboundedSender<Signal>,
    signal_rx: mpsc::UnboundedReceiver<Signal>,
    request_tx: mpsc::UnboundedSender<UiRequest>,
    request_rx: mpsc::UnboundedReceiver<UiRequest>,
}

enum Next {
    Signal(Signal),
    Request(UiRequest),
}

impl<C: Connector, S: RenderSink> ConnectionManager<C, S> {
    pub fn new(config: &ClientConfig, connector: C, sink: S) -> Result<Self, ConfigError> {
        let endpoint = config.endpoint()?;
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        Ok(Self {
            endpoint,
            retry_delay: config.retry_delay(),
            request_status_on_open: config.request_status_on_open,
            connector,
            sink,
            log: MessageLog::new(config.auto_scroll),
            state: None,
            link: None,
            reconnect: None,
            generation: 0,
            shut_down: false,
            signal_tx,
            signal_rx,
            request_tx,
            request_rx,
        })
    }

    /// A handle the UI can hold on to; it outlives reconnects.
    pub fn handle(&self) -> ClientHandle {
        ClientHandle::new(self.request_tx.clone())
    }

    /// Open the first link. Does nothing if one exists or is scheduled.
    pub fn start(&mut self) {
        if self.shut_down || self.link.is_some() || self.reconnect.is_some() {
            return;
        }
        self.open_link();
    }

    /// Send a command if the link is open; otherwise log why not.
    ///
    /// Never fails: the outcome is visible only in the message log.
    pub fn send_command(&mut self, name: CommandName) {
        let link = match (&self.link, self.state) {
            (Some(link), Some(ReadyState::Open)) => link,
            _ => {
                let state = ReadyState::label(self.state);
                tracing::debug!(state, command = %name, "not ready, dropping command");
                self.append(LogCategory::Error, format!("WebSocket not connected ({state})"));
                return;
            }
        };

        let result = OutboundMessage::command(name.clone())
            .encode()
            .map_err(|e| e.to_string())
            .and_then(|text| {
                tracing::debug!("Sending command: {}", text);
                link.send(text).map_err(|e| e.to_string())
            });

        match result {
            Ok(()) => self.append(LogCategory::Sent, format!("Sent: {name}")),
            Err(e) => self.append(LogCategory::Error, format!("Failed to send {name}: {e}")),
        }
    }

    pub fn clear_messages(&mut self) {
        self.log.clear();
        self.sink.messages_cleared();
    }

    /// Flip auto-scroll and return the new value.
    pub fn toggle_auto_scroll(&mut self) -> bool {
        let enabled = self.log.toggle_auto_scroll();
        self.sink.auto_scroll_changed(enabled);
        enabled
    }

    /// Apply one event from the current link. Ignored when no link is live.
    pub fn dispatch(&mut self, event: ConnectionEvent) {
        if self.shut_down || self.link.is_none() {
            tracing::debug!(?event, "no live link, ignoring event");
            return;
        }
        match event {
            ConnectionEvent::Opened => self.on_open(),
            ConnectionEvent::Closed => self.on_close(),
            ConnectionEvent::Payload(text) => self.on_message(&text),
            ConnectionEvent::TransportError(reason) => self.on_error(&reason),
        }
    }

    /// Wait for the next link event or reconnect and apply it.
    ///
    /// UI requests are not processed here; use [`run`](Self::run) for that.
    pub async fn step(&mut self) {
        if let Some(signal) = self.signal_rx.recv().await {
            self.handle_signal(signal);
        }
    }

    /// Event loop: start, then apply link events and UI requests until a
    /// [`UiRequest::Shutdown`]. Pending link events go before UI requests.
    pub async fn run(mut self) -> S {
        self.start();
        loop {
            let next = tokio::select! {
                biased;
                Some(signal) = self.signal_rx.recv() => Next::Signal(signal),
                Some(request) = self.request_rx.recv() => Next::Request(request),
            };
            match next {
                Next::Signal(signal) => self.handle_signal(signal),
                Next::Request(UiRequest::Shutdown) => break,
                Next::Request(request) => self.handle_request(request),
            }
        }
        self.shutdown().await;
        let Self { sink, .. } = self;
        sink
    }

    /// Cancel any pending reconnect and close the live link.
    ///
    /// Waits briefly for the close handshake; nothing is dispatched afterwards.
    pub async fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        if let Some(timer) = self.reconnect.take() {
            timer.cancel();
        }
        if let Some(link) = self.link.take() {
            let was_open = self.state == Some(ReadyState::Open);
            self.state = Some(ReadyState::Closing);
            if was_open {
                self.sink.connection_changed(false);
            }
            if let Some(mut task) = link.close() {
                if tokio::time::timeout(CLOSE_TIMEOUT, &mut task).await.is_err() {
                    tracing::warn!("link did not close within {:?}; aborting", CLOSE_TIMEOUT);
                    task.abort();
                }
            }
        }
        self.state = Some(ReadyState::Closed);
        tracing::debug!("client shut down");
    }

    pub fn state(&self) -> Option<ReadyState> {
        self.state
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// The pending reconnect, if the link is down.
    pub fn reconnect(&self) -> Option<&ReconnectTimer> {
        self.reconnect.as_ref()
    }

    fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Link { generation, event } if generation == self.generation => {
                self.dispatch(event);
            }
            Signal::Link { generation, event } => {
                tracing::debug!(generation, ?event, "event from replaced link");
            }
            Signal::ReconnectDue { generation } => {
                if self.shut_down || generation != self.generation || self.reconnect.is_none() {
                    return;
                }
                self.reconnect = None;
                self.open_link();
            }
        }
    }

    fn handle_request(&mut self, request: UiRequest) {
        match request {
            UiRequest::SendCommand(name) => self.send_command(name),
            UiRequest::ClearMessages => self.clear_messages(),
            UiRequest::ToggleAutoScroll => {
                self.toggle_auto_scroll();
            }
            UiRequest::Shutdown => {}
        }
    }

    fn open_link(&mut self) {
        self.generation += 1;
        tracing::debug!("Connecting to {} (link {})", self.endpoint, self.generation);
        let events = LinkEvents::new(self.generation, self.signal_tx.clone());
        self.link = Some(self.connector.connect(&self.endpoint, events));
        self.state = Some(ReadyState::Connecting);
    }

    fn on_open(&mut self) {
        if self.state == Some(ReadyState::Open) {
            return;
        }
        self.state = Some(ReadyState::Open);
        tracing::info!("Connected to {}", self.endpoint);
        self.sink.connection_changed(true);
        self.append(LogCategory::Connected, "WebSocket connection established");
        if self.request_status_on_open {
            self.send_command(CommandName::get_status());
        }
    }

    fn on_close(&mut self) {
        self.link = None;
        self.state = Some(ReadyState::Closed);
        tracing::info!("Disconnected from {}; retrying in {:?}", self.endpoint, self.retry_delay);
        self.sink.connection_changed(false);
        self.append(
            LogCategory::Error,
            "WebSocket connection closed. Attempting to reconnect...",
        );
        self.reconnect = Some(ReconnectTimer::schedule(
            self.retry_delay,
            self.generation,
            self.signal_tx.clone(),
        ));
    }

    fn on_message(&mut self, text: &str) {
        tracing::debug!("Received: {}", text);
        self.append(LogCategory::Received, format!("Received: {text}"));
        inbound::route(text, &mut self.sink);
    }

    fn on_error(&mut self, reason: &str) {
        tracing::warn!("WebSocket error: {}", reason);
        self.append(LogCategory::Error, format!("WebSocket error: {reason}"));
    }

    fn append(&mut self, category: LogCategory, text: impl Into<String>) {
        let entry = self.log.push(LogEntry::new(category, text));
        self.sink.message_appended(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devlink_core::LedState;
    use devlink_core::testing::{Render, RecordingSink};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    struct MockLink {
        events: LinkEvents,
        outbound: mpsc::UnboundedReceiver<String>,
    }

    /// Hands out in-memory links and keeps their far ends for the test.
    #[derive(Clone, Default)]
    struct MockConnector {
        links: Arc<Mutex<Vec<MockLink>>>,
    }

    impl MockConnector {
        fn count(&self) -> usize {
            self.links.lock().unwrap().len()
        }

        fn emit(&self, index: usize, event: ConnectionEvent) {
            self.links.lock().unwrap()[index].events.emit(event);
        }

        fn written(&self, index: usize) -> Vec<String> {
            let mut links = self.links.lock().unwrap();
            let mut frames = Vec::new();
            while let Ok(frame) = links[index].outbound.try_recv() {
                frames.push(frame);
            }
            frames
        }
    }

    impl Connector for MockConnector {
        fn connect(&mut self, _endpoint: &Endpoint, events: LinkEvents) -> Link {
            let (tx, rx) = mpsc::unbounded_channel();
            self.links.lock().unwrap().push(MockLink {
                events,
                outbound: rx,
            });
            Link::new(tx, None)
        }
    }

    fn manager(
        config: ClientConfig,
    ) -> (ConnectionManager<MockConnector, RecordingSink>, MockConnector, RecordingSink) {
        let connector = MockConnector::default();
        let sink = RecordingSink::default();
        let manager = ConnectionManager::new(&config, connector.clone(), sink.clone()).unwrap();
        (manager, connector, sink)
    }

    fn quiet() -> ClientConfig {
        ClientConfig {
            request_status_on_open: false,
            ..Default::default()
        }
    }

    async fn open(m: &mut ConnectionManager<MockConnector, RecordingSink>, c: &MockConnector) {
        m.start();
        c.emit(c.count() - 1, ConnectionEvent::Opened);
        m.step().await;
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let (mut m, c, _) = manager(quiet());
        assert_eq!(m.state(), None);
        m.start();
        m.start();
        assert_eq!(c.count(), 1);
        assert_eq!(m.state(), Some(ReadyState::Connecting));
    }

    #[tokio::test]
    async fn open_requests_status() {
        let (mut m, c, sink) = manager(ClientConfig::default());
        open(&mut m, &c).await;

        assert_eq!(m.state(), Some(ReadyState::Open));
        let written = c.written(0);
        assert_eq!(written.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&written[0]).unwrap();
        assert_eq!(value["type"], "command");
        assert_eq!(value["command"], "GET_STATUS");
        assert_eq!(
            sink.renders(),
            vec![
                Render::Connection(true),
                Render::Message(LogCategory::Connected, "WebSocket connection established".into()),
                Render::Message(LogCategory::Sent, "Sent: GET_STATUS".into()),
            ]
        );
    }

    #[tokio::test]
    async fn open_without_status_request() {
        let (mut m, c, sink) = manager(quiet());
        open(&mut m, &c).await;
        assert!(c.written(0).is_empty());
        assert!(sink.messages(LogCategory::Sent).is_empty());
    }

    #[tokio::test]
    async fn send_while_connecting_logs_one_error() {
        let (mut m, c, sink) = manager(quiet());
        m.start();
        m.send_command(CommandName::led_on());

        assert!(c.written(0).is_empty());
        assert_eq!(
            sink.messages(LogCategory::Error),
            vec!["WebSocket not connected (CONNECTING)".to_string()]
        );
        assert_eq!(sink.renders().len(), 1);
    }

    #[tokio::test]
    async fn send_before_start_names_unknown_state() {
        let (mut m, c, sink) = manager(quiet());
        m.send_command(CommandName::led_off());
        assert_eq!(c.count(), 0);
        assert_eq!(
            sink.messages(LogCategory::Error),
            vec!["WebSocket not connected (UNKNOWN)".to_string()]
        );
    }

    #[tokio::test]
    async fn send_when_open_writes_envelope() {
        let (mut m, c, sink) = manager(quiet());
        open(&mut m, &c).await;
        m.send_command(CommandName::led_on());

        let written = c.written(0);
        assert_eq!(written.len(), 1);
        let OutboundMessage::Command { command, timestamp } =
            OutboundMessage::decode(&written[0]).unwrap();
        assert_eq!(command, CommandName::led_on());
        assert!(timestamp > 0);
        assert_eq!(sink.messages(LogCategory::Sent), vec!["Sent: LED_ON".to_string()]);
    }

    #[tokio::test]
    async fn free_form_command_names_are_sent_verbatim() {
        let (mut m, c, sink) = manager(quiet());
        open(&mut m, &c).await;
        m.send_command("SET COLOR red".parse().unwrap());

        let written = c.written(0);
        let OutboundMessage::Command { command, .. } =
            OutboundMessage::decode(&written[0]).unwrap();
        assert_eq!(command.as_str(), "SET COLOR red");
        assert_eq!(
            sink.messages(LogCategory::Sent),
            vec!["Sent: SET COLOR red".to_string()]
        );
    }

    #[tokio::test]
    async fn payload_is_logged_then_routed() {
        let (mut m, c, sink) = manager(quiet());
        open(&mut m, &c).await;
        sink.take();

        c.emit(0, ConnectionEvent::Payload("LED turned OFF".into()));
        c.emit(0, ConnectionEvent::Payload("{not json".into()));
        m.step().await;
        m.step().await;

        assert_eq!(
            sink.renders(),
            vec![
                Render::Message(LogCategory::Received, "Received: LED turned OFF".into()),
                Render::Led(LedState::Off),
                Render::Message(LogCategory::Received, "Received: {not json".into()),
            ]
        );
        assert_eq!(m.log().len(), 3);
    }

    #[tokio::test]
    async fn transport_error_does_not_reconnect() {
        let (mut m, c, sink) = manager(quiet());
        open(&mut m, &c).await;
        c.emit(0, ConnectionEvent::TransportError("reset".into()));
        m.step().await;

        assert_eq!(m.state(), Some(ReadyState::Open));
        assert!(m.reconnect().is_none());
        assert_eq!(sink.messages(LogCategory::Error), vec!["WebSocket error: reset".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn close_schedules_one_reconnect_after_delay() {
        let (mut m, c, sink) = manager(quiet());
        open(&mut m, &c).await;

        c.emit(0, ConnectionEvent::Closed);
        c.emit(0, ConnectionEvent::Closed);
        m.step().await;
        let closed_at = Instant::now();
        assert_eq!(m.state(), Some(ReadyState::Closed));
        assert_eq!(m.reconnect().unwrap().deadline() - closed_at, Duration::from_secs(2));

        // Second close for the same link is ignored.
        m.step().await;
        assert_eq!(sink.messages(LogCategory::Error).len(), 1);

        m.step().await;
        assert!(closed_at.elapsed() >= Duration::from_secs(2));
        assert_eq!(c.count(), 2);
        assert_eq!(m.state(), Some(ReadyState::Connecting));
        assert!(m.reconnect().is_none());

        // Nothing else is pending.
        assert!(tokio::time::timeout(Duration::from_secs(60), m.step()).await.is_err());
        assert_eq!(c.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_attempts_retry_forever_at_fixed_delay() {
        let (mut m, c, sink) = manager(quiet());
        m.start();
        for attempt in 0..5 {
            c.emit(attempt, ConnectionEvent::TransportError("refused".into()));
            c.emit(attempt, ConnectionEvent::Closed);
            m.step().await;
            m.step().await;
            let closed_at = Instant::now();
            m.step().await;
            assert!(closed_at.elapsed() >= Duration::from_secs(2));
        }
        assert_eq!(c.count(), 6);
        assert_eq!(
            sink.renders()
                .iter()
                .filter(|r| **r == Render::Connection(false))
                .count(),
            5
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_link_events_are_ignored() {
        let (mut m, c, sink) = manager(quiet());
        open(&mut m, &c).await;
        c.emit(0, ConnectionEvent::Closed);
        m.step().await;
        m.step().await; // reconnect fires
        sink.take();

        c.emit(0, ConnectionEvent::Payload("LED turned ON".into()));
        c.emit(1, ConnectionEvent::Opened);
        m.step().await;
        m.step().await;

        assert_eq!(
            sink.renders(),
            vec![
                Render::Connection(true),
                Render::Message(LogCategory::Connected, "WebSocket connection established".into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_reconnect() {
        let (mut m, c, _) = manager(quiet());
        open(&mut m, &c).await;
        c.emit(0, ConnectionEvent::Closed);
        m.step().await;
        assert!(m.reconnect().is_some());

        m.shutdown().await;
        assert!(m.reconnect().is_none());
        assert_eq!(m.state(), Some(ReadyState::Closed));
        m.start();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(tokio::time::timeout(Duration::from_secs(1), m.step()).await.is_err());
        assert_eq!(c.count(), 1);
    }

    #[tokio::test]
    async fn clear_and_toggle() {
        let (mut m, c, sink) = manager(quiet());
        open(&mut m, &c).await;
        assert_eq!(m.log().len(), 1);

        m.clear_messages();
        assert!(m.log().is_empty());
        assert!(!m.toggle_auto_scroll());
        assert!(m.toggle_auto_scroll());
        assert_eq!(
            sink.renders()[2..],
            [Render::Cleared, Render::AutoScroll(false), Render::AutoScroll(true)]
        );
    }

    #[tokio::test]
    async fn run_processes_handle_requests() {
        let (mut m, c, sink) = manager(quiet());
        let handle = m.handle();
        m.start();
        let task = tokio::spawn(m.run());

        c.emit(0, ConnectionEvent::Opened);
        handle.send_command(CommandName::led_on()).unwrap();
        handle.toggle_auto_scroll().unwrap();
        handle.shutdown().unwrap();
        task.await.unwrap();

        assert_eq!(c.written(0).len(), 1);
        assert!(sink.renders().contains(&Render::AutoScroll(false)));
        assert!(handle.send_command(CommandName::led_off()).is_err());
    }
}
