//! One print session: connect, resolve a writable channel, transmit the
//! payload in chunks, and always tear the connection down afterwards.

use anyhow::Result;
use log::{debug, info, warn};

use crate::events::{EventSender, PrinterEvent};

/// Transport seam for a print session. The production implementation wraps
/// a bluest device; tests substitute a mock.
#[async_trait::async_trait]
pub trait PrinterLink {
    /// Open the connection to the device.
    async fn connect(&mut self) -> Result<()>;
    /// Locate the writable channel on the connected device.
    async fn resolve_channel(&mut self) -> Result<()>;
    /// Read the printer status characteristic, if the channel has one.
    async fn read_status(&mut self) -> Result<Option<Vec<u8>>>;
    /// Write one chunk of payload to the resolved channel.
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()>;
    /// Close the connection.
    async fn disconnect(&mut self) -> Result<()>;
}

/// Runs the session state sequence over a [`PrinterLink`]:
/// connecting, channel resolved, writing, disconnected.
pub struct PrintSession<L: PrinterLink> {
    link: L,
    chunk_size: usize,
    events: EventSender,
}

impl<L: PrinterLink> PrintSession<L> {
    pub fn new(link: L, chunk_size: usize, events: EventSender) -> Self {
        Self {
            link,
            chunk_size: chunk_size.max(1),
            events,
        }
    }

    /// Transmits `payload`, then makes exactly one disconnect attempt no
    /// matter how the attempt ended. Disconnect failures are swallowed.
    pub async fn run(mut self, payload: &[u8]) -> Result<()> {
        let result = self.try_print(payload).await;

        if let Err(e) = self.link.disconnect().await {
            warn!("Disconnect after print attempt failed: {:#}", e);
        }
        self.events.emit(PrinterEvent::Disconnected);

        result
    }

    async fn try_print(&mut self, payload: &[u8]) -> Result<()> {
        self.link.connect().await?;
        self.link.resolve_channel().await?;

        // Status is informational only; a failed read must not end the job.
        match self.link.read_status().await {
            Ok(Some(status)) => debug!("Printer status before job: {:?}", status),
            Ok(None) => {}
            Err(e) => warn!("Status read failed: {:#}", e),
        }

        self.events.emit(PrinterEvent::Writing {
            bytes: payload.len(),
        });
        for chunk in payload.chunks(self.chunk_size) {
            self.link.write_chunk(chunk).await?;
        }

        info!("Payload of {} byte(s) written", payload.len());
        self.events.emit(PrinterEvent::PrintComplete);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum FailAt {
        Connect,
        Resolve,
        Write(usize),
    }

    #[derive(Debug, Default)]
    struct LinkState {
        connects: usize,
        resolves: usize,
        disconnects: usize,
        chunks: Vec<Vec<u8>>,
    }

    struct MockLink {
        state: Arc<Mutex<LinkState>>,
        fail_at: Option<FailAt>,
        status: Option<Vec<u8>>,
    }

    impl MockLink {
        fn new(fail_at: Option<FailAt>) -> (Self, Arc<Mutex<LinkState>>) {
            let state = Arc::new(Mutex::new(LinkState::default()));
            (
                Self {
                    state: state.clone(),
                    fail_at,
                    status: None,
                },
                state,
            )
        }
    }

    #[async_trait::async_trait]
    impl PrinterLink for MockLink {
        async fn connect(&mut self) -> Result<()> {
            self.state.lock().unwrap().connects += 1;
            if self.fail_at == Some(FailAt::Connect) {
                return Err(anyhow!("connect refused"));
            }
            Ok(())
        }

        async fn resolve_channel(&mut self) -> Result<()> {
            self.state.lock().unwrap().resolves += 1;
            if self.fail_at == Some(FailAt::Resolve) {
                return Err(anyhow!("no writable characteristic"));
            }
            Ok(())
        }

        async fn read_status(&mut self) -> Result<Option<Vec<u8>>> {
            Ok(self.status.clone())
        }

        async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if let Some(FailAt::Write(n)) = self.fail_at {
                if state.chunks.len() == n {
                    return Err(anyhow!("write rejected"));
                }
            }
            state.chunks.push(chunk.to_vec());
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<()> {
            self.state.lock().unwrap().disconnects += 1;
            Ok(())
        }
    }

    fn session(link: MockLink, chunk_size: usize) -> PrintSession<MockLink> {
        let (events, _rx) = EventSender::channel();
        PrintSession::new(link, chunk_size, events)
    }

    #[tokio::test]
    async fn successful_print_disconnects_exactly_once() {
        let (link, state) = MockLink::new(None);
        session(link, 180).run(b"Hi\nBye\n\n\n").await.unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.connects, 1);
        assert_eq!(state.disconnects, 1);
        assert_eq!(state.chunks, vec![b"Hi\nBye\n\n\n".to_vec()]);
    }

    #[tokio::test]
    async fn oversized_payload_is_split_at_the_chunk_boundary() {
        let payload: Vec<u8> = (0..400u16).map(|i| (i % 251) as u8).collect();
        let (link, state) = MockLink::new(None);
        session(link, 180).run(&payload).await.unwrap();

        let state = state.lock().unwrap();
        let lens: Vec<_> = state.chunks.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![180, 180, 40]);
        let reassembled: Vec<u8> = state.chunks.concat();
        assert_eq!(reassembled, payload);
    }

    #[tokio::test]
    async fn connect_failure_still_disconnects_exactly_once() {
        let (link, state) = MockLink::new(Some(FailAt::Connect));
        let result = session(link, 180).run(b"payload").await;

        assert!(result.is_err());
        let state = state.lock().unwrap();
        assert_eq!(state.disconnects, 1);
        assert!(state.chunks.is_empty());
    }

    #[tokio::test]
    async fn missing_channel_is_terminal_and_disconnects_once() {
        let (link, state) = MockLink::new(Some(FailAt::Resolve));
        let result = session(link, 180).run(b"payload").await;

        assert!(result.is_err());
        let state = state.lock().unwrap();
        assert_eq!(state.resolves, 1);
        assert_eq!(state.disconnects, 1);
        assert!(state.chunks.is_empty());
    }

    #[tokio::test]
    async fn mid_payload_write_failure_disconnects_once() {
        let payload = vec![0u8; 300];
        let (link, state) = MockLink::new(Some(FailAt::Write(1)));
        let result = session(link, 100).run(&payload).await;

        assert!(result.is_err());
        let state = state.lock().unwrap();
        assert_eq!(state.chunks.len(), 1);
        assert_eq!(state.disconnects, 1);
    }

    #[tokio::test]
    async fn zero_chunk_size_is_clamped() {
        let (link, state) = MockLink::new(None);
        session(link, 0).run(b"ab").await.unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.chunks.len(), 2);
    }
}
