//! Cooperative I/O scheduler
//!
//! Single thread, fixed priority order per pass: serial link first, then
//! console lines, then pending accepts, then each pooled client. Every
//! source is polled without blocking and every handler runs to completion;
//! an entirely idle pass sleeps 10 ms before re-polling. Serial-before-
//! clients is a contract: coordinator traffic is never starved by a chatty
//! client.

use crate::app::{handle_message, ClientAction};
use crate::console::{handle_line, ConsoleAction, ConsoleState};
use crate::error::Result;
use crate::nodes::NodeRegistry;
use crate::pool::{ClientId, ClientPool};
use crate::soc::dispatch::dispatch_frame;
use crate::soc::{read_frame, SocCommander, SocFrame};
use crate::transport::Transport;
use crossbeam_channel::Receiver;
use std::io::{ErrorKind, Read};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Largest client message the bridge will read at once
const MAX_CLIENT_MSG_LEN: usize = 50;

/// Sleep between passes when every source was idle
const IDLE_SLEEP: Duration = Duration::from_millis(10);

pub struct Scheduler<T: Transport> {
    link: T,
    listener: TcpListener,
    console_rx: Receiver<String>,
    registry: NodeRegistry,
    pool: ClientPool<TcpStream>,
    commander: SocCommander,
    console: ConsoleState,
    running: Arc<AtomicBool>,
}

impl<T: Transport> Scheduler<T> {
    pub fn new(
        link: T,
        listener: TcpListener,
        console_rx: Receiver<String>,
        running: Arc<AtomicBool>,
    ) -> Result<Self> {
        listener.set_nonblocking(true)?;
        Ok(Scheduler {
            link,
            listener,
            console_rx,
            registry: NodeRegistry::new(),
            pool: ClientPool::new(),
            commander: SocCommander::new(),
            console: ConsoleState::default(),
            running,
        })
    }

    /// Run until shutdown is requested
    pub fn run(&mut self) -> Result<()> {
        log::info!("scheduler running");
        while self.running.load(Ordering::Relaxed) {
            let mut busy = false;
            busy |= self.service_serial();
            busy |= self.service_console();
            busy |= self.service_listener();
            busy |= self.service_clients();

            if !busy {
                std::thread::sleep(IDLE_SLEEP);
            }
        }
        log::info!("scheduler stopped");
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Priority 1: one coordinator frame per pass
    fn service_serial(&mut self) -> bool {
        let body = match read_frame(&mut self.link) {
            Ok(Some(body)) => body,
            Ok(None) => return false,
            Err(e) => {
                // Per-cycle failure; the link stays up
                log::warn!("serial read cycle abandoned: {}", e);
                return true;
            }
        };

        match SocFrame::decode(&body) {
            Ok(Some(frame)) => {
                if let Err(e) = dispatch_frame(&frame, &mut self.registry, &mut self.pool) {
                    log::warn!("dropping coordinator frame: {}", e);
                }
            }
            Ok(None) => log::debug!("ignoring coordinator frame: {:02X?}", body),
            Err(e) => log::warn!("undecodable coordinator frame: {}", e),
        }
        true
    }

    /// Priority 2: drain queued console lines
    fn service_console(&mut self) -> bool {
        let mut busy = false;
        while let Ok(line) = self.console_rx.try_recv() {
            busy = true;
            match handle_line(
                &line,
                &mut self.console,
                &self.registry,
                &mut self.commander,
                &mut self.link,
            ) {
                Ok(ConsoleAction::Shutdown) => self.stop(),
                Ok(ConsoleAction::Continue) => {}
                Err(e) => log::error!("console command failed: {}", e),
            }
        }
        busy
    }

    /// Priority 3: at most one accept per pass
    fn service_listener(&mut self) -> bool {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = stream.set_nonblocking(true) {
                    log::error!("client from {} rejected: {}", peer, e);
                    return true;
                }
                match self.pool.add(stream) {
                    Ok(id) => log::info!("client {} connected from {}", id, peer),
                    Err(stream) => {
                        log::warn!("client pool full, rejecting {}", peer);
                        let _ = stream.shutdown(Shutdown::Both);
                    }
                }
                true
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => false,
            Err(e) => {
                log::error!("accept failed: {}", e);
                false
            }
        }
    }

    /// Priority 4: one read per client per pass
    fn service_clients(&mut self) -> bool {
        // Read first, act second: handlers need the pool for broadcasts
        let mut messages: Vec<(ClientId, Vec<u8>)> = Vec::new();
        let mut closed: Vec<ClientId> = Vec::new();

        for id in self.pool.ids() {
            let Some(stream) = self.pool.get_mut(id) else {
                continue;
            };
            let mut buf = [0u8; MAX_CLIENT_MSG_LEN];
            match stream.read(&mut buf) {
                Ok(0) => closed.push(id),
                Ok(n) => messages.push((id, buf[..n].to_vec())),
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => {
                    log::warn!("client {} read failed: {}", id, e);
                    closed.push(id);
                }
            }
        }

        for id in &closed {
            if let Some(stream) = self.pool.remove(*id) {
                let _ = stream.shutdown(Shutdown::Both);
                log::info!("client {} disconnected", id);
            }
        }

        let busy = !messages.is_empty() || !closed.is_empty();
        for (id, msg) in messages {
            match handle_message(
                &msg,
                &self.registry,
                &mut self.pool,
                &mut self.commander,
                &mut self.link,
            ) {
                Ok(ClientAction::Shutdown) => self.stop(),
                Ok(ClientAction::Continue) => {}
                Err(e) => log::error!("client {} command failed: {}", id, e),
            }
        }
        busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::MAX_CLIENTS;
    use crate::transport::MockTransport;
    use crossbeam_channel::unbounded;
    use std::io::Write;
    use std::net::TcpStream;

    fn scheduler() -> (Scheduler<MockTransport>, std::net::SocketAddr, crossbeam_channel::Sender<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let sched = Scheduler::new(MockTransport::new(), listener, rx, running).unwrap();
        (sched, addr, tx)
    }

    fn drain_accepts<T: Transport>(sched: &mut Scheduler<T>) {
        // Accept loop admits one connection per pass
        for _ in 0..MAX_CLIENTS + 5 {
            sched.service_listener();
        }
    }

    #[test]
    fn test_eleventh_client_rejected() {
        let (mut sched, addr, _tx) = scheduler();

        let mut conns = Vec::new();
        for _ in 0..MAX_CLIENTS + 1 {
            conns.push(TcpStream::connect(addr).unwrap());
        }
        std::thread::sleep(Duration::from_millis(50));
        drain_accepts(&mut sched);

        assert_eq!(sched.pool.len(), MAX_CLIENTS);
    }

    #[test]
    fn test_client_close_removes_from_pool() {
        let (mut sched, addr, _tx) = scheduler();

        let keep = TcpStream::connect(addr).unwrap();
        let drop_me = TcpStream::connect(addr).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        drain_accepts(&mut sched);
        assert_eq!(sched.pool.len(), 2);

        drop(drop_me);
        std::thread::sleep(Duration::from_millis(50));
        sched.service_clients();

        assert_eq!(sched.pool.len(), 1);
        drop(keep);
    }

    #[test]
    fn test_announce_frame_reaches_clients() {
        let (mut sched, addr, _tx) = scheduler();

        let mut client = TcpStream::connect(addr).unwrap();
        client
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        std::thread::sleep(Duration::from_millis(50));
        drain_accepts(&mut sched);

        // Device announce for nwk 0x1234, light profile 0x0101
        let mut frame = vec![0xFE, 29, 0x49, 0x81];
        frame.extend_from_slice(&[0x0B, 0, 0, 0, 0xFF, 0xFF, 3, 0, 0, 0, 0x07, 0, 0]);
        frame.extend_from_slice(&[0x34, 0x12]);
        frame.extend_from_slice(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
        frame.extend_from_slice(&[0x8E, 0x0B, 0x01, 0x01]);
        sched.link.inject_read(&frame);

        assert!(sched.service_serial());
        assert_eq!(sched.registry.count(), 1);

        let mut report = [0u8; 13];
        client.read_exact(&mut report).unwrap();
        assert_eq!(report[0], 0xA3);
        assert_eq!(report[1], 1); // report command
        assert_eq!(report[2], 1); // light
        assert_eq!(&report[3..5], &[0x34, 0x12]);
    }

    #[test]
    fn test_console_exit_stops_scheduler() {
        let (mut sched, _addr, tx) = scheduler();
        tx.send("exit".to_string()).unwrap();

        assert!(sched.service_console());
        assert!(!sched.running.load(Ordering::Relaxed));
    }

    #[test]
    fn test_client_close_command_stops_scheduler() {
        let (mut sched, addr, _tx) = scheduler();

        let mut client = TcpStream::connect(addr).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        drain_accepts(&mut sched);

        client.write_all(&[0xA3, 10]).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        sched.service_clients();

        assert!(!sched.running.load(Ordering::Relaxed));
    }

    #[test]
    fn test_retry_exhaustion_keeps_scheduler_alive() {
        let (mut sched, _addr, _tx) = scheduler();

        // Length byte promises more than will ever arrive
        sched.link.inject_read(&[0xFE, 10, 0x49, 0x80]);
        assert!(sched.service_serial());

        // Next pass is a clean idle poll
        assert!(!sched.service_serial());
        assert!(sched.running.load(Ordering::Relaxed));
    }
}
