//! tcp with just enough HTTP/1.0 to be read by curl or a browser. one reply at a time
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use gps_time_core::Transport;
use log::{debug, trace};

/// connections that have not sent a request yet. past this, the oldest is dropped
pub const MAX_WAITING: usize = 4;

/// a connection that stays silent this long is dropped
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(2);

struct Waiting {
    stream: TcpStream,
    peer: SocketAddr,
    accepted_at: Instant,
}

pub struct TcpTransport {
    listener: TcpListener,
    idle_timeout: Duration,
    /// accepted, but haven't sent anything yet. oldest first
    waiting: Vec<Waiting>,
    /// sent a request and is owed a reply
    answering: Option<(TcpStream, SocketAddr)>,
}

impl TcpTransport {
    pub fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;

        // the scheduler polls us. accept must never block it
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener,
            idle_timeout: IDLE_TIMEOUT,
            waiting: Vec::with_capacity(MAX_WAITING),
            answering: None,
        })
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// take everything the listener has queued
    fn accept_pending(&mut self) -> io::Result<()> {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    stream.set_nonblocking(true)?;
                    trace!("connection from {}", peer);

                    if self.waiting.len() >= MAX_WAITING {
                        let oldest = self.waiting.remove(0);
                        debug!("too many idle connections. dropping {}", oldest.peer);
                    }

                    self.waiting.push(Waiting {
                        stream,
                        peer,
                        accepted_at: Instant::now(),
                    });
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    }
}

impl Transport for TcpTransport {
    type Error = io::Error;

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        self.accept_pending()?;

        let now = Instant::now();
        let idle_timeout = self.idle_timeout;
        self.waiting.retain(|w| {
            let keep = now.duration_since(w.accepted_at) < idle_timeout;
            if !keep {
                debug!("{} never asked for anything. dropping it", w.peer);
            }
            keep
        });

        // whichever connection has a request first gets served
        let mut i = 0;
        while i < self.waiting.len() {
            match self.waiting[i].stream.read(buf) {
                Ok(0) => {
                    // hung up without asking anything
                    self.waiting.remove(i);
                }
                Ok(n) => {
                    let w = self.waiting.remove(i);
                    self.answering = Some((w.stream, w.peer));
                    return Ok(Some(n));
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => i += 1,
                Err(err) => {
                    let w = self.waiting.remove(i);
                    debug!("reading from {} failed: {}", w.peer, err);
                }
            }
        }

        Ok(None)
    }

    fn reply(&mut self, response: &[u8]) -> io::Result<()> {
        let Some((mut stream, peer)) = self.answering.take() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "reply without a request",
            ));
        };

        // small enough to go out in one write
        stream.set_nonblocking(false)?;

        write!(
            stream,
            "HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            response.len()
        )?;
        stream.write_all(response)?;
        stream.flush()?;

        // one page per connection
        stream.shutdown(Shutdown::Both)?;

        debug!("replied to {} with {} bytes", peer, response.len());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn receive_within(
        transport: &mut TcpTransport,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Option<usize> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if let Some(n) = transport.receive(buf).unwrap() {
                return Some(n);
            }
            thread::sleep(Duration::from_millis(1));
        }
        None
    }

    #[test_log::test]
    fn test_nothing_waiting() {
        let mut transport = TcpTransport::bind("127.0.0.1:0").unwrap();

        let mut buf = [0; 64];
        assert!(transport.receive(&mut buf).unwrap().is_none());

        assert!(transport.reply(b"nobody asked").is_err());
    }

    #[test_log::test]
    fn test_request_and_reply() {
        let mut transport = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = transport.local_addr().unwrap();

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(b"GET / HTTP/1.0\r\n\r\n").unwrap();

            let mut response = String::new();
            stream.read_to_string(&mut response).unwrap();
            response
        });

        let mut buf = [0; 256];
        let n = receive_within(&mut transport, &mut buf, Duration::from_secs(5)).unwrap();
        assert_eq!(&buf[..n], b"GET / HTTP/1.0\r\n\r\n");

        transport.reply(b"Synced: yes\n").unwrap();

        let response = client.join().unwrap();

        assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "{}", response);
        assert!(response.contains("Content-Length: 12\r\n"), "{}", response);
        assert!(response.ends_with("\r\n\r\nSynced: yes\n"), "{}", response);
    }

    #[test_log::test]
    fn test_silent_client_does_not_block() {
        let mut transport = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = transport.local_addr().unwrap();

        let _client = TcpStream::connect(addr).unwrap();

        let mut buf = [0; 64];
        let start = Instant::now();
        for _ in 0..10 {
            assert!(transport.receive(&mut buf).unwrap().is_none());
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    fn get_page(addr: SocketAddr) -> thread::JoinHandle<String> {
        thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(b"GET / HTTP/1.0\r\n\r\n").unwrap();

            let mut response = String::new();
            stream.read_to_string(&mut response).unwrap();
            response
        })
    }

    #[test_log::test]
    fn test_idle_client_does_not_block_the_next_one() {
        let mut transport = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = transport.local_addr().unwrap();

        // connects and then says nothing
        let _idle = TcpStream::connect(addr).unwrap();

        let mut buf = [0; 64];
        assert!(transport.receive(&mut buf).unwrap().is_none());

        let client = get_page(addr);

        let mut buf = [0; 256];
        let n = receive_within(&mut transport, &mut buf, Duration::from_secs(3)).unwrap();
        assert_eq!(&buf[..n], b"GET / HTTP/1.0\r\n\r\n");

        transport.reply(b"Synced: no\n").unwrap();

        let response = client.join().unwrap();
        assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "{}", response);
        assert!(response.ends_with("\r\n\r\nSynced: no\n"), "{}", response);
    }

    #[test_log::test]
    fn test_many_idle_clients_do_not_block_the_next_one() {
        let mut transport = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = transport.local_addr().unwrap();

        let _idle: Vec<_> = (0..MAX_WAITING + 2)
            .map(|_| TcpStream::connect(addr).unwrap())
            .collect();

        let mut buf = [0; 256];
        let start = Instant::now();
        while start.elapsed() < Duration::from_millis(200) {
            assert!(transport.receive(&mut buf).unwrap().is_none());
        }
        assert!(transport.waiting.len() <= MAX_WAITING);

        let client = get_page(addr);

        let n = receive_within(&mut transport, &mut buf, Duration::from_secs(3)).unwrap();
        assert_eq!(&buf[..n], b"GET / HTTP/1.0\r\n\r\n");

        transport.reply(b"ok\n").unwrap();

        assert!(client.join().unwrap().ends_with("\r\n\r\nok\n"));
    }

    #[test_log::test]
    fn test_idle_client_is_dropped_after_timeout() {
        let mut transport = TcpTransport::bind("127.0.0.1:0")
            .unwrap()
            .with_idle_timeout(Duration::from_millis(50));
        let addr = transport.local_addr().unwrap();

        let mut idle = TcpStream::connect(addr).unwrap();

        let mut buf = [0; 64];
        let start = Instant::now();
        while transport.waiting.is_empty() && start.elapsed() < Duration::from_secs(1) {
            assert!(transport.receive(&mut buf).unwrap().is_none());
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(transport.waiting.len(), 1);

        thread::sleep(Duration::from_millis(100));
        assert!(transport.receive(&mut buf).unwrap().is_none());
        assert!(transport.waiting.is_empty());

        // the server closed its end
        idle.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
        let mut rest = Vec::new();
        assert_eq!(idle.read_to_end(&mut rest).unwrap(), 0);
    }
}
