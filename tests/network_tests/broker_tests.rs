//! Broker Tests
//!
//! Tests run a real broker on a loopback port and talk to it through
//! `TcpQueue`.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use queuekv::network::Server;
use queuekv::protocol::{read_request, write_response, Request, Response};
use queuekv::transport::{MemoryQueue, QueueTransport, ReceiptHandle, TcpQueue};
use queuekv::{Config, Consumer, Producer, QueueKvError};

const NO_WAIT: Duration = Duration::ZERO;
const VISIBILITY: Duration = Duration::from_secs(30);

struct Broker {
    server: Arc<Server>,
    queue: Arc<MemoryQueue>,
    addr: String,
    handle: Option<JoinHandle<()>>,
}

impl Broker {
    fn start(queue_name: &str) -> Self {
        let config = Config::builder()
            .queue_name(queue_name)
            .broker_addr("127.0.0.1:0")
            .max_connections(8)
            .build();
        let queue = Arc::new(MemoryQueue::new(queue_name));
        let server = Arc::new(Server::bind(config, Arc::clone(&queue)).unwrap());
        let addr = server.local_addr().unwrap().to_string();

        let handle = {
            let server = Arc::clone(&server);
            thread::spawn(move || server.run().unwrap())
        };

        Self {
            server,
            queue,
            addr,
            handle: Some(handle),
        }
    }
}

impl Drop for Broker {
    fn drop(&mut self) {
        self.server.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// =============================================================================
// Transport Tests
// =============================================================================

#[test]
fn test_probe_existing_queue() {
    let broker = Broker::start("orders.fifo");
    let client = TcpQueue::new(&broker.addr, "orders.fifo");
    client.probe().unwrap();
}

#[test]
fn test_probe_wrong_queue() {
    let broker = Broker::start("orders.fifo");
    let client = TcpQueue::new(&broker.addr, "missing.fifo");

    assert!(matches!(client.probe(), Err(QueueKvError::QueueNotFound(_))));
}

#[test]
fn test_probe_unreachable_broker() {
    // Bind then drop to find a port nobody listens on
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };
    let client = TcpQueue::new(addr, "q");

    assert!(matches!(client.probe(), Err(QueueKvError::Transport(_))));
}

#[test]
fn test_enqueue_receive_delete_over_tcp() {
    let broker = Broker::start("q");
    let client = TcpQueue::new(&broker.addr, "q");

    client.enqueue("Action: GetAllItems", "Allclients", "d1").unwrap();
    let batch = client.receive_batch(10, VISIBILITY, NO_WAIT).unwrap();

    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].body, "Action: GetAllItems");
    assert_eq!(broker.queue.in_flight(), 1);

    client.delete(&batch[0].receipt_handle).unwrap();
    assert!(broker.queue.is_empty());
}

#[test]
fn test_huge_wait_over_tcp() {
    let broker = Broker::start("q");
    let client = TcpQueue::new(&broker.addr, "q");

    client.enqueue("m", "g", "").unwrap();
    let batch = client.receive_batch(1, Duration::MAX, Duration::MAX).unwrap();

    assert_eq!(batch.len(), 1);
    assert_eq!(broker.queue.in_flight(), 1);
}

#[test]
fn test_delete_unknown_receipt_over_tcp() {
    let broker = Broker::start("q");
    let client = TcpQueue::new(&broker.addr, "q");

    let result = client.delete(&ReceiptHandle::new("nope"));
    assert!(matches!(result, Err(QueueKvError::ReceiptNotFound(_))));

    // The connection stays usable after an error response
    client.probe().unwrap();
}

/// Apply one delete request from `stream` to `queue`, optionally replying
fn serve_delete(stream: &TcpStream, queue: &MemoryQueue, reply: bool) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = BufWriter::new(stream.try_clone().unwrap());

    let receipt_handle = match read_request(&mut reader).unwrap() {
        Request::Delete { receipt_handle, .. } => receipt_handle,
        other => panic!("expected delete, got {:?}", other),
    };
    let response = match queue.delete(&receipt_handle) {
        Ok(()) => Response::Ok,
        Err(e) => Response::from_error(&e),
    };
    if reply {
        write_response(&mut writer, &response).unwrap();
    }
}

#[test]
fn test_resent_delete_after_lost_reply_succeeds() {
    let queue = Arc::new(MemoryQueue::new("q"));
    queue.enqueue("m", "g", "").unwrap();
    let receipt = queue.receive_batch(1, VISIBILITY, NO_WAIT).unwrap()[0]
        .receipt_handle
        .clone();

    // Fake broker: the first connection answers a ping, then applies the
    // delete and drops the connection before replying
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let fake = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let (first, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(first.try_clone().unwrap());
            let mut writer = BufWriter::new(first.try_clone().unwrap());
            assert!(matches!(read_request(&mut reader).unwrap(), Request::Ping { .. }));
            write_response(&mut writer, &Response::Pong).unwrap();

            serve_delete(&first, &queue, false);
            first.shutdown(Shutdown::Both).unwrap();

            let (second, _) = listener.accept().unwrap();
            serve_delete(&second, &queue, true);
        })
    };

    let client = TcpQueue::new(&addr, "q");
    client.probe().unwrap();
    client.delete(&receipt).unwrap();

    fake.join().unwrap();
    assert!(queue.is_empty());
}

#[test]
fn test_long_poll_over_tcp() {
    let broker = Broker::start("q");
    let client = Arc::new(TcpQueue::new(&broker.addr, "q"));

    let sender = {
        let client = Arc::clone(&client);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            client.enqueue("late", "g", "").unwrap();
        })
    };

    let start = Instant::now();
    let batch = client
        .receive_batch(10, VISIBILITY, Duration::from_secs(5))
        .unwrap();

    sender.join().unwrap();
    assert_eq!(batch.len(), 1);
    assert!(start.elapsed() < Duration::from_secs(4));
}

// =============================================================================
// End-to-End Tests
// =============================================================================

#[test]
fn test_producer_to_consumer_over_tcp() {
    let broker = Broker::start("kv.fifo");

    let config = Config::builder()
        .queue_name("kv.fifo")
        .broker_addr(broker.addr.clone())
        .wait_time(Duration::from_secs(1))
        .worker_count(4)
        .shutdown_timeout(Duration::from_secs(5))
        .build();

    let producer = Producer::new(
        Arc::new(TcpQueue::new(&broker.addr, "kv.fifo")),
        &config.group_id,
    );
    let consumer = Arc::new(
        Consumer::new(config, Arc::new(TcpQueue::new(&broker.addr, "kv.fifo"))).unwrap(),
    );
    let shutdown = consumer.shutdown_handle();
    let runner = {
        let consumer = Arc::clone(&consumer);
        thread::spawn(move || consumer.run().unwrap())
    };

    producer.add_item("k1", "v1").unwrap();
    producer.add_item("k2", "v2").unwrap();

    let store = consumer.store();
    let deadline = Instant::now() + Duration::from_secs(10);
    while store.len() < 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }

    shutdown.trigger();
    runner.join().unwrap();

    assert_eq!(store.get("k1"), Some("v1".to_string()));
    assert_eq!(store.get("k2"), Some("v2".to_string()));
    assert!(broker.queue.is_empty());
}
