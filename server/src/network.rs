//! Server network layer handling UDP requests and generation pushes

use crate::controller::GameController;
use crate::subscribers::{SubscriberManager, Subscription};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, ResponseStatus};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch, RwLock};

pub type NetworkResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Generations between daily-active-user summaries
const ACTIVITY_SUMMARY_INTERVAL: u64 = 60;

/// Receive buffer large enough for any UDP datagram
const RECV_BUFFER_SIZE: usize = 65_536;

/// How often silent subscribers are swept
const TIMEOUT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
}

/// UDP front end for a [`GameController`]
///
/// Requests are answered from their own task so slow responses never hold up
/// the receive loop. Subscribers get a `GenerationChanged` packet after every
/// tick and must fetch the new state themselves.
pub struct Server {
    socket: Arc<UdpSocket>,
    controller: Arc<GameController>,
    subscribers: Arc<RwLock<SubscriberManager>>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        controller: Arc<GameController>,
        max_subscribers: usize,
    ) -> NetworkResult<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            controller,
            subscribers: Arc::new(RwLock::new(SubscriberManager::new(max_subscribers))),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> NetworkResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn subscribers(&self) -> Arc<RwLock<SubscriberManager>> {
        Arc::clone(&self.subscribers)
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self, mut shutdown: watch::Receiver<bool>) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; RECV_BUFFER_SIZE];

            loop {
                let received = tokio::select! {
                    received = socket.recv_from(&mut buffer) => received,
                    _ = shutdown.changed() => break,
                };

                match received {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                debug!("Main loop gone, stopping receiver: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that drops silent subscribers
    fn spawn_timeout_checker(&self, mut shutdown: watch::Receiver<bool>) {
        let subscribers = Arc::clone(&self.subscribers);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TIMEOUT_CHECK_INTERVAL);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown.changed() => break,
                }

                let timed_out = {
                    let mut subscribers = subscribers.write().await;
                    subscribers.check_timeouts()
                };

                if !timed_out.is_empty() {
                    debug!("Dropped {} silent subscribers", timed_out.len());
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> NetworkResult<()> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    /// Answers a request packet, or returns `None` for packets that carry no reply
    pub async fn respond(controller: &GameController, packet: Packet) -> Option<Packet> {
        match packet {
            Packet::GetState { player_id } => {
                Some(Packet::GameState(controller.get_state(&player_id).await))
            }

            Packet::AddCell { player_id, x, y } => {
                Some(match controller.add_cell(x, y, &player_id).await {
                    Ok(state) => Packet::GameState(state),
                    Err(status) => Packet::Rejected { status },
                })
            }

            Packet::GetDailyActiveUsers => Some(match controller.daily_active_users() {
                Ok((date, count)) => Packet::DailyActiveUsers { date, count },
                Err(status) => Packet::Rejected { status },
            }),

            _ => None,
        }
    }

    /// Routes one incoming packet
    async fn handle_packet(&self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::GetState { .. } | Packet::AddCell { .. } | Packet::GetDailyActiveUsers => {
                let socket = Arc::clone(&self.socket);
                let controller = Arc::clone(&self.controller);

                tokio::spawn(async move {
                    if let Some(response) = Self::respond(&controller, packet).await {
                        if let Err(e) = Self::send_packet_impl(&socket, &response, addr).await {
                            error!("Failed to send response to {}: {}", addr, e);
                        }
                    }
                });
            }

            Packet::Subscribe => {
                let outcome = self.subscribers.write().await.subscribe(addr);
                if outcome == Subscription::Full {
                    warn!("Subscriber limit reached, refusing {}", addr);
                    let response = Packet::Rejected {
                        status: ResponseStatus::BadRequest,
                    };
                    if let Err(e) = Self::send_packet_impl(&self.socket, &response, addr).await {
                        error!("Failed to send rejection to {}: {}", addr, e);
                    }
                }
            }

            Packet::Unsubscribe => {
                self.subscribers.write().await.unsubscribe(&addr);
            }

            _ => {
                warn!("Unexpected packet type from {}", addr);
            }
        }
    }

    /// Pushes a generation change to every subscriber
    async fn broadcast_generation(&self, generation: u64) {
        let addrs = {
            let subscribers = self.subscribers.read().await;
            subscribers.addrs()
        };

        let packet = Packet::GenerationChanged { generation };
        for addr in addrs {
            if let Err(e) = Self::send_packet_impl(&self.socket, &packet, addr).await {
                error!("Failed to push generation to {}: {}", addr, e);
            }
        }

        if generation % ACTIVITY_SUMMARY_INTERVAL == 0 {
            self.controller.prune_activity();
            if let Ok((date, count)) = self.controller.daily_active_users() {
                info!("{} daily active users on {}", count, date);
            }
        }
    }

    /// Main server loop; returns once `shutdown` flips to true or its sender drops
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> NetworkResult<()> {
        self.spawn_network_receiver(shutdown.clone());
        self.spawn_timeout_checker(shutdown.clone());

        let mut changes = self.controller.game().subscribe();

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        }
                        None => break,
                    }
                },

                change = changes.recv() => {
                    match change {
                        Ok(change) => self.broadcast_generation(change.generation).await,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Missed {} generation notifications", skipped);
                            let generation = self.controller.game().generation().await;
                            self.broadcast_generation(generation).await;
                        }
                        Err(RecvError::Closed) => break,
                    }
                },

                _ = shutdown.changed() => break,
            }
        }

        info!("Server shutting down");
        Ok(())
    }
}
