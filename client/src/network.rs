use bincode::{deserialize, serialize};
use chrono::NaiveDate;
use log::{debug, warn};
use shared::{restore, Board, CodecError, GameStateResponse, Packet, ResponseStatus};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::{timeout, Instant};

/// Receive buffer large enough for any UDP datagram
const RECV_BUFFER_SIZE: usize = 65_536;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid server address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("packet encoding error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("no response from server within {0:?}")]
    Timeout(Duration),

    #[error("server rejected the request: {0:?}")]
    Rejected(ResponseStatus),

    #[error("unexpected packet from server: {0}")]
    UnexpectedPacket(String),

    #[error("corrupt board in response: {0}")]
    Restore(#[from] CodecError),
}

impl ClientError {
    /// Rejections caused by the request itself rather than by the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, ClientError::Rejected(status) if status.is_client_error())
    }
}

/// Game state with the board already unpacked
#[derive(Debug, Clone, PartialEq)]
pub struct GameView {
    pub board: Board,
    pub generation: u64,
    pub time_until_next_generation: Duration,
    pub next_generation_interval: Duration,
    pub cells_left: u32,
    pub max_cells_per_player_per_generation: u32,
}

impl TryFrom<GameStateResponse> for GameView {
    type Error = CodecError;

    fn try_from(response: GameStateResponse) -> Result<Self, Self::Error> {
        Ok(GameView {
            board: restore(&response.living_cells)?,
            generation: response.generation,
            time_until_next_generation: response.time_until_next_generation,
            next_generation_interval: response.next_generation_interval,
            cells_left: response.cells_left,
            max_cells_per_player_per_generation: response.max_cells_per_player_per_generation,
        })
    }
}

/// UDP client for one player
///
/// Requests are answered one at a time. `GenerationChanged` pushes that arrive
/// while a request is outstanding are kept and handed out by
/// [`LifeClient::next_generation`].
pub struct LifeClient {
    socket: UdpSocket,
    server_addr: SocketAddr,
    player_id: String,
    request_timeout: Duration,
    pending_generation: Option<u64>,
    buffer: Vec<u8>,
}

impl LifeClient {
    pub async fn new(
        server_addr: &str,
        player_id: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let server_addr: SocketAddr = server_addr.parse()?;
        let bind_addr = if server_addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr).await?;

        Ok(LifeClient {
            socket,
            server_addr,
            player_id: player_id.into(),
            request_timeout,
            pending_generation: None,
            buffer: vec![0u8; RECV_BUFFER_SIZE],
        })
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub async fn get_state(&mut self) -> Result<GameView, ClientError> {
        let packet = Packet::GetState {
            player_id: self.player_id.clone(),
        };
        self.request_state(&packet).await
    }

    /// Adds a live cell at `(x, y)` and returns the state right after it
    pub async fn add_cell(&mut self, x: i64, y: i64) -> Result<GameView, ClientError> {
        let packet = Packet::AddCell {
            player_id: self.player_id.clone(),
            x,
            y,
        };
        self.request_state(&packet).await
    }

    /// Distinct players the server has seen today
    pub async fn daily_active_users(&mut self) -> Result<(NaiveDate, usize), ClientError> {
        match self.request(&Packet::GetDailyActiveUsers).await? {
            Packet::DailyActiveUsers { date, count } => Ok((date, count)),
            other => Err(Self::unexpected(other)),
        }
    }

    /// Subscribes to generation pushes, or refreshes an existing subscription
    ///
    /// Subscriptions lapse when not refreshed for 30 seconds.
    pub async fn subscribe(&self) -> Result<(), ClientError> {
        self.send(&Packet::Subscribe).await
    }

    pub async fn unsubscribe(&self) -> Result<(), ClientError> {
        self.send(&Packet::Unsubscribe).await
    }

    /// Waits up to `wait` for the next `GenerationChanged` push
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    pub async fn next_generation(&mut self, wait: Duration) -> Result<Option<u64>, ClientError> {
        if let Some(generation) = self.pending_generation.take() {
            return Ok(Some(generation));
        }

        let deadline = Instant::now() + wait;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let packet = match timeout(remaining, self.recv()).await {
                Ok(packet) => packet?,
                Err(_) => return Ok(None),
            };

            match packet {
                Packet::GenerationChanged { generation } => return Ok(Some(generation)),
                Packet::Rejected { status } => return Err(ClientError::Rejected(status)),
                other => debug!("Ignoring stale packet: {:?}", other),
            }
        }
    }

    async fn request_state(&mut self, packet: &Packet) -> Result<GameView, ClientError> {
        match self.request(packet).await? {
            Packet::GameState(response) => Ok(GameView::try_from(response)?),
            Packet::Rejected { status } => Err(ClientError::Rejected(status)),
            other => Err(Self::unexpected(other)),
        }
    }

    /// Sends `packet` and waits for the first reply that is not a push
    async fn request(&mut self, packet: &Packet) -> Result<Packet, ClientError> {
        self.send(packet).await?;

        let request_timeout = self.request_timeout;
        let deadline = Instant::now() + request_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let received = timeout(remaining, self.recv())
                .await
                .map_err(|_| ClientError::Timeout(request_timeout))??;

            match received {
                Packet::GenerationChanged { generation } => {
                    self.pending_generation = Some(generation);
                }
                reply => return Ok(reply),
            }
        }
    }

    async fn send(&self, packet: &Packet) -> Result<(), ClientError> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    /// Next well-formed packet from the server; others are skipped
    async fn recv(&mut self) -> Result<Packet, ClientError> {
        loop {
            let (len, addr) = self.socket.recv_from(&mut self.buffer).await?;
            if addr != self.server_addr {
                warn!("Dropping packet from unknown sender {}", addr);
                continue;
            }

            match deserialize::<Packet>(&self.buffer[..len]) {
                Ok(packet) => return Ok(packet),
                Err(e) => warn!("Failed to deserialize packet from server: {}", e),
            }
        }
    }

    fn unexpected(packet: Packet) -> ClientError {
        ClientError::UnexpectedPacket(format!("{:?}", packet))
    }
}
