//! # Life Arena Client Library
//!
//! Client side of the shared Game of Life board: a UDP request/response
//! connection for one player plus terminal rendering of what it receives.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! - `LifeClient` sends `bincode`-encoded `shared::Packet`s and waits for replies
//! - Responses are unpacked into a `GameView` with the full `Board`
//! - `GenerationChanged` pushes arriving mid-request are kept for `next_generation`
//! - Server rejections surface as `ClientError::Rejected`
//!
//! ### Display Module (`display`)
//! Renders a `GameView` as a header line followed by one text row per board row.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::display::render_view;
//! use client::network::LifeClient;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), client::network::ClientError> {
//!     let mut client = LifeClient::new("127.0.0.1:8080", "alice", Duration::from_secs(2)).await?;
//!
//!     let view = client.add_cell(10, 10).await?;
//!     print!("{}", render_view(&view));
//!
//!     client.subscribe().await?;
//!     if let Some(generation) = client.next_generation(Duration::from_secs(10)).await? {
//!         println!("generation {} started", generation);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Delivery
//!
//! Datagrams can be lost. Every request carries its own timeout and the
//! caller decides whether to retry. Pushes are hints only: after one
//! arrives, fetch the state with `get_state`.

pub mod display;
pub mod network;
