//! Peer networking
//!
//! This module holds the peer registry, the client used to read peer
//! chains during conflict resolution, and the `/chain` endpoint that
//! lets other nodes read ours.

pub mod client;
pub mod node;
pub mod server;

pub use client::{HttpPeerClient, PeerChain, PeerClient};
pub use node::{Node, Nodes};
pub use server::ChainServer;
