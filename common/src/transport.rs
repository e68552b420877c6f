// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// UDP transport: one datagram out, one datagram back.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use hickory_proto::op::Message;
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::{Error, Result};
use crate::wire::MAX_UDP_DNS_SIZE;

/// Send `payload` to `server` and return the first datagram received back.
///
/// The socket lives only for the duration of the call. With `timeout` set to
/// `None` the receive waits indefinitely.
pub async fn udp_round_trip(
    server: SocketAddr,
    payload: &[u8],
    timeout: Option<Duration>,
) -> Result<Vec<u8>> {
    let local: SocketAddr = match server {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(server).await?;
    socket.send(payload).await?;
    debug!(%server, len = payload.len(), "datagram sent");

    let mut buf = vec![0u8; MAX_UDP_DNS_SIZE];
    let len = match timeout {
        Some(limit) => tokio::time::timeout(limit, socket.recv(&mut buf))
            .await
            .map_err(|_| Error::Timeout(server))??,
        None => socket.recv(&mut buf).await?,
    };
    buf.truncate(len);
    debug!(%server, len, "datagram received");

    Ok(buf)
}

/// Plain (unencrypted) DNS exchange over UDP.
pub async fn exchange_plain(
    server: SocketAddr,
    query: &Message,
    timeout: Option<Duration>,
) -> Result<Message> {
    let wire = query.to_bytes()?;
    let reply = udp_round_trip(server, &wire, timeout).await?;
    let response = Message::from_bytes(&reply)?;

    if response.id() != query.id() {
        return Err(Error::IdMismatch {
            expected: query.id(),
            got: response.id(),
        });
    }
    Ok(response)
}
