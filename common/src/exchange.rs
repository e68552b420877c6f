// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Encrypted query/response exchange (X25519-XSalsa20-Poly1305).
//
// Wire format (client → resolver):
//   [52 bytes: QueryHeader]  client magic | ephemeral pk | client nonce half
//   [N bytes:  box ciphertext (padded DNS query + 16-byte Poly1305 tag)]
//
// Wire format (resolver → client):
//   [32 bytes: ResponseHeader]  resolver magic | client nonce half | server nonce half
//   [N bytes:  box ciphertext (padded DNS response + tag)]

use std::net::SocketAddr;
use std::time::Duration;

use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::{Aead, OsRng};
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use hickory_proto::op::Message;
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable};
use rand::RngCore;
use tracing::debug;

use crate::error::{Error, Result};
use crate::padding;
use crate::transport;
use crate::wire::{
    CertificateFields, NonceHalf, QueryHeader, ResponseHeader, NONCE_HALF_LEN, QUERY_HEADER_LEN,
    RESOLVER_MAGIC, RESPONSE_HEADER_LEN,
};

/// State kept between sending a query and opening its response. Holds the
/// box precomputed from the ephemeral secret, which never leaves this value.
pub struct PendingQuery {
    cipher: SalsaBox,
    client_nonce: NonceHalf,
}

/// Encrypt a serialized DNS query for the resolver named by `cert`.
///
/// Returns the pending state and the datagram to send.
pub fn seal_query(query_wire: &[u8], cert: &CertificateFields) -> Result<(PendingQuery, Vec<u8>)> {
    // 1. Fresh key pair and nonce half for this exchange only
    let secret = SecretKey::generate(&mut OsRng);
    let mut client_nonce = [0u8; NONCE_HALF_LEN];
    OsRng.fill_bytes(&mut client_nonce);

    let header = QueryHeader {
        client_magic: cert.client_magic,
        client_public_key: *secret.public_key().as_bytes(),
        client_nonce,
    };

    // 2. Pad
    let mut plaintext = query_wire.to_vec();
    padding::add_padding(&mut plaintext);

    // 3. Seal with <client nonce><12 zeros>
    let cipher = SalsaBox::new(&PublicKey::from(cert.server_public_key), &secret);
    let sealed = cipher
        .encrypt(GenericArray::from_slice(&header.nonce()), plaintext.as_slice())
        .map_err(|_| Error::EncryptionFailed)?;

    // 4. Assemble wire format
    let mut datagram = Vec::with_capacity(QUERY_HEADER_LEN + sealed.len());
    datagram.extend_from_slice(&header.to_bytes());
    datagram.extend_from_slice(&sealed);

    Ok((
        PendingQuery {
            cipher,
            client_nonce,
        },
        datagram,
    ))
}

impl PendingQuery {
    pub fn client_nonce(&self) -> &NonceHalf {
        &self.client_nonce
    }

    /// Check the response header, decrypt, and strip padding.
    pub fn open_response(&self, datagram: &[u8]) -> Result<Vec<u8>> {
        let (head, sealed) = datagram.split_at(datagram.len().min(RESPONSE_HEADER_LEN));
        let header = ResponseHeader::from_bytes(head)?;

        if header.resolver_magic != RESOLVER_MAGIC {
            return Err(Error::BadResolverMagic);
        }
        if header.client_nonce != self.client_nonce {
            return Err(Error::NonceMismatch);
        }

        let plaintext = self
            .cipher
            .decrypt(GenericArray::from_slice(&header.nonce()), sealed)
            .map_err(|_| Error::DecryptionFailed)?;

        Ok(padding::remove_padding(&plaintext)?.to_vec())
    }
}

/// Send one encrypted query to `server` and return the decrypted response.
pub async fn exchange_encrypted(
    server: SocketAddr,
    query: &Message,
    cert: CertificateFields,
    timeout: Option<Duration>,
) -> Result<Message> {
    let wire = query.to_bytes()?;
    let (pending, datagram) = seal_query(&wire, &cert)?;
    debug!(%server, query_len = wire.len(), datagram_len = datagram.len(), "sending encrypted query");

    let reply = transport::udp_round_trip(server, &datagram, timeout).await?;
    let response = pending.open_response(&reply)?;

    Ok(Message::from_bytes(&response)?)
}
