// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixed-layout DNSCrypt wire structures (all integers big-endian).
//
// SignedCertificate (124 bytes):
//   [4: magic "DNSC"] [2: es-version major] [2: es-version minor]
//   [64: Ed25519 signature] [52: signed payload]
//
// Signed payload / CertificateFields (52 bytes):
//   [32: resolver X25519 pk] [8: client magic] [4: serial]
//   [4: ts-start] [4: ts-end]
//
// QueryHeader (52 bytes):
//   [8: client magic] [32: client X25519 pk] [12: client nonce half]
//
// ResponseHeader (32 bytes):
//   [8: resolver magic] [12: client nonce half] [12: server nonce half]

/// ASCII tag opening every certificate.
pub const CERT_MAGIC: [u8; 4] = *b"DNSC";
/// Tag opening every encrypted response.
pub const RESOLVER_MAGIC: [u8; 8] = [0x72, 0x36, 0x66, 0x6e, 0x76, 0x57, 0x6a, 0x38];
/// Largest UDP DNS payload: 65536 minus IPv4 (20) and UDP (8) headers.
pub const MAX_UDP_DNS_SIZE: usize = 65536 - 20 - 8;

/// Only the X25519-XSalsa20-Poly1305 construction is supported.
pub const ES_VERSION_XSALSA20POLY1305: u16 = 0x0001;

pub const PUBLIC_KEY_LEN: usize = 32;
pub const CLIENT_MAGIC_LEN: usize = 8;
pub const SIGNATURE_LEN: usize = 64;
pub const NONCE_HALF_LEN: usize = 12;
pub const NONCE_LEN: usize = 2 * NONCE_HALF_LEN;

pub const CERT_FIELDS_LEN: usize = PUBLIC_KEY_LEN + CLIENT_MAGIC_LEN + 4 + 4 + 4;
pub const SIGNED_CERT_LEN: usize = 4 + 2 + 2 + SIGNATURE_LEN + CERT_FIELDS_LEN;
pub const QUERY_HEADER_LEN: usize = CLIENT_MAGIC_LEN + PUBLIC_KEY_LEN + NONCE_HALF_LEN;
pub const RESPONSE_HEADER_LEN: usize = RESOLVER_MAGIC.len() + 2 * NONCE_HALF_LEN;

pub type NonceHalf = [u8; NONCE_HALF_LEN];
pub type Nonce = [u8; NONCE_LEN];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("{structure} must be exactly {expected} bytes, got {got}")]
    BadLength {
        structure: &'static str,
        expected: usize,
        got: usize,
    },
}

fn check_len(structure: &'static str, bytes: &[u8], expected: usize) -> Result<(), WireError> {
    if bytes.len() != expected {
        return Err(WireError::BadLength {
            structure,
            expected,
            got: bytes.len(),
        });
    }
    Ok(())
}

/// Sequential big-endian field reader over a slice whose length was already
/// validated by the caller.
struct Fields<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Fields<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u16(&mut self) -> u16 {
        u16::from_be_bytes(self.array())
    }

    fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.array())
    }
}

/// Outer certificate structure, only used to check the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCertificate {
    pub magic: [u8; 4],
    pub version_major: u16,
    pub version_minor: u16,
    pub signature: [u8; SIGNATURE_LEN],
    pub signed_payload: [u8; CERT_FIELDS_LEN],
}

impl SignedCertificate {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        check_len("certificate", bytes, SIGNED_CERT_LEN)?;
        let mut f = Fields::new(bytes);
        Ok(Self {
            magic: f.array(),
            version_major: f.u16(),
            version_minor: f.u16(),
            signature: f.array(),
            signed_payload: f.array(),
        })
    }

    pub fn to_bytes(&self) -> [u8; SIGNED_CERT_LEN] {
        let mut out = [0u8; SIGNED_CERT_LEN];
        out[..4].copy_from_slice(&self.magic);
        out[4..6].copy_from_slice(&self.version_major.to_be_bytes());
        out[6..8].copy_from_slice(&self.version_minor.to_be_bytes());
        out[8..8 + SIGNATURE_LEN].copy_from_slice(&self.signature);
        out[8 + SIGNATURE_LEN..].copy_from_slice(&self.signed_payload);
        out
    }
}

/// Inner certificate fields, decoded from the signed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateFields {
    pub server_public_key: [u8; PUBLIC_KEY_LEN],
    pub client_magic: [u8; CLIENT_MAGIC_LEN],
    pub serial: u32,
    pub valid_from: u32,
    pub valid_until: u32,
}

impl CertificateFields {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        check_len("certificate payload", bytes, CERT_FIELDS_LEN)?;
        let mut f = Fields::new(bytes);
        Ok(Self {
            server_public_key: f.array(),
            client_magic: f.array(),
            serial: f.u32(),
            valid_from: f.u32(),
            valid_until: f.u32(),
        })
    }

    pub fn to_bytes(&self) -> [u8; CERT_FIELDS_LEN] {
        let mut out = [0u8; CERT_FIELDS_LEN];
        out[..32].copy_from_slice(&self.server_public_key);
        out[32..40].copy_from_slice(&self.client_magic);
        out[40..44].copy_from_slice(&self.serial.to_be_bytes());
        out[44..48].copy_from_slice(&self.valid_from.to_be_bytes());
        out[48..52].copy_from_slice(&self.valid_until.to_be_bytes());
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryHeader {
    pub client_magic: [u8; CLIENT_MAGIC_LEN],
    pub client_public_key: [u8; PUBLIC_KEY_LEN],
    pub client_nonce: NonceHalf,
}

impl QueryHeader {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        check_len("query header", bytes, QUERY_HEADER_LEN)?;
        let mut f = Fields::new(bytes);
        Ok(Self {
            client_magic: f.array(),
            client_public_key: f.array(),
            client_nonce: f.array(),
        })
    }

    pub fn to_bytes(&self) -> [u8; QUERY_HEADER_LEN] {
        let mut out = [0u8; QUERY_HEADER_LEN];
        out[..8].copy_from_slice(&self.client_magic);
        out[8..40].copy_from_slice(&self.client_public_key);
        out[40..].copy_from_slice(&self.client_nonce);
        out
    }

    /// `<client nonce half><12 zero bytes>`
    pub fn nonce(&self) -> Nonce {
        query_nonce(&self.client_nonce)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub resolver_magic: [u8; 8],
    pub client_nonce: NonceHalf,
    pub server_nonce: NonceHalf,
}

impl ResponseHeader {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        check_len("response header", bytes, RESPONSE_HEADER_LEN)?;
        let mut f = Fields::new(bytes);
        Ok(Self {
            resolver_magic: f.array(),
            client_nonce: f.array(),
            server_nonce: f.array(),
        })
    }

    pub fn to_bytes(&self) -> [u8; RESPONSE_HEADER_LEN] {
        let mut out = [0u8; RESPONSE_HEADER_LEN];
        out[..8].copy_from_slice(&self.resolver_magic);
        out[8..20].copy_from_slice(&self.client_nonce);
        out[20..].copy_from_slice(&self.server_nonce);
        out
    }

    /// `<client nonce half><server nonce half>`
    pub fn nonce(&self) -> Nonce {
        response_nonce(&self.client_nonce, &self.server_nonce)
    }
}

pub fn query_nonce(client: &NonceHalf) -> Nonce {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[..NONCE_HALF_LEN].copy_from_slice(client);
    nonce
}

pub fn response_nonce(client: &NonceHalf, server: &NonceHalf) -> Nonce {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[..NONCE_HALF_LEN].copy_from_slice(client);
    nonce[NONCE_HALF_LEN..].copy_from_slice(server);
    nonce
}
