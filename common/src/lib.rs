// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DNSCrypt Common — client protocol engine
//
// Cryptographic stack (DNSCrypt v2, es-version 0x0001):
//   Certificates: Ed25519 detached signatures (RFC 8032)
//   Key exchange: X25519
//   Symmetric:    XSalsa20-Poly1305 box construction
//   RNG:          OsRng

pub mod cert;
pub mod error;
pub mod exchange;
pub mod padding;
pub mod transport;
pub mod txt;
pub mod wire;

pub use cert::{fetch_certificate, provider_key_from_bytes};
pub use error::{Error, ErrorKind, Result};
pub use exchange::exchange_encrypted;
pub use wire::CertificateFields;
