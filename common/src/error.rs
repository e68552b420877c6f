// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error taxonomy for certificate discovery and the encrypted exchange.

use std::net::SocketAddr;

use hickory_proto::error::ProtoError;
use hickory_proto::rr::RecordType;

use crate::padding::PaddingError;
use crate::txt::UnescapeError;
use crate::wire::WireError;

/// Coarse failure category, for callers that branch on the class of error
/// rather than on the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Socket, timeout, or DNS message codec failure.
    Transport,
    /// Input that does not have the expected shape.
    Malformed,
    /// Signature or AEAD failure.
    Crypto,
    /// Clock or certificate validity window.
    Temporal,
    /// The server did not offer what the protocol requires.
    Protocol,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no response from {0} before the timeout")]
    Timeout(SocketAddr),

    #[error("DNS message error: {0}")]
    Dns(#[from] ProtoError),

    #[error("response id {got} does not match query id {expected}")]
    IdMismatch { expected: u16, got: u16 },

    #[error("no answer to certificate query for {0}")]
    NoAnswer(String),

    #[error("certificate answer is a {0} record, not TXT")]
    NotTxt(RecordType),

    #[error("TXT record is not a DNSCrypt certificate")]
    NotCertificate,

    #[error(transparent)]
    Unescape(#[from] UnescapeError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("no certificate for a supported crypto construction found")]
    NoSupportedCertificate,

    #[error("invalid provider public key")]
    InvalidProviderKey,

    #[error("invalid certificate signature")]
    InvalidSignature,

    #[error("system clock is set before 1970")]
    ClockBeforeEpoch,

    #[error("certificate is not valid before {start} (now {now})")]
    NotYetValid { start: u32, now: u64 },

    #[error("certificate expired at {end} (now {now})")]
    Expired { end: u32, now: u64 },

    #[error("response magic does not match")]
    BadResolverMagic,

    #[error("response does not echo the query nonce")]
    NonceMismatch,

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("could not decrypt response: authentication failure or data corruption")]
    DecryptionFailed,

    #[error(transparent)]
    Padding(#[from] PaddingError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::Timeout(_) | Error::Dns(_) | Error::IdMismatch { .. } => {
                ErrorKind::Transport
            }
            Error::NotTxt(_)
            | Error::NotCertificate
            | Error::Unescape(_)
            | Error::Wire(_)
            | Error::InvalidProviderKey
            | Error::BadResolverMagic
            | Error::Padding(_) => ErrorKind::Malformed,
            Error::InvalidSignature | Error::EncryptionFailed | Error::DecryptionFailed => {
                ErrorKind::Crypto
            }
            Error::ClockBeforeEpoch | Error::NotYetValid { .. } | Error::Expired { .. } => {
                ErrorKind::Temporal
            }
            Error::NoAnswer(_) | Error::NoSupportedCertificate | Error::NonceMismatch => {
                ErrorKind::Protocol
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
