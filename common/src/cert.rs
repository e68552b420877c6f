// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certificate discovery: the provider publishes signed certificates as TXT
// records under its provider name. Each certificate binds a short-term
// X25519 resolver key to a validity window and is signed with the
// provider's long-term Ed25519 key.

use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RData, RecordType};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::transport;
use crate::txt;
use crate::wire::{CertificateFields, SignedCertificate, CERT_MAGIC, ES_VERSION_XSALSA20POLY1305};

/// Parse the provider's 32-byte Ed25519 public key.
pub fn provider_key_from_bytes(bytes: &[u8]) -> Result<VerifyingKey> {
    let bytes: [u8; 32] = bytes.try_into().map_err(|_| Error::InvalidProviderKey)?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| Error::InvalidProviderKey)
}

/// Fetch, verify and time-check the provider's certificate.
pub async fn fetch_certificate(
    server: SocketAddr,
    provider_name: &str,
    provider_key: &VerifyingKey,
    timeout: Option<Duration>,
) -> Result<CertificateFields> {
    fetch_certificate_with_clock(server, provider_name, provider_key, timeout, SystemTime::now)
        .await
}

/// As [`fetch_certificate`], reading the current time from `clock` once the
/// signature has been checked.
pub async fn fetch_certificate_with_clock(
    server: SocketAddr,
    provider_name: &str,
    provider_key: &VerifyingKey,
    timeout: Option<Duration>,
    clock: impl FnOnce() -> SystemTime,
) -> Result<CertificateFields> {
    let query = txt_query(provider_name)?;
    let response = transport::exchange_plain(server, &query, timeout).await?;
    if response.answers().is_empty() {
        return Err(Error::NoAnswer(provider_name.to_string()));
    }

    let texts = certificate_texts(&response)?;
    let signed = select_certificate(&texts)?;
    let fields = signed.verify(provider_key)?;
    fields.check_validity(unix_seconds(clock())?)?;

    debug!(
        %server,
        provider = provider_name,
        serial = fields.serial,
        valid_from = fields.valid_from,
        valid_until = fields.valid_until,
        "certificate accepted"
    );
    Ok(fields)
}

/// Build a recursive TXT query for the provider name.
pub fn txt_query(provider_name: &str) -> Result<Message> {
    let mut name = Name::from_ascii(provider_name)?;
    name.set_fqdn(true);

    let mut message = Message::new();
    message
        .set_id(OsRng.next_u32() as u16)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(name, RecordType::TXT));
    Ok(message)
}

/// Render each TXT answer in escaped text form, its character-strings
/// joined. Any non-TXT answer fails the whole set.
pub fn certificate_texts(response: &Message) -> Result<Vec<Vec<u8>>> {
    response
        .answers()
        .iter()
        .map(|record| match record.data() {
            Some(RData::TXT(txt)) => Ok(txt::escape(&txt.txt_data().concat())),
            _ => Err(Error::NotTxt(record.record_type())),
        })
        .collect()
}

/// Pick the certificate to use from the escaped TXT texts.
///
/// Texts not starting with `DNSC` abort the scan. Certificates for other
/// constructions are skipped, and when several supported certificates are
/// present the last one wins.
pub fn select_certificate<T: AsRef<[u8]>>(texts: &[T]) -> Result<SignedCertificate> {
    let mut selected = None;

    for text in texts {
        let text = text.as_ref();
        if !text.starts_with(&CERT_MAGIC) {
            return Err(Error::NotCertificate);
        }

        let raw = txt::unescape(text)?;
        let cert = SignedCertificate::from_bytes(&raw)?;

        if cert.version_major != ES_VERSION_XSALSA20POLY1305 {
            warn!(
                version_major = cert.version_major,
                version_minor = cert.version_minor,
                "skipping certificate for unsupported construction"
            );
            continue;
        }
        selected = Some(cert);
    }

    selected.ok_or(Error::NoSupportedCertificate)
}

/// Select, verify, and time-check a certificate against `now`.
pub fn validate_certificate<T: AsRef<[u8]>>(
    texts: &[T],
    provider_key: &VerifyingKey,
    now: u64,
) -> Result<CertificateFields> {
    let fields = select_certificate(texts)?.verify(provider_key)?;
    fields.check_validity(now)?;
    Ok(fields)
}

impl SignedCertificate {
    /// Check the detached signature over the signed payload, then decode it.
    pub fn verify(&self, provider_key: &VerifyingKey) -> Result<CertificateFields> {
        let signature = Signature::from_bytes(&self.signature);
        provider_key
            .verify(&self.signed_payload, &signature)
            .map_err(|_| Error::InvalidSignature)?;
        Ok(CertificateFields::from_bytes(&self.signed_payload)?)
    }
}

impl CertificateFields {
    /// Both ends of the window are inclusive.
    pub fn check_validity(&self, now: u64) -> Result<()> {
        if now < u64::from(self.valid_from) {
            return Err(Error::NotYetValid {
                start: self.valid_from,
                now,
            });
        }
        if now > u64::from(self.valid_until) {
            return Err(Error::Expired {
                end: self.valid_until,
                now,
            });
        }
        Ok(())
    }
}

/// Seconds since the epoch; a clock set before 1970 is an error.
pub fn unix_now() -> Result<u64> {
    unix_seconds(SystemTime::now())
}

pub fn unix_seconds(time: SystemTime) -> Result<u64> {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| Error::ClockBeforeEpoch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::wire::CERT_FIELDS_LEN;
    use ed25519_dalek::{Signer, SigningKey};
    use hickory_proto::rr::rdata::{A, TXT};
    use hickory_proto::rr::Record;

    const START: u32 = 1_700_000_000;
    const END: u32 = 1_800_000_000;

    fn provider() -> SigningKey {
        SigningKey::from_bytes(&[42u8; 32])
    }

    fn fields(serial: u32) -> CertificateFields {
        CertificateFields {
            server_public_key: [serial as u8; 32],
            client_magic: *b"q6fnvWj8",
            serial,
            valid_from: START,
            valid_until: END,
        }
    }

    fn signed(key: &SigningKey, version_major: u16, inner: &CertificateFields) -> SignedCertificate {
        let payload = inner.to_bytes();
        SignedCertificate {
            magic: CERT_MAGIC,
            version_major,
            version_minor: 0,
            signature: key.sign(&payload).to_bytes(),
            signed_payload: payload,
        }
    }

    fn text(cert: &SignedCertificate) -> Vec<u8> {
        txt::escape(&cert.to_bytes())
    }

    #[test]
    fn validates_well_formed_certificate() {
        let key = provider();
        let texts = [text(&signed(&key, 1, &fields(1)))];

        let got = validate_certificate(&texts, &key.verifying_key(), u64::from(START) + 10).unwrap();
        assert_eq!(got, fields(1));
    }

    #[test]
    fn any_signed_byte_mutation_breaks_signature() {
        let key = provider();
        let cert = signed(&key, 1, &fields(1));
        for i in 0..CERT_FIELDS_LEN {
            let mut tampered = cert.clone();
            tampered.signed_payload[i] ^= 0x01;
            assert!(matches!(
                tampered.verify(&key.verifying_key()),
                Err(Error::InvalidSignature)
            ));
        }
    }

    #[test]
    fn wrong_provider_key_fails() {
        let cert = signed(&provider(), 1, &fields(1));
        let other = SigningKey::from_bytes(&[7u8; 32]);
        assert!(matches!(
            cert.verify(&other.verifying_key()),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn validity_window_is_inclusive() {
        let f = fields(1);
        assert!(f.check_validity(u64::from(START)).is_ok());
        assert!(f.check_validity(u64::from(END)).is_ok());
        assert!(matches!(
            f.check_validity(u64::from(END) + 1),
            Err(Error::Expired { .. })
        ));
        let err = f.check_validity(u64::from(START) - 1).unwrap_err();
        assert!(matches!(err, Error::NotYetValid { .. }));
        assert_eq!(err.kind(), ErrorKind::Temporal);
    }

    #[test]
    fn clock_before_epoch_is_rejected() {
        let err = unix_seconds(UNIX_EPOCH - Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::ClockBeforeEpoch));
        assert_eq!(err.kind(), ErrorKind::Temporal);
        assert_eq!(unix_seconds(UNIX_EPOCH + Duration::from_secs(90)).unwrap(), 90);
    }

    #[test]
    fn version_one_wins_in_either_order() {
        let key = provider();
        let v1 = text(&signed(&key, 1, &fields(1)));
        let v2 = text(&signed(&key, 2, &fields(2)));
        let now = u64::from(START);

        let a = validate_certificate(&[v1.clone(), v2.clone()], &key.verifying_key(), now).unwrap();
        let b = validate_certificate(&[v2, v1], &key.verifying_key(), now).unwrap();
        assert_eq!(a.serial, 1);
        assert_eq!(b.serial, 1);
    }

    #[test]
    fn last_supported_certificate_wins() {
        let key = provider();
        let texts = [
            text(&signed(&key, 1, &fields(10))),
            text(&signed(&key, 1, &fields(11))),
        ];
        let got = validate_certificate(&texts, &key.verifying_key(), u64::from(START)).unwrap();
        assert_eq!(got.serial, 11);
    }

    #[test]
    fn only_unsupported_versions_fail() {
        let key = provider();
        let texts = [text(&signed(&key, 2, &fields(1)))];
        assert!(matches!(
            select_certificate(&texts),
            Err(Error::NoSupportedCertificate)
        ));
        let empty: [Vec<u8>; 0] = [];
        assert!(matches!(
            select_certificate(&empty),
            Err(Error::NoSupportedCertificate)
        ));
    }

    #[test]
    fn non_certificate_text_aborts_scan() {
        let key = provider();
        let texts = [
            text(&signed(&key, 1, &fields(1))),
            b"v=spf1 -all".to_vec(),
        ];
        assert!(matches!(
            select_certificate(&texts),
            Err(Error::NotCertificate)
        ));
    }

    #[test]
    fn truncated_certificate_is_malformed() {
        let key = provider();
        let raw = signed(&key, 1, &fields(1)).to_bytes();
        let texts = [txt::escape(&raw[..100])];
        let err = select_certificate(&texts).unwrap_err();
        assert!(matches!(err, Error::Wire(_)));
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn bad_escape_is_reported() {
        let texts = [b"DNSC\\q".to_vec()];
        assert!(matches!(
            select_certificate(&texts),
            Err(Error::Unescape(_))
        ));
    }

    #[test]
    fn provider_key_length_checked() {
        assert!(matches!(
            provider_key_from_bytes(&[0u8; 31]),
            Err(Error::InvalidProviderKey)
        ));
        let key = provider().verifying_key();
        assert_eq!(provider_key_from_bytes(key.as_bytes()).unwrap(), key);
    }

    #[test]
    fn txt_query_is_fully_qualified() {
        let query = txt_query("2.dnscrypt-cert.example.com").unwrap();
        let q = &query.queries()[0];
        assert!(q.name().is_fqdn());
        assert_eq!(q.query_type(), RecordType::TXT);
        assert!(query.recursion_desired());
    }

    #[test]
    fn texts_require_txt_answers() {
        let name = Name::from_ascii("provider.example.").unwrap();
        let key = provider();
        let raw = signed(&key, 1, &fields(1)).to_bytes();

        let mut response = Message::new();
        response.add_answer(Record::from_rdata(
            name.clone(),
            60,
            RData::TXT(TXT::from_bytes(vec![&raw[..60], &raw[60..]])),
        ));
        let texts = certificate_texts(&response).unwrap();
        assert_eq!(texts, vec![txt::escape(&raw)]);

        response.add_answer(Record::from_rdata(name, 60, RData::A(A::new(192, 0, 2, 1))));
        assert!(matches!(
            certificate_texts(&response),
            Err(Error::NotTxt(RecordType::A))
        ));
    }
}
