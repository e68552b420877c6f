// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DNSCrypt Client — one-shot encrypted lookup
//
// Fetches the provider's signed certificate over plain DNS, verifies it
// against the provider's Ed25519 key, then sends a single query encrypted
// with X25519-XSalsa20-Poly1305 and prints the decrypted answer.

use std::fs;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use base64::Engine;
use clap::Parser;
use dnscrypt_common::cert;
use dnscrypt_common::exchange;
use dnscrypt_common::CertificateFields;
use ed25519_dalek::VerifyingKey;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use tracing::info;

#[derive(Parser)]
#[command(name = "dnscrypt-client", about = "DNSCrypt client (X25519-XSalsa20-Poly1305)")]
struct Args {
    /// DNSCrypt resolver address (UDP)
    #[arg(long)]
    server: SocketAddr,

    /// Provider name the certificate is published under
    #[arg(long)]
    provider_name: String,

    /// Provider Ed25519 public key (base64-encoded, 32 bytes decoded)
    #[arg(long, conflicts_with = "provider_key_file")]
    provider_key: Option<String>,

    /// Path to file containing the provider public key (raw bytes)
    #[arg(long, conflicts_with = "provider_key")]
    provider_key_file: Option<String>,

    /// Receive timeout per round trip (e.g. "500ms", "5s"); 0 waits forever
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    timeout: Duration,

    /// Name to look up
    #[arg(default_value = "example.com")]
    name: String,

    /// Record type to look up
    #[arg(long = "type", default_value = "A", value_parser = RecordType::from_str)]
    record_type: RecordType,

    /// Only fetch and verify the provider certificate, then print it
    #[arg(long)]
    cert: bool,
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Some(millis) = s.strip_suffix("ms") {
        let ms: u64 = millis.parse().map_err(|e| format!("invalid milliseconds: {e}"))?;
        Ok(Duration::from_millis(ms))
    } else if let Some(hours) = s.strip_suffix('h') {
        let h: u64 = hours.parse().map_err(|e| format!("invalid hours: {e}"))?;
        Ok(Duration::from_secs(h * 3600))
    } else if let Some(mins) = s.strip_suffix('m') {
        let m: u64 = mins.parse().map_err(|e| format!("invalid minutes: {e}"))?;
        Ok(Duration::from_secs(m * 60))
    } else if let Some(secs) = s.strip_suffix('s') {
        let s: u64 = secs.parse().map_err(|e| format!("invalid seconds: {e}"))?;
        Ok(Duration::from_secs(s))
    } else {
        let s: u64 = s.parse().map_err(|e| format!("invalid duration: {e}"))?;
        Ok(Duration::from_secs(s))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let provider_key = load_provider_key(&args)?;
    let timeout = (args.timeout > Duration::ZERO).then_some(args.timeout);

    let fields =
        cert::fetch_certificate(args.server, &args.provider_name, &provider_key, timeout).await?;
    info!(
        server = %args.server,
        provider = %args.provider_name,
        serial = fields.serial,
        "certificate verified"
    );

    if args.cert {
        print_certificate(&fields);
        return Ok(());
    }

    let query = build_query(&args.name, args.record_type)?;
    let response = exchange::exchange_encrypted(args.server, &query, fields, timeout).await?;
    info!(
        name = %args.name,
        qtype = ?args.record_type,
        rcode = ?response.response_code(),
        answers = response.answers().len(),
        "encrypted lookup complete"
    );

    for record in response.answers() {
        println!("{record}");
    }

    Ok(())
}

fn build_query(name: &str, record_type: RecordType) -> anyhow::Result<Message> {
    let mut name = Name::from_str(name)?;
    name.set_fqdn(true);

    let mut message = Message::new();
    message
        .set_id(rand::random())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(name, record_type));
    Ok(message)
}

fn print_certificate(fields: &CertificateFields) {
    let b64 = base64::engine::general_purpose::STANDARD;

    println!("DNSCrypt certificate (X25519-XSalsa20-Poly1305)");
    println!("===============================================");
    println!("Resolver public key: {}", b64.encode(fields.server_public_key));
    println!(
        "Client magic:        {}",
        String::from_utf8_lossy(&fields.client_magic)
    );
    println!("Serial:              {}", fields.serial);
    println!("Valid from:          {}", fields.valid_from);
    println!("Valid until:         {}", fields.valid_until);
}

fn load_provider_key(args: &Args) -> anyhow::Result<VerifyingKey> {
    let bytes = if let Some(ref b64) = args.provider_key {
        base64::engine::general_purpose::STANDARD.decode(b64)?
    } else if let Some(ref path) = args.provider_key_file {
        fs::read(path)?
    } else {
        anyhow::bail!("provide --provider-key (base64) or --provider-key-file (raw bytes)");
    };

    Ok(cert::provider_key_from_bytes(&bytes)?)
}
