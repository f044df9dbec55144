//! Decodes an aws-chunked request body captured to a file or piped on stdin.
//!
//! ```bash
//! s3s-chunked --input body.bin --output object.bin \
//!     --decoded-length 66560 --checksum-algorithm CRC32C --checksum-header x-amz-checksum-crc32c
//! ```
//!
//! Decoded bytes go to `--output` (stdout by default). A JSON summary is printed to stderr.

use s3s_chunked::{AwsChunkedReader, ChecksumAlgorithm, DecoderConfig};

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "s3s-chunked", version)]
#[command(about = "Decode an aws-chunked S3 upload body", long_about = None)]
struct Opt {
    /// JSON file with a decoder configuration. Flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Framed input (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Decoded output (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Expected decoded length (`x-amz-decoded-content-length`).
    /// Required unless the config file sets `decoded_content_length`.
    #[arg(long, required_unless_present = "config")]
    decoded_length: Option<u64>,

    /// Checksum to compute over the decoded bytes
    #[arg(long)]
    checksum_algorithm: Option<ChecksumAlgorithm>,

    /// Trailer header to capture, e.g. `x-amz-checksum-sha256`
    #[arg(long)]
    checksum_header: Option<String>,

    /// Accept chunk headers without signatures
    #[arg(long)]
    unsigned: bool,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    checksum_algorithm: Option<ChecksumAlgorithm>,
    checksum: Option<String>,
    trailer_checksum: Option<&'a str>,
    decoded_length: u64,
    chunk_count: u64,
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(opt: &Opt) -> anyhow::Result<DecoderConfig> {
    let (mut config, has_length) = if let Some(path) = &opt.config {
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let value: serde_json::Value =
            serde_json::from_reader(BufReader::new(file)).with_context(|| format!("invalid config file {}", path.display()))?;
        let has_length = value.get("decoded_content_length").is_some();
        let config: DecoderConfig = serde_json::from_value(value).with_context(|| format!("invalid config file {}", path.display()))?;
        (config, has_length)
    } else {
        (DecoderConfig::default(), false)
    };

    match opt.decoded_length {
        Some(len) => config.decoded_content_length = len,
        None if has_length => {}
        None => anyhow::bail!("the decoded length is unknown: pass --decoded-length or set decoded_content_length in the config file"),
    }
    if let Some(algorithm) = opt.checksum_algorithm {
        config.checksum_algorithm = Some(algorithm);
    }
    if let Some(name) = &opt.checksum_header {
        config.checksum_header_name = Some(name.clone());
    }
    if opt.unsigned {
        config.unsigned = true;
    }

    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    setup_tracing();

    let config = load_config(&opt)?;
    tracing::debug!(?config);

    let input: Box<dyn Read> = if let Some(path) = &opt.input {
        Box::new(File::open(path).with_context(|| format!("failed to open {}", path.display()))?)
    } else {
        Box::new(io::stdin().lock())
    };
    let output: Box<dyn Write> = if let Some(path) = &opt.output {
        Box::new(File::create(path).with_context(|| format!("failed to create {}", path.display()))?)
    } else {
        Box::new(io::stdout().lock())
    };

    let mut reader = AwsChunkedReader::from_read(input, config)?;
    let mut writer = BufWriter::new(output);

    let copied = io::copy(&mut reader, &mut writer).context("failed to decode body")?;
    writer.flush()?;

    tracing::info!(bytes = copied, chunks = reader.chunk_count(), "decoded");

    let summary = Summary {
        checksum_algorithm: reader.checksum_algorithm(),
        checksum: reader.checksum(),
        trailer_checksum: reader.trailer_checksum(),
        decoded_length: reader.read_decoded_length(),
        chunk_count: reader.chunk_count(),
    };
    eprintln!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
