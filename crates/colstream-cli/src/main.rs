//! colstream CLI: encode CSV into block streams, inspect and decode them.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colstream_core::block::EncodingKind;
use colstream_core::config::StreamConfig;
use colstream_core::schema::Schema;
use colstream_io::readers::csv::CsvBlockReader;
use colstream_io::writers::csv::CsvBlockWriter;
use colstream_io::{
    read_blocks, BlocksWriter, ByteSink, CodecTag, PositionedReader, PositionedWriter,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Stream(#[from] colstream_io::Error),
    #[error(transparent)]
    Core(#[from] colstream_core::error::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Config(#[from] serde_yaml::Error),
}

#[derive(Parser)]
#[command(name = "colstream")]
#[command(about = "Write, inspect and decode column block streams", long_about = None)]
struct Cli {
    /// YAML stream config (defaults and COLSTREAM_* env vars otherwise)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a headered CSV file into a block stream
    Encode {
        #[arg(short, long)]
        input: PathBuf,

        /// Schema definition, e.g. "id:int64,name:utf8?"
        #[arg(short, long)]
        schema: String,

        #[arg(short, long)]
        output: PathBuf,

        /// uncompressed | rle | dictionary (overrides config)
        #[arg(long)]
        encoding: Option<String>,

        /// Tuples per block (overrides config)
        #[arg(long)]
        block_rows: Option<usize>,
    },

    /// Print the header and per-block positions of a stream
    Inspect {
        #[arg(short, long)]
        input: PathBuf,

        /// Global position of the first tuple
        #[arg(long, default_value_t = 0)]
        start: u64,
    },

    /// Decode a stream back into CSV
    Decode {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        for s in e.suggestions() {
            eprintln!("  hint: {}", s);
        }
        std::process::exit(1);
    }
}

impl CliError {
    /// Hints for domain errors, including those wrapped by the I/O layer.
    fn suggestions(&self) -> Vec<String> {
        match self {
            CliError::Core(core) | CliError::Stream(colstream_io::Error::Core(core)) => {
                core.suggestions()
            }
            _ => Vec::new(),
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Encode {
            input,
            schema,
            output,
            encoding,
            block_rows,
        } => {
            let mut config = config;
            if let Some(e) = encoding {
                config.encoding = EncodingKind::parse(&e)?;
            }
            if let Some(n) = block_rows {
                config.block_rows = n;
            }
            encode(&input, &schema, &output, &config)
        }
        Commands::Inspect { input, start } => inspect(&input, start, &config),
        Commands::Decode { input, output } => decode(&input, &output, &config),
    }
}

fn load_config(path: Option<&Path>) -> Result<StreamConfig, CliError> {
    let config = match path {
        Some(p) => serde_yaml::from_str(&fs::read_to_string(p)?)?,
        None => StreamConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

fn encode(input: &Path, schema: &str, output: &Path, config: &StreamConfig) -> Result<(), CliError> {
    let schema = Schema::parse(schema)?;
    let reader = CsvBlockReader::from_path(input, schema.clone(), config)?;
    let sink = PositionedWriter::create_file(output, config.read_buffer_bytes)?;

    // Bound up front so an empty CSV still produces a readable stream.
    let tag = CodecTag::for_kind(config.encoding);
    let mut writer = BlocksWriter::bound(sink, tag, schema)?;
    let mut blocks = 0u64;
    for block in reader {
        writer.append(&block?)?;
        blocks += 1;
    }
    let sink = writer.finish()?;

    tracing::info!(blocks, bytes = sink.position(), "encoded stream");
    println!(
        "✓ Wrote {} blocks ({} bytes) to {}",
        blocks,
        sink.position(),
        output.display()
    );
    Ok(())
}

fn inspect(input: &Path, start: u64, config: &StreamConfig) -> Result<(), CliError> {
    let source = PositionedReader::open_file(input, config.read_buffer_bytes)?;
    let reader = read_blocks(source, start)?;

    println!("codec:  {}", reader.codec_tag());
    println!("schema:");
    for f in &reader.schema().fields {
        println!(
            "  {}: {}{}",
            f.name,
            f.data_type.name(),
            if f.nullable { "?" } else { "" }
        );
    }

    let mut blocks = 0u64;
    let mut tuples = 0u64;
    for (idx, block) in reader.enumerate() {
        let block = block?;
        println!(
            "block {:>5}  offset {:>10}  count {:>8}  {}",
            idx,
            block.start_position(),
            block.count(),
            block.kind()
        );
        blocks += 1;
        tuples = tuples.saturating_add(block.count());
    }
    println!("{} blocks, {} tuples", blocks, tuples);
    Ok(())
}

fn decode(input: &Path, output: &Path, config: &StreamConfig) -> Result<(), CliError> {
    let source = PositionedReader::open_file(input, config.read_buffer_bytes)?;
    let mut writer = CsvBlockWriter::to_path(output)?;
    for block in read_blocks(source, 0)? {
        writer.write_block(&block?)?;
    }
    let rows = writer.rows_written();
    writer.finish()?;
    println!("✓ Wrote {} rows to {}", rows, output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_error() -> colstream_core::error::Error {
        colstream_core::error::Error::Schema("value does not match field 'id'".into())
    }

    #[test]
    fn hints_for_core_errors() {
        assert!(!CliError::Core(field_error()).suggestions().is_empty());
    }

    #[test]
    fn hints_for_core_errors_wrapped_by_stream_layer() {
        let wrapped = CliError::Stream(colstream_io::Error::Core(field_error()));
        assert!(!wrapped.suggestions().is_empty());

        let with_context =
            CliError::Stream(colstream_io::Error::from(field_error()).with_context("line 4"));
        assert_eq!(with_context.suggestions(), wrapped.suggestions());
    }

    #[test]
    fn no_hints_for_malformed_streams() {
        let err = CliError::Stream(colstream_io::Error::UnknownCodecTag(9));
        assert!(err.suggestions().is_empty());
    }
}
