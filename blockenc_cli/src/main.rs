use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use blockenc_codecs::{codec_name, Lz4Codec, Lz4Opts, PassThroughCodec, ZstdCodec, ZstdOpts};
use blockenc_core::format::{CODEC_LZ4, CODEC_PASSTHROUGH, CODEC_ZSTD};
use blockenc_core::types::{from_le_bytes, to_le_bytes};
use blockenc_core::{
    Block, DataType, Dim0, Dim1, EncodedField, FieldReader, FieldWriter, ShapeDefaults, Shape,
    TypeDescriptor, TypeDescriptorTag,
};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "blockenc",
    about = "Block-encode typed column files, inspect field records, and replay them",
    version
)]
struct Cli {
    /// Log encoder activity (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a raw little-endian column file into block-encoded bytes plus a manifest
    Encode {
        /// Raw column file: back-to-back little-endian values
        input: PathBuf,
        /// Destination for the encoded bytes
        output: PathBuf,
        /// Element type: u8 | u16 | u32 | u64 | i8 | i16 | i32 | i64 | f32 | f64
        #[arg(short, long, default_value = "i64")]
        dtype: String,
        /// Codec to use: passthrough | zstd | lz4
        #[arg(short, long, default_value = "zstd")]
        codec: String,
        /// Zstd compression level (only used with --codec zstd)
        #[arg(long, default_value_t = 3)]
        zstd_level: i32,
        /// Rows per encode call
        #[arg(long, default_value_t = 65536)]
        chunk_rows: usize,
        /// Treat the column as rows of this many values each (1-D entries)
        #[arg(long)]
        row_len: Option<u64>,
        /// Manifest path (default: <output>.manifest.json)
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
    /// Replay an encoded field back into a raw little-endian column file
    Decode {
        /// Encoded bytes
        input: PathBuf,
        /// Destination raw file ("-" writes to stdout)
        output: PathBuf,
        /// Manifest path (default: <input>.manifest.json)
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
    /// Print the field record and per-entry statistics
    Inspect {
        /// Manifest written by `encode`
        manifest: PathBuf,
        /// Print per-entry details
        #[arg(long)]
        blocks: bool,
    },
    /// Decode a single encode call by index
    ///
    /// Only that call's shape and value runs are hashed and decompressed.
    ReadBlock {
        /// Encoded bytes
        input: PathBuf,
        /// Zero-based call index
        #[arg(short, long)]
        index: usize,
        /// Manifest path (default: <input>.manifest.json)
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
}

/// Everything needed to replay an encoded file, stored next to it.
#[derive(Serialize, Deserialize)]
struct Manifest {
    data_type: DataType,
    dimension: usize,
    codec: u16,
    row_len: Option<u64>,
    field: EncodedField,
}

// ── Codec configuration ────────────────────────────────────────────────────

/// Build a codec's options from CLI flags.
trait CodecConfig: ShapeDefaults {
    fn opts(zstd_level: i32) -> Self::Opts;
}

impl CodecConfig for PassThroughCodec {
    fn opts(_zstd_level: i32) {}
}

impl CodecConfig for ZstdCodec {
    fn opts(zstd_level: i32) -> ZstdOpts {
        ZstdOpts::new(zstd_level)
    }
}

impl CodecConfig for Lz4Codec {
    fn opts(_zstd_level: i32) -> Lz4Opts {
        Lz4Opts
    }
}

// ── Static dispatch ────────────────────────────────────────────────────────

/// Call `$f::<TD, C>(args..)` for the descriptor and codec picked at runtime.
macro_rules! dispatch {
    (@ty $dtype:expr, $D:ty, $codec:expr, $f:ident ( $($arg:expr),* )) => {
        match $dtype {
            DataType::U8 => dispatch!(@codec TypeDescriptorTag<u8, $D>, $codec, $f($($arg),*)),
            DataType::U16 => dispatch!(@codec TypeDescriptorTag<u16, $D>, $codec, $f($($arg),*)),
            DataType::U32 => dispatch!(@codec TypeDescriptorTag<u32, $D>, $codec, $f($($arg),*)),
            DataType::U64 => dispatch!(@codec TypeDescriptorTag<u64, $D>, $codec, $f($($arg),*)),
            DataType::I8 => dispatch!(@codec TypeDescriptorTag<i8, $D>, $codec, $f($($arg),*)),
            DataType::I16 => dispatch!(@codec TypeDescriptorTag<i16, $D>, $codec, $f($($arg),*)),
            DataType::I32 => dispatch!(@codec TypeDescriptorTag<i32, $D>, $codec, $f($($arg),*)),
            DataType::I64 => dispatch!(@codec TypeDescriptorTag<i64, $D>, $codec, $f($($arg),*)),
            DataType::F32 => dispatch!(@codec TypeDescriptorTag<f32, $D>, $codec, $f($($arg),*)),
            DataType::F64 => dispatch!(@codec TypeDescriptorTag<f64, $D>, $codec, $f($($arg),*)),
        }
    };
    (@codec $TD:ty, $codec:expr, $f:ident ( $($arg:expr),* )) => {
        match $codec {
            CODEC_PASSTHROUGH => $f::<$TD, PassThroughCodec>($($arg),*),
            CODEC_ZSTD => $f::<$TD, ZstdCodec>($($arg),*),
            CODEC_LZ4 => $f::<$TD, Lz4Codec>($($arg),*),
            other => anyhow::bail!("unknown codec id {}; supported: 0 (passthrough), 1 (zstd), 2 (lz4)", other),
        }
    };
    ($dtype:expr, $dim:expr, $codec:expr, $f:ident ( $($arg:expr),* )) => {
        match $dim {
            0 => dispatch!(@ty $dtype, Dim0, $codec, $f($($arg),*)),
            1 => dispatch!(@ty $dtype, Dim1, $codec, $f($($arg),*)),
            other => anyhow::bail!("unsupported dimension {}", other),
        }
    };
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn codec_id_from_name(name: &str) -> anyhow::Result<u16> {
    match name {
        "passthrough" | "pass" | "none" => Ok(CODEC_PASSTHROUGH),
        "zstd" | "z" => Ok(CODEC_ZSTD),
        "lz4" | "l" => Ok(CODEC_LZ4),
        other => anyhow::bail!(
            "unknown codec '{}'. Valid options: passthrough, zstd, lz4",
            other
        ),
    }
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn manifest_path(data: &Path, explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        let mut p = data.as_os_str().to_owned();
        p.push(".manifest.json");
        PathBuf::from(p)
    })
}

fn load_manifest(path: &Path) -> anyhow::Result<Manifest> {
    let file = File::open(path).with_context(|| format!("opening manifest {:?}", path))?;
    serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("parsing manifest {:?}", path))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ── Subcommand implementations ─────────────────────────────────────────────

struct EncodeJob {
    input: PathBuf,
    output: PathBuf,
    manifest: PathBuf,
    codec: u16,
    zstd_level: i32,
    chunk_rows: usize,
    row_len: Option<u64>,
}

/// Encode `values` in chunks of `chunk_rows` rows, as scalars or as rows of
/// `row_len` values each.
fn encode_values<TD, C>(
    values: &[TD::Elem],
    row_len: Option<u64>,
    chunk_rows: usize,
    opts: C::Opts,
) -> anyhow::Result<(EncodedField, Vec<u8>)>
where
    TD: TypeDescriptor,
    C: CodecConfig,
{
    let chunk_rows = chunk_rows.max(1);
    let mut writer: FieldWriter<TD, C> = FieldWriter::new(opts);

    match row_len {
        None => {
            for chunk in values.chunks(chunk_rows) {
                writer.append(&Block::<TD>::scalar(chunk)?)?;
            }
            if values.is_empty() {
                writer.append(&Block::<TD>::scalar(&[])?)?;
            }
        }
        Some(row_len) => {
            let len = usize::try_from(row_len).context("row length does not fit in memory")?;
            if len == 0 || values.len() % len != 0 {
                anyhow::bail!(
                    "{} values cannot be split into rows of {}",
                    values.len(),
                    row_len
                );
            }
            for chunk in values.chunks(chunk_rows.saturating_mul(len)) {
                let shapes: Vec<Shape> = vec![row_len; chunk.len() / len];
                writer.append(&Block::<TD>::ndarray(&shapes, chunk)?)?;
            }
            if values.is_empty() {
                writer.append(&Block::<TD>::ndarray(&[], &[])?)?;
            }
        }
    }

    Ok(writer.finish())
}

fn encode_file<TD, C>(job: &EncodeJob) -> anyhow::Result<()>
where
    TD: TypeDescriptor,
    C: CodecConfig,
{
    let raw = std::fs::read(&job.input)
        .with_context(|| format!("reading input file {:?}", job.input))?;
    let values = from_le_bytes::<TD::Elem>(&raw).with_context(|| {
        format!(
            "{:?} is not a whole number of {} values",
            job.input,
            TD::data_type()
        )
    })?;

    let t0 = Instant::now();
    let (field, bytes) =
        encode_values::<TD, C>(&values, job.row_len, job.chunk_rows, C::opts(job.zstd_level))?;
    let elapsed = t0.elapsed();
    std::fs::write(&job.output, &bytes)
        .with_context(|| format!("writing output file {:?}", job.output))?;

    let manifest = Manifest {
        data_type: TD::data_type(),
        dimension: TD::dimension(),
        codec: job.codec,
        row_len: job.row_len,
        field,
    };
    let file = File::create(&job.manifest)
        .with_context(|| format!("creating manifest {:?}", job.manifest))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &manifest)?;
    info!(manifest = ?job.manifest, "manifest written");

    let raw_size = manifest.field.raw_size();
    let ratio = if bytes.is_empty() {
        1.0
    } else {
        raw_size as f64 / bytes.len() as f64
    };
    eprintln!("  codec       : {}", codec_name(job.codec).unwrap_or("?"));
    eprintln!("  dtype       : {}", TD::data_type());
    eprintln!("  dimension   : {}", TD::dimension());
    eprintln!("  calls       : {}", manifest.field.block_count());
    eprintln!("  items       : {}", manifest.field.items_count());
    eprintln!("  raw size    : {}", human_bytes(raw_size));
    eprintln!("  encoded     : {}", human_bytes(bytes.len() as u64));
    eprintln!("  ratio       : {:.2}x", ratio);
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn decode_file<TD, C>(input: &Path, output: &Path, manifest: &Manifest) -> anyhow::Result<()>
where
    TD: TypeDescriptor,
    C: CodecConfig,
{
    let bytes = std::fs::read(input).with_context(|| format!("reading encoded file {:?}", input))?;
    let reader = FieldReader::<TD, C>::open(&manifest.field, &bytes)?;

    let t0 = Instant::now();
    let decoded = reader.read_all()?;
    let elapsed = t0.elapsed();
    debug!(
        shapes = decoded.shapes.len(),
        values = decoded.values.len(),
        "field decoded"
    );

    let raw = to_le_bytes(&decoded.values);
    if output.to_str() == Some("-") {
        io::stdout().write_all(&raw)?;
    } else {
        std::fs::write(output, &raw)
            .with_context(|| format!("creating output file {:?}", output))?;
    }

    eprintln!("  calls       : {}", reader.block_count());
    eprintln!("  items       : {}", reader.items_count());
    eprintln!("  raw size    : {}", human_bytes(raw.len() as u64));
    eprintln!("  ratio       : {:.2}x", reader.ratio());
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn read_one_block<TD, C>(input: &Path, index: usize, manifest: &Manifest) -> anyhow::Result<()>
where
    TD: TypeDescriptor,
    C: CodecConfig,
{
    let bytes = std::fs::read(input).with_context(|| format!("reading encoded file {:?}", input))?;
    let reader = FieldReader::<TD, C>::open(&manifest.field, &bytes)?;

    let t0 = Instant::now();
    let block = reader.read_block(index)?;
    let elapsed = t0.elapsed();
    eprintln!(
        "  decoded {} values in {:.3}ms",
        block.values.len(),
        elapsed.as_secs_f64() * 1000.0
    );

    const PREVIEW: usize = 32;
    println!(
        "--- call {} ({} shapes, {} values, first {} shown) ---",
        index,
        block.shapes.len(),
        block.values.len(),
        block.values.len().min(PREVIEW)
    );
    if !block.shapes.is_empty() {
        println!("  shapes : {:?}", &block.shapes[..block.shapes.len().min(PREVIEW)]);
    }
    println!("  values : {:?}", &block.values[..block.values.len().min(PREVIEW)]);
    Ok(())
}

fn run_inspect(path: PathBuf, show_blocks: bool) -> anyhow::Result<()> {
    let manifest = load_manifest(&path)?;
    let field = &manifest.field;
    let ratio = if field.compressed_size() == 0 {
        1.0
    } else {
        field.raw_size() as f64 / field.compressed_size() as f64
    };

    println!("=== Field: {:?} ===", path);
    println!();
    println!("  dtype          : {}", manifest.data_type);
    println!("  dimension      : {}", manifest.dimension);
    if let Some(len) = manifest.row_len {
        println!("  row length     : {}", len);
    }
    println!(
        "  codec          : {} (id={})",
        codec_name(manifest.codec).unwrap_or("unknown"),
        manifest.codec
    );
    println!("  calls          : {}", field.block_count());
    println!("  items          : {}", field.items_count());
    println!("  raw size       : {}", human_bytes(field.raw_size()));
    println!("  encoded        : {}", human_bytes(field.compressed_size()));
    println!("  ratio          : {:.2}x", ratio);

    if show_blocks {
        println!();
        println!(
            "  {:>6}  {:>6}  {:>12}  {:>12}  {:>8}  {:>16}",
            "call", "run", "input", "output", "version", "hash"
        );
        println!("  {}", "-".repeat(70));
        for i in 0..field.block_count() {
            let runs = field
                .shapes()
                .get(i)
                .map(|e| ("shapes", e))
                .into_iter()
                .chain(std::iter::once(("values", &field.values()[i])));
            for (run, e) in runs {
                println!(
                    "  {:>6}  {:>6}  {:>12}  {:>12}  {:>8}  {:016x}",
                    i,
                    run,
                    human_bytes(e.input_bytes as u64),
                    human_bytes(e.output_bytes as u64),
                    e.encoder_version,
                    e.hash
                );
            }
        }
    }

    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Encode {
            input,
            output,
            dtype,
            codec,
            zstd_level,
            chunk_rows,
            row_len,
            manifest,
        } => {
            let data_type = DataType::from_name(&dtype)
                .with_context(|| format!("unknown dtype '{}'", dtype))?;
            let job = EncodeJob {
                manifest: manifest_path(&output, manifest),
                input,
                output,
                codec: codec_id_from_name(&codec)?,
                zstd_level,
                chunk_rows,
                row_len,
            };
            let dim = usize::from(row_len.is_some());
            dispatch!(data_type, dim, job.codec, encode_file(&job))
        }
        Commands::Decode {
            input,
            output,
            manifest,
        } => {
            let m = load_manifest(&manifest_path(&input, manifest))?;
            dispatch!(m.data_type, m.dimension, m.codec, decode_file(&input, &output, &m))
        }
        Commands::Inspect { manifest, blocks } => run_inspect(manifest, blocks),
        Commands::ReadBlock {
            input,
            index,
            manifest,
        } => {
            let m = load_manifest(&manifest_path(&input, manifest))?;
            dispatch!(m.data_type, m.dimension, m.codec, read_one_block(&input, index, &m))
        }
    }
}
