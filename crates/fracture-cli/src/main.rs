//! Command-line interface for `fracture`.

#![forbid(unsafe_code)]

mod logger;

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use aes_modes::{Block, Cipher, Direction, Job, Mode, Outcome, Source};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// AES-128 encryption CLI.
#[derive(Parser)]
#[command(
    name = "fracture",
    version,
    author,
    about = "AES-128 file and text encryption (ECB, CBC, CFB, OFB)"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CipherArgs {
    /// Mode of operation: ecb, cbc, cfb or ofb.
    #[arg(short, long, value_name = "MODE", default_value = "cbc")]
    mode: Mode,
    /// Secret key as text; only the first 16 bytes are used.
    #[arg(short, long, value_name = "TEXT", conflicts_with = "key_hex")]
    key: Option<String>,
    /// Secret key as up to 32 hex characters.
    #[arg(long, value_name = "HEX")]
    key_hex: Option<String>,
    /// Do not store the IV in the ciphertext.
    #[arg(long, default_value_t = false)]
    detached_iv: bool,
    /// Bytes processed per file chunk (multiple of 16).
    #[arg(long, value_name = "BYTES")]
    buffer_limit: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file or a piece of text.
    Enc {
        #[command(flatten)]
        cipher: CipherArgs,
        /// Input file.
        #[arg(value_name = "FILE", required_unless_present = "text")]
        input: Option<PathBuf>,
        /// Encrypt this text instead of a file.
        #[arg(short, long, value_name = "TEXT", conflicts_with = "input")]
        text: Option<String>,
        /// Output path (defaults to `<FILE>.bin`, or `<unix-time>.txt.bin` for text).
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Print the text ciphertext as hex instead of writing a file.
        #[arg(short = 's', long, default_value_t = false)]
        print: bool,
        /// Optional RNG seed for reproducible IVs.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Decrypt a `.bin` file.
    Dec {
        #[command(flatten)]
        cipher: CipherArgs,
        /// Encrypted input file.
        #[arg(value_name = "FILE")]
        input: PathBuf,
        /// Output path (defaults to FILE without its `.bin` suffix).
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// IV as 32 hex characters; needed with --detached-iv.
        #[arg(long, value_name = "HEX")]
        iv_hex: Option<String>,
    },
    /// Round-trip random data through every mode.
    Demo {
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);
    match cli.command {
        Commands::Enc {
            cipher,
            input,
            text,
            output,
            print,
            seed,
        } => cmd_enc(&cipher, input, text, output, print, seed),
        Commands::Dec {
            cipher,
            input,
            output,
            iv_hex,
        } => cmd_dec(&cipher, input, output, iv_hex.as_deref()),
        Commands::Demo { seed } => cmd_demo(seed),
    }
}

fn cmd_enc(
    args: &CipherArgs,
    input: Option<PathBuf>,
    text: Option<String>,
    output: Option<PathBuf>,
    print: bool,
    seed: Option<u64>,
) -> Result<()> {
    let (source, destination) = match (input, text) {
        (_, Some(text)) => {
            let destination = match (output, print) {
                (_, true) => None,
                (Some(path), false) => Some(path),
                (None, false) => Some(text_output_name()),
            };
            (Source::Text(text), destination)
        }
        (Some(input), None) => {
            if print {
                bail!("--print only applies to --text input");
            }
            let destination = output.unwrap_or_else(|| encrypted_name(&input));
            (Source::File(input), Some(destination))
        }
        (None, None) => bail!("no source was given"),
    };

    let mut job = build_job(args, Direction::Encrypt, source)?;
    job.destination = destination;
    job.print_ciphertext = print;
    job.seed = seed;

    let outcome = job.run().context("encryption failed")?;
    report(&outcome, job.detaches_iv());
    Ok(())
}

fn cmd_dec(
    args: &CipherArgs,
    input: PathBuf,
    output: Option<PathBuf>,
    iv_hex: Option<&str>,
) -> Result<()> {
    let destination = match output {
        Some(path) => path,
        None => decrypted_name(&input)?,
    };
    let iv = match (iv_hex, args.detached_iv) {
        (Some(hex_str), true) => Some(parse_iv_hex(hex_str)?),
        (Some(_), false) => bail!("--iv-hex requires --detached-iv; embedded IVs are read from the file"),
        (None, true) if args.mode.uses_iv() => bail!("--detached-iv decryption needs --iv-hex"),
        (None, _) => None,
    };

    let mut job = build_job(args, Direction::Decrypt, Source::File(input))?;
    job.destination = Some(destination);
    job.iv = iv;

    let outcome = job.run().context("decryption failed")?;
    report(&outcome, false);
    Ok(())
}

fn cmd_demo(seed: Option<u64>) -> Result<()> {
    let mut rng = seeded_rng(seed);
    let mut key = [0u8; 16];
    rng.fill_bytes(&mut key);
    let mut plaintext = vec![0u8; 45];
    rng.fill_bytes(&mut plaintext);

    println!("demo key: {}", hex::encode(key));
    println!("plaintext: {}", hex::encode(&plaintext));
    for mode in Mode::ALL {
        let mut cipher = Cipher::with_seed(mode, &key, rng.next_u64());
        let ciphertext = cipher.encrypt_buffer(&plaintext)?;
        let decrypted = cipher.decrypt_buffer(&ciphertext)?;
        println!("{} ciphertext: {}", mode.label(), hex::encode(&ciphertext));
        if decrypted != plaintext {
            bail!("{} demo roundtrip failed", mode.label());
        }
    }
    println!("decrypted: {}", hex::encode(&plaintext));
    Ok(())
}

fn build_job(args: &CipherArgs, direction: Direction, source: Source) -> Result<Job> {
    let mut job = Job::new(direction, args.mode, source);
    job.key = resolve_key(args)?;
    job.embed_iv = !args.detached_iv;
    job.buffer_limit = args.buffer_limit;
    Ok(job)
}

fn report(outcome: &Outcome, show_iv: bool) {
    match outcome {
        Outcome::Printed { ciphertext, iv } => {
            println!("{}", hex::encode(ciphertext));
            if show_iv {
                println!("iv: {}", hex::encode(iv));
            }
        }
        Outcome::Written { path, bytes, iv } => {
            info!("wrote {} bytes to {}", bytes, path.display());
            if show_iv {
                println!("iv: {}", hex::encode(iv));
            }
            println!("Operation finished: {}", path.display());
        }
    }
}

fn resolve_key(args: &CipherArgs) -> Result<Vec<u8>> {
    if let Some(hex_str) = &args.key_hex {
        let bytes = hex::decode(hex_str.trim()).context("decode key hex")?;
        if bytes.len() > 16 {
            bail!("AES-128 key must be at most 16 bytes (32 hex characters)");
        }
        return Ok(bytes);
    }
    match &args.key {
        Some(text) => {
            if text.len() > 16 {
                warn!("key is longer than 16 bytes; only the first 16 are used");
            }
            Ok(text.as_bytes().to_vec())
        }
        None => Ok(Vec::new()),
    }
}

fn parse_iv_hex(hex_str: &str) -> Result<Block> {
    let bytes = hex::decode(hex_str.trim()).context("decode IV hex")?;
    if bytes.len() != 16 {
        bail!("IV must be 16 bytes (32 hex characters)");
    }
    let mut iv = [0u8; 16];
    iv.copy_from_slice(&bytes);
    Ok(iv)
}

fn encrypted_name(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".bin");
    PathBuf::from(name)
}

fn decrypted_name(input: &Path) -> Result<PathBuf> {
    let has_stem = input.file_stem().is_some_and(|stem| !stem.is_empty());
    if input.extension().and_then(|ext| ext.to_str()) != Some("bin") || !has_stem {
        bail!(
            "wrong source file type: {} (expected a .bin file or an explicit --output)",
            input.display()
        );
    }
    Ok(input.with_extension(""))
}

fn text_output_name() -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    PathBuf::from(format!("{secs}.txt.bin"))
}

fn seeded_rng(seed: Option<u64>) -> ChaCha20Rng {
    match seed {
        Some(value) => {
            let mut seed_bytes = [0u8; 32];
            seed_bytes[..8].copy_from_slice(&value.to_le_bytes());
            ChaCha20Rng::from_seed(seed_bytes)
        }
        None => {
            let mut seed_bytes = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut seed_bytes);
            ChaCha20Rng::from_seed(seed_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_encrypt_text() {
        let cli = Cli::try_parse_from([
            "fracture", "enc", "-m", "ofb", "-k", "secret", "-t", "hello", "-s",
        ])
        .unwrap();
        match cli.command {
            Commands::Enc {
                cipher, text, print, ..
            } => {
                assert_eq!(cipher.mode, Mode::Ofb);
                assert_eq!(cipher.key.as_deref(), Some("secret"));
                assert_eq!(text.as_deref(), Some("hello"));
                assert!(print);
            }
            _ => panic!("expected enc"),
        }
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["fracture", "enc", "-m", "xts", "file"]).is_err());
    }

    #[test]
    fn default_destinations() {
        assert_eq!(
            encrypted_name(Path::new("dir/report.pdf")),
            PathBuf::from("dir/report.pdf.bin")
        );
        assert_eq!(
            decrypted_name(Path::new("dir/report.pdf.bin")).unwrap(),
            PathBuf::from("dir/report.pdf")
        );
        assert!(decrypted_name(Path::new("report.pdf")).is_err());
        assert!(decrypted_name(Path::new(".bin")).is_err());
        assert!(text_output_name().to_string_lossy().ends_with(".txt.bin"));
    }

    #[test]
    fn key_and_iv_parsing() {
        let args = CipherArgs {
            mode: Mode::Cbc,
            key: None,
            key_hex: Some("000102".into()),
            detached_iv: false,
            buffer_limit: None,
        };
        assert_eq!(resolve_key(&args).unwrap(), vec![0, 1, 2]);

        let args = CipherArgs {
            key_hex: Some("00".repeat(17)),
            ..args
        };
        assert!(resolve_key(&args).is_err());

        assert_eq!(parse_iv_hex(&"ab".repeat(16)).unwrap(), [0xab; 16]);
        assert!(parse_iv_hex("abcd").is_err());
    }
}
