#![forbid(unsafe_code)]
//! Command-line front end for `encbox`.
//!
//! Two subcommands: `enc` seals a file into a container, `dec` opens one.
//! Passwords come from a file or an interactive prompt, never from argv.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use encbox::{AeadAlg, Vault, VaultConfig, decrypt_file, encrypt_file};
use secrecy::SecretString;

#[derive(Parser, Debug)]
#[command(
    name = "encbox",
    version,
    about = "Encrypt/decrypt files into password-protected containers"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a file
    Enc(EncArgs),
    /// Decrypt a container
    Dec(DecArgs),
}

#[derive(Args, Debug)]
struct EncArgs {
    /// Input file
    #[arg(short = 'i', long = "in")]
    input: PathBuf,

    /// Output file (encrypted). If omitted, ".enc" is appended.
    #[arg(short = 'o', long = "out")]
    output: Option<PathBuf>,

    #[arg(short = 'a', long, value_enum, default_value_t = AlgChoice::AesGcm)]
    alg: AlgChoice,

    /// Expiration deadline, RFC 3339 (e.g. 2027-01-01T00:00:00Z). Must be in
    /// the future; decryption is refused once it has passed.
    #[arg(short = 'e', long = "expire")]
    expire: Option<String>,

    /// Read password from file instead of interactive prompt
    #[arg(short = 'p', long = "password-file")]
    password_file: Option<PathBuf>,

    /// Overwrite output if it exists
    #[arg(short = 'f', long = "force")]
    force: bool,
}

#[derive(Args, Debug)]
struct DecArgs {
    /// Input file (encrypted container)
    #[arg(short = 'i', long = "in")]
    input: PathBuf,

    /// Output file (plaintext). If omitted, ".enc" is stripped or ".dec" is appended.
    #[arg(short = 'o', long = "out")]
    output: Option<PathBuf>,

    /// Optional path to a file containing the password (trailing newline will be trimmed).
    #[arg(short = 'p', long = "password-file")]
    password_file: Option<PathBuf>,

    /// Overwrite the output file if it already exists.
    #[arg(short = 'f', long = "force")]
    force: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AlgChoice {
    #[value(name = "aes-gcm")]
    AesGcm,
    #[value(name = "chacha20-poly1305", alias = "chacha")]
    ChaCha,
}

impl From<AlgChoice> for AeadAlg {
    fn from(v: AlgChoice) -> Self {
        match v {
            AlgChoice::AesGcm => AeadAlg::AesGcm,
            AlgChoice::ChaCha => AeadAlg::ChaCha20Poly1305,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).
    let cli = Cli::parse();
    match cli.cmd {
        Command::Enc(a) => cmd_enc(a),
        Command::Dec(a) => cmd_dec(a),
    }
}

fn read_password(password_file: &Option<PathBuf>, prompt: &str) -> Result<SecretString> {
    if let Some(path) = password_file {
        let mut s = String::new();
        fs::File::open(path)?.read_to_string(&mut s)?;

        // Create SecretString directly from trimmed slice to avoid intermediate copies
        let secret = SecretString::new(
            s.trim_end_matches(&['\r', '\n'][..])
                .to_owned()
                .into_boxed_str(),
        );

        // Zero the original string that contained the password
        use zeroize::Zeroize;
        s.zeroize();
        Ok(secret)
    } else {
        let pw = rpassword::prompt_password(prompt)?;
        Ok(SecretString::new(pw.into_boxed_str()))
    }
}

fn parse_deadline(s: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("invalid expiration timestamp {s:?} (expected RFC 3339)"))?;
    Ok(parsed.with_timezone(&Utc))
}

fn cmd_enc(a: EncArgs) -> Result<()> {
    let pw = read_password(&a.password_file, "Password: ")?;
    let deadline = a.expire.as_deref().map(parse_deadline).transpose()?;

    let vault = Vault::new(VaultConfig::default())?;
    let out = encrypt_file(
        &vault,
        &a.input,
        a.output.as_deref(),
        &pw,
        AeadAlg::from(a.alg),
        deadline,
        a.force,
    )
    .with_context(|| "encryption failed")?;

    eprintln!("Wrote {}", out.display());
    Ok(())
}

fn cmd_dec(a: DecArgs) -> Result<()> {
    let pw = read_password(&a.password_file, "Password: ")?;

    let vault = Vault::new(VaultConfig::default())?;
    let out = decrypt_file(&vault, &a.input, a.output.as_deref(), &pw, a.force)
        .with_context(|| "decryption failed")?;

    eprintln!("Wrote {}", out.display());
    Ok(())
}
