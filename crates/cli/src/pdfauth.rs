//! pdfauth - inspect a PDF encryption dictionary and check passwords
//!
//! Input is a JSON file holding the `/Encrypt` dictionary and the trailer `/ID`:
//!
//! ```json
//! { "encrypt": { "Filter": "/Standard", "V": 1, "R": 2, "P": -4,
//!                "O": "<...>", "U": "<...>" },
//!   "id": ["<...>", "<...>"] }
//! ```

mod json;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use pdfsec_core::security::{
    DecryptionSession, EncryptDescriptor, PasswordKind, SecurityOptions, StandardSecurityHandler,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pdfauth")]
#[command(
    author,
    version,
    about = "Check passwords against a PDF encryption dictionary",
    long_about = None
)]
struct Args {
    /// JSON file with "encrypt" and optional "id"
    file: PathBuf,

    /// The password to check
    #[arg(short = 'P', long, default_value = "")]
    password: String,

    /// Treat the password as explicitly supplied even when empty
    #[arg(long, action = ArgAction::SetTrue)]
    explicit: bool,

    /// Compare R6 passwords without SASLprep
    #[arg(long = "no-saslprep", action = ArgAction::SetTrue)]
    no_saslprep: bool,

    /// Do not retry R5/R6 passwords re-encoded from Windows-1252
    #[arg(long = "no-locale-fallback", action = ArgAction::SetTrue)]
    no_locale_fallback: bool,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the encryption dictionary
    Info,
    /// Authenticate and print the file key
    Check,
    /// Print the stream and string keys of an object
    Key {
        #[arg(long)]
        obj: u32,
        #[arg(long = "gen", default_value_t = 0)]
        gen_: u16,
    },
    /// Decrypt a hex-encoded string literal of an object
    DecryptString {
        #[arg(long)]
        obj: u32,
        #[arg(long = "gen", default_value_t = 0)]
        gen_: u16,
        /// Ciphertext as hex
        data: String,
    },
}

#[derive(Serialize)]
struct Info {
    filter: String,
    v: i64,
    r: i64,
    length: usize,
    p: i32,
    stm_f: String,
    str_f: String,
    stm_method: String,
    str_method: String,
    encrypt_metadata: bool,
    crypt_filters: Vec<String>,
    password_required: bool,
}

impl Info {
    fn new(d: &EncryptDescriptor, password_required: bool) -> Self {
        let mut crypt_filters: Vec<String> = d.crypt_filters.keys().cloned().collect();
        crypt_filters.sort();
        Self {
            filter: d.filter.clone(),
            v: d.version.number(),
            r: d.revision.number(),
            length: d.length,
            p: d.p as i32,
            stm_f: d.stm_f.clone(),
            str_f: d.str_f.clone(),
            stm_method: format!("{:?}", d.stm_method),
            str_method: format!("{:?}", d.str_method),
            encrypt_metadata: d.encrypt_metadata,
            crypt_filters,
            password_required,
        }
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn options(args: &Args) -> SecurityOptions {
    let mut options = SecurityOptions::default();
    if args.no_saslprep {
        options = options.without_saslprep();
    }
    if args.no_locale_fallback {
        options = options.without_locale_to_utf8();
    }
    options
}

fn authenticate(handler: StandardSecurityHandler, password: &str) -> Result<DecryptionSession> {
    handler
        .authenticate(password.as_bytes())
        .context("cannot open the document with this password")
}

fn kind_name(kind: PasswordKind) -> &'static str {
    match kind {
        PasswordKind::User => "user",
        PasswordKind::Owner => "owner",
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not JSON", args.file.display()))?;
    let (encrypt, trailer) = json::parse_document(&value)?;
    tracing::debug!(file = %args.file.display(), entries = encrypt.len(), "loaded /Encrypt");
    let handler = StandardSecurityHandler::new(&encrypt, &trailer, options(&args))?;
    let explicit = args.explicit || !args.password.is_empty();

    match args.command {
        Command::Info => {
            let info = Info::new(handler.descriptor(), handler.is_required(explicit));
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Check => {
            let session = authenticate(handler, &args.password)?;
            println!("password: {}", kind_name(session.password_kind()));
            println!("file key: {}", hex::encode(session.file_key()));
        }
        Command::Key { obj, gen_ } => {
            let session = authenticate(handler, &args.password)?;
            let stream = session.object_key(obj, gen_);
            let string = session.string_key(obj, gen_);
            println!("stream: {:?} {}", stream.method, hex::encode(&stream.key));
            println!("string: {:?} {}", string.method, hex::encode(&string.key));
        }
        Command::DecryptString { obj, gen_, data } => {
            let ciphertext = hex::decode(data.trim()).context("data must be hex")?;
            let session = authenticate(handler, &args.password)?;
            let plaintext = session.decrypt_string(&ciphertext, obj, gen_)?;
            println!("{}", hex::encode(&plaintext));
            if let Ok(text) = std::str::from_utf8(&plaintext) {
                println!("{text:?}");
            }
        }
    }
    Ok(())
}
