//! encimg CLI — password-protected envelopes, carried as binary, Base64, or PNG.
//!
//! Usage:
//!   encimg encrypt      --in <FILE> [--in <FILE> ...] --password <PW> --out <FILE> [--base64] [--image]
//!   encimg encrypt-text --text <TEXT> --password <PW> --out <FILE> [--base64] [--image]
//!   encimg decrypt      --in <FILE> --password <PW> --out <FILE_OR_DIR>
//!   encimg inspect      <FILE>

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use encimg::{
    pipeline, wire, ArchiveInput, BufferManager, CryptoImgError, DecryptInput, EncryptInput,
};

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn usage() -> ! {
    eprintln!(
        "encimg — password-protected envelopes carried as binary, Base64, or PNG\n\
         \n\
         Commands:\n\
         \n\
         Encrypt one or more files:\n\
         \n\
         encimg encrypt --in <FILE> [--in <FILE> ...] --password <PW> --out <FILE> [--base64] [--image]\n\
         \n\
         Encrypt plain text:\n\
         \n\
         encimg encrypt-text --text <TEXT> --password <PW> --out <FILE> [--base64] [--image]\n\
         \n\
         Decrypt an envelope, Base64 text file, or PNG carrier:\n\
         \n\
         encimg decrypt --in <FILE> --password <PW> --out <FILE_OR_DIR>\n\
         \n\
         Show an envelope's header fields without decrypting:\n\
         \n\
         encimg inspect <FILE>\n"
    );
    process::exit(1);
}

fn die(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

fn parse_args(args: &[String]) -> Vec<(String, String)> {
    let mut flags = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--base64" || args[i] == "--image" {
            flags.push((args[i].clone(), String::new()));
            i += 1;
        } else if args[i].starts_with("--") && i + 1 < args.len() {
            flags.push((args[i].clone(), args[i + 1].clone()));
            i += 2;
        } else {
            die(&format!("unexpected argument: {}", args[i]));
        }
    }
    flags
}

fn get_flag(flags: &[(String, String)], name: &str) -> Option<String> {
    flags.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
}

fn get_flags_all(flags: &[(String, String)], name: &str) -> Vec<String> {
    flags.iter().filter(|(k, _)| k == name).map(|(_, v)| v.clone()).collect()
}

fn has_flag(flags: &[(String, String)], name: &str) -> bool {
    flags.iter().any(|(k, _)| k == name)
}

fn require_flag(flags: &[(String, String)], name: &str) -> String {
    get_flag(flags, name).unwrap_or_else(|| die(&format!("missing required flag: {name}")))
}

fn now_unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn die_on_error(err: CryptoImgError) -> ! {
    die(&format!("{} ({})", err, err.code()))
}

fn guess_mime_type(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
    .to_string()
}

fn cmd_encrypt(flags: &[(String, String)]) {
    let in_paths = get_flags_all(flags, "--in");
    if in_paths.is_empty() {
        die("missing required flag: --in");
    }
    let password = require_flag(flags, "--password");
    let out_path = require_flag(flags, "--out");
    let want_base64 = has_flag(flags, "--base64");
    let want_image = has_flag(flags, "--image");

    let files: Vec<ArchiveInput> = in_paths
        .iter()
        .map(|p| {
            let path = Path::new(p);
            let data = fs::read(path).unwrap_or_else(|e| die(&format!("read {p}: {e}")));
            ArchiveInput {
                name: path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| p.clone()),
                mime_type: guess_mime_type(path),
                data,
            }
        })
        .collect();

    let buffer = BufferManager::default();
    let created_at = now_unix_millis();
    let output = pipeline::encrypt(
        &buffer,
        EncryptInput::Files(files),
        &password,
        created_at,
        want_base64,
        want_image,
        |_percent, _phase| {},
    )
    .unwrap_or_else(|e| die_on_error(e));

    write_encrypt_output(&out_path, &output);
}

fn cmd_encrypt_text(flags: &[(String, String)]) {
    let text = require_flag(flags, "--text");
    let password = require_flag(flags, "--password");
    let out_path = require_flag(flags, "--out");
    let want_base64 = has_flag(flags, "--base64");
    let want_image = has_flag(flags, "--image");

    let buffer = BufferManager::default();
    let created_at = now_unix_millis();
    let output = pipeline::encrypt(
        &buffer,
        EncryptInput::Text(text),
        &password,
        created_at,
        want_base64,
        want_image,
        |_percent, _phase| {},
    )
    .unwrap_or_else(|e| die_on_error(e));

    write_encrypt_output(&out_path, &output);
}

fn write_encrypt_output(out_path: &str, output: &pipeline::EncryptOutput) {
    if let Some(png) = &output.png {
        fs::write(out_path, png).unwrap_or_else(|e| die(&format!("write {out_path}: {e}")));
        eprintln!("wrote PNG carrier: {out_path} ({} bytes)", png.len());
    } else if let Some(b64) = &output.base64 {
        fs::write(out_path, b64).unwrap_or_else(|e| die(&format!("write {out_path}: {e}")));
        eprintln!("wrote Base64 text: {out_path} ({} chars)", b64.len());
    } else {
        fs::write(out_path, &output.envelope).unwrap_or_else(|e| die(&format!("write {out_path}: {e}")));
        eprintln!("wrote envelope: {out_path} ({} bytes)", output.envelope.len());
    }
}

fn read_decrypt_input(path: &str) -> DecryptInput {
    let bytes = fs::read(path).unwrap_or_else(|e| die(&format!("read {path}: {e}")));
    if bytes.starts_with(&PNG_MAGIC) {
        DecryptInput::Png { name: path.to_string(), mime_type: "image/png".to_string(), bytes }
    } else if bytes.starts_with(wire::MAGIC) {
        DecryptInput::Envelope(bytes)
    } else {
        let text = String::from_utf8(bytes)
            .unwrap_or_else(|_| die("input is neither a PNG, a raw envelope, nor valid Base64 text"));
        DecryptInput::Base64(text)
    }
}

fn cmd_decrypt(flags: &[(String, String)]) {
    let in_path = require_flag(flags, "--in");
    let password = require_flag(flags, "--password");
    let out_path = require_flag(flags, "--out");

    let input = read_decrypt_input(&in_path);
    let result = pipeline::decrypt(input, &password, |_percent, _phase| {}).unwrap_or_else(|e| die_on_error(e));

    if let Some(entries) = &result.entries {
        fs::create_dir_all(&out_path).unwrap_or_else(|e| die(&format!("create dir {out_path}: {e}")));
        for entry in entries {
            let dest = PathBuf::from(&out_path).join(&entry.name);
            fs::write(&dest, &entry.data).unwrap_or_else(|e| die(&format!("write {}: {e}", dest.display())));
        }
        eprintln!("decrypted archive of {} file(s) into {out_path}/", entries.len());
    } else {
        fs::write(&out_path, &result.bytes).unwrap_or_else(|e| die(&format!("write {out_path}: {e}")));
        eprintln!(
            "decrypted {} -> {out_path} ({} bytes, filename={}, mimeType={})",
            in_path,
            result.bytes.len(),
            result.metadata.filename,
            result.metadata.mime_type
        );
    }
}

fn cmd_inspect(args: &[String]) {
    let path = args.first().unwrap_or_else(|| die("missing file path"));
    let bytes = fs::read(path).unwrap_or_else(|e| die(&format!("read {path}: {e}")));

    let parts = wire::decode_wire(&bytes).unwrap_or_else(|e| die_on_error(e));

    println!("encimg envelope");
    println!("===============");
    println!("Version:        0x{:02X}", parts.version);
    println!("Salt:           {} bytes", parts.salt.len());
    println!("Nonce:          {} bytes", parts.nonce.len());
    println!("Ciphertext+tag: {} bytes", parts.aead_ciphertext.len());
    println!("Total size:     {} bytes", bytes.len());
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "encimg=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
    }

    match args[1].as_str() {
        "encrypt" => cmd_encrypt(&parse_args(&args[2..])),
        "encrypt-text" => cmd_encrypt_text(&parse_args(&args[2..])),
        "decrypt" => cmd_decrypt(&parse_args(&args[2..])),
        "inspect" => cmd_inspect(&args[2..]),
        "--help" | "-h" => usage(),
        "--version" | "-V" => println!("encimg {}", env!("CARGO_PKG_VERSION")),
        cmd => {
            eprintln!("unknown command: {cmd}");
            usage();
        }
    }
}
