//! File I/O operations for encryption and decryption.

use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use secrecy::SecretString;
use tempfile::NamedTempFile;

use crate::types::{AeadAlg, EncBoxError};
use crate::vault::Vault;

/// Extension appended to encrypted output files.
pub const ENC_EXT: &str = "enc";

/// Atomically write data to a file using a temporary file.
///
/// This function ensures atomic writes by creating a temporary file in the
/// same directory as the target, writing data to it, and then atomically
/// renaming it to the target path.
///
/// # Arguments
///
/// * `path` - Target file path
/// * `data` - Data to write
/// * `mode_600` - Whether to set file permissions to 0o600 (Unix only)
///
/// # Errors
///
/// Returns `EncBoxError::Io` for I/O failures or `EncBoxError::Invalid` for
/// invalid paths.
pub fn write_all_atomic(path: &Path, data: &[u8], mode_600: bool) -> Result<(), EncBoxError> {
    let parent = path
        .parent()
        .ok_or(EncBoxError::Invalid("output path has no parent"))?;
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    if mode_600 {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
        }
    }
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| EncBoxError::Io(e.error))?;
    Ok(())
}

/// Default output path for encryption: the input path with `.enc` appended
/// (preserving any existing extension).
pub fn default_encrypt_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let mut p = input.to_path_buf();
        if let Some(e) = input.extension().and_then(|s| s.to_str()) {
            p.set_extension(format!("{e}.{ENC_EXT}"));
        } else {
            p.set_extension(ENC_EXT);
        }
        p
    })
}

/// Default output path for decryption.
///
/// If the input file ends with ".enc" (any case), that extension is
/// stripped; otherwise ".dec" is appended.
pub fn default_decrypt_output_path(in_path: &Path) -> PathBuf {
    let parent = in_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = in_path.file_name().unwrap_or_else(|| OsStr::new("out"));

    // Best-effort UTF-8 handling; fall back to appending ".dec" if not UTF-8.
    if let Some(name) = file_name.to_str() {
        if name.len() > 4 && name.to_ascii_lowercase().ends_with(".enc") {
            return parent.join(&name[..name.len() - 4]);
        }
        return parent.join(format!("{name}.dec"));
    }

    // Non-UTF-8 file name: just append ".dec"
    let mut os = file_name.to_os_string();
    os.push(".dec");
    parent.join(os)
}

/// Encrypt a file into a container on disk.
///
/// Reads the whole input into memory (the format is not streamed), encrypts
/// it through `vault`, and atomically writes the container to `output` (or
/// the input path with `.enc` appended).
pub fn encrypt_file(
    vault: &Vault,
    input: &Path,
    output: Option<&Path>,
    password: &SecretString,
    alg: AeadAlg,
    deadline: Option<DateTime<Utc>>,
    force: bool,
) -> Result<PathBuf, EncBoxError> {
    let out = default_encrypt_output_path(input, output);
    if out.exists() && !force {
        return Err(EncBoxError::Invalid(
            "output exists; pass force to overwrite",
        ));
    }
    let plaintext = fs::read(input)?;
    let container = vault.encrypt(&plaintext, password, alg, deadline)?;
    write_all_atomic(&out, &container, false)?;
    info!(
        "encrypted {} ({} bytes) -> {}",
        input.display(),
        plaintext.len(),
        out.display()
    );
    Ok(out)
}

/// Decrypt a container file back to plaintext on disk.
///
/// The lockout identifier is the input file name, matching what callers of
/// the byte-level API conventionally pass.
pub fn decrypt_file(
    vault: &Vault,
    input: &Path,
    output: Option<&Path>,
    password: &SecretString,
    force: bool,
) -> Result<PathBuf, EncBoxError> {
    let out = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| default_decrypt_output_path(input));
    if out.exists() && !force {
        return Err(EncBoxError::Invalid(
            "output exists; pass force to overwrite",
        ));
    }
    let identifier = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed");
    let container = fs::read(input)?;
    let plaintext = vault.decrypt(&container, password, identifier)?;
    write_all_atomic(&out, &plaintext, true)?;
    info!("decrypted {} -> {}", input.display(), out.display());
    Ok(out)
}
