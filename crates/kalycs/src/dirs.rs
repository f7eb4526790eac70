//! Per-OS resolution of the app data directory and the watched downloads
//! directory.
//!
//! Only `APPDATA`, `USERPROFILE`, and `HOME` are consulted; everything else
//! about the environment is left alone.

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name under the per-OS application data root.
pub const APP_DIR_NAME: &str = "Kalycs";

/// File name of the catalog database.
pub const DATABASE_FILE_NAME: &str = "kalycs.db";

/// Application data directory, created on demand with owner-only access.
///
/// Windows: `%APPDATA%\Kalycs` (falling back to
/// `%USERPROFILE%\AppData\Roaming\Kalycs`), macOS:
/// `~/Library/Application Support/Kalycs`, other Unix: `~/.kalycs/Kalycs`.
pub fn app_data_dir() -> io::Result<PathBuf> {
    let base = if cfg!(target_os = "windows") {
        match env::var_os("APPDATA")
            .map(PathBuf::from)
            .filter(|p| !p.as_os_str().is_empty())
        {
            Some(dir) => dir,
            None => home_dir()?.join("AppData").join("Roaming"),
        }
    } else if cfg!(target_os = "macos") {
        home_dir()?.join("Library").join("Application Support")
    } else {
        home_dir()?.join(".kalycs")
    };

    let app_dir = base.join(APP_DIR_NAME);
    create_private_dir(&app_dir)?;
    Ok(app_dir)
}

/// Full path of the catalog database file.
pub fn database_path() -> io::Result<PathBuf> {
    Ok(app_data_dir()?.join(DATABASE_FILE_NAME))
}

/// Restrict the database file to the owning user (0600). Failures are
/// logged and tolerated, as on platforms without Unix permissions.
pub fn restrict_database_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
            warn!(path = %path.display(), error = %err, "Failed to set secure permissions on database file");
        }
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// The user's downloads directory. Supported on Windows and macOS; other
/// operating systems surface an error at startup.
pub fn downloads_dir() -> io::Result<PathBuf> {
    info!("Resolving downloads directory");
    let path = home_dir()?.join("Downloads");

    if cfg!(target_os = "windows") || cfg!(target_os = "macos") {
        info!(os = env::consts::OS, path = %path.display(), "Downloads directory resolved");
        Ok(path)
    } else {
        warn!(os = env::consts::OS, "Unsupported operating system");
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("unsupported operating system: {}", env::consts::OS),
        ))
    }
}

fn home_dir() -> io::Result<PathBuf> {
    let from_env = if cfg!(target_os = "windows") {
        env::var_os("USERPROFILE")
    } else {
        env::var_os("HOME")
    };

    from_env
        .map(PathBuf::from)
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(dirs::home_dir)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "could not determine user home directory",
            )
        })
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_dir_resolves() {
        assert!(home_dir().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn private_dirs_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("private");
        create_private_dir(&dir).unwrap();

        let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn database_permissions_become_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let db = tmp.path().join("kalycs.db");
        std::fs::write(&db, b"").unwrap();

        restrict_database_permissions(&db);

        let mode = std::fs::metadata(&db).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
