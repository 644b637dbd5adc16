use std::io;
use std::path::Path;

/// Create every directory in `paths`, parents included, if missing.
pub async fn ensure_directories(paths: &[&Path]) -> io::Result<()> {
    for path in paths {
        tokio::fs::create_dir_all(path).await?;
    }
    Ok(())
}

/// `false` covers both a missing path and one we cannot inspect.
pub async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

pub async fn remove(path: &Path) -> io::Result<()> {
    tokio::fs::remove_file(path).await
}
