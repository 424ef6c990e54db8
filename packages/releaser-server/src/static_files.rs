use std::io;
use std::path::{Path, PathBuf};

/// Map a request path onto a file under `root`.
///
/// Returns `None` for paths that try to leave `root` or touch dotfiles.
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;
    let mut path = root.to_path_buf();
    for segment in decoded.split('/').filter(|s| !s.is_empty()) {
        if segment.starts_with('.') || segment.contains('\\') || segment.contains('\0') {
            return None;
        }
        path.push(segment);
    }
    Some(path)
}

/// Read the file for `request_path`, serving `index.html` for directories.
pub async fn load(
    root: &Path,
    request_path: &str,
) -> io::Result<Option<(Vec<u8>, &'static str)>> {
    let Some(mut path) = resolve(root, request_path) else {
        return Ok(None);
    };
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_dir() => path.push("index.html"),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    }
    match tokio::fs::read(&path).await {
        Ok(data) => Ok(Some((data, content_type(&path)))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "txt" | "md" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "dmg" => "application/x-apple-diskimage",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
