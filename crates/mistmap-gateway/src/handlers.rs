//! HTTP endpoint handlers: the status page and static image serving.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/images/{*path}` | Image from the active world's image root |

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};

use crate::error::GatewayError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the session and endpoint links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.sessions.snapshot();
    let world = session.world_id.unwrap_or_else(|| String::from("none"));
    let region = session.region_id.unwrap_or_else(|| String::from("none"));
    let viewers = session.viewer_count;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Mistmap Gateway</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        code {{ color: #7ee787; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Mistmap Gateway</h1>
    <p class="subtitle">Fog-of-war map server</p>

    <div>
        <div class="metric">
            <div class="label">World</div>
            <div class="value">{world}</div>
        </div>
        <div class="metric">
            <div class="label">Region</div>
            <div class="value">{region}</div>
        </div>
        <div class="metric">
            <div class="label">Viewers</div>
            <div class="value">{viewers}</div>
        </div>
    </div>

    <hr>

    <h2>Channels</h2>
    <ul>
        <li><code>ws://host:port/ws/controller</code> -- moderator channel (credential required)</li>
        <li><code>ws://host:port/ws/viewer</code> -- display channel (receive-only)</li>
        <li><code>/images/&lt;path&gt;</code> -- active world's images</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /images/{*path} -- static images with path containment
// ---------------------------------------------------------------------------

/// Serve one image from the active world's image root.
///
/// The resolved path must stay inside `<worlds_root>/<world>/images/`;
/// anything that escapes is rejected outright, never partially matched.
/// This containment check is a security boundary: viewers are anonymous
/// and the path is attacker-controlled.
pub async fn image(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, GatewayError> {
    let world_id = {
        let world = state.world.read().await;
        world
            .active_world()
            .map(|w| w.id.clone())
            .ok_or(GatewayError::NoActiveWorld)?
    };

    let root = state.worlds_root.join(&world_id).join("images");
    // Canonicalizing both sides resolves symlinks and dot components, so
    // the prefix check cannot be fooled by either.
    let root = root
        .canonicalize()
        .map_err(|_| GatewayError::NotFound(path.clone()))?;
    let resolved = resolve_candidate(&root, &path)?;

    let bytes = tokio::fs::read(&resolved)
        .await
        .map_err(|_| GatewayError::NotFound(path.clone()))?;
    let content_type = content_type_for(&resolved);
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// Resolve a request path under the image root, enforcing containment.
fn resolve_candidate(root: &FsPath, path: &str) -> Result<PathBuf, GatewayError> {
    let resolved = root
        .join(path)
        .canonicalize()
        .map_err(|_| GatewayError::NotFound(path.to_owned()))?;
    if resolved.starts_with(root) {
        Ok(resolved)
    } else {
        Err(GatewayError::Forbidden(path.to_owned()))
    }
}

/// Map a file extension to its content type.
fn content_type_for(path: &FsPath) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_cover_map_formats() {
        assert_eq!(content_type_for(FsPath::new("a/map.png")), "image/png");
        assert_eq!(content_type_for(FsPath::new("a/map.jpeg")), "image/jpeg");
        assert_eq!(
            content_type_for(FsPath::new("a/map.bin")),
            "application/octet-stream"
        );
    }
}
