//! Static directory expansion.
//!
//! # Responsibilities
//! - Turn each regular file of a directory into a `GET` layer factory
//! - Map `index.html` to the mount root and other files to `<mount>/<name>`
//!
//! # Design Decisions
//! - The directory is listed once, at wiring time; files are read per request
//! - Files are ordered by name so the resulting stack is deterministic
//! - Subdirectories are not descended into

use axum::http::StatusCode;
use std::io;
use std::path::{Path, PathBuf};

use crate::dispatch::matcher::join_paths;
use crate::dispatch::{handler_fn, Flow, Layer, LayerFactory, RouteMethod, Router};

const INDEX_FILE: &str = "index.html";

/// One layer factory per regular file in `dir`.
pub fn expand(dir: impl AsRef<Path>) -> io::Result<Vec<LayerFactory>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    files.sort();

    tracing::debug!(dir = %dir.display(), files = files.len(), "Expanded static directory");

    Ok(files
        .into_iter()
        .map(|name| file_factory(dir.join(&name), name))
        .collect())
}

fn file_factory(path: PathBuf, name: String) -> LayerFactory {
    Box::new(move |mount: &str| {
        let route = if name == INDEX_FILE {
            join_paths("/", mount)
        } else {
            join_paths(mount, &name)
        };

        let path = path.clone();
        Layer::new()
            .method(RouteMethod::Get)
            .route(route)
            .handler(handler_fn(move |_req, res, _next| {
                let path = path.clone();
                Box::pin(async move {
                    res.status(StatusCode::OK).send_file(&path).await?;
                    Ok(Flow::Halt)
                })
            }))
    })
}

/// Serve every file of `dir` under `mount` on `router`.
pub fn mount_dir(router: &mut Router, mount: &str, dir: impl AsRef<Path>) -> io::Result<()> {
    let factories = expand(dir)?;
    router.use_factories(mount, factories);
    Ok(())
}
