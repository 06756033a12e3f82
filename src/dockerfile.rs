// src/dockerfile.rs

//! Renders the container build recipe equivalent to a launchpad config.

use std::fmt::Write;

use crate::config::ConfigFile;
use crate::types::{BYTECODE_CACHE_VAR, OUTPUT_BUFFERING_VAR};

/// Render a Dockerfile performing the same steps as `launchpad build` and
/// starting the server like `launchpad run`.
pub fn render_dockerfile(cfg: &ConfigFile) -> String {
    let workdir = cfg.image.workdir.trim_end_matches('/');
    let workdir = if workdir.is_empty() { "/" } else { workdir };
    let manifest = cfg.dependencies.manifest.to_string_lossy().replace('\\', "/");
    let manage = cfg.assets.manage.to_string_lossy().replace('\\', "/");
    let server = &cfg.server;

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "FROM {}", cfg.image.base);
    if cfg.runtime.flags.disable_bytecode_cache {
        let _ = writeln!(out, "ENV {BYTECODE_CACHE_VAR}=1");
    }
    if cfg.runtime.flags.disable_output_buffering {
        let _ = writeln!(out, "ENV {OUTPUT_BUFFERING_VAR}=1");
    }
    let _ = writeln!(out, "WORKDIR {workdir}");
    let _ = writeln!(out);
    let _ = writeln!(out, "COPY {manifest} {}", join_image_path(workdir, &manifest));
    let _ = writeln!(out, "RUN pip install --no-cache-dir -r {manifest}");
    let _ = writeln!(out);
    let _ = writeln!(out, "COPY . {}", join_image_path(workdir, ""));
    let _ = writeln!(out, "RUN python {manage} collectstatic --noinput");
    let _ = writeln!(out);
    let _ = writeln!(out, "EXPOSE {}", server.binding.port);

    let bind = server.binding.to_string();
    let entry = server.entry.to_string();
    let cmd = [server.program.as_str(), "--bind", &bind, &entry];
    // Exec form. Serializing a string cannot fail.
    let rendered: Vec<String> = cmd
        .iter()
        .map(|arg| serde_json::to_string(arg).unwrap_or_default())
        .collect();
    let _ = writeln!(out, "CMD [{}]", rendered.join(", "));

    out
}

/// Render a `.dockerignore` from the materializer's exclude patterns.
pub fn render_dockerignore(cfg: &ConfigFile) -> String {
    let mut out = String::new();
    for pat in cfg.build.exclude.iter() {
        out.push_str(pat);
        out.push('\n');
    }
    out
}

fn join_image_path(workdir: &str, rel: &str) -> String {
    if workdir == "/" {
        format!("/{rel}")
    } else {
        format!("{workdir}/{rel}")
    }
}
