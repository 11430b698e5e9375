use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::Router;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tower_http::services::ServeDir;
use tower_livereload::LiveReloadLayer;

use structogram::ParseMode;
use structogram::io::FormatRegistry;

/// Quiet period before a burst of saves is re-rendered once
const RERENDER_DELAY: Duration = Duration::from_millis(100);

/// Re-render the HTML page from the input document
fn regenerate(input: &Path, output: &Path, mode: ParseMode) -> anyhow::Result<()> {
    let registry = FormatRegistry::with_options(mode, false);
    let response = registry.convert(input, "html", output)?;
    tracing::info!(
        diagrams = response.diagrams.len(),
        nodes = response.node_count(),
        "rendered structograms"
    );
    Ok(())
}

/// Directory holding the input document. Editors often replace the file
/// on save, so the directory is watched rather than the file itself.
fn input_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Whether a filesystem event created or changed a file named like `input`
fn touches_input(event: &Event, input: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    let Some(name) = input.file_name() else {
        return false;
    };
    event.paths.iter().any(|p| p.file_name() == Some(name))
}

/// Watch `path` and call `on_change` for every create or modify event that
/// passes `filter`. The watcher stops when the returned handle is dropped.
fn watch(
    path: &Path,
    recursive: RecursiveMode,
    filter: impl Fn(&Event) -> bool + Send + 'static,
    on_change: impl Fn() + Send + 'static,
) -> anyhow::Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res
            && filter(&event)
        {
            on_change();
        }
    })?;
    watcher.watch(path, recursive)?;
    Ok(watcher)
}

/// Start the development server with hot reload
pub async fn serve(input: &Path, output: &Path, port: u16, mode: ParseMode) -> anyhow::Result<()> {
    regenerate(input, output, mode)?;

    let (tx, mut rx) = mpsc::channel::<()>(1);
    let input_name = input.to_path_buf();
    let _input_watcher = watch(
        &input_dir(input),
        RecursiveMode::NonRecursive,
        move |event| touches_input(event, &input_name),
        move || {
            let _ = tx.try_send(());
        },
    )?;

    let document = input.to_path_buf();
    let site = output.to_path_buf();
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            tokio::time::sleep(RERENDER_DELAY).await;
            while rx.try_recv().is_ok() {}

            // A broken document keeps the last good page on screen
            if let Err(e) = regenerate(&document, &site, mode) {
                tracing::error!(error = %e, input = %document.display(), "failed to re-render");
            }
        }
    });

    let livereload = LiveReloadLayer::new();
    let reloader = livereload.reloader();
    let _output_watcher = watch(
        output,
        RecursiveMode::Recursive,
        |event| event.kind.is_modify() || event.kind.is_create(),
        move || reloader.reload(),
    )?;

    let app = Router::new()
        .fallback_service(ServeDir::new(output))
        .layer(livereload);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(url = %format!("http://localhost:{port}"), input = %input.display(), "serving structograms");

    axum::serve(listener, app).await?;

    Ok(())
}
