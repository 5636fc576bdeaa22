use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// `target == name` or `target` starts with `name::`
fn matches_crate_prefix(target: &str, crate_name: &str) -> bool {
    target
        .strip_prefix(crate_name)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Everything not claimed by an explicit subsystem section, up to `max_level`.
fn unclaimed_targets(
    claimed: Vec<String>,
    max_level: Level,
) -> FilterFn<impl Fn(&tracing::Metadata<'_>) -> bool + Send + Sync + 'static> {
    FilterFn::new(move |meta: &tracing::Metadata<'_>| {
        let t = meta.target();
        !claimed.iter().any(|c| matches_crate_prefix(t, c)) && meta.level() <= &max_level
    })
}

// -------- rotating file sink --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.0.lock() {
            Ok(mut f) => f.write(buf),
            Err(poisoned) => poisoned.into_inner().write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.0.lock() {
            Ok(mut f) => f.flush(),
            Err(poisoned) => poisoned.into_inner().flush(),
        }
    }
}

/// Writes to `Some(file)` or silently drops.
struct MaybeWriter(Option<RotWriter>);

impl Write for MaybeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes records to a per-subsystem file by target prefix, falling back to the default file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotWriter>,
    by_prefix: HashMap<String, RotWriter>,
}

impl FileRouter {
    fn resolve(&self, target: &str) -> Option<RotWriter> {
        self.by_prefix
            .iter()
            .find(|(prefix, _)| matches_crate_prefix(target, prefix))
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = MaybeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MaybeWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        MaybeWriter(self.resolve(meta.target()))
    }
}

/// Relative paths are resolved against `base_dir` (the server home).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating(section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }
    let path = resolve_log_path(&section.file, base_dir);
    let max_bytes = section.max_size_mb.unwrap_or(100) * 1024 * 1024;
    match create_rotating_writer_at_path(&path, max_bytes as usize, section.max_backups) {
        Ok(w) => Some(w),
        Err(e) => {
            eprintln!("failed to open log file '{}': {e}", path.display());
            None
        }
    }
}

fn create_rotating_writer_at_path(
    log_path: &Path,
    max_bytes: usize,
    max_backups: Option<usize>,
) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let limit = match max_backups {
        Some(n) => FileLimit::MaxFiles(n),
        None => FileLimit::Age(chrono::Duration::days(7)),
    };

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

/// Initialize the global subscriber from the `logging` config section.
///
/// Each non-default key names a target prefix (usually a crate, e.g. `opportunities`)
/// with its own console/file levels; `default` covers every other target.
/// Console output is human readable; file output is JSON.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = tracing_subscriber::fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let layers = build_layers(cfg, base_dir);
    let _ = Registry::default().with(layers).try_init();
}

fn build_layers(cfg: &LoggingConfig, base_dir: &Path) -> Vec<BoxedLayer> {
    let ansi = std::io::stdout().is_terminal();
    let default_section = cfg.get("default");
    let subsystems: Vec<(&String, &Section)> =
        cfg.iter().filter(|(k, _)| k.as_str() != "default").collect();
    let claimed: Vec<String> = subsystems.iter().map(|(k, _)| (*k).clone()).collect();

    let mut console_targets = Targets::new().with_default(LevelFilter::OFF);
    let mut file_targets = Targets::new().with_default(LevelFilter::OFF);
    let mut router = FileRouter::default();

    for (name, section) in &subsystems {
        if let Some(level) = parse_tracing_level(&section.console_level) {
            console_targets = console_targets.with_target((*name).clone(), level);
        }
        if let Some(writer) = open_rotating(section, base_dir) {
            router.by_prefix.insert((*name).clone(), writer);
            if let Some(level) = parse_tracing_level(&section.file_level) {
                file_targets = file_targets.with_target((*name).clone(), level);
            }
        }
    }
    if let Some(section) = default_section {
        router.default = open_rotating(section, base_dir);
    }

    let mut layers: Vec<BoxedLayer> = Vec::new();

    layers.push(
        fmt::layer()
            .with_ansi(ansi)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_filter(console_targets)
            .boxed(),
    );

    if !router.by_prefix.is_empty() {
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(router.clone())
                .with_filter(file_targets)
                .boxed(),
        );
    }

    if let Some(section) = default_section {
        if let Some(level) = parse_tracing_level(&section.console_level) {
            layers.push(
                fmt::layer()
                    .with_ansi(ansi)
                    .with_target(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_filter(unclaimed_targets(claimed.clone(), level))
                    .boxed(),
            );
        }
        if router.default.is_some() {
            if let Some(level) = parse_tracing_level(&section.file_level) {
                layers.push(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_target(true)
                        .with_timer(fmt::time::UtcTime::rfc_3339())
                        .with_writer(router)
                        .with_filter(unclaimed_targets(claimed, level))
                        .boxed(),
                );
            }
        }
    }

    layers
}
