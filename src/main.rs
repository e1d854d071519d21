//zpreview/src/main.rs
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use zpreview::app::{Studio, StudioServices};
use zpreview::kernel::preview::DeviceMode;
use zpreview::kernel::services::adapters::{ConfigService, DataUriStore, JsonFileStore, MemoryStore};
use zpreview::kernel::services::ports::KeyValueStore;
use zpreview::kernel::Action;

mod logging;

const WAIT: Duration = Duration::from_secs(30);

const USAGE: &str = "usage:
  zpreview build <dir> [--out=<file>]            write the preview document
  zpreview host <dir> [--out=<file>] [--device=<mode>]
                                                 write the sandboxed host page
  zpreview run [<dir>]                           run scripts headlessly and print the console;
                                                 without <dir> the autosaved session is used";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Build,
    Host,
    Run,
}

struct Command {
    mode: Mode,
    dir: Option<PathBuf>,
    out: Option<PathBuf>,
    device: DeviceMode,
}

impl Command {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut iter = args.iter();
        let mode = match iter.next().map(String::as_str) {
            Some("build") => Mode::Build,
            Some("host") => Mode::Host,
            Some("run") => Mode::Run,
            Some(other) => return Err(format!("unknown command `{}`", other)),
            None => return Err("missing command".to_string()),
        };

        let mut command = Command {
            mode,
            dir: None,
            out: None,
            device: DeviceMode::default(),
        };
        for arg in iter {
            if let Some(value) = arg.strip_prefix("--out=") {
                command.out = Some(PathBuf::from(value));
            } else if let Some(value) = arg.strip_prefix("--device=") {
                command.device = DeviceMode::from_name(value)
                    .ok_or_else(|| format!("unknown device `{}`", value))?;
            } else if arg.starts_with("--") {
                return Err(format!("unknown option `{}`", arg));
            } else if command.dir.is_none() {
                command.dir = Some(PathBuf::from(arg));
            } else {
                return Err(format!("unexpected argument `{}`", arg));
            }
        }

        if command.dir.is_none() && mode != Mode::Run {
            return Err("missing project directory".to_string());
        }
        Ok(command)
    }
}

fn main() -> ExitCode {
    let _logging = logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("zpreview: {}\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };

    match run(command) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("zpreview: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> io::Result<ExitCode> {
    let config = ConfigService::load().into_preview();
    // 打开目录时不恢复也不写自动保存
    let storage: Arc<dyn KeyValueStore> = match command.dir {
        Some(_) => Arc::new(MemoryStore::new()),
        None => Arc::new(JsonFileStore::open_default()?),
    };
    let services = StudioServices::new(Arc::new(DataUriStore::new()), storage);
    let mut studio = Studio::new(config, services)?;
    studio.dispatch(Action::SetDevice(command.device));

    if let Some(dir) = command.dir {
        studio.open_directory(dir);
        if !studio.wait_message(WAIT) {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "loading the project timed out"));
        }
        if let Some(notice) = studio.state().notice.clone() {
            return Err(io::Error::new(io::ErrorKind::Other, notice));
        }
    }
    if !studio.wait_idle(WAIT) {
        return Err(io::Error::new(io::ErrorKind::TimedOut, "build timed out"));
    }

    let state = studio.state();
    if let Some(message) = state.preview.error_message() {
        eprintln!("build failed: {}", message);
        return Ok(ExitCode::FAILURE);
    }
    if state.preview.empty {
        eprintln!("no index.html found; nothing to preview");
    }

    match command.mode {
        Mode::Build => {
            let html = state.preview.document.as_ref().map(|d| d.html.as_str());
            write_output(command.out, html.unwrap_or_default())?;
        }
        Mode::Host => {
            let page = studio.host_page().unwrap_or_default();
            write_output(command.out, &page)?;
        }
        Mode::Run => {
            let mut stdout = io::stdout().lock();
            for record in state.console.records() {
                writeln!(stdout, "[{}] {}", record.level, record.display_args())?;
            }
            if state.console.error_count() > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn write_output(out: Option<PathBuf>, content: &str) -> io::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(&path, content)?;
            tracing::info!(path = %path.display(), bytes = content.len(), "output written");
            Ok(())
        }
        None => io::stdout().lock().write_all(content.as_bytes()),
    }
}

#[cfg(test)]
#[path = "../tests/unit/cli_args.rs"]
mod tests;
