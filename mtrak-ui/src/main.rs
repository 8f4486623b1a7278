mod console;
mod setup;
mod ui;
mod view;

use std::fs::File;
use std::path::PathBuf;

use mtrak_audio::{output_ports, pipeline, Scheduler};
use mtrak_core::action::{SessionAction, UserAction};
use mtrak_core::config::Config;
use mtrak_core::dispatch::Editor;
use mtrak_core::state::AppState;

use console::Console;
use ui::keybindings;

fn init_logging(verbose: bool) {
    use simplelog::{LevelFilter, WriteLogger};

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mtrak")
        .join("mtrak.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&log_path)
        .unwrap_or_else(|_| File::create("/tmp/mtrak.log").expect("Cannot create log file"));

    WriteLogger::init(log_level, simplelog::Config::default(), log_file).expect("Failed to initialize logger");

    log::info!("mtrak starting (log level: {:?})", log_level);
}

struct Args {
    verbose: bool,
    list_ports: bool,
    filename: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        verbose: false,
        list_ports: false,
        filename: None,
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--verbose" | "-v" => args.verbose = true,
            "--ports" => args.list_ports = true,
            flag if flag.starts_with('-') => return Err(format!("unknown option: {}", flag)),
            _ if args.filename.is_some() => return Err("only one filename".to_string()),
            _ => args.filename = Some(PathBuf::from(arg)),
        }
    }
    Ok(args)
}

fn main() -> std::io::Result<()> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: mtrak [--verbose] [--ports] [filename]");
            std::process::exit(1);
        }
    };
    init_logging(args.verbose);

    let config = Config::load();
    let engine_config = config.engine();

    if args.list_ports {
        match output_ports(&engine_config.client_name) {
            Ok(ports) => ports.iter().for_each(|p| println!("{}", p)),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let song = config.new_song();
    let (handle, queues, relay) = pipeline(config.pipeline());
    let scheduler = Scheduler::new(&song, queues);
    relay.spawn()?;

    let playback = match setup::start_playback(&engine_config, scheduler) {
        Ok(playback) => playback,
        Err(e) => {
            log::error!(target: "engine", "{}", e);
            eprintln!("mtrak: {}", e);
            eprintln!("set MTRAK_NO_AUDIO=1 to run without an audio device");
            std::process::exit(1);
        }
    };
    println!("mtrak: {}; '?' lists keys, Ctrl+q quits", playback.describe());

    let mut state = AppState::new(song);
    state.page_rows = config.page_rows();
    let mut console = Console::new(Editor::new(state, handle), keybindings::load_keybindings());

    if let Some(path) = args.filename {
        if path.exists() {
            console.dispatch(&UserAction::Session(SessionAction::Load(Some(path))));
            console.settle();
            if let Some(e) = &console.editor().state.error {
                eprintln!("mtrak: {}", e);
            }
        } else {
            log::info!("{} does not exist yet, starting a new song", path.display());
            console.editor_mut().state.filename = Some(path);
        }
    }

    let result = console::run(&mut console);

    // dropping the editor disconnects the playback queues
    drop(console);
    playback.close();
    result
}
