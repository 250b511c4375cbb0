use std::io;
use std::process::ExitCode;

use log::{error, info};

use maze_backtrack::terminal::{TerminalDisplay, TerminalSession};
use maze_backtrack::{logging, MazeGenerator, Result, RngSampler, RunLoop, Settings};

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("maze: {}", err);
            return ExitCode::from(2);
        }
    };
    if let Some(path) = &settings.log_file {
        if let Err(err) = logging::init(path) {
            eprintln!("maze: {}", err);
            return ExitCode::from(2);
        }
    }

    match start(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("maze: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn start(settings: &Settings) -> Result<()> {
    let _session = TerminalSession::enter(io::stdout(), true)?;
    run(settings)?;
    Ok(())
}

fn run(settings: &Settings) -> io::Result<()> {
    info!(
        "generating {}x{} maze at {} fps, seed {:?}",
        settings.cols, settings.rows, settings.fps, settings.seed
    );
    let mut maze = MazeGenerator::new(
        settings.cols,
        settings.rows,
        RngSampler::seeded(settings.seed),
    );
    let mut display = TerminalDisplay::new(io::stdout(), settings.cols, settings.rows, settings.frame_time());
    RunLoop::new().run(&mut display, &mut maze)?;
    info!(
        "quit with {}/{} cells visited after {} steps",
        maze.visited_count(),
        maze.total_cells(),
        maze.steps()
    );
    Ok(())
}
