use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use uuid::Uuid;

use config::{Config, Policy};
use engine::Engine;
use error::EngineError;
use games::kalah::{self, Game, Layout, Player};
use games::{GameState, Validate};
use store::{GamePersister, GameRetriever, JsonlStore};

mod config;
mod engine;
mod error;
mod games;
mod status;
mod store;
mod tui;

const PROBLEM_BASE_URL: &str = "http://localhost/errors/";

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, global = true, default_value = "mancala.toml")]
    config: PathBuf,
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new game, play the given pits and save it. Moves are applied in
    /// order up to the first rejected one; the accepted ones are still saved.
    Play {
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        layout: Option<Vec<i32>>,
        #[arg(short, long, value_delimiter = ',')]
        moves: Vec<usize>,
    },
    /// Continue a saved game, saving the moves accepted before any rejection
    Resume {
        id: Uuid,
        #[arg(short, long, value_delimiter = ',')]
        moves: Vec<usize>,
    },
    /// Print the status of a saved game
    Show {
        id: Uuid,
    },
    Interactive {
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        layout: Option<Vec<i32>>,
    },
    Simulate {
        #[arg(short)]
        log_file: PathBuf,
        #[arg(short, long)]
        games: Option<usize>,
        #[arg(long, value_enum)]
        player_one: Option<Policy>,
        #[arg(long, value_enum)]
        player_two: Option<Policy>,
    },
}

// Failure response in the shape of an RFC 7807 problem document
#[derive(Debug, serde::Serialize)]
struct Problem {
    #[serde(rename = "type")]
    kind: String,
    status: u16,
    detail: String,
}

impl From<&EngineError> for Problem {
    fn from(err: &EngineError) -> Self {
        let (status, detail) = if err.is_internal() {
            (500, "Something went wrong, please retry.".to_string())
        } else {
            (400, err.to_string())
        };
        Problem {
            kind: format!("{}{}", PROBLEM_BASE_URL, err.kind()),
            status,
            detail,
        }
    }
}

// Stops at the first rejected move. Whatever was accepted before it is saved
// anyway so the game can be resumed from there.
fn apply_moves_and_save(engine: &mut Engine, store: &mut JsonlStore, moves: &[usize]) -> Result<(), EngineError> {
    for (accepted, &pit) in moves.iter().enumerate() {
        if let Err(err) = engine.move_stones_from(pit) {
            if accepted > 0 {
                log::warn!("Move from pit {} rejected, saving the {} moves before it", pit, accepted);
                save_and_print(engine, store)?;
            }
            return Err(err.into());
        }
    }
    save_and_print(engine, store)
}

fn save_and_print(engine: &Engine, store: &mut JsonlStore) -> Result<(), EngineError> {
    let record = engine.snapshot().ok_or(error::NotInitialized)?;
    store.persist(&record)?;
    print!("{}", engine.status()?);
    println!("Game: {} (saved to {})", record.id, store.path().display());
    Ok(())
}

fn play(config: &Config, layout: Option<Vec<i32>>, moves: &[usize]) -> Result<(), EngineError> {
    let mut engine = Engine::new(config.engine.max_stones_per_pit);
    let mut store = JsonlStore::new(&config.store.path);

    let layout = layout.unwrap_or_else(|| config.engine.layout.clone());
    engine.initialize(Some(layout.as_slice()))?;
    apply_moves_and_save(&mut engine, &mut store, moves)
}

fn resume(config: &Config, id: Uuid, moves: &[usize]) -> Result<(), EngineError> {
    let mut engine = Engine::new(config.engine.max_stones_per_pit);
    let mut store = JsonlStore::new(&config.store.path);

    engine.restore(store.retrieve_by_id(id)?)?;
    apply_moves_and_save(&mut engine, &mut store, moves)
}

fn show(config: &Config, id: Uuid) -> Result<(), EngineError> {
    let mut engine = Engine::new(config.engine.max_stones_per_pit);
    let store = JsonlStore::new(&config.store.path);

    engine.restore(store.retrieve_by_id(id)?)?;
    print!("{}", engine.status()?);
    Ok(())
}

// One ply in the simulation log
#[derive(Debug, Clone, serde::Serialize)]
struct PlayLogPly {
    game_id: usize,
    ply_id: i32,
    player: Option<Player>,
    pit: Option<usize>,
    board: Vec<u32>,
    captured: u32,
    extra_turn: bool,
}

type PlayLog = Vec<PlayLogPly>;

// Workers push a whole game's plys in one call, so a poisoned log still holds
// only complete games.
fn lock_play_log(play_log: &Mutex<PlayLog>) -> MutexGuard<'_, PlayLog> {
    play_log.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        log::error!("Play log lock poisoned, keeping the plys recorded so far");
        poisoned.into_inner()
    })
}

fn write_play_log(play_log: &PlayLog, file: &PathBuf) -> anyhow::Result<()> {
    let file = File::create(file).with_context(|| format!("creating play log {}", file.display()))?;
    let mut writer = BufWriter::new(file);
    for item in play_log {
        jsonl::write(&mut writer, item).map_err(|e| anyhow!("writing play log: {}", e))?;
    }
    Ok(())
}

fn choose(policy: Policy, game: &Game) -> Option<usize> {
    match policy {
        Policy::Random => games::play_random(game),
        Policy::Greedy => kalah::play_greedy(game),
    }
}

// Win counts by final store, the last slot counts draws
fn report(outcomes: &[Option<Player>], policies: [Policy; 2]) {
    let total_games = outcomes.len();
    let mut win_counts = [0usize; 3];
    for outcome in outcomes {
        match outcome {
            Some(player) => win_counts[player.index()] += 1,
            None => win_counts[2] += 1,
        }
    }

    for player in [Player::One, Player::Two] {
        let wins = win_counts[player.index()];
        println!(
            "Win Count for {} ({:?}): {}/{}, ratio: {}",
            player,
            policies[player.index()],
            wins,
            total_games,
            wins as f64 / total_games as f64
        );
    }
    println!("Draws: {}/{}", win_counts[2], total_games);
}

fn simulate(config: &Config, log_file: &PathBuf, n_sims: usize) -> anyhow::Result<()> {
    let policies = [config.simulate.player_one, config.simulate.player_two];
    let board = Layout::new(config.engine.layout.as_slice(), config.engine.max_stones_per_pit).into_board()?;

    log::info!("Running {} simulations, {:?} against {:?}", n_sims, policies[0], policies[1]);

    let play_log: Arc<Mutex<PlayLog>> = Arc::new(Mutex::new(Vec::new()));

    let outcomes: Vec<Option<Player>> = (0..n_sims)
        .into_par_iter()
        .map(|game_idx| {
            let mut game = Game::new(board.clone());
            let mut plys = vec![PlayLogPly {
                game_id: game_idx,
                ply_id: -1,
                player: None,
                pit: None,
                board: game.board().pits().to_vec(),
                captured: 0,
                extra_turn: false,
            }];

            let mut ply_id: i32 = 0;
            while !game.is_game_over() {
                let policy = policies[game.current_player()];
                let Some(pit) = choose(policy, &game) else { break };
                let ply = match game.move_stones_from(pit) {
                    Ok(ply) => ply,
                    Err(err) => {
                        log::error!("Policy {:?} picked an illegal pit {}: {}", policy, pit, err);
                        break;
                    }
                };
                plys.push(PlayLogPly {
                    game_id: game_idx,
                    ply_id,
                    player: Some(ply.player),
                    pit: Some(pit),
                    board: game.board().pits().to_vec(),
                    captured: ply.captured,
                    extra_turn: ply.extra_turn,
                });
                ply_id += 1;
            }

            log::debug!(
                "Game {} finished after {} plys, score {} to {}",
                game_idx,
                ply_id,
                game.board().score(Player::One),
                game.board().score(Player::Two)
            );

            lock_play_log(&play_log).extend(plys);
            game.leader()
        })
        .collect();

    report(&outcomes, policies);

    let play_log = lock_play_log(&play_log);
    write_play_log(&play_log, log_file)
}

fn run_interactive(config: &Config, layout: Option<Vec<i32>>) -> anyhow::Result<()> {
    let layout = layout.unwrap_or_else(|| config.engine.layout.clone());
    let mut engine = Engine::new(config.engine.max_stones_per_pit);
    engine.initialize(Some(layout.as_slice()))?;
    let game = engine.game().cloned().ok_or(error::NotInitialized)?;

    color_eyre::install().map_err(|e| anyhow!("{}", e))?;
    let mut terminal = ratatui::init();
    let mut app = tui::InteractiveApp::new(game);

    let result = (|| -> anyhow::Result<()> {
        loop {
            terminal.draw(|frame| {
                frame.render_widget(app.clone(), frame.area());
            })?;

            let Event::Key(key_event) = event::read()? else { continue };
            if key_event.kind != KeyEventKind::Press {
                continue;
            }

            let pit = match key_event.code {
                KeyCode::Char('q') => break,
                KeyCode::Char('c') => {
                    engine.clear();
                    engine.initialize(Some(layout.as_slice()))?;
                    let game = engine.game().cloned().ok_or(error::NotInitialized)?;
                    app = tui::InteractiveApp::new(game);
                    continue;
                }
                KeyCode::Left => {
                    app.select_previous();
                    continue;
                }
                KeyCode::Right => {
                    app.select_next();
                    continue;
                }
                KeyCode::Char(' ') => match kalah::play_greedy(&app.game) {
                    Some(pit) => pit,
                    None => continue,
                },
                KeyCode::Enter => app.selected,
                _ => continue,
            };

            match engine.play(pit) {
                Ok(ply) => {
                    app.last_move = Some(ply);
                    app.message = None;
                    app.ply += 1;
                }
                Err(err) => app.message = Some(err.to_string()),
            }
            if let Some(game) = engine.game() {
                app.game = game.clone();
            }
            app.select_first();
        }
        Ok(())
    })();

    ratatui::restore();
    result
}

fn run(args: Args) -> Result<(), EngineError> {
    let config = Config::load_or_default(&args.config).map_err(anyhow::Error::from)?;

    match args.commands {
        Commands::Play { layout, moves } => play(&config, layout, &moves),
        Commands::Resume { id, moves } => resume(&config, id, &moves),
        Commands::Show { id } => show(&config, id),
        Commands::Interactive { layout } => Ok(run_interactive(&config, layout)?),
        Commands::Simulate { log_file, games, player_one, player_two } => {
            let mut config = config;
            if let Some(games) = games {
                config.simulate.games = games;
            }
            if let Some(policy) = player_one {
                config.simulate.player_one = policy;
            }
            if let Some(policy) = player_two {
                config.simulate.player_two = policy;
            }
            config.validate().map_err(anyhow::Error::from)?;
            Ok(simulate(&config, &log_file, config.simulate.games)?)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.is_internal() {
                log::error!("{:#}", err);
            }
            let problem = Problem::from(&err);
            match serde_json::to_string(&problem) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", problem.detail),
            }
            ExitCode::FAILURE
        }
    }
}
