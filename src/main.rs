use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fifteen_twenty::arbiter::RandomDealer;
use fifteen_twenty::config::Config;
use fifteen_twenty::debounce::Debouncer;
use fifteen_twenty::game::{Drain, Flow, Game};
use fifteen_twenty::lexicon::{Lexicon, VoiceCommand};
use fifteen_twenty::producer::{self, Inbound, VoiceChunk};
use fifteen_twenty::render::{Renderer, Ui};
use fifteen_twenty::replay::{self, Script};
use fifteen_twenty::state::{RuntimeState, SharedState};
use fifteen_twenty::voice_state::VoiceStateMachine;

#[derive(Parser)]
#[command(name = "fifteen", about = "十五二十 - gesture and voice finger-guessing game")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Config file (missing file means defaults)
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Seed for the machine's hands
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Write the session report as JSON on exit
    #[arg(long, global = true)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Play from the terminal (default)
    Play,
    /// Play back a TOML script of timestamped events
    Replay { script: PathBuf },
    /// Print the voice vocabulary
    Vocab,
}

enum InputSource {
    Stdin,
    Script(Script),
}

#[hotpath::main]
fn main() -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

async fn async_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    let source = match cli.command.unwrap_or(Command::Play) {
        Command::Vocab => {
            print_vocab(&Lexicon::from_config(&config.vocabulary));
            return Ok(());
        }
        Command::Play => InputSource::Stdin,
        Command::Replay { script } => InputSource::Script(
            Script::load(&script)
                .with_context(|| format!("Failed to load replay script {}", script.display()))?,
        ),
    };

    run(config, source, cli.seed, cli.report).await
}

fn print_vocab(lexicon: &Lexicon) {
    println!("Commands:");
    for (pattern, command) in lexicon.commands() {
        println!("  {:<12} {}", pattern, command);
    }
    println!("Numbers:");
    for (pattern, value) in lexicon.numbers() {
        println!("  {:<12} {}", pattern, value);
    }
}

async fn run(
    config: Config,
    source: InputSource,
    seed: Option<u64>,
    report: Option<PathBuf>,
) -> anyhow::Result<()> {
    let state: SharedState = RuntimeState::new();
    let (ui, ui_rx) = Ui::new();

    // Channel: producers -> consumer loop
    let (tx, rx) = flume::unbounded::<Inbound>();
    // Channel: text sources -> voice producer
    let (voice_tx, voice_rx) = flume::unbounded::<VoiceChunk>();

    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Inbound::Ui(VoiceCommand::ExitGame));
    })
    .context("Failed to install Ctrl+C handler")?;

    // Voice producer thread: sole owner of the debouncer and voice state
    let now = Instant::now();
    let debouncer = Debouncer::new(
        Lexicon::from_config(&config.vocabulary),
        config.timing.clear_window(),
        now,
    );
    let machine = VoiceStateMachine::new(config.timing.detection_window(), now);
    let voice_handle = {
        let tx = tx.clone();
        let state = Arc::clone(&state);
        thread::spawn(move || {
            if let Err(e) = producer::run_voice_producer(voice_rx, tx, debouncer, machine, state) {
                warn!("Voice producer stopped: {}", e);
            }
        })
    };

    // Input thread, not joined: a blocking stdin read never returns on its own.
    // Once input closes the loop keeps cycling for a grace period so queued
    // events still reach the session.
    let grace = match source {
        InputSource::Stdin => {
            let tx = tx.clone();
            let state = Arc::clone(&state);
            thread::spawn(move || {
                let stdin = std::io::stdin();
                if let Err(e) = producer::run_line_reader(stdin.lock(), voice_tx, tx, state) {
                    warn!("Line reader stopped: {}", e);
                }
            });
            config.timing.fusion_tick() * 3
        }
        InputSource::Script(script) => {
            let grace = config.session.prepare()
                + config.session.round_timeout()
                + config.session.resolve_pause();
            let tx = tx.clone();
            let state = Arc::clone(&state);
            thread::spawn(move || {
                if let Err(e) = replay::run_replay(script, voice_tx, tx, state) {
                    warn!("Replay stopped: {}", e);
                }
            });
            grace
        }
    };
    let mut drain = Drain::new(grace);

    let dealer = RandomDealer::new(&config.machine, seed);
    let mut game = Game::new(&config, dealer, Arc::clone(&state), ui.clone());
    let mut renderer = Renderer::new(std::io::stdout(), config.session.valid_rounds);

    ui.message("十五二十 - say 开始游戏 or type /start, /help for commands");

    let mut cycle = tokio::time::interval(config.timing.fusion_tick());
    cycle.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Ok(inbound) = rx.recv_async() => {
                match game.on_inbound(inbound, Instant::now()) {
                    Flow::Exit => break,
                    Flow::Closed(source) => {
                        info!(
                            source,
                            grace_ms = drain.grace().as_millis() as u64,
                            "Input finished, draining"
                        );
                        drain.start(Instant::now());
                    }
                    Flow::Continue => {}
                }
            }

            _ = cycle.tick() => {
                let now = Instant::now();
                if game.on_cycle(now) == Flow::Exit {
                    break;
                }
                if drain.expired(now) {
                    break;
                }
            }

            Ok(event) = ui_rx.recv_async() => {
                renderer.handle(event)?;
            }
        }
    }

    state.request_shutdown();
    for event in ui_rx.drain() {
        renderer.handle(event)?;
    }
    if voice_handle.join().is_err() {
        warn!("Voice producer panicked");
    }

    if let Some(path) = report {
        game.report()
            .write_json(&path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}
