use crate::{
    config::Config,
    relay::{Endpoint, OutboxMailer},
    render::{FrameSink, JsonLinesSink, TerminalSink},
    session::{Command, Session, terminal_viewport},
    swarm::Phase,
    viewport::{Variant, Viewport},
};
use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use crossterm::{event, terminal};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::PathBuf,
    time::{Duration, Instant},
};

mod config;
mod relay;
mod render;
mod session;
mod stage;
mod swarm;
mod viewport;
mod visibility;

/// Run a particle swarm that gathers into a glyph, holds, and explodes again.
#[derive(Parser)]
#[command(author, version, about, arg_required_else_help = true)]
struct Cli {
    /// The path to the configuration file.
    #[arg(short, long, global = true, env = "GLYPH_SWARM_CONFIG")]
    config: Option<PathBuf>,

    /// Log more; repeat for even more.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Animate the swarm in the terminal.
    Preview {
        /// Frames per second; overrides the config.
        #[arg(long)]
        fps: Option<u32>,

        /// Which visual to show.
        #[arg(long, default_value_t = Variant::Hero)]
        variant: Variant,
    },

    /// Run the swarm headless and write every frame as a line of JSON.
    Simulate {
        /// How many seconds to simulate.
        #[arg(long, default_value_t = 10.0)]
        duration: f64,

        #[arg(long, default_value_t = 30)]
        fps: u32,

        /// Viewport width in pixels.
        #[arg(long, default_value_t = 1280.0)]
        width: f32,

        /// Viewport height in pixels.
        #[arg(long, default_value_t = 800.0)]
        height: f32,

        /// Page scroll offset in pixels.
        #[arg(long, default_value_t = 0.0)]
        scroll: f32,

        /// Seed for the swarm; overrides the config.
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value_t = Variant::Hero)]
        variant: Variant,

        /// Where to write frames; stdout by default.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a form submission and write the resulting email to the outbox.
    Relay {
        endpoint: Endpoint,

        /// A file holding the JSON body; stdin when absent or `-`.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Overrides the configured outbox directory.
        #[arg(long)]
        outbox: Option<PathBuf>,
    },

    /// Print the effective configuration.
    Config {
        /// Print where the default config file is looked up instead.
        #[arg(long)]
        path: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn preview(config: &Config, variant: Variant, fps: Option<u32>) -> anyhow::Result<()> {
    let fps = fps.unwrap_or(config.preview.fps).max(1);
    let camera = config.preview.camera.clone();
    let (columns, rows) = terminal::size().context("querying terminal size")?;

    let mut session = Session::new(config, variant);
    let (viewport, height) = terminal_viewport(columns, rows, &camera);
    session.observe(viewport, height)?;

    let mut sink = TerminalSink::new(io::stdout(), camera.clone(), columns, rows);
    sink.enter().context("setting up terminal")?;
    let result = run_preview(&mut session, &mut sink, config, fps);
    sink.leave().context("restoring terminal")?;
    result
}

fn run_preview<W: Write>(
    session: &mut Session,
    sink: &mut TerminalSink<W>,
    config: &Config,
    fps: u32,
) -> anyhow::Result<()> {
    let frame_time = Duration::from_secs_f64(1.0 / fps as f64);
    let start = Instant::now();
    loop {
        let deadline = Instant::now() + frame_time;
        let layers = session.tick(start.elapsed().as_secs_f64());
        sink.set_status(session.status(&layers));
        sink.present(&layers)?;

        // handle input until the next frame is due
        while event::poll(deadline.saturating_duration_since(Instant::now()))? {
            match Command::from_event(&event::read()?, config.preview.scroll_step) {
                Some(Command::Quit) => return Ok(()),
                Some(Command::Scroll(delta)) => session.scroll_by(delta),
                Some(Command::Remount) => session.remount()?,
                Some(Command::Resize(columns, rows)) => {
                    sink.resize(columns, rows)?;
                    let (viewport, height) = terminal_viewport(columns, rows, &config.preview.camera);
                    session.observe(viewport, height)?;
                }
                None => {}
            }
        }
    }
}

struct SimulateOptions {
    duration: f64,
    fps: u32,
    width: f32,
    height: f32,
    scroll: f32,
    variant: Variant,
    output: Option<PathBuf>,
}

fn simulate(config: &Config, options: SimulateOptions) -> anyhow::Result<()> {
    if !options.duration.is_finite() || options.duration < 0.0 {
        return Err(anyhow!("duration must be a non negative number of seconds"));
    }
    let fps = options.fps.max(1);
    let mut session = Session::new(config, options.variant);
    let columns = (options.width / 8.0) as u16;
    let rows = (options.height / 16.0) as u16;
    let (viewport, _) = terminal_viewport(columns, rows, &config.preview.camera);
    session.observe(Viewport { width: options.width, ..viewport }, options.height)?;
    session.scroll_by(options.scroll);

    let writer: Box<dyn Write> = match &options.output {
        Some(path) => {
            Box::new(BufWriter::new(File::create(path).with_context(|| format!("creating {}", path.display()))?))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = JsonLinesSink::new(writer);
    let frames = (options.duration * fps as f64).round() as u64;
    let mut phases: BTreeMap<String, usize> = BTreeMap::new();
    let mut last_phase: Option<Phase> = None;
    let mut transitions = 0;
    for index in 0..=frames {
        let layers = session.tick(index as f64 / fps as f64);
        if let Some(phase) = layers.iter().find_map(|layer| layer.frame.phase) {
            *phases.entry(phase.to_string()).or_default() += 1;
            if last_phase.is_some_and(|last| last != phase) {
                transitions += 1;
            }
            last_phase = Some(phase);
        }
        sink.present(&layers)?;
    }
    let records = sink.records();
    sink.into_inner()?;
    log::info!("simulated {} frames ({records} records, {transitions} phase changes): {phases:?}", frames + 1);
    Ok(())
}

fn relay_submission(
    config: &Config,
    endpoint: Endpoint,
    input: Option<PathBuf>,
    outbox: Option<PathBuf>,
) -> anyhow::Result<()> {
    let body = match input {
        Some(path) if path.as_os_str() != "-" => {
            std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?
        }
        _ => {
            let mut body = String::new();
            io::stdin().read_to_string(&mut body).context("reading stdin")?;
            body
        }
    };
    let mut mailer = OutboxMailer::new(outbox.unwrap_or_else(|| config.relay.outbox_dir()));
    log::debug!("relaying {endpoint} submission into {}", mailer.directory().display());
    let response = relay::handle(endpoint, &body, &config.relay.mail, &mut mailer);
    println!("{}", serde_json::to_string_pretty(&response)?);
    if response.status != 200 {
        return Err(anyhow!("{endpoint} submission failed with status {}", response.status));
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::resolve(cli.config.as_deref())?;
    match cli.command {
        Commands::Preview { fps, variant } => preview(&config, variant, fps),
        Commands::Simulate { duration, fps, width, height, scroll, seed, variant, output } => {
            if seed.is_some() {
                config.swarm.seed = seed;
            }
            simulate(&config, SimulateOptions { duration, fps, width, height, scroll, variant, output })
        }
        Commands::Relay { endpoint, input, outbox } => relay_submission(&config, endpoint, input, outbox),
        Commands::Config { path } => {
            if path {
                match Config::default_path() {
                    Some(path) => println!("{}", path.display()),
                    None => return Err(anyhow!("no home directory to look up the config in")),
                }
            } else {
                print!("{}", serde_yaml::to_string(&config)?);
            }
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
