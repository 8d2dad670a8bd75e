use anyhow::Context;
use clap::{Parser, Subcommand};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers, MouseEventKind},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::fs::File;
use std::io::{BufWriter, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

mod camera;
mod config;
mod controller;
mod effects;
mod error;
mod palette;
mod particles;
mod shader;
mod site;
mod surface;

use config::{Config, Tuning};
use controller::{Container, Controller};
use effects::Effect;
use error::FxError;
use palette::{Rgb, parse_hex_color};

#[derive(Parser)]
#[command(name = "windrunner-fx", about = "Shadow-themed particle effects for the terminal")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an effect full-screen (q, Esc or Ctrl+C to exit)
    Run {
        /// Effect name, see `list`
        effect: String,
        /// RNG seed for reproducible spawns
        #[arg(long)]
        seed: Option<u64>,
        /// Background color as hex (e.g. 1a1b26)
        #[arg(long, value_name = "RRGGBB")]
        bg_color: Option<String>,
        /// JSON config with seed, bg_color and per-effect overrides
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write logs here; the terminal itself is the canvas
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// List available effects
    List,
    /// Drive the site widgets and print their state as JSON
    Site {
        #[command(subcommand)]
        command: SiteCommand,
    },
}

#[derive(Subcommand)]
enum SiteCommand {
    /// Select a class by id
    Class { id: String },
    /// Build the registration link for a plan
    Subscribe {
        plan: String,
        #[arg(long)]
        yearly: bool,
    },
    /// Click FAQ items in order and report which one is open
    Faq {
        #[arg(long, default_value = "6")]
        items: usize,
        clicks: Vec<usize>,
    },
    /// Let the testimonial slider auto-advance for a while
    Slider {
        #[arg(long, default_value = "3")]
        count: usize,
        #[arg(long, default_value = "20")]
        seconds: f32,
        /// Treat the page as hidden so nothing advances
        #[arg(long)]
        hidden: bool,
        /// Press the previous button this many times first
        #[arg(long, default_value = "0")]
        back: usize,
    },
    /// Check an API key
    ValidateKey { key: String },
    /// Submit a form with key=value fields
    Submit { form: String, fields: Vec<String> },
    /// Scroll the page, then follow an anchor to a section offset
    Nav {
        #[arg(long, default_value = "0")]
        scroll: f32,
        #[arg(long)]
        anchor: Option<String>,
        #[arg(long, default_value = "0")]
        offset: f32,
        #[arg(long)]
        menu_open: bool,
    },
}

fn init_logging(verbose: bool, log_file: Option<&PathBuf>, to_stderr: bool) -> anyhow::Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    if let Some(path) = log_file {
        let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn run<E: Effect>(tuning: Tuning, seed: u64, background: Rgb) -> anyhow::Result<()> {
    let mut controller = Controller::<E>::new(tuning, seed, background);
    let stdout = stdout();
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout);

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All), EnableMouseCapture)?;

    let result = frame_loop(&mut controller, &mut stdout);

    execute!(stdout, Show, LeaveAlternateScreen, DisableMouseCapture)?;
    terminal::disable_raw_mode()?;
    result
}

fn frame_loop<E: Effect>(controller: &mut Controller<E>, stdout: &mut BufWriter<std::io::Stdout>) -> anyhow::Result<()> {
    let (cols, rows) = terminal::size()?;
    if !controller.start(Container::from_terminal(cols, rows)) {
        return Ok(());
    }
    let token = controller.token();
    let mut last_frame = Instant::now();

    loop {
        if event::poll(Duration::from_millis(1))? {
            let event = event::read()?;
            match &event {
                Event::Key(key) => {
                    if key.code == KeyCode::Char('q')
                        || key.code == KeyCode::Esc
                        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
                    {
                        token.cancel();
                    } else {
                        controller.handle_event(&event);
                    }
                }
                Event::Resize(cols, rows) => {
                    if let Some(container) = Container::from_terminal(*cols, *rows) {
                        controller.on_resize(container.width, container.height);
                    }
                    execute!(stdout, Clear(ClearType::All))?;
                }
                Event::Mouse(mouse) if mouse.kind == MouseEventKind::Moved => {
                    controller.on_pointer_move(mouse.column as f32, mouse.row as f32 * 2.0);
                }
                _ => controller.handle_event(&event),
            }
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        if !controller.advance(frame_time) {
            break;
        }
        controller.render(stdout)?;
    }
    Ok(())
}

fn run_named(name: &str, tuning: Tuning, seed: u64, background: Rgb) -> anyhow::Result<()> {
    tracing::info!(effect = name, seed, count = tuning.count, "starting");
    match name {
        "banshee" => run::<effects::banshee::BansheeEffect>(tuning, seed, background),
        "runes" => run::<effects::runes::RunesEffect>(tuning, seed, background),
        "portal" => run::<effects::portal::PortalEffect>(tuning, seed, background),
        "realm" => run::<effects::realm::RealmEffect>(tuning, seed, background),
        "bow" => run::<effects::bow::BowEffect>(tuning, seed, background),
        "emblem" => run::<effects::emblem::EmblemEffect>(tuning, seed, background),
        other => Err(FxError::UnknownEffect(other.to_string()).into()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_site(command: SiteCommand) -> anyhow::Result<()> {
    match command {
        SiteCommand::Class { id } => {
            let mut selector = site::ClassSelector::new();
            let class = selector
                .select(&id)
                .ok_or_else(|| anyhow::anyhow!("unknown class: {id}"))?;
            print_json(class)
        }
        SiteCommand::Subscribe { plan, yearly } => {
            let mut toggle = site::BillingToggle::new();
            if yearly {
                toggle.toggle();
            }
            let url = site::subscription_url(&plan, toggle.billing());
            print_json(&serde_json::json!({
                "period": toggle.billing(),
                "monthly_shown": toggle.is_visible(site::Billing::Monthly),
                "yearly_label_active": toggle.is_active(site::Billing::Yearly),
                "url": url,
            }))
        }
        SiteCommand::Faq { items, clicks } => {
            let mut faq = site::FaqAccordion::new(items);
            for index in clicks {
                faq.click(index);
            }
            let icons: Vec<_> = (0..faq.len()).map(|i| faq.icon(i)).collect();
            print_json(&serde_json::json!({ "open": faq.open_item(), "icons": icons }))
        }
        SiteCommand::Slider {
            count,
            seconds,
            hidden,
            back,
        } => {
            let mut slider = site::TestimonialSlider::new(count);
            for _ in 0..back {
                slider.prev();
            }
            let current = slider.tick(seconds, hidden);
            print_json(&serde_json::json!({ "current": current }))
        }
        SiteCommand::ValidateKey { key } => print_json(&site::validate_api_key(&key)),
        SiteCommand::Submit { form, fields } => {
            let fields: Vec<(String, String)> = fields
                .iter()
                .map(|field| match field.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (field.clone(), String::new()),
                })
                .collect();
            print_json(&site::submit_form(&form, &fields))
        }
        SiteCommand::Nav {
            scroll,
            anchor,
            offset,
            menu_open,
        } => {
            let mut nav = site::Navigation::new();
            if menu_open {
                nav.toggle_menu();
            }
            nav.on_scroll(scroll);
            let target = anchor.and_then(|href| nav.follow_anchor(&href, offset));
            print_json(&serde_json::json!({
                "scrolled": nav.scrolled(),
                "menu_open": nav.menu_open(),
                "scroll_to": target,
            }))
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            effect,
            seed,
            bg_color,
            config,
            log_file,
        } => {
            init_logging(cli.verbose, log_file.as_ref(), false)?;
            let config = match &config {
                Some(path) => Config::load(path).context("loading config")?,
                None => Config::default(),
            };
            let background = match bg_color {
                Some(hex) => parse_hex_color(&hex).ok_or(FxError::InvalidColor(hex))?,
                None => config.background()?.unwrap_or((0, 0, 0)),
            };
            let seed = seed.or(config.seed).unwrap_or_else(|| fastrand::u64(..));
            run_named(&effect, config.tuning(&effect), seed, background)
                .with_context(|| format!("running effect {effect}"))
        }
        Commands::List => {
            for (name, about) in effects::NAMES {
                println!("  {name:<9} {about}");
            }
            Ok(())
        }
        Commands::Site { command } => {
            init_logging(cli.verbose, None, true)?;
            run_site(command)
        }
    }
}
