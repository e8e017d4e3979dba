use std::{
    error::Error,
    io::{self, BufRead, Write},
    process,
};

use clap::{command, Parser, Subcommand};
use log::{debug, error, LevelFilter};

use playmusic::{
    client::{MobileClient, StreamQuality},
    config::Config,
};

/// Profile to display when not built in release mode.
#[cfg(debug_assertions)]
const BUILD_PROFILE: &str = "debug";
/// Profile to display when not built release mode.
#[cfg(not(debug_assertions))]
const BUILD_PROFILE: &str = "release";

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Account to operate on
    ///
    /// Tokens are stored per account, so several accounts can be used side
    /// by side.
    #[arg(short, long, value_name = "EMAIL")]
    username: String,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Authorize this client interactively and store the token
    Login,

    /// List the tracks in the library
    Songs,

    /// List the playlists in the library
    Playlists,

    /// List the subscribed podcast series
    Podcasts,

    /// List the radio stations in the library
    Stations,

    /// Search the catalog and the library
    Search {
        query: String,

        /// Maximum results per type
        #[arg(short, long, default_value_t = 10)]
        max_results: u32,
    },

    /// List the devices registered to the account
    Devices,

    /// Resolve a track to its audio URL
    StreamUrl { track_id: String },
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
fn init_logger(config: &Args) {
    let mut logger = env_logger::Builder::from_env(
        // Note: if you change the default logging level here, then you should
        // probably also change the verbosity levels below.
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if config.quiet || config.verbose > 0 {
        let level = match config.verbose {
            0 => {
                // Quiet and verbose are mutually exclusive, and `verbose` is 0
                // by default. So this arm means: quiet mode.
                LevelFilter::Warn
            }
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module(module_path!(), level);
    }

    logger.init();
}

/// Runs the interactive authorization flow on the terminal.
async fn login(client: &MobileClient) -> Result<(), Box<dyn Error>> {
    println!("Open this URL in a browser and authorize access:");
    println!();
    println!("    {}", client.authorization_url());
    println!();
    print!("Paste the code shown after consenting: ");
    io::stdout().flush()?;

    let mut code = String::new();
    io::stdin().lock().read_line(&mut code)?;

    client.login(code.trim()).await?;
    println!("Logged in; token stored for later sessions.");

    Ok(())
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = Config::new(&args.username);
    let client = MobileClient::new(&config)?;

    if !matches!(args.command, Command::Login) && !client.is_authenticated() {
        return Err("not logged in; run the login command first".into());
    }

    match args.command {
        Command::Login => login(&client).await?,

        Command::Songs => {
            for track in client.songs().await? {
                println!(
                    "{}\t{} - {} ({})",
                    track.any_id().unwrap_or("-"),
                    track.artist,
                    track.title,
                    track.album
                );
            }
        }

        Command::Playlists => {
            for playlist in client.playlists().await? {
                println!("{}\t{}", playlist.id, playlist.name);
            }
        }

        Command::Podcasts => {
            for series in client.podcasts().await? {
                println!("{}\t{}", series.series_id, series.title);
            }
        }

        Command::Stations => {
            for station in client.stations().await? {
                println!("{}\t{}", station.id, station.name);
            }
        }

        Command::Search { query, max_results } => {
            let results = client.search(&query, max_results).await?;
            for track in results.tracks {
                println!(
                    "track\t{}\t{} - {}",
                    track.any_id().unwrap_or("-"),
                    track.artist,
                    track.title
                );
            }
            for album in results.albums {
                println!("album\t{}\t{} - {}", album.album_id, album.artist, album.name);
            }
            for artist in results.artists {
                println!("artist\t{}\t{}", artist.artist_id, artist.name);
            }
        }

        Command::Devices => {
            for device in client.devices().await? {
                println!(
                    "{}\t{}\t{}",
                    device.id,
                    device.kind,
                    device.friendly_name.as_deref().unwrap_or("-")
                );
            }
        }

        Command::StreamUrl { track_id } => {
            client.configure_device().await?;
            let url = client.stream_url(&track_id, StreamQuality::High).await?;
            println!("{url}");
        }
    }

    Ok(())
}

/// Main entry point of the application.
///
/// This function initializes the logger facade, parses the command line
/// arguments, and runs the selected command.
#[tokio::main]
async fn main() {
    // `clap` handles our command line arguments and help text.
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    // This aids in debugging of whatever comes next.
    debug!("Command {:#?}", args);

    let cmd = command!();
    let name = cmd.get_name().to_string();
    let version = cmd.get_version().unwrap_or("UNKNOWN").to_string();

    debug!("starting {name}/{version}; {BUILD_PROFILE}");

    if let Err(e) = run(args).await {
        error!("{e}");
        process::exit(1);
    }
}
