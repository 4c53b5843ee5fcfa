//! bus-finder - live bus arrivals in the terminal
//!
//! Resolves a location from an address or coordinates, lists nearby
//! stations and follows the arrivals board of one of them.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use bus_finder::api::{
    ApiConfig, ApiError, BoardSource, BusApi, BusApiClient, DEFAULT_BASE_URL,
};
use bus_finder::autocomplete::{AddressAutocomplete, AutocompleteView, validate_query};
use bus_finder::config::SessionConfig;
use bus_finder::domain::{
    Address, ArrivalBoard, ArrivalSort, BoardQuery, Coordinate, InvalidCoordinate, NearbyStations,
    StationKey, Urgency, format_arrival, format_distance, format_last_updated,
};
use bus_finder::error::{NetworkError, ValidationError};
use bus_finder::feed::FeedView;
use bus_finder::location::{
    AcquisitionOutcome, FixedLocationProvider, GeolocationAcquisition, Platform,
};
use bus_finder::navigation::NavigationError;
use bus_finder::session::Session;

#[derive(Parser, Debug)]
#[command(name = "bus-finder")]
#[command(version)]
#[command(about = "Find nearby bus stations and follow live arrivals")]
#[command(long_about = "\
bus-finder - live bus arrivals in the terminal

USAGE:
    # Stations near an address, board of the nearest one
    bus-finder --address \"Dizengoff 50\"

    # Stations near a coordinate, a specific station, print once
    bus-finder --lat 32.0779 --lng 34.7744 --station 21472 --once

    # The backend's default board
    bus-finder

ENVIRONMENT:
    BUS_API_BASE_URL    Backend address (default: http://localhost:8000)
    RUST_LOG            Log filter (default: info, or debug with --verbose)
")]
struct Cli {
    /// Free-text address; the best match is used
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    address: Option<String>,

    /// Latitude of the search center
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the search center
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lng: Option<f64>,

    /// Station to follow (default: nearest)
    #[arg(long, value_name = "KEY")]
    station: Option<StationKey>,

    /// Search radius in meters
    #[arg(long, default_value_t = 300)]
    radius: u32,

    /// Board ordering
    #[arg(long, value_enum)]
    sort: Option<SortArg>,

    /// Only show lines containing this text
    #[arg(long, value_name = "TEXT")]
    line: Option<String>,

    /// Print the board once and exit
    #[arg(long)]
    once: bool,

    /// Backend base URL
    #[arg(long, env = "BUS_API_BASE_URL")]
    base_url: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Line,
    Arrival,
}

impl From<SortArg> for ArrivalSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Line => ArrivalSort::ByLine,
            SortArg::Arrival => ArrivalSort::ByArrival,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Coordinate(#[from] InvalidCoordinate),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Network(#[from] NetworkError),

    #[error("{0}")]
    Location(String),

    #[error("no addresses found for \"{0}\"")]
    NoAddress(String),

    #[error("no stations within {0} m")]
    NoStations(u32),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let base_url = cli.base_url.clone().unwrap_or_else(|| {
        warn!("BUS_API_BASE_URL not set, using {DEFAULT_BASE_URL}");
        DEFAULT_BASE_URL.to_string()
    });

    let config = SessionConfig::default().with_station_radius(cli.radius);
    let api = Arc::new(BusApiClient::new(
        ApiConfig::default().with_base_url(base_url),
    )?);
    info!(base_url = api.base_url(), "backend configured");

    let session = Session::new(Arc::clone(&api), &config);

    let mut query = BoardQuery::sorted(cli.sort.map(ArrivalSort::from).unwrap_or_default());
    if let Some(line) = &cli.line {
        query = query.with_line_filter(line.clone());
    }

    if let Some(text) = &cli.address {
        let autocomplete = AddressAutocomplete::new(Arc::clone(&api), &config);
        validate_query(text, config.min_query_chars)?;
        let address = lookup_address(&autocomplete, text).await?;
        println!("Address: {}", address.display_name);
        session.select_address(address).await?;
    } else if let (Some(lat), Some(lng)) = (cli.lat, cli.lng) {
        let coordinate = Coordinate::new(lat, lng)?;
        locate(&session, coordinate, &config).await?;
    } else {
        println!("No location given, showing the default board");
        session.feed().select(BoardSource::Default).await;
        return follow(&session, &query, cli.once).await;
    }

    let discovered = session.discovery().settled().await;
    if let Some(error) = discovered.error {
        return Err(error.into());
    }
    let nearby = discovered
        .stations
        .filter(|n| !n.stations.is_empty())
        .ok_or(CliError::NoStations(cli.radius))?;
    print_stations(&nearby);

    let key = match cli.station {
        Some(key) => key,
        None => nearby
            .nearest()
            .map(|s| s.key)
            .ok_or(CliError::NoStations(cli.radius))?,
    };
    session.select_station_key(key).await?;

    follow(&session, &query, cli.once).await
}

/// Run the autocomplete pipeline for `text` and commit the best match.
async fn lookup_address<A: BusApi>(
    autocomplete: &AddressAutocomplete<A>,
    text: &str,
) -> Result<Address, CliError> {
    let mut rx = autocomplete.subscribe();
    autocomplete.set_query(text).await;

    let view: AutocompleteView = match rx.wait_for(|v| v.open && !v.loading).await {
        Ok(view) => view.clone(),
        Err(_) => autocomplete.view(),
    };
    if let Some(error) = view.error {
        return Err(error.into());
    }

    autocomplete
        .select(0)
        .await
        .ok_or_else(|| CliError::NoAddress(text.to_string()))
}

/// Resolve the session from a fixed position through the acquisition
/// state machine.
async fn locate<A: BusApi>(
    session: &Session<A>,
    coordinate: Coordinate,
    config: &SessionConfig,
) -> Result<(), CliError> {
    let provider = Arc::new(FixedLocationProvider::new(coordinate));
    let geolocation = GeolocationAcquisition::new(
        provider.clone(),
        Some(provider),
        Platform::Other,
        config,
    );

    match session.locate_with(&geolocation).await {
        AcquisitionOutcome::Found(position) => {
            println!("Location: {}", position.coordinate);
            Ok(())
        }
        AcquisitionOutcome::Denied(error) | AcquisitionOutcome::Failed(error) => {
            let guidance = geolocation.guidance();
            eprintln!("{}", guidance.title);
            for (i, step) in guidance.steps.iter().enumerate() {
                eprintln!("  {}. {step}", i + 1);
            }
            Err(CliError::Location(error.message))
        }
        AcquisitionOutcome::Superseded => Err(CliError::Location(
            "location request was abandoned".to_string(),
        )),
    }
}

/// Render the board on every refresh until Ctrl-C, or once.
async fn follow<A: BusApi>(
    session: &Session<A>,
    query: &BoardQuery,
    once: bool,
) -> Result<(), CliError> {
    let mut rx = session.feed().subscribe();

    loop {
        let view: FeedView = rx.borrow_and_update().clone();
        if !view.loading {
            if let Some(error) = &view.error {
                eprintln!("Error: {error} (retrying on next refresh)");
                if once {
                    return Err(error.clone().into());
                }
            }
            if let Some(board) = &view.board {
                print_board(board, query);
                if once {
                    return Ok(());
                }
            }
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                return Ok(());
            }
        }
    }
}

fn print_stations(nearby: &NearbyStations) {
    println!();
    println!(
        "{} stations within {} m:",
        nearby.stations.len(),
        nearby.radius
    );
    for station in &nearby.stations {
        let (lines, more) = station.line_preview();
        let mut lines = lines.join(" ");
        if more > 0 {
            lines.push_str(&format!(" +{more}"));
        }

        let name = match &station.english_name {
            Some(english) if *english != station.name => {
                format!("{} ({english})", station.name)
            }
            _ => station.name.clone(),
        };
        println!(
            "  {:>6}  {:<40} {:>8}  {lines}",
            station.key.get(),
            name,
            format_distance(station.distance_meters)
        );
    }
}

fn print_board(board: &ArrivalBoard, query: &BoardQuery) {
    println!();
    println!(
        "Station {}  updated {}",
        board.station_id,
        format_last_updated(&board.last_updated)
    );

    if board.is_empty() {
        println!("  No buses expected");
        return;
    }

    let arrivals = board.view(query);
    if arrivals.is_empty() {
        println!("  No lines match the filter");
        return;
    }

    for arrival in arrivals {
        let upcoming: Vec<String> = arrival
            .upcoming()
            .iter()
            .map(|&m| format_arrival(m))
            .collect();
        println!(
            "  {} {:>5}  {:<30} {}",
            urgency_marker(arrival.urgency()),
            arrival.line_number,
            arrival.destination,
            upcoming.join(", ")
        );
    }
}

fn urgency_marker(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Imminent => "!!",
        Urgency::Soon => "! ",
        Urgency::Approaching => "- ",
        Urgency::Normal => "  ",
    }
}
