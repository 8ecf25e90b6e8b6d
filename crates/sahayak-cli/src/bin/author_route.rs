use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sahayak_cli::{init_tracing, parse_point, Config, RouteDraft, DEFAULT_LOG_DIRECTIVES};
use sahayak_core::{Detached, GeoPoint, SessionDriver, SessionEvent, VerificationSession};
use sahayak_osrm::OsrmClient;
use sahayak_sdk::{NewProject, PortalClient};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

type AuthoringDriver = SessionDriver<OsrmClient, Detached, Detached, RouteDraft>;

#[derive(Parser, Debug)]
#[command(author, version, about = "Author a project route and its inspection checkpoints", long_about = None)]
struct Args {
    /// Start point as "lat,lon"
    #[arg(long, value_parser = parse_point)]
    start: Option<GeoPoint>,

    /// End point as "lat,lon"
    #[arg(long, value_parser = parse_point)]
    end: Option<GeoPoint>,

    /// Read map clicks ("lat,lon" per line) from stdin until EOF or "done"
    #[arg(long)]
    interactive: bool,

    /// Seed for reproducible checkpoint placement
    #[arg(long)]
    seed: Option<u64>,

    /// Portal API URL (overrides SAHAYAK_API_URL)
    #[arg(long)]
    url: Option<String>,

    /// Routing service URL (overrides SAHAYAK_OSRM_URL)
    #[arg(long)]
    osrm_url: Option<String>,

    /// Create the project on the portal once the route is ready
    #[arg(long)]
    create: bool,

    #[arg(long, requires = "create")]
    official_id: Option<String>,

    #[arg(long, default_value = "New Project")]
    project_name: String,

    #[arg(long, default_value = "Roads")]
    category: String,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long, default_value = "")]
    village: String,

    #[arg(long, default_value = "")]
    contractor_id: String,

    #[arg(long, default_value = "")]
    contractor_name: String,

    #[arg(long, default_value_t = 0.0)]
    budget: f64,

    #[arg(long)]
    start_date: Option<chrono::NaiveDate>,

    #[arg(long)]
    due_date: Option<chrono::NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(DEFAULT_LOG_DIRECTIVES)?;
    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(url) = &args.url {
        config.api_url = url.clone();
    }
    if let Some(url) = &args.osrm_url {
        config.osrm_url = url.clone();
    }

    let rules = config.verification_rules()?;
    let geometry = Arc::new(OsrmClient::new(&config.osrm_config())?);
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let session = VerificationSession::authoring_with_rng(rules, rng);
    let mut driver = SessionDriver::new(
        session,
        geometry,
        Arc::new(Detached),
        Arc::new(Detached),
        RouteDraft::default(),
    );

    let driver = if args.interactive {
        println!("Click map: enter \"lat,lon\" per line, \"done\" to finish.");
        run_interactive(driver).await?
    } else {
        let start = args.start.context("--start is required without --interactive")?;
        let end = args.end.context("--end is required without --interactive")?;
        driver.dispatch(SessionEvent::MapClicked(start));
        driver.dispatch(SessionEvent::MapClicked(end));
        driver.settle().await;
        driver
    };

    let session = driver.session();
    println!("{}", session.status_message());
    let revisions = driver.authoring().revisions();
    if revisions > 1 {
        println!("Route re-authored {} times; keeping the latest.", revisions);
    }
    let Some(survey) = session.survey() else {
        anyhow::bail!("No route authored: {}", session.status_message());
    };

    println!("Route: {} vertices, {:.0} m", survey.path.len(), survey.path.length_m());
    for checkpoint in &survey.checkpoints {
        println!(
            "Checkpoint {}: {:.6}, {:.6} ({:.0} m along route)",
            checkpoint.id, checkpoint.location.lat, checkpoint.location.lon, checkpoint.offset_m
        );
    }

    if !args.create {
        println!("{}", serde_json::to_string_pretty(survey)?);
        return Ok(());
    }

    let (start, end) = driver
        .authoring()
        .selected()
        .context("Route ready but no start/end pair was recorded")?;
    let official_id = args
        .official_id
        .as_deref()
        .context("--official-id is required with --create")?;

    let project = NewProject {
        project_name: args.project_name.clone(),
        category: args.category.clone(),
        description: args.description.clone(),
        location: args.village.clone(),
        allocated_budget: args.budget,
        start_date: args.start_date,
        due_date: args.due_date,
        contractor_id: args.contractor_id.clone(),
        contractor_name: args.contractor_name.clone(),
        village_name: args.village.clone(),
        approved_by: official_id.to_string(),
        start_point: start,
        end_point: end,
        route_path: Some(survey.path.clone()),
        inspection_points: survey.checkpoints.clone(),
    };

    let portal = PortalClient::new(&config.api_url, config.request_timeout())?;
    let created = portal.create_project(official_id, &project).await?;
    println!("Project created: {}", created.id);
    Ok(())
}

/// Feed stdin clicks to the driver; a new click supersedes a pending route lookup.
async fn run_interactive(driver: AuthoringDriver) -> Result<AuthoringDriver> {
    let (tx, rx) = mpsc::channel(16);

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "done" {
                break;
            }
            match parse_point(line) {
                Ok(point) => {
                    if tx.send(SessionEvent::MapClicked(point)).await.is_err() {
                        break;
                    }
                }
                Err(err) => eprintln!("Ignoring click: {:#}", err),
            }
        }
        anyhow::Ok(())
    });

    let driver = driver.run(rx).await;
    reader.await.context("stdin reader stopped")??;
    Ok(driver)
}
