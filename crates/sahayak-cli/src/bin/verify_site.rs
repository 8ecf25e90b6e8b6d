use anyhow::{Context, Result};
use clap::Parser;
use sahayak_cli::{
    init_tracing, parse_point, Config, FixedLocation, DEFAULT_LOG_DIRECTIVES,
};
use sahayak_core::{CaptureArtifact, GeoPoint, SessionDriver, SessionEvent, VerificationSession};
use sahayak_osrm::OsrmClient;
use sahayak_sdk::{PortalClient, ProjectImageUploader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Verify presence at a project checkpoint and upload proof", long_about = None)]
struct Args {
    /// Project to verify
    #[arg(long)]
    project_id: String,

    /// Contractor submitting the proof
    #[arg(long)]
    contractor_id: String,

    /// Current position fix as "lat,lon"
    #[arg(long, value_parser = parse_point)]
    at: Option<GeoPoint>,

    /// Photo to upload once the location is verified
    #[arg(long)]
    photo: Option<PathBuf>,

    /// Portal API URL (overrides SAHAYAK_API_URL)
    #[arg(long)]
    url: Option<String>,

    /// Routing service URL (overrides SAHAYAK_OSRM_URL)
    #[arg(long)]
    osrm_url: Option<String>,

    /// Proximity tolerance in meters (overrides SAHAYAK_TOLERANCE_M)
    #[arg(long)]
    tolerance_m: Option<f64>,
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
    if let Some(tolerance_m) = args.tolerance_m {
        config.tolerance_m = tolerance_m;
    }
    let rules = config.verification_rules()?;

    let portal = PortalClient::new(&config.api_url, config.request_timeout())?;
    let project = portal.fetch_project(&args.project_id).await?;
    let (start, end) = project.route_endpoints()?;
    println!("Project {}: {}", project.id, project.project_name);

    let uploader = ProjectImageUploader::new(portal, &args.project_id, &args.contractor_id);
    let mut driver = SessionDriver::new(
        VerificationSession::verifying(start, end, rules),
        Arc::new(OsrmClient::new(&config.osrm_config())?),
        Arc::new(FixedLocation::new(args.at)),
        Arc::new(uploader),
        (),
    );

    driver.settle().await;
    println!("{}", driver.session().status_message());
    if driver.session().survey().is_none() {
        anyhow::bail!("Route could not be loaded");
    }

    driver.dispatch(SessionEvent::LocationRequested);
    driver.settle().await;
    println!("{}", driver.session().status_message());
    if !driver.session().capture_unlocked() {
        return Ok(());
    }

    let Some(photo) = args.photo.as_deref() else {
        println!("Camera unlocked. Re-run with --photo to upload proof.");
        return Ok(());
    };

    let artifact = read_artifact(photo)?;
    driver.dispatch(SessionEvent::CaptureSubmitted(artifact));
    driver.settle().await;
    println!("{}", driver.session().status_message());

    if driver.session().state().name() != "reported" {
        anyhow::bail!("Proof upload did not complete");
    }
    Ok(())
}

fn read_artifact(path: &Path) -> Result<CaptureArtifact> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "proof.jpg".to_string());
    let content_type = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    };
    Ok(CaptureArtifact::new(file_name, content_type, bytes))
}
