use chrono::Utc;
use tracing_subscriber::EnvFilter;

use departures_core::api::{ClientConfig, DeparturesClient};
use departures_core::cache::SnapshotStore;
use departures_core::domain::merge_departures;
use departures_core::location::{Coordinate, LocationEvent, LocationFix};
use departures_core::settings::SettingsStore;
use departures_core::update::{UpdateConfig, UpdateCoordinator, UpdateStatus};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (lat, lng) = match (
        args.next().and_then(|a| a.parse::<f64>().ok()),
        args.next().and_then(|a| a.parse::<f64>().ok()),
    ) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            eprintln!("Usage: departures-core <lat> <lng>");
            eprintln!("Example: departures-core 51.5072 -0.1276");
            std::process::exit(2);
        }
    };

    let mut client_config = ClientConfig::new();
    if let Ok(base_url) = std::env::var("DEPARTURES_BASE_URL") {
        client_config = client_config.with_base_url(base_url);
    }
    let client = DeparturesClient::new(client_config).expect("Failed to create HTTP client");

    let store = SnapshotStore::new(std::env::temp_dir().join("departures-snapshot.json"));
    let settings = SettingsStore::new(std::env::temp_dir().join("departures-settings.json"));

    let coordinator =
        UpdateCoordinator::new(client, store, UpdateConfig::default(), settings.load());

    coordinator
        .handle_location_event(LocationEvent::Fix(LocationFix {
            coordinate: Coordinate::new(lat, lng),
            accuracy_m: 0.0,
            timestamp: Utc::now(),
        }))
        .await;

    let now = Utc::now();
    match coordinator.status().await {
        UpdateStatus::Loaded { data, .. } => {
            for station_departures in data.iter() {
                println!("{}", station_departures.station.display_name());
                for row in merge_departures(&station_departures.departures) {
                    let rep = row.representative();
                    let times: Vec<String> =
                        row.times(now).iter().map(|m| m.to_string()).collect();
                    println!(
                        "  {} to {}: {} min",
                        rep.display_line(),
                        rep.display_destination(),
                        times.join(", ")
                    );
                }
            }
        }
        UpdateStatus::NoResults { .. } => println!("No stations nearby."),
        other => {
            eprintln!("Failed to fetch departures ({other:?})");
            std::process::exit(1);
        }
    }
}
