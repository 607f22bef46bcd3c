// Entry point and high-level console flow.
//
// - Option [1] loads the cost records and prints diagnostics.
// - Option [2] pivots them, previews each zone grid and exports JSON/CSV.
// - Option [3] expands (or collapses) one zone's drill-down.
// - Option [4] normalizes the KPI payload and previews the indicators.
use cost_rollup::config::AppConfig;
use cost_rollup::loader;
use cost_rollup::output;
use cost_rollup::util;
use cost_rollup::{normalize_kpi, pivot_scoped, DrilldownState, ExpandOutcome, FileDetailSource, ZoneType};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;

// Simple in-memory app state so we only load the records once but can
// pivot and drill down multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        zones: None,
        drilldown: DrilldownState::new(),
    })
});

struct AppState {
    zones: Option<Vec<ZoneType>>,
    drilldown: DrilldownState,
}

/// Read a single trimmed line after printing `prompt`.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn handle_load(cfg: &AppConfig) {
    match loader::load_zones(&cfg.records_path) {
        Ok((zones, report)) => {
            println!(
                "Loaded {} rows across {} zones from {}",
                util::format_int(report.total_rows as u64),
                util::format_int(report.zones as u64),
                cfg.records_path.display()
            );
            if report.parse_errors > 0 {
                println!(
                    "Note: {} rows skipped due to parse errors.",
                    util::format_int(report.parse_errors as u64)
                );
            }
            println!();
            let Ok(mut state) = APP_STATE.lock() else {
                eprintln!("Application state is unavailable.\n");
                return;
            };
            state.zones = Some(zones);
            state.drilldown = DrilldownState::new();
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}\n", cfg.records_path.display(), e);
        }
    }
}

fn handle_pivot(cfg: &AppConfig) {
    let zones = match APP_STATE.lock() {
        Ok(state) => state.zones.clone(),
        Err(_) => None,
    };
    let Some(zones) = zones else {
        println!("Error: No records loaded. Please load the records first (option 1).\n");
        return;
    };

    let aggregates = pivot_scoped(&zones, &cfg.scope);
    for zone in &aggregates {
        println!("Zone: {}\n", zone.key);
        println!("{}\n", output::render_zone_grid(zone, cfg.decimals));
    }

    let json_path = cfg.output_dir.join("pivot.json");
    if let Err(e) = output::write_json(&json_path, &aggregates) {
        eprintln!("Write error: {}", e);
    }
    let csv_path = cfg.output_dir.join("pivot.csv");
    if let Err(e) = output::write_csv(&csv_path, &output::flatten_pivot(&aggregates)) {
        eprintln!("Write error: {}", e);
    }
    println!(
        "(Full pivot exported to {} and {})\n",
        json_path.display(),
        csv_path.display()
    );
}

fn handle_expand(cfg: &AppConfig) {
    let zone = read_line("Zone to expand/collapse: ");
    if zone.is_empty() {
        return;
    }
    let Ok(mut state) = APP_STATE.lock() else {
        eprintln!("Application state is unavailable.\n");
        return;
    };
    if state.drilldown.is_expanded(&zone) {
        state.drilldown.collapse(&zone);
        println!("Zone {} collapsed.\n", zone);
        return;
    }

    let source = FileDetailSource::new(cfg.detail_dir.clone());
    match state.drilldown.expand(&zone, &source) {
        ExpandOutcome::Applied { .. } => {
            if let Some(detail) = state.drilldown.overlay(&zone) {
                println!("Zone {} detail:\n", zone);
                output::preview_table_rows(&output::overlay_rows(detail, cfg.decimals), cfg.preview_rows);
            }
        }
        ExpandOutcome::Stale => println!("A newer request for {} is pending.\n", zone),
        ExpandOutcome::Failed => {
            println!("Could not load detail for {}; showing the summary row.\n", zone)
        }
    }
}

fn handle_kpi(cfg: &AppConfig) {
    let payload = match loader::load_json(&cfg.kpi_path) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Failed to load {}: {}\n", cfg.kpi_path.display(), e);
            return;
        }
    };
    let report = normalize_kpi(&payload);
    println!("Indicators ({}):\n", report.indicateurs.len());
    output::preview_table_rows(&output::indicator_rows(&report, cfg.decimals), cfg.preview_rows);

    let path = cfg.output_dir.join("indicateurs.json");
    if let Err(e) = output::write_json(&path, &report) {
        eprintln!("Write error: {}", e);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    loop {
        println!("Select an action:");
        println!("[1] Load cost records");
        println!("[2] Pivot by zone");
        println!("[3] Expand/collapse a zone");
        println!("[4] KPI indicators");
        println!("[5] Exit\n");
        match read_line("Enter choice: ").as_str() {
            "1" => handle_load(&cfg),
            "2" => handle_pivot(&cfg),
            "3" => handle_expand(&cfg),
            "4" => handle_kpi(&cfg),
            "5" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1 to 5.\n"),
        }
    }
}
