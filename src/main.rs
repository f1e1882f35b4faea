//! campus-power entry point: CLI wiring, ingestion and ranking output.

mod cli;

use std::path::Path;
use std::process;

use campus_power::calendar;
use campus_power::config::AppConfig;
use campus_power::io::export::export_ranking;
use campus_power::io::{Ingestion, ingest};
use campus_power::observability::init_tracing;
use campus_power::ranking::{Ranked, advance, rank_and_color};
use campus_power::report::WeeklySummary;
use campus_power::synth::SyntheticCampus;

use cli::{CliOptions, TimeArg};

fn load_config(cli: &CliOptions) -> Result<AppConfig, String> {
    let mut config = if let Some(ref path) = cli.config {
        AppConfig::from_toml_file(path).map_err(|e| e.to_string())?
    } else if let Some(ref name) = cli.preset {
        AppConfig::from_preset(name).map_err(|e| e.to_string())?
    } else {
        AppConfig::campus()
    };

    if let Some(ref p) = cli.buildings {
        config.data.buildings = p.clone();
    }
    if let Some(ref p) = cli.sites {
        config.data.sites = p.clone();
    }
    if let Some(ref p) = cli.measurements {
        config.data.measurements = p.clone();
    }

    let errors = config.validate();
    if !errors.is_empty() {
        let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(lines.join("\n"));
    }
    Ok(config)
}

fn print_ranking(ranking: &[Ranked]) {
    if let Some(first) = ranking.first() {
        let when = calendar::describe(first.time).unwrap_or_else(|_| first.time.to_string());
        println!("Campus power on {when}");
    }
    for r in ranking {
        println!("{r}");
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn main() {
    init_tracing();

    let cli = match cli::parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };

    let config = load_config(&cli).unwrap_or_else(|e| fail(e));

    if cli.preset.as_deref() == Some("demo") {
        let campus = SyntheticCampus {
            grid: config.measurement_grid().unwrap_or_else(|e| fail(e)),
            ..SyntheticCampus::default()
        };
        if let Err(e) = campus.write_to_dir(&AppConfig::demo_dir()) {
            fail(format!("failed to write demo data: {e}"));
        }
    }

    let options = config.ingest_options().unwrap_or_else(|e| fail(e));
    let Ingestion {
        mut buildings,
        issues,
    } = ingest(&config.source_paths(), &options);
    for issue in &issues {
        eprintln!("warning: {issue}");
    }

    let time = match cli.time {
        Some(TimeArg::Unix(t)) => t,
        Some(TimeArg::Date(ref d)) => calendar::parse_date(d).unwrap_or_else(|e| fail(e)),
        None => options.initial_time,
    };

    let ranking = rank_and_color(&mut buildings, time).unwrap_or_else(|e| fail(e));
    print_ranking(&ranking);

    for _ in 0..cli.cycles {
        let step = advance(&mut buildings, config.report.cycle_step_secs).unwrap_or_else(|e| fail(e));
        println!();
        print_ranking(&step.ranking);
        if step.reached_end {
            break;
        }
    }

    if let Some(id) = cli.building {
        let Some(building) = buildings.iter().find(|b| b.building_id() == id) else {
            fail(format!("no building with id {id}"));
        };
        let r = &config.report;
        let summary =
            WeeklySummary::for_building(building, config.history_floor(), r.interval_secs, r.history_len)
                .unwrap_or_else(|e| fail(e));
        println!("\n{summary}");
    }

    if let Some(ref path) = cli.export {
        if let Err(e) = export_ranking(&ranking, Path::new(path)) {
            fail(format!("failed to write CSV: {e}"));
        }
        eprintln!("Ranking written to {}", path.display());
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        use campus_power::api::{AppState, HistorySettings, serve};

        let r = &config.report;
        let state = Arc::new(AppState {
            buildings,
            default_time: time,
            history: HistorySettings {
                floor: config.history_floor(),
                interval: r.interval_secs,
                len: r.history_len,
            },
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()
            .unwrap_or_else(|e| fail(format!("failed to create tokio runtime: {e}")));
        if let Err(e) = rt.block_on(serve(state, addr)) {
            fail(format!("server error: {e}"));
        }
    }
}
