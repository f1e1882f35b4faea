use std::env;
use std::path::PathBuf;

/// Time requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeArg {
    Unix(i64),
    /// `MM/DD/YYYY`, parsed later so errors carry the date rule.
    Date(String),
}

#[derive(Debug)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub buildings: Option<PathBuf>,
    pub sites: Option<PathBuf>,
    pub measurements: Option<PathBuf>,
    pub time: Option<TimeArg>,
    pub building: Option<u32>,
    /// Extra ranking cycles printed after the first ranking.
    pub cycles: usize,
    pub export: Option<PathBuf>,
    #[cfg(feature = "api")]
    pub serve: bool,
    #[cfg(feature = "api")]
    pub port: u16,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions {
        config: None,
        preset: None,
        buildings: None,
        sites: None,
        measurements: None,
        time: None,
        building: None,
        cycles: 0,
        export: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                set_once(&mut opts.config, PathBuf::from(path), flag)?;
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                set_once(&mut opts.preset, name.to_string(), flag)?;
            }
            "--buildings" | "--sites" | "--measurements" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for a data file (expected a CSV path)")?;
                let slot = match flag {
                    "--buildings" => &mut opts.buildings,
                    "--sites" => &mut opts.sites,
                    _ => &mut opts.measurements,
                };
                set_once(slot, PathBuf::from(path), flag)?;
            }
            "--time" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --time (expected unix seconds)")?;
                let t = raw
                    .parse::<i64>()
                    .map_err(|_| format!("--time value \"{raw}\" is not a valid i64"))?;
                set_once(&mut opts.time, TimeArg::Unix(t), "--time/--date")?;
            }
            "--date" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --date (expected MM/DD/YYYY)")?;
                set_once(&mut opts.time, TimeArg::Date(raw.to_string()), "--time/--date")?;
            }
            "--building" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --building (expected a building id)")?;
                let id = raw
                    .parse::<u32>()
                    .map_err(|_| format!("--building value \"{raw}\" is not a valid u32"))?;
                set_once(&mut opts.building, id, flag)?;
            }
            "--cycle" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --cycle (expected a count)")?;
                opts.cycles = raw
                    .parse::<usize>()
                    .map_err(|_| format!("--cycle value \"{raw}\" is not a valid count"))?;
            }
            "--export" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --export (expected a file path)")?;
                set_once(&mut opts.export, PathBuf::from(path), flag)?;
            }
            #[cfg(feature = "api")]
            "--serve" => opts.serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                opts.port = raw
                    .parse::<u16>()
                    .map_err(|_| format!("--port value \"{raw}\" is not a valid u16"))?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.config.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    Ok(opts)
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("campus-power: rank campus buildings by metered wattage");
    eprintln!();
    eprintln!("Usage: campus-power [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load settings from a TOML file");
    eprintln!("  --preset <name>          Use a built-in preset (campus, demo)");
    eprintln!("  --buildings <path>       Building metadata CSV");
    eprintln!("  --sites <path>           Site metadata CSV");
    eprintln!("  --measurements <path>    Measurement CSV");
    eprintln!("  --time <unix>            Rank at this time (default: initial time)");
    eprintln!("  --date <MM/DD/YYYY>      Rank at midnight UTC of this date");
    eprintln!("  --building <id>          Print the weekly summary of one building");
    eprintln!("  --cycle <n>              Re-rank n more times, stepping forward each time");
    eprintln!("  --export <path>          Write the ranking to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start the REST API after ranking");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the campus preset is used.");
}
