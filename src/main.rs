use std::{fs::File, io::BufReader, path::PathBuf, process::ExitCode};

use cachesim::{
    config::{CacheConfig, Config},
    unified::{Simulator, StatReport, TagMatch},
};
use clap::{error::ErrorKind, Parser};
use eyre::Result;

const EXAMPLES: &str = "\
Examples:
  cachesim -U 512 4 128 -f gcc_trace
      simulates a 512 KB unified cache, 4-way set associative, 128 byte lines,
      replaying the trace in gcc_trace.
  cachesim -I 128 1 64 -D 512 4 128 -f gcc_trace
      separate I- and D-caches are accepted on the command line but not supported.";

const SUCCESS: u8 = 0;
/// a trace that stops reading part way, or a statistics dump that cannot be written
const FAILURE: u8 = 1;
/// exit status when the trace file cannot be opened
const TRACE_OPEN_FAILURE: u8 = 255;

#[derive(Parser, Debug)]
#[command(version, about = "Trace driven set-associative cache simulator", after_help = EXAMPLES)]
struct CacheSimArgs {
    #[arg(
        short = 'U',
        num_args = 3,
        value_names = ["SIZE_KB", "ASSOC", "LINE_SIZE"],
        help = "Simulate a unified cache"
    )]
    unified: Option<Vec<u64>>,
    #[arg(
        short = 'I',
        num_args = 3,
        value_names = ["SIZE_KB", "ASSOC", "LINE_SIZE"],
        help = "Instruction cache (not supported)"
    )]
    icache: Option<Vec<u64>>,
    #[arg(
        short = 'D',
        num_args = 3,
        value_names = ["SIZE_KB", "ASSOC", "LINE_SIZE"],
        help = "Data cache (not supported)"
    )]
    dcache: Option<Vec<u64>>,
    #[arg(short = 'f', help = "Path to the trace file")]
    trace_file: Option<PathBuf>,
    #[arg(short, long, help = "Path to config.toml, command line values override it")]
    config: Option<PathBuf>,
    #[arg(long, help = "Write the statistics as json")]
    stat_output: Option<PathBuf>,
    #[arg(long, help = "Let never-filled lines match on tag alone")]
    legacy_tag_match: bool,
    #[arg(long, help = "Tracing filter, RUST_LOG takes precedence")]
    log: Option<String>,
}

fn cache_config(values: &[u64]) -> CacheConfig {
    CacheConfig::new(values[0], values[1], values[2])
}

impl CacheSimArgs {
    /// merge the config file (if any) with the command line
    fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_config_file(&path.to_string_lossy())?,
            None => Config::default(),
        };
        if let Some(values) = &self.unified {
            config.unified = Some(cache_config(values));
        }
        if let Some(values) = &self.icache {
            config.icache = Some(cache_config(values));
        }
        if let Some(values) = &self.dcache {
            config.dcache = Some(cache_config(values));
        }
        if let Some(unified) = config.unified.as_mut() {
            if self.legacy_tag_match {
                unified.tag_match = TagMatch::IgnoreValid;
            }
        }
        config.trace_file = self.trace_file.clone().or(config.trace_file);
        config.stat_output = self.stat_output.clone().or(config.stat_output);
        Ok(config)
    }
}

pub fn main() -> ExitCode {
    let argv = match CacheSimArgs::try_parse() {
        Ok(argv) => argv,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                // usage errors are reported but do not fail the process
                _ => {
                    println!("Error parsing command line arguments. \n{EXAMPLES}");
                    ExitCode::SUCCESS
                }
            };
        }
    };
    cachesim::init_tracing(argv.log.as_deref().unwrap_or("warn"));
    ExitCode::from(run(&argv))
}

/// run one simulation and return the process exit status
fn run(argv: &CacheSimArgs) -> u8 {
    let config = match argv.to_config() {
        Ok(config) => config,
        Err(err) => {
            println!("Error reading configuration: {err:#}");
            return SUCCESS;
        }
    };
    if let Ok(shown) = config.show_config() {
        tracing::debug!("config: {shown}");
    }
    let (unified, trace_file) = match config.unified_run() {
        Ok(run) => run,
        Err(err) => {
            println!("Error: {err:#}\n{EXAMPLES}");
            return SUCCESS;
        }
    };

    println!(
        "Creating unified cache; size: {}kB, associativity: {}, cache line: {} bytes ",
        unified.size_kb, unified.associativity, unified.line_size
    );
    let geometry = match unified.geometry() {
        Ok(geometry) => geometry,
        Err(err) => {
            println!("Error creating cache: {err}\n{EXAMPLES}");
            return SUCCESS;
        }
    };
    println!(
        "sets: {} set bits: {} block bits: {} shift amount: {}",
        geometry.total_sets,
        geometry.set_index_bits,
        geometry.block_offset_bits,
        geometry.combined_shift
    );

    println!("Simulating the cache using trace file: {}. ", trace_file.display());
    let trace = match File::open(&trace_file) {
        Ok(file) => file,
        Err(err) => {
            println!("Error opening trace file: {err}. Exiting. ");
            return TRACE_OPEN_FAILURE;
        }
    };

    let simulator = Simulator::new(geometry, unified.tag_match, BufReader::new(trace));
    let statistics = match simulator.run() {
        Ok(statistics) => statistics,
        Err(err) => {
            eprintln!("simulation failed: {err:#}");
            return FAILURE;
        }
    };
    print!("{}", statistics.report());

    if let Some(path) = &config.stat_output {
        if let Err(err) = StatReport::new(&config, &statistics).save(path) {
            eprintln!("{err:#}");
            return FAILURE;
        }
        tracing::info!(path = %path.display(), "statistics saved");
    }
    SUCCESS
}
