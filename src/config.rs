use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Guild sim — ingests simulation reports and ranks loot by simulated upgrade.
#[derive(Parser, Debug, Clone)]
#[command(name = "guild-sim")]
pub struct CliArgs {
    /// Directory holding the report database
    #[arg(short = 'd', long = "data-dir", env = "GUILD_SIM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// HTTP port for the handler API
    #[arg(long = "port", env = "GUILD_SIM_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Base URL that bare report ids are resolved against
    #[arg(
        long = "report-base-url",
        env = "GUILD_SIM_REPORT_BASE_URL",
        default_value = DEFAULT_REPORT_BASE_URL
    )]
    pub report_base_url: String,

    /// Transport timeout for each report artifact request
    #[arg(
        long = "fetch-timeout-secs",
        env = "GUILD_SIM_FETCH_TIMEOUT_SECS",
        default_value_t = DEFAULT_FETCH_TIMEOUT_SECS
    )]
    pub fetch_timeout_secs: u64,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(short = 'l', long = "log-dir", env = "GUILD_SIM_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub port: u16,
    pub report_base_url: String,
    pub fetch_timeout: Duration,
    pub log_dir: Option<PathBuf>,
}

// Server constants
pub const DEFAULT_PORT: u16 = 9890;
pub const DB_FILE_NAME: &str = "guild-sim.db";
pub const LOG_FILE_PREFIX: &str = "guild-sim.log";

// Report fetch constants
pub const DEFAULT_REPORT_BASE_URL: &str = "https://www.raidbots.com/simbot/report/";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const TABULAR_ARTIFACT: &str = "data.csv";
pub const STRUCTURED_ARTIFACT: &str = "data.json";

impl AppConfig {
    pub fn from_args(args: CliArgs) -> Self {
        let data_dir = args.data_dir.unwrap_or_else(default_data_dir);

        AppConfig {
            data_dir,
            port: args.port,
            report_base_url: args.report_base_url,
            fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
            log_dir: args.log_dir,
        }
    }

    /// Path to the SQLite report database
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("guild-sim")
}
