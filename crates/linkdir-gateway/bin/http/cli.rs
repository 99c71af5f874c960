use clap::{Parser, ValueEnum};
use linkdir_directory::RenamePolicy;
use linkdir_gateway::Mode;
use linkdir_storage::ReadPolicy;
use linkdir_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const LISTEN_ADDR_ENV: &str = "LINKDIR_LISTEN_ADDR";
pub const DATA_DIR_ENV: &str = "LINKDIR_DATA_DIR";
pub const SEED_DIR_ENV: &str = "LINKDIR_SEED_DIR";
pub const MODE_ENV: &str = "LINKDIR_MODE";
pub const RENAME_POLICY_ENV: &str = "LINKDIR_RENAME_POLICY";
pub const READ_POLICY_ENV: &str = "LINKDIR_READ_POLICY";
pub const LOG_FORMAT_ENV: &str = "LINKDIR_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    #[value(name = "development")]
    Development,
    #[value(name = "production")]
    Production,
}

impl Display for ModeArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModeArg::Development => write!(f, "development"),
            ModeArg::Production => write!(f, "production"),
        }
    }
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Development => Mode::Development,
            ModeArg::Production => Mode::Production,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenamePolicyArg {
    Cascade,
    Preserve,
}

impl Display for RenamePolicyArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RenamePolicyArg::Cascade => write!(f, "cascade"),
            RenamePolicyArg::Preserve => write!(f, "preserve"),
        }
    }
}

impl From<RenamePolicyArg> for RenamePolicy {
    fn from(value: RenamePolicyArg) -> Self {
        match value {
            RenamePolicyArg::Cascade => RenamePolicy::Cascade,
            RenamePolicyArg::Preserve => RenamePolicy::Preserve,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReadPolicyArg {
    Degrade,
    Strict,
}

impl Display for ReadPolicyArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadPolicyArg::Degrade => write!(f, "degrade"),
            ReadPolicyArg::Strict => write!(f, "strict"),
        }
    }
}

impl From<ReadPolicyArg> for ReadPolicy {
    fn from(value: ReadPolicyArg) -> Self {
        match value {
            ReadPolicyArg::Degrade => ReadPolicy::Degrade,
            ReadPolicyArg::Strict => ReadPolicy::Strict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl Display for LogFormatArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormatArg::Pretty => write!(f, "pretty"),
            LogFormatArg::Json => write!(f, "json"),
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "linkdir", about = "Link directory HTTP server")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Directory holding links.json, categories.json, tags.json and settings.json.
    #[arg(long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Documents copied into the data directory when missing there.
    #[arg(long, env = SEED_DIR_ENV)]
    pub seed_dir: Option<PathBuf>,

    #[arg(long, env = MODE_ENV, value_enum, default_value_t = ModeArg::Production)]
    pub mode: ModeArg,

    #[arg(
        long,
        env = RENAME_POLICY_ENV,
        value_enum,
        default_value_t = RenamePolicyArg::Cascade
    )]
    pub rename_policy: RenamePolicyArg,

    #[arg(
        long,
        env = READ_POLICY_ENV,
        value_enum,
        default_value_t = ReadPolicyArg::Degrade
    )]
    pub read_policy: ReadPolicyArg,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,
}
