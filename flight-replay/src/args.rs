use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use flight_state_engine::RecordLayout;

#[derive(Parser, Debug)]
#[command(name = "Flight Replay")]
#[command(bin_name = "flight-replay")]
#[command(about = "replay recorded sensor frames through the flight state engine")]
pub struct Cli {
    #[arg(help = "csv file with one sensor frame per control cycle")]
    pub input: PathBuf,

    #[arg(long, short, default_value = "records.csv", help = "where to write the records")]
    pub output: PathBuf,

    #[arg(long, help = "flight config toml, defaults are used when omitted")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LayoutArg::Storage)]
    pub layout: LayoutArg,

    #[arg(long, help = "print the verbose rendering of the final frame")]
    pub debug: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutArg {
    Storage,
    Serial,
}

impl From<LayoutArg> for RecordLayout {
    fn from(layout: LayoutArg) -> Self {
        match layout {
            LayoutArg::Storage => RecordLayout::Storage,
            LayoutArg::Serial => RecordLayout::Serial,
        }
    }
}
