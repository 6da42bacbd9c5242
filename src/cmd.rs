use clap::{Parser, Subcommand, ValueEnum};
use idsgen::TrafficClass;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Parser, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    #[arg(
        short,
        long,
        global = true,
        default_value = None,
        help = "Path to a TOML configuration file"
    )]
    pub config: Option<String>,
    #[arg(
        short,
        long,
        global = true,
        default_value = None,
        help = "Address and UDP port of the detection device [default: 192.168.4.1:3333]"
    )]
    pub destination: Option<SocketAddr>,
    #[arg(
        short,
        long,
        global = true,
        default_value = None,
        help = "Number of features per vector. Must match the detector input width [default: 122]"
    )]
    pub width: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ClassArg {
    Normal,
    Attack,
}

impl From<ClassArg> for TrafficClass {
    fn from(c: ClassArg) -> TrafficClass {
        match c {
            ClassArg::Normal => TrafficClass::Normal,
            ClassArg::Attack => TrafficClass::Attack,
        }
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Send a random mix of normal and attack packets with random pauses
    Simulate {
        #[arg(short, long, help = "Seed for random number generation")]
        seed: Option<u64>,
        #[arg(short = 'n', long, default_value = None, help = "Stop after that many packets per source. By default, run until interrupted")]
        count: Option<u64>,
        #[arg(long, default_value = None, value_parser = humantime::parse_duration, help = "Minimum pause between two packets, such as \"500ms\"")]
        min_delay: Option<Duration>,
        #[arg(long, default_value = None, value_parser = humantime::parse_duration, help = "Maximum pause between two packets, such as \"2s\"")]
        max_delay: Option<Duration>,
        #[arg(long, default_value = None, help = "Relative frequency of normal packets")]
        normal_weight: Option<u32>,
        #[arg(long, default_value = None, help = "Relative frequency of attack packets")]
        attack_weight: Option<u32>,
        #[arg(
            long,
            default_value_t = 1,
            help = "Number of independent sources sending concurrently"
        )]
        sources: u32,
    },
    /// Send the same packet several times in a row
    Burst {
        #[arg(value_enum, help = "Class of the repeated feature vector")]
        class: ClassArg,
        #[arg(short = 'n', long, default_value = None, help = "Number of sends [default: 3]")]
        count: Option<u64>,
        #[arg(short, long, default_value = None, value_parser = humantime::parse_duration, help = "Pause between two sends [default: 200ms]")]
        interval: Option<Duration>,
        #[arg(short, long, help = "Seed for random number generation")]
        seed: Option<u64>,
    },
    /// Receive and decode feature packets, and print them as JSON lines
    Listen {
        #[arg(
            short,
            long,
            default_value = "0.0.0.0:3333",
            help = "Local address to listen on"
        )]
        bind: SocketAddr,
        #[arg(short = 'n', long, default_value = None, help = "Stop after that many valid packets")]
        count: Option<u64>,
    },
}
