use crate::{ConvertOptions, PlistJsonConverter, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::path::PathBuf;
use tracing::Level;

pub struct Cli;

impl Cli {
    pub fn build_command() -> Command {
        Command::new("plistsync")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Converts a property list to JSON and back")
            .long_about("Converts between an Apple property list and an editable JSON file.\n\nWith '--init' the plist is read and the JSON file is (over)written. Without it the JSON file is read and the existing plist is rewritten from it.")
            .arg(
                Arg::new("init")
                    .short('i')
                    .long("init")
                    .help("initialize json")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("lenient")
                    .long("lenient")
                    .help("Read unknown tags as strings and drop values that have no key")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Log more detail to stderr (repeat for more)")
                    .action(ArgAction::Count),
            )
            .arg(
                Arg::new("plist")
                    .help("path to plist")
                    .required(true)
                    .value_parser(value_parser!(PathBuf))
                    .index(1),
            )
            .arg(
                Arg::new("json")
                    .help("path to parsed json file")
                    .required(true)
                    .value_parser(value_parser!(PathBuf))
                    .index(2),
            )
    }

    /// Log level selected by the number of `-v` flags
    pub fn log_level(matches: &ArgMatches) -> Level {
        match matches.get_count("verbose") {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    pub fn run_with_matches(matches: ArgMatches) -> Result<()> {
        let plist_path = matches
            .get_one::<PathBuf>("plist")
            .expect("plist is a required argument");
        let json_path = matches
            .get_one::<PathBuf>("json")
            .expect("json is a required argument");

        let options = if matches.get_flag("lenient") {
            ConvertOptions::lenient()
        } else {
            ConvertOptions::default()
        };

        if matches.get_flag("init") {
            PlistJsonConverter::init(plist_path, json_path, &options)
        } else {
            PlistJsonConverter::sync(plist_path, json_path)
        }
    }
}

// test
