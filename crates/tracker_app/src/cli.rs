use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

use crate::config::DEFAULT_CONFIG_FILE;

pub fn build_cli() -> Command {
    Command::new("invoice-tracker")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Submit invoices to the processing pipeline and follow them to a result")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to the RON config file")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_CONFIG_FILE)
                .global(true),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Backend base URL (overrides config and TRACKER_BASE_URL)")
                .global(true),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .help("Where log records go")
                .value_parser(["terminal", "file", "both"])
                .default_value("file")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("upload")
                .about("Upload a document and wait for its processed result")
                .arg(
                    Arg::new("file")
                        .help("Invoice file to upload (PDF or image)")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("track")
                .about("Follow an already submitted document until it finishes")
                .arg(
                    Arg::new("doc-id")
                        .help("Document id returned by the upload")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("dashboard")
                .about("Show the live document list and aggregate metrics")
                .arg(
                    Arg::new("refreshes")
                        .long("refreshes")
                        .short('n')
                        .help("Exit after this many successful refreshes")
                        .value_parser(value_parser!(u64).range(1..)),
                ),
        )
}
