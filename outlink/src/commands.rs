use crate::CLAP_STYLING;
use clap::{arg, command};
use outlink::handlers::{parse_mode, parse_threads};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("outlink")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("outlink")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner, progress and non-essential output")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("audit")
                .about(
                    "Crawl every page of a site and report its external links, broken \
                external links (mode 2) or 301 redirects (mode 3).",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The site to crawl, e.g. https://example.com"),
                )
                .arg(
                    arg!(-m --"mode" <MODE>)
                        .required(false)
                        .help(
                            "1 or external: every external link. 2 or broken: links not \
                        answering 200/301. 3 or redirects: links answering 301",
                        )
                        .value_parser(parse_mode)
                        .default_value("1"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async workers in the pool (1-50)")
                        .value_parser(parse_threads)
                        .default_value("5"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("5"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Root directory for saved reports")
                        .default_value("output"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: csv, json")
                        .value_parser(["csv", "json"])
                        .default_value("csv"),
                )
                .arg(
                    arg!(--"no-save")
                        .required(false)
                        .help("Print the table without saving a report file")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
