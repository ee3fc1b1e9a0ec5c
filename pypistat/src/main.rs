//! # pypistat
//!
//! A CLI for PyPI download statistics: composes queries against the public
//! download-stats dataset and renders saved query results as tables.
//!
//! ## Overview
//!
//! pypistat is built on top of pypistatlib. The network call to the query
//! service stays outside this tool: `query` prints the SQL to run with your
//! own client, and `render` consumes the saved JSON result.
//!
//! ## Usage
//!
//! ```bash
//! # Compose the SQL for a query
//! pypistat query cryptography pyversion --days 7
//!
//! # Bucket by several fields over an absolute window
//! pypistat query cryptography distro system --start-date 2018-05-01 --end-date 2018-05-31
//!
//! # Render a saved result with share and total rows
//! pypistat render result.json --percent --total
//!
//! # Markdown table, or structured output
//! pypistat render result.json --markdown
//! pypistat render result.json --output json
//! ```

use std::process::ExitCode;

use anyhow::anyhow;
use clap::{Arg, ArgAction, ArgMatches, Command};
use console::Style;
use pypistatlib::{human_bytes, load_json_from_file, tabulate, Field, QueryBuilder, QueryInfo};
use serde_json::json;

/// Build the clap Command structure
fn build_command() -> Command {
    Command::new("pypistat")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Arthur Debert")
        .about("PyPI download statistics: query composition and report rendering")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("render")
                .about("Render a saved query result as a table")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .help("Path to a saved query-result JSON file"),
                )
                .arg(
                    Arg::new("percent")
                        .short('p')
                        .long("percent")
                        .action(ArgAction::SetTrue)
                        .help("Add a percent column with each row's share of downloads"),
                )
                .arg(
                    Arg::new("total")
                        .short('t')
                        .long("total")
                        .action(ArgAction::SetTrue)
                        .help("Append a Total row"),
                )
                .arg(
                    Arg::new("markdown")
                        .short('m')
                        .long("markdown")
                        .action(ArgAction::SetTrue)
                        .help("Emit markdown alignment markers in the separator row"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_parser(["table", "json"])
                        .default_value("table")
                        .help("Output format"),
                ),
        )
        .subcommand(
            Command::new("query")
                .about("Compose the SQL for a download-count query")
                .arg(
                    Arg::new("project")
                        .required(true)
                        .help("Package name (normalized the way the index does)"),
                )
                .arg(
                    Arg::new("field")
                        .action(ArgAction::Append)
                        .help("Fields to bucket downloads by (pyversion, system, distro, country, ...)"),
                )
                .arg(
                    Arg::new("start-date")
                        .long("start-date")
                        .conflicts_with("days")
                        .help("Window start: negative day offset or YYYY-MM-DD"),
                )
                .arg(
                    Arg::new("end-date")
                        .long("end-date")
                        .conflicts_with("days")
                        .help("Window end: negative day offset or YYYY-MM-DD"),
                )
                .arg(
                    Arg::new("days")
                        .short('d')
                        .long("days")
                        .value_parser(clap::value_parser!(u32))
                        .help("Shorthand for the N full days ending yesterday"),
                )
                .arg(
                    Arg::new("limit")
                        .short('l')
                        .long("limit")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("10")
                        .help("Maximum number of result rows"),
                )
                .arg(
                    Arg::new("all-installers")
                        .long("all-installers")
                        .action(ArgAction::SetTrue)
                        .help("Count downloads from every installer, not just pip"),
                ),
        )
}

/// Handler for the render command
fn render_handler(matches: &ArgMatches) -> anyhow::Result<()> {
    let file = matches
        .get_one::<String>("file")
        .map(String::as_str)
        .unwrap_or_default();

    let (info, mut table) = load_json_from_file(file)?;

    if matches.get_flag("percent") {
        table = table.add_percentages()?;
    }
    if matches.get_flag("total") {
        table = table.add_download_total()?;
    }

    match matches.get_one::<String>("output").map(String::as_str) {
        Some("json") => {
            let doc = json!({
                "query_info": info,
                "header": table.header,
                "rows": table.rows,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        _ => {
            print!("{}", tabulate(&table, matches.get_flag("markdown")));
            print_query_info(&info);
        }
    }

    Ok(())
}

/// Billing footer, on stderr so piped table output stays clean
fn print_query_info(info: &QueryInfo) {
    let dim = Style::new().dim();
    eprintln!();
    eprintln!("{}", dim.apply_to(format!("Served from cache: {}", info.cached)));
    eprintln!(
        "{}",
        dim.apply_to(format!(
            "Data processed: {}",
            human_bytes(info.bytes_processed)
        ))
    );
    eprintln!(
        "{}",
        dim.apply_to(format!("Data billed: {}", human_bytes(info.bytes_billed)))
    );
    eprintln!(
        "{}",
        dim.apply_to(format!("Estimated cost: ${}", info.estimated_cost))
    );
}

/// Handler for the query command
fn query_handler(matches: &ArgMatches) -> anyhow::Result<()> {
    let project = matches
        .get_one::<String>("project")
        .map(String::as_str)
        .unwrap_or_default();

    let mut builder = QueryBuilder::new().project(project);

    if let Some(fields) = matches.get_many::<String>("field") {
        for token in fields {
            let field = token.parse::<Field>().map_err(|message| anyhow!(message))?;
            builder = builder.field(field);
        }
    }

    if let Some(days) = matches.get_one::<u32>("days") {
        builder = builder.start_date(&format!("-{}", days + 1)).end_date("-1");
    }
    if let Some(start) = matches.get_one::<String>("start-date") {
        builder = builder.start_date(start);
    }
    if let Some(end) = matches.get_one::<String>("end-date") {
        builder = builder.end_date(end);
    }
    if let Some(limit) = matches.get_one::<u32>("limit") {
        builder = builder.limit(*limit);
    }
    if matches.get_flag("all-installers") {
        builder = builder.all_installers();
    }

    println!("{}", builder.build()?);
    Ok(())
}

fn main() -> ExitCode {
    let matches = build_command().get_matches();

    let result = match matches.subcommand() {
        Some(("render", sub)) => render_handler(sub),
        Some(("query", sub)) => query_handler(sub),
        _ => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let red = Style::new().red().bold();
            eprintln!("{} {:#}", red.apply_to("Error:"), err);
            ExitCode::FAILURE
        }
    }
}
