// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Nbtrail CLI entrypoint.
//!
//! Prints read-only views of a persisted history file. Logging goes to stderr and follows
//! `RUST_LOG`.

use std::error::Error;

use nbtrail::checkpoint::timeline::{format_date, format_time};
use nbtrail::format::json::history_schema;
use nbtrail::query::{cell_summaries, search, SearchMode};
use nbtrail::render::{diff_previous, DiffKind};
use nbtrail::{History, HistoryConfig, HistoryFile, NodeName};
use tracing_subscriber::EnvFilter;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} <history.json> [--checkpoints]\n  {program} <history.json> --cells\n  {program} <history.json> --timeline\n  {program} <history.json> --diff <node-name>\n  {program} <history.json> --search <needle> [--regex | --fuzzy]\n  {program} --schema\n\nWith no view flag the checkpoint log is printed.\n--schema prints the JSON Schema of the history file format."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
enum View {
    #[default]
    Checkpoints,
    Cells,
    Timeline,
    Diff(String),
    Search(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    schema: bool,
    history_file: Option<String>,
    view: Option<View>,
    mode: Option<SearchMode>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--schema" => {
                if options.schema {
                    return Err(());
                }
                options.schema = true;
            }
            "--checkpoints" => set_view(&mut options, View::Checkpoints)?,
            "--cells" => set_view(&mut options, View::Cells)?,
            "--timeline" => set_view(&mut options, View::Timeline)?,
            "--diff" => {
                let name = args.next().ok_or(())?;
                set_view(&mut options, View::Diff(name))?;
            }
            "--search" => {
                let needle = args.next().ok_or(())?;
                set_view(&mut options, View::Search(needle))?;
            }
            "--regex" | "--fuzzy" => {
                if options.mode.is_some() {
                    return Err(());
                }
                options.mode =
                    Some(if arg == "--regex" { SearchMode::Regex } else { SearchMode::Fuzzy });
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.history_file.is_some() {
                    return Err(());
                }
                options.history_file = Some(arg);
            }
        }
    }

    if options.schema && (options.history_file.is_some() || options.view.is_some()) {
        return Err(());
    }
    if !options.schema && options.history_file.is_none() {
        return Err(());
    }
    if options.mode.is_some() && !matches!(options.view, Some(View::Search(_))) {
        return Err(());
    }

    Ok(options)
}

fn set_view(options: &mut CliOptions, view: View) -> Result<(), ()> {
    if options.view.is_some() {
        return Err(());
    }
    options.view = Some(view);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn print_checkpoints(history: &History) {
    let offset = history.config().utc_offset();
    for checkpoint in history.checkpoints().all() {
        println!(
            "#{} {} (notebook {}) at {}",
            checkpoint.id(),
            checkpoint.kind(),
            checkpoint.notebook(),
            format_time(checkpoint.timestamp(), offset)
        );
        for item in checkpoint.target_cells() {
            let mut line = format!("  {} {}", item.node, item.change_type);
            if !item.new_output().is_empty() {
                let outputs = item.new_output().iter().map(NodeName::to_string).collect::<Vec<_>>();
                line.push_str(&format!(" -> {}", outputs.join(", ")));
            }
            if let Some(index) = item.index {
                line.push_str(&format!(" @{index}"));
            }
            println!("{line}");
        }
    }
}

fn print_cells(history: &History) -> Result<(), Box<dyn Error>> {
    let summaries = cell_summaries(history)?;
    for cell in &summaries.cells {
        println!("[{}] {} {} ({} versions)", cell.index, cell.label, cell.name, cell.versions);
        for line in cell.sample.lines() {
            println!("    {line}");
        }
    }
    println!("{} deleted", summaries.deleted);
    Ok(())
}

fn print_timeline(history: &History) {
    let offset = history.config().utc_offset();
    let now = chrono::Utc::now().timestamp_millis();
    for date in history.timeline().dates() {
        println!("{}", format_date(date.date, now, offset));
        for group in &date.events {
            let ids = group.events.iter().map(|id| format!("#{id}")).collect::<Vec<_>>();
            println!("  notebook {}: {}", group.notebook, ids.join(" "));
        }
    }
}

fn print_diff(history: &History, raw: &str) -> Result<(), Box<dyn Error>> {
    let name = NodeName::parse(raw)?;
    let diff = diff_previous(history, &name)?.condensed(history.config().diff_context);
    match diff.older {
        Some(older) => println!("{older} -> {}", diff.newer),
        None => println!("(new) -> {}", diff.newer),
    }
    for line in &diff.lines {
        let marker = match line.kind {
            DiffKind::Same => ' ',
            DiffKind::Added => '+',
            DiffKind::Removed => '-',
            DiffKind::Elided => '~',
        };
        println!("{marker} {}", line.text);
    }
    Ok(())
}

fn print_search(history: &History, needle: &str, mode: SearchMode) -> Result<(), Box<dyn Error>> {
    for hit in search(history, needle, mode)? {
        println!("{}:{} {}", hit.name, hit.line + 1, hit.excerpt);
    }
    Ok(())
}

fn main() {
    init_tracing();

    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "nbtrail".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        if options.schema {
            println!("{}", serde_json::to_string_pretty(&history_schema())?);
            return Ok(());
        }

        let path = options.history_file.unwrap_or_default();
        let history = HistoryFile::new(path).load(HistoryConfig::from_env())?;

        match options.view.unwrap_or_default() {
            View::Checkpoints => print_checkpoints(&history),
            View::Cells => print_cells(&history)?,
            View::Timeline => print_timeline(&history),
            View::Diff(name) => print_diff(&history, &name)?,
            View::Search(needle) => print_search(&history, &needle, options.mode.unwrap_or_default())?,
        }
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("nbtrail: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use nbtrail::query::SearchMode;

    use super::{parse_options, CliOptions, View};

    fn parse(args: &[&str]) -> Result<CliOptions, ()> {
        parse_options(args.iter().map(|arg| (*arg).to_owned()))
    }

    #[test]
    fn history_file_alone_shows_checkpoints() {
        let options = parse(&["history.json"]).expect("parse options");
        assert_eq!(options.history_file.as_deref(), Some("history.json"));
        assert_eq!(options.view, None);
        assert!(!options.schema);
    }

    #[test]
    fn parses_views_with_values() {
        let options = parse(&["--diff", "cell0.1", "h.json"]).expect("parse options");
        assert_eq!(options.view, Some(View::Diff("cell0.1".to_owned())));

        let options = parse(&["h.json", "--search", "read_csv", "--fuzzy"]).expect("parse options");
        assert_eq!(options.view, Some(View::Search("read_csv".to_owned())));
        assert_eq!(options.mode, Some(SearchMode::Fuzzy));
    }

    #[test]
    fn schema_stands_alone() {
        assert!(parse(&["--schema"]).expect("parse options").schema);
        parse(&["--schema", "h.json"]).unwrap_err();
    }

    #[test]
    fn rejects_bad_combinations() {
        parse(&[]).unwrap_err();
        parse(&["h.json", "--cells", "--timeline"]).unwrap_err();
        parse(&["h.json", "--regex"]).unwrap_err();
        parse(&["h.json", "--diff"]).unwrap_err();
        parse(&["a.json", "b.json"]).unwrap_err();
        parse(&["h.json", "--nope"]).unwrap_err();
    }
}
