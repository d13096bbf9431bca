//! Proofdiff - compare two renditions of the same book
//!
//! Normalizes a plain-text and an HTML rendition into flat text where
//! only meaningful differences remain, ready for an external word-diff.
//!
//! Usage: proofdiff [OPTIONS] FILE1 FILE2

use std::env;
use std::fs;
use std::process::ExitCode;

use log::warn;

use proofdiff_pipeline::{
    process_file, process_pair, Options, ProcessedFile, SmallCapsStyle, TxtCleanupType,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What the command line asked for
enum Command {
    Help,
    Version,
    /// Process one HTML file and print the lowered text (debug aid)
    SimpleHtml { file: String, opts: Options },
    /// Normalize both sides and print the paired streams
    Compare {
        left: String,
        right: String,
        opts: Options,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args: Vec<String> = env::args().collect();

    let command = match parse_args(&args[1..]) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("Error: {}", message);
            print_usage(&args[0]);
            return ExitCode::FAILURE;
        }
    };

    match command {
        Command::Help => {
            print_usage(&args[0]);
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("proofdiff {}", VERSION);
            ExitCode::SUCCESS
        }
        Command::SimpleHtml { file, opts } => run_simple_html(&file, &opts),
        Command::Compare { left, right, opts } => run_compare(&left, &right, &opts),
    }
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut opts = Options::default();
    let mut files: Vec<String> = Vec::new();
    let mut simple_html = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value_for = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} requires a value", flag))
        };

        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--ignore-case" => opts.ignore_case = true,
            "--extract-footnotes" => opts.extract_footnotes = true,
            "--suppress-footnote-tags" => opts.suppress_footnote_tags = true,
            "--suppress-illustration-tags" => opts.suppress_illustration_tags = true,
            "--suppress-sidenote-tags" => opts.suppress_sidenote_tags = true,
            "--ignore-format" => opts.ignore_format = true,
            "--suppress-proofers-notes" => opts.suppress_proofers_notes = true,
            "--regroup-split-words" => opts.regroup_split_words = true,
            "--txt-cleanup-type" => {
                let value = value_for("--txt-cleanup-type")?;
                opts.txt_cleanup_type = TxtCleanupType::from_flag(&value)
                    .ok_or_else(|| format!("invalid cleanup type '{}', expected b, n or p", value))?;
            }
            "--css-add-illustration" => opts.css_add_illustration = true,
            "--css-add-sidenote" => opts.css_add_sidenote = true,
            "--css-smcap" => {
                let value = value_for("--css-smcap")?;
                opts.css_smcap = Some(
                    SmallCapsStyle::from_flag(&value)
                        .ok_or_else(|| format!("invalid smcap style '{}', expected U, L or T", value))?,
                );
            }
            "--css-bold" => opts.css_bold = Some(value_for("--css-bold")?),
            "--css" => opts.css.push(value_for("--css")?),
            "--css-no-default" => opts.css_no_default = true,
            "--suppress-nbsp-num" => opts.suppress_nbsp_num = true,
            "--ignore-0-space" => opts.ignore_0_space = true,
            "--css-greek-title-plus" => opts.css_greek_title_plus = true,
            "--simple-html" => simple_html = true,
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {}", other));
            }
            _ => files.push(arg.clone()),
        }
    }

    if simple_html {
        let file = files.first().cloned().ok_or("--simple-html needs an input file")?;
        return Ok(Command::SimpleHtml { file, opts });
    }

    match files.len() {
        2 => {
            let mut files = files.into_iter();
            Ok(Command::Compare {
                left: files.next().expect("two files"),
                right: files.next().expect("two files"),
                opts,
            })
        }
        n => Err(format!("expected 2 input files, got {}", n)),
    }
}

fn print_usage(program: &str) {
    println!(
        r#"proofdiff {} - compare two renditions of the same book

USAGE:
    {} [OPTIONS] FILE1 FILE2

Input files may be .txt, .htm, .html or .xhtml. Text files whose name
starts with "projectID" are treated as proofing-round output.

OPTIONS:
    -h, --help                    Print this help message
    -V, --version                 Print version information
    --ignore-case                 Ignore case when comparing
    --extract-footnotes           Extract footnotes into a separate stream
    --suppress-footnote-tags      TXT: suppress "[Footnote ?:" marks
    --suppress-illustration-tags  TXT: suppress "[Illustration:" marks
    --suppress-sidenote-tags      TXT: suppress "[Sidenote:" marks
    --ignore-format               Silence formatting differences
    --suppress-proofers-notes     Rounds: remove [**proofreaders notes]
    --regroup-split-words         Rounds: regroup split wo-* *rds
    --txt-cleanup-type TYPE       Rounds cleanup: (b)est effort, (n)one, (p)roofers
    --css-add-illustration        HTML: add [Illustration: ] tags
    --css-add-sidenote            HTML: add [Sidenote: ] tags
    --css-smcap STYLE             HTML: small caps to (U)pper, (L)ower or (T)itle case
    --css-bold STR                HTML: surround bold text with STR instead of "="
    --css CSS                     HTML: extra transformation CSS (repeatable)
    --css-no-default              HTML: skip the default transformation CSS
    --suppress-nbsp-num           Remove no-break spaces between digits
    --ignore-0-space              HTML: remove zero-width spaces
    --css-greek-title-plus        HTML: replace Greek with its title transliteration
    --simple-html                 Process one HTML file and print the text (debug)
"#,
        VERSION, program
    );
}

fn read_lossy(path: &str) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|err| format!("cannot load file {}: {}", path, err))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn report_warnings(file: &ProcessedFile) {
    for warning in &file.warnings {
        warn!("{}: {}", file.name, warning);
    }
}

/// Debug mode: lower one HTML file and print the result
fn run_simple_html(file: &str, opts: &Options) -> ExitCode {
    let lower = file.to_ascii_lowercase();
    if !lower.ends_with(".html") && !lower.ends_with(".htm") && !lower.ends_with(".xhtml") {
        eprintln!("Error: not an html file");
        return ExitCode::FAILURE;
    }

    let contents = match read_lossy(file) {
        Ok(contents) => contents,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    match process_file(file, &contents, opts) {
        Ok(processed) => {
            report_warnings(&processed);
            println!("{}", processed.text);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// Normalize both sides and print the paired streams, main text first,
/// footnotes after a sentinel line.
fn run_compare(left: &str, right: &str, opts: &Options) -> ExitCode {
    let left_contents = match read_lossy(left) {
        Ok(contents) => contents,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::FAILURE;
        }
    };
    let right_contents = match read_lossy(right) {
        Ok(contents) => contents,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    match process_pair(left, &left_contents, right, &right_contents, opts) {
        Ok((left, right)) => {
            report_warnings(&left);
            report_warnings(&right);
            print_processed(&left);
            print_processed(&right);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn print_processed(file: &ProcessedFile) {
    println!("===== {} =====", file.name);
    println!("{}", file.text);
    if !file.footnotes.is_empty() {
        println!("===== {} [footnotes] =====", file.name);
        println!("{}", file.footnotes);
    }
}
