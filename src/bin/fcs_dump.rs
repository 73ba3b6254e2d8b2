use anyhow::{Context, Result, bail, format_err};
use clap::{Arg, ArgAction, ArgMatches, Command};
use dialoguer::Confirm;
use indoc::indoc;

use fcs::output::{self, OutputSettings};
use fcs::{ColumnOrder, FcsDataset, FcsParser, ParserSettings};
use log::{Level, LevelFilter};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

#[derive(Copy, Clone, PartialEq, Eq)]
pub enum FcsOutputFormat {
    Csv,
    Jsonl,
}

struct FcsDump {
    parser_settings: ParserSettings,
    output_settings: OutputSettings,
    input: PathBuf,
    output_format: FcsOutputFormat,
    output_target: Option<PathBuf>,
    confirm_overwrite: bool,
    metadata_only: bool,
    write_files: bool,
    verbosity_level: Option<Level>,
}

impl FcsDump {
    pub fn from_cli_matches(matches: &ArgMatches) -> Result<Self> {
        let input = PathBuf::from(
            matches
                .get_one::<String>("INPUT")
                .ok_or_else(|| format_err!("missing INPUT"))?,
        );

        let output_format = match matches.get_one::<String>("output-format").map(String::as_str) {
            Some("jsonl") => FcsOutputFormat::Jsonl,
            _ => FcsOutputFormat::Csv,
        };

        let column_order = match matches.get_one::<String>("column-order").map(String::as_str) {
            Some("index") => ColumnOrder::Index,
            _ => ColumnOrder::Alphabetical,
        };

        let delimiter = matches
            .get_one::<String>("delimiter")
            .cloned()
            .unwrap_or_else(|| ",".to_owned());

        let num_threads = matches.get_one::<usize>("num-threads").copied().unwrap_or(0);
        let num_threads = match (cfg!(feature = "multithreading"), num_threads) {
            (true, number) => number,
            (false, 1) => 1,
            (false, _) => {
                eprintln!(
                    "turned on threads, but library was compiled without `multithreading` feature! using fallback sync decoding"
                );
                1
            }
        };

        let verbosity_level = match matches.get_count("verbose") {
            0 => None,
            1 => Some(Level::Info),
            2 => Some(Level::Debug),
            3 => Some(Level::Trace),
            _ => {
                eprintln!("using more than  -vvv does not affect verbosity level");
                Some(Level::Trace)
            }
        };

        let write_files = matches.get_flag("write-files");
        if write_files && input.as_os_str() == "-" {
            bail!("`--write-files` needs an input path, not stdin");
        }

        Ok(FcsDump {
            parser_settings: ParserSettings::new().num_threads(num_threads),
            output_settings: OutputSettings::new()
                .delimiter(delimiter)
                .header_row(!matches.get_flag("no-header"))
                .column_order(column_order),
            input,
            output_format,
            output_target: matches.get_one::<String>("output-target").map(PathBuf::from),
            confirm_overwrite: !matches.get_flag("no-confirm-overwrite"),
            metadata_only: matches.get_flag("metadata"),
            write_files,
            verbosity_level,
        })
    }

    /// Main entry point for `FcsDump`
    pub fn run(&self) -> Result<()> {
        self.try_to_initialize_logging();

        let parser = if self.input.as_os_str() == "-" {
            FcsParser::from_reader(io::stdin().lock()).context("Failed to read FCS data from stdin")?
        } else {
            FcsParser::from_path(&self.input)
                .with_context(|| format!("Failed to open file {}", self.input.display()))?
        };

        let dataset = parser
            .with_configuration(self.parser_settings.clone())
            .parse()
            .with_context(|| format!("Failed to parse {}", self.input.display()))?;

        if self.write_files {
            let (meta, data) =
                output::write_metadata_and_data(&self.input, &dataset, &self.output_settings)?;
            eprintln!("Wrote {} and {}", meta.display(), data.display());
            return Ok(());
        }

        let target: Box<dyn Write> = match &self.output_target {
            Some(path) => Box::new(BufWriter::new(
                Self::create_output_file(path, self.confirm_overwrite).with_context(|| {
                    format!("An error occurred while creating output file at `{}`", path.display())
                })?,
            )),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };

        self.dump(target, &dataset)
    }

    fn dump(&self, mut target: impl Write, dataset: &FcsDataset) -> Result<()> {
        if self.metadata_only {
            target.write_all(output::metadata_string(&dataset.keywords).as_bytes())?;
            target.flush()?;
            return Ok(());
        }

        match self.output_format {
            FcsOutputFormat::Csv => {
                output::write_events_delimited(target, &dataset.events, &self.output_settings)?
            }
            FcsOutputFormat::Jsonl => output::write_events_jsonl(
                target,
                &dataset.events,
                self.output_settings.get_column_order(),
            )?,
        }

        Ok(())
    }

    /// If `prompt` is passed, will display a confirmation prompt before overwriting files.
    fn create_output_file(path: impl AsRef<Path>, prompt: bool) -> Result<File> {
        let p = path.as_ref();

        if p.is_dir() {
            bail!(
                "There is a directory at {}, refusing to overwrite",
                p.display()
            );
        }

        if p.exists() {
            if prompt {
                match Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to override output file at {}",
                        p.display()
                    ))
                    .default(false)
                    .interact()
                {
                    Ok(true) => Ok(File::create(p)?),
                    Ok(false) => bail!("Cancelled"),
                    Err(e) => bail!(
                        "Failed to write confirmation prompt to term caused by\n{}",
                        e
                    ),
                }
            } else {
                Ok(File::create(p)?)
            }
        } else {
            // Ok to assume p is not an existing directory
            match p.parent() {
                Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
                    fs::create_dir_all(parent)?;
                    Ok(File::create(p)?)
                }
                Some(_) => Ok(File::create(p)?),
                None => bail!("Output file cannot be root."),
            }
        }
    }

    fn try_to_initialize_logging(&self) {
        if let Some(level) = self.verbosity_level {
            if let Err(e) = simplelog::TermLogger::init(
                level.to_level_filter(),
                simplelog::Config::default(),
                simplelog::TerminalMode::Stderr,
                simplelog::ColorChoice::Auto,
            ) {
                eprintln!("Failed to initialize logging: {e:?}");
            }
        } else {
            log::set_max_level(LevelFilter::Off);
        }
    }
}

fn command() -> Command {
    Command::new("FCS Parser")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility to decode FCS 3.0/3.1 flow cytometry files")
        .arg(
            Arg::new("INPUT")
                .required(true)
                .help("FCS file to decode, or `-` to read from stdin."),
        )
        .arg(
            Arg::new("num-threads")
                .short('t')
                .long("threads")
                .default_value("0")
                .value_parser(clap::value_parser!(usize))
                .help("Sets the number of worker threads, defaults to number of CPU cores."),
        )
        .arg(
            Arg::new("output-format")
                .short('o')
                .long("format")
                .value_parser(["csv", "jsonl"])
                .default_value("csv")
                .help("Sets the output format")
                .long_help(indoc!(
                    r#"
                    Sets the output format:
                        "csv"   - one delimited row per event, with a header row of parameter names.
                        "jsonl" - one JSON object per event, mapping parameter names to values.
                    "#
                )),
        )
        .arg(
            Arg::new("output-target")
                .long("output")
                .short('f')
                .value_name("PATH")
                .help(indoc!(
                    "Writes output to the file specified instead of stdout, errors will still be printed to stderr.
                     Will ask for confirmation before overwriting files, to allow overwriting, pass `--no-confirm-overwrite`
                     Will create parent directories if needed."
                )),
        )
        .arg(
            Arg::new("no-confirm-overwrite")
                .long("no-confirm-overwrite")
                .action(ArgAction::SetTrue)
                .help("When set, will not ask for confirmation before overwriting files, useful for automation"),
        )
        .arg(
            Arg::new("delimiter")
                .short('d')
                .long("delimiter")
                .default_value(",")
                .help("Column delimiter for csv output."),
        )
        .arg(
            Arg::new("no-header")
                .long("no-header")
                .action(ArgAction::SetTrue)
                .help("When set, csv output will not start with a row of parameter names."),
        )
        .arg(
            Arg::new("column-order")
                .long("column-order")
                .value_parser(["alphabetical", "index"])
                .default_value("alphabetical")
                .help("Order parameters by name, or by their `$Pn` index (the order of the DATA segment)."),
        )
        .arg(
            Arg::new("metadata")
                .short('m')
                .long("metadata")
                .action(ArgAction::SetTrue)
                .help("Print the TEXT keywords (`KEY => value`, sorted) instead of the events."),
        )
        .arg(
            Arg::new("write-files")
                .short('w')
                .long("write-files")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["output-target", "metadata"])
                .help("Write `<INPUT>.meta.txt` and `<INPUT>.data.csv` next to the input file."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("-v - info, -vv - debug, -vvv - trace. trace output is only available in debug builds, as it is extremely verbose"),
        )
}

fn main() {
    let matches = command().get_matches();

    let result = FcsDump::from_cli_matches(&matches).and_then(|app| app.run());

    if let Err(e) = result {
        eprintln!("{e:?}");
        exit(1);
    }
}
