//! Telesub CLI - extract DVB teletext closed captions into SubRip subtitles.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use console::style;
use tracing::debug;

use telesub::{ExtractOptions, TeletextExtractor};
use telesub_subtitle::{search, srt};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "telesub")]
#[command(version)]
#[command(about = "Extract DVB teletext closed captions from MPEG-TS/M2TS into SubRip subtitles")]
#[command(long_about = "Telesub decodes EBU teletext subtitles carried in an MPEG-2 Transport\n\
    Stream (or BDAV M2TS) file and writes them as UTF-8 SubRip text.\n\n\
    EXAMPLES:\n    \
    telesub -i recording.ts -o subtitles.srt -p 888\n    \
    telesub -i recording.ts -p 888 -c > coloured.srt\n    \
    telesub -i bluray.m2ts -m -t 8192\n    \
    telesub -i recording.ts -s 1400000000")]
struct Args {
    /// Input MPEG-TS or M2TS file ("-" is not supported)
    #[arg(short = 'i', value_name = "PATH")]
    input: PathBuf,

    /// Output file; defaults to standard output
    #[arg(short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Teletext page number (decimal 100..899; 0 = automatic)
    #[arg(short = 'p', value_name = "PAGE", default_value_t = 0)]
    page: u16,

    /// Teletext PID (0 = automatic via PAT/PMT; 8192 = first Private
    /// Stream 1)
    #[arg(short = 't', value_name = "PID", default_value_t = 0)]
    pid: u16,

    /// Subtitle time offset in seconds
    #[arg(
        short = 'f',
        value_name = "SECONDS",
        default_value_t = 0.0,
        allow_negative_numbers = true
    )]
    offset: f64,

    /// Do not write the UTF-8 byte order mark
    #[arg(short = 'n')]
    no_bom: bool,

    /// Write one dummy frame when no frames were decoded
    #[arg(short = '1')]
    dummy_frame: bool,

    /// Emit <font/> colour tags
    #[arg(short = 'c')]
    colours: bool,

    /// Search-engine output mode, with an optional UTC reference in seconds
    #[arg(short = 's', value_name = "REF", num_args = 0..=1, default_missing_value = "0")]
    search: Option<u64>,

    /// Input is BDAV M2TS (192-byte packets)
    #[arg(short = 'm')]
    m2ts: bool,

    /// Verbose diagnostics
    #[arg(short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let exit_ok = matches!(
                e.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                    | ErrorKind::DisplayVersion
            );
            let _ = e.print();
            return if exit_ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            };
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    // Logging goes to stderr; stdout may carry the subtitle document.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    if args.input.as_os_str() == "-" {
        anyhow::bail!("reading from standard input is not supported, pass a file path");
    }

    let mut options = ExtractOptions::new()
        .page(args.page)
        .pid(args.pid)
        .offset_secs(args.offset)
        .colours(args.colours)
        .m2ts(args.m2ts);
    if let Some(utc_reference) = args.search {
        options = options.search_mode(true, utc_reference);
    }

    let file = File::open(&args.input)
        .with_context(|| format!("cannot open input file {}", args.input.display()))?;
    let mut extractor = TeletextExtractor::new(BufReader::new(file), options)?;

    let frames = extractor.run()?;
    let stats = extractor.stats();
    debug!(
        ts_packets = stats.ts_packets,
        sync_losses = stats.sync_losses,
        continuity_errors = stats.continuity_errors,
        hamming_errors = stats.hamming_errors,
        parity_errors = stats.parity_errors,
        "stream diagnostics"
    );

    let mut document = String::new();
    if !args.no_bom {
        document.push_str(srt::UTF8_BOM);
    }
    if args.search.is_some() {
        document.push_str(&search::write(&frames));
    } else {
        document.push_str(&srt::write(&frames));
        if frames.is_empty() && args.dummy_frame {
            document.push_str(&srt::dummy_entry());
        }
    }

    match args.output.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            let mut file = File::create(path)
                .with_context(|| format!("cannot create output file {}", path.display()))?;
            file.write_all(document.as_bytes())
                .with_context(|| format!("cannot write output file {}", path.display()))?;
        }
        _ => {
            io::stdout()
                .write_all(document.as_bytes())
                .context("cannot write to standard output")?;
        }
    }

    eprintln!(
        "- Done ({} teletext packets processed, {} frames produced)",
        stats.teletext_packets, stats.frames
    );
    if frames.is_empty() {
        eprintln!("No frames produced. CC teletext page number was probably wrong.");
        let pages = extractor.subtitle_pages();
        if !pages.is_empty() {
            let list = pages
                .iter()
                .map(|page| format!("{page:03x}"))
                .collect::<Vec<_>>()
                .join(" ");
            eprintln!("- There were some CC data carried via pages: {list}");
        }
    }

    Ok(())
}
