use anyhow::Result;
use clap::{ArgGroup, Parser};
use dblp_orcid::download::{self, DblpFiles};
use dblp_orcid::export::{self, Destination};
use dblp_orcid::ingest::build_graph;
use dblp_orcid::merge::merge;
use dblp_orcid::models::GroupBy;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "dblp-orcid")]
#[command(about = "Extract an alias <-> ORCID table from the DBLP XML dump")]
#[command(group(ArgGroup::new("destination").required(true).args(["out", "csv"])))]
#[command(group(ArgGroup::new("grouping").required(true).args(["orcid", "alias"])))]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the table to stdout, useful for redirecting output
    #[arg(long)]
    out: bool,

    /// Save the table to by_orcid.csv / by_alias.csv
    #[arg(long)]
    csv: bool,

    /// Group by ORCID and list all aliases of each ORCID
    #[arg(long)]
    orcid: bool,

    /// Group by alias and list all ORCIDs of each alias
    #[arg(long)]
    alias: bool,

    /// Use existing local files instead of downloading the DBLP dump
    #[arg(long)]
    no_download: bool,

    /// Path to the gzip-compressed dump (defaults to dblp.xml.gz in the working directory)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Path to the DTD (defaults to dblp.dtd next to the dump)
    #[arg(long)]
    dtd: Option<PathBuf>,

    /// Directory for the CSV file written with --csv
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

fn run(cli: Cli) -> Result<()> {
    let group_by = if cli.orcid { GroupBy::Orcid } else { GroupBy::Alias };
    let destination = if cli.csv {
        export::file_destination(&cli.output_dir, group_by)
    } else {
        Destination::Stdout
    };

    let downloaded = if cli.no_download {
        None
    } else {
        eprintln!("Downloading DBLP XML files...");
        Some(download::download_dblp(Path::new("."))?)
    };

    let defaults = DblpFiles::in_dir(Path::new("."));
    let xml_path = cli
        .input
        .clone()
        .or_else(|| downloaded.as_ref().map(|f| f.xml.clone()))
        .unwrap_or(defaults.xml);
    let dtd_path = cli
        .dtd
        .clone()
        .or_else(|| downloaded.as_ref().map(|f| f.dtd.clone()))
        .unwrap_or_else(|| xml_path.with_file_name(dblp_orcid::config::DBLP_DTD_FILENAME));

    eprintln!("Started parsing...");
    let start = Instant::now();
    let (mut graph, stats) = build_graph(&xml_path, Some(dtd_path.as_path()))?;
    let parse_duration = start.elapsed();

    let records = merge(&mut graph, group_by);
    let record_count = records.len();
    export::export(records, group_by, &destination)?;
    eprintln!("Finished parsing!");

    if let Some(files) = downloaded {
        files.remove()?;
    }

    if let Destination::File(path) = &destination {
        eprintln!("Parsed info saved to: {}", path.display());
    }

    let (aliases, orcids, attribute_records) = graph.stats();
    eprintln!();
    eprintln!("=== Summary ===");
    eprintln!("Parse time:         {:.2}s", parse_duration.as_secs_f64());
    eprintln!("XML nodes:          {}", stats.elements());
    eprintln!("Authors with ORCID: {}", stats.authors_with_orcid);
    eprintln!("Person records:     {}", stats.homepage_records);
    eprintln!("Aliases:            {}", aliases);
    eprintln!("ORCIDs:             {}", orcids);
    eprintln!("Attribute records:  {}", attribute_records);
    eprintln!("Rows written:       {}", record_count);

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    match run(cli) {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
