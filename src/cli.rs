//! CLI argument parsing for the keyword extraction pipeline.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "cfgkw",
    version,
    about = "Keyword schema extraction for OpenRadioss/LS-DYNA CFG files",
    after_help = "Examples:\n  cfgkw scan --cfg-root CFG --out keywords.json\n  cfgkw hierarchy --root CFG --out mapping.json\n  cfgkw hierarchy-report --mapping mapping.json\n  cfgkw merge --dynamic keywords.json --clean keywords_clean.json --out unified.json\n  cfgkw filter --unified unified.json --clean keywords_clean.json --out filtered.json\n  cfgkw query --cfg-root CFG --search mat_elastic",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Tool config JSON (defaults are used when omitted)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug detail to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Scan(ScanArgs),
    Parse(ParseArgs),
    Hierarchy(HierarchyArgs),
    HierarchyReport(HierarchyReportArgs),
    Merge(MergeArgs),
    Filter(FilterArgs),
    Query(QueryArgs),
    /// Print the default tool config as JSON
    Config,
}

#[derive(Parser, Debug)]
#[command(about = "Scan a CFG tree and write the flat keyword list")]
pub struct ScanArgs {
    /// Root directory whose subdirectories hold CFG files
    #[arg(long, value_name = "DIR")]
    pub cfg_root: PathBuf,

    /// Output path for the flat keyword list
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,

    /// Output path for the full keyword schemas
    #[arg(long, value_name = "PATH")]
    pub schema_out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Parse one CFG file and print its keyword schemas")]
pub struct ParseArgs {
    /// CFG file to parse
    pub file: PathBuf,

    /// Write the schemas here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Map keyword aliases to CFG files from hierarchy files")]
pub struct HierarchyArgs {
    /// Directory searched for hierarchy files
    #[arg(long, value_name = "DIR")]
    pub root: PathBuf,

    /// Output path for the alias mapping
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Render a text report of an alias mapping")]
pub struct HierarchyReportArgs {
    /// Alias mapping written by `cfgkw hierarchy`
    #[arg(long, value_name = "PATH")]
    pub mapping: PathBuf,

    /// Write the report here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Merge a scanned keyword list with a documented corpus")]
pub struct MergeArgs {
    /// Broad keyword list (e.g. `cfgkw scan` output)
    #[arg(long, value_name = "PATH")]
    pub dynamic: PathBuf,

    /// Documented keyword list
    #[arg(long, value_name = "PATH")]
    pub clean: PathBuf,

    /// Syntax example corpus
    #[arg(long, value_name = "PATH")]
    pub syntax: Option<PathBuf>,

    /// Output path for the merged document
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Keep only merged keywords named by the documented corpus")]
pub struct FilterArgs {
    /// Merged document written by `cfgkw merge`
    #[arg(long, value_name = "PATH")]
    pub unified: PathBuf,

    /// Documented keyword list
    #[arg(long, value_name = "PATH")]
    pub clean: PathBuf,

    /// Output path for the filtered document
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Query the keyword database built from a CFG tree")]
pub struct QueryArgs {
    /// Root directory whose subdirectories hold CFG files
    #[arg(long, value_name = "DIR")]
    pub cfg_root: PathBuf,

    #[command(flatten)]
    pub action: QueryAction,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct QueryAction {
    /// Count keywords starting with or containing K
    #[arg(long, value_name = "K")]
    pub count: Option<String>,

    /// List keywords starting with or containing P
    #[arg(long, value_name = "P")]
    pub search: Option<String>,

    /// List keywords in category C
    #[arg(long, value_name = "C")]
    pub category: Option<String>,

    /// List all categories
    #[arg(long)]
    pub categories: bool,

    /// Print one keyword schema
    #[arg(long, value_name = "NAME")]
    pub get: Option<String>,
}
