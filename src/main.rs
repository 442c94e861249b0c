use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod cli;

use cfg_keywords::config::{self, ToolConfig};
use cfg_keywords::hierarchy::{self, HierarchyAlias};
use cfg_keywords::keyword::{build_keywords, FormatDialect};
use cfg_keywords::merge::{
    self, CleanKeyword, DynamicKeyword, MergeSources, MergedDocument, SyntaxCorpus, SyntaxIndex,
};
use cfg_keywords::util::{
    read_cfg_text, read_json, slash_path, write_json_atomic, write_text_atomic,
};
use cfg_keywords::{export, scan};
use cli::{
    Command, FilterArgs, HierarchyArgs, HierarchyReportArgs, MergeArgs, ParseArgs, QueryArgs,
    RootArgs, ScanArgs,
};

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "cfg_keywords=debug"
    } else {
        "cfg_keywords=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);
    let config = config::load_config(args.config.as_deref())?;

    match args.command {
        Command::Scan(args) => cmd_scan(args, &config),
        Command::Parse(args) => cmd_parse(args, &config),
        Command::Hierarchy(args) => cmd_hierarchy(args, &config),
        Command::HierarchyReport(args) => cmd_hierarchy_report(args),
        Command::Merge(args) => cmd_merge(args),
        Command::Filter(args) => cmd_filter(args),
        Command::Query(args) => cmd_query(args, &config),
        Command::Config => {
            println!("{}", config::config_stub()?);
            Ok(())
        }
    }
}

fn cmd_scan(args: ScanArgs, config: &ToolConfig) -> Result<()> {
    let (database, report) = scan::scan_cfg_root(&args.cfg_root, config)?;
    let records = export::export_keywords(database.keywords());
    write_json_atomic(&args.out, &records)?;
    println!(
        "Processed {} files ({} skipped, {} errored); {} keywords",
        report.files_processed,
        report.files_skipped,
        report.files_errored,
        database.len()
    );
    println!("Wrote keyword list to {}", args.out.display());
    if let Some(schema_out) = args.schema_out.as_deref() {
        let schemas: Vec<_> = database.keywords().collect();
        write_json_atomic(schema_out, &schemas)?;
        println!("Wrote keyword schemas to {}", schema_out.display());
    }
    Ok(())
}

fn cmd_parse(args: ParseArgs, config: &ToolConfig) -> Result<()> {
    let text = read_cfg_text(&args.file, &config.encodings)?
        .ok_or_else(|| anyhow!("{} not found", args.file.display()))?;
    let dialect = FormatDialect::detect(&slash_path(&args.file), config);
    let schemas = build_keywords(&text, &args.file, dialect, &config.category_tokens);
    match args.out.as_deref() {
        Some(out) => {
            write_json_atomic(out, &schemas)?;
            println!("Wrote {} keyword schemas to {}", schemas.len(), out.display());
        }
        None => println!(
            "{}",
            serde_json::to_string_pretty(&schemas).context("serialize keyword schemas")?
        ),
    }
    Ok(())
}

fn cmd_hierarchy(args: HierarchyArgs, config: &ToolConfig) -> Result<()> {
    let files = hierarchy::find_hierarchy_files(&args.root, config)?;
    let mapping = hierarchy::map_hierarchy_files(&files, config);
    write_json_atomic(&args.out, &mapping.aliases)?;
    println!(
        "Mapped {} aliases from {} hierarchy files ({} errored)",
        mapping.aliases.len(),
        mapping.files_processed,
        mapping.files_errored
    );
    println!("Wrote alias mapping to {}", args.out.display());
    Ok(())
}

fn cmd_hierarchy_report(args: HierarchyReportArgs) -> Result<()> {
    let aliases: BTreeMap<String, HierarchyAlias> = read_json(&args.mapping)?;
    let report = hierarchy::render_report(&aliases);
    match args.out.as_deref() {
        Some(out) => {
            write_text_atomic(out, &report)?;
            println!("Wrote report to {}", out.display());
        }
        None => print!("{report}"),
    }
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn cmd_merge(args: MergeArgs) -> Result<()> {
    let dynamic: Vec<DynamicKeyword> = read_json(&args.dynamic)?;
    let clean: Vec<CleanKeyword> = read_json(&args.clean)?;
    let syntax: Option<SyntaxCorpus> = args
        .syntax
        .as_deref()
        .map(read_json::<SyntaxCorpus>)
        .transpose()?;

    let sources = MergeSources {
        dynamic: file_label(&args.dynamic),
        clean: file_label(&args.clean),
    };
    let mut merged = merge::merge_collections(&dynamic, &clean, &sources);
    if let (Some(corpus), Some(path)) = (syntax, args.syntax.as_deref()) {
        let index = SyntaxIndex::new(&corpus);
        let attached = merge::attach_syntax(&mut merged.keywords, &index);
        merged.metadata.source_files.push(file_label(path));
        println!(
            "Attached syntax examples to {attached} keywords ({} examples)",
            index.len()
        );
    }
    write_json_atomic(&args.out, &merged)?;

    println!("Total keywords: {}", merged.metadata.total_keywords);
    println!(
        "Keywords with documentation: {}",
        merged.metadata.keywords_with_documentation
    );
    println!("Documentation coverage: {}", merged.metadata.documentation_coverage);
    println!("Wrote merged keywords to {}", args.out.display());
    Ok(())
}

fn cmd_filter(args: FilterArgs) -> Result<()> {
    let unified: MergedDocument = read_json(&args.unified)?;
    let clean: Vec<CleanKeyword> = read_json(&args.clean)?;
    let source = format!(
        "Filtered from {} using {}",
        file_label(&args.unified),
        file_label(&args.clean)
    );
    let filtered = merge::filter_to_clean(&unified, &clean, source);
    write_json_atomic(&args.out, &filtered)?;
    println!("Original keywords: {}", filtered.metadata.original_keywords);
    println!("Matched keywords: {}", filtered.metadata.matched_keywords);
    println!("Coverage: {}", filtered.metadata.coverage);
    println!("Wrote filtered keywords to {}", args.out.display());
    Ok(())
}

fn print_names(names: &[&str], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(names).context("serialize names")?
        );
    } else {
        for name in names {
            println!("{name}");
        }
    }
    Ok(())
}

fn cmd_query(args: QueryArgs, config: &ToolConfig) -> Result<()> {
    let (database, _) = scan::scan_cfg_root(&args.cfg_root, config)?;
    let action = args.action;
    if let Some(keyword) = action.count.as_deref() {
        let count = database.count(keyword);
        if args.json {
            println!("{}", serde_json::json!({ "keyword": keyword, "count": count }));
        } else {
            println!("{count}");
        }
    } else if let Some(pattern) = action.search.as_deref() {
        print_names(&database.search(pattern), args.json)?;
    } else if let Some(category) = action.category.as_deref() {
        print_names(&database.list_by_category(category), args.json)?;
    } else if action.categories {
        print_names(&database.list_categories(), args.json)?;
    } else if let Some(name) = action.get.as_deref() {
        let schema = database
            .get(name)
            .ok_or_else(|| anyhow!("keyword {name} not found"))?;
        if args.json {
            println!(
                "{}",
                serde_json::to_string_pretty(schema).context("serialize keyword schema")?
            );
        } else {
            println!("{} ({})", schema.canonical_name, schema.category);
            println!("  header: {}", schema.header_template);
            println!("  source: {}", schema.source_file);
            for attribute in schema.attributes.iter().filter(|a| !a.internal) {
                let marker = if attribute.required { "*" } else { " " };
                println!(
                    "  {marker} {:<16} {:<8} {}",
                    attribute.name, attribute.type_tag, attribute.description
                );
            }
        }
    }
    Ok(())
}
