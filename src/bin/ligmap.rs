use std::collections::{BTreeMap, BTreeSet};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ligmap::annotation::{Annotator, common_terms};
use ligmap::chembl::ChemblHttpClient;
use ligmap::config::{ConfigLoader, ResolvedConfig};
use ligmap::diagnostics::{Outcome, Warning};
use ligmap::domain::{ChemblId, OverlapPolicy, StructureQuery, UniprotAccession};
use ligmap::error::LigmapError;
use ligmap::output::JsonOutput;
use ligmap::resolver::Resolver;
use ligmap::similarity::{SimilarityExpander, SimilarityOptions};
use ligmap::targets::{MappingOptions, TargetMap, TargetMapper};
use ligmap::uniprot::UniprotHttpClient;

#[derive(Parser)]
#[command(name = "ligmap")]
#[command(about = "Map compounds to ChEMBL targets and annotate them from UniProt")]
#[command(version, author)]
struct Cli {
    /// Path to a JSON config file (default: ./ligmap.json, then the user config dir)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Resolve compound names to ChEMBL ids")]
    Resolve(ResolveArgs),
    #[command(about = "Find structurally similar compounds")]
    Similar(SimilarArgs),
    #[command(about = "Map ChEMBL ids to UniProt accessions of their targets")]
    Targets(TargetsArgs),
    #[command(about = "Fetch UniProt annotation for accessions")]
    Annotate(AnnotateArgs),
    #[command(about = "Resolve names, map them to targets and name the proteins")]
    Pipeline(PipelineArgs),
}

#[derive(Args)]
struct ResolveArgs {
    #[arg(required = true)]
    names: Vec<String>,
}

#[derive(Args)]
struct SimilarArgs {
    /// ChEMBL ids or SMILES strings
    #[arg(required = true)]
    queries: Vec<String>,

    #[arg(long)]
    threshold: Option<u8>,

    /// Include the similarity score of every match
    #[arg(long)]
    scores: bool,
}

#[derive(Args, Clone)]
struct MappingArgs {
    #[arg(long)]
    organism: Option<String>,

    /// Keep activities strictly below this value (nM)
    #[arg(long)]
    max_potency: Option<f64>,

    #[arg(long)]
    drop_empty: bool,

    #[arg(long)]
    overlap: Option<OverlapPolicy>,
}

#[derive(Args)]
struct TargetsArgs {
    #[arg(required = true)]
    ids: Vec<String>,

    #[command(flatten)]
    mapping: MappingArgs,
}

#[derive(Clone, Copy, ValueEnum)]
enum AnnotationKind {
    Names,
    Go,
    Info,
    Genes,
}

#[derive(Args)]
struct AnnotateArgs {
    kind: AnnotationKind,

    #[arg(required = true)]
    accessions: Vec<String>,

    /// Fetch repeated accessions again (genes only)
    #[arg(long)]
    no_cache: bool,
}

#[derive(Args)]
struct PipelineArgs {
    #[arg(required = true)]
    names: Vec<String>,

    #[command(flatten)]
    mapping: MappingArgs,

    /// Report the GO terms shared by every mapped protein
    #[arg(long)]
    common_go: bool,
}

#[derive(Serialize)]
struct PipelineResult {
    compounds: BTreeMap<String, ChemblId>,
    targets: TargetMap,
    proteins: BTreeMap<UniprotAccession, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    common_go: Option<BTreeSet<String>>,
    warnings: Vec<Warning>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<LigmapError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &LigmapError) -> u8 {
    match error {
        LigmapError::InvalidChemblId(_)
        | LigmapError::InvalidUniprotAccession(_)
        | LigmapError::InvalidSimilarity(_)
        | LigmapError::ConfigRead(_)
        | LigmapError::ConfigParse(_) => 2,
        LigmapError::ChemblHttp(_)
        | LigmapError::ChemblStatus { .. }
        | LigmapError::ChemblDecode(_)
        | LigmapError::UniprotHttp(_)
        | LigmapError::UniprotStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve(args) => run_resolve(args, &config),
        Commands::Similar(args) => run_similar(args, &config),
        Commands::Targets(args) => run_targets(args, &config),
        Commands::Annotate(args) => run_annotate(args, &config),
        Commands::Pipeline(args) => run_pipeline(args, &config),
    }
}

fn chembl_client(config: &ResolvedConfig) -> Result<ChemblHttpClient, LigmapError> {
    ChemblHttpClient::new(&config.chembl_url, config.timeout)
}

fn uniprot_client(config: &ResolvedConfig) -> Result<UniprotHttpClient, LigmapError> {
    UniprotHttpClient::new(&config.uniprot_url, config.timeout)
}

fn mapping_options(args: MappingArgs, config: &ResolvedConfig) -> MappingOptions {
    let defaults = config.mapping.clone();
    MappingOptions {
        organism: args.organism.unwrap_or(defaults.organism),
        potency_threshold: args.max_potency.or(defaults.potency_threshold),
        drop_empty: args.drop_empty || defaults.drop_empty,
        overlap: args.overlap.unwrap_or(defaults.overlap),
    }
}

fn parse_all<T>(values: &[String]) -> Result<Vec<T>, LigmapError>
where
    T: std::str::FromStr<Err = LigmapError>,
{
    values.iter().map(|value| value.parse()).collect()
}

fn print_outcome<T: Serialize>(outcome: &Outcome<T>) -> miette::Result<()> {
    JsonOutput::print(outcome).map_err(|err| LigmapError::Filesystem(err.to_string()))?;
    Ok(())
}

fn run_resolve(args: ResolveArgs, config: &ResolvedConfig) -> miette::Result<()> {
    let chembl = chembl_client(config)?;
    let outcome = Resolver::new(&chembl).resolve(&args.names)?;
    print_outcome(&outcome)
}

fn run_similar(args: SimilarArgs, config: &ResolvedConfig) -> miette::Result<()> {
    let chembl = chembl_client(config)?;
    let queries: Vec<StructureQuery> = parse_all(&args.queries)?;
    let options = SimilarityOptions {
        threshold: args.threshold.unwrap_or(config.similarity),
        with_scores: args.scores,
    };
    let expanded = SimilarityExpander::new(&chembl).expand(&queries, options)?;
    print_outcome(&Outcome::new(expanded))
}

fn run_targets(args: TargetsArgs, config: &ResolvedConfig) -> miette::Result<()> {
    let chembl = chembl_client(config)?;
    let ids: Vec<ChemblId> = parse_all(&args.ids)?;
    let options = mapping_options(args.mapping, config);
    let outcome = TargetMapper::new(&chembl).map_targets(&ids, &options)?;
    print_outcome(&outcome)
}

fn run_annotate(args: AnnotateArgs, config: &ResolvedConfig) -> miette::Result<()> {
    let uniprot = uniprot_client(config)?;
    let accessions: Vec<UniprotAccession> = parse_all(&args.accessions)?;
    let annotator = Annotator::new(&uniprot);
    match args.kind {
        AnnotationKind::Names => print_outcome(&annotator.names(&accessions)?),
        AnnotationKind::Go => print_outcome(&annotator.go_terms(&accessions)?),
        AnnotationKind::Info => print_outcome(&annotator.info(&accessions)?),
        AnnotationKind::Genes => {
            print_outcome(&annotator.gene_names(&accessions, !args.no_cache)?)
        }
    }
}

fn run_pipeline(args: PipelineArgs, config: &ResolvedConfig) -> miette::Result<()> {
    let chembl = chembl_client(config)?;
    let uniprot = uniprot_client(config)?;
    let options = mapping_options(args.mapping, config);

    let resolved = Resolver::new(&chembl).resolve(&args.names)?;
    let ids: Vec<ChemblId> = resolved.value.values().cloned().collect();
    let mapped = TargetMapper::new(&chembl).map_targets(&ids, &options)?;
    let accessions: BTreeSet<UniprotAccession> = mapped.value.values().flatten().cloned().collect();

    let annotator = Annotator::new(&uniprot);
    let proteins = annotator.names(&accessions)?;
    let mut warnings = resolved.warnings;
    warnings.extend(mapped.warnings);
    warnings.extend(proteins.warnings);

    let common_go = if args.common_go {
        let terms = annotator.go_terms(&accessions)?;
        warnings.extend(terms.warnings);
        let codes: Vec<Vec<String>> = terms
            .value
            .into_values()
            .map(|terms| terms.into_iter().map(|term| term.code).collect())
            .collect();
        Some(common_terms(&codes))
    } else {
        None
    };

    let result = PipelineResult {
        compounds: resolved.value,
        targets: mapped.value,
        proteins: proteins.value,
        common_go,
        warnings,
    };
    JsonOutput::print(&result).map_err(|err| LigmapError::Filesystem(err.to_string()))?;
    Ok(())
}
