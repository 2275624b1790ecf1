//! Annotate all peptides in a tab separated file with their site positions, sequence contexts, and kinase motifs

use std::{fs::File, io::BufWriter, path::PathBuf, process::ExitCode};

use clap::Parser;
use context_error::CreateError;
use itertools::Itertools;
use log::{info, warn};
use psite::{
    csv::{CsvLine, parse_csv, write_csv},
    prelude::*,
};

/// The command line interface arguments
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// The input tab separated file, should have the columns `Proteins` (`;` separated protein
    /// identifiers) and `Modified sequence`
    #[arg(short, long)]
    in_path: PathBuf,
    /// The output path for the annotated tab separated file
    #[arg(short, long)]
    out_path: PathBuf,
    /// The configuration file (JSON), if not given the per user configuration is used if it
    /// exists, otherwise the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Store the given configuration file as the per user configuration
    #[arg(long)]
    save_config: bool,
    /// The protein sequences, overrides the configuration
    #[arg(short, long)]
    fasta: Option<PathBuf>,
    /// Score all sites against the kinase library
    #[arg(long)]
    kinase_library: bool,
    /// Annotate all sites with the sequence motifs
    #[arg(long)]
    sequence_motifs: bool,
    /// Group modified sequences that only differ in the localization of their phosphorylations
    #[arg(long)]
    groups: bool,
    /// The columns that count as observations of a modified sequence when picking the
    /// representative of each group, a non empty value is an observation. Without any column
    /// every row is a single observation.
    #[arg(long, value_delimiter = ',', requires = "groups")]
    observation_columns: Vec<String>,
    /// Use every S, T, Y, and K as a site instead of the marked residues
    #[arg(long)]
    all_potential_sites: bool,
    /// The number of threads, defaults to the number of cores
    #[arg(short, long)]
    threads: Option<usize>,
}

fn load_config(args: &Cli) -> Result<AnnotationConfig, AnnotationError> {
    let mut config = match &args.config {
        Some(path) => {
            let config = AnnotationConfig::from_file(path)?;
            if args.save_config
                && let Some(user) = AnnotationConfig::user_config_path()
            {
                info!("Storing configuration at {}", user.display());
                config.save(user)?;
            }
            config
        }
        None => AnnotationConfig::from_user_config()?,
    };
    if let Some(fasta) = &args.fasta {
        config.fasta_file.clone_from(fasta);
    }
    if args.all_potential_sites {
        config.resolver.all_potential_sites = true;
    }
    Ok(config)
}

fn peptide_row(line: &CsvLine) -> Result<PeptideRow, AnnotationError> {
    Ok(PeptideRow::new(
        line.index_column("proteins")?,
        line.index_column("modified sequence")?,
    ))
}

/// The number of values in the given columns that are not empty or `NaN`, a single observation if
/// no columns are given
fn observation_count(line: &CsvLine, columns: &[String]) -> Result<usize, AnnotationError> {
    if columns.is_empty() {
        return Ok(1);
    }
    columns.iter().try_fold(0, |count, column| {
        let value = line.index_column(column)?.trim();
        Ok(count + usize::from(!value.is_empty() && !value.eq_ignore_ascii_case("nan")))
    })
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Cli::parse();

    if let Some(threads) = args.threads
        && let Err(err) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        warn!("Could not set the number of threads: {err}");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Cli) -> Result<(), AnnotationError> {
    let config = load_config(args)?;
    let index = config.load_sequence_index()?;
    let vocabulary = config.vocabulary()?;
    let (lines, errors): (Vec<CsvLine>, Vec<AnnotationError>) =
        parse_csv(&args.in_path, b'\t', None)?.partition_result();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        eprintln!(
            "Errors were found while reading the input file, the program will continue but will ignore all failed lines"
        );
    }
    let (rows, errors): (Vec<PeptideRow>, Vec<AnnotationError>) =
        lines.iter().map(peptide_row).partition_result();
    if let Some(error) = errors.into_iter().next() {
        return Err(error);
    }
    info!("Annotating {} peptides", rows.len());

    let settings = PositionSettings {
        index: &index,
        vocabulary: &vocabulary,
        resolver: &config.resolver,
        context: &config.context,
    };
    let positions: Vec<PositionAnnotation> = par_resolve_positions(&rows, settings)
        .into_iter()
        .zip(&lines)
        .map(|(annotation, line)| {
            annotation.unwrap_or_else(|err| {
                eprintln!("Line {}: {err}", line.line_index() + 1);
                PositionAnnotation::default()
            })
        })
        .collect();
    let contexts = positions.iter().map(ContextRow::from).collect_vec();

    let motifs = if args.kinase_library {
        let library = config.load_kinase_library()?;
        Some(
            par_score_kinase_motifs(&contexts, &library, &config.kinase_library)
                .into_iter()
                .zip(&lines)
                .map(|(annotation, line)| {
                    annotation.unwrap_or_else(|err| {
                        eprintln!("Line {}: {err}", line.line_index() + 1);
                        MotifAnnotation::default()
                    })
                })
                .collect_vec(),
        )
    } else {
        None
    };
    let sequence_motifs = if args.sequence_motifs {
        Some(match_sequence_motifs(
            &contexts,
            &config.load_sequence_motifs()?,
        ))
    } else {
        None
    };
    let groups = if args.groups {
        let sequences = rows.iter().map(|r| r.modified_sequence.as_str()).collect_vec();
        let groups = modified_sequence_groups(&sequences, config.group_tolerance);
        let counts = lines
            .iter()
            .map(|line| observation_count(line, &args.observation_columns))
            .collect::<Result<Vec<_>, _>>()?;
        let representatives = representative_sequences(&sequences, &groups, &counts);
        Some((groups, representatives))
    } else {
        None
    };

    let out = (0..rows.len()).map(|index| {
        let mut row = lines[index]
            .original_values()
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect_vec();
        let position = &positions[index];
        row.extend([
            ("Matched proteins".to_string(), position.matched_proteins.clone()),
            ("Start positions".to_string(), position.start_positions.clone()),
            ("End positions".to_string(), position.end_positions.clone()),
            ("Site positions".to_string(), position.site_positions.clone()),
            (
                "Site sequence context".to_string(),
                position.site_sequence_contexts.clone(),
            ),
        ]);
        if let Some(motifs) = &motifs {
            let motif = &motifs[index];
            row.extend([
                ("Motif Kinases".to_string(), motif.kinases.clone()),
                ("Motif Scores".to_string(), motif.scores.clone()),
                ("Motif Percentiles".to_string(), motif.percentiles.clone()),
                ("Motif Totals".to_string(), motif.totals.clone()),
            ]);
        }
        if let Some(sequence_motifs) = &sequence_motifs {
            row.push(("Motifs".to_string(), sequence_motifs[index].clone()));
        }
        if let Some((groups, representatives)) = &groups {
            let (representative, degree) = &representatives[index];
            row.extend([
                (
                    "Delocalized sequence".to_string(),
                    delocalized_sequence(&rows[index].modified_sequence),
                ),
                ("Modified sequence group".to_string(), groups[index].clone()),
                (
                    "Modified sequence representative".to_string(),
                    representative.clone(),
                ),
                (
                    "Modified sequence representative degree".to_string(),
                    degree.to_string(),
                ),
            ]);
        }
        row
    });

    let file = File::create(&args.out_path).map_err(|e| io_error(&args.out_path, &e))?;
    write_csv(BufWriter::new(file), out, '\t').map_err(|e| io_error(&args.out_path, &e))
}

fn io_error(path: &std::path::Path, error: &std::io::Error) -> AnnotationError {
    context_error::BoxedError::new(
        AnnotationErrorKind::Io,
        "Could not write output file",
        error.to_string(),
        context_error::Context::default()
            .source(path.to_string_lossy())
            .to_owned(),
    )
}
