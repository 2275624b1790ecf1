#![allow(clippy::missing_panics_doc)]
//! Integration tests for annotating a peptide table with the reference files in `tests/data`
use itertools::Itertools;
use psite::{csv::parse_csv, prelude::*};

fn config() -> AnnotationConfig {
    AnnotationConfig::from_file("tests/data/config.json").unwrap()
}

fn rows() -> Vec<PeptideRow> {
    parse_csv("tests/data/peptides.tsv", b'\t', None)
        .unwrap()
        .map(|line| {
            let line = line.unwrap();
            PeptideRow::new(
                line.index_column("proteins").unwrap(),
                line.index_column("modified sequence").unwrap(),
            )
        })
        .collect()
}

fn positions(config: &AnnotationConfig) -> Vec<PositionAnnotation> {
    let index = config.load_sequence_index().unwrap();
    let vocabulary = config.vocabulary().unwrap();
    let settings = PositionSettings {
        index: &index,
        vocabulary: &vocabulary,
        resolver: &config.resolver,
        context: &config.context,
    };
    resolve_positions(&rows(), settings)
        .into_iter()
        .map(Result::unwrap)
        .collect()
}

#[test]
fn positions_and_contexts() {
    let positions = positions(&config());
    assert_eq!(positions.len(), 4);

    assert_eq!(positions[0].matched_proteins, "P1");
    assert_eq!(positions[0].start_positions, "3");
    assert_eq!(positions[0].end_positions, "9");
    assert_eq!(positions[0].site_positions, "P1_T6");
    assert_eq!(positions[0].site_sequence_contexts, "GRSTSPR");

    assert_eq!(positions[1].matched_proteins, "P1;P2");
    assert_eq!(positions[1].start_positions, "3;-1");
    assert_eq!(positions[1].end_positions, "9;-1");
    assert_eq!(positions[1].site_positions, "P1_S5");
    assert_eq!(positions[1].site_sequence_contexts, "AGRSTSP");

    assert_eq!(positions[2].matched_proteins, "P3;P3");
    assert_eq!(positions[2].start_positions, "1;8");
    assert_eq!(positions[2].end_positions, "7;14");
    assert_eq!(positions[2].site_positions, "P3_S5;P3_S12");
    assert_eq!(positions[2].site_sequence_contexts, "RSTSPRG;RSTSPR_");

    assert_eq!(positions[3].site_positions, "P2_K3");
    assert_eq!(positions[3].site_sequence_contexts, "_MKKLLP");
}

#[test]
fn compressed_fasta() {
    let plain = config().load_sequence_index().unwrap();
    let compressed =
        SequenceIndex::from_fasta("tests/data/proteins.fasta.gz", FastaFlavour::UniProt, "human")
            .unwrap();
    assert_eq!(plain.len(), 3);
    assert_eq!(compressed.get("P3"), Some("GRSTSPRGRSTSPR"));
    assert_eq!(
        plain.iter().sorted().collect_vec(),
        compressed.iter().sorted().collect_vec()
    );
}

/// Annotating the output again gives the exact same annotation
#[test]
fn repeatable() {
    let config = config();
    assert_eq!(positions(&config), positions(&config));
}

#[test]
fn kinase_motifs() {
    let config = config();
    let library = config.load_kinase_library().unwrap();
    assert_eq!(library.len(), 2);
    let contexts = positions(&config).iter().map(ContextRow::from).collect_vec();
    let motifs = score_kinase_motifs(&contexts, &library, &config.kinase_library)
        .into_iter()
        .map(Result::unwrap)
        .collect_vec();

    assert_eq!(motifs[0], MotifAnnotation::default());
    assert_eq!(motifs[1].kinases, "AKT");
    assert_eq!(motifs[1].scores, "2");
    assert_eq!(motifs[1].percentiles, "60");
    assert_eq!(motifs[1].totals, "120");
    assert_eq!(motifs[2].kinases, "CDK");
    assert_eq!(motifs[2].scores, "3");
    assert_eq!(motifs[2].percentiles, "66.667");
    assert_eq!(motifs[2].totals, "200");
    assert_eq!(motifs[3], MotifAnnotation::default());
}

#[test]
fn sequence_motifs() {
    let config = config();
    let library = config.load_sequence_motifs().unwrap();
    let contexts = positions(&config).iter().map(ContextRow::from).collect_vec();
    assert_eq!(
        match_sequence_motifs(&contexts, &library),
        vec![
            "Basophilic;Proline directed",
            "Basophilic;Proline directed",
            "Basophilic;Proline directed",
            "",
        ]
    );
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_is_sequential() {
    let config = config();
    let index = config.load_sequence_index().unwrap();
    let vocabulary = config.vocabulary().unwrap();
    let settings = PositionSettings {
        index: &index,
        vocabulary: &vocabulary,
        resolver: &config.resolver,
        context: &config.context,
    };
    let rows = rows().into_iter().cycle().take(200).collect_vec();
    let sequential = resolve_positions(&rows, settings);
    let parallel = par_resolve_positions(&rows, settings);
    assert_eq!(
        sequential.iter().map(|r| r.as_ref().ok()).collect_vec(),
        parallel.iter().map(|r| r.as_ref().ok()).collect_vec()
    );

    let library = config.load_kinase_library().unwrap();
    let contexts = sequential
        .iter()
        .map(|r| ContextRow::from(r.as_ref().unwrap()))
        .collect_vec();
    assert_eq!(
        score_kinase_motifs(&contexts, &library, &config.kinase_library)
            .into_iter()
            .map(Result::unwrap)
            .collect_vec(),
        par_score_kinase_motifs(&contexts, &library, &config.kinase_library)
            .into_iter()
            .map(Result::unwrap)
            .collect_vec()
    );
}

#[test]
fn malformed_rows_do_not_stop_a_batch() {
    let config = config();
    let index = config.load_sequence_index().unwrap();
    let vocabulary = config.vocabulary().unwrap();
    let settings = PositionSettings {
        index: &index,
        vocabulary: &vocabulary,
        resolver: &config.resolver,
        context: &config.context,
    };
    let rows = [
        PeptideRow::new("P1", "GRST(ph)SPR"),
        PeptideRow::new("P1", "GRST(ph)S#PR"),
        PeptideRow::new("P1;P2", "__"),
    ];
    let results = resolve_positions(&rows, settings);
    assert!(results[0].is_ok());
    assert_eq!(
        results[1].as_ref().unwrap_err().get_kind(),
        &AnnotationErrorKind::MalformedSequence
    );
    assert_eq!(results[2].as_ref().unwrap(), &PositionAnnotation::default());
}

#[test]
fn full_width_windows() {
    let sequence = "MSSPRQLSEEKAAPGTSPSRLSTVEESQKRHYSEAGDDTSPLKRRDSTNLAEQMSDPS";
    let parameters = ContextParameters::default();
    for site in 1..=sequence.len() {
        let window = extract_context("Q1", sequence, site, &[], &parameters).unwrap();
        assert_eq!(window.len(), 31);
        assert_eq!(&window[15..16], &sequence[site - 1..site]);
        if site > 15 && site + 15 <= sequence.len() {
            assert_eq!(window, sequence[site - 16..site + 15]);
        }
    }
    assert_eq!(
        extract_context("Q1", sequence, sequence.len() + 1, &[], &parameters)
            .unwrap_err()
            .get_kind(),
        &AnnotationErrorKind::InvalidSitePosition
    );
}
