//! Grouping modified sequences that only differ in the localization of their phosphorylations

use std::collections::HashMap;

use itertools::Itertools;

const PHOSPHO: &str = "(ph)";

/// The sequence without its phosphorylations followed by `_N` with N the number of
/// phosphorylations, all other modifications are left as is. `AS(ph)M(ox)K` gives `ASM(ox)K_1`.
pub fn delocalized_sequence(sequence: &str) -> String {
    let count = sequence.matches(PHOSPHO).count();
    format!("{}_{count}", sequence.replace(PHOSPHO, ""))
}

/// The character index of every phosphorylated residue in the sequence without phosphorylations
fn phospho_positions(sequence: &str) -> Vec<usize> {
    sequence
        .match_indices(PHOSPHO)
        .enumerate()
        .map(|(index, (start, _))| (start - index * PHOSPHO.len()).saturating_sub(1))
        .collect()
}

/// The largest distance between the corresponding phosphorylations of two sequences
fn positional_distance(a: &[usize], b: &[usize]) -> usize {
    a.iter()
        .zip(b)
        .map(|(a, b)| a.abs_diff(*b))
        .max()
        .unwrap_or_default()
}

fn find(parents: &mut [usize], mut index: usize) -> usize {
    while parents[index] != index {
        parents[index] = parents[parents[index]];
        index = parents[index];
    }
    index
}

/// For every sequence, the group of all sequences with the same delocalized sequence that can be
/// reached by steps of at most `tolerance` positions (single linkage). Each group is given as the
/// sorted unique sequences joined by `;`.
pub fn modified_sequence_groups<S: AsRef<str>>(sequences: &[S], tolerance: usize) -> Vec<String> {
    let mut parents: Vec<usize> = (0..sequences.len()).collect();
    let positions = sequences
        .iter()
        .map(|s| phospho_positions(s.as_ref()))
        .collect_vec();

    let mut by_backbone: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, sequence) in sequences.iter().enumerate() {
        by_backbone
            .entry(delocalized_sequence(sequence.as_ref()))
            .or_default()
            .push(index);
    }
    for members in by_backbone.values() {
        for (a, b) in members.iter().tuple_combinations() {
            if positional_distance(&positions[*a], &positions[*b]) <= tolerance {
                let (root_a, root_b) = (find(&mut parents, *a), find(&mut parents, *b));
                parents[root_a] = root_b;
            }
        }
    }

    let mut groups: HashMap<usize, Vec<&str>> = HashMap::new();
    for (index, sequence) in sequences.iter().enumerate() {
        let root = find(&mut parents, index);
        groups.entry(root).or_default().push(sequence.as_ref());
    }
    let joined: HashMap<usize, String> = groups
        .into_iter()
        .map(|(root, members)| (root, members.into_iter().sorted().dedup().join(";")))
        .collect();
    (0..sequences.len())
        .map(|index| joined[&find(&mut parents, index)].clone())
        .collect()
}

/// For every row, the representative of its group together with the representative degree.
///
/// The representative is the group member with the most observations, the first such row on ties.
/// The degree is the share of all observations of the group that belong to the representative, `0`
/// for a group without any observations. `groups` is the group column as given by
/// [`modified_sequence_groups`] and `observation_counts` the number of observations per row, all
/// three slices are index-aligned.
pub fn representative_sequences<S: AsRef<str>, G: AsRef<str>>(
    sequences: &[S],
    groups: &[G],
    observation_counts: &[usize],
) -> Vec<(String, f64)> {
    let rows = sequences.len().min(groups.len()).min(observation_counts.len());
    // group -> (representative row, its count, total count)
    let mut summary: HashMap<&str, (usize, usize, usize)> = HashMap::new();
    for row in 0..rows {
        let count = observation_counts[row];
        summary
            .entry(groups[row].as_ref())
            .and_modify(|(best, best_count, total)| {
                if count > *best_count {
                    *best = row;
                    *best_count = count;
                }
                *total += count;
            })
            .or_insert((row, count, count));
    }
    (0..rows)
        .map(|row| {
            let (best, best_count, total) = summary[groups[row].as_ref()];
            let degree = if total == 0 {
                0.0
            } else {
                best_count as f64 / total as f64
            };
            (sequences[best].as_ref().to_string(), degree)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn delocalize() {
        assert_eq!(delocalized_sequence("AS(ph)M(ox)K"), "ASM(ox)K_1");
        assert_eq!(delocalized_sequence("_AS(ph)T(ph)K_"), "_ASTK__2");
        assert_eq!(delocalized_sequence("ASK"), "ASK_0");
    }

    #[test]
    fn positions() {
        assert_eq!(phospho_positions("AS(ph)GT(ph)K"), vec![1, 3]);
        assert!(phospho_positions("ASK").is_empty());
    }

    #[test]
    fn groups() {
        let sequences = [
            "AS(ph)GGTGGGGGSK",
            "ASGGT(ph)GGGGGSK",
            "ASGGTGGGGGS(ph)K",
            "AS(ph)GGTGGGGGSK",
            "AS(ph)GGT(ph)GGGGGSK",
        ];
        let groups = modified_sequence_groups(&sequences, 3);
        assert_eq!(groups[0], "AS(ph)GGTGGGGGSK;ASGGT(ph)GGGGGSK");
        assert_eq!(groups[1], groups[0]);
        assert_eq!(groups[3], groups[0]);
        assert_eq!(groups[2], "ASGGTGGGGGS(ph)K");
        assert_eq!(groups[4], "AS(ph)GGT(ph)GGGGGSK");
    }

    #[test]
    fn chained() {
        let sequences = ["S(ph)SSSS", "SS(ph)SSS", "SSSS(ph)S"];
        let groups = modified_sequence_groups(&sequences, 2);
        // The first and last are only linked through the second
        assert_eq!(groups[0], "S(ph)SSSS;SS(ph)SSS;SSSS(ph)S");
        assert_eq!(groups[2], groups[0]);
    }

    #[test]
    fn representatives() {
        let sequences = [
            "AS(ph)NSWNASSSPK",
            "ASNS(ph)WNASSSPK",
            "ASNSWNASS(ph)SPK",
            "ASNSWNAS(ph)SSPK",
            "ASNSWNASSS(ph)PK",
        ];
        let groups = [
            "AS(ph)NSWNASSSPK;ASNS(ph)WNASSSPK",
            "AS(ph)NSWNASSSPK;ASNS(ph)WNASSSPK",
            "ASNSWNAS(ph)SSPK;ASNSWNASS(ph)SPK;ASNSWNASSS(ph)PK",
            "ASNSWNAS(ph)SSPK;ASNSWNASS(ph)SPK;ASNSWNASSS(ph)PK",
            "ASNSWNAS(ph)SSPK;ASNSWNASS(ph)SPK;ASNSWNASSS(ph)PK",
        ];
        let representatives = representative_sequences(&sequences, &groups, &[2, 18, 6, 3, 13]);
        assert_eq!(representatives[0], ("ASNS(ph)WNASSSPK".to_string(), 0.9));
        assert_eq!(representatives[1], representatives[0]);
        assert_eq!(representatives[2].0, "ASNSWNASSS(ph)PK");
        assert!((representatives[2].1 - 13.0 / 22.0).abs() < 1e-12);
        assert_eq!(representatives[4], representatives[2]);
    }

    #[test]
    fn representative_ties_and_empty_groups() {
        let sequences = ["S(ph)SK", "SS(ph)K", "T(ph)K"];
        let groups = ["S(ph)SK;SS(ph)K", "S(ph)SK;SS(ph)K", "T(ph)K"];
        let representatives = representative_sequences(&sequences, &groups, &[4, 4, 0]);
        assert_eq!(representatives[0], ("S(ph)SK".to_string(), 0.5));
        assert_eq!(representatives[1], ("S(ph)SK".to_string(), 0.5));
        assert_eq!(representatives[2], ("T(ph)K".to_string(), 0.0));
    }
}
