//! Candidate comparison pairs over a version history.

/// Generate the candidate comparison pairs for a sorted, de-duplicated
/// version list.
///
/// Every adjacent pair `(v[i], v[i+1])` is produced in ascending order; when
/// more than two versions exist, one trailing first-vs-last pair is appended
/// after all adjacent pairs. Exactly two versions yield only the one adjacent
/// pair — the extra pair would duplicate it. Fewer than two versions are not
/// comparable and yield nothing.
pub fn generate_pairs(versions: &[u32]) -> Vec<(u32, u32)> {
    if versions.len() < 2 {
        return Vec::new();
    }
    let mut pairs: Vec<(u32, u32)> = versions.windows(2).map(|w| (w[0], w[1])).collect();
    if versions.len() > 2 {
        pairs.push((versions[0], versions[versions.len() - 1]));
    }
    pairs
}

/// Default selection for a version set: the first two sorted versions.
///
/// Groups with fewer than two versions are not comparable and yield `None`;
/// a version is never paired with itself.
pub fn default_pair(versions: &[u32]) -> Option<(u32, u32)> {
    match versions {
        [first, second, ..] => Some((*first, *second)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fewer_than_two_versions_not_comparable() {
        assert!(generate_pairs(&[]).is_empty());
        assert!(generate_pairs(&[7]).is_empty());
    }

    #[test]
    fn test_two_versions_single_pair() {
        // The first-vs-last extra pair is suppressed for n == 2.
        assert_eq!(generate_pairs(&[1, 2]), vec![(1, 2)]);
    }

    #[test]
    fn test_three_versions_adjacent_plus_first_last() {
        assert_eq!(generate_pairs(&[1, 2, 3]), vec![(1, 2), (2, 3), (1, 3)]);
    }

    #[test]
    fn test_four_versions_adjacent_plus_first_last() {
        assert_eq!(
            generate_pairs(&[1, 2, 3, 4]),
            vec![(1, 2), (2, 3), (3, 4), (1, 4)]
        );
    }

    #[test]
    fn test_gapped_versions_use_values_not_positions() {
        assert_eq!(generate_pairs(&[2, 5, 9]), vec![(2, 5), (5, 9), (2, 9)]);
    }

    #[test]
    fn test_pair_count_and_tail_position() {
        for n in 3..8u32 {
            let versions: Vec<u32> = (1..=n).collect();
            let pairs = generate_pairs(&versions);
            assert_eq!(pairs.len(), n as usize);
            assert_eq!(*pairs.last().unwrap(), (1, n));
        }
    }

    #[test]
    fn test_deterministic() {
        let versions = [1, 3, 4, 8];
        assert_eq!(generate_pairs(&versions), generate_pairs(&versions));
    }

    #[test]
    fn test_default_pair() {
        assert_eq!(default_pair(&[]), None);
        assert_eq!(default_pair(&[3]), None);
        assert_eq!(default_pair(&[3, 5]), Some((3, 5)));
        assert_eq!(default_pair(&[1, 2, 9]), Some((1, 2)));
    }
}
