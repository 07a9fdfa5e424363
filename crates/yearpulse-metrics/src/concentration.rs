//! Majority-covering-set size, the shared core of bus factor and elephant
//! factor.

/// Smallest number of top contributors whose counts reach half the total.
///
/// Counts are ranked in descending order and accumulated until
/// `2 * covered >= total`, i.e. `covered >= ceil(total / 2)`. Only the
/// counts matter; which of several tied contributors is taken first does
/// not change the result. Returns `0` when the total is zero.
///
/// The zero case is left to callers: bus factor reports it as `0`, while
/// elephant factor treats a year with no organizational commits as one
/// anonymous organization.
///
/// # Examples
///
/// ```
/// use yearpulse_metrics::concentration::majority_cover;
///
/// assert_eq!(majority_cover([6, 4]), 1);
/// assert_eq!(majority_cover([5, 5]), 1);
/// assert_eq!(majority_cover([3, 3, 3]), 2);
/// assert_eq!(majority_cover(Vec::<u32>::new()), 0);
/// ```
pub fn majority_cover<I>(counts: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    let mut ranked: Vec<u64> = counts.into_iter().map(u64::from).collect();
    let total: u64 = ranked.iter().sum();
    if total == 0 {
        return 0;
    }
    ranked.sort_unstable_by(|a, b| b.cmp(a));

    let mut covered = 0u64;
    let mut taken = 0u32;
    for count in ranked {
        covered += count;
        taken += 1;
        if 2 * covered >= total {
            break;
        }
    }
    taken
}
