use halo_cg::DebugInvariants;
use halo_cg::cg_error::CgError;
use halo_cg::topology::{ProcessTopology, RowPartition, row_range};
use proptest::prelude::*;

proptest! {
    #[test]
    fn rows_are_covered_exactly_once(ny in 2usize..400, size in 1usize..32) {
        prop_assume!(size <= ny - 1);
        let part = RowPartition::new(size, ny).unwrap();
        prop_assert!(part.validate_invariants().is_ok());

        let mut owners = vec![0usize; ny + 1];
        for r in part.ranges() {
            for j in r.iter() {
                owners[j] += 1;
            }
        }
        prop_assert_eq!(owners[0], 0);
        prop_assert_eq!(owners[ny], 0);
        prop_assert!(owners[1..ny].iter().all(|&n| n == 1));
    }

    #[test]
    fn last_rank_takes_the_remainder(ny in 2usize..400, size in 1usize..32) {
        prop_assume!(size <= ny - 1);
        let rows = ny - 1;
        let (q, rem) = (rows / size, rows % size);
        let part = RowPartition::new(size, ny).unwrap();
        for (c, r) in part.ranges().iter().enumerate() {
            let want = if c + 1 == size { q + rem } else { q };
            prop_assert_eq!(r.len(), want);
        }
    }

    #[test]
    fn neighbours_own_adjacent_rows(ny in 3usize..200, size in 2usize..16) {
        prop_assume!(size <= ny - 1);
        for rank in 0..size - 1 {
            let lo = ProcessTopology::linear(rank, size, ny).unwrap();
            let hi = ProcessTopology::linear(rank + 1, size, ny).unwrap();
            prop_assert_eq!(lo.down, Some(rank + 1));
            prop_assert_eq!(hi.up, Some(rank));
            prop_assert_eq!(lo.rows.upper_ghost(), hi.rows.first());
            prop_assert_eq!(hi.rows.lower_ghost(), lo.rows.last());
        }
    }

    #[test]
    fn more_ranks_than_rows_is_rejected(ny in 2usize..50, extra in 1usize..8) {
        let size = ny - 1 + extra;
        let err = row_range(0, size, ny).unwrap_err();
        let is_too_many = matches!(err, CgError::TooManyRanks { .. });
        prop_assert!(is_too_many);
    }
}
