//! Placement arithmetic shared by the commitment scheme and the square
//! writer. Both sides must agree on it exactly, otherwise honestly included
//! messages stop matching their commitments.

/// Offset multiple a message of `share_count` shares must start at.
#[must_use]
pub const fn message_alignment(share_count: usize, square_size: usize) -> usize {
    let alignment = share_count.next_power_of_two();
    if alignment < square_size {
        alignment
    } else {
        square_size
    }
}

#[must_use]
pub const fn next_aligned(cursor: usize, alignment: usize) -> usize {
    cursor.div_ceil(alignment) * alignment
}

/// Run lengths of the Merkle mountain range over a message's shares: full
/// rows first, then decreasing powers of two.
#[must_use]
pub fn mountain_range(share_count: usize, square_size: usize) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut remaining = share_count;
    while remaining != 0 {
        let run = if remaining >= square_size {
            square_size
        } else {
            1 << remaining.ilog2()
        };
        runs.push(run);
        remaining -= run;
    }
    runs
}

/// Share offsets of every message placed after `tx_shares` transaction
/// shares, in the given order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Layout {
    pub message_starts: Vec<usize>,
    /// First offset after the last placed share.
    pub end: usize,
}

pub fn layout<I>(tx_shares: usize, message_share_counts: I, square_size: usize) -> Layout
where
    I: IntoIterator<Item = usize>,
{
    let mut cursor = tx_shares;
    let message_starts = message_share_counts
        .into_iter()
        .map(|count| {
            let start = next_aligned(cursor, message_alignment(count, square_size));
            cursor = start + count;
            start
        })
        .collect();
    Layout {
        message_starts,
        end: cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_is_capped_by_square_size() {
        assert_eq!(message_alignment(1, 4), 1);
        assert_eq!(message_alignment(3, 4), 4);
        assert_eq!(message_alignment(3, 8), 4);
        assert_eq!(message_alignment(13, 4), 4);
        assert_eq!(message_alignment(13, 32), 16);
    }

    #[test]
    fn mountain_ranges() {
        assert_eq!(mountain_range(1, 4), vec![1]);
        assert_eq!(mountain_range(3, 4), vec![2, 1]);
        assert_eq!(mountain_range(11, 4), vec![4, 4, 2, 1]);
        assert_eq!(mountain_range(7, 8), vec![4, 2, 1]);
        assert_eq!(mountain_range(8, 8), vec![8]);
        assert!(mountain_range(0, 8).is_empty());
    }

    #[test]
    fn runs_start_at_multiples_of_their_length() {
        for square_size in [1, 2, 4, 8, 16, 32] {
            for share_count in 1..(square_size * square_size) {
                let Layout {
                    message_starts, ..
                } = layout(5, [share_count], square_size);
                let mut offset = message_starts[0];
                for run in mountain_range(share_count, square_size) {
                    assert_eq!(offset % run, 0, "k={square_size} n={share_count}");
                    // a run never crosses a row boundary
                    assert_eq!(offset / square_size, (offset + run - 1) / square_size);
                    offset += run;
                }
            }
        }
    }

    #[test]
    fn layout_packs_messages_after_transactions() {
        let placed = layout(1, [1, 3, 1], 4);
        assert_eq!(placed.message_starts, vec![1, 4, 7]);
        assert_eq!(placed.end, 8);
    }
}
