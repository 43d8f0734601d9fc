use std::num::NonZeroUsize;

/// Split `items` into consecutive chunks of `chunk_size`, keeping order.
/// Only the last chunk may be shorter.
pub fn plan_chunks<T: Clone>(items: &[T], chunk_size: NonZeroUsize) -> Vec<Vec<T>> {
    items
        .chunks(chunk_size.get())
        .map(|chunk| chunk.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_concatenation_reproduces_input() {
        for len in 0..=23usize {
            for chunk_size in 1..=7usize {
                let input: Vec<usize> = (0..len).collect();
                let chunks = plan_chunks(&input, size(chunk_size));

                assert_eq!(chunks.concat(), input, "len={len} size={chunk_size}");
                assert_eq!(chunks.len(), len.div_ceil(chunk_size));
                if let Some((last, full)) = chunks.split_last() {
                    assert!(full.iter().all(|c| c.len() == chunk_size));
                    assert!(!last.is_empty() && last.len() <= chunk_size);
                }
            }
        }
    }

    #[test]
    fn test_short_final_chunk() {
        let chunks = plan_chunks(&["a", "b", "c"], size(2));
        assert_eq!(chunks, vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_empty_input_has_no_chunks() {
        let chunks = plan_chunks::<u8>(&[], size(4));
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_planning_is_deterministic() {
        let input: Vec<u32> = (0..10).collect();
        assert_eq!(plan_chunks(&input, size(3)), plan_chunks(&input, size(3)));
    }
}
