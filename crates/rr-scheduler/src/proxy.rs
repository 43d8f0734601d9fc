//! Round-robin egress proxy selection across chunks.

use rr_core::ProxyUrl;
use tracing::debug;

/// Picks the proxy for each chunk, moving to the next entry once
/// `switch_every` chunks have completed on the current one.
#[derive(Debug, Clone)]
pub struct ProxyRotator {
    switch_every: usize,
    chunks_since_switch: usize,
    /// `None` until the first selection.
    current: Option<usize>,
}

impl ProxyRotator {
    pub fn new(switch_every: usize) -> Self {
        Self {
            switch_every,
            chunks_since_switch: 0,
            current: None,
        }
    }

    /// Proxy for the next connection, or `None` to connect directly.
    ///
    /// The list is passed on every call so an index that no longer fits
    /// (e.g. after the list shrank) wraps back to the first entry.
    pub fn next<'a>(&mut self, proxies: &'a [ProxyUrl]) -> Option<&'a ProxyUrl> {
        if self.chunks_since_switch >= self.switch_every {
            self.chunks_since_switch = 0;
            self.current = Some(self.current.map_or(0, |i| i + 1));
        }

        let index = match self.current {
            Some(i) if i < proxies.len() => i,
            _ => 0,
        };
        self.current = Some(index);

        let proxy = proxies.get(index);
        debug!(index, proxy = ?proxy.map(ProxyUrl::as_str), "Selected proxy");
        proxy
    }

    /// Called by the scheduler once per drained chunk.
    pub fn chunk_completed(&mut self) {
        self.chunks_since_switch += 1;
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxies(n: usize) -> Vec<ProxyUrl> {
        (0..n).map(|i| ProxyUrl(format!("http://proxy-{i}:8080"))).collect()
    }

    /// Runs `chunks` chunk cycles and returns the proxy index used by each.
    fn schedule(rotator: &mut ProxyRotator, list: &[ProxyUrl], chunks: usize) -> Vec<usize> {
        (0..chunks)
            .map(|_| {
                let picked = rotator.next(list).unwrap();
                rotator.chunk_completed();
                list.iter().position(|p| p == picked).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_first_chunks_use_first_proxy() {
        let list = proxies(3);
        let mut rotator = ProxyRotator::new(2);
        assert_eq!(schedule(&mut rotator, &list, 6), vec![0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn test_switch_every_chunk_wraps() {
        let list = proxies(2);
        let mut rotator = ProxyRotator::new(1);
        assert_eq!(schedule(&mut rotator, &list, 5), vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_empty_list_connects_directly() {
        let mut rotator = ProxyRotator::new(1);
        for _ in 0..4 {
            assert!(rotator.next(&[]).is_none());
            rotator.chunk_completed();
        }
    }

    #[test]
    fn test_counter_only_advances_per_chunk() {
        let list = proxies(3);
        let mut rotator = ProxyRotator::new(1);
        let first = rotator.next(&list).cloned();
        // Repeated calls inside one chunk keep the same proxy.
        assert_eq!(rotator.next(&list).cloned(), first);
        assert_eq!(rotator.next(&list).cloned(), first);
    }

    #[test]
    fn test_wraps_when_list_shrinks() {
        let long = proxies(4);
        let mut rotator = ProxyRotator::new(1);
        schedule(&mut rotator, &long, 3);
        assert_eq!(rotator.current_index(), Some(2));

        let short = proxies(2);
        assert_eq!(rotator.next(&short), Some(&short[0]));
        assert_eq!(rotator.current_index(), Some(0));
    }
}
