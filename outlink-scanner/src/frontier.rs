use std::collections::{HashSet, VecDeque};

/// Pending and visited page sets for one crawl.
///
/// A URL is claimed at most once: [`Frontier::claim`] moves it to the visited
/// set before any fetch starts, and [`Frontier::extend`] ignores anything
/// already visited or pending.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    pending: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a URL. Returns `false` if it was already seen.
    pub fn push(&mut self, url: String) -> bool {
        if self.visited.contains(&url) || self.pending.contains(&url) {
            return false;
        }
        self.pending.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    pub fn extend<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        urls.into_iter().filter(|url| self.push(url.clone())).count()
    }

    /// Takes the next pending URL and marks it visited.
    pub fn claim(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.pending.remove(&url);
        self.visited.insert(url.clone());
        Some(url)
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn into_visited(self) -> HashSet<String> {
        self.visited
    }
}
