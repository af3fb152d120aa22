use crate::config::PROGRESS_INTERVAL;

/// Counters collected during the parsing pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParseStats {
    pub elements_processed: u64,
    pub author_elements: u64,
    pub authors_with_orcid: u64,
    pub homepage_elements: u64,
    pub homepage_records: u64,
}

impl ParseStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one qualifying element. Returns true when a progress
    /// notification is due.
    pub fn inc_elements(&mut self) -> bool {
        self.elements_processed += 1;
        self.elements_processed % PROGRESS_INTERVAL == 0
    }

    pub fn inc_authors(&mut self, with_orcid: bool) {
        self.author_elements += 1;
        if with_orcid {
            self.authors_with_orcid += 1;
        }
    }

    pub fn inc_homepages(&mut self, is_person: bool) {
        self.homepage_elements += 1;
        if is_person {
            self.homepage_records += 1;
        }
    }

    pub fn elements(&self) -> u64 {
        self.elements_processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_zero() {
        let stats = ParseStats::new();
        assert_eq!(stats.elements(), 0);
        assert_eq!(stats.author_elements, 0);
        assert_eq!(stats.authors_with_orcid, 0);
        assert_eq!(stats.homepage_elements, 0);
        assert_eq!(stats.homepage_records, 0);
    }

    #[test]
    fn progress_is_due_every_interval() {
        let mut stats = ParseStats::new();
        let due: Vec<u64> = (0..PROGRESS_INTERVAL * 3)
            .filter_map(|_| stats.inc_elements().then(|| stats.elements()))
            .collect();
        assert_eq!(
            due,
            vec![PROGRESS_INTERVAL, PROGRESS_INTERVAL * 2, PROGRESS_INTERVAL * 3]
        );
    }

    #[test]
    fn mixed_operations() {
        let mut stats = ParseStats::new();
        stats.inc_authors(true);
        stats.inc_authors(false);
        stats.inc_homepages(true);
        stats.inc_homepages(false);
        stats.inc_homepages(false);

        assert_eq!(stats.author_elements, 2);
        assert_eq!(stats.authors_with_orcid, 1);
        assert_eq!(stats.homepage_elements, 3);
        assert_eq!(stats.homepage_records, 1);
    }
}
