use serde::Deserialize;

/// A collection response: either a bare array or a paged envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page {
        results: Vec<T>,
        #[serde(default)]
        count: Option<usize>,
    },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    /// Splits the listing into its items and the total the server reported.
    ///
    /// The total falls back to the number of items received.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, usize) {
        match self {
            Self::Page { results, count } => {
                let total = count.unwrap_or(results.len());
                (results, total)
            }
            Self::Bare(items) => {
                let total = items.len();
                (items, total)
            }
        }
    }
}
