//! The user's choice of documents.
//!
//! A selection is a set of titles, not of links. When several candidates
//! share a title, choosing either one selects the title, and the title
//! resolves to the first candidate that carries it.

use anyhow::{bail, Result};

use crate::scrape::CandidateLink;

/// Ordered set of selected titles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    titles: Vec<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from titles, keeping the first occurrence of each
    pub fn from_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for title in titles {
            set.insert(title);
        }
        set
    }

    /// Build from 0-based indices into `links`
    pub fn from_indices(links: &[CandidateLink], indices: &[usize]) -> Self {
        Self::from_titles(
            indices
                .iter()
                .filter_map(|&i| links.get(i))
                .map(|link| link.title.as_str()),
        )
    }

    /// Select every candidate
    pub fn all(links: &[CandidateLink]) -> Self {
        Self::from_titles(links.iter().map(|link| link.title.as_str()))
    }

    /// Add a title; returns `false` if it was already selected
    pub fn insert(&mut self, title: impl Into<String>) -> bool {
        let title = title.into();
        if self.titles.contains(&title) {
            return false;
        }
        self.titles.push(title);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.titles.iter().map(String::as_str)
    }

    /// Map each selected title to the first link carrying it, in selection
    /// order. Titles with no matching link are dropped.
    pub fn resolve<'a>(&self, links: &'a [CandidateLink]) -> Vec<&'a CandidateLink> {
        self.iter()
            .filter_map(|title| links.iter().find(|link| link.title == title))
            .collect()
    }
}

/// Parse a selection typed by the user.
///
/// Accepts 1-based numbers and inclusive ranges separated by commas or
/// whitespace (`1,3 5-7`), or `all`/`*`. Returns 0-based indices in the
/// order given, without repeats. Empty input selects nothing.
pub fn parse_selection(input: &str, count: usize) -> Result<Vec<usize>> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") || input == "*" {
        return Ok((0..count).collect());
    }

    let mut indices = Vec::new();
    let mut push = |i: usize| {
        if !indices.contains(&i) {
            indices.push(i);
        }
    };

    for token in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let (start, end) = match token.split_once('-') {
            Some((a, b)) => (parse_number(a, count)?, parse_number(b, count)?),
            None => {
                let n = parse_number(token, count)?;
                (n, n)
            }
        };
        if start > end {
            bail!("Invalid range: {}", token);
        }
        for n in start..=end {
            push(n - 1);
        }
    }

    Ok(indices)
}

fn parse_number(s: &str, count: usize) -> Result<usize> {
    let Ok(n) = s.trim().parse::<usize>() else {
        bail!("Not a number: {:?}", s);
    };
    if n == 0 || n > count {
        bail!("{} is out of range (1-{})", n, count);
    }
    Ok(n)
}
