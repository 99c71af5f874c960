//! In-memory filter, sort and group helpers over an already loaded link list.
//!
//! Every function here is pure: inputs are borrowed, results are new values.

use crate::category::Category;
use crate::link::Link;
use jiff::tz::TimeZone;
use std::borrow::Cow;
use std::collections::BTreeMap;

pub const RECENT_LINKS_LIMIT: usize = 5;
/// Bucket for links that carry no timestamp.
pub const UNDATED: &str = "Undated";

/// Names of the `limit` most recently touched links, newest first.
pub fn recent_links(links: &[Link], limit: usize) -> Vec<String> {
    let mut sorted: Vec<&Link> = links.iter().collect();
    // stable sort: equal timestamps keep input order, None sorts last
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted
        .into_iter()
        .take(limit)
        .map(|link| link.name.clone())
        .collect()
}

/// Buckets links by the long date of their `timestamp` in `tz`.
///
/// Buckets appear in order of first occurrence; within a bucket the input
/// order is kept.
pub fn group_by_date(links: &[Link], tz: &TimeZone) -> Vec<(String, Vec<Link>)> {
    let mut groups: Vec<(String, Vec<Link>)> = Vec::new();
    for link in links {
        let label = match link.timestamp {
            Some(ts) => ts.to_zoned(tz.clone()).strftime("%B %-d, %Y").to_string(),
            None => UNDATED.to_string(),
        };
        match groups.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, bucket)) => bucket.push(link.clone()),
            None => groups.push((label, vec![link.clone()])),
        }
    }
    groups
}

/// Links grouped by category name, groups in order of first occurrence.
pub fn group_by_category(links: &[Link]) -> Vec<(String, Vec<Link>)> {
    let mut groups: Vec<(String, Vec<Link>)> = Vec::new();
    for link in links {
        match groups.iter_mut().find(|(name, _)| *name == link.category) {
            Some((_, bucket)) => bucket.push(link.clone()),
            None => groups.push((link.category.clone(), vec![link.clone()])),
        }
    }
    groups
}

/// Moves the element at `from` to `to` and returns the new sequence.
///
/// An out-of-range `from` returns an unchanged copy; `to` is clamped to the
/// last index.
pub fn reorder<T: Clone>(list: &[T], from: usize, to: usize) -> Vec<T> {
    let mut result = list.to_vec();
    if from >= result.len() {
        return result;
    }
    let item = result.remove(from);
    let to = to.min(result.len());
    result.insert(to, item);
    result
}

/// Number of links per known category.
///
/// Every category starts at zero; links naming an unknown category are
/// ignored rather than creating a new entry.
pub fn calculate_link_counts(categories: &[Category], links: &[Link]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = categories
        .iter()
        .map(|category| (category.name.clone(), 0))
        .collect();
    for link in links {
        if let Some(count) = counts.get_mut(&link.category) {
            *count += 1;
        }
    }
    counts
}

/// Extracts one searchable field of a row.
pub type SearchField<T> = for<'a> fn(&'a T) -> Cow<'a, str>;

/// Rows where any of `fields` contains `term`, ignoring case.
///
/// A blank term matches everything.
pub fn search_table<T: Clone>(items: &[T], term: &str, fields: &[SearchField<T>]) -> Vec<T> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| {
            fields
                .iter()
                .any(|field| field(*item).to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

fn link_name(link: &Link) -> Cow<'_, str> {
    Cow::Borrowed(&link.name)
}

fn link_description(link: &Link) -> Cow<'_, str> {
    Cow::Borrowed(link.description.as_deref().unwrap_or_default())
}

fn link_category(link: &Link) -> Cow<'_, str> {
    Cow::Borrowed(&link.category)
}

fn link_tags(link: &Link) -> Cow<'_, str> {
    Cow::Owned(link.tags.join(" "))
}

/// Fields the link table searches: name, description, category and tags.
pub fn link_search_fields() -> [SearchField<Link>; 4] {
    [link_name, link_description, link_category, link_tags]
}
