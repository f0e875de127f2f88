/// A candidate that contains the query, with the char range of the first hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringMatch {
    pub index: usize,
    pub range: Option<(usize, usize)>,
}

/// Case-insensitive substring filter over `candidates`, in candidate order.
///
/// An empty query keeps every candidate (with no highlight range).
pub fn match_substring<'a, I>(query: &str, candidates: I) -> Vec<SubstringMatch>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = fold(query);
    candidates
        .into_iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            if needle.is_empty() {
                return Some(SubstringMatch { index, range: None });
            }
            find_folded(&fold(candidate), &needle).map(|start| SubstringMatch {
                index,
                range: Some((start, start + needle.len())),
            })
        })
        .collect()
}

// One char in, one char out, so match offsets map back onto the label.
fn fold(input: &str) -> Vec<char> {
    input
        .chars()
        .map(|ch| ch.to_lowercase().next().unwrap_or(ch))
        .collect()
}

fn find_folded(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&start| haystack[start..start + needle.len()] == *needle)
}
