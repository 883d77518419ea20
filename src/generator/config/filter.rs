use log::debug;

use crate::models::Proxy;

/// Keeps proxies whose remark contains at least one `include` substring
/// (when any are given) and none of the `exclude` substrings.
pub fn filter_remarks(proxies: Vec<Proxy>, include: &[String], exclude: &[String]) -> Vec<Proxy> {
    let include: Vec<&str> = include
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    let exclude: Vec<&str> = exclude
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();

    let before = proxies.len();
    let kept: Vec<Proxy> = proxies
        .into_iter()
        .filter(|proxy| {
            let remark = proxy.display_name();
            (include.is_empty() || include.iter().any(|i| remark.contains(i)))
                && !exclude.iter().any(|e| remark.contains(e))
        })
        .collect();
    debug!("Remark filter kept {} of {} proxies", kept.len(), before);
    kept
}

/// Stable lexicographic sort by remark.
pub fn sort_by_remark(proxies: &mut [Proxy]) {
    proxies.sort_by_cached_key(|p| p.display_name());
}
