//! Remark processing utilities
//!
//! Turns proxy remarks into the names written to generated documents.

use std::collections::HashSet;

use crate::models::Proxy;

/// Display name for one proxy.
///
/// `append_type` prefixes `[TYPE] `; `proc_comma` replaces commas, which
/// would otherwise split an INI line.
pub fn process_remark(proxy: &Proxy, append_type: bool, proc_comma: bool) -> String {
    let mut remark = proxy.display_name();
    if proc_comma {
        remark = remark.replace(',', " ");
    }
    if append_type {
        remark = format!("[{}] {}", proxy.proxy_type, remark);
    }
    remark.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Names for every proxy in order, with duplicates suffixed ` 2`, ` 3`...
/// Client documents refer to proxies and policy groups by name in one
/// namespace, so names must be unique and must not take any of `reserved`.
pub fn unique_remarks(
    proxies: &[Proxy],
    append_type: bool,
    proc_comma: bool,
    reserved: &[&str],
) -> Vec<String> {
    let mut used: HashSet<String> = reserved.iter().map(|r| r.to_string()).collect();
    proxies
        .iter()
        .map(|proxy| {
            let base = process_remark(proxy, append_type, proc_comma);
            let mut name = base.clone();
            let mut n = 2;
            while used.contains(&name) {
                name = format!("{} {}", base, n);
                n += 1;
            }
            used.insert(name.clone());
            name
        })
        .collect()
}
