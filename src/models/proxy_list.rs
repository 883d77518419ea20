use std::collections::BTreeMap;
use std::ops::Deref;

use crate::error::Error;
use crate::models::proxy::{Proxy, ProxyType};

/// An ordered sequence of proxies. Insertion order drives default naming
/// and group membership in generated output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProxyList(Vec<Proxy>);

impl ProxyList {
    pub fn new() -> Self {
        ProxyList(Vec::new())
    }

    pub fn push(&mut self, proxy: Proxy) {
        self.0.push(proxy);
    }

    pub fn filter_by_type(&self, proxy_type: ProxyType) -> ProxyList {
        self.iter()
            .filter(|p| p.proxy_type == proxy_type)
            .cloned()
            .collect()
    }

    /// Matches against the effective group, so `SSProvider` also finds
    /// Shadowsocks nodes that carried no explicit group.
    pub fn filter_by_group(&self, group: &str) -> ProxyList {
        self.iter()
            .filter(|p| p.default_group() == group)
            .cloned()
            .collect()
    }

    pub fn group_by_type(&self) -> BTreeMap<ProxyType, ProxyList> {
        let mut groups: BTreeMap<ProxyType, ProxyList> = BTreeMap::new();
        for proxy in self.iter() {
            groups.entry(proxy.proxy_type).or_default().push(proxy.clone());
        }
        groups
    }

    pub fn remarks(&self) -> Vec<String> {
        self.iter().map(|p| p.display_name()).collect()
    }

    /// Position and cause of every proxy that breaks the model invariant.
    pub fn validate(&self) -> Vec<(usize, Error)> {
        self.iter()
            .enumerate()
            .filter_map(|(idx, p)| p.validate().err().map(|e| (idx, e)))
            .collect()
    }

    pub fn into_vec(self) -> Vec<Proxy> {
        self.0
    }
}

impl Deref for ProxyList {
    type Target = [Proxy];

    fn deref(&self) -> &[Proxy] {
        &self.0
    }
}

impl From<Vec<Proxy>> for ProxyList {
    fn from(proxies: Vec<Proxy>) -> Self {
        ProxyList(proxies)
    }
}

impl FromIterator<Proxy> for ProxyList {
    fn from_iter<I: IntoIterator<Item = Proxy>>(iter: I) -> Self {
        ProxyList(iter.into_iter().collect())
    }
}

impl Extend<Proxy> for ProxyList {
    fn extend<I: IntoIterator<Item = Proxy>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl IntoIterator for ProxyList {
    type Item = Proxy;
    type IntoIter = std::vec::IntoIter<Proxy>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ProxyList {
    type Item = &'a Proxy;
    type IntoIter = std::slice::Iter<'a, Proxy>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
