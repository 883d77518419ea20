use crate::models::proxy::TriBool;

/// Clash specific output settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClashOptions {
    /// Prefix each proxy name with `[TYPE] `
    pub append_type: bool,
    pub allow_lan: bool,
}

/// Surge specific output settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SurgeOptions {
    pub version: u32,
}

impl Default for SurgeOptions {
    fn default() -> Self {
        SurgeOptions { version: 3 }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantumultXOptions {
    pub append_type: bool,
}

/// Per-request generation settings. Built once from the caller's
/// parameters and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    pub target: String,
    /// Keep only proxies whose remark contains one of these
    pub include_remarks: Vec<String>,
    /// Drop proxies whose remark contains any of these
    pub exclude_remarks: Vec<String>,
    pub sort: bool,
    pub udp: TriBool,
    pub tls13: TriBool,
    pub skip_cert_verify: TriBool,
    pub tfo: TriBool,
    pub emit_rules: bool,
    pub clash: ClashOptions,
    pub surge: SurgeOptions,
    pub quanx: QuantumultXOptions,
}

impl GenerateOptions {
    pub fn new(target: &str) -> Self {
        GenerateOptions {
            target: target.trim().to_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_include(mut self, remarks: Vec<String>) -> Self {
        self.include_remarks = remarks;
        self
    }

    pub fn with_exclude(mut self, remarks: Vec<String>) -> Self {
        self.exclude_remarks = remarks;
        self
    }

    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_rules(mut self, emit_rules: bool) -> Self {
        self.emit_rules = emit_rules;
        self
    }

    pub fn with_udp(mut self, udp: TriBool) -> Self {
        self.udp = udp;
        self
    }

    pub fn with_tfo(mut self, tfo: TriBool) -> Self {
        self.tfo = tfo;
        self
    }

    pub fn with_skip_cert_verify(mut self, skip: TriBool) -> Self {
        self.skip_cert_verify = skip;
        self
    }

    pub fn with_tls13(mut self, tls13: TriBool) -> Self {
        self.tls13 = tls13;
        self
    }

    pub fn with_surge_version(mut self, version: u32) -> Self {
        self.surge.version = version;
        self
    }
}
