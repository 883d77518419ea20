use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::Value;

use crate::parser::deserialize::deserialize_u16_lenient;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WsOpts {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrpcOpts {
    #[serde(rename = "grpc-service-name", default)]
    pub grpc_service_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RealityOpts {
    #[serde(rename = "public-key", default)]
    pub public_key: Option<String>,
    #[serde(rename = "short-id", default)]
    pub short_id: Option<String>,
}

/// Represents a single entry of a Clash `proxies` list
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClashProxyYamlInput {
    #[serde(rename = "ss")]
    Shadowsocks {
        name: String,
        server: String,
        #[serde(default, deserialize_with = "deserialize_u16_lenient")]
        port: Option<u16>,
        cipher: String,
        password: String,
        #[serde(default)]
        udp: Option<bool>,
        #[serde(default)]
        tfo: Option<bool>,
        #[serde(default)]
        plugin: Option<String>,
        #[serde(rename = "plugin-opts", default)]
        plugin_opts: Option<BTreeMap<String, Value>>,
    },

    #[serde(rename = "ssr")]
    ShadowsocksR {
        name: String,
        server: String,
        #[serde(default, deserialize_with = "deserialize_u16_lenient")]
        port: Option<u16>,
        cipher: String,
        password: String,
        protocol: String,
        obfs: String,
        #[serde(rename = "protocol-param", default)]
        protocol_param: Option<String>,
        #[serde(rename = "obfs-param", default)]
        obfs_param: Option<String>,
        #[serde(default)]
        udp: Option<bool>,
    },

    #[serde(rename = "vmess")]
    VMess {
        name: String,
        server: String,
        #[serde(default, deserialize_with = "deserialize_u16_lenient")]
        port: Option<u16>,
        uuid: String,
        #[serde(rename = "alterId", default, deserialize_with = "deserialize_u16_lenient")]
        alter_id: Option<u16>,
        #[serde(default)]
        cipher: Option<String>,
        #[serde(default)]
        network: Option<String>,
        #[serde(default)]
        tls: Option<bool>,
        #[serde(default)]
        servername: Option<String>,
        #[serde(rename = "ws-opts", default)]
        ws_opts: Option<WsOpts>,
        #[serde(rename = "grpc-opts", default)]
        grpc_opts: Option<GrpcOpts>,
        #[serde(rename = "skip-cert-verify", default)]
        skip_cert_verify: Option<bool>,
        #[serde(default)]
        udp: Option<bool>,
    },

    #[serde(rename = "vless")]
    Vless {
        name: String,
        server: String,
        #[serde(default, deserialize_with = "deserialize_u16_lenient")]
        port: Option<u16>,
        uuid: String,
        #[serde(default)]
        network: Option<String>,
        #[serde(default)]
        tls: Option<bool>,
        #[serde(default)]
        servername: Option<String>,
        #[serde(default)]
        flow: Option<String>,
        #[serde(rename = "client-fingerprint", default)]
        client_fingerprint: Option<String>,
        #[serde(rename = "reality-opts", default)]
        reality_opts: Option<RealityOpts>,
        #[serde(rename = "ws-opts", default)]
        ws_opts: Option<WsOpts>,
        #[serde(rename = "grpc-opts", default)]
        grpc_opts: Option<GrpcOpts>,
        #[serde(rename = "skip-cert-verify", default)]
        skip_cert_verify: Option<bool>,
        #[serde(default)]
        udp: Option<bool>,
    },

    #[serde(rename = "trojan")]
    Trojan {
        name: String,
        server: String,
        #[serde(default, deserialize_with = "deserialize_u16_lenient")]
        port: Option<u16>,
        password: String,
        #[serde(default)]
        sni: Option<String>,
        #[serde(default)]
        network: Option<String>,
        #[serde(default)]
        alpn: Option<Vec<String>>,
        #[serde(rename = "skip-cert-verify", default)]
        skip_cert_verify: Option<bool>,
        #[serde(default)]
        udp: Option<bool>,
    },

    #[serde(rename = "http")]
    Http {
        name: String,
        server: String,
        #[serde(default, deserialize_with = "deserialize_u16_lenient")]
        port: Option<u16>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default)]
        tls: Option<bool>,
        #[serde(rename = "skip-cert-verify", default)]
        skip_cert_verify: Option<bool>,
    },

    #[serde(rename = "socks5")]
    Socks5 {
        name: String,
        server: String,
        #[serde(default, deserialize_with = "deserialize_u16_lenient")]
        port: Option<u16>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default)]
        udp: Option<bool>,
    },
}
