use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use subconv::{Error, LinkRegistry, Proxy, ProxyType, TriBool};

fn registry() -> LinkRegistry {
    LinkRegistry::with_builtin_decoders()
}

#[test]
fn test_shadowsocks_link() {
    let proxy = registry()
        .decode_one("ss://YWVzLTI1Ni1nY206dGVzdA==@127.0.0.1:8388#Test%20SS")
        .unwrap();
    assert_eq!(proxy.proxy_type, ProxyType::Shadowsocks);
    assert_eq!(proxy.hostname, "127.0.0.1");
    assert_eq!(proxy.port, 8388);
    assert_eq!(proxy.encrypt_method.as_deref(), Some("aes-256-gcm"));
    assert_eq!(proxy.password.as_deref(), Some("test"));
    assert_eq!(proxy.remark, "Test SS");
}

#[test]
fn test_trojan_link() {
    let proxy = registry()
        .decode_one("trojan://password@127.0.0.1:443#Test%20Trojan")
        .unwrap();
    assert_eq!(proxy.proxy_type, ProxyType::Trojan);
    assert_eq!(proxy.hostname, "127.0.0.1");
    assert_eq!(proxy.port, 443);
    assert_eq!(proxy.password.as_deref(), Some("password"));
    assert_eq!(proxy.remark, "Test Trojan");
    assert!(proxy.tls_secure);
}

#[test]
fn test_vmess_port_as_string_or_number() {
    let as_string = r#"{"v":"2","ps":"VM","add":"v.example.com","port":"8080","id":"b831381d-6324-4d53-ad4f-8cda48b30811","aid":"0","net":"ws","path":"/ws","tls":"tls"}"#;
    let as_number = r#"{"v":"2","ps":"VM","add":"v.example.com","port":8080,"id":"b831381d-6324-4d53-ad4f-8cda48b30811","aid":0,"net":"ws","path":"/ws","tls":"tls"}"#;

    let registry = registry();
    let a = registry
        .decode_one(&format!("vmess://{}", STANDARD.encode(as_string)))
        .unwrap();
    let b = registry
        .decode_one(&format!("vmess://{}", STANDARD.encode(as_number)))
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(a.port, 8080);
    assert_eq!(a.encrypt_method.as_deref(), Some("auto"));
    assert_eq!(a.fake_type.as_deref(), Some("none"));
}

#[test]
fn test_vmess_rejects_other_port_shapes() {
    let payload = r#"{"add":"v.example.com","port":[8080],"id":"x"}"#;
    let result = registry().decode_one(&format!("vmess://{}", STANDARD.encode(payload)));
    assert!(matches!(result, Err(Error::MalformedPayload { .. })));
}

#[test]
fn test_vless_reality_link() {
    let proxy = registry()
        .decode_one("vless://b831381d-6324-4d53-ad4f-8cda48b30811@r.example.com:443?security=reality&sni=www.example.com&pbk=KEY&sid=ab&fp=chrome&flow=xtls-rprx-vision&alpn=h2,http/1.1#Reality")
        .unwrap();
    assert_eq!(proxy.proxy_type, ProxyType::Vless);
    assert!(proxy.tls_secure);
    assert_eq!(proxy.tls_str.as_deref(), Some("reality"));
    assert_eq!(proxy.public_key.as_deref(), Some("KEY"));
    assert_eq!(proxy.short_id.as_deref(), Some("ab"));
    assert_eq!(proxy.alpn, vec!["h2".to_string(), "http/1.1".to_string()]);
    assert_eq!(proxy.remark, "Reality");
}

#[test]
fn test_ssr_malformed_inputs() {
    let registry = registry();
    let no_query = format!(
        "ssr://{}",
        STANDARD.encode(format!("1.2.3.4:443:origin:aes-128-cfb:plain:{}", STANDARD.encode("pw")))
    );
    let five_fields = format!(
        "ssr://{}",
        STANDARD.encode(format!("1.2.3.4:443:origin:plain:{}/?remarks=", STANDARD.encode("pw")))
    );
    for link in [no_query, five_fields] {
        assert!(
            matches!(registry.decode_one(&link), Err(Error::MalformedPayload { .. })),
            "{} should be malformed",
            link
        );
    }
}

#[test]
fn test_ssr_bad_optional_param_is_not_fatal() {
    let main = format!("1.2.3.4:443:auth_aes128_md5:aes-128-cfb:tls1.2_ticket_auth:{}", STANDARD.encode("pw"));
    let query = format!("obfsparam=%%%&remarks={}", STANDARD.encode("SSR Node"));
    let link = format!("ssr://{}", STANDARD.encode(format!("{}/?{}", main, query)));

    let proxy = registry().decode_one(&link).unwrap();
    assert_eq!(proxy.proxy_type, ProxyType::ShadowsocksR);
    assert_eq!(proxy.password.as_deref(), Some("pw"));
    assert_eq!(proxy.remark, "SSR Node");
    assert_eq!(proxy.obfs_param, None);
}

#[test]
fn test_decode_many_keeps_order_and_drops_malformed() {
    let links = [
        "ss://YWVzLTI1Ni1nY206dGVzdA==@127.0.0.1:8388#First",
        "ssr://%%%",
        "trojan://password@127.0.0.1:443#Second",
        "unknown://whatever",
        "socks5://10.0.0.1:1080#Third",
    ];
    let proxies = registry().decode_many(&links).unwrap();
    assert_eq!(proxies.len(), 3);
    assert_eq!(proxies.remarks(), vec!["First", "Second", "Third"]);
}

#[test]
fn test_decode_many_all_malformed_reports_every_cause() {
    let links = ["ssr://%%%", "unknown://whatever", "trojan://@host:443"];
    match registry().decode_many(&links) {
        Err(Error::EmptyResult { failures, .. }) => {
            assert_eq!(failures.len(), 3);
            assert!(matches!(failures[1].error, Error::UnsupportedScheme { .. }));
        }
        other => panic!("expected an aggregate error, got {:?}", other.map(|l| l.len())),
    }
}

#[test]
fn test_shadowsocks_url_round_trip() {
    let original = Proxy {
        encrypt_method: Some("chacha20-ietf-poly1305".to_string()),
        password: Some("p@ss:word".to_string()),
        remark: "Round Trip".to_string(),
        plugin: Some("obfs-local".to_string()),
        plugin_option: Some("obfs=http;obfs-host=example.com".to_string()),
        ..Proxy::new(ProxyType::Shadowsocks, "ss.example.com", 8443)
    };

    let decoded = registry().decode_one(&original.to_url().unwrap()).unwrap();
    assert_eq!(decoded.hostname, original.hostname);
    assert_eq!(decoded.port, original.port);
    assert_eq!(decoded.encrypt_method, original.encrypt_method);
    assert_eq!(decoded.password, original.password);
    assert_eq!(decoded.remark, original.remark);
    assert_eq!(decoded.plugin, original.plugin);
    assert_eq!(decoded.plugin_option, original.plugin_option);
}

#[test]
fn test_cloned_proxy_is_independent() {
    let original = Proxy {
        alpn: vec!["h2".to_string()],
        udp: TriBool::True,
        ..Proxy::new(ProxyType::Trojan, "t.example.com", 443)
    };
    let mut copy = original.clone();
    copy.alpn.push("http/1.1".to_string());
    copy.hostname = "other.example.com".to_string();
    copy.udp = TriBool::False;

    assert_eq!(original.alpn, vec!["h2".to_string()]);
    assert_eq!(original.hostname, "t.example.com");
    assert_eq!(original.udp, TriBool::True);
}

#[test]
fn test_shadowsocks_legacy_link_with_query() {
    let payload = STANDARD.encode("aes-128-gcm:pw@1.2.3.4:8388");
    let link = format!(
        "ss://{}?plugin=obfs-local%3Bobfs%3Dhttp&group=MyGroup#Legacy%20Query",
        payload
    );
    let proxy = registry().decode_one(&link).unwrap();
    assert_eq!(proxy.hostname, "1.2.3.4");
    assert_eq!(proxy.port, 8388);
    assert_eq!(proxy.encrypt_method.as_deref(), Some("aes-128-gcm"));
    assert_eq!(proxy.password.as_deref(), Some("pw"));
    assert_eq!(proxy.plugin.as_deref(), Some("obfs-local"));
    assert_eq!(proxy.plugin_option.as_deref(), Some("obfs=http"));
    assert_eq!(proxy.group, "MyGroup");
    assert_eq!(proxy.remark, "Legacy Query");
}
