use std::io::Write;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use subconv::utils::StaticFetcher;
use subconv::{Error, GenerateOptions, ProxyType, Settings, Subconverter, SubscriptionFormat};

const LINKS: &str = "ss://YWVzLTI1Ni1nY206dGVzdA==@127.0.0.1:8388#HK%20SS\n\
                     trojan://password@127.0.0.1:443#JP%20Trojan\n\
                     vless://b831381d-6324-4d53-ad4f-8cda48b30811@v.example.com:443?security=tls&type=ws&path=%2Fws#US%20VLESS\n";

const CLASH_SUBSCRIPTION: &str = r#"
proxies:
  - name: "HK Clash"
    type: ss
    server: hk.example.com
    port: 8388
    cipher: aes-128-gcm
    password: pw
  - name: "JP Clash"
    type: trojan
    server: jp.example.com
    port: "443"
    password: secret
    udp: true
  - name: "Unknown"
    type: snell
    server: s.example.com
    port: 1
"#;

#[test]
fn test_base64_subscription_to_clash() {
    let sub = Subconverter::with_defaults(false).unwrap();
    let body = STANDARD.encode(LINKS);

    let proxies = sub.decode_subscription(body.as_bytes()).unwrap();
    assert_eq!(proxies.len(), 3);
    assert_eq!(proxies[2].proxy_type, ProxyType::Vless);

    let output = sub.generate(&proxies, &GenerateOptions::new("clash")).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_slice(&output).unwrap();
    assert_eq!(doc["proxies"].as_sequence().unwrap().len(), 3);
    assert_eq!(doc["proxies"][2]["type"], "vless");
}

#[test]
fn test_plain_and_base64_bodies_decode_alike() {
    let sub = Subconverter::with_defaults(false).unwrap();
    let plain = sub.decode_subscription(LINKS.as_bytes()).unwrap();
    let encoded = sub.decode_subscription(STANDARD.encode(LINKS).as_bytes()).unwrap();
    assert_eq!(plain.to_vec(), encoded.to_vec());
}

#[test]
fn test_clash_subscription_to_surge() {
    let sub = Subconverter::with_defaults(false).unwrap();
    let options = GenerateOptions::new("surge").with_surge_version(4);
    let output = sub
        .convert_content(CLASH_SUBSCRIPTION.as_bytes(), &options)
        .unwrap();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("HK Clash = ss, hk.example.com, 8388, encrypt-method=aes-128-gcm, password=pw"));
    assert!(text.contains("JP Clash = trojan, jp.example.com, 443, password=secret"));
    assert!(text.contains("udp-relay=true"));
    assert!(!text.contains("Unknown"));
}

#[test]
fn test_subscription_format_detection() {
    use subconv::SubscriptionDecoder;

    assert_eq!(
        SubscriptionDecoder::detect(&STANDARD.encode(LINKS)),
        SubscriptionFormat::Base64Links
    );
    assert_eq!(SubscriptionDecoder::detect(LINKS), SubscriptionFormat::PlainLinks);
    assert_eq!(
        SubscriptionDecoder::detect(CLASH_SUBSCRIPTION),
        SubscriptionFormat::Clash
    );
}

#[test]
fn test_convert_url_with_settings_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "default_target = \"quanx\"\nexclude_remarks = [\"JP\"]\nemit_rules = true").unwrap();
    let settings = Settings::load(file.path().to_str().unwrap()).unwrap();

    let fetcher = StaticFetcher::new().with("https://sub.example.com/a", STANDARD.encode(LINKS));
    let sub = Subconverter::with_defaults(settings.strict).unwrap();
    let output = sub
        .convert_url(
            &fetcher,
            "https://sub.example.com/a",
            Duration::from_secs(settings.fetch_timeout_secs),
            &settings.base_options(""),
        )
        .unwrap();
    let text = String::from_utf8(output).unwrap();

    assert!(text.contains("tag=HK SS"));
    assert!(!text.contains("JP Trojan"));
    // QuantumultX has no VLESS support
    assert!(!text.contains("US VLESS"));
    assert!(text.contains("[filter_local]"));
}

#[test]
fn test_unreadable_subscription() {
    let sub = Subconverter::with_defaults(false).unwrap();
    assert!(matches!(
        sub.decode_subscription(b"  \n"),
        Err(Error::EmptyResult { .. })
    ));
    assert!(matches!(
        sub.decode_subscription(&[0xff, 0xfe, 0x00]),
        Err(Error::MalformedPayload { .. })
    ));
    match sub.decode_subscription(b"foo://a\nbar://b\n") {
        Err(Error::EmptyResult { failures, .. }) => assert_eq!(failures.len(), 2),
        other => panic!("expected EmptyResult, got {:?}", other.map(|l| l.len())),
    }
}

#[test]
fn test_supported_targets() {
    let sub = Subconverter::with_defaults(false).unwrap();
    assert_eq!(
        sub.supported_targets(),
        vec!["clash", "loon", "quanx", "singbox", "ss", "surge", "v2ray"]
    );
}
