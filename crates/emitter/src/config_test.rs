//! Tests for destination-string parsing

use std::net::{IpAddr, Ipv4Addr};

use crate::config::{ConfigError, Destination, EmitterConfig};

#[test]
fn test_parse_full_form() {
    let dest: Destination = "lwes:10.0.0.5:224.1.1.11:12345:16".parse().unwrap();
    assert_eq!(dest.interface, Some(Ipv4Addr::new(10, 0, 0, 5)));
    assert_eq!(dest.ip, IpAddr::V4(Ipv4Addr::new(224, 1, 1, 11)));
    assert_eq!(dest.port, 12345);
    assert_eq!(dest.ttl, Some(16));
    assert!(dest.is_multicast());
}

#[test]
fn test_parse_empty_interface() {
    let dest: Destination = "lwes::224.1.1.11:12345".parse().unwrap();
    assert_eq!(dest.interface, None);
    assert_eq!(dest.ttl, None);
    assert_eq!(dest.addr().to_string(), "224.1.1.11:12345");
}

#[test]
fn test_parse_empty_ttl_field_means_default() {
    let dest: Destination = "lwes::224.1.1.11:12345:".parse().unwrap();
    assert_eq!(dest.ttl, None);
}

#[test]
fn test_parse_ttl_bounds() {
    let dest: Destination = "lwes::224.1.1.11:12345:0".parse().unwrap();
    assert_eq!(dest.ttl, Some(0));

    let dest: Destination = "lwes::224.1.1.11:12345:255".parse().unwrap();
    assert_eq!(dest.ttl, Some(255));

    assert_eq!(
        "lwes::224.1.1.11:12345:256".parse::<Destination>(),
        Err(ConfigError::InvalidTtl("256".into()))
    );
}

#[test]
fn test_parse_unicast_destination() {
    let dest: Destination = "lwes::127.0.0.1:9191".parse().unwrap();
    assert!(!dest.is_multicast());
}

#[test]
fn test_parse_rejects_wrong_scheme() {
    assert_eq!(
        "udp::224.1.1.11:12345".parse::<Destination>(),
        Err(ConfigError::UnsupportedScheme("udp".into()))
    );
}

#[test]
fn test_parse_rejects_wrong_field_count() {
    assert!(matches!(
        "lwes:224.1.1.11:12345".parse::<Destination>(),
        Err(ConfigError::InvalidFormat(_))
    ));
    assert!(matches!(
        "lwes::224.1.1.11:12345:3:extra".parse::<Destination>(),
        Err(ConfigError::InvalidFormat(_))
    ));
}

#[test]
fn test_parse_rejects_bad_interface() {
    assert_eq!(
        "lwes:eth0:224.1.1.11:12345".parse::<Destination>(),
        Err(ConfigError::InvalidInterface("eth0".into()))
    );
}

#[test]
fn test_parse_rejects_bad_address() {
    assert_eq!(
        "lwes::not-an-ip:12345".parse::<Destination>(),
        Err(ConfigError::InvalidAddress("not-an-ip".into()))
    );
}

#[test]
fn test_parse_rejects_bad_port() {
    assert_eq!(
        "lwes::224.1.1.11:0".parse::<Destination>(),
        Err(ConfigError::InvalidPort("0".into()))
    );
    assert_eq!(
        "lwes::224.1.1.11:99999".parse::<Destination>(),
        Err(ConfigError::InvalidPort("99999".into()))
    );
    assert_eq!(
        "lwes::224.1.1.11:abc".parse::<Destination>(),
        Err(ConfigError::InvalidPort("abc".into()))
    );
}

#[test]
fn test_config_parse_collects_destinations() {
    let config =
        EmitterConfig::parse(&["lwes::224.1.1.11:12345", "lwes::127.0.0.1:9191:1"]).unwrap();
    assert_eq!(config.destinations.len(), 2);
    assert_eq!(config.destinations[1].ttl, Some(1));
}

#[test]
fn test_config_parse_fails_on_first_bad_entry() {
    let result = EmitterConfig::parse(&["lwes::224.1.1.11:12345", "bogus"]);
    assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
}
