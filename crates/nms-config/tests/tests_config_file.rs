//! Tests for the shipped configuration file

use nms_config::validation::collect_errors;
use nms_config::NmsConfig;

const SHIPPED: &str = include_str!("../../../nms_configuration.toml");

#[test]
fn test_shipped_config_parses_and_validates() {
    let config: NmsConfig = toml::from_str(SHIPPED).unwrap();
    assert!(collect_errors(&config).is_empty());
    assert_eq!(config, shipped_defaults_with_lab());
}

fn shipped_defaults_with_lab() -> NmsConfig {
    let mut config = NmsConfig::default();
    config.topologies.push(nms_config::TopologyConfig {
        name: "lab".into(),
        controller_ip: "2001:db8::10".into(),
        aggregator_ip: "2001:db8::20".into(),
    });
    config
}
