//! Tests for layered channel configuration loading.

use camino::Utf8PathBuf;
use dokku_reconcile::test_support::EnvGuard;
use dokku_reconcile::{
    ChannelConfig, ChannelConfigLoadError, ChannelError, ConnectError, Host, ProcessCommandRunner,
};
use rstest::rstest;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.path().join("dokku-reconcile.toml"))
        .unwrap_or_else(|path| panic!("non UTF-8 temp path: {}", path.display()));
    std::fs::write(&path, contents).unwrap_or_else(|err| panic!("write {path}: {err}"));
    path
}

#[tokio::test]
async fn environment_overrides_defaults() {
    let dir = TempDir::new().unwrap_or_else(|err| panic!("temp dir: {err}"));
    let path = write_config(&dir, "");
    let _guard = EnvGuard::set_vars(&[
        ("DOKKU_RECONCILE_CONFIG_PATH", path.as_str()),
        ("DOKKU_RECONCILE_HOST", "paas.example.com"),
        ("DOKKU_RECONCILE_SSH_PORT", "2222"),
    ])
    .await;

    let config = ChannelConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load: {err}"));

    assert_eq!(config.host, "paas.example.com");
    assert_eq!(config.ssh_port, 2222);
    assert_eq!(config.ssh_user, "dokku");
    assert!(config.ssh_batch_mode);
    assert_eq!(config.command_prefix, None);
}

#[tokio::test]
async fn config_file_values_are_loaded() {
    let dir = TempDir::new().unwrap_or_else(|err| panic!("temp dir: {err}"));
    let path = write_config(
        &dir,
        "host = \"paas.internal\"\nssh_user = \"deploy\"\ncommand_prefix = \"dokku\"\nssh_connect_timeout_secs = 3\n",
    );
    let _guard = EnvGuard::set_vars(&[("DOKKU_RECONCILE_CONFIG_PATH", path.as_str())]).await;

    let config = ChannelConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load: {err}"));

    assert_eq!(config.destination(), "deploy@paas.internal");
    assert_eq!(config.command_prefix.as_deref(), Some("dokku"));
    assert_eq!(config.ssh_connect_timeout_secs, 3);
    assert!(config.validate().is_ok());
}

#[tokio::test]
async fn malformed_values_surface_as_parse_errors() {
    let dir = TempDir::new().unwrap_or_else(|err| panic!("temp dir: {err}"));
    let path = write_config(&dir, "host = \"paas.example.com\"\n");
    let _guard = EnvGuard::set_vars(&[
        ("DOKKU_RECONCILE_CONFIG_PATH", path.as_str()),
        ("DOKKU_RECONCILE_SSH_PORT", "not-a-port"),
    ])
    .await;

    let err = ChannelConfig::load_without_cli_args().expect_err("invalid port");

    assert!(matches!(err, ChannelConfigLoadError::Parse(_)));
}

#[rstest]
#[case::host("host", "DOKKU_RECONCILE_HOST")]
#[case::ssh_user("ssh_user", "DOKKU_RECONCILE_SSH_USER")]
#[case::ssh_bin("ssh_bin", "DOKKU_RECONCILE_SSH_BIN")]
fn validation_errors_name_env_var_and_toml_key(#[case] field: &str, #[case] env_var: &str) {
    let mut config = ChannelConfig::for_host("paas.example.com");
    match field {
        "host" => config.host = String::new(),
        "ssh_user" => config.ssh_user = String::from(" "),
        _ => config.ssh_bin = String::new(),
    }

    let message = config
        .validate()
        .expect_err("validation should fail")
        .to_string();

    assert!(message.contains(env_var), "should mention {env_var}: {message}");
    assert!(message.contains(field), "should mention {field}: {message}");
    assert!(
        message.contains("dokku-reconcile.toml"),
        "should mention config file: {message}"
    );
}

#[rstest]
fn connect_validates_before_touching_the_network() {
    let config = ChannelConfig {
        ssh_port: 0,
        ..ChannelConfig::for_host("paas.example.com")
    };

    let err = Host::connect(config, ProcessCommandRunner).expect_err("zero port");

    assert_eq!(
        err,
        ConnectError::Channel(ChannelError::InvalidConfig {
            field: String::from("ssh_port"),
        })
    );
}
