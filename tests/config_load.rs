// tests/config_load.rs
use market_pulse::config::instruments::{
    Settings, ENV_CACHE_WINDOW_SECS, ENV_FETCH_TIMEOUT_SECS, ENV_INSTRUMENTS_CONFIG_PATH,
    ENV_MARKET_TIMEZONE, ENV_MORNINGSTAR_API_KEY,
};
use market_pulse::Catalog;
use std::{env, fs};

const SMALL: &str = r#"
[settings]
cache_window_secs = 60

[[instruments]]
key = "btc"
display_name = "BTC"
category = "always_on"
source = { kind = "fixed", value = "+1,00%" }
"#;

fn clear_env() {
    for k in [
        ENV_INSTRUMENTS_CONFIG_PATH,
        ENV_CACHE_WINDOW_SECS,
        ENV_FETCH_TIMEOUT_SECS,
        ENV_MARKET_TIMEZONE,
    ] {
        env::remove_var(k);
    }
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("instruments.toml");
    fs::write(&p, SMALL).unwrap();

    let c = Catalog::load_from(&p).unwrap();
    assert_eq!(c.settings.cache_window_secs, 60);
    assert!(c.instrument("btc").is_some());
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("instruments.toml");
    fs::write(&p, "[[instruments]]\nkey = ").unwrap();
    assert!(Catalog::load_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) Nothing on disk: the compiled-in catalog.
    let embedded = Catalog::load_default().unwrap();
    assert!(embedded.instrument("sp500_net_eur").is_some());

    // 2) ./config/instruments.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("instruments.toml"), SMALL).unwrap();
    let local = Catalog::load_default().unwrap();
    assert_eq!(local.instruments.len(), 1);

    // 3) Env path wins.
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, SMALL.replace("\"btc\"", "\"eth\"")).unwrap();
    env::set_var(ENV_INSTRUMENTS_CONFIG_PATH, p_env.display().to_string());
    let from_env = Catalog::load_default().unwrap();
    assert!(from_env.instrument("eth").is_some());

    // 4) Env path to nowhere is a hard error.
    env::set_var(ENV_INSTRUMENTS_CONFIG_PATH, tmp.path().join("missing.toml"));
    assert!(Catalog::load_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_settings() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    env::set_var(ENV_CACHE_WINDOW_SECS, "120");
    env::set_var(ENV_FETCH_TIMEOUT_SECS, "0");
    env::set_var(ENV_MARKET_TIMEZONE, "America/New_York");
    let c = Catalog::load_default().unwrap();
    assert_eq!(c.settings.cache_window_secs, 120);
    assert_eq!(c.settings.fetch_timeout_secs, 1, "timeout clamped to >= 1s");
    assert_eq!(c.settings.tz().unwrap(), chrono_tz::America::New_York);

    env::set_var(ENV_CACHE_WINDOW_SECS, "not-a-number");
    env::remove_var(ENV_FETCH_TIMEOUT_SECS);
    env::remove_var(ENV_MARKET_TIMEZONE);
    let c = Catalog::load_default().unwrap();
    assert_eq!(c.settings.cache_window_secs, 900, "garbage override ignored");

    env::set_var(ENV_MARKET_TIMEZONE, "Nowhere/Atlantis");
    assert!(Catalog::load_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_sentinel_reads_morningstar_key() {
    let s = Settings::default();

    env::set_var(ENV_MORNINGSTAR_API_KEY, "secret-key");
    assert_eq!(s.morningstar_api_key(), "secret-key");

    env::remove_var(ENV_MORNINGSTAR_API_KEY);
    assert_eq!(s.morningstar_api_key(), "");
}
