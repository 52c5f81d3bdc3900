//! Runs with the default config, whose workspace root is the current
//! directory. Kept in its own test binary since it changes the process cwd.

mod common;

use common::{names, FakeToolchain};
use gocell_coder::{Coder, CoderConfig};
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_root_from_current_dir() {
    let cwd = TempDir::new().unwrap();
    env::set_current_dir(cwd.path()).unwrap();
    let here = env::current_dir().unwrap();

    let toolchain = FakeToolchain::default();
    let config = CoderConfig {
        probe_external: false,
        ..CoderConfig::default()
    };
    let mut coder = Coder::with_toolchain(config, toolchain.clone()).unwrap();
    let dir = coder.workspace().dir().to_path_buf();
    assert!(dir.is_absolute());
    assert!(dir.starts_with(here.join(".gocell")));

    let session = fs::read_to_string(dir.join("session.go")).unwrap();
    let store = serde_json::to_string(&dir.join("store").to_string_lossy()).unwrap();
    assert!(session.contains(&format!("StoreDir = {}", store)));

    assert_eq!(coder.input_and_run("a := 1").unwrap(), "");
    assert_eq!(names(&coder), vec!["a"]);
    assert!(dir.join("store").join("var-a.type").exists());

    toolchain.then_ok("1");
    assert_eq!(coder.input_and_run("a").unwrap(), "1");
    assert!(toolchain.mains().iter().all(|m| m.is_absolute()));
}
