//! End-to-end tests for the devscope binary against exports in a temp project.

use assert_cmd::Command;
use devscope_export::LOCK_FILE;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const EXPORT: &str = "\
Name,DeviceType,OS,InEntra,InIntune,InAD,InSophos,InKACE,Entra_InstanceCount,Sophos_InstanceCount,MultiInstanceFlag,KACE_Machine_RAM_Total
PC-1,Desktop,Windows,True,True,True,True,True,2,1,True,16384 MB
PC-2,Laptop,Windows,1,1,1,1,1,1,3,True,8192
PC-3,Laptop,macOS,true,true,false,false,false,3,0,True,
PC-4,Server,Linux,0,0,1,1,0,1,2,True,
PC-5,Desktop,Windows,False,False,False,False,False,0,0,False,
";

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("DeviceScope_Merged_test.csv"), EXPORT).unwrap();
    tmp
}

fn devscope(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("devscope").unwrap();
    cmd.arg("--root")
        .arg(root)
        .env("XDG_CONFIG_HOME", root.join("xdg"))
        .env("NO_COLOR", "1")
        .env_remove("DEVSCOPE_LOG");
    cmd
}

fn stdout(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn json(cmd: &mut Command) -> serde_json::Value {
    serde_json::from_str(&stdout(cmd.arg("--json"))).unwrap()
}

#[test]
fn test_summary_text() {
    let tmp = project();
    let out = stdout(devscope(tmp.path()).arg("summary"));
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].starts_with("Using file: DeviceScope_Merged_test.csv (last updated "));
    assert_eq!(
        &lines[1..],
        &[
            "Total devices: 11",
            "Devices in all 5 contexts: 5",
            "Multi-instance devices: 4",
        ]
    );
}

#[test]
fn test_summary_json_and_jq() {
    let tmp = project();
    let value = json(devscope(tmp.path()).arg("summary"));
    assert_eq!(value["metrics"]["total_devices"], 11);
    assert_eq!(value["export"]["file"], "DeviceScope_Merged_test.csv");

    let out = stdout(
        devscope(tmp.path())
            .arg("summary")
            .args(["--jq", ".metrics.multi_instance_devices"]),
    );
    assert_eq!(out.trim(), "4");
}

#[test]
fn test_overlap_json() {
    let tmp = project();
    let value = json(devscope(tmp.path()).arg("overlap"));
    // Entra row: Entra diagonal, Intune, AD, Sophos, KACE
    assert_eq!(value["counts"][0], serde_json::json!([6, 6, 3, 5, 3]));
    assert_eq!(value["counts"][1][4], 2);
    assert_eq!(value["cells"].as_array().unwrap().len(), 25);
    assert_eq!(value["cells"][3]["context1"], "entra");
    assert_eq!(value["cells"][3]["context2"], "sophos");
    assert_eq!(value["cells"][3]["device_count"], 5);
}

#[test]
fn test_distribution_text() {
    let tmp = project();
    let out = stdout(devscope(tmp.path()).arg("distribution"));
    assert_eq!(out.trim(), "0 contexts: 1\n2 contexts: 5\n5 contexts: 5");
}

#[test]
fn test_list_filters() {
    let tmp = project();
    let value = json(
        devscope(tmp.path())
            .arg("list")
            .args(["--duplicates", "none", "--field", "Device Name"]),
    );
    assert_eq!(value["columns"], serde_json::json!(["Device Name"]));
    assert_eq!(value["rows"], serde_json::json!([["PC-5"]]));

    let value = json(devscope(tmp.path()).arg("list").args([
        "--context",
        "all-systems",
        "--device-type",
        "Laptop",
        "--field",
        "Device Name",
        "--field",
        "Total Memory (GB)",
    ]));
    assert_eq!(value["rows"], serde_json::json!([["PC-2", "8.00"]]));
}

#[test]
fn test_list_unknown_field_fails() {
    let tmp = project();
    devscope(tmp.path())
        .arg("list")
        .args(["--field", "Shoe Size"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_options() {
    let tmp = project();
    let value = json(devscope(tmp.path()).arg("options"));
    assert_eq!(
        value["device_types"],
        serde_json::json!(["Desktop", "Laptop", "Server"])
    );
    assert_eq!(
        value["operating_systems"],
        serde_json::json!(["Windows", "macOS", "Linux"])
    );
}

#[test]
fn test_show_device() {
    let tmp = project();
    let out = stdout(devscope(tmp.path()).args(["show", "PC-1"]));
    assert!(out.starts_with("Device Overview: PC-1"));
    let memory = out
        .lines()
        .find(|l| l.starts_with("Total Memory (GB)"))
        .unwrap();
    assert!(memory.ends_with("16.00"));

    let names = stdout(devscope(tmp.path()).arg("show"));
    assert_eq!(names.lines().count(), 5);
}

#[test]
fn test_show_missing_device() {
    let tmp = project();
    let output = devscope(tmp.path())
        .args(["show", "PC-404"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No device named `PC-404`"));
}

#[test]
fn test_missing_export_is_a_warning() {
    let tmp = TempDir::new().unwrap();
    let output = devscope(tmp.path()).arg("summary").output().unwrap();
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No device export file found."));
}

#[test]
fn test_explicit_export_path() {
    let tmp = project();
    let other = tmp.path().join("elsewhere.csv");
    let header = EXPORT.lines().next().unwrap();
    std::fs::write(
        &other,
        format!("{header}\nPC-9,Desktop,Windows,1,1,1,1,1,1,1,False,\n"),
    )
    .unwrap();
    let value = json(devscope(tmp.path()).arg("--export").arg(&other).arg("summary"));
    assert_eq!(value["metrics"]["total_devices"], 1);
    assert_eq!(value["export"]["file"], "elsewhere.csv");
}

#[test]
fn test_strict_presence_policy() {
    let tmp = project();
    let header = EXPORT.lines().next().unwrap();
    std::fs::write(
        tmp.path().join("data/DeviceScope_Merged_test.csv"),
        format!("{header}\nPC-1,Desktop,Windows,yes,1,1,1,1,1,1,False,\n"),
    )
    .unwrap();

    let lenient = json(devscope(tmp.path()).arg("summary"));
    assert_eq!(lenient["metrics"]["devices_in_all_contexts"], 1);

    let output = devscope(tmp.path())
        .args(["--presence", "strict", "summary"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("InEntra"));
}

#[test]
fn test_project_config_export_dir() {
    let tmp = project();
    std::fs::create_dir_all(tmp.path().join(".devscope")).unwrap();
    std::fs::write(
        tmp.path().join(".devscope/config.toml"),
        "[export]\ndir = \"empty\"\n",
    )
    .unwrap();
    let output = devscope(tmp.path()).arg("summary").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No device export file found."));
}

#[test]
fn test_dashboard_watch_iterations() {
    let tmp = project();
    let out = stdout(devscope(tmp.path()).args([
        "dashboard",
        "--watch",
        "0",
        "--iterations",
        "2",
        "--json",
    ]));
    let renders: Vec<serde_json::Value> = out
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(renders.len(), 2);
    assert_eq!(renders[1]["metrics"]["total_devices"], 11);
    assert_eq!(renders[1]["distribution"]["buckets"][1]["device_count"], 5);
}

#[test]
fn test_schema_flag() {
    let tmp = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("devscope").unwrap();
    let out = stdout(cmd.arg("--schema").current_dir(tmp.path()));
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["config_path"], ".devscope/config.toml");
    assert!(value["schema"]["properties"]["refresh"].is_object());
}

#[cfg(unix)]
fn write_refresh_config(root: &Path, script: &str) {
    std::fs::write(root.join("export.sh"), script).unwrap();
    std::fs::create_dir_all(root.join(".devscope")).unwrap();
    std::fs::write(
        root.join(".devscope/config.toml"),
        "[refresh]\ncommand = [\"sh\"]\nscript = \"export.sh\"\ntimeout_secs = 0\n",
    )
    .unwrap();
}

#[cfg(unix)]
#[test]
fn test_refresh_finds_new_export() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("data")).unwrap();
    let target = tmp.path().join("data/DeviceScope_Merged_new.csv");
    write_refresh_config(tmp.path(), &write_export_script(&target, 0));

    let out = stdout(devscope(tmp.path()).arg("refresh"));
    assert!(out.starts_with("Loaded: DeviceScope_Merged_new.csv (last updated "));
    assert!(!tmp.path().join("data").join(LOCK_FILE).exists());
}

/// Shell script that waits `delay` seconds, then writes a one-device export.
#[cfg(unix)]
fn write_export_script(target: &Path, delay: u64) -> String {
    let header = EXPORT.lines().next().unwrap();
    format!(
        "sleep {delay}\nprintf '%s\\n' '{header}' 'PC-1,Desktop,Windows,1,1,1,1,1,1,1,False,' > '{}'\n",
        target.display()
    )
}

#[cfg(unix)]
#[test]
fn test_concurrent_refresh_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    write_refresh_config(
        tmp.path(),
        &write_export_script(&data.join("DeviceScope_Merged_new.csv"), 1),
    );

    let first = std::process::Command::new(assert_cmd::cargo::cargo_bin("devscope"))
        .arg("--root")
        .arg(tmp.path())
        .arg("refresh")
        .env("XDG_CONFIG_HOME", tmp.path().join("xdg"))
        .env("NO_COLOR", "1")
        .env_remove("DEVSCOPE_LOG")
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .unwrap();

    let lock = data.join(LOCK_FILE);
    let deadline = Instant::now() + Duration::from_secs(10);
    while !lock.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(lock.exists(), "first refresh never took the lock");

    let second = devscope(tmp.path()).arg("refresh").output().unwrap();
    assert_eq!(second.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&second.stderr).contains("already running"));

    let first = first.wait_with_output().unwrap();
    assert!(
        first.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&first.stderr)
    );
    assert!(String::from_utf8_lossy(&first.stdout).starts_with("Loaded: DeviceScope_Merged_new.csv"));
    assert!(!lock.exists());
}

#[cfg(unix)]
#[test]
fn test_refresh_script_failure() {
    let tmp = TempDir::new().unwrap();
    write_refresh_config(tmp.path(), "echo 'cannot reach tenant' >&2\nexit 2\n");

    let output = devscope(tmp.path()).arg("refresh").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("refresh failed"));
    assert!(stderr.contains("cannot reach tenant"));
}
