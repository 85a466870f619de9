use std::{env, fs, path::Path, path::PathBuf, process::Command};

fn run_bin(args: &[&str]) {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_hotspot"));

    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command");

    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );
}

fn write_config(test_dir: &Path, run_type: &str) {
    let config_contents = String::new()
        + "[model]\n"
        + "n = 300\n"
        + "disease_length = 1\n"
        + "r0 = 2.5\n"
        + "hotspot_fraction = 0.5\n"
        + "risk_mean = 0.25\n"
        + "risk_variance = \"medium\"\n"
        + "\n"
        + "[run]\n"
        + &format!("run_type = \"{run_type}\"\n")
        + "trials = 8\n"
        + "detail = true\n"
        + "seed = 1234\n"
        + "\n"
        + "[sweep]\n"
        + "r0_end = 2.0\n"
        + "r0_step = 1.0\n"
        + "hotspot_fractions = [ 0.0, 0.5,]\n"
        + "risk_means = [ 0.25,]\n"
        + "risk_variances = [ \"low\", \"high\",]\n";

    fs::write(test_dir.join("config.toml"), config_contents).expect("failed to write config file");
}

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    for run_type in ["simulation", "difeq", "difference"] {
        write_config(&test_dir, run_type);
        run_bin(&["--sim-dir", test_dir_str, "run"]);
    }
    run_bin(&["--sim-dir", test_dir_str, "sweep"]);

    for run_idx in 0..4 {
        assert!(test_dir.join(format!("run-{run_idx:04}")).is_dir());
    }

    run_bin(&["--sim-dir", test_dir_str, "analyze"]);
    for run_idx in 0..4 {
        assert!(
            test_dir
                .join(format!("run-{run_idx:04}"))
                .join("results.msgpack")
                .is_file()
        );
    }

    run_bin(&["--sim-dir", test_dir_str, "clean"]);
    assert!(!test_dir.join("run-0000").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn difference_rejects_longer_disease() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("difference_rejects");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    write_config(&test_dir, "difference");
    let config_path = test_dir.join("config.toml");
    let contents = fs::read_to_string(&config_path).expect("failed to read config file");
    fs::write(&config_path, contents.replace("disease_length = 1", "disease_length = 2"))
        .expect("failed to write config file");

    let output = Command::new(env!("CARGO_BIN_EXE_hotspot"))
        .args(["--sim-dir", test_dir.to_str().expect("invalid path"), "run"])
        .output()
        .expect("failed to execute command");
    assert!(!output.status.success());

    fs::remove_dir_all(&test_dir).ok();
}
