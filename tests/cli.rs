use std::error::Error;
use std::fs;
use std::process::{Command, Output};
use tempfile::tempdir;

fn splitstitch_command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_splitstitch"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(args: &[&str]) -> Result<Output, Box<dyn Error>> {
    Ok(splitstitch_command().args(args).output()?)
}

#[test]
fn cli_split_then_stitch() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("archive.tar");
    let manifest = dir.path().join("archive.tar.manifest");
    let data: Vec<u8> = (0..(2 * 1024 * 1024 + 512)).map(|i| (i % 253) as u8).collect();
    fs::write(&input, &data)?;

    let split = run(&["split", input.to_str().unwrap(), "1"])?;
    assert!(
        split.status.success(),
        "split command failed: {}",
        String::from_utf8_lossy(&split.stderr)
    );
    let stdout = String::from_utf8(split.stdout)?;
    assert!(stdout.contains("into 3 parts"), "unexpected output: {}", stdout);
    let split_log = String::from_utf8_lossy(&split.stderr);
    for stage in ["hash", "write_parts", "write_manifest"] {
        assert!(split_log.contains(stage), "missing stage {}: {}", stage, split_log);
    }
    assert!(manifest.exists());
    for i in 0..3 {
        assert!(dir.path().join(format!("archive.tar.part{:04}", i)).exists());
    }

    let verify = run(&["verify", manifest.to_str().unwrap()])?;
    assert!(
        verify.status.success(),
        "verify command failed: {}",
        String::from_utf8_lossy(&verify.stderr)
    );
    assert!(String::from_utf8(verify.stdout)?.starts_with("OK: 3 parts"));

    fs::remove_file(&input)?;
    let stitch = run(&["stitch", manifest.to_str().unwrap()])?;
    assert!(
        stitch.status.success(),
        "stitch command failed: {}",
        String::from_utf8_lossy(&stitch.stderr)
    );
    assert_eq!(fs::read(&input)?, data, "stitched data must match input");
    assert!(!dir.path().join("archive.tar.part0000").exists());

    // Stage markers go to stderr, not stdout
    let stderr = String::from_utf8_lossy(&stitch.stderr);
    assert!(stderr.contains("verify"), "missing stage markers: {}", stderr);

    Ok(())
}

#[test]
fn cli_stitch_fails_on_corrupt_part() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("data.bin");
    let manifest = dir.path().join("data.bin.manifest");
    fs::write(&input, b"short file, one part")?;

    let split = run(&["split", input.to_str().unwrap()])?;
    assert!(split.status.success());

    let part = dir.path().join("data.bin.part0000");
    fs::write(&part, b"short file, one pArt")?;

    let stitch = run(&["stitch", manifest.to_str().unwrap()])?;
    assert!(!stitch.status.success(), "corrupt stitch must fail");
    assert!(String::from_utf8_lossy(&stitch.stderr).contains("Digest mismatch"));
    assert_eq!(fs::read(&input)?, b"short file, one part");
    assert!(part.exists());
    Ok(())
}

#[test]
fn cli_rejects_zero_part_size() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("data.bin");
    fs::write(&input, b"payload")?;

    let split = run(&["split", input.to_str().unwrap(), "0"])?;
    assert!(!split.status.success());
    assert!(!dir.path().join("data.bin.part0000").exists());
    Ok(())
}

#[test]
fn cli_missing_manifest_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let stitch = run(&["stitch", dir.path().join("nothing.manifest").to_str().unwrap()])?;
    assert!(!stitch.status.success());
    assert!(String::from_utf8_lossy(&stitch.stderr).contains("Error:"));
    Ok(())
}

#[test]
fn cli_info_json() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("data.bin");
    let manifest = dir.path().join("data.bin.manifest");
    fs::write(&input, b"info payload")?;
    assert!(run(&["split", input.to_str().unwrap()])?.status.success());

    let info = run(&["info", "--json", manifest.to_str().unwrap()])?;
    assert!(info.status.success());
    let value: serde_json::Value = serde_json::from_slice(&info.stdout)?;
    assert_eq!(value["manifest"]["parts"], 1);
    assert_eq!(value["manifest"]["total_size"], 12);
    assert_eq!(value["parts"][0]["size"], 12);
    Ok(())
}

#[test]
fn version_flag_prints_build_information() {
    let output = splitstitch_command()
        .arg("--version")
        .output()
        .expect("failed to run splitstitch binary");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.starts_with("splitstitch "),
        "unexpected version line: {}",
        stdout
    );
    assert!(stdout.contains("build"), "version output should include build value: {}", stdout);
}

#[test]
fn running_without_subcommand_displays_help() {
    let output = splitstitch_command()
        .output()
        .expect("failed to run splitstitch binary");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage: splitstitch"), "help output missing usage: {}", stdout);
    assert!(stdout.contains("Commands:"), "help output missing command list: {}", stdout);
}
