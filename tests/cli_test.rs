use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const TEXT: &str = "I am Sam. Sam I am. I do not like this Sam I am.\n";

#[test]
fn roundtrip_through_files() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let txt_path = temp_dir.path().join("fable.txt");
    let lzw_path = temp_dir.path().join("fable.lzw");
    let out_path = temp_dir.path().join("fable_expanded.txt");
    std::fs::write(&txt_path,TEXT)?;
    let mut cmd = Command::cargo_bin("lzwpack")?;
    cmd.arg("compress")
        .arg("-i").arg(&txt_path)
        .arg("-o").arg(&lzw_path)
        .assert()
        .success();
    let mut cmd = Command::cargo_bin("lzwpack")?;
    cmd.arg("expand")
        .arg("-i").arg(&lzw_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();
    assert_eq!(std::fs::read(&out_path)?,TEXT.as_bytes());
    Ok(())
}

#[test]
fn compression_matches_reference() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let txt_path = temp_dir.path().join("pattern.txt");
    let lzw_path = temp_dir.path().join("pattern.lzw");
    std::fs::write(&txt_path,"ABABABA")?;
    let mut cmd = Command::cargo_bin("lzwpack")?;
    cmd.arg("compress")
        .arg("-i").arg(&txt_path)
        .arg("-o").arg(&lzw_path)
        .assert()
        .success();
    assert_eq!(std::fs::read(&lzw_path)?,vec![0x20,0x90,0xA0,0x50,0x48,0x08]);
    Ok(())
}

#[test]
fn default_output_naming() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let txt_path = temp_dir.path().join("fable.txt");
    std::fs::write(&txt_path,TEXT)?;
    let mut cmd = Command::cargo_bin("lzwpack")?;
    cmd.arg("compress")
        .arg("-i").arg(&txt_path)
        .assert()
        .success();
    let lzw_path = temp_dir.path().join("fable.lzw");
    assert!(lzw_path.exists());
    // expand the compressed copy from a fresh directory so the default
    // output name does not collide with the original
    let other_dir = tempfile::tempdir()?;
    let moved_path = other_dir.path().join("fable.lzw");
    std::fs::copy(&lzw_path,&moved_path)?;
    let mut cmd = Command::cargo_bin("lzwpack")?;
    cmd.arg("expand")
        .arg("-i").arg(&moved_path)
        .assert()
        .success();
    assert_eq!(std::fs::read(other_dir.path().join("fable.txt"))?,TEXT.as_bytes());
    Ok(())
}

#[test]
fn missing_input_file() -> STDRESULT {
    let mut cmd = Command::cargo_bin("lzwpack")?;
    cmd.arg("compress")
        .arg("-i").arg("no_such_file.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}
