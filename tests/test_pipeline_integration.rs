//! End-to-end runs of the armadillo-prep binary on a small synthetic reference.
//! PATH is cleared for the child process so no external tool is found:
//! indexing failures must be tolerated, a failing search must not.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn get_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_armadillo-prep"))
}

fn run_prep(work_dir: &Path, args: &[&str]) -> std::io::Result<Output> {
    Command::new(get_binary())
        .current_dir(work_dir)
        .env("PATH", "")
        .args(args)
        .output()
}

/// Deterministic pseudo-random sequence so windows never look alike by accident
fn synthetic_sequence(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            b"ACGT"[(state >> 62) as usize]
        })
        .collect()
}

fn write_reference(work_dir: &Path) -> Vec<u8> {
    let chr1 = synthetic_sequence(5000, 7);
    let mut file = File::create(work_dir.join("ref.fa")).unwrap();
    writeln!(file, ">chr1").unwrap();
    for line in chr1.chunks(60) {
        file.write_all(line).unwrap();
        writeln!(file).unwrap();
    }
    writeln!(file, ">chr2").unwrap();
    writeln!(file, "{}", String::from_utf8(synthetic_sequence(600, 11)).unwrap()).unwrap();
    chr1
}

fn blast8(query: &str, target: &str, identity: f64, aln_len: usize, t_start: usize, t_end: usize) -> String {
    format!("{query}\t{target}\t{identity:.2}\t{aln_len}\t0\t0\t1\t{aln_len}\t{t_start}\t{t_end}\t1e-100\t400")
}

fn archive_entries(path: &Path) -> Vec<String> {
    let mut entries: Vec<String> = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()))
        .entries()
        .unwrap()
        .map(|e| {
            e.unwrap()
                .path()
                .unwrap()
                .to_string_lossy()
                .trim_end_matches('/')
                .to_string()
        })
        .collect();
    entries.sort();
    entries
}

#[test]
fn test_duplicates_collapse_to_one_window() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path();
    let chr1 = write_reference(work_dir);

    let hits = [
        // A and B list each other
        blast8("chr1:1001-1200_200", "chr1", 100.0, 200, 1001, 1200),
        blast8("chr1:1001-1200_200", "chr1", 96.5, 198, 3200, 3001),
        blast8("chr1:3001-3200_200", "chr1", 100.0, 200, 3001, 3200),
        blast8("chr1:3001-3200_200", "chr1", 96.5, 198, 1200, 1001),
        // Only one copy passes the identity threshold
        blast8("chr2:101-300_200", "chr2", 100.0, 200, 101, 300),
        blast8("chr2:101-300_200", "chr1", 85.0, 200, 4001, 4200),
        // Too short to be considered at all
        blast8("chr1:2001-2050_50", "chr1", 100.0, 50, 2001, 2050),
        blast8("chr1:2001-2050_50", "chr2", 100.0, 50, 1, 50),
    ]
    .join("\n");
    fs::write(work_dir.join("hits.blast8"), hits)?;

    let output = run_prep(
        work_dir,
        &["-g", "ref.fa", "-i", "hits.blast8", "-o", "out", "-v", "1"],
    )?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "run failed: {stderr}");
    assert!(stderr.contains("Removed chr1:3001-3200. Duplicate of: chr1:1001-1200"));

    let out = work_dir.join("out");
    assert_eq!(fs::read_to_string(out.join("rois"))?, "chr1:1001-1200\n");
    assert!(!out.join("miniFASTA").join("chr1:3001-3200.fa").exists());

    let window = fs::read_to_string(out.join("miniFASTA").join("chr1:1001-1200.fa"))?;
    let expected = format!(
        ">chr1:901-1300\n{}\n",
        String::from_utf8(chr1[900..1300].to_vec()).unwrap()
    );
    assert_eq!(window, expected);
    assert_eq!(
        fs::read_to_string(out.join("armadillo_reference_genome.fa"))?,
        expected
    );
    assert_eq!(
        fs::read_to_string(out.join("rois_copies_coords").join("chr1:1001-1200"))?,
        "chr1:1001-1200\nchr1:3001-3200\n"
    );

    let entries = archive_entries(&work_dir.join("out.tar.gz"));
    assert!(entries.contains(&"out/miniFASTA/chr1:1001-1200.fa".to_string()));
    assert!(entries.contains(&"out/rois".to_string()));

    Ok(())
}

#[test]
fn test_window_clamped_at_chromosome_start() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path();
    write_reference(work_dir);

    let hits = [
        blast8("chr1:41-240_200", "chr1", 100.0, 200, 41, 240),
        blast8("chr1:41-240_200", "chr2", 99.0, 200, 400, 201),
    ]
    .join("\n");
    fs::write(work_dir.join("hits.blast8"), hits)?;

    let output = run_prep(work_dir, &["-g", "ref.fa", "-i", "hits.blast8", "-o", "out"])?;
    assert!(output.status.success());

    let window = fs::read_to_string(work_dir.join("out/miniFASTA/chr1:41-240.fa"))?;
    let mut lines = window.lines();
    assert_eq!(lines.next(), Some(">chr1:1-340"));
    assert_eq!(lines.next().map(str::len), Some(340));

    Ok(())
}

#[test]
fn test_empty_hits_file() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path();
    write_reference(work_dir);
    fs::write(work_dir.join("hits.blast8"), "")?;

    let output = run_prep(work_dir, &["-g", "ref.fa", "-i", "hits.blast8"])?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "run failed: {stderr}");
    assert!(stderr.contains("No region survived filtering"));

    let out = work_dir.join("armadillo_data");
    assert_eq!(fs::read_to_string(out.join("rois"))?, "");
    assert_eq!(fs::read_dir(out.join("miniFASTA"))?.count(), 0);
    assert!(work_dir.join("armadillo_data.tar.gz").exists());

    Ok(())
}

#[test]
fn test_existing_output_directory_aborts() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path();
    write_reference(work_dir);
    fs::write(work_dir.join("hits.blast8"), "")?;
    fs::create_dir(work_dir.join("out"))?;

    let output = run_prep(work_dir, &["-g", "ref.fa", "-i", "hits.blast8", "-o", "out"])?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already exists"));

    Ok(())
}

#[test]
fn test_failing_search_aborts_run() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path();
    write_reference(work_dir);
    fs::write(work_dir.join("rois.txt"), "chr1:1000-1200\nchr1\t3000\t3200\n")?;

    let output = run_prep(work_dir, &["-g", "ref.fa", "-r", "rois.txt", "-o", "out"])?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("blat"));
    assert!(!work_dir.join("out.tar.gz").exists());

    Ok(())
}

#[test]
fn test_empty_roi_file() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path();
    write_reference(work_dir);
    fs::write(work_dir.join("rois.txt"), "")?;

    // blat is not on PATH; with no query to search it must not be needed
    let output = run_prep(work_dir, &["-g", "ref.fa", "-r", "rois.txt", "-o", "out"])?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "run failed: {stderr}");
    assert!(stderr.contains("No region survived filtering"));

    let out = work_dir.join("out");
    assert_eq!(fs::read_to_string(out.join("rois"))?, "");
    assert_eq!(fs::read_dir(out.join("miniFASTA"))?.count(), 0);
    assert!(work_dir.join("out.tar.gz").exists());

    Ok(())
}

#[test]
fn test_hits_and_rois_are_exclusive() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path();

    let output = run_prep(work_dir, &["-g", "ref.fa"])?;
    assert!(!output.status.success());

    let output = run_prep(
        work_dir,
        &["-g", "ref.fa", "-i", "hits.blast8", "-r", "rois.txt"],
    )?;
    assert!(!output.status.success());

    Ok(())
}
