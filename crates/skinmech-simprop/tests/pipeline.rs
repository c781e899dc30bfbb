use std::fs;
use std::path::Path;

use skinmech_simprop::config::AnalysisConfig;
use skinmech_simprop::run_analysis;

/// Synthetic population: thickness in mm, g1 trending down with ginf.
fn write_population(path: &Path, rows: usize) {
    let mut text = String::new();
    for i in 0..rows {
        let x = i as f64;
        let ginf = 0.3 + 0.2 * (x * 0.37).sin().abs();
        let g1 = 0.6 - 0.8 * ginf + 0.01 * (x * 1.3).cos();
        let g2 = 1.0 - g1 - ginf;
        let thickness = 0.6 + 0.1 * ginf + 0.05 * (x * 0.91).cos();
        let row = [
            0.05 + 0.01 * (x * 1.1).sin(),
            5.0 + (x * 0.7).cos(),
            g1,
            g2,
            ginf,
            0.01 + 0.002 * (x * 0.5).sin(),
            3.0 + 0.5 * (x * 0.8).sin(),
            0.98,
            1.2,
            thickness,
            100.0 + x,
            2.0,
        ];
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        text.push_str(&line.join(","));
        text.push('\n');
    }
    fs::write(path, text).unwrap();
}

fn config(input: &Path) -> AnalysisConfig {
    AnalysisConfig {
        input: input.to_path_buf(),
        max_exponent: 2,
        sample_size: 5,
        greedy_steps: 4,
        make_plots: false,
        ..AnalysisConfig::default()
    }
}

#[test]
fn csv_input_produces_every_table() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("params.csv");
    write_population(&input, 20);

    let summary = run_analysis(&config(&input), &dir.path().join("out")).unwrap();
    let files = &summary.outputs;

    assert_eq!(summary.specimens, 20);
    assert!(files.output_dir.is_dir());

    let simprop = fs::read_to_string(&files.simprop_csv).unwrap();
    let rows: Vec<Vec<f64>> = simprop
        .lines()
        .map(|l| l.split(',').map(|v| v.parse().unwrap()).collect())
        .collect();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.len() == 7));
    // Thickness was rescaled to um; ginf lower level is the floor.
    assert!(rows[0][0] > 100.0);
    assert_eq!(rows[0][6], 0.1);
    for r in &rows {
        assert!((r[4] + r[5] + r[6] - 1.0).abs() < 1e-9);
    }

    let table = fs::read_to_string(&files.simprop_table_csv).unwrap();
    assert_eq!(
        table.lines().next().unwrap(),
        ",thickness,alpha,sylgardh,sylgarde,g1,g2,ginf"
    );

    for path in [&files.rathickg_csv, &files.raindg_csv] {
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 5);
        assert!(text.lines().all(|l| l.split(',').count() == 3));
    }

    let trace = fs::read_to_string(&files.random_trace_csv).unwrap();
    assert_eq!(trace.lines().count(), 3);

    let greedy = fs::read_to_string(&files.greedy_csv).unwrap();
    assert_eq!(greedy.lines().count(), 5);
    assert_eq!(summary.greedy_indices.len(), 4);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&files.summary_json).unwrap()).unwrap();
    assert_eq!(json["specimens"], 20);
    assert!(!files.boxplot_png.exists());
}

#[test]
fn same_seed_gives_same_sample() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("params.csv");
    write_population(&input, 15);
    let cfg = config(&input);

    let a = run_analysis(&cfg, &dir.path().join("a")).unwrap();
    let b = run_analysis(&cfg, &dir.path().join("b")).unwrap();
    assert_eq!(a.best_random_search, b.best_random_search);
    assert_eq!(a.greedy_indices, b.greedy_indices);
}

#[test]
fn wrong_column_count_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("params.csv");
    fs::write(&input, "1,2,3\n4,5,6\n").unwrap();

    assert!(run_analysis(&config(&input), &dir.path().join("out")).is_err());
}

#[test]
fn missing_mat_variable_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("params.mat");
    let mut bytes = Vec::new();
    for field in [0_i32, 1, 1, 0, 2] {
        bytes.extend_from_slice(&field.to_le_bytes());
    }
    bytes.extend_from_slice(b"x\0");
    bytes.extend_from_slice(&1.0_f64.to_le_bytes());
    fs::write(&input, bytes).unwrap();

    let err = run_analysis(&config(&input), &dir.path().join("out")).unwrap_err();
    assert!(format!("{err:#}").contains("qlv2tFixPara"));
}

#[test]
fn too_many_greedy_steps_fail_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("params.csv");
    write_population(&input, 6);
    let cfg = AnalysisConfig {
        greedy_steps: 8,
        ..config(&input)
    };
    let out = dir.path().join("out");

    let err = run_analysis(&cfg, &out).unwrap_err();
    assert!(format!("{err:#}").contains("greedy_steps"));
    assert!(!out.exists());
}
