use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gradientkit_engine::{process, GradientConfig, PipelineOptions, Sampling};
use std::fmt::Write;

/// Square walls with a zig-zag of sparse infill, repeated over `layers`
fn synthetic_gcode(layers: usize) -> String {
    let mut gcode = String::from("; generated by OrcaSlicer 2.1.0\nM83\n");
    for layer in 0..layers {
        let z = 0.2 * (layer + 1) as f64;
        let _ = writeln!(gcode, ";LAYER_CHANGE\n;Z:{:.1}\nG1 Z{:.1} F720", z, z);
        gcode.push_str(";TYPE:Outer wall\nG1 X0 Y0 F3000\n");
        for (x, y) in [(50, 0), (50, 50), (0, 50), (0, 0)] {
            let _ = writeln!(gcode, "G1 X{} Y{} E2.4", x, y);
        }
        gcode.push_str(";TYPE:Sparse infill\nG1 X1 Y1 F6000\n");
        for row in 1..49 {
            let x = if row % 2 == 0 { 1 } else { 49 };
            let _ = writeln!(gcode, "G1 X{} Y{} E2.2", x, row + 1);
        }
    }
    gcode
}

fn bench_pipeline(c: &mut Criterion) {
    let gcode = synthetic_gcode(50);
    let config = GradientConfig::new(vec![0.0, 5.0, 10.0], &[200.0, 120.0, 80.0]).unwrap();

    let midpoint = PipelineOptions::new(config.clone());
    c.bench_function("pipeline_midpoint_50_layers", |b| {
        b.iter(|| process(black_box(&gcode), &midpoint).unwrap())
    });

    let subdivide = PipelineOptions::new(
        config
            .with_sampling(Sampling::Subdivide { length: 2.0 })
            .unwrap(),
    );
    c.bench_function("pipeline_subdivide_50_layers", |b| {
        b.iter(|| process(black_box(&gcode), &subdivide).unwrap())
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
