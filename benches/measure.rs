use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fluoquant_rs::analysis_pipeline::{
    Calibration, ChannelBuffer, MeasureEngine, Point, Roi, RoiMask, RoiShape, coloc, measure_channel, rasterize,
};

fn generate_channel(id: &str, width: usize, height: usize, phase: usize) -> ChannelBuffer {
    let data = (0..height)
        .flat_map(|y| (0..width).map(move |x| (((x + phase) * 31 + y * 17) % 4096) as u16))
        .collect();
    ChannelBuffer::from_u16(id, width, height, data).unwrap()
}

fn benchmark_measure_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("measure_by_size");

    let sizes = vec![(512, 512, "512x512"), (1024, 1024, "1024x1024"), (2048, 2048, "2048x2048")];

    for (width, height, label) in sizes {
        let channel = generate_channel("ch", width, height, 0);
        let mask = RoiMask::new_full(width, height);

        group.bench_with_input(BenchmarkId::from_parameter(label), &channel, |b, channel| {
            let calibration = Calibration::default();
            b.iter(|| measure_channel(black_box(channel), &mask, &calibration));
        });
    }

    group.finish();
}

fn benchmark_rasterize_shapes(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize_shapes");

    let star: Vec<Point> = (0..10)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::PI / 5.0;
            let r = if i % 2 == 0 { 900.0 } else { 400.0 };
            Point::new(1024.0 + r * angle.cos(), 1024.0 + r * angle.sin())
        })
        .collect();

    let shapes = vec![
        (RoiShape::rectangle(100.0, 100.0, 1800.0, 1800.0), "rectangle"),
        (RoiShape::ellipse(100.0, 100.0, 1800.0, 1800.0), "ellipse"),
        (RoiShape::Polygon(star.clone()), "polygon"),
        (RoiShape::SmoothPolygon(star), "smooth_polygon"),
    ];

    for (shape, label) in shapes {
        group.bench_with_input(BenchmarkId::from_parameter(label), &shape, |b, shape| {
            b.iter(|| rasterize(black_box(shape), 2048, 2048));
        });
    }

    group.finish();
}

fn benchmark_batch_measurement(c: &mut Criterion) {
    let channels = vec![generate_channel("a", 1024, 1024, 0), generate_channel("b", 1024, 1024, 7)];
    let rois: Vec<Roi> = (0..64)
        .map(|i| {
            let x = (i % 8) as f64 * 128.0;
            let y = (i / 8) as f64 * 128.0;
            Roi::new(format!("roi-{}", i), "Cell", RoiShape::ellipse(x, y, 120.0, 120.0))
        })
        .collect();
    let engine = MeasureEngine::default();
    let calibration = Calibration::default();

    c.bench_function("measure_batch_64_rois", |b| {
        b.iter(|| engine.measure_batch(black_box(&rois), &channels, &calibration));
    });
}

fn benchmark_colocalization(c: &mut Criterion) {
    let a = generate_channel("a", 1024, 1024, 0);
    let b = generate_channel("b", 1024, 1024, 3);
    let mask = RoiMask::new_full(1024, 1024);
    let thresholds = coloc::ColocThresholds::new(1000.0, 1000.0);

    c.bench_function("coloc_analyze_1024", |bench| {
        bench.iter(|| coloc::analyze(black_box(&a), &b, &mask, &thresholds));
    });
}

criterion_group!(
    benches,
    benchmark_measure_by_size,
    benchmark_rasterize_shapes,
    benchmark_batch_measurement,
    benchmark_colocalization
);
criterion_main!(benches);
