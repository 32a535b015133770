use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pagesmith::rendering::RasterRequest;
use pagesmith::{Assembler, EditorSession, HtmlSurface, RenderSurface, Target, Viewport};

fn bench_assemble(c: &mut Criterion) {
    let session = EditorSession::with_starter();
    let assembler = Assembler::default();

    c.bench_function("assemble_preview", |b| {
        b.iter(|| black_box(session.assemble(&assembler, Target::Preview)))
    });
    c.bench_function("assemble_export", |b| {
        b.iter(|| black_box(session.assemble(&assembler, Target::Export)))
    });
}

fn bench_rasterize(c: &mut Criterion) {
    let session = EditorSession::with_starter();
    let mut surface = HtmlSurface::new(Viewport::default());
    surface.replace_document(session.assemble(&Assembler::default(), Target::Preview));
    let request = RasterRequest::new(2.0, [255, 255, 255, 255]);

    c.bench_function("rasterize_starter", |b| {
        b.iter(|| black_box(surface.rasterize(&request).unwrap()))
    });
}

criterion_group!(benches, bench_assemble, bench_rasterize);
criterion_main!(benches);
