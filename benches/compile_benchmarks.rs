//! Performance benchmarks for compiling units.
//!
//! Workloads are generated declarations rather than source text:
//! - Size-based: units of 1 to 200 classes with a fixed method mix
//! - Feature-specific: arithmetic, concatenation, loops, overloads,
//!   tail calls and enumerations in isolation
//!
//! ## Profiling with Puffin
//!
//! Run with the `profile-with-puffin` feature to collect per-phase timings:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use kiln::prelude::*;
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
use std::collections::HashMap;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

/// Initialize puffin profiler.
#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

/// Call at the end of each benchmark iteration to flush profiling data.
#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Print the average time of every top-level scope across recorded frames.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;

    let Some(frame_view) = FRAME_VIEW.get() else {
        println!("Profiler not initialized");
        return;
    };
    let view = frame_view.lock();
    let scope_collection = view.scope_collection();

    let mut scope_timings: HashMap<String, i64> = HashMap::new();
    let mut frame_count = 0i64;
    for frame in view.recent_frames() {
        frame_count += 1;
        let Ok(unpacked) = frame.unpacked() else { continue };
        for (_thread_info, stream_info) in unpacked.thread_streams.iter() {
            let Ok(scopes) = Reader::from_start(&stream_info.stream).read_top_scopes() else {
                continue;
            };
            for scope in scopes {
                if let Some(details) = scope_collection.fetch_by_id(&scope.id) {
                    *scope_timings.entry(details.name().to_string()).or_insert(0) += scope.record.duration_ns;
                }
            }
        }
    }

    println!("\n=== Profiling Summary ({} frames) ===", frame_count);
    let mut entries: Vec<_> = scope_timings.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, ns) in entries {
        let avg_ns = if frame_count > 0 { ns / frame_count } else { ns };
        println!("  {:30} {:>10.2?} avg", name, std::time::Duration::from_nanos(avg_ns as u64));
    }
    println!("=====================================\n");
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

// =============================================================================
// Workloads
// =============================================================================

fn static_method(name: &str, parameters: Vec<Parameter>, return_type: Type) -> MethodDecl {
    MethodDecl::new(name, parameters, return_type).with_flags(MemberFlags::PUBLIC | MemberFlags::STATIC)
}

/// `x * 2.0 + x / 3.0 - 1.0`
fn arithmetic_method() -> MethodDecl {
    let x = || Expression::var("x");
    let body = Expression::sub(
        Expression::add(
            Expression::binary(BinaryOp::Mul, x(), Expression::number(2.0)),
            Expression::binary(BinaryOp::Div, x(), Expression::number(3.0)),
        ),
        Expression::number(1.0),
    );
    static_method("arith", vec![Parameter::new("x", Type::DOUBLE)], Type::DOUBLE)
        .with_body(vec![Statement::ret(body)])
}

/// `"n=" + n + ", half=" + n / 2`
fn concat_method() -> MethodDecl {
    let n = || Expression::var("n");
    let body = Expression::add(
        Expression::add(Expression::add(Expression::string("n="), n()), Expression::string(", half=")),
        Expression::binary(BinaryOp::Div, n(), Expression::int(2)),
    );
    static_method("describe", vec![Parameter::new("n", Type::INT)], Type::string())
        .with_body(vec![Statement::ret(body)])
}

/// Sums `0..n` in a `for` loop.
fn loop_method() -> MethodDecl {
    static_method("total", vec![Parameter::new("n", Type::INT)], Type::LONG).with_body(vec![
        Statement::var("sum", Some(Type::LONG), Some(Expression::int(0))),
        Statement::for_loop(
            Some(Statement::var("i", Some(Type::INT), Some(Expression::int(0)))),
            Some(Expression::compare(Expression::var("i"), CompareOp::Lt, Expression::var("n"))),
            Some(Expression::increment("i", 1, false)),
            Statement::expr(Expression::assign(
                "sum",
                Expression::add(Expression::var("sum"), Expression::var("i")),
            )),
        ),
        Statement::ret(Expression::var("sum")),
    ])
}

/// Tail-recursive countdown.
fn tail_method() -> MethodDecl {
    let n = || Expression::var("n");
    static_method("count", vec![Parameter::new("n", Type::INT), Parameter::new("acc", Type::INT)], Type::INT)
        .with_body(vec![
            Statement::if_then(
                Expression::compare(n(), CompareOp::Le, Expression::int(0)),
                Statement::ret(Expression::var("acc")),
            ),
            Statement::ret(Expression::call(
                "count",
                vec![Expression::sub(n(), Expression::int(1)), Expression::add(Expression::var("acc"), n())],
            )),
        ])
}

/// Calls into `StringBuilder.append`, which has an overload per kind.
fn overload_method() -> MethodDecl {
    let builder = Type::reference("java.lang.StringBuilder");
    let append = |receiver: Expression, arg: Expression| Expression::call_on(receiver, "append", vec![arg]);
    let chain = append(
        append(
            append(Expression::construct(builder.clone(), vec![]), Expression::int(1)),
            Expression::char('c'),
        ),
        Expression::var("text"),
    );
    static_method("build", vec![Parameter::new("text", Type::string())], builder)
        .with_body(vec![Statement::ret(chain)])
}

fn class_with_mix(index: usize) -> ClassDecl {
    ClassDecl::class(&format!("bench.C{index}"))
        .with_method(arithmetic_method())
        .with_method(concat_method())
        .with_method(loop_method())
        .with_method(tail_method())
        .with_method(overload_method())
}

fn compile(classes: &[ClassDecl]) -> usize {
    let unit = classes.iter().cloned().fold(Unit::new(), Unit::with_class);
    let compiled = unit.compile().unwrap_or_default();
    compiled.iter().map(|c| c.methods.len()).sum()
}

// =============================================================================
// Benchmarks
// =============================================================================

/// Benchmark unit compilation across different unit sizes.
fn size_based_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("unit/class_counts");

    for count in [1usize, 10, 50, 200] {
        let classes: Vec<ClassDecl> = (0..count).map(class_with_mix).collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &classes, |b, classes| {
            b.iter(|| {
                let methods = compile(black_box(classes));
                end_profiling_frame();
                black_box(methods)
            });
        });
    }

    group.finish();
    print_profiling_stats();
}

/// Benchmark individual language features.
fn feature_specific_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("unit/features");

    let features: [(&str, fn() -> MethodDecl); 5] = [
        ("arithmetic", arithmetic_method),
        ("concatenation", concat_method),
        ("for_loop", loop_method),
        ("tail_call", tail_method),
        ("overloads", overload_method),
    ];
    for (name, method) in features {
        let classes = vec![ClassDecl::class("bench.Feature").with_method(method())];
        group.bench_function(name, |b| {
            b.iter(|| {
                let methods = compile(black_box(&classes));
                end_profiling_frame();
                black_box(methods)
            });
        });
    }

    let constants: Vec<String> = (0..64).map(|i| format!("K{i}")).collect();
    let names: Vec<&str> = constants.iter().map(String::as_str).collect();
    let enumeration = vec![
        ClassDecl::enumeration("bench.Keys", &names)
            .with_capabilities(EnumCapabilities::DEFAULT | EnumCapabilities::ORDERED),
    ];
    group.bench_function("enumeration_64", |b| {
        b.iter(|| {
            let methods = compile(black_box(&enumeration));
            end_profiling_frame();
            black_box(methods)
        });
    });

    group.finish();
    print_profiling_stats();
}

criterion_group!(benches, size_based_benchmarks, feature_specific_benchmarks);

criterion_main!(benches);
