use arcanea_dsl::{parse, pretty_print, scan};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const ARC_LIBRARY: &str = r#"
@archetype Sage :: "Seeker of hidden truths"

@spell Ignite
  @description "Kindle a creative spark"
  @archetypes [creative, fire]
  @parameters { "element": "fire", "intensity": 3, "tags": ["spark", "forge"] }
  @implementation "Write about ${element} at intensity ${intensity}"

@character Aria
  @archetype Sage
  @elements [water, void]
  @data { "age": 27, "home": "Tidehold", "traits": { "calm": true } }
  @relationships [{ "with": "Kai", "kind": "rival" }]
  @arc_spells [
    @spell Tidecall
      @implementation "Call the tide"
  ]

@world Aether
  @cosmology { "suns": 2, "moons": ["Vel", "Ora"] }
  @cultures [{ "name": "Tidefolk" }, { "name": "Emberkin" }]
  @history ["The Sundering"]
"#;

fn bench_scan(c: &mut Criterion) {
    c.bench_function("dsl/scan_library", |b| {
        b.iter(|| {
            let tokens = scan(black_box(ARC_LIBRARY)).expect("scan .arc");
            black_box(tokens.len());
        });
    });
}

fn bench_parse_print(c: &mut Criterion) {
    c.bench_function("dsl/parse_print_library", |b| {
        b.iter(|| {
            let program = parse(black_box(ARC_LIBRARY)).expect("parse .arc");
            black_box(pretty_print(&program.declarations).len());
        });
    });
}

criterion_group!(benches, bench_scan, bench_parse_print);
criterion_main!(benches);
