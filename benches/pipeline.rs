use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sheetstream::{
    CellValue, CollectListener, FieldMapping, FieldType, FieldValue, Record, Result, Schema,
    SheetHandle, SheetReader, SheetWriter,
};
use std::sync::OnceLock;
use tempfile::NamedTempFile;

#[derive(Clone)]
struct BenchRow {
    id: i64,
    name: String,
    value: f64,
}

impl Record for BenchRow {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("BenchRow")
                .field(FieldMapping::new("id", FieldType::I64))
                .field(FieldMapping::new("name", FieldType::Text))
                .field(FieldMapping::new("value", FieldType::F64))
                .build()
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![self.id.into(), self.name.as_str().into(), self.value.into()]
    }

    fn from_fields(fields: Vec<FieldValue>) -> Result<Self> {
        let mut it = fields.into_iter();
        Ok(BenchRow {
            id: it.next().and_then(|f| f.as_i64()).unwrap_or_default(),
            name: it
                .next()
                .and_then(|f| f.as_str().map(String::from))
                .unwrap_or_default(),
            value: it.next().and_then(|f| f.as_f64()).unwrap_or_default(),
        })
    }
}

fn rows(count: usize) -> Vec<BenchRow> {
    (0..count)
        .map(|i| BenchRow {
            id: i as i64,
            name: format!("Name_{}", i),
            value: i as f64 * 100.0,
        })
        .collect()
}

fn benchmark_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    group.sample_size(10);

    for size in [100, 1000, 10000].iter() {
        let data = rows(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let temp = NamedTempFile::with_suffix(".xlsx").unwrap();
                let mut writer = SheetWriter::create(temp.path()).unwrap();
                writer.write(&data, &SheetHandle::new("Bench")).unwrap();
                writer.finish().unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    group.sample_size(10);

    for size in [1000, 10000].iter() {
        let temp = NamedTempFile::with_suffix(".xlsx").unwrap();
        {
            let mut writer = SheetWriter::create(temp.path()).unwrap();
            writer.write(&rows(*size), &SheetHandle::new("Bench")).unwrap();
            writer.finish().unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut reader = SheetReader::open(temp.path()).unwrap();
                let mut listener = CollectListener::<BenchRow>::new();
                reader.sheet(0).read_with(&mut listener).unwrap();
                black_box(listener.rows().len());
            });
        });
    }

    group.finish();
}

fn benchmark_untyped_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_rows");
    group.sample_size(10);

    let data: Vec<Vec<CellValue>> = (0..1000)
        .map(|i| {
            vec![
                CellValue::from(i as i64),
                CellValue::from(format!("Name_{}", i)),
            ]
        })
        .collect();

    group.bench_function("1000", |b| {
        b.iter(|| {
            let temp = NamedTempFile::with_suffix(".xlsx").unwrap();
            let mut writer = SheetWriter::create(temp.path()).unwrap();
            writer
                .write_rows(&data, &SheetHandle::new("Bench"))
                .unwrap();
            writer.finish().unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_write,
    benchmark_read,
    benchmark_untyped_write
);
criterion_main!(benches);
