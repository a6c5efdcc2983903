//! Benchmark for binding lookups and orphan classification
//!
//! Synthetic inventory sized like a busy ODF cluster: 5K PVs, 10K images.

use ceph_orphan_audit::classification::classify_inventory;
use ceph_orphan_audit::domain::ports::VolumeListing;
use ceph_orphan_audit::domain::records::{BucketRecord, ImageRecord};
use ceph_orphan_audit::inventory::BindingMap;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

const POOL: &str = "ocs-storagecluster-cephblockpool";

fn volumes(count: usize) -> Vec<VolumeListing> {
    (0..count)
        .map(|i| VolumeListing {
            name: format!("pvc-{:05}", i),
            driver: Some("openshift-storage.rbd.csi.ceph.com".into()),
            volume_handle: Some(format!(
                "0001-0011-openshift-storage-0000000000000001-{}-csi-vol-{:05}",
                POOL, i
            )),
            image_name: Some(format!("csi-vol-{:05}", i)),
            claim_namespace: Some("app".into()),
            claim_name: Some(format!("data-{}", i)),
            ..Default::default()
        })
        .collect()
}

fn images(map: &BindingMap, count: usize) -> Vec<ImageRecord> {
    (0..count)
        .map(|i| {
            let name = format!("csi-vol-{:05}", i);
            let bindings = map.image_bindings(POOL, &name);
            ImageRecord {
                pool: POOL.into(),
                has_binding: !bindings.is_empty(),
                looks_like_test_artifact: i % 50 == 0,
                bindings,
                name,
                size_bytes: 1 << 30,
                size_resolved: true,
                watcher_count: (i % 3 == 0) as u32,
                status_resolved: true,
                detail_errors: Vec::new(),
            }
        })
        .collect()
}

fn buckets(count: usize) -> Vec<BucketRecord> {
    (0..count)
        .map(|i| BucketRecord {
            name: format!("bucket-{:04}", i),
            owner: "owner".into(),
            object_count: 100,
            size_bytes: 1 << 20,
            stats_resolved: true,
            has_binding: i % 2 == 0,
            logging_related: i % 10 == 0,
            bindings: Vec::new(),
        })
        .collect()
}

fn bench_binding_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("binding_map");
    let map = BindingMap::from_listings(&volumes(5_000), &[], &[], &[], &[]);
    group.throughput(Throughput::Elements(1));

    group.bench_function("image_bindings", |b| {
        let mut counter = 0usize;
        b.iter(|| {
            counter += 1;
            let name = format!("csi-vol-{:05}", counter % 10_000);
            black_box(map.image_bindings(POOL, black_box(&name)));
        });
    });

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");
    let map = BindingMap::from_listings(&volumes(5_000), &[], &[], &[], &[]);
    let images = images(&map, 10_000);
    let buckets = buckets(1_000);
    group.throughput(Throughput::Elements((images.len() + buckets.len()) as u64));

    group.bench_function("classify_inventory", |b| {
        b.iter(|| black_box(classify_inventory(black_box(&images), black_box(&buckets), &[])));
    });

    group.finish();
}

criterion_group!(benches, bench_binding_lookup, bench_classify);
criterion_main!(benches);
