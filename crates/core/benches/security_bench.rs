#[path = "../tests/common/mod.rs"]
mod common;

use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use pdfsec_core::security::keys::{compute_file_key_r2_r4, hardened_hash_r6};
use pdfsec_core::security::verify::check_password;
use pdfsec_core::security::{
    CryptMethod, EncryptDescriptor, FileKey, SecurityOptions, Version, derive_object_key,
};

use common::{AesParams, DOC_ID, Md5Params, aes256_encrypt_dict, md5_encrypt_dict};

fn md5_descriptor(r: i64) -> EncryptDescriptor {
    let params = Md5Params {
        v: if r == 2 { 1 } else { 2 },
        r,
        length: Some(128),
        user: b"bench",
        owner: b"owner",
        ..Md5Params::default()
    };
    EncryptDescriptor::classify(&md5_encrypt_dict(&params, &DOC_ID)).expect("valid dictionary")
}

fn bench_key_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_derivation");
    for r in [2i64, 3] {
        let descriptor = md5_descriptor(r);
        group.bench_with_input(BenchmarkId::new("file_key", r), &descriptor, |b, d| {
            b.iter(|| compute_file_key_r2_r4(black_box(b"bench"), d, &DOC_ID));
        });
    }
    group.bench_function("hardened_hash_r6", |b| {
        b.iter(|| hardened_hash_r6(black_box(b"password"), b"saltsalt", &[]));
    });
    group.finish();
}

fn bench_password_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("password_check");
    group.measurement_time(Duration::from_secs(10));
    let options = SecurityOptions::default();

    for r in [2i64, 3] {
        let descriptor = md5_descriptor(r);
        group.bench_with_input(BenchmarkId::new("owner", r), &descriptor, |b, d| {
            b.iter(|| check_password(d, &DOC_ID, black_box(b"owner"), &options));
        });
    }

    let r6 = EncryptDescriptor::classify(&aes256_encrypt_dict(&AesParams::default()))
        .expect("valid dictionary");
    group.bench_function("user_r6", |b| {
        b.iter(|| check_password(&r6, &[], black_box(b"user"), &options));
    });
    group.finish();
}

fn bench_object_keys(c: &mut Criterion) {
    let file_key = FileKey::new([7u8; 16]);
    c.bench_function("object_key_aesv2", |b| {
        let mut objid = 0u32;
        b.iter(|| {
            objid = objid.wrapping_add(1);
            derive_object_key(&file_key, black_box(objid), 0, CryptMethod::AesV2, Version::V4)
        });
    });
}

criterion_group!(
    benches,
    bench_key_derivation,
    bench_password_check,
    bench_object_keys
);
criterion_main!(benches);
