use std::hint::black_box;
use std::io::Cursor;
use std::net::SocketAddr;

use ::tungstenite::{Message, connect};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};

use ::hijackws::ws::decoder::Decoder;
use ::hijackws::ws::{Frame, encoder, mask};

mod server;

const MSG: &str = unsafe { std::str::from_utf8_unchecked(&[90u8; 256]) };

fn rtt(c: &mut Criterion, name: &str, addr: SocketAddr) {
    let mut group = c.benchmark_group(name);
    group.throughput(Throughput::Bytes(MSG.len() as u64));

    let (mut ws, _) = connect(format!("ws://{addr}")).unwrap();

    group.bench_function(format!("{name}_rtt"), |b| {
        b.iter(|| {
            ws.send(Message::text(MSG)).unwrap();
            if let Message::Text(data) = ws.read().unwrap() {
                black_box(data);
            }
        })
    });

    group.finish();
}

fn hijackws_rtt_benchmark(c: &mut Criterion) {
    rtt(c, "hijackws", server::start_hijackws_on_thread());
}

fn tungstenite_rtt_benchmark(c: &mut Criterion) {
    rtt(c, "tungstenite", server::start_tungstenite_on_thread());
}

fn codec_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(MSG.len() as u64));

    let frame = Frame::text(MSG).with_mask([0x37, 0xfa, 0x21, 0x3d]);
    let encoded = encoder::encode(&frame);
    let decoder = Decoder::new();

    group.bench_function("encode_masked", |b| b.iter(|| black_box(encoder::encode(black_box(&frame)))));
    group.bench_function("decode_masked", |b| {
        b.iter(|| black_box(decoder.decode(&mut Cursor::new(black_box(encoded.as_slice()))).unwrap()))
    });
    group.bench_function("mask", |b| {
        let mut payload = MSG.as_bytes().to_vec();
        b.iter(|| mask::apply(black_box(&mut payload), [0x37, 0xfa, 0x21, 0x3d]))
    });

    group.finish();
}

criterion_group!(benches, hijackws_rtt_benchmark, tungstenite_rtt_benchmark, codec_benchmark);
criterion_main!(benches);
