//! Benchmark utilities.

use nettable_codec::Value;
use nettable_sync_protocol::{Message, SequenceNumber};
use rand::Rng;

/// Generate random bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` keys spread over a few subtables.
pub fn generate_keys(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("/table{}/entry{}", i % 8, i))
        .collect()
}

/// Generate a random scalar value.
pub fn random_value() -> Value {
    let mut rng = rand::thread_rng();
    match rng.gen_range(0..3) {
        0 => Value::Boolean(rng.gen()),
        1 => Value::Double(rng.gen_range(-1000.0..1000.0)),
        _ => Value::String(format!("value-{}", rng.gen::<u32>())),
    }
}

/// Generate a batch of entry updates like a client flush would carry.
pub fn generate_updates(count: usize) -> Vec<Message> {
    generate_keys(count)
        .into_iter()
        .zip(0u16..)
        .map(|(key, i)| Message::EntryUpdate {
            key,
            seq: SequenceNumber::new(i),
            value: Value::Double(f64::from(i)),
        })
        .collect()
}
