//! Shipment tracking id generation.

use rand::Rng;

/// Generates a tracking id salted with `salt`.
///
/// Format: two letters, then `<len(salt)><3 digits>-<len(salt)/2><7 digits>`,
/// e.g. `QZ-42123-211234567`. Every call draws from the thread-local RNG, so
/// there is no shared generator state to seed or lock.
pub fn generate_tracking_id(salt: &str) -> String {
    let mut rng = rand::rng();
    let len = salt.len();
    format!(
        "{}{}-{}{}-{}{}",
        random_letter(&mut rng),
        random_letter(&mut rng),
        len,
        random_digits(&mut rng, 3),
        len / 2,
        random_digits(&mut rng, 7),
    )
}

fn random_letter(rng: &mut impl Rng) -> char {
    char::from(b'A' + rng.random_range(0..25u8))
}

fn random_digits(rng: &mut impl Rng, count: usize) -> String {
    (0..count)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}
