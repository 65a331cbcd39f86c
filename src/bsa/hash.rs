use crate::archive::serialize_to_win1252;
use crate::Result;

const HASH_MULTIPLIER: u32 = 0x1003F;

/// Computes the name hash of an entry or folder name.
///
/// Names are hashed in their Windows-1252 form, which is how they are
/// stored in the archive.
pub fn bsa_hash(name: &str) -> Result<u64> {
    let name_bytes = serialize_to_win1252(name)?;
    Ok(bsa_hash_bytes(&name_bytes))
}

/// Computes the name hash from raw name bytes.
///
/// The low half packs the first and last chars of the stem together with
/// its length and a few well-known extension bits, the high half is a
/// rolling hash of the inner stem chars plus the extension (dot included).
pub fn bsa_hash_bytes(name: &[u8]) -> u64 {
    let name: Vec<u8> = name
        .iter()
        .map(|c| match c.to_ascii_lowercase() {
            b'/' => b'\\',
            c => c,
        })
        .collect();
    let ext_start = name
        .iter()
        .rposition(|&c| c == b'.')
        .unwrap_or_else(|| name.len());
    let (stem, ext) = name.split_at(ext_start);

    let mut low: u32 = 0;
    if let (Some(&first), Some(&last)) = (stem.first(), stem.last()) {
        let len = stem.len();
        let second_to_last = if len > 2 { stem[len - 2] } else { 0 };
        low = u32::from(last)
            | u32::from(second_to_last) << 8
            | (len as u32) << 16
            | u32::from(first) << 24;
    }
    low |= match ext {
        b".kf" => 0x80,
        b".nif" => 0x8000,
        b".dds" => 0x8080,
        b".wav" => 0x8000_0000,
        _ => 0,
    };

    let inner_stem: &[u8] = if stem.len() > 2 {
        &stem[1..stem.len() - 2]
    } else {
        &[]
    };
    let high = rolling_hash(inner_stem).wrapping_add(rolling_hash(ext));
    u64::from(high) << 32 | u64::from(low)
}

fn rolling_hash(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0, |acc: u32, &c| {
        acc.wrapping_mul(HASH_MULTIPLIER).wrapping_add(u32::from(c))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_hashes() {
        let expected = [
            ("a", 0x0000_0000_6101_0061_u64),
            ("ab", 0x0000_0000_6102_0062),
            ("helmet.nif", 0xc4f5_7ee3_6806_e574),
            ("sound.wav", 0x97a2_eb64_f305_6e64),
            ("anim.kf", 0x1711_e457_6104_69ed),
            ("tex.dds", 0x8ddb_a9c5_7403_e5f8),
            ("readme.txt", 0xc7ed_dcea_7206_6d65),
        ];
        for (name, hash) in expected.iter() {
            assert_eq!(bsa_hash(name).unwrap(), *hash, "hash of {}", name);
        }
    }

    #[test]
    fn test_case_and_separator_insensitive() {
        assert_eq!(
            bsa_hash("HELMET.NIF").unwrap(),
            bsa_hash("helmet.nif").unwrap()
        );
        assert_eq!(
            bsa_hash("meshes/armor.nif").unwrap(),
            bsa_hash("Meshes\\Armor.nif").unwrap()
        );
        assert_eq!(bsa_hash("meshes/armor.nif").unwrap(), 0x49b3_05e5_6d0c_ef72);
    }

    #[test]
    fn test_last_dot_splits_extension() {
        // Only the trailing extension gets the well-known bits
        let hash = bsa_hash_bytes(b"a.nif.bak");
        assert_eq!(hash & 0x8000, 0);
        assert_eq!(bsa_hash_bytes(b""), 0);
    }
}
