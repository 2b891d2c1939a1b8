//! Composite mixer: folds the enabled metadata fields and optional content
//! fingerprint into a single 8-byte hash, in a fixed canonical field order.

use xxhash_rust::xxh3::Xxh3;

use crate::types::HashComponents;

/// Canonical field order: size, ctime, mtime, filename, content. A disabled
/// component is omitted from the stream entirely rather than fed as zeroes —
/// two records that differ only in whether content hashing was enabled must
/// not collide just because the gap was padded.
pub fn composite_hash(
    components: HashComponents,
    size: u64,
    ctime: i64,
    mtime: i64,
    filename: &str,
    content: Option<[u8; 8]>,
) -> [u8; 8] {
    let mut hasher = Xxh3::new();

    if components.contains(HashComponents::SIZE) {
        hasher.update(&size.to_le_bytes());
    }
    if components.contains(HashComponents::CREATED) {
        hasher.update(&ctime.to_le_bytes());
    }
    if components.contains(HashComponents::MODIFIED) {
        hasher.update(&mtime.to_le_bytes());
    }
    if components.contains(HashComponents::FILENAME) {
        hasher.update(filename.to_lowercase().as_bytes());
    }
    if components.contains(HashComponents::CONTENT) {
        if let Some(bytes) = content {
            hasher.update(&bytes);
        }
    }

    hasher.digest().to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_hash() {
        let c = HashComponents::SIZE | HashComponents::MODIFIED;
        let a = composite_hash(c, 100, 0, 12345, "a.txt", None);
        let b = composite_hash(c, 100, 0, 12345, "a.txt", None);
        assert_eq!(a, b);
    }

    #[test]
    fn differing_size_differs() {
        let c = HashComponents::SIZE;
        let a = composite_hash(c, 100, 0, 0, "a.txt", None);
        let b = composite_hash(c, 200, 0, 0, "a.txt", None);
        assert_ne!(a, b);
    }

    #[test]
    fn disabled_component_is_omitted_not_zero_padded() {
        // Disabling MODIFIED and changing its value must not affect the hash
        // at all, since the field is omitted rather than padded with zero.
        let c = HashComponents::SIZE;
        let a = composite_hash(c, 100, 0, 111, "a.txt", None);
        let b = composite_hash(c, 100, 0, 999, "a.txt", None);
        assert_eq!(a, b);
    }

    #[test]
    fn filename_is_case_folded() {
        let c = HashComponents::FILENAME;
        let a = composite_hash(c, 0, 0, 0, "Report.TXT", None);
        let b = composite_hash(c, 0, 0, 0, "report.txt", None);
        assert_eq!(a, b);
    }

    #[test]
    fn content_component_distinguishes_identical_metadata() {
        let c = HashComponents::CONTENT;
        let a = composite_hash(c, 0, 0, 0, "a.txt", Some([1, 2, 3, 4, 5, 6, 7, 8]));
        let b = composite_hash(c, 0, 0, 0, "a.txt", Some([8, 7, 6, 5, 4, 3, 2, 1]));
        assert_ne!(a, b);
    }

    #[test]
    fn no_components_enabled_is_still_deterministic() {
        let a = composite_hash(HashComponents::NONE, 1, 2, 3, "x", None);
        let b = composite_hash(HashComponents::NONE, 9, 9, 9, "y", Some([0; 8]));
        assert_eq!(a, b);
    }
}
