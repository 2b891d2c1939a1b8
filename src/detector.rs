//! Duplicate Detector: streams duplicate groups from the Index Store.
//!
//! Pull-driven, bounded-memory consumption: a prefetching `Iterator` over
//! bucket keys rather than materializing every group up front, since the
//! Index Store exposes a plain `Vec` of keys rather than a streaming cursor.

use std::collections::VecDeque;

use log::warn;

use crate::config::DETECTOR_BATCH_PREFETCH;
use crate::store::SharedIndexStore;
use crate::types::DuplicateGroup;

/// Number of candidate groups to materialize per database round-trip before
/// yielding them one at a time; bounds memory to batch × group size rather
/// than total result size.
const BATCH_SIZE: usize = DETECTOR_BATCH_PREFETCH;

/// Count duplicate-size buckets for `scan_id` without materializing them.
pub fn count_duplicate_size_groups(store: &SharedIndexStore, scan_id: i64) -> anyhow::Result<usize> {
    store.lock().unwrap().count_duplicate_sizes(scan_id)
}

/// Count duplicate-hash buckets for `scan_id` without materializing them.
pub fn count_duplicate_hash_groups(store: &SharedIndexStore, scan_id: i64) -> anyhow::Result<usize> {
    store.lock().unwrap().count_duplicate_hashes(scan_id)
}

/// Lazy, size-keyed duplicate groups. `hash` is always `None` on the yielded
/// groups; this mode exists for debugging and future modes — detection
/// proper always runs [`by_hash`].
pub fn by_size(store: SharedIndexStore, scan_id: i64) -> anyhow::Result<impl Iterator<Item = DuplicateGroup>> {
    let sizes = store.lock().unwrap().duplicate_sizes_for_current_run(scan_id)?;
    Ok(SizeGroupIter {
        store,
        scan_id,
        keys: sizes.into(),
        prefetched: VecDeque::new(),
    })
}

/// Lazy, hash-keyed duplicate groups. The reported size is the first
/// member's size (representative, since all members share a composite that
/// includes size whenever `Size` is selected); the reported hash
/// reinterprets the 8-byte fingerprint as a big-endian `u64`.
pub fn by_hash(store: SharedIndexStore, scan_id: i64) -> anyhow::Result<impl Iterator<Item = DuplicateGroup>> {
    let hashes = store.lock().unwrap().duplicate_hashes_for_current_run(scan_id)?;
    Ok(HashGroupIter {
        store,
        scan_id,
        keys: hashes.into(),
        prefetched: VecDeque::new(),
    })
}

struct SizeGroupIter {
    store: SharedIndexStore,
    scan_id: i64,
    keys: VecDeque<u64>,
    prefetched: VecDeque<DuplicateGroup>,
}

impl SizeGroupIter {
    fn refill(&mut self) {
        let store = self.store.lock().unwrap();
        for _ in 0..BATCH_SIZE {
            let Some(size) = self.keys.pop_front() else {
                break;
            };
            match store.files_of_size(size, self.scan_id) {
                Ok(members) if members.len() >= 2 => {
                    self.prefetched.push_back(DuplicateGroup { size, hash: None, members });
                }
                Ok(_) => {}
                Err(e) => warn!("failed to fetch members of size bucket {size}: {e}"),
            }
        }
    }
}

impl Iterator for SizeGroupIter {
    type Item = DuplicateGroup;

    fn next(&mut self) -> Option<DuplicateGroup> {
        if self.prefetched.is_empty() && !self.keys.is_empty() {
            self.refill();
        }
        self.prefetched.pop_front()
    }
}

struct HashGroupIter {
    store: SharedIndexStore,
    scan_id: i64,
    keys: VecDeque<[u8; 8]>,
    prefetched: VecDeque<DuplicateGroup>,
}

impl HashGroupIter {
    fn refill(&mut self) {
        let store = self.store.lock().unwrap();
        for _ in 0..BATCH_SIZE {
            let Some(hash) = self.keys.pop_front() else {
                break;
            };
            match store.files_of_hash(&hash, self.scan_id) {
                Ok(members) if members.len() >= 2 => {
                    let size = members[0].size;
                    let reported = u64::from_be_bytes(hash);
                    self.prefetched.push_back(DuplicateGroup {
                        size,
                        hash: Some(reported),
                        members,
                    });
                }
                Ok(_) => {}
                Err(e) => warn!("failed to fetch members of hash bucket: {e}"),
            }
        }
    }
}

impl Iterator for HashGroupIter {
    type Item = DuplicateGroup;

    fn next(&mut self) -> Option<DuplicateGroup> {
        if self.prefetched.is_empty() && !self.keys.is_empty() {
            self.refill();
        }
        self.prefetched.pop_front()
    }
}
