use libreda_dss::prelude::*;

// This file holds the only test touching the process-wide instance counter, so
// the count cannot race with other tests of the same binary.
#[test]
fn test_instance_count_tracks_store_lifetime() {
    let before = DeepShapeStore::instance_count();
    {
        let _a = DeepShapeStore::new();
        let _b = DeepShapeStore::new();
        assert_eq!(DeepShapeStore::instance_count(), before + 2);
    }
    assert_eq!(DeepShapeStore::instance_count(), before);
}
