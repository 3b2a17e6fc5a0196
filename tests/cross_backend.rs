//! Randomized equivalence of every backend against a plain ordered-map model.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rangekv::codec::{StringCodec, U64Codec};
    use rangekv::{
        Backend, Direction, MemoryBackend, RedbBackend, Row, StoreConfig, Table, TableCodecs,
        TableRegistry,
    };
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    type TestTable<B> = Table<B, StringCodec, U64Codec, StringCodec>;
    type Model = BTreeMap<(String, Option<u64>), String>;

    const HASHES: [&str; 4] = ["", "a", "ab", "b"];
    const MAX_RANGE: u64 = 12;

    #[derive(Debug, Clone)]
    enum Op {
        Put(String, Option<u64>, u8),
        Delete(String, Option<u64>),
        DeleteRange(String, Option<u64>, Option<u64>),
    }

    fn arb_hash() -> impl Strategy<Value = String> {
        prop::sample::select(HASHES.to_vec()).prop_map(str::to_string)
    }

    fn arb_range() -> impl Strategy<Value = Option<u64>> {
        prop::option::weighted(0.9, 0..MAX_RANGE)
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (arb_hash(), arb_range(), any::<u8>()).prop_map(|(h, r, v)| Op::Put(h, r, v)),
            2 => (arb_hash(), arb_range()).prop_map(|(h, r)| Op::Delete(h, r)),
            1 => (arb_hash(), arb_range(), arb_range())
                .prop_map(|(h, from, to)| Op::DeleteRange(h, from, to)),
        ]
    }

    /// Rows of `hash` selected by a scan, in scan order.
    fn model_scan(
        model: &Model,
        hash: &str,
        from: Option<u64>,
        to: Option<u64>,
        direction: Direction,
    ) -> Vec<(Option<u64>, String)> {
        let group = model
            .iter()
            .filter(|((h, _), _)| h == hash)
            .map(|((_, r), v)| (*r, v.clone()));

        match direction {
            Direction::Forward => {
                if matches!((from, to), (Some(f), Some(t)) if f > t) {
                    return Vec::new();
                }
                group
                    .filter(|(r, _)| from.map_or(true, |f| *r >= Some(f)))
                    .filter(|(r, _)| to.map_or(true, |t| *r <= Some(t)))
                    .collect()
            }
            Direction::Reverse => {
                if matches!((from, to), (Some(f), Some(t)) if f < t) {
                    return Vec::new();
                }
                let mut rows: Vec<_> = group
                    .filter(|(r, _)| from.map_or(true, |f| *r <= Some(f)))
                    .filter(|(r, _)| to.map_or(true, |t| *r >= Some(t)))
                    .collect();
                rows.reverse();
                rows
            }
        }
    }

    fn model_latest(model: &Model, hash: &str, range: Option<u64>) -> Option<String> {
        let Some(range) = range else {
            return model_scan(model, hash, None, None, Direction::Reverse)
                .into_iter()
                .next()
                .map(|(_, v)| v);
        };
        model_scan(model, hash, Some(range), None, Direction::Reverse)
            .into_iter()
            .next()
            .or_else(|| {
                model_scan(model, hash, Some(range), None, Direction::Forward)
                    .into_iter()
                    .next()
            })
            .map(|(_, v)| v)
    }

    fn apply_model(model: &mut Model, op: &Op) {
        match op {
            Op::Put(h, r, v) => {
                model.insert((h.clone(), *r), v.to_string());
            }
            Op::Delete(h, r) => {
                model.remove(&(h.clone(), *r));
            }
            Op::DeleteRange(h, from, to) => {
                for (r, _) in model_scan(model, h, *from, *to, Direction::Forward) {
                    model.remove(&(h.clone(), r));
                }
            }
        }
    }

    fn apply_table<B: Backend>(table: &TestTable<B>, op: &Op) {
        match op {
            Op::Put(h, r, v) => table.put(h, r.as_ref(), &v.to_string()).unwrap(),
            Op::Delete(h, r) => table.delete(h, r.as_ref()).unwrap(),
            Op::DeleteRange(h, from, to) => {
                table.delete_range(h, from.as_ref(), to.as_ref()).unwrap();
            }
        }
    }

    fn rows<B: Backend>(
        table: &TestTable<B>,
        hash: &str,
        from: Option<u64>,
        to: Option<u64>,
        direction: Direction,
    ) -> Vec<(Option<u64>, String)> {
        table
            .scan(&hash.to_string(), from.as_ref(), to.as_ref(), direction)
            .unwrap()
            .map(|row| {
                let (_, range, value) = row.unwrap().into_parts().unwrap();
                (range, value)
            })
            .collect()
    }

    fn value(row: Option<Row<StringCodec, U64Codec, StringCodec>>) -> Option<String> {
        row.map(|row| row.value().unwrap().clone())
    }

    /// Everything a caller can observe through scans and point queries.
    fn observe_table<B: Backend>(
        table: &TestTable<B>,
        bounds: &[(Option<u64>, Option<u64>)],
    ) -> Vec<String> {
        let mut seen = Vec::new();
        for hash in HASHES {
            let h = hash.to_string();
            for direction in [Direction::Forward, Direction::Reverse] {
                for (from, to) in bounds {
                    let scanned = rows(table, hash, *from, *to, direction);
                    seen.push(format!("{hash}:{direction:?}:{from:?}:{to:?} {scanned:?}"));
                }
            }
            let latest = value(table.get_latest(&h, None).unwrap());
            seen.push(format!("{hash}:latest {latest:?}"));
            for range in 0..=MAX_RANGE {
                seen.push(format!(
                    "{hash}:{range} latest={:?} next={:?} prev={:?}",
                    value(table.get_latest(&h, Some(&range)).unwrap()),
                    value(table.get_next(&h, &range).unwrap()),
                    value(table.get_prev(&h, &range).unwrap()),
                ));
            }
        }
        seen
    }

    fn observe_model(model: &Model, bounds: &[(Option<u64>, Option<u64>)]) -> Vec<String> {
        let mut seen = Vec::new();
        for hash in HASHES {
            for direction in [Direction::Forward, Direction::Reverse] {
                for (from, to) in bounds {
                    let scanned = model_scan(model, hash, *from, *to, direction);
                    seen.push(format!("{hash}:{direction:?}:{from:?}:{to:?} {scanned:?}"));
                }
            }
            seen.push(format!("{hash}:latest {:?}", model_latest(model, hash, None)));
            for range in 0..=MAX_RANGE {
                let first = |direction| {
                    model_scan(model, hash, Some(range), None, direction)
                        .into_iter()
                        .next()
                        .map(|(_, v)| v)
                };
                seen.push(format!(
                    "{hash}:{range} latest={:?} next={:?} prev={:?}",
                    model_latest(model, hash, Some(range)),
                    first(Direction::Forward),
                    first(Direction::Reverse),
                ));
            }
        }
        seen
    }

    fn open<B: Backend>(dir: &TempDir) -> TestTable<B> {
        let registry: TableRegistry<B> = TableRegistry::new(StoreConfig::new(dir.path()).unwrap());
        registry.open_table("model", TableCodecs::default()).unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn backends_match_model(
            ops in prop::collection::vec(arb_op(), 0..64),
            bounds in prop::collection::vec((arb_range(), arb_range()), 1..6),
        ) {
            let dir = TempDir::new().unwrap();
            let memory: TestTable<MemoryBackend> = open(&dir);
            let redb: TestTable<RedbBackend> = open(&dir);
            let mut model = Model::new();

            for op in &ops {
                apply_model(&mut model, op);
                apply_table(&memory, op);
                apply_table(&redb, op);
            }

            let expected = observe_model(&model, &bounds);
            prop_assert_eq!(&observe_table(&memory, &bounds), &expected);
            prop_assert_eq!(&observe_table(&redb, &bounds), &expected);
        }
    }
}
