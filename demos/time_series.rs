//! Example usage of a hash/range table as a small time-series store.
//!
//! Readings are keyed by sensor name (hash key) and timestamp (range key)
//! and stored in a redb file through a table registry.

use rangekv::codec::{I64Codec, StringCodec, U64Codec};
use rangekv::{RedbBackend, StoreConfig, TableCodecs, TableRegistry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("rangekv-time-series");
    let registry: TableRegistry<RedbBackend> = TableRegistry::new(StoreConfig::new(&dir)?);

    let codecs = TableCodecs::new(StringCodec, U64Codec, I64Codec);
    let readings = registry.open_table("readings", codecs)?;
    let sensor = "boiler".to_string();

    // Write a few readings in one batch
    let mut batch = readings.new_batch()?;
    for (ts, temp) in [(1000u64, 61i64), (1060, 64), (1120, 70), (1180, 66)] {
        batch.put(&sensor, Some(&ts), &temp)?;
    }
    batch.flush()?;
    batch.close();

    println!("All readings:");
    for row in readings.range(&sensor)? {
        let row = row?;
        println!("  t={:?} temp={}", row.range_key()?, row.value()?);
    }

    println!("Newest first, up to t=1120:");
    for row in readings.range_reverse_from(&sensor, &1120)? {
        let (_, ts, temp) = row?.into_parts()?;
        println!("  t={:?} temp={}", ts, temp);
    }

    if let Some(row) = readings.get_latest(&sensor, Some(&1100))? {
        println!("Reading in effect at t=1100: {}", row.value()?);
    }

    let removed = readings.delete_range(&sensor, None, Some(&1060))?;
    println!("Removed {} old readings", removed);

    readings.close();
    registry.destroy_table("readings")?;
    Ok(())
}
