use crate::domain::model::{Courier, Location, Transport};
use crate::utils::error::Result;
use rand::Rng;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// 名單 CSV 的一列：`name,transport,x,y`
#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    transport: String,
    x: i32,
    y: i32,
}

impl RosterRow {
    fn into_courier(self) -> Result<Courier> {
        let transport = Transport::from_name(&self.transport)?;
        let location = Location::new(self.x, self.y)?;
        Courier::create(self.name, transport, location)
    }
}

/// 從檔案載入快遞員名單
pub fn load_roster<P: AsRef<Path>>(path: P) -> Result<Vec<Courier>> {
    let file = std::fs::File::open(path.as_ref())?;
    read_roster(file)
}

pub fn read_roster<R: Read>(reader: R) -> Result<Vec<Courier>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut couriers = Vec::new();
    for (index, row) in csv_reader.deserialize::<RosterRow>().enumerate() {
        // 第 1 列是標題
        let line = index + 2;
        let courier = row?
            .into_courier()
            .map_err(|e| e.in_context(format!("roster line {}", line)))?;
        couriers.push(courier);
    }

    tracing::debug!("Loaded {} couriers from roster", couriers.len());
    Ok(couriers)
}

/// 產生隨機快遞員，交通工具與位置都由呼叫端提供的 RNG 決定
pub fn random_couriers<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Result<Vec<Courier>> {
    let catalog = Transport::list();
    (1..=count)
        .map(|n| {
            let transport = catalog[rng.gen_range(0..catalog.len())];
            Courier::create(format!("courier-{}", n), transport, Location::random(&mut *rng))
        })
        .collect()
}
