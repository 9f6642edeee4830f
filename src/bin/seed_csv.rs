use anyhow::Result;
use csv::{QuoteStyle, WriterBuilder};

use recordstore::FIELD_NAMES;

fn main() -> Result<()> {
    let path = std::path::Path::new("dev/csv");
    std::fs::create_dir_all(path)?;
    let csv_path = path.join("database.csv");

    let mut w = WriterBuilder::new()
        .quote(b'\'')
        .quote_style(QuoteStyle::Necessary)
        .flexible(true)
        .from_path(&csv_path)?;

    w.write_record(FIELD_NAMES)?;
    let rows = [
        ["Acme", "Jane", "Doe", "v1", "p1", "a1", "s1", "t1", "vo1", "ci1"],
        ["Globex", "Hank", "Scorpio", "v2", "p2", "a2", "s2", "t2", "vo2", "ci2"],
        ["Initech, Inc.", "Bill", "Lumbergh", "v3", "p3", "a3", "s3", "t3", "vo3", "ci3"],
        ["O'Neil Ltd", "Carol", "O'Neil", "v4", "p4", "a4", "s4", "t4", "vo4", "ci4"],
        ["Umbrella", "Alice", "Abernathy", "v5", "p5", "a5", "s5", "t5", "vo5", "ci5"],
    ];
    for row in &rows {
        w.write_record(row)?;
    }
    // one malformed row so a load reports a rejection
    w.write_record(["Stark", "Tony"])?;
    w.flush()?;

    println!("Seeded CSV at {}", csv_path.display());
    Ok(())
}
