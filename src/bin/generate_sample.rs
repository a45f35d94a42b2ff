use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const SUBJECTS: [&str; 5] = ["Maths", "Science", "English", "History", "Computing"];

/// Seeded xoshiro256** generator so the sample roster is identical on every run.
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One mark out of 100 around the student's ability, with the occasional
/// blank cell (absent for the exam).
fn mark(rng: &mut SimpleRng, ability: f64) -> Option<i64> {
    if rng.next_f64() < 0.03 {
        return None;
    }
    Some(rng.gauss(ability, 12.0).round().clamp(0.0, 100.0) as i64)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let first_names = ["Asha", "Ravi", "Meera", "Tom", "Lena", "Omar", "Yuki", "Sara"];
    let houses = ["Red", "Blue", "Green"];
    // Average ability of each cohort; the last one sits near the pass line.
    let abilities = [72.0, 58.0, 41.0];

    let mut names: Vec<String> = Vec::new();
    let mut house_col: Vec<String> = Vec::new();
    let mut marks: Vec<Vec<Option<i64>>> = vec![Vec::new(); SUBJECTS.len()];

    for (cohort, &ability) in abilities.iter().enumerate() {
        for (i, first) in first_names.iter().enumerate() {
            let student_ability = rng.gauss(ability, 8.0);
            names.push(format!("{first} {}", (b'A' + cohort as u8) as char));
            house_col.push(houses[(i + cohort) % houses.len()].to_string());
            for column in marks.iter_mut() {
                column.push(mark(&mut rng, student_ability));
            }
        }
    }

    // ---- CSV ----
    let csv_path = "sample_marks.csv";
    let mut writer = csv::Writer::from_path(csv_path).context("creating CSV file")?;
    let mut header = vec!["Name", "House"];
    header.extend(SUBJECTS);
    writer.write_record(&header).context("writing CSV header")?;
    for row in 0..names.len() {
        let mut record = vec![names[row].clone(), house_col[row].clone()];
        record.extend(
            marks
                .iter()
                .map(|col| col[row].map(|m| m.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;

    // ---- Parquet ----
    let mut fields = vec![
        Field::new("Name", DataType::Utf8, false),
        Field::new("House", DataType::Utf8, false),
    ];
    fields.extend(SUBJECTS.iter().map(|s| Field::new(*s, DataType::Int64, true)));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<Arc<dyn arrow::array::Array>> = vec![
        Arc::new(StringArray::from(names.clone())),
        Arc::new(StringArray::from(house_col)),
    ];
    for column in marks {
        columns.push(Arc::new(Int64Array::from(column)));
    }

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let parquet_path = "sample_marks.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    println!(
        "Wrote {} students ({} subjects each) to {csv_path} and {parquet_path}",
        names.len(),
        SUBJECTS.len()
    );
    Ok(())
}
